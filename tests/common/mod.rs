//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use parley_gateway::{
    ChatMessage, Completer, Error, MemoryStore, Result, Robot, SharedState, Transcriber, Turn,
};

/// A robot capability call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Speak(String),
    MoveHead(f64, f64),
    CenterHead,
    Posture(String),
    Led(u32),
    Behavior(String),
    PauseRecognizer(bool),
    Vocabulary(Vec<String>),
    Subscribe(String),
}

/// Robot that records every call with its offset from creation
pub struct RecordingRobot {
    start: Instant,
    calls: Mutex<Vec<(Duration, Call)>>,
    words: Mutex<VecDeque<String>>,
    fail_speech: AtomicBool,
}

impl RecordingRobot {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            calls: Mutex::new(Vec::new()),
            words: Mutex::new(VecDeque::new()),
            fail_speech: AtomicBool::new(false),
        }
    }

    /// Queue words for the recognizer to report, one per poll
    pub fn with_words(words: &[&str]) -> Self {
        let robot = Self::new();
        robot
            .words
            .lock()
            .unwrap()
            .extend(words.iter().map(|w| (*w).to_string()));
        robot
    }

    /// Make every `speak` call fail
    pub fn fail_speech(&self) {
        self.fail_speech.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Duration, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn postures(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Posture(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now().duration_since(self.start), call));
    }
}

#[async_trait]
impl Robot for RecordingRobot {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.record(Call::Speak(text.to_string()));
        if self.fail_speech.load(Ordering::SeqCst) {
            return Err(Error::Robot("speaker unplugged".to_string()));
        }
        Ok(())
    }

    async fn move_head(&self, yaw: f64, pitch: f64) -> Result<()> {
        self.record(Call::MoveHead(yaw, pitch));
        Ok(())
    }

    async fn center_head(&self) -> Result<()> {
        self.record(Call::CenterHead);
        Ok(())
    }

    async fn set_posture(&self, name: &str) -> Result<()> {
        self.record(Call::Posture(name.to_string()));
        Ok(())
    }

    async fn set_led_pattern(&self, color: u32, _duration: Duration) -> Result<()> {
        self.record(Call::Led(color));
        Ok(())
    }

    async fn run_behavior(&self, id: &str) -> Result<()> {
        self.record(Call::Behavior(id.to_string()));
        Ok(())
    }

    async fn pause_recognizer(&self, paused: bool) -> Result<()> {
        self.record(Call::PauseRecognizer(paused));
        Ok(())
    }

    async fn set_vocabulary(&self, words: &[String]) -> Result<()> {
        self.record(Call::Vocabulary(words.to_vec()));
        Ok(())
    }

    async fn subscribe_recognizer(&self, subscriber: &str) -> Result<()> {
        self.record(Call::Subscribe(subscriber.to_string()));
        Ok(())
    }

    async fn last_recognized_word(&self) -> Result<Option<String>> {
        Ok(self.words.lock().unwrap().pop_front())
    }
}

/// Transcriber that replays a fixed list of utterances, then hears silence
pub struct ScriptedTranscriber {
    utterances: VecDeque<String>,
    captures: Arc<AtomicUsize>,
}

impl ScriptedTranscriber {
    pub fn new(utterances: &[&str]) -> Self {
        Self {
            utterances: utterances.iter().map(|u| (*u).to_string()).collect(),
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of capture attempts
    pub fn captures(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.captures)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn capture_utterance(&mut self) -> Result<Option<String>> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(self.utterances.pop_front())
    }
}

/// Completer that returns scripted outcomes and remembers what it was asked
#[derive(Clone, Default)]
pub struct ScriptedCompleter {
    replies: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedCompleter {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    /// Completer that answers every request successfully
    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok((*r).to_string())).collect())
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Llm("no reply scripted".to_string())))
    }
}

/// A store write, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Turn(Turn),
    Response(String),
}

/// Store wrapper that logs writes and can refuse turn writes
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<Write>>,
    failing_turn_writes: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` turn writes
    pub fn fail_turn_writes(&self, count: usize) {
        self.failing_turn_writes.store(count, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl SharedState for RecordingStore {
    fn get_turn(&self) -> Turn {
        self.inner.get_turn()
    }

    fn set_turn(&self, turn: Turn) -> Result<()> {
        let refuse = self
            .failing_turn_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(Error::Store("disk full".to_string()));
        }

        self.writes.lock().unwrap().push(Write::Turn(turn));
        self.inner.set_turn(turn)
    }

    fn get_response(&self) -> Result<String> {
        self.inner.get_response()
    }

    fn set_response(&self, text: &str) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(Write::Response(text.to_string()));
        self.inner.set_response(text)
    }
}

/// Store where the front-end publishes right after the first turn read
pub struct PublishingStore {
    inner: MemoryStore,
    reply: Mutex<Option<String>>,
}

impl PublishingStore {
    pub fn new(reply: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            reply: Mutex::new(Some(reply.to_string())),
        }
    }
}

impl SharedState for PublishingStore {
    fn get_turn(&self) -> Turn {
        let turn = self.inner.get_turn();
        if let Some(reply) = self.reply.lock().unwrap().take() {
            self.inner.set_response(&reply).unwrap();
            self.inner.set_turn(Turn::Respond).unwrap();
        }
        turn
    }

    fn set_turn(&self, turn: Turn) -> Result<()> {
        self.inner.set_turn(turn)
    }

    fn get_response(&self) -> Result<String> {
        self.inner.get_response()
    }

    fn set_response(&self, text: &str) -> Result<()> {
        self.inner.set_response(text)
    }
}
