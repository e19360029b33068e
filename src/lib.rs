//! Parley Gateway - turn coordination between a robot and a speech front-end
//!
//! Two processes share a tiny durable mailbox: a turn flag and a response
//! payload. The front-end listens, asks an LLM for a reply, writes the
//! payload and passes the turn. The controller speaks the reply, clears the
//! payload and passes the turn back. While waiting, the robot keeps busy with
//! idle gaze shifts and LED cues.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐     control.json     ┌──────────────────────┐
//! │      Front-end       │◀────────────────────▶│      Controller      │
//! │ mic/stdin → STT → LLM│     response.txt     │ speak · idle · LEDs  │
//! └──────────────────────┘                      └──────────┬───────────┘
//!                                                          │
//!                                               ┌──────────▼───────────┐
//!                                               │  Robot (console/http)│
//!                                               └──────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod frontend;
pub mod history;
pub mod idle;
pub mod llm;
pub mod poll;
pub mod robot;
pub mod speech;
pub mod store;
pub mod turn;
pub mod voice;

pub use config::{Config, RobotBackend};
pub use controller::{Controller, ControllerPhase, ControllerSettings};
pub use error::{Error, Result};
pub use frontend::FrontEnd;
pub use history::{ChatMessage, ConversationHistory, Role};
pub use idle::{IdleConfig, IdleScheduler, WaitCue};
pub use llm::OpenAiCompleter;
pub use poll::{PollConfig, Reactor, run_reactor};
pub use robot::{ConsoleRobot, HttpRobot, Robot};
pub use speech::{Completer, Transcriber};
pub use store::{FileStore, MemoryStore, SharedState};
pub use turn::Turn;
