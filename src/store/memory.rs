//! In-process state store

use std::sync::Mutex;

use super::SharedState;
use crate::turn::Turn;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Slots {
    turn: Turn,
    response: String,
}

/// Mutex-backed store for tests and single-process runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<Slots>,
}

impl MemoryStore {
    /// Create an empty store (`listen`, no payload)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut Slots) -> T) -> Result<T> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(f(&mut slots))
    }
}

impl SharedState for MemoryStore {
    fn get_turn(&self) -> Turn {
        self.with_slots(|s| s.turn).unwrap_or_default()
    }

    fn set_turn(&self, turn: Turn) -> Result<()> {
        self.with_slots(|s| s.turn = turn)
    }

    fn get_response(&self) -> Result<String> {
        self.with_slots(|s| s.response.trim().to_string())
    }

    fn set_response(&self, text: &str) -> Result<()> {
        self.with_slots(|s| s.response = text.to_string())
    }
}
