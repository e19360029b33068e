//! Directory-backed state store (`control.json` + `response.txt`)

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{SharedState, write_atomic};
use crate::Result;
use crate::turn::{ControlRecord, Turn};

/// Default control record file name
pub const CONTROL_FILE: &str = "control.json";

/// Default response payload file name
pub const RESPONSE_FILE: &str = "response.txt";

/// File-mediated mailbox shared by both processes
#[derive(Debug, Clone)]
pub struct FileStore {
    control_path: PathBuf,
    response_path: PathBuf,
}

impl FileStore {
    /// Open a store in `dir` with the default file names
    ///
    /// # Errors
    ///
    /// Returns error if the directory or initial files cannot be created
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_names(dir, CONTROL_FILE, RESPONSE_FILE)
    }

    /// Open a store in `dir` with custom file names
    ///
    /// Absent files are initialized to `listen` / empty. An existing turn is
    /// kept so a restarted process resumes where the protocol left off.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or initial files cannot be created
    pub fn open_with_names(dir: &Path, control_file: &str, response_file: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let store = Self {
            control_path: dir.join(control_file),
            response_path: dir.join(response_file),
        };

        if !store.control_path.exists() {
            store.set_turn(Turn::Listen)?;
        }
        if !store.response_path.exists() {
            store.clear_response()?;
        }

        tracing::debug!(
            control = %store.control_path.display(),
            response = %store.response_path.display(),
            "state store opened"
        );

        Ok(store)
    }

    /// Path of the control record
    #[must_use]
    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    /// Path of the response payload
    #[must_use]
    pub fn response_path(&self) -> &Path {
        &self.response_path
    }
}

impl SharedState for FileStore {
    fn get_turn(&self) -> Turn {
        let content = match std::fs::read_to_string(&self.control_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.control_path.display(),
                    "no control record, assuming listen"
                );
                return Turn::Listen;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.control_path.display(),
                    error = %e,
                    "failed to read control record, assuming listen"
                );
                return Turn::Listen;
            }
        };

        match serde_json::from_str::<ControlRecord>(&content) {
            Ok(record) => record.turn,
            Err(e) => {
                tracing::warn!(
                    path = %self.control_path.display(),
                    error = %e,
                    "malformed control record, assuming listen"
                );
                Turn::Listen
            }
        }
    }

    fn set_turn(&self, turn: Turn) -> Result<()> {
        let json = serde_json::to_vec(&ControlRecord { turn })?;
        write_atomic(&self.control_path, &json)?;
        tracing::debug!(%turn, "turn written");
        Ok(())
    }

    fn get_response(&self) -> Result<String> {
        match std::fs::read_to_string(&self.response_path) {
            Ok(content) => Ok(content.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn set_response(&self, text: &str) -> Result<()> {
        write_atomic(&self.response_path, text.as_bytes())?;
        tracing::debug!(len = text.len(), "response payload written");
        Ok(())
    }
}
