//! Shared state store
//!
//! The only channel between the controller and the front-end. Each field has
//! exactly one writer per phase: the front-end writes the payload and then
//! the turn, the controller clears the payload and then hands the turn back.

mod file;
mod memory;

use std::io::Write;
use std::path::Path;

pub use file::{CONTROL_FILE, FileStore, RESPONSE_FILE};
pub use memory::MemoryStore;

use crate::turn::{self, Turn};
use crate::{Error, Result};

/// Durable turn/payload mailbox visible to both processes
///
/// All operations are synchronous and must not assume the peer is alive.
pub trait SharedState: Send + Sync {
    /// Current turn; absent or malformed state reads as `Turn::Listen`
    fn get_turn(&self) -> Turn;

    /// Overwrite the turn with all-or-nothing visibility
    ///
    /// # Errors
    ///
    /// Returns error if the write cannot be completed
    fn set_turn(&self, turn: Turn) -> Result<()>;

    /// Current response payload, trimmed; absent reads as empty
    ///
    /// # Errors
    ///
    /// Returns error if the payload exists but cannot be read
    fn get_response(&self) -> Result<String>;

    /// Overwrite the response payload
    ///
    /// # Errors
    ///
    /// Returns error if the write cannot be completed
    fn set_response(&self, text: &str) -> Result<()>;

    /// Clear the response payload after consumption
    ///
    /// # Errors
    ///
    /// Returns error if the write cannot be completed
    fn clear_response(&self) -> Result<()> {
        self.set_response("")
    }

    /// Whether the payload holds content to consume
    ///
    /// Read failures count as not ready.
    fn is_response_ready(&self) -> bool {
        match self.get_response() {
            Ok(payload) => turn::is_ready(&payload),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read response payload");
                false
            }
        }
    }
}

/// Write `contents` to `path` via a temp file in the same directory and rename
///
/// Readers observe either the previous contents or the new ones, never a
/// partial write. A crash before the rename leaves the target untouched.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| Error::Store(format!("failed to persist {}: {}", path.display(), e.error)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("value.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("value.txt");

        write_atomic(&path, b"x").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
