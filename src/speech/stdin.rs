//! Line-oriented transcriber for headless runs

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use super::Transcriber;
use crate::{Error, Result};

/// Treats each input line as one utterance
pub struct StdinTranscriber<R = tokio::io::Stdin> {
    lines: Lines<BufReader<R>>,
}

impl StdinTranscriber {
    #[must_use]
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for StdinTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncRead + Unpin> StdinTranscriber<R> {
    #[must_use]
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> Transcriber for StdinTranscriber<R> {
    async fn capture_utterance(&mut self) -> Result<Option<String>> {
        match self.lines.next_line().await? {
            Some(line) => {
                let line = line.trim();
                Ok((!line.is_empty()).then(|| line.to_string()))
            }
            None => Err(Error::Stt("input closed".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_become_utterances() {
        let input: &[u8] = b"hello robot\n\n  how are you?  \n";
        let mut transcriber = StdinTranscriber::from_reader(input);

        assert_eq!(transcriber.capture_utterance().await.unwrap().as_deref(), Some("hello robot"));
        assert_eq!(transcriber.capture_utterance().await.unwrap(), None);
        assert_eq!(
            transcriber.capture_utterance().await.unwrap().as_deref(),
            Some("how are you?")
        );
        assert!(transcriber.capture_utterance().await.is_err());
    }
}
