//! HTTP bridge robot backend
//!
//! Talks JSON to a small shim running next to the robot SDK. Every
//! capability maps to one endpoint under the bridge base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::Robot;
use crate::{Error, Result};

/// Request timeout for non-speech calls
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Response of `GET /recognizer/word`
#[derive(Debug, Deserialize)]
struct RecognizedWord {
    word: Option<String>,
}

/// Robot reached through an HTTP bridge
pub struct HttpRobot {
    /// Base URL of the bridge (e.g., `http://10.60.11.4:8080`)
    base_url: String,
    client: Client,
}

impl HttpRobot {
    /// Create a bridge client
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is empty
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("robot bridge URL required".to_string()));
        }

        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    /// POST a JSON body to `path`
    ///
    /// Speech has no timeout since delivery can take as long as the reply.
    async fn call(
        &self,
        path: &str,
        body: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Robot(format!("{path}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Robot(format!("{path}: {status} - {body}")));
        }

        tracing::trace!(path, "robot call ok");
        Ok(())
    }
}

#[async_trait]
impl Robot for HttpRobot {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.call("/speak", serde_json::json!({ "text": text, "animated": true }), None)
            .await
    }

    async fn move_head(&self, yaw: f64, pitch: f64) -> Result<()> {
        self.call(
            "/head",
            serde_json::json!({ "yaw": yaw, "pitch": pitch, "seconds": 1.0 }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn center_head(&self) -> Result<()> {
        self.call("/head/center", serde_json::json!({ "seconds": 1.0 }), Some(CALL_TIMEOUT))
            .await
    }

    async fn set_posture(&self, name: &str) -> Result<()> {
        self.call(
            "/posture",
            serde_json::json!({ "name": name, "speed": 1.0 }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn set_led_pattern(&self, color: u32, duration: Duration) -> Result<()> {
        self.call(
            "/leds",
            serde_json::json!({ "color": color, "seconds": duration.as_secs_f64() }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn run_behavior(&self, id: &str) -> Result<()> {
        self.call("/behavior", serde_json::json!({ "id": id }), Some(CALL_TIMEOUT))
            .await
    }

    async fn pause_recognizer(&self, paused: bool) -> Result<()> {
        self.call(
            "/recognizer/pause",
            serde_json::json!({ "paused": paused }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn set_vocabulary(&self, words: &[String]) -> Result<()> {
        self.call(
            "/recognizer/vocabulary",
            serde_json::json!({ "words": words, "word_spotting": false }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn subscribe_recognizer(&self, subscriber: &str) -> Result<()> {
        self.call(
            "/recognizer/subscribe",
            serde_json::json!({ "subscriber": subscriber }),
            Some(CALL_TIMEOUT),
        )
        .await
    }

    async fn last_recognized_word(&self) -> Result<Option<String>> {
        let url = format!("{}/recognizer/word", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Robot(format!("/recognizer/word: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Robot(format!("/recognizer/word: {status} - {body}")));
        }

        let word: RecognizedWord = response
            .json()
            .await
            .map_err(|e| Error::Robot(format!("/recognizer/word parse error: {e}")))?;

        Ok(word.word.filter(|w| !w.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let robot = HttpRobot::new("http://10.60.11.4:8080/").unwrap();
        assert_eq!(robot.base_url, "http://10.60.11.4:8080");
    }

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(matches!(HttpRobot::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_recognized_word_parsing() {
        let word: RecognizedWord = serde_json::from_str(r#"{"word": "Hey Dave"}"#).unwrap();
        assert_eq!(word.word.as_deref(), Some("Hey Dave"));

        let none: RecognizedWord = serde_json::from_str(r#"{"word": null}"#).unwrap();
        assert!(none.word.is_none());
    }
}
