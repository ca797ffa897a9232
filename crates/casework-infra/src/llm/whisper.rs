//! Whisper speech-to-text over the OpenAI audio API.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use casework_core::service::transcription::{AudioUpload, Transcriber};
use casework_types::error::TranscriptionError;

use super::openai::OPENAI_BASE_URL;

/// Calls `POST {base}/audio/transcriptions` with `response_format=text`.
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(
        api_key: SecretString,
        base_url: Option<&str>,
        model: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or(OPENAI_BASE_URL).trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn form(&self, audio: &AudioUpload) -> Result<Form, TranscriptionError> {
        let mut part = Part::bytes(audio.bytes.clone()).file_name(audio.file_name.clone());
        if let Some(content_type) = &audio.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| TranscriptionError::Provider(format!("invalid content type: {e}")))?;
        }

        Ok(Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "text"))
    }
}

impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &AudioUpload) -> Result<String, TranscriptionError> {
        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(self.form(audio)?)
            .send()
            .await
            .map_err(|e| TranscriptionError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::Provider(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "transcription request failed");
            return Err(TranscriptionError::Provider(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let t = WhisperTranscriber::new(
            SecretString::from("sk-test".to_string()),
            Some("http://localhost:8080/v1/"),
            "whisper-1",
        )
        .unwrap();
        assert_eq!(t.base_url, "http://localhost:8080/v1");
        assert_eq!(t.model, "whisper-1");
    }

    #[test]
    fn test_invalid_content_type_rejected() {
        let t = WhisperTranscriber::new(SecretString::from("sk-test".to_string()), None, "whisper-1")
            .unwrap();
        let audio = AudioUpload {
            file_name: "a.webm".to_string(),
            content_type: Some("not a mime".to_string()),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(t.form(&audio), Err(TranscriptionError::Provider(_))));
    }
}
