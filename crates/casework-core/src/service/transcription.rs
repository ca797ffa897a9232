//! Speech-to-text for voice replies.

use tracing::{debug, info};

use casework_types::error::TranscriptionError;

/// An uploaded audio clip.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Abstraction over a speech-to-text backend.
pub trait Transcriber: Send + Sync {
    fn transcribe(
        &self,
        audio: &AudioUpload,
    ) -> impl std::future::Future<Output = Result<String, TranscriptionError>> + Send;
}

/// Validates uploads and forwards them to the configured transcriber.
pub struct TranscriptionService<T: Transcriber> {
    transcriber: Option<T>,
}

impl<T: Transcriber> TranscriptionService<T> {
    pub fn new(transcriber: Option<T>) -> Self {
        Self { transcriber }
    }

    pub async fn transcribe(&self, audio: Option<AudioUpload>) -> Result<String, TranscriptionError> {
        let audio = audio
            .filter(|a| !a.bytes.is_empty())
            .ok_or(TranscriptionError::MissingFile)?;
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(TranscriptionError::NotConfigured)?;

        debug!(file_name = %audio.file_name, bytes = audio.bytes.len(), "transcribing audio");
        let text = transcriber.transcribe(&audio).await?;
        info!(chars = text.len(), "transcription complete");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FixedTranscriber {
        calls: AtomicUsize,
    }

    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, audio: &AudioUpload) -> Result<String, TranscriptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("heard {} bytes\n", audio.bytes.len()))
        }
    }

    fn clip(bytes: &[u8]) -> AudioUpload {
        AudioUpload {
            file_name: "reply.webm".to_string(),
            content_type: Some("audio/webm".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_transcribe_trims_output() {
        let service = TranscriptionService::new(Some(FixedTranscriber::default()));
        let text = service.transcribe(Some(clip(b"abc"))).await.unwrap();
        assert_eq!(text, "heard 3 bytes");
    }

    #[tokio::test]
    async fn test_missing_or_empty_file() {
        let service = TranscriptionService::new(Some(FixedTranscriber::default()));
        assert!(matches!(
            service.transcribe(None).await,
            Err(TranscriptionError::MissingFile)
        ));
        assert!(matches!(
            service.transcribe(Some(clip(b""))).await,
            Err(TranscriptionError::MissingFile)
        ));
        assert_eq!(service.transcriber.as_ref().unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_configured() {
        let service: TranscriptionService<FixedTranscriber> = TranscriptionService::new(None);
        assert!(matches!(
            service.transcribe(Some(clip(b"abc"))).await,
            Err(TranscriptionError::NotConfigured)
        ));
    }
}
