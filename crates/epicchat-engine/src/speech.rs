use std::collections::VecDeque;
use std::path::Path;

use anyhow::Context;
use thiserror::Error;

pub const SPEECH_UNSUPPORTED_MESSAGE: &str = "Speech recognition is not supported in this session.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not supported")]
    Unsupported,
    #[error("no speech was detected")]
    NoSpeech,
    #[error("speech recognition failed: {0}")]
    Failed(String),
}

/// Source of final transcripts. A transcript is handled exactly like typed text.
pub trait SpeechInput {
    fn is_supported(&self) -> bool {
        true
    }

    fn listen(&mut self) -> Result<String, SpeechError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpeech;

impl SpeechInput for NoSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn listen(&mut self) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

/// Successive non-empty lines of a file, one per `listen` call.
#[derive(Debug, Clone, Default)]
pub struct TranscriptFile {
    lines: VecDeque<String>,
}

impl TranscriptFile {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(Into::into)
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcripts from {}", path.display()))?;
        Ok(Self::from_lines(raw.lines()))
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl SpeechInput for TranscriptFile {
    fn listen(&mut self) -> Result<String, SpeechError> {
        self.lines.pop_front().ok_or(SpeechError::NoSpeech)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{NoSpeech, SpeechError, SpeechInput, TranscriptFile};

    #[test]
    fn transcript_file_yields_lines_then_no_speech() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("transcripts.txt");
        fs::write(&path, "hello there\n\n  generate image of a lighthouse \n")?;

        let mut speech = TranscriptFile::open(&path)?;
        assert!(speech.is_supported());
        assert_eq!(speech.remaining(), 2);
        assert_eq!(speech.listen(), Ok("hello there".to_string()));
        assert_eq!(
            speech.listen(),
            Ok("generate image of a lighthouse".to_string())
        );
        assert_eq!(speech.listen(), Err(SpeechError::NoSpeech));
        Ok(())
    }

    #[test]
    fn missing_transcript_file_is_an_error() {
        let err = TranscriptFile::open(std::path::Path::new("/nonexistent/transcripts.txt"));
        assert!(err.is_err());
    }

    #[test]
    fn no_speech_is_unsupported() {
        let mut speech = NoSpeech;
        assert!(!speech.is_supported());
        assert_eq!(speech.listen(), Err(SpeechError::Unsupported));
    }
}
