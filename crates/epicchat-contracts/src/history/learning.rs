use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::bounded::BoundedLog;
use crate::chat::{analyze_sentiment, extract_keywords, Sentiment};

pub type LearningLog = BoundedLog<LearningRecord>;

/// What the avatar "learned" from one conversational message. Kept only as a
/// bounded history; nothing is trained from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub input: String,
    pub keywords: Vec<String>,
    pub sentiment: Sentiment,
    pub timestamp: String,
}

impl LearningRecord {
    pub fn from_input(input: &str) -> Self {
        Self {
            input: input.to_string(),
            keywords: extract_keywords(input),
            sentiment: analyze_sentiment(input),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::{LearningLog, LearningRecord};
    use crate::chat::Sentiment;

    #[test]
    fn from_input_extracts_keywords_and_sentiment() -> anyhow::Result<()> {
        let record = LearningRecord::from_input("I love the beautiful mountain lakes");
        assert_eq!(
            record.keywords,
            vec!["love", "beautiful", "mountain", "lakes"]
        );
        assert_eq!(record.sentiment, Sentiment::Positive);
        DateTime::parse_from_rfc3339(&record.timestamp)?;
        Ok(())
    }

    #[test]
    fn learning_log_is_capped() {
        let mut log = LearningLog::new(100);
        for idx in 0..120 {
            log.push(LearningRecord::from_input(&format!("entry {idx}")));
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.entries()[0].input, "entry 20");
    }
}
