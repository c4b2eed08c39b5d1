use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "awesome",
    "love",
    "like",
    "happy",
    "thanks",
    "thank",
    "beautiful",
    "perfect",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "horrible",
    "poor",
    "hate",
    "dislike",
    "sad",
    "angry",
    "upset",
    "disappointed",
    "worst",
    "sucks",
    "wrong",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Count whole-word hits of the positive and negative lexicons. Word
/// boundaries are ASCII word characters, so "good-looking" still counts
/// "good" while "goodness" does not.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let mut positive = 0usize;
    let mut negative = 0usize;
    for word in lower
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .filter(|word| !word.is_empty())
    {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        }
        if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
