use std::time::Duration;

use epicchat_contracts::history::{DEFAULT_HISTORY_CAPACITY, DEFAULT_LEARNING_CAPACITY};

/// How a new message treats replies still waiting on their delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyPolicy {
    /// Every message schedules independently; replies may interleave.
    #[default]
    Overlap,
    /// A single pending slot: a new message cancels whatever is still pending.
    Supersede,
}

impl ReplyPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overlap" => Some(ReplyPolicy::Overlap),
            "supersede" => Some(ReplyPolicy::Supersede),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub reply_delay: Duration,
    pub media_delay: Duration,
    pub regenerate_delay: Duration,
    pub history_capacity: usize,
    pub learning_capacity: usize,
    pub reply_policy: ReplyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(1500),
            media_delay: Duration::from_millis(3000),
            regenerate_delay: Duration::from_millis(2000),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            learning_capacity: DEFAULT_LEARNING_CAPACITY,
            reply_policy: ReplyPolicy::Overlap,
        }
    }
}

impl SessionConfig {
    /// No artificial delays; replies are due as soon as they are scheduled.
    pub fn immediate() -> Self {
        Self {
            reply_delay: Duration::ZERO,
            media_delay: Duration::ZERO,
            regenerate_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ReplyPolicy, SessionConfig};

    #[test]
    fn default_delays_match_thinking_and_generating_times() {
        let config = SessionConfig::default();
        assert_eq!(config.reply_delay, Duration::from_millis(1500));
        assert_eq!(config.media_delay, Duration::from_millis(3000));
        assert_eq!(config.regenerate_delay, Duration::from_millis(2000));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.reply_policy, ReplyPolicy::Overlap);
    }

    #[test]
    fn parse_policy() {
        assert_eq!(ReplyPolicy::parse("Supersede"), Some(ReplyPolicy::Supersede));
        assert_eq!(ReplyPolicy::parse("queue"), None);
    }
}
