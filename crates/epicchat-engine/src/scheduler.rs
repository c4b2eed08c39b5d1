use std::time::{Duration, Instant};

use epicchat_contracts::chat::MediaType;

use crate::config::ReplyPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Reply {
        text: String,
    },
    Artifact {
        request_id: u64,
        media_type: Option<MediaType>,
        prompt: String,
        regenerated: bool,
    },
}

#[derive(Debug, Clone)]
struct Scheduled {
    seq: u64,
    due: Instant,
    pending: Pending,
}

/// Delayed deliveries for one conversation, driven by caller-supplied instants.
#[derive(Debug, Clone)]
pub struct ReplyScheduler {
    policy: ReplyPolicy,
    queue: Vec<Scheduled>,
    next_seq: u64,
}

impl ReplyScheduler {
    pub fn new(policy: ReplyPolicy) -> Self {
        Self {
            policy,
            queue: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn policy(&self) -> ReplyPolicy {
        self.policy
    }

    /// Returns how many pending deliveries this call superseded.
    pub fn schedule(&mut self, now: Instant, delay: Duration, pending: Pending) -> usize {
        let cancelled = match self.policy {
            ReplyPolicy::Overlap => 0,
            ReplyPolicy::Supersede => self.cancel_all(),
        };
        self.queue.push(Scheduled {
            seq: self.next_seq,
            due: now + delay,
            pending,
        });
        self.next_seq += 1;
        cancelled
    }

    /// Remove and return everything due at `now`, earliest first; ties keep
    /// scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<Pending> {
        let (mut due, waiting): (Vec<Scheduled>, Vec<Scheduled>) =
            self.queue.drain(..).partition(|item| item.due <= now);
        self.queue = waiting;
        due.sort_by(|a, b| a.due.cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|item| item.pending).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.queue.iter().map(|item| item.due).min()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.len();
        self.queue.clear();
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{Pending, ReplyScheduler};
    use crate::config::ReplyPolicy;

    fn reply(text: &str) -> Pending {
        Pending::Reply {
            text: text.to_string(),
        }
    }

    #[test]
    fn take_due_returns_only_elapsed_items_in_due_order() {
        let start = Instant::now();
        let mut scheduler = ReplyScheduler::new(ReplyPolicy::Overlap);
        scheduler.schedule(start, Duration::from_millis(3000), reply("slow"));
        scheduler.schedule(start, Duration::from_millis(1500), reply("fast"));

        assert!(scheduler.take_due(start).is_empty());
        assert_eq!(
            scheduler.next_due(),
            Some(start + Duration::from_millis(1500))
        );

        let due = scheduler.take_due(start + Duration::from_millis(3000));
        assert_eq!(due, vec![reply("fast"), reply("slow")]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn overlap_lets_rapid_sends_interleave() {
        let start = Instant::now();
        let mut scheduler = ReplyScheduler::new(ReplyPolicy::Overlap);
        scheduler.schedule(start, Duration::from_millis(3000), reply("media"));
        let cancelled = scheduler.schedule(
            start + Duration::from_millis(100),
            Duration::from_millis(1500),
            reply("chat"),
        );
        assert_eq!(cancelled, 0);
        let due = scheduler.take_due(start + Duration::from_secs(5));
        assert_eq!(due, vec![reply("chat"), reply("media")]);
    }

    #[test]
    fn supersede_keeps_a_single_pending_slot() {
        let start = Instant::now();
        let mut scheduler = ReplyScheduler::new(ReplyPolicy::Supersede);
        scheduler.schedule(start, Duration::from_millis(1500), reply("first"));
        let cancelled = scheduler.schedule(start, Duration::from_millis(1500), reply("second"));
        assert_eq!(cancelled, 1);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(
            scheduler.take_due(start + Duration::from_secs(2)),
            vec![reply("second")]
        );
    }

    #[test]
    fn equal_due_times_keep_scheduling_order() {
        let start = Instant::now();
        let mut scheduler = ReplyScheduler::new(ReplyPolicy::Overlap);
        scheduler.schedule(start, Duration::ZERO, reply("a"));
        scheduler.schedule(start, Duration::ZERO, reply("b"));
        assert_eq!(scheduler.take_due(start), vec![reply("a"), reply("b")]);
    }
}
