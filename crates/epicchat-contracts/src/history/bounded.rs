/// Append-only sequence that evicts its oldest entries past `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    entries: Vec<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Keeps only the newest `capacity` items of `entries`.
    pub fn from_entries(entries: Vec<T>, capacity: usize) -> Self {
        let mut log = Self {
            entries,
            capacity: capacity.max(1),
        };
        log.trim();
        log
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
        self.trim();
    }

    pub fn recent(&self, n: usize) -> &[T] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.last()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoundedLog;

    #[test]
    fn push_evicts_oldest_first() {
        let mut log = BoundedLog::new(3);
        for value in 1..=5 {
            log.push(value);
        }
        assert_eq!(log.entries(), &[3, 4, 5]);
        assert_eq!(log.last(), Some(&5));
    }

    #[test]
    fn from_entries_keeps_newest() {
        let log = BoundedLog::from_entries((0..150).collect(), 100);
        assert_eq!(log.len(), 100);
        assert_eq!(log.entries().first(), Some(&50));
        assert_eq!(log.recent(3), &[147, 148, 149]);
    }

    #[test]
    fn recent_clamps_to_length() {
        let log = BoundedLog::from_entries(vec!["a", "b"], 10);
        assert_eq!(log.recent(20), &["a", "b"]);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut log = BoundedLog::new(0);
        log.push('x');
        log.push('y');
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries(), &['y']);
    }
}
