use std::sync::atomic::{AtomicU32, Ordering};

/// Count of requests served from the static asset scope.
///
/// Lives inside [`crate::AppState`]; every worker shares the same instance.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU32,
}

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one asset request and return the new total.
    pub fn record(&self) -> u32 {
        self.hits.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn current(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero_and_resets() {
        let counter = HitCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.record(), 1);
        assert_eq!(counter.record(), 2);
        counter.reset();
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let counter = Arc::new(HitCounter::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.record();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread panicked");
        }
        assert_eq!(counter.current(), 8_000);
    }
}
