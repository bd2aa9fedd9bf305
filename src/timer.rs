use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Entry<E> {
    id: TimerId,
    deadline: Instant,
    every: Option<Duration>,
    event: E,
}

/// Delayed-callback queue driven from the main loop.
///
/// Timers fire only from [`Timers::take_due`]. Cancelling removes the entry
/// outright, so a cancelled timer can never fire afterwards.
pub struct Timers<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E: Clone> Timers<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    pub fn once(&mut self, deadline: Instant, event: E) -> TimerId {
        let id = self.alloc_id();
        self.entries.push(Entry {
            id,
            deadline,
            every: None,
            event,
        });
        id
    }

    /// Fire `event` every `period`, first at `start + period`.
    pub fn every(&mut self, start: Instant, period: Duration, event: E) -> TimerId {
        let id = self.alloc_id();
        self.entries.push(Entry {
            id,
            deadline: start + period,
            every: Some(period),
            event,
        });
        id
    }

    /// Returns false when the timer already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self, ids: impl IntoIterator<Item = TimerId>) {
        for id in ids {
            self.cancel(id);
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Pop every event due at `now`, earliest deadline first. A recurring
    /// timer fires at most once per call and is re-armed one period later;
    /// if it has fallen a full period behind it re-arms from `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<E> {
        let mut due: Vec<(Instant, TimerId, E)> = Vec::new();

        self.entries.retain_mut(|entry| {
            if entry.deadline > now {
                return true;
            }
            due.push((entry.deadline, entry.id, entry.event.clone()));
            match entry.every {
                Some(period) => {
                    let next = entry.deadline + period;
                    entry.deadline = if next <= now { now + period } else { next };
                    true
                }
                None => false,
            }
        });

        due.sort_by_key(|(deadline, id, _)| (*deadline, id.0));
        due.into_iter().map(|(_, _, event)| event).collect()
    }
}

impl<E: Clone> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_once_fires_once_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.once(t0 + ms(200), "b");
        timers.once(t0 + ms(100), "a");
        timers.once(t0 + ms(900), "late");

        assert!(timers.take_due(t0).is_empty());
        assert_eq!(timers.take_due(t0 + ms(250)), vec!["a", "b"]);
        assert!(timers.take_due(t0 + ms(300)).is_empty());
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(900)));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = timers.once(t0 + ms(10), 1);
        let tick = timers.every(t0, ms(10), 2);

        assert!(timers.cancel(id));
        assert!(timers.cancel(tick));
        assert!(!timers.cancel(tick));
        assert!(timers.take_due(t0 + ms(1000)).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_recurring_rearms() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = timers.every(t0, ms(100), "tick");

        assert!(timers.take_due(t0 + ms(99)).is_empty());
        assert_eq!(timers.take_due(t0 + ms(100)), vec!["tick"]);
        assert!(timers.take_due(t0 + ms(150)).is_empty());
        assert_eq!(timers.take_due(t0 + ms(200)), vec!["tick"]);
        assert!(timers.is_pending(id));
    }

    #[test]
    fn test_recurring_far_behind_fires_once_and_rearms_from_now() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.every(t0, ms(100), ());

        assert_eq!(timers.take_due(t0 + ms(1000)).len(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(1100)));
    }

    #[test]
    fn test_restart_with_new_period() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let slow = timers.every(t0, ms(2000), "slow");

        let t1 = t0 + ms(500);
        timers.cancel(slow);
        timers.every(t1, ms(250), "fast");

        assert_eq!(timers.take_due(t1 + ms(250)), vec!["fast"]);
        assert!(timers.take_due(t0 + ms(2000)).iter().all(|e| *e == "fast"));
    }
}
