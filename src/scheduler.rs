//! Single-threaded queue of delayed and periodic tasks.
//!
//! Nothing here sleeps or spawns: the owner asks for the tasks that are due
//! at a given instant and runs them itself. Time comes from a [`Clock`], so
//! tests drive it with a [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    due: Duration,
    period: Option<Duration>,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, now: Duration, delay: Duration, task: T) -> TaskId {
        self.push(now + delay, None, task)
    }

    /// First run happens one `interval` after `now`. A zero interval is
    /// treated as one millisecond so a periodic task cannot starve the queue.
    pub fn schedule_every(&mut self, now: Duration, interval: Duration, task: T) -> TaskId {
        let interval = interval.max(Duration::from_millis(1));
        self.push(now + interval, Some(interval), task)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every task due at `now`, earliest first.
    ///
    /// Periodic tasks are re-armed for their next period after `now`; a task
    /// that missed several periods runs once.
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let mut due: Vec<(Duration, TaskId, T)> = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut entry in self.entries.drain(..) {
            if entry.due > now {
                kept.push(entry);
                continue;
            }

            due.push((entry.due, entry.id, entry.task.clone()));
            if let Some(period) = entry.period {
                while entry.due <= now {
                    entry.due += period;
                }
                kept.push(entry);
            }
        }

        self.entries = kept;
        due.sort_by_key(|(at, id, _)| (*at, id.0));
        due.into_iter().map(|(_, _, task)| task).collect()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    fn push(&mut self, due: Duration, period: Option<Duration>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due,
            period,
            task,
        });
        id
    }
}
