//! Timer abstraction for deferred controller work.
//!
//! The controller never sleeps: it hands a [`Task`] and a delay to a
//! [`Scheduler`] and the host asks for due tasks whenever it gets control
//! back. Timers cannot be cancelled; stale tasks find their target gone and
//! do nothing.

use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    time::{Duration, Instant},
};

use crate::interaction::dom::NodeId;

/// Deferred work the controller knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Natively submit `form` if `generation` is still the pending selection.
    SubmitForm { form: NodeId, generation: u64 },
    /// Drop a notification banner that is still on the page.
    ExpireNotification { notification: NodeId },
}

pub trait Scheduler {
    /// Time elapsed on this scheduler's clock.
    fn now(&self) -> Duration;

    fn schedule(&mut self, delay: Duration, task: Task);

    /// Removes and returns every task whose deadline has passed, earliest first.
    fn take_due(&mut self) -> Vec<Task>;

    /// Deadline of the next pending task, if any.
    fn next_deadline(&self) -> Option<Duration>;
}

#[derive(Debug)]
struct Entry {
    deadline: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest deadline; ties keep schedule order.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deadline-ordered queue shared by the scheduler implementations.
#[derive(Debug, Default)]
struct TimerQueue {
    entries: BinaryHeap<Entry>,
    next_seq: u64,
}

impl TimerQueue {
    fn push(&mut self, deadline: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            deadline,
            seq,
            task,
        });
    }

    fn pop_due(&mut self, now: Duration) -> Vec<Task> {
        let mut due = Vec::new();
        while self.entries.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = self.entries.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.entries.peek().map(|entry| entry.deadline)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Deterministic clock that only moves when told to.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    queue: TimerQueue,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, task: Task) {
        self.queue.push(self.now + delay, task);
    }

    fn take_due(&mut self) -> Vec<Task> {
        self.queue.pop_due(self.now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }
}

/// Monotonic wall-clock scheduler for real hosts.
#[derive(Debug)]
pub struct SystemScheduler {
    origin: Instant,
    queue: TimerQueue,
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            queue: TimerQueue::default(),
        }
    }

    /// How long the host may idle before the next task is due.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_sub(self.now()))
    }
}

impl Scheduler for SystemScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&mut self, delay: Duration, task: Task) {
        let deadline = self.now() + delay;
        self.queue.push(deadline, task);
    }

    fn take_due(&mut self) -> Vec<Task> {
        let now = self.now();
        self.queue.pop_due(now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::dom::Document;

    fn expire(doc: &mut Document) -> Task {
        let body = doc.body();
        Task::ExpireNotification {
            notification: doc.append_new(body, "div", &[]),
        }
    }

    #[test]
    fn virtual_scheduler_fires_only_when_due() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        let task = expire(&mut doc);
        scheduler.schedule(Duration::from_millis(5000), task);

        scheduler.advance(Duration::from_millis(4999));
        assert!(scheduler.take_due().is_empty());

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(scheduler.take_due(), vec![task]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn due_tasks_come_out_in_deadline_then_schedule_order() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        let late = expire(&mut doc);
        let early_a = expire(&mut doc);
        let early_b = expire(&mut doc);
        scheduler.schedule(Duration::from_millis(300), late);
        scheduler.schedule(Duration::from_millis(100), early_a);
        scheduler.schedule(Duration::from_millis(100), early_b);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(scheduler.take_due(), vec![early_a, early_b, late]);
    }

    #[test]
    fn next_deadline_tracks_earliest_entry() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        assert_eq!(scheduler.next_deadline(), None);
        scheduler.advance(Duration::from_millis(10));
        scheduler.schedule(Duration::from_millis(1000), expire(&mut doc));
        scheduler.schedule(Duration::from_millis(50), expire(&mut doc));
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(60)));
    }

    #[test]
    fn system_scheduler_runs_zero_delay_tasks() {
        let mut doc = Document::new();
        let mut scheduler = SystemScheduler::new();
        let task = expire(&mut doc);
        scheduler.schedule(Duration::ZERO, task);
        assert_eq!(scheduler.take_due(), vec![task]);
        assert_eq!(scheduler.time_until_next(), None);
    }

    #[test]
    fn system_scheduler_holds_future_tasks() {
        let mut doc = Document::new();
        let mut scheduler = SystemScheduler::new();
        scheduler.schedule(Duration::from_secs(3600), expire(&mut doc));
        assert!(scheduler.take_due().is_empty());
        assert!(scheduler.time_until_next().is_some());
    }
}
