use std::time::Duration;

/// Smallest period a repeating task may use.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Identifies a task registered with a [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Numeric identifier of the handle, unique within its scheduler.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Task<T> {
    handle: TaskHandle,
    deadline: Duration,
    period: Option<Duration>,
    payload: T,
}

/// Cancelable one-shot and repeating timers driven by an external clock.
///
/// The scheduler never reads time itself. Owners pass the current time when
/// registering tasks and drain due tasks one at a time through
/// [`Scheduler::pop_due`], so handling a task may cancel tasks that are also
/// due without them firing afterwards.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_handle: u64,
    tasks: Vec<Task<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_handle: 0,
            tasks: Vec::new(),
        }
    }

    /// Registers a task that fires once, `delay` after `now`.
    pub fn schedule_once(&mut self, now: Duration, delay: Duration, payload: T) -> TaskHandle {
        self.push(now.saturating_add(delay), None, payload)
    }

    /// Registers a task that fires every `period`, first at `now + period`.
    pub fn schedule_repeating(&mut self, now: Duration, period: Duration, payload: T) -> TaskHandle {
        let period = period.max(MIN_PERIOD);
        self.push(now.saturating_add(period), Some(period), payload)
    }

    /// Removes a task. Returns `false` when the handle already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.handle != handle);
        self.tasks.len() != before
    }

    /// Reports whether the task is still pending.
    #[must_use]
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|task| task.handle == handle)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Reports whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.iter().map(|task| task.deadline).min()
    }

    /// Cancels every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    fn push(&mut self, deadline: Duration, period: Option<Duration>, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.tasks.push(Task {
            handle,
            deadline,
            period,
            payload,
        });
        handle
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pops the earliest task due at `now`, ties broken by registration order.
    ///
    /// Repeating tasks are rescheduled one period later and may be returned
    /// again by the next call when `now` skipped several periods.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TaskHandle, T)> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.deadline <= now)
            .min_by_key(|(_, task)| (task.deadline, task.handle))
            .map(|(index, _)| index)?;

        match self.tasks[index].period {
            Some(period) => {
                let task = &mut self.tasks[index];
                task.deadline = task.deadline.saturating_add(period);
                Some((task.handle, task.payload.clone()))
            }
            None => {
                let task = self.tasks.swap_remove(index);
                Some((task.handle, task.payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(scheduler: &mut Scheduler<&'static str>, now: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some((_, payload)) = scheduler.pop_due(now) {
            fired.push(payload);
        }
        fired
    }

    #[test]
    fn tasks_fire_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule_once(ms(0), ms(300), "late");
        let _ = scheduler.schedule_once(ms(0), ms(100), "early");
        let _ = scheduler.schedule_once(ms(0), ms(200), "middle");

        assert_eq!(drain(&mut scheduler, ms(50)), Vec::<&str>::new());
        assert_eq!(drain(&mut scheduler, ms(300)), vec!["early", "middle", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn repeating_task_catches_up_after_a_long_jump() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_repeating(ms(0), ms(100), "tick");

        assert_eq!(drain(&mut scheduler, ms(350)).len(), 3);
        assert!(scheduler.is_scheduled(handle));
        assert_eq!(drain(&mut scheduler, ms(400)).len(), 1);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let interval = scheduler.schedule_repeating(ms(0), ms(100), "interval");
        let revert = scheduler.schedule_once(ms(0), ms(150), "revert");

        assert!(scheduler.cancel(revert));
        assert!(!scheduler.cancel(revert));
        assert_eq!(drain(&mut scheduler, ms(200)), vec!["interval", "interval"]);

        assert!(scheduler.cancel(interval));
        assert_eq!(drain(&mut scheduler, ms(1_000)), Vec::<&str>::new());
    }

    #[test]
    fn cancelling_between_pops_suppresses_due_tasks() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule_once(ms(0), ms(10), "first");
        let second = scheduler.schedule_once(ms(0), ms(20), "second");

        assert_eq!(scheduler.pop_due(ms(30)).map(|(_, p)| p), Some("first"));
        assert!(scheduler.cancel(second));
        assert_eq!(scheduler.pop_due(ms(30)), None);
    }

    #[test]
    fn next_deadline_tracks_the_earliest_pending_task() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_deadline(), None);

        let _ = scheduler.schedule_repeating(ms(0), ms(500), "interval");
        let revert = scheduler.schedule_once(ms(0), ms(200), "revert");
        assert_eq!(scheduler.next_deadline(), Some(ms(200)));

        assert!(scheduler.cancel(revert));
        assert_eq!(scheduler.next_deadline(), Some(ms(500)));
        let _ = scheduler.pop_due(ms(500));
        assert_eq!(scheduler.next_deadline(), Some(ms(1_000)));
    }

    #[test]
    fn zero_period_is_lifted_to_minimum() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule_repeating(ms(0), Duration::ZERO, "spin");
        assert_eq!(drain(&mut scheduler, ms(3)).len(), 3);
    }
}
