//! Interval timers on a virtual clock.
//!
//! The [`Scheduler`] never sleeps. Time moves only when [`Scheduler::advance`]
//! is called, either by the app loop (driven by a tokio interval) or directly
//! by tests. Due ticks fire in `(due time, timer id)` order, and no borrow of
//! the scheduler is held while a callback runs, so callbacks may schedule or
//! cancel timers (including their own).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::trace;

/// Identifies an interval registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type TickFn = Rc<dyn Fn(&IntervalHandle)>;

struct Interval {
    period: Duration,
    due: Duration,
    callback: TickFn,
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    intervals: BTreeMap<TimerId, Interval>,
}

impl SchedulerState {
    /// The earliest due interval at or before `limit`.
    fn next_due_before(&self, limit: Duration) -> Option<(TimerId, Duration)> {
        self.intervals
            .iter()
            .filter(|(_, iv)| iv.due <= limit)
            .min_by_key(|(id, iv)| (iv.due, **id))
            .map(|(id, iv)| (*id, iv.due))
    }
}

/// Shared handle to the timer scheduler.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scheduler")
            .field("now", &state.now)
            .field("pending", &state.intervals.len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run every `period`, first at `now + period`.
    ///
    /// A zero period is clamped to one millisecond.
    pub fn set_interval(
        &self,
        period: Duration,
        callback: impl Fn(&IntervalHandle) + 'static,
    ) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let due = state.now + period;
        state.intervals.insert(
            id,
            Interval {
                period,
                due,
                callback: Rc::new(callback),
            },
        );
        trace!(?id, ?period, "interval registered");
        id
    }

    /// Stop an interval. Returns `false` if it was not active.
    pub fn cancel(&self, id: TimerId) -> bool {
        let removed = self.state.borrow_mut().intervals.remove(&id).is_some();
        if removed {
            trace!(?id, "interval cancelled");
        }
        removed
    }

    /// Whether `id` is still scheduled.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.state.borrow().intervals.contains_key(&id)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of active intervals.
    pub fn pending(&self) -> usize {
        self.state.borrow().intervals.len()
    }

    /// The next time any interval is due.
    pub fn next_due(&self) -> Option<Duration> {
        self.state.borrow().intervals.values().map(|iv| iv.due).min()
    }

    /// Move the clock forward by `by`, firing every tick that falls due.
    ///
    /// An interval whose period elapses several times fires once per elapsed
    /// period. Returns the number of ticks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let limit = self.now() + by;
        let mut fired = 0;
        loop {
            let tick = {
                let mut state = self.state.borrow_mut();
                let Some((id, due)) = state.next_due_before(limit) else {
                    break;
                };
                state.now = due;
                state.intervals.get_mut(&id).map(|iv| {
                    iv.due += iv.period;
                    (id, Rc::clone(&iv.callback))
                })
            };
            if let Some((id, callback)) = tick {
                let handle = IntervalHandle {
                    id,
                    scheduler: Rc::downgrade(&self.state),
                };
                callback(&handle);
                fired += 1;
            }
        }
        self.state.borrow_mut().now = limit;
        fired
    }
}

/// Passed to every tick; lets a callback cancel its own interval.
#[derive(Clone)]
pub struct IntervalHandle {
    id: TimerId,
    scheduler: Weak<RefCell<SchedulerState>>,
}

impl fmt::Debug for IntervalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalHandle").field("id", &self.id).finish()
    }
}

impl IntervalHandle {
    /// The interval this tick belongs to.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Stop this interval. Further ticks will not fire.
    pub fn cancel(&self) {
        if let Some(state) = self.scheduler.upgrade() {
            state.borrow_mut().intervals.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&IntervalHandle) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move |_: &IntervalHandle| c.set(c.get() + 1))
    }

    #[test]
    fn fires_once_per_elapsed_period() {
        let scheduler = Scheduler::new();
        let (count, tick) = counter();
        scheduler.set_interval(Duration::from_millis(100), tick);
        assert_eq!(scheduler.advance(Duration::from_millis(99)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(scheduler.advance(Duration::from_millis(350)), 3);
        assert_eq!(count.get(), 4);
        assert_eq!(scheduler.now(), Duration::from_millis(450));
    }

    #[test]
    fn ticks_fire_in_due_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("slow", 30), ("fast", 20)] {
            let log = Rc::clone(&log);
            scheduler.set_interval(Duration::from_millis(ms), move |_| log.borrow_mut().push(name));
        }
        scheduler.advance(Duration::from_millis(60));
        assert_eq!(*log.borrow(), vec!["fast", "slow", "fast", "fast", "slow"]);
    }

    #[test]
    fn cancel_from_inside_the_callback() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = scheduler.set_interval(Duration::from_millis(10), move |handle| {
            c.set(c.get() + 1);
            if c.get() == 2 {
                handle.cancel();
            }
        });
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(count.get(), 2);
        assert!(!scheduler.is_active(id));
    }

    #[test]
    fn cancel_stops_future_ticks() {
        let scheduler = Scheduler::new();
        let (count, tick) = counter();
        let id = scheduler.set_interval(Duration::from_millis(10), tick);
        scheduler.advance(Duration::from_millis(10));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        let scheduler = Scheduler::new();
        let (count, tick) = counter();
        scheduler.set_interval(Duration::ZERO, tick);
        scheduler.advance(Duration::from_millis(5));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn callbacks_may_schedule_new_intervals() {
        let scheduler = Scheduler::new();
        let s = scheduler.clone();
        scheduler.set_interval(Duration::from_millis(10), move |handle| {
            handle.cancel();
            s.set_interval(Duration::from_millis(10), |_| {});
        });
        scheduler.advance(Duration::from_millis(10));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(20)));
    }
}
