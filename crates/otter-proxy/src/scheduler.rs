//! Deferred call scheduling
//!
//! Single-threaded timer queue used for deferred invocation. Timers run
//! earliest deadline first; timers with the same deadline run in the order
//! they were scheduled. Nothing runs until the owner drives the queue with
//! [`Scheduler::run_ready`], [`Scheduler::advance`] or
//! [`Scheduler::run_until_idle`].

use crate::config::SchedulerConfig;
use crate::error::{ProxyError, ProxyResult};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::{Duration, Instant};

const TRACE_TARGET: &str = "otter::proxy::scheduler";

/// Unique timer identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Timer callback; an error is reported by the run that executed it
pub type TimerCallback = Box<dyn FnOnce() -> ProxyResult<()>>;

/// Time source
#[derive(Debug)]
enum Clock {
    /// Wall clock, measured from scheduler creation
    Real(Instant),
    /// Clock that only moves when the scheduler is advanced
    Manual(Cell<Duration>),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::Real(origin) => origin.elapsed(),
            Clock::Manual(now) => now.get(),
        }
    }
}

struct TimerEntry {
    deadline: Duration,
    id: u64,
    nesting_level: u32,
    callback: TimerCallback,
}

// BinaryHeap is a max-heap; reverse so the earliest (deadline, id) is on top.
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for TimerEntry {}

/// Outcome of driving the scheduler
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of callbacks executed
    pub executed: usize,
    /// Errors returned by callbacks, in execution order
    pub errors: Vec<ProxyError>,
}

impl RunReport {
    /// Whether every executed callback succeeded
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: RunReport) {
        self.executed += other.executed;
        self.errors.extend(other.errors);
    }
}

/// Single-threaded timer queue
pub struct Scheduler {
    clock: Clock,
    config: SchedulerConfig,
    timers: RefCell<BinaryHeap<TimerEntry>>,
    next_timer_id: Cell<u64>,
    /// Nesting level of the callback currently running (0 outside callbacks)
    nesting_level: Cell<u32>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler on the wall clock
    pub fn new() -> Rc<Self> {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a wall-clock scheduler with explicit clamping rules
    pub fn with_config(config: SchedulerConfig) -> Rc<Self> {
        Rc::new(Self::build(Clock::Real(Instant::now()), config))
    }

    /// Create a scheduler whose clock only moves on [`Scheduler::advance`]
    /// and [`Scheduler::run_until_idle`]
    pub fn manual() -> Rc<Self> {
        Self::manual_with_config(SchedulerConfig::default())
    }

    /// Manual-clock scheduler with explicit clamping rules
    pub fn manual_with_config(config: SchedulerConfig) -> Rc<Self> {
        Rc::new(Self::build(Clock::Manual(Cell::new(Duration::ZERO)), config))
    }

    fn build(clock: Clock, config: SchedulerConfig) -> Self {
        Self {
            clock,
            config,
            timers: RefCell::new(BinaryHeap::new()),
            next_timer_id: Cell::new(1),
            nesting_level: Cell::new(0),
        }
    }

    /// Time elapsed since the scheduler was created
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Number of timers waiting to run
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Whether no timers are waiting
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().peek().map(|entry| entry.deadline)
    }

    /// Schedule a one-shot callback to run after at least `delay`
    pub fn set_timeout<F>(&self, callback: F, delay: Duration) -> TimerId
    where
        F: FnOnce() -> ProxyResult<()> + 'static,
    {
        let (id, deadline, nesting_level) = self.prepare_timer(delay);
        self.timers.borrow_mut().push(TimerEntry {
            deadline,
            id: id.0,
            nesting_level,
            callback: Box::new(callback),
        });
        tracing::debug!(
            target: TRACE_TARGET,
            timer = id.0,
            delay_ms = delay.as_millis() as u64,
            nesting_level,
            "timer scheduled"
        );
        id
    }

    /// Timer ID, deadline, and nesting level; deeply nested timers are
    /// clamped to the configured minimum delay
    fn prepare_timer(&self, delay: Duration) -> (TimerId, Duration, u32) {
        let nesting_level = self.nesting_level.get().saturating_add(1);
        let clamped_delay = if nesting_level > self.config.max_nesting_level {
            delay.max(self.config.min_timeout())
        } else {
            delay
        };

        let id = self.next_timer_id.get();
        self.next_timer_id.set(id + 1);
        (TimerId(id), self.now() + clamped_delay, nesting_level)
    }

    /// Pop the earliest timer if its deadline is at or before `limit`
    fn pop_due(&self, limit: Duration) -> Option<TimerEntry> {
        let mut timers = self.timers.borrow_mut();
        if timers.peek()?.deadline <= limit {
            timers.pop()
        } else {
            None
        }
    }

    fn run_entry(&self, entry: TimerEntry, report: &mut RunReport) {
        let previous = self.nesting_level.replace(entry.nesting_level);
        let result = (entry.callback)();
        self.nesting_level.set(previous);

        report.executed += 1;
        match result {
            Ok(()) => tracing::debug!(target: TRACE_TARGET, timer = entry.id, "timer ran"),
            Err(err) => {
                tracing::debug!(target: TRACE_TARGET, timer = entry.id, error = %err, "timer failed");
                report.errors.push(err);
            }
        }
    }

    /// Run every timer whose deadline has passed
    ///
    /// Timers scheduled by these callbacks run too if they are already due.
    pub fn run_ready(&self) -> RunReport {
        let mut report = RunReport::default();
        while let Some(entry) = self.pop_due(self.now()) {
            self.run_entry(entry, &mut report);
        }
        report
    }

    /// Move time forward by `by` and run what became due
    ///
    /// On a manual clock the clock steps to each timer's deadline before
    /// running it, so callbacks observe their own deadline as the current
    /// time. On the wall clock this sleeps.
    pub fn advance(&self, by: Duration) -> RunReport {
        match &self.clock {
            Clock::Manual(now) => {
                let until = now.get() + by;
                let mut report = RunReport::default();
                while let Some(entry) = self.pop_due(until) {
                    if entry.deadline > now.get() {
                        now.set(entry.deadline);
                    }
                    self.run_entry(entry, &mut report);
                }
                now.set(until);
                report
            }
            Clock::Real(_) => {
                std::thread::sleep(by);
                self.run_ready()
            }
        }
    }

    /// Run timers until none are left, waiting for each deadline
    pub fn run_until_idle(&self) -> RunReport {
        let mut report = RunReport::default();
        while let Some(deadline) = self.next_deadline() {
            let now = self.now();
            let wait = deadline.saturating_sub(now);
            report.merge(self.advance(wait));
        }
        report
    }
}
