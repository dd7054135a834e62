use std::fmt;
use std::time::{Duration, Instant};

use paneconfig::{TimingSection, PANE_COUNT};

/// Position of a pane inside the edit window, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(usize);

impl PaneId {
    pub const LEFT: PaneId = PaneId(0);
    pub const RIGHT: PaneId = PaneId(1);
    pub const ALL: [PaneId; PANE_COUNT] = [PaneId::LEFT, PaneId::RIGHT];

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane#{}", self.0)
    }
}

/// Intervals shared by every pacing primitive in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub render_interval: Duration,
    pub configure_settle: Duration,
    pub timer_period: Duration,
}

impl Pacing {
    pub fn from_config(timing: &TimingSection) -> Self {
        Self {
            render_interval: timing.render_interval,
            configure_settle: timing.configure_settle,
            timer_period: timing.timer_period,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&TimingSection::default())
    }
}

/// Per-pane debounce: admits at most one render per `min_interval`.
#[derive(Debug, Clone, Copy)]
pub struct FrameGate {
    min_interval: Duration,
    last_render: Option<Instant>,
}

impl FrameGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_render: None,
        }
    }

    /// Records `now` as the latest render when the interval has elapsed.
    ///
    /// Returns `false` (and leaves the timestamp untouched) when the previous
    /// accepted render is less than `min_interval` ago.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_render {
            if now < last + self.min_interval {
                return false;
            }
        }
        self.last_render = Some(now);
        true
    }

    pub fn last_render(&self) -> Option<Instant> {
        self.last_render
    }
}

/// Remembers when the most recent resize is expected to have settled.
#[derive(Debug, Clone, Copy)]
pub struct ConfigureTracker {
    settle: Duration,
    deadline: Option<Instant>,
}

impl ConfigureTracker {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            deadline: None,
        }
    }

    pub fn configure(&mut self, now: Instant) {
        self.deadline = Some(now + self.settle);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A pane needs a catch-up repaint when the configure deadline is later
    /// than its last render and that render is more than `settle` old.
    pub fn needs_repaint(&self, last_render: Option<Instant>, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        match last_render {
            None => true,
            Some(last) => deadline > last && last + self.settle < now,
        }
    }
}

/// Fixed-period timer expressed as a wake-up deadline for the event loop.
#[derive(Debug, Clone, Copy)]
pub struct RepaintTimer {
    period: Duration,
    next_tick: Instant,
}

impl RepaintTimer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_tick: now + period,
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_tick
    }

    /// Returns `true` once per elapsed period and re-arms from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }
        self.next_tick = now + self.period;
        true
    }
}

/// Window-level driver combining the configure tracker with the repaint timer.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pacing: Pacing,
    configure: ConfigureTracker,
    timer: RepaintTimer,
}

impl Scheduler {
    pub fn new(pacing: Pacing, now: Instant) -> Self {
        Self {
            pacing,
            configure: ConfigureTracker::new(pacing.configure_settle),
            timer: RepaintTimer::new(pacing.timer_period, now),
        }
    }

    pub fn frame_gate(&self) -> FrameGate {
        FrameGate::new(self.pacing.render_interval)
    }

    pub fn configure(&mut self, now: Instant) {
        self.configure.configure(now);
    }

    pub fn configure_deadline(&self) -> Option<Instant> {
        self.configure.deadline()
    }

    pub fn next_deadline(&self) -> Instant {
        self.timer.next_deadline()
    }

    /// Runs the periodic driver if its period has elapsed.
    ///
    /// Returns the panes that should be queued for repaint on this tick; an
    /// empty list when the timer is not due yet or no pane needs catching up.
    pub fn tick<I>(&mut self, now: Instant, last_renders: I) -> Vec<PaneId>
    where
        I: IntoIterator<Item = (PaneId, Option<Instant>)>,
    {
        if !self.timer.poll(now) {
            return Vec::new();
        }
        last_renders
            .into_iter()
            .filter(|(_, last)| self.configure.needs_repaint(*last, now))
            .map(|(pane, _)| pane)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn gate_rejects_renders_inside_interval() {
        let start = Instant::now();
        let mut gate = FrameGate::new(ms(40));
        assert!(gate.admit(start));
        assert!(!gate.admit(start + ms(10)));
        assert!(!gate.admit(start + ms(39)));
        assert_eq!(gate.last_render(), Some(start));
        assert!(gate.admit(start + ms(40)));
        assert_eq!(gate.last_render(), Some(start + ms(40)));
    }

    #[test]
    fn tracker_without_configure_never_requests() {
        let start = Instant::now();
        let tracker = ConfigureTracker::new(ms(33));
        assert!(!tracker.needs_repaint(None, start));
        assert!(!tracker.needs_repaint(Some(start), start + ms(500)));
    }

    #[test]
    fn tracker_requires_render_older_than_settle() {
        let start = Instant::now();
        let mut tracker = ConfigureTracker::new(ms(33));
        tracker.configure(start + ms(100));

        // Rendered 10ms before the resize: stale but too recent.
        let last = Some(start + ms(90));
        assert!(!tracker.needs_repaint(last, start + ms(110)));
        assert!(tracker.needs_repaint(last, start + ms(124)));

        // Rendered after the deadline: nothing to catch up.
        let fresh = Some(start + ms(140));
        assert!(!tracker.needs_repaint(fresh, start + ms(400)));
    }

    #[test]
    fn tracker_comparisons_are_strict() {
        let start = Instant::now();
        let settle = ms(33);
        let mut tracker = ConfigureTracker::new(settle);
        tracker.configure(start);
        let deadline = start + settle;

        // A render exactly at the deadline counts as up to date.
        assert!(!tracker.needs_repaint(Some(deadline), deadline + ms(500)));
        assert!(tracker.needs_repaint(Some(deadline - ms(1)), deadline + ms(500)));

        // A render exactly `settle` old is still too recent.
        let last = start + ms(10);
        assert!(!tracker.needs_repaint(Some(last), last + settle));
        assert!(tracker.needs_repaint(Some(last), last + settle + Duration::from_nanos(1)));
    }

    #[test]
    fn timer_fires_once_per_period() {
        let start = Instant::now();
        let mut timer = RepaintTimer::new(ms(16), start);
        assert!(!timer.poll(start + ms(5)));
        assert!(timer.poll(start + ms(16)));
        assert!(!timer.poll(start + ms(20)));
        assert_eq!(timer.next_deadline(), start + ms(32));
        assert!(timer.poll(start + ms(50)));
        assert_eq!(timer.next_deadline(), start + ms(66));
    }

    #[test]
    fn idle_window_never_requests_repaint() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(Pacing::default(), start);
        for step in 1..=100 {
            let now = start + ms(16 * step);
            let requests = scheduler.tick(now, PaneId::ALL.map(|pane| (pane, None)));
            assert!(requests.is_empty());
        }
    }

    #[test]
    fn single_resize_requests_each_pane_once_per_tick() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(Pacing::default(), start);
        let rendered = start + ms(1);
        scheduler.configure(start + ms(2));

        let requests = scheduler.tick(
            start + ms(42),
            PaneId::ALL.map(|pane| (pane, Some(rendered))),
        );
        assert_eq!(requests, vec![PaneId::LEFT, PaneId::RIGHT]);
    }

    #[test]
    fn rendered_pane_is_not_requested_again() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(Pacing::default(), start);
        scheduler.configure(start);
        let deadline = scheduler.configure_deadline().unwrap();

        let requests = scheduler.tick(
            start + ms(100),
            [
                (PaneId::LEFT, Some(deadline + ms(1))),
                (PaneId::RIGHT, None),
            ],
        );
        assert_eq!(requests, vec![PaneId::RIGHT]);
    }

    #[test]
    fn pane_ids_are_ordered_left_to_right() {
        assert_eq!(PaneId::ALL.map(PaneId::index), [0, 1]);
        assert_eq!(PaneId::LEFT.to_string(), "pane#0");
        assert_eq!(PaneId::RIGHT.to_string(), "pane#1");
    }
}
