//! Operation lifecycle state: the single-flight busy flag, its watchdog,
//! and the periodic stuck-state sweep.
//!
//! Backend calls are black boxes with no cancellation primitive, so a hung
//! request would otherwise leave the UI disabled forever. The watchdog and
//! sweep force the state back to idle; the generation counter lets late
//! completions from abandoned operations be dropped on arrival.

use std::time::{Duration, Instant};

/// Hard ceiling on a single operation's visible busy state.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the stuck-state sweep runs.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(15);

/// Busy-with-no-activity duration after which the sweep declares the
/// operation stuck.
pub const STUCK_THRESHOLD: Duration = Duration::from_secs(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetReason {
    Watchdog,
    Sweep,
}

/// Tagged state transition, returned so the caller can log each kind
/// distinctly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Started,
    Preempted { abandoned: String },
    Completed,
    ForcedIdle { reason: ResetReason, abandoned: String },
}

pub struct Lifecycle {
    busy: bool,
    description: String,
    generation: u64,
    watchdog_deadline: Option<Instant>,
    last_activity: Option<Instant>,
    next_sweep: Instant,
}

impl Lifecycle {
    pub fn new(now: Instant) -> Self {
        Self {
            busy: false,
            description: String::new(),
            generation: 0,
            watchdog_deadline: None,
            last_activity: None,
            next_sweep: now + SWEEP_PERIOD,
        }
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a continuation issued under `generation` is still current.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn watchdog_armed(&self) -> bool {
        self.watchdog_deadline.is_some()
    }

    /// Enter the busy state for a new operation. If an operation is already
    /// visible it is treated as abandoned, not queued: its continuation is
    /// invalidated and the new operation takes over immediately.
    pub fn begin<S: Into<String>>(&mut self, description: S, now: Instant) -> Transition {
        let preempted = if self.busy {
            self.generation += 1;
            Some(std::mem::take(&mut self.description))
        } else {
            None
        };

        self.busy = true;
        self.description = description.into();
        self.watchdog_deadline = Some(now + WATCHDOG_TIMEOUT);
        self.last_activity = Some(now);

        match preempted {
            Some(abandoned) => Transition::Preempted { abandoned },
            None => Transition::Started,
        }
    }

    /// Normal completion. Clears the watchdog without invalidating the
    /// generation; the completing continuation has already been consumed.
    pub fn end(&mut self) -> Transition {
        self.busy = false;
        self.description.clear();
        self.watchdog_deadline = None;
        Transition::Completed
    }

    /// Run the per-loop-iteration checks. The watchdog is checked every
    /// call; the sweep only on its own schedule. Returns a transition only
    /// when a forced reset happened.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        if self.busy
            && let Some(deadline) = self.watchdog_deadline
            && now >= deadline
        {
            return Some(self.force_idle(ResetReason::Watchdog));
        }

        if now >= self.next_sweep {
            self.next_sweep = now + SWEEP_PERIOD;
            if self.busy
                && let Some(last) = self.last_activity
                && now.duration_since(last) > STUCK_THRESHOLD
            {
                return Some(self.force_idle(ResetReason::Sweep));
            }
        }

        None
    }

    fn force_idle(&mut self, reason: ResetReason) -> Transition {
        let abandoned = std::mem::take(&mut self.description);
        self.busy = false;
        self.watchdog_deadline = None;
        self.generation += 1;
        Transition::ForcedIdle { reason, abandoned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariant(lc: &Lifecycle) {
        assert_eq!(lc.busy(), lc.watchdog_armed());
    }

    #[test]
    fn begin_then_end() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);
        assert_invariant(&lc);

        assert_eq!(lc.begin("Pushing...", t0), Transition::Started);
        assert!(lc.busy());
        assert_eq!(lc.description(), "Pushing...");
        assert_invariant(&lc);

        assert_eq!(lc.end(), Transition::Completed);
        assert!(!lc.busy());
        assert_invariant(&lc);
    }

    #[test]
    fn begin_while_busy_preempts_and_invalidates() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);

        lc.begin("Pushing...", t0);
        let old_generation = lc.generation();

        let transition = lc.begin("Pulling...", t0 + Duration::from_secs(1));
        assert_eq!(
            transition,
            Transition::Preempted {
                abandoned: "Pushing...".to_string()
            }
        );
        assert!(lc.busy());
        assert_eq!(lc.description(), "Pulling...");
        assert!(!lc.is_current(old_generation));
        assert_invariant(&lc);
    }

    #[test]
    fn sweep_forces_idle_after_stuck_threshold() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);
        lc.begin("Pushing...", t0);

        // First sweep boundary: 15 elapsed, under the 20 threshold.
        assert_eq!(lc.tick(t0 + Duration::from_secs(15)), None);
        assert!(lc.busy());

        let forced = lc.tick(t0 + Duration::from_secs(21));
        assert_eq!(
            forced,
            Some(Transition::ForcedIdle {
                reason: ResetReason::Sweep,
                abandoned: "Pushing...".to_string()
            })
        );
        assert!(!lc.busy());
        assert_invariant(&lc);

        // Subsequent ticks stay quiet: exactly one forced transition.
        assert_eq!(lc.tick(t0 + Duration::from_secs(22)), None);
        assert_eq!(lc.tick(t0 + Duration::from_secs(40)), None);
    }

    #[test]
    fn watchdog_fires_when_sweep_is_not_due() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);
        lc.begin("Pushing...", t0);

        // Sweep runs at 16 (elapsed under threshold) and reschedules to 31.
        assert_eq!(lc.tick(t0 + Duration::from_secs(16)), None);

        // At 30 the sweep is not due yet but the watchdog deadline is.
        let forced = lc.tick(t0 + Duration::from_secs(30));
        assert_eq!(
            forced,
            Some(Transition::ForcedIdle {
                reason: ResetReason::Watchdog,
                abandoned: "Pushing...".to_string()
            })
        );
        assert_invariant(&lc);
    }

    #[test]
    fn forced_reset_invalidates_continuation() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);
        lc.begin("Pushing...", t0);
        let generation = lc.generation();
        assert!(lc.is_current(generation));

        lc.tick(t0 + Duration::from_secs(21));
        assert!(!lc.is_current(generation));

        // A fresh operation after the reset is current again.
        lc.begin("Pulling...", t0 + Duration::from_secs(25));
        assert!(lc.is_current(lc.generation()));
        assert_ne!(lc.generation(), generation);
    }

    #[test]
    fn end_without_begin_is_harmless() {
        let t0 = Instant::now();
        let mut lc = Lifecycle::new(t0);
        lc.end();
        assert!(!lc.busy());
        assert_invariant(&lc);
    }
}
