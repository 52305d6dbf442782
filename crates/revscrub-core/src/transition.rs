//! Fixed-frame-rate transition driver
//!
//! A transition is a callback fired `total` times, `1/fps` apart, with its
//! progress. The first tick fires as soon as the transition is started; later
//! ticks fire from [`Scheduler::tick`], which catches up on every tick that fell
//! due since the previous call. There is no cancellation: callbacks check
//! whatever they animate and turn into no-ops once it is gone.

use std::time::{Duration, Instant};

/// Ease curve `3x² - 2x³`, with `x` clamped to `0..=1`
pub fn smoothstep(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// One firing of a transition callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 0-based tick number
    pub index: usize,
    pub total: usize,
}

impl Tick {
    /// Linear progress `(index + 1) / total`
    pub fn ratio(&self) -> f32 {
        (self.index + 1) as f32 / self.total as f32
    }

    /// Progress through [`smoothstep`]
    pub fn eased(&self) -> f32 {
        smoothstep(self.ratio())
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

type Callback<C> = Box<dyn FnMut(Tick, &mut C)>;

struct Transition<C> {
    started: Instant,
    interval: Duration,
    total: usize,
    fired: usize,
    callback: Callback<C>,
}

impl<C> Transition<C> {
    fn due(&self, now: Instant) -> bool {
        self.fired < self.total && self.started + self.interval * self.fired as u32 <= now
    }

    fn fire(&mut self, ctx: &mut C) {
        let tick = Tick {
            index: self.fired,
            total: self.total,
        };
        self.fired += 1;
        (self.callback)(tick, ctx);
    }

    fn is_done(&self) -> bool {
        self.fired >= self.total
    }
}

/// Interleaves independent transitions over a shared context `C`
pub struct Scheduler<C> {
    transitions: Vec<Transition<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Start a transition of `round(fps * duration)` ticks (at least one) and
    /// fire its first tick right away.
    pub fn transition<F>(
        &mut self,
        ctx: &mut C,
        now: Instant,
        frames_per_second: u32,
        duration: Duration,
        callback: F,
    ) where
        F: FnMut(Tick, &mut C) + 'static,
    {
        let fps = frames_per_second.max(1);
        let total = ((fps as f64 * duration.as_secs_f64()).round() as usize).max(1);
        let mut transition = Transition {
            started: now,
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            total,
            fired: 0,
            callback: Box::new(callback),
        };

        transition.fire(ctx);
        if !transition.is_done() {
            self.transitions.push(transition);
        }
    }

    /// Fire every tick that has fallen due by `now`. Returns how many fired.
    pub fn tick(&mut self, now: Instant, ctx: &mut C) -> usize {
        let mut fired = 0;
        for transition in &mut self.transitions {
            while transition.due(now) {
                transition.fire(ctx);
                fired += 1;
            }
        }
        self.transitions.retain(|t| !t.is_done());
        fired
    }

    /// Fire every remaining tick regardless of time
    pub fn finish_all(&mut self, ctx: &mut C) {
        for transition in &mut self.transitions {
            while !transition.is_done() {
                transition.fire(ctx);
            }
        }
        self.transitions.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn active(&self) -> usize {
        self.transitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!(smoothstep(0.25) < 0.25);
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let mut sched: Scheduler<Vec<Tick>> = Scheduler::new();
        let mut seen = Vec::new();
        let t0 = Instant::now();

        sched.transition(&mut seen, t0, 10, ms(500), |tick, seen| seen.push(tick));

        assert_eq!(seen, vec![Tick { index: 0, total: 5 }]);
        assert!((seen[0].ratio() - 0.2).abs() < f32::EPSILON);
        assert!(!sched.is_idle());
    }

    #[test]
    fn test_ticks_fire_on_cadence_and_stop() {
        let mut sched: Scheduler<Vec<usize>> = Scheduler::new();
        let mut seen = Vec::new();
        let t0 = Instant::now();
        sched.transition(&mut seen, t0, 10, ms(500), |tick, seen| seen.push(tick.index));

        assert_eq!(sched.tick(t0 + ms(50), &mut seen), 0);
        assert_eq!(sched.tick(t0 + ms(100), &mut seen), 1);
        assert_eq!(seen, vec![0, 1]);

        // Late call catches up on every missed tick, then the transition ends.
        assert_eq!(sched.tick(t0 + ms(2000), &mut seen), 3);
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(sched.is_idle());
        assert_eq!(sched.tick(t0 + ms(3000), &mut seen), 0);
    }

    #[test]
    fn test_last_tick_reaches_full_progress() {
        let mut sched: Scheduler<Vec<(f32, bool)>> = Scheduler::new();
        let mut seen = Vec::new();
        let t0 = Instant::now();
        sched.transition(&mut seen, t0, 60, ms(200), |tick, seen| {
            seen.push((tick.eased(), tick.is_last()))
        });
        sched.finish_all(&mut seen);

        assert_eq!(seen.len(), 12);
        assert_eq!(seen.last(), Some(&(1.0, true)));
        assert!(seen[..11].iter().all(|(_, last)| !last));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_zero_duration_is_single_tick() {
        let mut sched: Scheduler<u32> = Scheduler::new();
        let mut calls = 0;
        sched.transition(&mut calls, Instant::now(), 60, Duration::ZERO, |tick, calls| {
            assert!(tick.is_last());
            *calls += 1;
        });
        assert_eq!(calls, 1);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_transitions_interleave_independently() {
        let mut sched: Scheduler<Vec<(char, usize)>> = Scheduler::new();
        let mut seen = Vec::new();
        let t0 = Instant::now();
        sched.transition(&mut seen, t0, 10, ms(300), |t, s| s.push(('a', t.index)));
        sched.transition(&mut seen, t0 + ms(50), 10, ms(200), |t, s| s.push(('b', t.index)));
        assert_eq!(sched.active(), 2);

        sched.tick(t0 + ms(150), &mut seen);
        assert_eq!(seen, vec![('a', 0), ('b', 0), ('a', 1), ('b', 1)]);
        assert_eq!(sched.active(), 1);
    }
}
