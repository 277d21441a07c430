//! Priority-inversion measurement experiment
//!
//! Three tasks at fixed priorities (Low < Medium < High) share one lock.
//! Each iteration, driven by High: Low takes the lock and holds it for a
//! configured time; High blocks trying to take it; Medium burns CPU for as
//! long as High is waiting. With a priority-inheriting mutex the holder is
//! boosted and High's wait stays close to Low's hold time; with a plain
//! semaphore Medium starves Low and the wait grows. The experiment exists
//! to make that difference measurable.
//!
//! Task bodies are generic over the [`crate::rt`] collaborator traits, so
//! the same code runs against the real scheduler on target and against the
//! deterministic host simulator in tests.

pub mod rng;
pub mod stats;

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{
    CFG_HIGH_START_JITTER_TICKS, CFG_ITERATION_COUNT, CFG_LOW_CRIT_SPIN_FACTOR,
    CFG_LOW_CRIT_SPIN_STEPS, CFG_LOW_HOLD_JITTER_TICKS, CFG_LOW_HOLD_TICKS,
    CFG_MEDIUM_PAUSE_TICKS, CFG_MEDIUM_SPIN_FACTOR, CFG_MEDIUM_SPIN_FACTOR_MAX,
    CFG_MEDIUM_SPIN_FACTOR_MIN, CFG_REALISTIC_PROFILE, CFG_STATS_WINDOW,
};
use crate::rt::PiServices;
use crate::types::{FlagMask, TaskRole, Tick};

use rng::XorShift32;
use stats::WaitStats;

// ============ Thread flags ============

/// High kicks Low to start an iteration
pub const FLAG_LOW_START: FlagMask = 1 << 0;
/// Low confirms it has acquired and is holding the lock
pub const FLAG_LOCK_HELD: FlagMask = 1 << 1;
/// High kicks Medium to start burning CPU
pub const FLAG_MEDIUM_START: FlagMask = 1 << 2;

// ============ Lock discipline ============

/// Locking discipline for the shared lock
///
/// Numeric values appear in emitted records as the `mode` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockMode {
    /// Priority-inheriting mutex: the holder is boosted to the waiter's
    /// priority, bounding inversion duration
    MutexPi = 1,
    /// Binary semaphore used as a mutex: no inheritance, inversion is
    /// unbounded except for Medium's starvation-guard yield
    SemNoPi = 2,
}

// ============ Configuration ============

/// Experiment knobs, normally built from `config.rs`
///
/// A value struct so tests can run shortened or contrived profiles.
#[derive(Debug, Clone)]
pub struct PiConfig {
    /// Ticks Low holds the lock (base value)
    pub low_hold_ticks: u32,
    /// Symmetric jitter band on the hold, realistic profile only
    pub low_hold_jitter: u32,
    /// High sleeps 0..=this before kicking Low, realistic profile only
    pub high_start_jitter: u32,
    /// Medium's spin intensity (fixed profile)
    pub medium_spin_factor: u32,
    /// Medium's spin intensity range (realistic profile)
    pub medium_spin_min: u32,
    pub medium_spin_max: u32,
    /// CPU work inside Low's critical section (0 disables)
    pub low_crit_spin_steps: u32,
    pub low_crit_spin_factor: u32,
    /// Total iterations before High terminates
    pub iterations: u32,
    /// Iterations per aggregate summary (0 disables summaries)
    pub stats_window: u32,
    /// Medium's starvation-guard yield interval, in accumulated run ticks
    pub medium_pause_ticks: u32,
    /// Enable per-iteration jitter
    pub realistic: bool,
}

impl PiConfig {
    pub const DEFAULT: PiConfig = PiConfig {
        low_hold_ticks: CFG_LOW_HOLD_TICKS,
        low_hold_jitter: CFG_LOW_HOLD_JITTER_TICKS,
        high_start_jitter: CFG_HIGH_START_JITTER_TICKS,
        medium_spin_factor: CFG_MEDIUM_SPIN_FACTOR,
        medium_spin_min: CFG_MEDIUM_SPIN_FACTOR_MIN,
        medium_spin_max: CFG_MEDIUM_SPIN_FACTOR_MAX,
        low_crit_spin_steps: CFG_LOW_CRIT_SPIN_STEPS,
        low_crit_spin_factor: CFG_LOW_CRIT_SPIN_FACTOR,
        iterations: CFG_ITERATION_COUNT,
        stats_window: CFG_STATS_WINDOW,
        medium_pause_ticks: CFG_MEDIUM_PAUSE_TICKS,
        realistic: CFG_REALISTIC_PROFILE,
    };
}

impl Default for PiConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============ Shared state ============

/// Per-run shared scalars, mutated by whichever task is active
///
/// One instance per experiment run, injected into all three task bodies.
/// The dynamic knobs (`low_hold_ticks`, `medium_spin_factor`) are written
/// by High each iteration and consumed by Low/Medium. `high_waiting` is
/// the sole cross-task signal that stops Medium's loop; a single aligned
/// byte, no stronger atomicity needed on the target.
pub struct ExperimentState {
    iter: AtomicU32,
    low_lock_tick: AtomicU32,
    low_unlock_tick: AtomicU32,
    medium_spin_count: AtomicU32,
    high_waiting: AtomicBool,
    low_hold_ticks: AtomicU32,
    medium_spin_factor: AtomicU32,
}

impl ExperimentState {
    pub const fn new() -> Self {
        ExperimentState {
            iter: AtomicU32::new(0),
            low_lock_tick: AtomicU32::new(0),
            low_unlock_tick: AtomicU32::new(0),
            medium_spin_count: AtomicU32::new(0),
            high_waiting: AtomicBool::new(false),
            low_hold_ticks: AtomicU32::new(CFG_LOW_HOLD_TICKS),
            medium_spin_factor: AtomicU32::new(CFG_MEDIUM_SPIN_FACTOR),
        }
    }

    /// Iteration currently being driven by High (1-based, 0 before start)
    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iter.load(Ordering::Relaxed)
    }

    /// True while High is blocked on the lock; Medium's run condition
    #[inline]
    pub fn high_is_waiting(&self) -> bool {
        self.high_waiting.load(Ordering::Acquire)
    }
}

impl Default for ExperimentState {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Measurement records ============

/// One CSV row: a single iteration's measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationRecord {
    pub iter: u32,
    pub mode: LockMode,
    /// Ticks High spent blocked on the lock
    pub high_wait_ticks: Tick,
    /// Ticks between Low's acquisition and release
    pub low_hold_ticks: Tick,
    /// Medium's spin-loop iterations this cycle
    pub medium_spin_count: u32,
}

/// Aggregate over one statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSummary {
    pub mode: LockMode,
    pub min: Tick,
    pub max: Tick,
    pub avg: Tick,
}

/// Where High's measurements go
///
/// The firmware integration prints CSV over the console; tests collect
/// into vectors. High emits outside the lock, so a slow sink stretches
/// the schedule but never the measured critical sections.
pub trait RecordSink {
    /// One-time configuration line at experiment start
    fn config(&mut self, cfg: &PiConfig, mode: LockMode);
    /// One row per iteration
    fn iteration(&mut self, rec: &IterationRecord);
    /// One aggregate per statistics window
    fn window(&mut self, summary: &WindowSummary);
}

// ============ Tasks ============

/// Low-priority resource holder
///
/// Parks on `FLAG_LOW_START`; each iteration it takes the lock, records
/// the acquisition tick, tells High the lock is held, optionally does
/// bounded work inside the critical section, sleeps for the hold time set
/// by High, records the release tick, and releases. The lock is never held
/// across activations.
pub fn low_task_loop<S: PiServices>(svc: &S, state: &ExperimentState, cfg: &PiConfig) -> ! {
    loop {
        svc.flag_wait(FLAG_LOW_START);

        svc.acquire();
        state
            .low_lock_tick
            .store(svc.tick_now(), Ordering::Release);

        // High must not start measuring until the lock is really held.
        svc.flag_set(TaskRole::High, FLAG_LOCK_HELD);

        if cfg.low_crit_spin_steps != 0 {
            for _ in 0..cfg.low_crit_spin_steps {
                svc.spin(cfg.low_crit_spin_factor);
            }
        }

        svc.delay(state.low_hold_ticks.load(Ordering::Acquire));

        state
            .low_unlock_tick
            .store(svc.tick_now(), Ordering::Release);
        svc.release();
    }
}

/// Medium-priority CPU hog
///
/// Parks on `FLAG_MEDIUM_START`; while High is waiting it burns CPU in
/// bounded bursts, yielding one tick after every `medium_pause_ticks` of
/// accumulated run time. That forced yield is the starvation guard: in the
/// non-inheriting mode it is the only reason Low ever gets scheduled to
/// release the lock.
pub fn medium_task_loop<S: PiServices>(svc: &S, state: &ExperimentState, cfg: &PiConfig) -> ! {
    loop {
        svc.flag_wait(FLAG_MEDIUM_START);

        let mut last_tick = svc.tick_now();
        let mut run_ticks: u32 = 0;

        while state.high_is_waiting() {
            svc.spin(state.medium_spin_factor.load(Ordering::Acquire));
            state.medium_spin_count.fetch_add(1, Ordering::Relaxed);

            let now = svc.tick_now();
            if now != last_tick {
                run_ticks += now.wrapping_sub(last_tick);
                last_tick = now;

                if run_ticks >= cfg.medium_pause_ticks {
                    run_ticks = 0;
                    svc.delay(1);
                }
            }
        }
    }
}

/// High-priority driver and measurer
///
/// Runs the full experiment and returns; Low and Medium stay parked
/// afterwards, waiting for a start signal that is never sent again.
pub fn high_task_run<S: PiServices, R: RecordSink>(
    svc: &S,
    state: &ExperimentState,
    cfg: &PiConfig,
    mode: LockMode,
    sink: &mut R,
) {
    // Keep the watchdog fed even when record emission dominates CPU time.
    svc.refresh();

    // Reseed jitter from the current tick; determinism within a run is all
    // the experiment needs.
    let mut rng = XorShift32::new(rng::DEFAULT_SEED ^ svc.tick_now());

    sink.config(cfg, mode);
    svc.refresh();

    let mut window = WaitStats::new();

    for iter in 1..=cfg.iterations {
        state.iter.store(iter, Ordering::Relaxed);
        svc.refresh();

        if cfg.realistic {
            // De-phase the schedule so iterations are not in lockstep.
            if cfg.high_start_jitter != 0 {
                svc.delay(rng.range(0, cfg.high_start_jitter));
            }
            state.low_hold_ticks.store(
                rng.jittered(cfg.low_hold_ticks, cfg.low_hold_jitter),
                Ordering::Release,
            );
            state.medium_spin_factor.store(
                rng.range(cfg.medium_spin_min, cfg.medium_spin_max),
                Ordering::Release,
            );
        } else {
            state
                .low_hold_ticks
                .store(cfg.low_hold_ticks, Ordering::Release);
            state
                .medium_spin_factor
                .store(cfg.medium_spin_factor, Ordering::Release);
        }

        state.medium_spin_count.store(0, Ordering::Relaxed);

        svc.flag_set(TaskRole::Low, FLAG_LOW_START);

        // Ordering guarantee: Low holds the lock before we start timing.
        svc.flag_wait(FLAG_LOCK_HELD);

        let wait_start = svc.tick_now();
        state.high_waiting.store(true, Ordering::Release);
        svc.flag_set(TaskRole::Medium, FLAG_MEDIUM_START);

        svc.acquire();
        let wait_end = svc.tick_now();

        state.high_waiting.store(false, Ordering::Release);

        // Keep our own hold minimal; measure, release, log outside.
        svc.release();

        let rec = IterationRecord {
            iter,
            mode,
            high_wait_ticks: wait_end.wrapping_sub(wait_start),
            low_hold_ticks: state
                .low_unlock_tick
                .load(Ordering::Acquire)
                .wrapping_sub(state.low_lock_tick.load(Ordering::Acquire)),
            medium_spin_count: state.medium_spin_count.load(Ordering::Relaxed),
        };
        sink.iteration(&rec);
        svc.refresh();

        window.add(rec.high_wait_ticks);

        // stats_window == 0 disables windowed summaries
        if cfg.stats_window != 0 && iter % cfg.stats_window == 0 {
            sink.window(&WindowSummary {
                mode,
                min: window.min(),
                max: window.max(),
                avg: window.avg(),
            });
            svc.refresh();
            window.reset();
        }
    }
}
