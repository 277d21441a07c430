//! Deterministic host-side scheduler for the experiment
//!
//! Runs the three experiment tasks on OS threads but grants the virtual
//! CPU to exactly one of them at a time, picked by strict fixed-priority
//! scheduling over a virtual tick clock. Busy-work advances virtual time;
//! sleeps advance it when nothing is runnable. Because every hand-off is
//! decided under one mutex in priority order, a run is fully reproducible
//! and the priority-inversion effect shows up in the virtual timestamps
//! exactly as it would on hardware.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use crate::pi::{
    high_task_run, low_task_loop, medium_task_loop, ExperimentState, IterationRecord, LockMode,
    PiConfig, RecordSink, WindowSummary,
};
use crate::rt::{Clock, CpuWork, SharedLock, Signals, WatchdogFeed};
use crate::types::{FlagMask, SpinUnits, TaskRole, Tick};

// ============ Scheduling parameters ============

pub const PRIO_HIGH: u8 = 5;
pub const PRIO_MEDIUM: u8 = 10;
pub const PRIO_LOW: u8 = 15;

/// Spin units that consume one virtual tick
pub const SPIN_UNITS_PER_TICK: u32 = 10_000;

const NUM_TASKS: usize = 3;
const BASE_PRIO: [u8; NUM_TASKS] = [PRIO_LOW, PRIO_MEDIUM, PRIO_HIGH];

// ============ Kernel state ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskStatus {
    Runnable,
    /// Blocked until any flag in the mask is pending
    WaitingFlags(FlagMask),
    /// Blocked until the virtual tick reaches the wake tick
    Sleeping(Tick),
    WaitingLock,
    Done,
}

struct SimState {
    tick: Tick,
    /// Which task currently owns the virtual CPU
    running: Option<usize>,
    status: [TaskStatus; NUM_TASKS],
    pending: [FlagMask; NUM_TASKS],
    /// Effective priority: base, or boosted while holding a contended
    /// priority-inheriting lock
    eff_prio: [u8; NUM_TASKS],
    lock_owner: Option<usize>,
    spin_accum: [u32; NUM_TASKS],
}

/// The virtual single-core scheduler
pub struct SimKernel {
    inner: Mutex<SimState>,
    /// One wake channel per task
    cv: [Condvar; NUM_TASKS],
    mode: LockMode,
    wdg_refreshes: AtomicU32,
}

impl SimKernel {
    pub fn new(mode: LockMode) -> Self {
        SimKernel {
            inner: Mutex::new(SimState {
                tick: 0,
                // High drives the experiment and outranks everyone anyway.
                running: Some(TaskRole::High as usize),
                status: [TaskStatus::Runnable; NUM_TASKS],
                pending: [0; NUM_TASKS],
                eff_prio: BASE_PRIO,
                lock_owner: None,
                spin_accum: [0; NUM_TASKS],
            }),
            cv: [Condvar::new(), Condvar::new(), Condvar::new()],
            mode,
            wdg_refreshes: AtomicU32::new(0),
        }
    }

    pub fn lock_mode(&self) -> LockMode {
        self.mode
    }

    /// Watchdog refreshes observed over the run
    pub fn watchdog_refreshes(&self) -> u32 {
        self.wdg_refreshes.load(Ordering::Relaxed)
    }

    fn lock_state(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap()
    }

    /// Runnable task with the best (numerically lowest) effective priority
    fn best_runnable(st: &SimState) -> Option<usize> {
        (0..NUM_TASKS)
            .filter(|&i| st.status[i] == TaskStatus::Runnable)
            .min_by_key(|&i| st.eff_prio[i])
    }

    /// Hand the CPU to the best runnable task, advancing virtual time past
    /// sleep gaps when nothing is runnable
    fn schedule(&self, st: &mut SimState) {
        loop {
            if let Some(next) = Self::best_runnable(st) {
                st.running = Some(next);
                self.cv[next].notify_one();
                return;
            }
            let next_wake = st
                .status
                .iter()
                .filter_map(|s| match s {
                    TaskStatus::Sleeping(wake) => Some(*wake),
                    _ => None,
                })
                .min();
            match next_wake {
                Some(wake) => {
                    st.tick = wake;
                    Self::wake_sleepers(st);
                }
                None => {
                    // Nothing left to run; threads stay parked.
                    st.running = None;
                    return;
                }
            }
        }
    }

    fn wake_sleepers(st: &mut SimState) {
        for i in 0..NUM_TASKS {
            if let TaskStatus::Sleeping(wake) = st.status[i] {
                if wake <= st.tick {
                    st.status[i] = TaskStatus::Runnable;
                }
            }
        }
    }

    /// Park until the scheduler grants this task the CPU
    fn wait_for_cpu<'a>(
        &'a self,
        mut g: MutexGuard<'a, SimState>,
        me: usize,
    ) -> MutexGuard<'a, SimState> {
        while g.running != Some(me) {
            g = self.cv[me].wait(g).unwrap();
        }
        g
    }

    /// Give up the CPU with `status[me]` already set to a blocked state
    fn block_current<'a>(
        &'a self,
        mut g: MutexGuard<'a, SimState>,
        me: usize,
    ) -> MutexGuard<'a, SimState> {
        self.schedule(&mut g);
        self.wait_for_cpu(g, me)
    }

    /// Yield if a higher-priority task became runnable
    fn preempt_if_needed<'a>(
        &'a self,
        g: MutexGuard<'a, SimState>,
        me: usize,
    ) -> MutexGuard<'a, SimState> {
        match Self::best_runnable(&g) {
            Some(best) if best != me => {
                let mut g = g;
                g.running = Some(best);
                self.cv[best].notify_one();
                self.wait_for_cpu(g, me)
            }
            _ => g,
        }
    }

    /// First thing every task thread does
    fn attach(&self, me: usize) {
        let g = self.lock_state();
        drop(self.wait_for_cpu(g, me));
    }

    /// Task body returned; release the CPU for good
    fn exit(&self, me: usize) {
        let mut st = self.lock_state();
        st.status[me] = TaskStatus::Done;
        self.schedule(&mut st);
    }
}

// ============ Per-task service handle ============

/// One task's view of the simulated scheduler
#[derive(Clone)]
pub struct SimTask {
    kernel: Arc<SimKernel>,
    role: TaskRole,
}

impl SimTask {
    pub fn new(kernel: Arc<SimKernel>, role: TaskRole) -> Self {
        SimTask { kernel, role }
    }

    fn me(&self) -> usize {
        self.role as usize
    }
}

impl Clock for SimTask {
    fn tick_now(&self) -> Tick {
        self.kernel.lock_state().tick
    }

    fn delay(&self, ticks: Tick) {
        if ticks == 0 {
            return;
        }
        let me = self.me();
        let k = &self.kernel;
        let mut g = k.lock_state();
        let wake = g.tick.wrapping_add(ticks);
        g.status[me] = TaskStatus::Sleeping(wake);
        drop(k.block_current(g, me));
    }
}

impl Signals for SimTask {
    fn flag_wait(&self, mask: FlagMask) {
        let me = self.me();
        let k = &self.kernel;
        let mut g = k.lock_state();
        if g.pending[me] & mask != 0 {
            g.pending[me] &= !mask;
            return;
        }
        g.status[me] = TaskStatus::WaitingFlags(mask);
        g = k.block_current(g, me);
        // The setter woke us; consume whatever matched.
        g.pending[me] &= !mask;
    }

    fn flag_set(&self, target: TaskRole, mask: FlagMask) {
        let me = self.me();
        let t = target as usize;
        let k = &self.kernel;
        let mut g = k.lock_state();
        g.pending[t] |= mask;
        if let TaskStatus::WaitingFlags(wanted) = g.status[t] {
            if g.pending[t] & wanted != 0 {
                g.status[t] = TaskStatus::Runnable;
                g = k.preempt_if_needed(g, me);
            }
        }
        drop(g);
    }
}

impl SharedLock for SimTask {
    fn acquire(&self) {
        let me = self.me();
        let k = &self.kernel;
        let mut g = k.lock_state();
        match g.lock_owner {
            None => {
                g.lock_owner = Some(me);
            }
            Some(owner) => {
                if k.mode == LockMode::MutexPi && g.eff_prio[owner] > g.eff_prio[me] {
                    g.eff_prio[owner] = g.eff_prio[me];
                }
                g.status[me] = TaskStatus::WaitingLock;
                drop(k.block_current(g, me));
            }
        }
    }

    fn release(&self) {
        let me = self.me();
        let k = &self.kernel;
        let mut g = k.lock_state();
        debug_assert_eq!(g.lock_owner, Some(me));
        g.eff_prio[me] = BASE_PRIO[me];
        let heir = (0..NUM_TASKS)
            .filter(|&i| g.status[i] == TaskStatus::WaitingLock)
            .min_by_key(|&i| g.eff_prio[i]);
        match heir {
            Some(w) => {
                g.lock_owner = Some(w);
                g.status[w] = TaskStatus::Runnable;
                g = k.preempt_if_needed(g, me);
            }
            None => {
                g.lock_owner = None;
            }
        }
        drop(g);
    }
}

impl CpuWork for SimTask {
    fn spin(&self, units: SpinUnits) {
        let me = self.me();
        let k = &self.kernel;
        let mut g = k.lock_state();
        g.spin_accum[me] += units;
        while g.spin_accum[me] >= SPIN_UNITS_PER_TICK {
            g.spin_accum[me] -= SPIN_UNITS_PER_TICK;
            g.tick = g.tick.wrapping_add(1);
            SimKernel::wake_sleepers(&mut g);
            g = k.preempt_if_needed(g, me);
        }
        drop(g);
    }
}

impl WatchdogFeed for SimTask {
    fn refresh(&self) {
        self.kernel.wdg_refreshes.fetch_add(1, Ordering::Relaxed);
    }
}

// ============ Record collection ============

/// Collects everything High emits, for assertions and printing
#[derive(Debug, Default)]
pub struct VecSink {
    pub config: Option<(PiConfig, LockMode)>,
    pub records: Vec<IterationRecord>,
    pub windows: Vec<WindowSummary>,
}

impl RecordSink for VecSink {
    fn config(&mut self, cfg: &PiConfig, mode: LockMode) {
        self.config = Some((cfg.clone(), mode));
    }

    fn iteration(&mut self, rec: &IterationRecord) {
        self.records.push(*rec);
    }

    fn window(&mut self, summary: &WindowSummary) {
        self.windows.push(*summary);
    }
}

// ============ Experiment runner ============

/// Everything a finished run produced
pub struct ExperimentRun {
    pub sink: VecSink,
    pub watchdog_refreshes: u32,
}

/// Run the full three-task experiment under the given lock discipline
///
/// Low and Medium outlive the run parked on their start flags; their
/// threads are detached and reclaimed at process exit.
pub fn run_experiment(cfg: &PiConfig, mode: LockMode) -> ExperimentRun {
    let kernel = Arc::new(SimKernel::new(mode));
    let state = Arc::new(ExperimentState::new());
    let cfg = Arc::new(cfg.clone());

    {
        let svc = SimTask::new(kernel.clone(), TaskRole::Low);
        let state = state.clone();
        let cfg = cfg.clone();
        thread::Builder::new()
            .name("pi-low".into())
            .spawn(move || {
                svc.kernel.attach(TaskRole::Low as usize);
                low_task_loop(&svc, &state, &cfg)
            })
            .unwrap();
    }
    {
        let svc = SimTask::new(kernel.clone(), TaskRole::Medium);
        let state = state.clone();
        let cfg = cfg.clone();
        thread::Builder::new()
            .name("pi-medium".into())
            .spawn(move || {
                svc.kernel.attach(TaskRole::Medium as usize);
                medium_task_loop(&svc, &state, &cfg)
            })
            .unwrap();
    }

    let high = {
        let svc = SimTask::new(kernel.clone(), TaskRole::High);
        let state = state.clone();
        let cfg = cfg.clone();
        thread::Builder::new()
            .name("pi-high".into())
            .spawn(move || {
                svc.kernel.attach(TaskRole::High as usize);
                let mut sink = VecSink::default();
                high_task_run(&svc, &state, &cfg, svc.kernel.lock_mode(), &mut sink);
                svc.kernel.exit(TaskRole::High as usize);
                sink
            })
            .unwrap()
    };

    let sink = high.join().expect("high task panicked");
    ExperimentRun {
        sink,
        watchdog_refreshes: kernel.watchdog_refreshes(),
    }
}
