//! Run the priority-inversion experiment on the host scheduler and print
//! the measurement stream as CSV, once per lock discipline.
//!
//! ```sh
//! cargo run --example pi_experiment --features sim
//! ```

use rtdiag::pi::{IterationRecord, LockMode, PiConfig, RecordSink, WindowSummary};
use rtdiag::sim::run_experiment;

/// CSV printer matching the firmware's serial output line for line
#[derive(Default)]
struct CsvSink;

impl RecordSink for CsvSink {
    fn config(&mut self, cfg: &PiConfig, mode: LockMode) {
        println!(
            "CFG,pi_mode={},realistic={},low_hold_ticks={},low_hold_jitter_ticks={},\
             high_start_jitter_ticks={},medium_spin_factor={},medium_spin_min={},\
             medium_spin_max={},low_critical_steps={},low_critical_factor={},\
             iteration_count={},stats_window={},medium_pause_ticks={}",
            mode as u8,
            cfg.realistic as u8,
            cfg.low_hold_ticks,
            cfg.low_hold_jitter,
            cfg.high_start_jitter,
            cfg.medium_spin_factor,
            cfg.medium_spin_min,
            cfg.medium_spin_max,
            cfg.low_crit_spin_steps,
            cfg.low_crit_spin_factor,
            cfg.iterations,
            cfg.stats_window,
            cfg.medium_pause_ticks,
        );
        println!("iter,mode,high_wait_ticks,low_hold_ticks,medium_spin_count");
    }

    fn iteration(&mut self, rec: &IterationRecord) {
        println!(
            "{},{},{},{},{}",
            rec.iter, rec.mode as u8, rec.high_wait_ticks, rec.low_hold_ticks, rec.medium_spin_count
        );
    }

    fn window(&mut self, summary: &WindowSummary) {
        println!(
            "STATS,mode={},min={},max={},avg={}",
            summary.mode as u8, summary.min, summary.max, summary.avg
        );
    }
}

fn main() {
    let cfg = PiConfig::DEFAULT;

    for mode in [LockMode::MutexPi, LockMode::SemNoPi] {
        let run = run_experiment(&cfg, mode);

        let mut csv = CsvSink;
        let (echoed, _) = run.sink.config.clone().expect("missing config record");
        csv.config(&echoed, mode);

        let window = cfg.stats_window as usize;
        for (i, rec) in run.sink.records.iter().enumerate() {
            csv.iteration(rec);
            if (i + 1) % window == 0 {
                csv.window(&run.sink.windows[i / window]);
            }
        }
        println!();
    }
}
