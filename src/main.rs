//! K0s: reconstruction of K⁰s → π⁺π⁻ decays in STAR FemtoDst data
//!
//!
//! # Introduction (for the physicist)
//!
//! The neutral K-short meson flies a few centimeters before decaying into a
//! pair of charged pions. This program looks for such decays by combining
//! every positive track of an event with every negative track, finding where
//! their helical trajectories get closest to each other, and checking that
//! this secondary vertex looks like the decay point of a particle coming from
//! the primary collision vertex:
//!
//! * the decay vertex must be at least 2.7 cm away from the primary vertex,
//! * the two daughters must come within 1.5 cm of each other,
//! * the momentum of the pair must point back to the primary vertex, within a
//!   pT-dependent angular tolerance.
//!
//! The invariant mass and transverse momentum of accepted pairs are then
//! histogrammed, separately for pairs with one or two daughters identified by
//! the chosen PID detector (MTD by default).
//!
//!
//! # Introduction (for the computer guy)
//!
//! The program is a straightforward event loop:
//!
//! * read in the configuration and the FemtoDst input,
//! * loop over events, in batches which may be processed in parallel,
//!     * reconstruct the helix of every track,
//!     * evaluate the decay topology of every (positive, negative) pair,
//!     * fill histograms and selection counters,
//! * merge the results of all batches in event order,
//! * then log them and store them on disk.

#![warn(missing_docs)]

mod analysis;
mod config;
mod error;
mod femtodst;
mod helix;
mod histogram;
mod linalg;
mod momentum;
mod numeric;
mod output;
mod pairs;
mod particles;
mod scheduling;
mod track;
mod units;

use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    analysis::ResultsAccumulator,
    config::Configuration,
    femtodst::{EventSource, FemtoDst},
};

use std::time::Instant;

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG: &str = "k0s.cfg";

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    // Log to stderr, at the level requested via RUST_LOG (info by default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // ### CONFIGURATION READOUT ###

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_owned());
    let cfg = Configuration::load(&config_path).wrap_err("Failed to load the configuration")?;

    // ### INPUT ###

    let femtodst = FemtoDst::open(&cfg.input)
        .wrap_err_with(|| format!("Failed to open FemtoDst {}", cfg.input.display()))?;
    let num_events = cfg.num_events(femtodst.num_events());
    info!("Analyzing {} of {} events", num_events, femtodst.num_events());

    // ### ANALYSIS ###

    // Start the clock after input I/O, so that timings measure the analysis
    let saved_time = Instant::now();
    let results = run(&cfg, &femtodst, num_events)?;
    let elapsed_time = saved_time.elapsed();

    // ### RESULTS DISPLAY AND STORAGE ###

    output::dump_results(&cfg, &results, elapsed_time).wrap_err("Failed to output the results")?;
    Ok(())
}

/// Analyze the first num_events events of a source
fn run(
    cfg: &Configuration,
    source: &(impl EventSource + ?Sized),
    num_events: usize,
) -> Result<analysis::FinalResults> {
    // The kernel analyzes a range of events and returns the accumulated
    // intermediary results
    scheduling::run_analysis(num_events, |events| {
        let mut accumulator = ResultsAccumulator::new(cfg);
        for index in events {
            accumulator.process_event(&source.event(index)?)?;
        }
        Ok(accumulator)
    })
    .wrap_err("Failed to analyze events")
}
