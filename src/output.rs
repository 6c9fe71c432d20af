//! This module is in charge of outputting the final analysis results to the
//! log and to various files

use crate::{
    analysis::{CutFlow, FinalResults},
    config::Configuration,
    histogram::{Axis, Histogram, Histogram1D, Histogram2D},
    numeric::{reals, Float},
};

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

use std::{
    fs::{self, File},
    io::{self, BufWriter, Result, Write},
    path::Path,
    time::Duration,
};

// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

/// Output the analysis results to the log and to disk
pub fn dump_results(
    cfg: &Configuration,
    results: &FinalResults,
    elapsed_time: Duration,
) -> Result<()> {
    let cut_flow = &results.cut_flow;
    info!(
        "Analyzed {} events, found {} K0s candidates ({} with one identified daughter, {} with two)",
        cut_flow.events,
        cut_flow.candidates(),
        cut_flow.single_pid_candidates,
        cut_flow.both_pid_candidates
    );

    fs::create_dir_all(&cfg.output)?;

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(io::Error::other)?;

    // Write execution timings to a file
    {
        let mut tim_file = BufWriter::new(File::create(cfg.output.join("run.times"))?);
        let tim_file = &mut tim_file;
        writeln_3p(tim_file, &timestamp[..])?;
        writeln_3p(tim_file, "---------------------------------------------")?;
        let elapsed_secs = elapsed_time.as_secs_f64() as Float;
        writeln_3p(tim_file, ("Elapsed time (s)", elapsed_secs))?;
        if cut_flow.events > 0 {
            let secs_per_ev = elapsed_secs / (cut_flow.events as Float);
            writeln_3p(tim_file, ("Elapsed time per event (s)", secs_per_ev))?;
        }
        tim_file.flush()?;
    }

    // Write the selection counters
    {
        let mut dat_file = BufWriter::new(File::create(cfg.output.join("cutflow.data"))?);
        writeln_3p(&mut dat_file, ("Input", &cfg.input.display().to_string()[..]))?;
        writeln_3p(&mut dat_file, ("Magnetic field (T)", cfg.b_field))?;
        writeln_3p(&mut dat_file, ("Daughter hypothesis", cfg.daughter.name))?;
        writeln_3p(&mut dat_file, ("PID detector", &cfg.pid_detector.to_string()[..]))?;
        writeln_3p(&mut dat_file, "---------------------------------------------")?;
        write_cut_flow(&mut dat_file, cut_flow)?;
        dat_file.flush()?;
    }

    // Write one file per histogram
    for (name, histogram) in results.book.iter() {
        write_histogram_file(&cfg.output, name, histogram)?;
    }
    info!("Results written to {}", cfg.output.display());

    Ok(())
}

/// Write down the selection counters, in analysis order
fn write_cut_flow(file: &mut impl Write, cut_flow: &CutFlow) -> Result<()> {
    let rejected = &cut_flow.rejected_tracks;
    writeln_3p(file, ("Events", cut_flow.events))?;
    writeln_3p(file, ("... with pairs", cut_flow.events_with_pairs))?;
    writeln_3p(file, ("Tracks", cut_flow.tracks))?;
    writeln_3p(file, ("... rejected", rejected.total()))?;
    writeln_3p(file, ("... without helix", rejected.missing_helix))?;
    writeln_3p(file, ("... with degenerate helix", rejected.degenerate_helix))?;
    writeln_3p(file, ("... without PID traits", rejected.missing_pid_traits))?;
    writeln_3p(file, ("Pairs", cut_flow.pairs))?;
    writeln_3p(file, ("... without identified daughter", cut_flow.pairs_without_pid))?;
    writeln_3p(file, ("... without closest approach", cut_flow.pairs_without_solution))?;
    writeln_3p(file, ("... failing decay length cut", cut_flow.short_decay_length))?;
    writeln_3p(file, ("... failing daughter DCA cut", cut_flow.large_dca))?;
    writeln_3p(file, ("... failing pointing angle cut", cut_flow.large_pointing_angle))?;
    writeln_3p(file, ("Candidates", cut_flow.candidates()))?;
    writeln_3p(file, ("... with one identified daughter", cut_flow.single_pid_candidates))?;
    writeln_3p(file, ("... with two identified daughters", cut_flow.both_pid_candidates))
}

/// Write a histogram into `<name>.hist` in the output directory
fn write_histogram_file(dir: &Path, name: &str, histogram: &Histogram) -> Result<()> {
    let mut file = BufWriter::new(File::create(dir.join(format!("{name}.hist")))?);
    writeln_3p(&mut file, ("Histogram", name))?;
    match histogram {
        Histogram::OneD(h) => write_histogram_1d(&mut file, h)?,
        Histogram::TwoD(h) => write_histogram_2d(&mut file, h)?,
    }
    file.flush()
}

/// Axis description followed by one `<low edge> <count>` line per bin
fn write_histogram_1d(file: &mut impl Write, hist: &Histogram1D) -> Result<()> {
    let axis = hist.axis();
    write_axis(file, "X axis", axis)?;
    writeln_3p(file, ("Entries", hist.entries()))?;
    writeln_3p(file, ("Underflow", hist.count(0)))?;
    writeln_3p(file, ("Overflow", hist.count(axis.num_bins() + 1)))?;
    writeln_3p(file, "---------------------------------------------")?;
    for bin in 1..=axis.num_bins() {
        write_engineering(file, axis.bin_low_edge(bin), SIG_DIGITS)?;
        writeln!(file, " {}", hist.count(bin))?;
    }
    Ok(())
}

/// Axis descriptions followed by one `<x low edge> <y low edge> <count>` line
/// per regular bin
fn write_histogram_2d(file: &mut impl Write, hist: &Histogram2D) -> Result<()> {
    let (x_axis, y_axis) = (hist.x_axis(), hist.y_axis());
    write_axis(file, "X axis", x_axis)?;
    write_axis(file, "Y axis", y_axis)?;
    writeln_3p(file, ("Entries", hist.entries()))?;
    let in_range = (1..=x_axis.num_bins())
        .flat_map(|bx| (1..=y_axis.num_bins()).map(move |by| (bx, by)))
        .map(|(bx, by)| hist.count(bx, by))
        .sum::<u64>();
    writeln_3p(file, ("Out of range", hist.entries() - in_range))?;
    writeln_3p(file, "---------------------------------------------")?;
    for bx in 1..=x_axis.num_bins() {
        for by in 1..=y_axis.num_bins() {
            write_engineering(file, x_axis.bin_low_edge(bx), SIG_DIGITS)?;
            write!(file, " ")?;
            write_engineering(file, y_axis.bin_low_edge(by), SIG_DIGITS)?;
            writeln!(file, " {}", hist.count(bx, by))?;
        }
    }
    Ok(())
}

fn write_axis(file: &mut impl Write, title: &str, axis: &Axis) -> Result<()> {
    writeln_3p(file, (title, axis.num_bins()))?;
    writeln_3p(file, ("... lower bound", axis.low()))?;
    writeln_3p(file, ("... upper bound", axis.high()))
}

/// Text output facility that mimicks the usual output file styling
fn writeln_3p(file: &mut impl Write, data: impl Write3p) -> Result<()> {
    write!(file, " ")?;
    data.write(file)?;
    writeln!(file)
}

/// Trait implemented by things which can be printed in output file style
trait Write3p: Sized {
    /// Write down `self` to the output file
    fn write(self, file: &mut impl Write) -> Result<()>;
}

impl Write3p for &str {
    // Strings work in the usual way
    fn write(self, file: &mut impl Write) -> Result<()> {
        write!(file, "{}", self)
    }
}

impl Write3p for usize {
    // Integers work in the usual way too
    fn write(self, file: &mut impl Write) -> Result<()> {
        write!(file, "{}", self)
    }
}

impl Write3p for u64 {
    fn write(self, file: &mut impl Write) -> Result<()> {
        write!(file, "{}", self)
    }
}

impl Write3p for Float {
    // Floats are printed like C's %g
    fn write(self, file: &mut impl Write) -> Result<()> {
        write_engineering(file, self, SIG_DIGITS)
    }
}

impl<T: Write3p> Write3p for (&str, T) {
    // Key-value output that uses fixed-size columns for better readability
    fn write(self, file: &mut impl Write) -> Result<()> {
        write!(file, "{:<34}: ", self.0)?;
        self.1.write(file)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this method switches
/// between naive and scientific notation for floating-point numbers when the
/// number being printed becomes so small that printing leading zeroes could end
/// up larger than the scientific notation, or so large that we would be forced
/// to print more significant digits than requested.
///
fn write_engineering(writer: &mut impl Write, x: Float, sig_digits: usize) -> Result<()> {
    let mut precision = sig_digits.saturating_sub(1);
    if x == 0. || !x.is_finite() {
        // Zero has no logarithm, and neither do infinities and NaNs
        write!(writer, "{}", x)
    } else {
        let log_x = x.abs().log10();
        if (-3. ..=(sig_digits as Float)).contains(&log_x) {
            // Rust's precision is a number of digits after the decimal point,
            // so it must be adjusted to the magnitude of the number. Numbers
            // smaller than 1 get one extra digit for the leading zero, and
            // numbers with as many integer digits as requested get none.
            precision = (precision as isize - log_x.trunc() as isize).max(0) as usize;
            if log_x < 0. {
                precision += 1
            }

            // Trailing zeros and decimal point are not expected in naive
            // notation, but integers must stay intact
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    writer,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(writer, "{}", str_with_zeros)
            }
        } else {
            write!(writer, "{:.1$e}", x, precision)
        }
    }
}
