//! Sequential back-end of the analysis

use crate::{analysis::ResultsAccumulator, error::AnalysisResult, scheduling::batches};

use std::ops::Range;

/// Analyze events in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
pub fn run_analysis_impl<'cfg>(
    num_events: usize,
    process_events: impl Fn(Range<usize>) -> AnalysisResult<ResultsAccumulator<'cfg>>,
) -> AnalysisResult<ResultsAccumulator<'cfg>> {
    let mut batches = batches(num_events);

    // Initialize the accumulator with the first batch of events
    let first_batch = batches.next().unwrap_or(0..0);
    let mut accumulator = process_events(first_batch)?;

    // Analyze and integrate the other batches (if any)
    for batch in batches {
        accumulator.merge(process_events(batch)?)?;
    }

    // Return the final accumulated results
    Ok(accumulator)
}
