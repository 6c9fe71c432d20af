//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(not(feature = "multi-threading"))] mod sequential;
#[cfg(feature = "multi-threading")] mod multi_threading;

use crate::{
    analysis::{FinalResults, ResultsAccumulator},
    error::AnalysisResult,
};

use std::ops::Range;


/// Size of the analyzed event batches
///
/// Events are grouped in batches of a certain size, whose results are merged
/// in event order. This gives identical results in sequential and parallel
/// runs, and bounds the amount of work lost to a failed batch.
///
const EVENT_BATCH_SIZE: usize = 1_000;


/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the total number of events to be analyzed, and an
/// analysis kernel that processes a contiguous range of events.
///
/// Returns the finalized analysis results, or the first error encountered
/// in event order.
///
pub fn run_analysis<'cfg>(
    num_events: usize,
    process_events: impl Send + Sync
                         + Fn(Range<usize>) -> AnalysisResult<ResultsAccumulator<'cfg>>
) -> AnalysisResult<FinalResults> {
    // Integrate analysis results...
    let accumulator = {
        // ...in sequential mode
        #[cfg(not(feature = "multi-threading"))]
        { sequential::run_analysis_impl(num_events, process_events)? }

        // ...in multi-threaded mode
        #[cfg(feature = "multi-threading")]
        { multi_threading::run_analysis_impl(num_events, process_events)? }
    };

    // Finalize the results
    Ok(accumulator.finalize())
}

/// Split a number of events into batches (there is always at least one)
fn batches(num_events: usize) -> impl Iterator<Item = Range<usize>> {
    let num_batches = num_events.div_ceil(EVENT_BATCH_SIZE).max(1);
    (0..num_batches).map(move |batch| {
        let start = batch * EVENT_BATCH_SIZE;
        start..(start + EVENT_BATCH_SIZE).min(num_events)
    })
}
