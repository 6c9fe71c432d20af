//! Multi-threaded back-end of the analysis

use crate::{analysis::ResultsAccumulator, error::AnalysisResult, scheduling::batches};

use std::{ops::Range, sync::Mutex};

/// Analyze events in multi-threaded mode
///
/// Batches are analyzed in parallel, but merged in event order so that the
/// results do not depend on thread scheduling.
///
pub fn run_analysis_impl<'cfg>(
    num_events: usize,
    process_events: impl Send + Sync + Fn(Range<usize>) -> AnalysisResult<ResultsAccumulator<'cfg>>,
) -> AnalysisResult<ResultsAccumulator<'cfg>> {
    let batches = batches(num_events).collect::<Vec<_>>();
    let accumulator = ReproducibleAccumulator::new(batches.len());

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (batch_id, batch) in batches.into_iter().enumerate() {
            let accumulator_ref = &accumulator;
            let process_events_ref = &process_events;
            scope.spawn(move |_| {
                let result = process_events_ref(batch);
                accumulator_ref.set_task_result(batch_id, result);
            });
        }
    });

    // Extract the results from the accumulator
    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
struct ReproducibleAccumulator<'cfg> {
    /// Storage for the intermediary analysis results of parallel tasks
    results: Box<[Mutex<Option<AnalysisResult<ResultsAccumulator<'cfg>>>>]>,
}
//
impl<'cfg> ReproducibleAccumulator<'cfg> {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: AnalysisResult<ResultsAccumulator<'cfg>>) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Aggregate the results in a reproducible fashion
    fn get_merged_result(self) -> AnalysisResult<ResultsAccumulator<'cfg>> {
        // Start iterating over the task results
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready")
        });

        // Initialize results storage with the result of the first task
        let mut merged = results_iter
            .next()
            .expect("There should be at least one task")?;

        // Merge the results of the other tasks
        for result in results_iter {
            merged.merge(result?)?;
        }
        Ok(merged)
    }
}
