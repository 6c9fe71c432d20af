//! Columnar FemtoDst storage
//!
//! A FemtoDst is stored as a directory with one Parquet file per branch:
//!
//! - `Event.parquet` has one row per event, with columns `mRunId`, `mEventId`
//!   and `mPrimaryVertex_mX1`..`mPrimaryVertex_mX3`.
//! - `Tracks.parquet`, `Helices.parquet`, `MtdPidTraits.parquet` and
//!   `BTofPidTraits.parquet` have one row per object, and an `event` column
//!   giving the row of the owning event in `Event.parquet`. Rows must be
//!   grouped by event, in event order.
//! - Tracks have columns `mQ`, `mHelixIndex`, `mMtdPidTraitsIndex` and
//!   `mBTofPidTraitsIndex`, helices have columns `mPar0`..`mPar5`.
//!
//! The PID trait files are optional, a missing file means that no track has
//! PID traits from the matching detector. Integer and floating-point columns
//! may use any width.

use super::{EventRecord, EventSource, FemtoEvent, FemtoTrack, FemtoTrackHelix};
use crate::{
    error::{AnalysisError, AnalysisResult},
    linalg::ThreeVector,
    numeric::Float,
};

use arrow::{
    array::{Array, Float64Array, Int64Array},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use std::{fs::File, ops::Range, path::Path};

/// Name of the event-level branch
pub const EVENT_BRANCH: &str = "Event";

/// Name of the track branch
pub const TRACKS_BRANCH: &str = "Tracks";

/// Name of the helix branch
pub const HELICES_BRANCH: &str = "Helices";

/// Name of the MTD PID traits branch
pub const MTD_PID_BRANCH: &str = "MtdPidTraits";

/// Name of the BTof PID traits branch
pub const BTOF_PID_BRANCH: &str = "BTofPidTraits";

/// Name of the column which links collection rows to events
pub const EVENT_INDEX_COLUMN: &str = "event";

/// Names of the helix parameter columns
pub const HELIX_PAR_COLUMNS: [&str; 6] = ["mPar0", "mPar1", "mPar2", "mPar3", "mPar4", "mPar5"];

/// In-memory FemtoDst, loaded from a directory of Parquet files
pub struct FemtoDst {
    /// Event-level information
    events: Vec<FemtoEvent>,

    /// All tracks, grouped by event
    tracks: Vec<FemtoTrack>,

    /// Range of `tracks` associated with each event
    track_ranges: Vec<Range<usize>>,

    /// All helices, grouped by event
    helices: Vec<FemtoTrackHelix>,

    /// Range of `helices` associated with each event
    helix_ranges: Vec<Range<usize>>,

    /// Number of MTD PID traits per event
    mtd_counts: Vec<usize>,

    /// Number of BTof PID traits per event
    btof_counts: Vec<usize>,
}
//
impl FemtoDst {
    /// Load all branches of a FemtoDst directory
    pub fn open(dir: impl AsRef<Path>) -> AnalysisResult<Self> {
        let dir = dir.as_ref();

        // Event branch
        let batches = read_branch(dir, EVENT_BRANCH)?.ok_or_else(|| missing_file(dir, EVENT_BRANCH))?;
        let run_ids = int_column(&batches, EVENT_BRANCH, "mRunId")?;
        let event_ids = int_column(&batches, EVENT_BRANCH, "mEventId")?;
        let vx = float_column(&batches, EVENT_BRANCH, "mPrimaryVertex_mX1")?;
        let vy = float_column(&batches, EVENT_BRANCH, "mPrimaryVertex_mX2")?;
        let vz = float_column(&batches, EVENT_BRANCH, "mPrimaryVertex_mX3")?;
        let events = (0..run_ids.len())
            .map(|i| FemtoEvent {
                run_id: run_ids[i] as i32,
                event_id: event_ids[i] as i32,
                primary_vertex: ThreeVector::new(vx[i], vy[i], vz[i]),
            })
            .collect::<Vec<_>>();
        let num_events = events.len();

        // Track branch
        let batches =
            read_branch(dir, TRACKS_BRANCH)?.ok_or_else(|| missing_file(dir, TRACKS_BRANCH))?;
        let track_ranges = event_ranges(&batches, TRACKS_BRANCH, num_events)?;
        let charges = int_column(&batches, TRACKS_BRANCH, "mQ")?;
        let helix_indices = int_column(&batches, TRACKS_BRANCH, "mHelixIndex")?;
        let mtd_indices = int_column(&batches, TRACKS_BRANCH, "mMtdPidTraitsIndex")?;
        let btof_indices = int_column(&batches, TRACKS_BRANCH, "mBTofPidTraitsIndex")?;
        let tracks = (0..charges.len())
            .map(|i| FemtoTrack {
                charge: charges[i] as i8,
                helix_index: helix_indices[i],
                mtd_pid_traits_index: mtd_indices[i],
                btof_pid_traits_index: btof_indices[i],
            })
            .collect::<Vec<_>>();

        // Helix branch
        let batches =
            read_branch(dir, HELICES_BRANCH)?.ok_or_else(|| missing_file(dir, HELICES_BRANCH))?;
        let helix_ranges = event_ranges(&batches, HELICES_BRANCH, num_events)?;
        let pars = HELIX_PAR_COLUMNS
            .iter()
            .map(|column| float_column(&batches, HELICES_BRANCH, column))
            .collect::<AnalysisResult<Vec<_>>>()?;
        let helices = (0..helix_ranges.last().map_or(0, |r| r.end))
            .map(|i| FemtoTrackHelix {
                par: std::array::from_fn(|p| pars[p][i]),
            })
            .collect::<Vec<_>>();

        // PID trait branches, which only need to be counted
        let count_traits = |branch: &'static str| -> AnalysisResult<Vec<usize>> {
            Ok(match read_branch(dir, branch)? {
                Some(batches) => event_ranges(&batches, branch, num_events)?
                    .into_iter()
                    .map(|range| range.len())
                    .collect(),
                None => {
                    debug!("No {branch} branch in {}, assuming no PID traits", dir.display());
                    vec![0; num_events]
                }
            })
        };
        let mtd_counts = count_traits(MTD_PID_BRANCH)?;
        let btof_counts = count_traits(BTOF_PID_BRANCH)?;

        info!(
            "Loaded {} events with {} tracks from {}",
            num_events,
            tracks.len(),
            dir.display()
        );
        Ok(Self {
            events,
            tracks,
            track_ranges,
            helices,
            helix_ranges,
            mtd_counts,
            btof_counts,
        })
    }
}

impl EventSource for FemtoDst {
    fn num_events(&self) -> usize {
        self.events.len()
    }

    fn event(&self, index: usize) -> AnalysisResult<EventRecord> {
        let event = self
            .events
            .get(index)
            .ok_or(AnalysisError::EventOutOfRange {
                index,
                num_events: self.events.len(),
            })?;
        Ok(EventRecord {
            event: event.clone(),
            tracks: self.tracks[self.track_ranges[index].clone()].to_vec(),
            helices: self.helices[self.helix_ranges[index].clone()].to_vec(),
            num_mtd_pid_traits: self.mtd_counts[index],
            num_btof_pid_traits: self.btof_counts[index],
        })
    }
}

/// Error for a mandatory branch file which does not exist
fn missing_file(dir: &Path, branch: &str) -> AnalysisError {
    AnalysisError::IoError(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("FemtoDst directory {} has no {branch}.parquet file", dir.display()),
    ))
}

/// Read all record batches of a branch, or None if the branch file is absent
fn read_branch(dir: &Path, branch: &str) -> AnalysisResult<Option<Vec<RecordBatch>>> {
    let path = dir.join(format!("{branch}.parquet"));
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(&path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    debug!("Read {} record batches from {}", batches.len(), path.display());
    Ok(Some(batches))
}

/// Read an integer column of any width, concatenated across batches
fn int_column(
    batches: &[RecordBatch],
    branch: &'static str,
    column: &'static str,
) -> AnalysisResult<Vec<i64>> {
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column_by_name(column)
            .ok_or(AnalysisError::MissingColumn { branch, column })?;
        if !array.data_type().is_integer() {
            return Err(AnalysisError::ColumnType {
                branch,
                column,
                expected: "integer",
            });
        }
        let array = cast(array, &DataType::Int64)?;
        let array = array
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or(AnalysisError::ColumnType {
                branch,
                column,
                expected: "integer",
            })?;
        check_nulls(array, branch, column, values.len())?;
        values.extend(array.values().iter().copied());
    }
    Ok(values)
}

/// Read a floating-point column of any width, concatenated across batches
fn float_column(
    batches: &[RecordBatch],
    branch: &'static str,
    column: &'static str,
) -> AnalysisResult<Vec<Float>> {
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column_by_name(column)
            .ok_or(AnalysisError::MissingColumn { branch, column })?;
        if !array.data_type().is_floating() {
            return Err(AnalysisError::ColumnType {
                branch,
                column,
                expected: "floating-point",
            });
        }
        let array = cast(array, &DataType::Float64)?;
        let array = array
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or(AnalysisError::ColumnType {
                branch,
                column,
                expected: "floating-point",
            })?;
        check_nulls(array, branch, column, values.len())?;
        values.extend(array.values().iter().map(|&x| x as Float));
    }
    Ok(values)
}

/// Reject missing values, including those which did not survive the
/// conversion to a wider type. `first_row` is the row of the array's first
/// element in the branch.
fn check_nulls(
    array: &dyn Array,
    branch: &'static str,
    column: &'static str,
    first_row: usize,
) -> AnalysisResult<()> {
    if array.null_count() == 0 {
        return Ok(());
    }
    match (0..array.len()).find(|&idx| array.is_null(idx)) {
        Some(idx) => Err(AnalysisError::NullValue {
            branch,
            column,
            row: first_row + idx,
        }),
        None => Ok(()),
    }
}

/// Use the event index column of a collection branch to find which rows
/// belong to each event
fn event_ranges(
    batches: &[RecordBatch],
    branch: &'static str,
    num_events: usize,
) -> AnalysisResult<Vec<Range<usize>>> {
    let owners = int_column(batches, branch, EVENT_INDEX_COLUMN)?;
    let mut counts = vec![0usize; num_events];
    let mut last_event = 0;
    for (row, &event) in owners.iter().enumerate() {
        let in_order = event >= last_event && (event as usize) < num_events;
        if !in_order {
            return Err(AnalysisError::EventIndex { branch, row, event });
        }
        counts[event as usize] += 1;
        last_event = event;
    }
    let mut start = 0;
    Ok(counts
        .into_iter()
        .map(|count| {
            let range = start..start + count;
            start += count;
            range
        })
        .collect())
}
