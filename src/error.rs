//! Errors which can occur while reading and analyzing FemtoDst events

use crate::femtodst::PidDetector;

use thiserror::Error;

/// Result type used throughout the analysis modules
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Everything that can go wrong between the input files and the histograms
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// A branch file lacks one of the columns that the analysis reads
    #[error("Branch \"{branch}\" has no column \"{column}\"")]
    MissingColumn {
        /// Branch which was being read
        branch: &'static str,
        /// Name of the missing column
        column: &'static str,
    },

    /// A column exists, but does not hold the expected data type
    #[error("Column \"{column}\" of branch \"{branch}\" should contain {expected} values")]
    ColumnType {
        /// Branch which was being read
        branch: &'static str,
        /// Name of the offending column
        column: &'static str,
        /// Expected Arrow data type
        expected: &'static str,
    },

    /// A column holds a missing value, or a value which does not fit the
    /// type that the analysis reads it as
    #[error("Column \"{column}\" of branch \"{branch}\" has no usable value on row {row}")]
    NullValue {
        /// Branch which was being read
        branch: &'static str,
        /// Name of the offending column
        column: &'static str,
        /// Offending row
        row: usize,
    },

    /// The event index column of a collection branch is not usable
    #[error("Row {row} of branch \"{branch}\" belongs to event {event}, which is out of order or out of range")]
    EventIndex {
        /// Branch which was being read
        branch: &'static str,
        /// Offending row
        row: usize,
        /// Event index stored in that row
        event: i64,
    },

    /// Someone asked for an event that the source does not have
    #[error("Requested event {index}, but only {num_events} events are available")]
    EventOutOfRange {
        /// Requested event
        index: usize,
        /// Number of events in the source
        num_events: usize,
    },

    /// A track refers to a helix that is not part of its event
    #[error("Track {track} refers to helix {index}, but its event only has {available} helices")]
    MissingHelix {
        /// Index of the track within its event
        track: usize,
        /// Helix index stored in the track
        index: i64,
        /// Number of helices in the event
        available: usize,
    },

    /// A track refers to a PID trait that is not part of its event
    #[error("Track {track} refers to {detector} PID trait {index}, but its event only has {available}")]
    MissingPidTraits {
        /// Index of the track within its event
        track: usize,
        /// Detector whose traits were looked up
        detector: PidDetector,
        /// PID trait index stored in the track
        index: i64,
        /// Number of PID traits of this kind in the event
        available: usize,
    },

    /// Helix parameters which do not describe a trajectory
    #[error("Degenerate helix: {reason}")]
    DegenerateHelix {
        /// What is wrong with the parameters
        reason: &'static str,
    },

    /// A fill was requested for a histogram that was never booked
    #[error("No histogram named \"{name}\" in the book")]
    UnknownHistogram {
        /// Requested histogram name
        name: String,
    },

    /// A 1-D fill was requested on a 2-D histogram or vice versa
    #[error("Histogram \"{name}\" is {actual}-dimensional, but a {expected}-dimensional fill was requested")]
    HistogramDimension {
        /// Histogram name
        name: String,
        /// Dimension of the fill
        expected: usize,
        /// Dimension of the histogram
        actual: usize,
    },

    /// Two histogram books with different content cannot be merged
    #[error("Cannot merge histogram \"{name}\": binning differs")]
    IncompatibleHistograms {
        /// Histogram name
        name: String,
    },
}

impl AnalysisError {
    /// Truth that this error only affects one track, which can be dropped
    /// while the rest of the event is still analyzed
    pub fn is_track_level(&self) -> bool {
        matches!(
            self,
            Self::MissingHelix { .. } | Self::MissingPidTraits { .. } | Self::DegenerateHelix { .. }
        )
    }
}
