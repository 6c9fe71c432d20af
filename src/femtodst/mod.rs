//! FemtoDst event records and the sources which provide them
//!
//! A FemtoDst event is a primary vertex plus flat collections of tracks, track
//! helices and detector PID traits. Tracks refer to the other collections by
//! index within the same event, with -1 meaning "none".

pub(crate) mod reader;

pub use self::reader::FemtoDst;

use crate::{
    error::{AnalysisError, AnalysisResult},
    linalg::ThreeVector,
    numeric::Float,
};

use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Event-level information
#[derive(Clone, Debug, PartialEq)]
pub struct FemtoEvent {
    /// Run number
    pub run_id: i32,

    /// Event number within the run
    pub event_id: i32,

    /// Reconstructed collision vertex
    pub primary_vertex: ThreeVector,
}

/// Reconstructed track
#[derive(Clone, Debug, PartialEq)]
pub struct FemtoTrack {
    /// Electric charge
    pub charge: i8,

    /// Index of the track's helix in the event
    pub helix_index: i64,

    /// Index of the track's MTD PID traits in the event, or -1
    pub mtd_pid_traits_index: i64,

    /// Index of the track's BTof PID traits in the event, or -1
    pub btof_pid_traits_index: i64,
}

/// Fitted track helix: (px, py, pz, x, y, z) at the origin of the helix
#[derive(Clone, Debug, PartialEq)]
pub struct FemtoTrackHelix {
    /// Fit parameters
    pub par: [Float; 6],
}

/// Detectors which provide PID traits
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PidDetector {
    /// Muon Telescope Detector
    Mtd,

    /// Barrel Time Of Flight
    BTof,
}
//
impl PidDetector {
    /// PID trait index of a track for this detector (negative if absent)
    pub fn trait_index(self, track: &FemtoTrack) -> i64 {
        match self {
            Self::Mtd => track.mtd_pid_traits_index,
            Self::BTof => track.btof_pid_traits_index,
        }
    }

    /// Number of PID traits of this detector in an event
    pub fn num_traits(self, record: &EventRecord) -> usize {
        match self {
            Self::Mtd => record.num_mtd_pid_traits,
            Self::BTof => record.num_btof_pid_traits,
        }
    }
}

impl Display for PidDetector {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mtd => write!(fmt, "mtd"),
            Self::BTof => write!(fmt, "btof"),
        }
    }
}

impl FromStr for PidDetector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mtd" => Ok(Self::Mtd),
            "btof" => Ok(Self::BTof),
            other => Err(format!("unknown PID detector \"{other}\" (expected mtd or btof)")),
        }
    }
}

/// Everything that was recorded about one event
///
/// The analysis only needs to know which PID traits exist, not their content,
/// so these collections are reduced to their length.
///
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    /// Event-level information
    pub event: FemtoEvent,

    /// Reconstructed tracks
    pub tracks: Vec<FemtoTrack>,

    /// Track helices, indexed by FemtoTrack::helix_index
    pub helices: Vec<FemtoTrackHelix>,

    /// Number of MTD PID traits
    pub num_mtd_pid_traits: usize,

    /// Number of BTof PID traits
    pub num_btof_pid_traits: usize,
}
//
impl EventRecord {
    /// Look up the helix of a track
    pub fn helix(&self, track_idx: usize) -> AnalysisResult<&FemtoTrackHelix> {
        let index = self.tracks[track_idx].helix_index;
        usize::try_from(index)
            .ok()
            .and_then(|index| self.helices.get(index))
            .ok_or(AnalysisError::MissingHelix {
                track: track_idx,
                index,
                available: self.helices.len(),
            })
    }

    /// Truth that a track has PID traits from some detector
    ///
    /// Negative indices mean that there are no traits, other indices must
    /// point inside of the event's PID trait collection.
    ///
    pub fn has_pid_traits(&self, track_idx: usize, detector: PidDetector) -> AnalysisResult<bool> {
        let index = detector.trait_index(&self.tracks[track_idx]);
        let available = detector.num_traits(self);
        match usize::try_from(index) {
            Err(_) => Ok(false),
            Ok(idx) if idx < available => Ok(true),
            Ok(_) => Err(AnalysisError::MissingPidTraits {
                track: track_idx,
                detector,
                index,
                available,
            }),
        }
    }
}

/// Random-access provider of events
pub trait EventSource: Sync {
    /// Number of available events
    fn num_events(&self) -> usize;

    /// Extract an event
    fn event(&self, index: usize) -> AnalysisResult<EventRecord>;
}

impl EventSource for [EventRecord] {
    fn num_events(&self) -> usize {
        self.len()
    }

    fn event(&self, index: usize) -> AnalysisResult<EventRecord> {
        self.get(index)
            .cloned()
            .ok_or(AnalysisError::EventOutOfRange {
                index,
                num_events: self.len(),
            })
    }
}
