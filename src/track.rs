//! Per-event arena of fully reconstructed tracks, bucketed by charge

use crate::{
    error::{AnalysisError, AnalysisResult},
    femtodst::{EventRecord, PidDetector},
    helix::PhysicalHelix,
    numeric::Float,
};

use tracing::warn;

/// Track with its trajectory and PID information resolved
#[derive(Clone, Debug)]
pub struct FullTrack {
    /// Position of the track within its event
    pub track_idx: usize,

    /// Electric charge
    pub charge: i8,

    /// Reconstructed trajectory
    pub helix: PhysicalHelix,

    /// Truth that the configured detector has PID traits for this track
    pub has_pid: bool,
}

/// Counts of tracks that could not be reconstructed, by cause
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackRejections {
    /// Helix index out of range
    pub missing_helix: usize,

    /// Helix parameters which do not describe a trajectory
    pub degenerate_helix: usize,

    /// PID trait index out of range
    pub missing_pid_traits: usize,
}
//
impl TrackRejections {
    /// Record a track-level error
    fn record(&mut self, error: &AnalysisError) {
        match error {
            AnalysisError::MissingHelix { .. } => self.missing_helix += 1,
            AnalysisError::DegenerateHelix { .. } => self.degenerate_helix += 1,
            AnalysisError::MissingPidTraits { .. } => self.missing_pid_traits += 1,
            _ => unreachable!("Only track-level errors should be recorded"),
        }
    }

    /// Total number of rejected tracks
    pub fn total(&self) -> usize {
        self.missing_helix + self.degenerate_helix + self.missing_pid_traits
    }

    /// Merge counts from another batch of events
    pub fn merge(&mut self, other: &Self) {
        self.missing_helix += other.missing_helix;
        self.degenerate_helix += other.degenerate_helix;
        self.missing_pid_traits += other.missing_pid_traits;
    }
}

/// All usable tracks of an event, plus their partition into charge buckets
///
/// Tracks with a positive charge go to the positive bucket, all others
/// (including neutral tracks) to the negative one.
///
#[derive(Debug, Default)]
pub struct TrackArena {
    tracks: Vec<FullTrack>,
    positive: Vec<usize>,
    negative: Vec<usize>,
}
//
impl TrackArena {
    /// Reconstruct the tracks of an event in magnetic field b_field (tesla)
    ///
    /// Tracks whose helix or PID traits cannot be resolved, or whose helix is
    /// degenerate, are dropped and recorded in `rejections`.
    ///
    pub fn build(
        record: &EventRecord,
        b_field: Float,
        detector: PidDetector,
        rejections: &mut TrackRejections,
    ) -> AnalysisResult<Self> {
        let mut arena = Self::default();
        for (track_idx, track) in record.tracks.iter().enumerate() {
            // Resolve the helix and PID traits of the track
            let full_track = record.helix(track_idx).and_then(|helix| {
                let helix = PhysicalHelix::from_parameters(&helix.par, b_field, track.charge as Float)?;
                Ok(FullTrack {
                    track_idx,
                    charge: track.charge,
                    helix,
                    has_pid: record.has_pid_traits(track_idx, detector)?,
                })
            });
            // Broken tracks are dropped, anything else aborts the event
            match full_track {
                Ok(full_track) => arena.push(full_track),
                Err(e) if e.is_track_level() => {
                    warn!(
                        "Dropping track {} of event {}/{}: {}",
                        track_idx, record.event.run_id, record.event.event_id, e
                    );
                    rejections.record(&e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(arena)
    }

    /// Add a track to the arena and to its charge bucket
    pub fn push(&mut self, track: FullTrack) {
        let idx = self.tracks.len();
        if track.charge > 0 {
            self.positive.push(idx);
        } else {
            self.negative.push(idx);
        }
        self.tracks.push(track);
    }

    /// All tracks of the event
    pub fn tracks(&self) -> &[FullTrack] {
        &self.tracks[..]
    }

    /// Tracks of the positive bucket
    pub fn positive(&self) -> impl Iterator<Item = &FullTrack> + '_ {
        self.positive.iter().map(move |&idx| &self.tracks[idx])
    }

    /// Tracks of the negative bucket
    pub fn negative(&self) -> impl Iterator<Item = &FullTrack> + '_ {
        self.negative.iter().map(move |&idx| &self.tracks[idx])
    }

    /// Number of tracks in the (positive, negative) buckets
    pub fn bucket_sizes(&self) -> (usize, usize) {
        (self.positive.len(), self.negative.len())
    }

    /// Every (positive, negative) combination of tracks
    pub fn pairs(&self) -> impl Iterator<Item = (&FullTrack, &FullTrack)> + '_ {
        self.positive()
            .flat_map(move |pos| self.negative().map(move |neg| (pos, neg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        femtodst::{FemtoEvent, FemtoTrack, FemtoTrackHelix},
        linalg::ThreeVector,
        units::KILOGAUSS,
    };

    const B_FIELD: Float = -4.9845 * KILOGAUSS;

    fn track(charge: i8, helix_index: i64, mtd: i64) -> FemtoTrack {
        FemtoTrack {
            charge,
            helix_index,
            mtd_pid_traits_index: mtd,
            btof_pid_traits_index: -1,
        }
    }

    fn record(tracks: Vec<FemtoTrack>) -> EventRecord {
        EventRecord {
            event: FemtoEvent {
                run_id: 1,
                event_id: 1,
                primary_vertex: ThreeVector::zeros(),
            },
            tracks,
            helices: vec![
                FemtoTrackHelix { par: [0.4, 0.1, 0.2, 0., 0., 0.] },
                FemtoTrackHelix { par: [-0.3, 0.5, -0.1, 0.1, 0., 1.] },
                FemtoTrackHelix { par: [0., 0., 0., 0., 0., 0.] },
            ],
            num_mtd_pid_traits: 2,
            num_btof_pid_traits: 0,
        }
    }

    #[test]
    fn charge_buckets() {
        let record = record(vec![track(1, 0, 0), track(-1, 1, -1), track(0, 1, -1), track(2, 1, 1)]);
        let mut rejections = TrackRejections::default();
        let arena = TrackArena::build(&record, B_FIELD, PidDetector::Mtd, &mut rejections).unwrap();
        assert_eq!(rejections.total(), 0);
        assert_eq!(arena.tracks().len(), 4);
        assert_eq!(arena.bucket_sizes(), (2, 2));
        assert_eq!(arena.positive().map(|t| t.track_idx).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(arena.negative().map(|t| t.track_idx).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(arena.pairs().count(), 4);
        assert!(arena.tracks()[0].has_pid);
        assert!(!arena.tracks()[1].has_pid);

        // The neutral track is a straight line, along which momentum is constant
        let neutral = &arena.tracks()[2].helix;
        assert_eq!(neutral.momentum_at(50., B_FIELD), neutral.momentum_at(0., B_FIELD));
    }

    #[test]
    fn broken_tracks_are_dropped() {
        let record = record(vec![
            track(1, 0, -1),
            track(-1, 7, -1),
            track(1, 2, -1),
            track(-1, 1, 5),
            track(-1, 1, 1),
        ]);
        let mut rejections = TrackRejections::default();
        let arena = TrackArena::build(&record, B_FIELD, PidDetector::Mtd, &mut rejections).unwrap();
        assert_eq!(
            rejections,
            TrackRejections {
                missing_helix: 1,
                degenerate_helix: 1,
                missing_pid_traits: 1,
            }
        );
        assert_eq!(
            arena.tracks().iter().map(|t| t.track_idx).collect::<Vec<_>>(),
            vec![0, 4]
        );
        assert_eq!(arena.bucket_sizes(), (1, 1));
    }

    #[test]
    fn detector_choice() {
        let mut record = record(vec![track(1, 0, 0)]);
        record.tracks[0].btof_pid_traits_index = 0;
        record.num_btof_pid_traits = 1;
        record.tracks[0].mtd_pid_traits_index = -1;
        let mut rejections = TrackRejections::default();
        let mtd = TrackArena::build(&record, B_FIELD, PidDetector::Mtd, &mut rejections).unwrap();
        let btof = TrackArena::build(&record, B_FIELD, PidDetector::BTof, &mut rejections).unwrap();
        assert!(!mtd.tracks()[0].has_pid);
        assert!(btof.tracks()[0].has_pid);
    }
}
