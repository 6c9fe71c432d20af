//! Per-event K0s reconstruction and accumulation of its results
//!
//! Every event goes through the same steps: its tracks are reconstructed and
//! split into charge buckets, then every (positive, negative) combination with
//! at least one identified daughter is turned into a decay vertex candidate,
//! which goes through the topological selection. Intermediate quantities and
//! accepted candidates are histogrammed along the way.

use crate::{
    config::Configuration,
    error::AnalysisResult,
    femtodst::EventRecord,
    histogram::{Binning, HistogramBook},
    numeric::Float,
    pairs::{PairGeometry, PairVerdict, PidMultiplicity, PT_MASS_BOTH, PT_MASS_SINGLE},
    track::{TrackArena, TrackRejections},
    units::{CENTIMETER, GEV},
};

use tracing::trace;

/// Decay length of every pair with an identified daughter
pub const DECAY_LENGTH: &str = "decayLength";

/// Daughter DCA of every pair with an identified daughter
pub const DCA_VEC: &str = "dcaVec";

/// Pointing angle of pairs passing the decay length and DCA cuts
pub const POINTING_ANGLE: &str = "pointingAngle";

/// Number of tracks per event
pub const N_TRACKS: &str = "nTracks";

/// Distance of closest approach of each track to the primary vertex
pub const TRACK_DCA: &str = "trackDca";

/// Histograms which are only filled in QA mode
const QA_HISTOGRAMS: [&str; 2] = [N_TRACKS, TRACK_DCA];

/// Every histogram filled by the analysis, in output order
const HISTOGRAMS: [&str; 7] = [
    DECAY_LENGTH,
    DCA_VEC,
    POINTING_ANGLE,
    PT_MASS_SINGLE,
    PT_MASS_BOTH,
    N_TRACKS,
    TRACK_DCA,
];

/// Binning of the analysis histograms, unless configured otherwise
pub fn default_binning(name: &str) -> Option<Binning> {
    let mass_vs_pt = || Binning::two_d((200, 0.3 * GEV, 0.7 * GEV), (50, 0., 5. * GEV));
    match name {
        DECAY_LENGTH => Some(Binning::one_d(200, 0., 100. * CENTIMETER)),
        DCA_VEC => Some(Binning::one_d(150, 0., 15. * CENTIMETER)),
        POINTING_ANGLE => Some(Binning::one_d(160, 0., 3.2)),
        PT_MASS_SINGLE | PT_MASS_BOTH => Some(mass_vs_pt()),
        N_TRACKS => Some(Binning::one_d(200, 0., 2000.)),
        TRACK_DCA => Some(Binning::one_d(100, 0., 10. * CENTIMETER)),
        _ => None,
    }
}

/// Counts of events, tracks and pairs going through each analysis step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CutFlow {
    /// Events analyzed
    pub events: usize,

    /// Events with at least one track in each charge bucket
    pub events_with_pairs: usize,

    /// Tracks read
    pub tracks: usize,

    /// Tracks which could not be reconstructed
    pub rejected_tracks: TrackRejections,

    /// (positive, negative) combinations considered
    pub pairs: usize,

    /// Pairs skipped because neither daughter is identified
    pub pairs_without_pid: usize,

    /// Pairs whose closest approach cannot be computed
    pub pairs_without_solution: usize,

    /// Pairs rejected by the decay length cut
    pub short_decay_length: usize,

    /// Pairs rejected by the daughter DCA cut
    pub large_dca: usize,

    /// Pairs rejected by the pointing angle cut
    pub large_pointing_angle: usize,

    /// Accepted candidates with one identified daughter
    pub single_pid_candidates: usize,

    /// Accepted candidates with two identified daughters
    pub both_pid_candidates: usize,
}
//
impl CutFlow {
    /// Merge counts from another batch of events
    pub fn merge(&mut self, other: &Self) {
        self.events += other.events;
        self.events_with_pairs += other.events_with_pairs;
        self.tracks += other.tracks;
        self.rejected_tracks.merge(&other.rejected_tracks);
        self.pairs += other.pairs;
        self.pairs_without_pid += other.pairs_without_pid;
        self.pairs_without_solution += other.pairs_without_solution;
        self.short_decay_length += other.short_decay_length;
        self.large_dca += other.large_dca;
        self.large_pointing_angle += other.large_pointing_angle;
        self.single_pid_candidates += other.single_pid_candidates;
        self.both_pid_candidates += other.both_pid_candidates;
    }

    /// Total number of accepted candidates
    pub fn candidates(&self) -> usize {
        self.single_pid_candidates + self.both_pid_candidates
    }
}

/// Results of the analysis of some events, which can be merged with the
/// results from other events
pub struct ResultsAccumulator<'cfg> {
    /// Analysis configuration
    cfg: &'cfg Configuration,

    /// Histograms
    book: HistogramBook,

    /// Selection counters
    cut_flow: CutFlow,
}
//
impl<'cfg> ResultsAccumulator<'cfg> {
    /// Prepare to analyze events
    pub fn new(cfg: &'cfg Configuration) -> Self {
        let mut book = HistogramBook::new();
        for name in HISTOGRAMS {
            if cfg.qa || !QA_HISTOGRAMS.contains(&name) {
                if let Some(binning) = cfg.binning(name) {
                    book.book(name, &binning);
                }
            }
        }
        Self {
            cfg,
            book,
            cut_flow: CutFlow::default(),
        }
    }

    /// Look for K0s candidates in an event
    pub fn process_event(&mut self, record: &EventRecord) -> AnalysisResult<()> {
        let cfg = self.cfg;
        let cut_flow = &mut self.cut_flow;
        let book = &mut self.book;

        // Count the event and its tracks before anything can be dropped
        cut_flow.events += 1;
        cut_flow.tracks += record.tracks.len();

        // Reconstruct the tracks, sorting them into charge buckets
        let arena = TrackArena::build(
            record,
            cfg.b_field,
            cfg.pid_detector,
            &mut cut_flow.rejected_tracks,
        )?;
        let (num_positive, num_negative) = arena.bucket_sizes();
        trace!(
            "Event {}/{}: mult={} ({} positive, {} negative)",
            record.event.run_id,
            record.event.event_id,
            record.tracks.len(),
            num_positive,
            num_negative
        );

        // Event and track QA
        let primary_vertex = &record.event.primary_vertex;
        if cfg.qa {
            book.fill(N_TRACKS, record.tracks.len() as Float)?;
            for track in arena.tracks() {
                book.fill(TRACK_DCA, track.helix.distance(primary_vertex))?;
            }
        }

        // Without two opposite charges, there is no pair to look at
        if num_positive == 0 || num_negative == 0 {
            return Ok(());
        }
        cut_flow.events_with_pairs += 1;

        for (pos, neg) in arena.pairs() {
            // Only pairs with at least one identified daughter are considered
            cut_flow.pairs += 1;
            let pid = PidMultiplicity::of_pair(pos.has_pid, neg.has_pid);
            let Some(mass_histogram) = pid.mass_histogram() else {
                cut_flow.pairs_without_pid += 1;
                continue;
            };
            // Find the decay vertex
            let Some(geometry) = PairGeometry::evaluate(
                &pos.helix,
                &neg.helix,
                primary_vertex,
                cfg.b_field,
                cfg.daughter.mass,
            ) else {
                cut_flow.pairs_without_solution += 1;
                continue;
            };

            // Histogram the topology, then apply the cuts in order
            book.fill(DECAY_LENGTH, geometry.decay_length())?;
            book.fill(DCA_VEC, geometry.dca())?;
            let verdict = geometry.select();
            if verdict.passes_vertex_cuts() {
                book.fill(POINTING_ANGLE, geometry.pointing_angle())?;
            }
            match verdict {
                PairVerdict::ShortDecayLength => cut_flow.short_decay_length += 1,
                PairVerdict::LargeDca => cut_flow.large_dca += 1,
                PairVerdict::LargePointingAngle => cut_flow.large_pointing_angle += 1,
                PairVerdict::Accepted => {
                    let vertex = geometry.secondary_vertex();
                    trace!(
                        "Candidate from tracks {}/{} in {} at ({:.2}, {:.2}, {:.2}): m={:.4}, pT={:.3}",
                        pos.track_idx,
                        neg.track_idx,
                        mass_histogram,
                        vertex.x,
                        vertex.y,
                        vertex.z,
                        geometry.mass(),
                        geometry.pt()
                    );
                    book.fill_2d(mass_histogram, geometry.mass(), geometry.pt())?;
                    if pid == PidMultiplicity::Both {
                        cut_flow.both_pid_candidates += 1;
                    } else {
                        cut_flow.single_pid_candidates += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Integrate the results of other events
    pub fn merge(&mut self, other: Self) -> AnalysisResult<()> {
        self.book.merge(&other.book)?;
        self.cut_flow.merge(&other.cut_flow);
        Ok(())
    }

    /// Turn the accumulated results into final results
    pub fn finalize(self) -> FinalResults {
        FinalResults {
            book: self.book,
            cut_flow: self.cut_flow,
        }
    }
}

/// Final analysis results
pub struct FinalResults {
    /// Histograms
    pub book: HistogramBook,

    /// Selection counters
    pub cut_flow: CutFlow,
}
