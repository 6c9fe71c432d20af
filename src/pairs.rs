//! Decay vertex reconstruction for pairs of oppositely charged tracks

use crate::{
    helix::PhysicalHelix,
    linalg::{angle, ThreeVector},
    momentum::{invariant_mass, on_shell, transverse_momentum, xyz, Momentum},
    numeric::Float,
    units::{CENTIMETER, GEV},
};

/// Pairs whose secondary vertex is closer than this to the primary vertex are
/// rejected
pub const MIN_DECAY_LENGTH: Float = 2.7 * CENTIMETER;

/// Pairs whose daughters do not get closer than this are rejected
pub const MAX_DCA: Float = 1.5 * CENTIMETER;

/// Largest pointing angle (rad) allowed for a parent of given transverse
/// momentum
pub fn max_pointing_angle(pt: Float) -> Float {
    let pt = pt / GEV;
    0.106 + 0.056 - 0.1123 * pt + 0.025 * pt * pt
}

/// Decay topology of a (positive, negative) track pair
#[derive(Clone, Debug, PartialEq)]
pub struct PairGeometry {
    /// Positive daughter position minus negative daughter position, at the
    /// point of closest approach
    dca_vector: ThreeVector,

    /// Midpoint of the closest approach
    secondary_vertex: ThreeVector,

    /// Secondary vertex minus primary vertex
    decay_vector: ThreeVector,

    /// Sum of the daughter 4-momenta at the closest approach
    parent: Momentum,
}
//
impl PairGeometry {
    /// Reconstruct the decay vertex of a pair of daughters of given mass
    ///
    /// Returns `None` when the closest approach of the daughters cannot be
    /// computed (one straight and one curved trajectory).
    ///
    pub fn evaluate(
        positive: &PhysicalHelix,
        negative: &PhysicalHelix,
        primary_vertex: &ThreeVector,
        b_field: Float,
        daughter_mass: Float,
    ) -> Option<Self> {
        let (s_pos, s_neg) = positive.path_lengths(negative)?;
        let pos_at_dca = positive.at(s_pos);
        let neg_at_dca = negative.at(s_neg);
        let dca_vector = pos_at_dca - neg_at_dca;
        let secondary_vertex = neg_at_dca + 0.5 * dca_vector;
        let decay_vector = secondary_vertex - primary_vertex;
        let parent = on_shell(&positive.momentum_at(s_pos, b_field), daughter_mass)
            + on_shell(&negative.momentum_at(s_neg, b_field), daughter_mass);
        Some(Self {
            dca_vector,
            secondary_vertex,
            decay_vector,
            parent,
        })
    }

    /// Distance between the primary and secondary vertices
    pub fn decay_length(&self) -> Float {
        self.decay_vector.norm()
    }

    /// Distance of closest approach of the daughters
    pub fn dca(&self) -> Float {
        self.dca_vector.norm()
    }

    /// Reconstructed decay point
    pub fn secondary_vertex(&self) -> &ThreeVector {
        &self.secondary_vertex
    }

    /// Angle between the parent momentum and the decay vector
    pub fn pointing_angle(&self) -> Float {
        angle(&xyz(&self.parent), &self.decay_vector)
    }

    /// Invariant mass of the pair
    pub fn mass(&self) -> Float {
        invariant_mass(&self.parent)
    }

    /// Transverse momentum of the pair
    pub fn pt(&self) -> Float {
        transverse_momentum(&self.parent)
    }

    /// Apply the topological selection
    pub fn select(&self) -> PairVerdict {
        if self.decay_length() < MIN_DECAY_LENGTH {
            PairVerdict::ShortDecayLength
        } else if self.dca() > MAX_DCA {
            PairVerdict::LargeDca
        } else if self.pointing_angle().abs() > max_pointing_angle(self.pt()) {
            PairVerdict::LargePointingAngle
        } else {
            PairVerdict::Accepted
        }
    }
}

/// Outcome of the topological selection, in cut order
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PairVerdict {
    /// Decay vertex too close to the primary vertex
    ShortDecayLength,

    /// Daughters too far apart
    LargeDca,

    /// Parent momentum does not point back to the primary vertex
    LargePointingAngle,

    /// K0s candidate
    Accepted,
}
//
impl PairVerdict {
    /// Truth that the pair passed the decay length and DCA cuts
    pub fn passes_vertex_cuts(self) -> bool {
        matches!(self, Self::LargePointingAngle | Self::Accepted)
    }
}

/// Number of daughters that have PID traits
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PidMultiplicity {
    /// No daughter is identified
    None,

    /// One daughter is identified
    Single,

    /// Both daughters are identified
    Both,
}
//
impl PidMultiplicity {
    /// Classify a pair from the identification status of its daughters
    pub fn of_pair(positive_has_pid: bool, negative_has_pid: bool) -> Self {
        match (positive_has_pid, negative_has_pid) {
            (false, false) => Self::None,
            (true, true) => Self::Both,
            _ => Self::Single,
        }
    }

    /// Histogram receiving the mass vs pT of accepted pairs, if any
    pub fn mass_histogram(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Single => Some(PT_MASS_SINGLE),
            Self::Both => Some(PT_MASS_BOTH),
        }
    }
}

/// Mass vs pT of candidates with one identified daughter
pub const PT_MASS_SINGLE: &str = "pt_mass_smtd";

/// Mass vs pT of candidates with two identified daughters
pub const PT_MASS_BOTH: &str = "pt_mass_bmtd";

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        numeric::reals::consts::{PI, TAU},
        particles::ParticleDefinition,
        units::KILOGAUSS,
    };
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;

    use prefix_num_ops::real::*;

    pub(crate) const B_FIELD: Float = -4.9845 * KILOGAUSS;

    /// Pion mass hypothesis
    pub(crate) fn pion_mass() -> Float {
        ParticleDefinition::by_name("pi+").unwrap().mass
    }

    /// Daughter momenta of a K0s of momentum (p_parent, 0, 0) decaying
    /// into two pions, with the decay plane rotated by theta around x
    pub(crate) fn k0s_daughters(p_parent: Float, theta: Float) -> (ThreeVector, ThreeVector) {
        let k0s_mass = ParticleDefinition::by_name("kaon0S").unwrap().mass;
        let p_star = sqrt(k0s_mass.powi(2) / 4. - pion_mass().powi(2));
        let (sin_t, cos_t) = theta.sin_cos();
        let transverse = ThreeVector::new(0., p_star * cos_t, p_star * sin_t);
        let longitudinal = ThreeVector::new(p_parent / 2., 0., 0.);
        (longitudinal + transverse, longitudinal - transverse)
    }

    /// Helices of K0s daughters which start from a common decay vertex. The
    /// negative daughter's origin may be shifted away from that vertex.
    pub(crate) fn k0s_helices(
        decay_vertex: &ThreeVector,
        negative_shift: &ThreeVector,
    ) -> (PhysicalHelix, PhysicalHelix) {
        let (p_pos, p_neg) = k0s_daughters(1. * GEV, 0.5);
        (
            PhysicalHelix::new(&p_pos, decay_vertex, B_FIELD, 1.).unwrap(),
            PhysicalHelix::new(&p_neg, &(decay_vertex + negative_shift), B_FIELD, -1.).unwrap(),
        )
    }

    /// Unit vector orthogonal to both daughter momenta
    pub(crate) fn decay_plane_normal() -> ThreeVector {
        let (p_pos, p_neg) = k0s_daughters(1. * GEV, 0.5);
        p_pos.cross(&p_neg).normalize()
    }

    fn primary_vertex() -> ThreeVector {
        ThreeVector::new(0.1, -0.2, 3.)
    }

    #[test]
    fn reconstructs_the_k0s_mass() {
        let k0s_mass = ParticleDefinition::by_name("kaon0S").unwrap().mass;
        let pv = primary_vertex();
        let decay_vertex = pv + ThreeVector::new(6., 0., 0.);
        let (pos, neg) = k0s_helices(&decay_vertex, &ThreeVector::zeros());
        let geometry = PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap();

        assert_relative_eq!(geometry.mass(), k0s_mass, epsilon = 1e-4);
        assert_relative_eq!(geometry.pt(), 1., epsilon = 1e-4);
        assert!(geometry.dca() < 1e-3);
        assert_relative_eq!(*geometry.secondary_vertex(), decay_vertex, epsilon = 1e-3);
        assert_relative_eq!(geometry.decay_length(), 6., epsilon = 1e-3);
        assert!(geometry.pointing_angle() < 1e-3);
        assert_eq!(geometry.select(), PairVerdict::Accepted);
    }

    /// Random track starting within 20 cm of the center of the detector
    fn random_track(rng: &mut impl Rng, charge: Float) -> PhysicalHelix {
        let pt: Float = rng.gen_range(0.15..2.);
        let phi: Float = rng.gen_range(-PI..PI);
        let p = ThreeVector::new(pt * phi.cos(), pt * phi.sin(), rng.gen_range(-1.0..1.0));
        let origin = ThreeVector::new(
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
        );
        PhysicalHelix::new(&p, &origin, B_FIELD, charge).unwrap()
    }

    /// Same trajectory, with its origin moved to arc length s
    fn moved(helix: &PhysicalHelix, s: Float, charge: Float) -> PhysicalHelix {
        PhysicalHelix::new(&helix.momentum_at(s, B_FIELD), &helix.at(s), B_FIELD, charge).unwrap()
    }

    #[test]
    fn label_swap_symmetry() {
        let mut rng = Xoshiro256Plus::seed_from_u64(310);
        let pv = primary_vertex();
        for _ in 0..500 {
            let pos = random_track(&mut rng, 1.);
            let neg = random_track(&mut rng, -1.);
            let direct = PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap();
            let swapped = PairGeometry::evaluate(&neg, &pos, &pv, B_FIELD, pion_mass()).unwrap();
            assert_relative_eq!(direct.dca(), swapped.dca(), epsilon = 1e-9);
            assert_relative_eq!(direct.decay_length(), swapped.decay_length(), epsilon = 1e-9);
            assert_eq!(direct.select(), swapped.select());
        }
    }

    #[test]
    fn displaced_daughters_are_found() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0x4b53);
        let pv = primary_vertex();
        for _ in 0..200 {
            // K0s of random momentum and direction, decaying 3 to 30 cm away
            let (p_pos, p_neg) = k0s_daughters(rng.gen_range(0.3..3.), rng.gen_range(0.0..TAU));
            let rotation = Rotation3::from_axis_angle(&ThreeVector::z_axis(), rng.gen_range(0.0..TAU))
                * Rotation3::from_axis_angle(&ThreeVector::y_axis(), rng.gen_range(-0.8..0.8));
            let decay_vertex = pv + rotation * ThreeVector::new(rng.gen_range(3.0..30.0), 0., 0.);

            // The negative daughter misses the vertex a bit, and both tracks
            // only start being measured further along
            let miss = ThreeVector::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
            );
            let pos = PhysicalHelix::new(&(rotation * p_pos), &decay_vertex, B_FIELD, 1.).unwrap();
            let neg = PhysicalHelix::new(&(rotation * p_neg), &(decay_vertex + miss), B_FIELD, -1.)
                .unwrap();
            let pos = moved(&pos, rng.gen_range(0.0..30.), 1.);
            let neg = moved(&neg, rng.gen_range(0.0..30.), -1.);

            for geometry in [
                PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap(),
                PairGeometry::evaluate(&neg, &pos, &pv, B_FIELD, pion_mass()).unwrap(),
            ] {
                assert!(
                    geometry.dca() <= miss.norm() + 2e-3,
                    "dca {} for a miss of {}",
                    geometry.dca(),
                    miss.norm()
                );
            }
        }
    }

    #[test]
    fn decay_length_cut() {
        let pv = primary_vertex();
        let (pos, neg) = k0s_helices(&(pv + ThreeVector::new(1., 0., 0.)), &ThreeVector::zeros());
        let geometry = PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap();
        assert_eq!(geometry.select(), PairVerdict::ShortDecayLength);
        assert!(!geometry.select().passes_vertex_cuts());
    }

    #[test]
    fn dca_cut() {
        let pv = primary_vertex();
        let (pos, neg) = k0s_helices(
            &(pv + ThreeVector::new(6., 0., 0.)),
            &(3. * decay_plane_normal()),
        );
        let geometry = PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap();
        assert!(geometry.dca() > MAX_DCA);
        assert_eq!(geometry.select(), PairVerdict::LargeDca);
        assert!(!geometry.select().passes_vertex_cuts());
    }

    #[test]
    fn pointing_angle_cut() {
        let pv = primary_vertex();
        let (pos, neg) = k0s_helices(&(pv + ThreeVector::new(0., 6., 0.)), &ThreeVector::zeros());
        let geometry = PairGeometry::evaluate(&pos, &neg, &pv, B_FIELD, pion_mass()).unwrap();
        assert_relative_eq!(
            geometry.pointing_angle(),
            crate::numeric::reals::consts::FRAC_PI_2,
            epsilon = 1e-3
        );
        assert_eq!(geometry.select(), PairVerdict::LargePointingAngle);
        assert!(geometry.select().passes_vertex_cuts());
    }

    #[test]
    fn pointing_angle_bound() {
        assert_relative_eq!(max_pointing_angle(0.), 0.162, epsilon = 1e-12);
        assert_relative_eq!(max_pointing_angle(2.), 0.162 - 0.2246 + 0.1, epsilon = 1e-12);
        // The bound never closes
        for i in 0..100 {
            assert!(max_pointing_angle(i as Float * 0.1) > 0.);
        }
    }

    #[test]
    fn straight_and_curved_tracks_do_not_pair() {
        let p = ThreeVector::new(0.5, 0.1, 0.);
        let curved = PhysicalHelix::new(&p, &ThreeVector::zeros(), B_FIELD, 1.).unwrap();
        let straight = PhysicalHelix::new(&p, &ThreeVector::zeros(), B_FIELD, 0.).unwrap();
        assert!(PairGeometry::evaluate(&curved, &straight, &primary_vertex(), B_FIELD, pion_mass())
            .is_none());
    }

    #[test]
    fn pid_multiplicity() {
        assert_eq!(PidMultiplicity::of_pair(false, false), PidMultiplicity::None);
        assert_eq!(PidMultiplicity::of_pair(true, false), PidMultiplicity::Single);
        assert_eq!(PidMultiplicity::of_pair(false, true), PidMultiplicity::Single);
        assert_eq!(PidMultiplicity::of_pair(true, true), PidMultiplicity::Both);
        assert_eq!(PidMultiplicity::None.mass_histogram(), None);
        assert_eq!(PidMultiplicity::Single.mass_histogram(), Some("pt_mass_smtd"));
        assert_eq!(PidMultiplicity::Both.mass_histogram(), Some("pt_mass_bmtd"));
    }
}
