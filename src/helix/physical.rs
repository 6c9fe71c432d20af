//! Helices of charged particles in a uniform magnetic field along z

use super::Helix;
use crate::{
    error::{AnalysisError, AnalysisResult},
    linalg::{perp, ThreeVector},
    numeric::{reals::consts::FRAC_PI_2, Float},
    units::CURVATURE_CONSTANT,
};

use prefix_num_ops::real::*;

/// Trajectory of a charged particle
///
/// Besides the helix geometry, we keep track of the momentum magnitude so that
/// the momentum of straight tracks (neutral or field-free) remains available.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalHelix {
    /// Geometry of the trajectory
    helix: Helix,

    /// Momentum magnitude, which is conserved along the trajectory
    momentum: Float,
}
//
impl PhysicalHelix {
    /// Build the trajectory of a particle of given momentum and charge which
    /// goes through origin, in a magnetic field b_field (tesla, along z)
    pub fn new(
        momentum: &ThreeVector,
        origin: &ThreeVector,
        b_field: Float,
        charge: Float,
    ) -> AnalysisResult<Self> {
        let p = momentum.norm();
        if !p.is_finite() || !origin.iter().all(|x| x.is_finite()) {
            return Err(AnalysisError::DegenerateHelix {
                reason: "non-finite momentum or origin",
            });
        }
        if p == 0. {
            return Err(AnalysisError::DegenerateHelix {
                reason: "null momentum",
            });
        }
        let bending = charge * b_field;
        let pt = perp(momentum);
        if pt == 0. && bending != 0. {
            return Err(AnalysisError::DegenerateHelix {
                reason: "charged track without transverse momentum",
            });
        }

        // Positive particles in a positive field turn clockwise
        let h = if bending <= 0. { 1 } else { -1 };
        let h_sign = h as Float;
        let phase = if pt == 0. {
            FRAC_PI_2 / 2. * (1. - 2. * h_sign)
        } else {
            momentum.y.atan2(momentum.x) - h_sign * FRAC_PI_2
        };
        let dip_angle = momentum.z.atan2(pt);
        let curvature = abs(CURVATURE_CONSTANT * bending) / pt;

        Ok(Self {
            helix: Helix::new(curvature, dip_angle, phase, *origin, h),
            momentum: p,
        })
    }

    /// Build a trajectory from the six parameters of a FemtoDst track helix,
    /// namely (px, py, pz, x, y, z) at the origin of the helix
    pub fn from_parameters(par: &[Float; 6], b_field: Float, charge: Float) -> AnalysisResult<Self> {
        let momentum = ThreeVector::new(par[0], par[1], par[2]);
        let origin = ThreeVector::new(par[3], par[4], par[5]);
        Self::new(&momentum, &origin, b_field, charge)
    }

    /// Position at arc length s
    pub fn at(&self, s: Float) -> ThreeVector {
        self.helix.at(s)
    }

    /// Distance of closest approach to a point
    pub fn distance(&self, point: &ThreeVector) -> Float {
        self.helix.distance(point)
    }

    /// Arc lengths (on self and other) at the closest approach of two tracks
    pub fn path_lengths(&self, other: &PhysicalHelix) -> Option<(Float, Float)> {
        self.helix.path_lengths(&other.helix)
    }

    /// Momentum at arc length s in a magnetic field b_field (tesla)
    ///
    /// For curved tracks the transverse momentum follows from the curvature
    /// and the field. Straight tracks carry the momentum given at construction.
    ///
    pub fn momentum_at(&self, s: Float, b_field: Float) -> ThreeVector {
        let helix = &self.helix;
        if helix.is_line() {
            return helix.direction_at(s) * self.momentum;
        }
        let pt = abs(CURVATURE_CONSTANT * b_field) / helix.curvature;
        let angle = helix.phase_at(s) + helix.h * FRAC_PI_2;
        let (sin_a, cos_a) = angle.sin_cos();
        ThreeVector::new(pt * cos_a, pt * sin_a, pt * helix.dip_angle.tan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{GEV, KILOGAUSS, METER, TESLA};
    use approx::assert_relative_eq;

    const B_FIELD: Float = -4.9845 * KILOGAUSS;

    #[test]
    fn radius_follows_from_momentum_and_field() {
        // 1 GeV transverse momentum in a 1 T field bends on a 3.3356 m radius
        let helix = PhysicalHelix::new(
            &ThreeVector::new(1. * GEV, 0., 0.5 * GEV),
            &ThreeVector::zeros(),
            1. * TESLA,
            1.,
        )
        .unwrap();
        assert_relative_eq!(1. / helix.helix.curvature / METER, 3.335_640_95, epsilon = 1e-6);
        assert_relative_eq!(helix.helix.dip_angle, (0.5 as Float).atan2(1.));
    }

    #[test]
    fn momentum_is_recovered_at_the_origin() {
        let p = ThreeVector::new(0.3, -0.45, 0.8);
        let origin = ThreeVector::new(0.1, 0.2, -3.);
        for charge in [1., -1.] {
            for b_field in [B_FIELD, -B_FIELD] {
                let helix = PhysicalHelix::new(&p, &origin, b_field, charge).unwrap();
                assert_relative_eq!(helix.momentum_at(0., b_field), p, epsilon = 1e-9);
                assert_relative_eq!(helix.at(0.), origin, epsilon = 1e-12);
                // The sense of rotation encodes the sign of q·B
                assert_eq!(helix.helix.h, -(charge * b_field).signum());
                // The trajectory leaves the origin along the momentum
                assert_relative_eq!(
                    helix.helix.direction_at(0.),
                    p.normalize(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn momentum_is_tangent_and_conserved() {
        let p = ThreeVector::new(-0.6, 0.25, -0.1);
        let helix = PhysicalHelix::new(&p, &ThreeVector::zeros(), B_FIELD, -1.).unwrap();
        for s in [-40., 10., 250.] {
            let p_s = helix.momentum_at(s, B_FIELD);
            assert_relative_eq!(p_s.norm(), p.norm(), epsilon = 1e-9);
            assert_relative_eq!(p_s.normalize(), helix.helix.direction_at(s), epsilon = 1e-9);
        }
    }

    #[test]
    fn positive_tracks_turn_clockwise_in_positive_field() {
        let p = ThreeVector::new(1., 0., 0.);
        let helix = PhysicalHelix::new(&p, &ThreeVector::zeros(), 0.5 * TESLA, 1.).unwrap();
        // F = q v × B points towards -y
        assert!(helix.at(10.).y < 0.);
        let helix = PhysicalHelix::new(&p, &ThreeVector::zeros(), 0.5 * TESLA, -1.).unwrap();
        assert!(helix.at(10.).y > 0.);
    }

    #[test]
    fn straight_tracks() {
        let p = ThreeVector::new(0.3, 0.4, 1.2);
        let origin = ThreeVector::new(1., 1., 1.);
        for (b_field, charge) in [(0., 1.), (B_FIELD, 0.)] {
            let line = PhysicalHelix::new(&p, &origin, b_field, charge).unwrap();
            assert!(line.helix.is_line());
            assert_relative_eq!(line.at(p.norm()), origin + p, epsilon = 1e-12);
            assert_relative_eq!(line.momentum_at(-5., b_field), p, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        let origin = ThreeVector::zeros();
        for p in [
            ThreeVector::zeros(),
            ThreeVector::new(Float::NAN, 0., 1.),
            ThreeVector::new(0., 0., 1.),
        ] {
            assert!(matches!(
                PhysicalHelix::new(&p, &origin, B_FIELD, 1.),
                Err(AnalysisError::DegenerateHelix { .. })
            ));
        }
        // Without a field, tracks along z are fine
        assert!(PhysicalHelix::new(&ThreeVector::z(), &origin, 0., 1.).is_ok());
    }

    #[test]
    fn parameters_layout() {
        let par = [0.5, -0.2, 0.3, 0.01, -0.02, 4.5];
        let helix = PhysicalHelix::from_parameters(&par, B_FIELD, -1.).unwrap();
        assert_relative_eq!(helix.at(0.), ThreeVector::new(0.01, -0.02, 4.5), epsilon = 1e-12);
        assert_relative_eq!(
            helix.momentum_at(0., B_FIELD),
            ThreeVector::new(0.5, -0.2, 0.3),
            epsilon = 1e-9
        );
    }
}
