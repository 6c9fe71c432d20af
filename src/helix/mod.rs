//! Helical trajectories
//!
//! A helix is parametrized by its arc length `s` as follows:
//!
//! ```text
//! x(s) = x₀ + (cos(φ₀ + h·κ·s·cos λ) - cos φ₀) / κ
//! y(s) = y₀ + (sin(φ₀ + h·κ·s·cos λ) - sin φ₀) / κ
//! z(s) = z₀ + s·sin λ
//! ```
//!
//! where κ ≥ 0 is the curvature, λ the dip angle, φ₀ the phase (azimuth of the
//! origin as seen from the axis of the helix), h = ±1 the sense of rotation
//! and (x₀, y₀, z₀) the origin. A null curvature describes a straight line.
//!
//! This module only handles geometry. Helices which describe charged particles
//! in a magnetic field live in the `physical` submodule.

mod physical;

pub use self::physical::PhysicalHelix;

use crate::{
    linalg::ThreeVector,
    numeric::{
        reals::consts::{PI, TAU},
        Float,
    },
    units::{CENTIMETER, MICROMETER},
};

use prefix_num_ops::real::*;

/// Step size at which the helix/helix closest approach scan stops
const MIN_STEP_SIZE: Float = 10. * MICROMETER;

/// Minimal arc length range which the helix/helix closest approach scan covers
const MIN_RANGE: Float = 10. * CENTIMETER;

/// Precision of the helix/point closest approach Newton iteration
const MAX_PRECISION_NEEDED: Float = MICROMETER;

/// Newton iterations stop when the distance derivative flattens below this
const MIN_NEWTON_SLOPE: Float = 1e-12;

/// Iteration limit of the helix/point period scan and Newton iteration
const MAX_ITERATIONS: usize = 100;

/// Iteration limit of the helix/helix closest approach scan
const MAX_SCAN_ROUNDS: usize = 1000;

/// Lines whose directions are this close to parallel are treated as parallel
const PARALLEL_TOLERANCE: Float = 1e-12;

/// Helix geometry
#[derive(Clone, Debug, PartialEq)]
pub struct Helix {
    /// Curvature κ (inverse radius of the xy projection), never negative
    curvature: Float,

    /// Dip angle λ with respect to the xy plane
    dip_angle: Float,

    /// Phase φ₀ of the origin, in ]-π, π]
    phase: Float,

    /// Point of the helix at s = 0
    origin: ThreeVector,

    /// Sense of rotation h, either +1 or -1
    h: Float,

    // Cached trigonometry
    cos_dip: Float,
    sin_dip: Float,
    cos_phase: Float,
    sin_phase: Float,
}
//
impl Helix {
    // ### CONSTRUCTION ###

    /// Build a helix from its parameters
    ///
    /// A negative curvature is turned into a positive one by flipping the
    /// sense of rotation and shifting the phase by π, which describes the same
    /// curve.
    ///
    pub fn new(curvature: Float, dip_angle: Float, phase: Float, origin: ThreeVector, h: i32) -> Self {
        let h: Float = if h >= 0 { 1. } else { -1. };
        let (curvature, phase, h) = if curvature < 0. {
            (-curvature, phase + PI, -h)
        } else {
            (curvature, phase, h)
        };
        let (sin_dip, cos_dip) = dip_angle.sin_cos();
        let mut helix = Self {
            curvature,
            dip_angle,
            phase: 0.,
            origin,
            h,
            cos_dip,
            sin_dip,
            cos_phase: 1.,
            sin_phase: 0.,
        };
        helix.set_phase(phase);
        helix
    }

    /// Set the phase, normalizing it to ]-π, π]
    fn set_phase(&mut self, phase: Float) {
        let (sin_phase, cos_phase) = phase.sin_cos();
        self.sin_phase = sin_phase;
        self.cos_phase = cos_phase;
        self.phase = if abs(phase) > PI {
            sin_phase.atan2(cos_phase)
        } else {
            phase
        };
    }

    // ### ACCESSORS ###

    /// Truth that this helix degenerates into a straight line
    pub fn is_line(&self) -> bool {
        self.curvature == 0.
    }

    /// Center of the xy projection of the helix, if it is not a line
    pub fn center(&self) -> Option<(Float, Float)> {
        (!self.is_line()).then(|| {
            (
                self.origin.x - self.cos_phase / self.curvature,
                self.origin.y - self.sin_phase / self.curvature,
            )
        })
    }

    /// Arc length after which the helix projection is back to its origin
    /// (infinite for lines)
    pub fn period(&self) -> Float {
        if self.is_line() {
            Float::INFINITY
        } else {
            abs(TAU / (self.h * self.curvature * self.cos_dip))
        }
    }

    // ### EVALUATION ###

    /// Phase of the point at arc length s
    fn phase_at(&self, s: Float) -> Float {
        self.phase + s * self.h * self.curvature * self.cos_dip
    }

    /// Position at arc length s
    pub fn at(&self, s: Float) -> ThreeVector {
        let z = self.origin.z + s * self.sin_dip;
        if self.is_line() {
            ThreeVector::new(
                self.origin.x - s * self.cos_dip * self.sin_phase,
                self.origin.y + s * self.cos_dip * self.cos_phase,
                z,
            )
        } else {
            let (sin_s, cos_s) = self.phase_at(s).sin_cos();
            ThreeVector::new(
                self.origin.x + (cos_s - self.cos_phase) / self.curvature,
                self.origin.y + (sin_s - self.sin_phase) / self.curvature,
                z,
            )
        }
    }

    /// Unit tangent vector at arc length s
    pub fn direction_at(&self, s: Float) -> ThreeVector {
        let (sin_s, cos_s) = if self.is_line() {
            (self.sin_phase, self.cos_phase)
        } else {
            self.phase_at(s).sin_cos()
        };
        let h = if self.is_line() { 1. } else { self.h };
        ThreeVector::new(
            -h * self.cos_dip * sin_s,
            h * self.cos_dip * cos_s,
            self.sin_dip,
        )
    }

    // ### CLOSEST APPROACH ###

    /// Arc length at the closest approach of the xy projection to (x, y)
    ///
    /// The result is within half a period of the origin.
    ///
    pub fn path_length_2d(&self, x: Float, y: Float) -> Float {
        let dx = x - self.origin.x;
        let dy = y - self.origin.y;
        let across = dy * self.cos_phase - dx * self.sin_phase;
        if self.is_line() {
            across / self.cos_dip
        } else {
            let along = 1. / self.curvature + dx * self.cos_phase + dy * self.sin_phase;
            across.atan2(along) / (self.h * self.curvature * self.cos_dip)
        }
    }

    /// Arc length at the closest approach to a point
    pub fn path_length(&self, point: &ThreeVector) -> Float {
        let delta = point - self.origin;
        if self.is_line() {
            return self.cos_dip * (self.cos_phase * delta.y - self.sin_phase * delta.x)
                + self.sin_dip * delta.z;
        }

        // The 2D solution is a good first guess, but in steep cases it can be
        // off by a couple of periods along z.
        let mut s = self.path_length_2d(point.x, point.y);
        let period = self.period();
        let distance_at = |s: Float| (self.at(s) - point).norm();
        for direction in [1., -1.] {
            let mut d_min = distance_at(s);
            let mut jumps = 0;
            for j in 1..MAX_ITERATIONS {
                let d = distance_at(s + direction * (j as Float) * period);
                if d >= d_min {
                    break;
                }
                d_min = d;
                jumps = j;
            }
            s += direction * (jumps as Float) * period;
        }

        // Newton's method on the derivative of the squared distance
        let bend = self.curvature * self.cos_dip.powi(2);
        for _ in 0..MAX_ITERATIONS {
            let offset = self.at(s) - point;
            let tangent = self.direction_at(s);
            let (sin_s, cos_s) = self.phase_at(s).sin_cos();
            let slope = 1. - bend * (offset.x * cos_s + offset.y * sin_s);
            let step = offset.dot(&tangent) / slope;
            // On the axis of a flat helix, every point is equally close
            if abs(slope) < MIN_NEWTON_SLOPE || !step.is_finite() {
                break;
            }
            s -= step;
            if abs(step) < MAX_PRECISION_NEEDED {
                break;
            }
        }
        s
    }

    /// Distance of closest approach to a point
    pub fn distance(&self, point: &ThreeVector) -> Float {
        (self.at(self.path_length(point)) - point).norm()
    }

    /// Arc lengths (on self and other) at the closest approach of two helices
    ///
    /// Returns `None` if one of the helices is a line and the other is not.
    ///
    pub fn path_lengths(&self, other: &Helix) -> Option<(Float, Float)> {
        match (self.is_line(), other.is_line()) {
            (true, true) => Some(self.line_path_lengths(other)),
            (false, false) => Some(self.helix_path_lengths(other)),
            _ => None,
        }
    }

    /// Analytical closest approach of two lines
    fn line_path_lengths(&self, other: &Helix) -> (Float, Float) {
        let dv = other.origin - self.origin;
        let a = self.direction_at(0.);
        let b = other.direction_at(0.);
        let ab = a.dot(&b);
        let g = dv.dot(&a);
        let k = dv.dot(&b);
        let denom = ab.powi(2) - 1.;
        if abs(denom) < PARALLEL_TOLERANCE {
            // Parallel lines are equally close everywhere: stay at our origin
            return (0., -k);
        }
        let s2 = (k - ab * g) / denom;
        let s1 = g + s2 * ab;
        (s1, s2)
    }

    /// Numerical closest approach of two helices
    ///
    /// The crossings of the xy projections of both helices seed a local
    /// search on each side, and the closest of all solutions wins. Since both
    /// argument orders try the same candidates, swapping the helices only
    /// swaps the result.
    ///
    fn helix_path_lengths(&self, other: &Helix) -> (Float, Float) {
        let from_self = self.projection_seeds(other).into_iter().map(|seed| {
            let s1 = self.scan_closest_approach(other, seed);
            (s1, other.path_length(&self.at(s1)))
        });
        let from_other = other.projection_seeds(self).into_iter().map(|seed| {
            let s2 = other.scan_closest_approach(self, seed);
            (self.path_length(&other.at(s2)), s2)
        });
        from_self
            .chain(from_other)
            .map(|(s1, s2)| ((self.at(s1) - other.at(s2)).norm(), s1, s2))
            .min_by(|(d1, ..), (d2, ..)| d1.total_cmp(d2))
            .map(|(_, s1, s2)| (s1, s2))
            .unwrap_or_default()
    }

    /// Arc lengths of the points where the xy projection of this helix gets
    /// closest to that of another helix
    fn projection_seeds(&self, other: &Helix) -> Vec<Float> {
        // Neither helix is a line, so both have a center
        let (xc1, yc1) = self.center().unwrap_or_default();
        let (xc2, yc2) = other.center().unwrap_or_default();
        let dx = xc2 - xc1;
        let dy = yc2 - yc1;
        let dd = sqrt(dx.powi(2) + dy.powi(2));
        let r1 = 1. / self.curvature;
        let r2 = 1. / other.curvature;

        // Concentric circles are equally close everywhere
        if dd == 0. {
            return vec![0.];
        }

        // Two intersections of the projections: try both
        let cos_alpha = (r1.powi(2) + dd.powi(2) - r2.powi(2)) / (2. * r1 * dd);
        if abs(cos_alpha) < 1. {
            let sin_alpha = cos_alpha.acos().sin();
            return [sin_alpha, -sin_alpha]
                .into_iter()
                .map(|sin_alpha| {
                    let x = xc1 + r1 * (cos_alpha * dx - sin_alpha * dy) / dd;
                    let y = yc1 + r1 * (sin_alpha * dx + cos_alpha * dy) / dd;
                    self.path_length_2d(x, y)
                })
                .collect();
        }

        // No intersection (or exactly one). Aim away from the other center
        // when this circle is completely contained in the other one.
        let r_sign = if r2 - r1 > dd { -1. } else { 1. };
        let x = xc1 + r_sign * r1 * dx / dd;
        let y = yc1 + r_sign * r1 * dy / dd;
        vec![self.path_length_2d(x, y)]
    }

    /// Arc length of the closest approach to another helix, searched in
    /// decreasing intervals around a seed
    fn scan_closest_approach(&self, other: &Helix, seed: Float) -> Float {
        let mut s = seed;
        let mut d_min = other.distance(&self.at(s));
        let range = (2. * d_min).max(MIN_RANGE);
        let mut ds = range / 10.;
        let mut s1 = s - range / 2.;
        let mut s2 = s + range / 2.;
        let mut rounds = 0;
        while ds > MIN_STEP_SIZE && rounds < MAX_SCAN_ROUNDS {
            rounds += 1;
            let mut s_last = s1;
            let mut ss = s1;
            while ss < s2 + ds {
                let d = other.distance(&self.at(ss));
                if d < d_min {
                    d_min = d;
                    s = ss;
                }
                s_last = ss;
                ss += ds;
            }

            // If the minimum sits on the border of the range, shift the range
            // and scan again at the same resolution. Otherwise, zoom in.
            if s == s1 {
                let shift = 0.8 * (s2 - s1);
                s1 -= shift;
                s2 -= shift;
            } else if s == s_last {
                let shift = 0.8 * (s2 - s1);
                s1 += shift;
                s2 += shift;
            } else {
                s1 = s - ds;
                s2 = s + ds;
                ds /= 10.;
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::reals::consts::FRAC_PI_2;
    use approx::assert_relative_eq;

    /// Move the origin of a helix to the point at arc length s
    fn move_origin(helix: &mut Helix, s: Float) {
        let new_origin = helix.at(s);
        if let Some((x_center, y_center)) = helix.center() {
            helix.set_phase((new_origin.y - y_center).atan2(new_origin.x - x_center));
        }
        helix.origin = new_origin;
    }

    /// Flat circle of radius 10 centered on the z axis, starting at (10, 0, 0)
    fn flat_circle(h: i32) -> Helix {
        Helix::new(0.1, 0., 0., ThreeVector::new(10., 0., 0.), h)
    }

    #[test]
    fn negative_curvature_is_normalized() {
        let helix = Helix::new(-0.1, 0.2, 0., ThreeVector::zeros(), 1);
        assert_relative_eq!(helix.curvature, 0.1);
        assert_relative_eq!(helix.phase, PI);
        assert_eq!(helix.h, -1.);
        let reference = Helix::new(0.1, 0.2, PI, ThreeVector::zeros(), -1);
        assert_relative_eq!(helix.at(3.), reference.at(3.), epsilon = 1e-12);
    }

    #[test]
    fn circle_geometry() {
        let helix = flat_circle(1);
        let (xc, yc) = helix.center().unwrap();
        assert_relative_eq!(xc, 0., epsilon = 1e-12);
        assert_relative_eq!(yc, 0., epsilon = 1e-12);
        assert_relative_eq!(helix.period(), TAU * 10., epsilon = 1e-12);
        for s in [0., 1., 5., 17., 40.] {
            let p = helix.at(s);
            assert_relative_eq!(p.xy().norm(), 10., epsilon = 1e-9);
            assert_relative_eq!(p.z, 0.);
        }
        // A quarter turn counterclockwise
        assert_relative_eq!(
            helix.at(FRAC_PI_2 * 10.),
            ThreeVector::new(0., 10., 0.),
            epsilon = 1e-9
        );
        // ...or clockwise for the opposite sense of rotation
        assert_relative_eq!(
            flat_circle(-1).at(FRAC_PI_2 * 10.),
            ThreeVector::new(0., -10., 0.),
            epsilon = 1e-9
        );
    }

    #[test]
    fn direction_is_the_derivative_of_position() {
        let helix = Helix::new(0.05, 0.4, 1.2, ThreeVector::new(1., -2., 3.), -1);
        let eps = 1e-6;
        for s in [-20., 0., 13.] {
            let numeric = (helix.at(s + eps) - helix.at(s - eps)) / (2. * eps);
            assert_relative_eq!(helix.direction_at(s), numeric, epsilon = 1e-6);
            assert_relative_eq!(helix.direction_at(s).norm(), 1., epsilon = 1e-12);
        }
    }

    #[test]
    fn move_origin_preserves_the_curve() {
        let mut helix = Helix::new(0.02, -0.3, 2.5, ThreeVector::new(4., 5., -6.), 1);
        let reference = helix.clone();
        move_origin(&mut helix, 37.);
        assert_relative_eq!(helix.origin, reference.at(37.), epsilon = 1e-9);
        assert_relative_eq!(helix.at(11.), reference.at(48.), epsilon = 1e-9);
    }

    #[test]
    fn path_length_to_points_on_the_helix() {
        let helix = Helix::new(0.01, 0.7, -0.5, ThreeVector::new(1., 2., 3.), 1);
        for s in [-150., -3., 0., 42., 400.] {
            assert_relative_eq!(helix.path_length(&helix.at(s)), s, epsilon = 1e-4);
            assert!(helix.distance(&helix.at(s)) < 1e-4);
        }
    }

    #[test]
    fn distance_to_circle_axis() {
        let helix = flat_circle(1);
        assert_relative_eq!(
            helix.distance(&ThreeVector::new(0., 0., 0.5)),
            sqrt(100.25 as Float),
            epsilon = 1e-6
        );
        assert_relative_eq!(helix.distance(&ThreeVector::new(25., 0., 0.)), 15., epsilon = 1e-6);
    }

    #[test]
    fn parallel_lines() {
        // Two lines along x, 3 apart along y and 4 apart along z
        let l1 = Helix::new(0., 0., -FRAC_PI_2, ThreeVector::new(0., 0., 0.), 1);
        let l2 = Helix::new(0., 0., -FRAC_PI_2, ThreeVector::new(7., 3., 4.), 1);
        assert_relative_eq!(l1.direction_at(0.), ThreeVector::x(), epsilon = 1e-12);
        let (s1, s2) = l1.path_lengths(&l2).unwrap();
        assert!(s1.is_finite() && s2.is_finite());
        assert_relative_eq!((l1.at(s1) - l2.at(s2)).norm(), 5., epsilon = 1e-9);
        assert_relative_eq!(l2.at(s2).x, l1.at(s1).x, epsilon = 1e-9);
    }

    #[test]
    fn skew_lines() {
        // Line along x through the origin, line along y at z = 2 through x = 3
        let l1 = Helix::new(0., 0., -FRAC_PI_2, ThreeVector::zeros(), 1);
        let l2 = Helix::new(0., 0., 0., ThreeVector::new(3., -5., 2.), 1);
        let (s1, s2) = l1.path_lengths(&l2).unwrap();
        assert_relative_eq!(s1, 3., epsilon = 1e-9);
        assert_relative_eq!(s2, 5., epsilon = 1e-9);
        assert_relative_eq!((l1.at(s1) - l2.at(s2)).norm(), 2., epsilon = 1e-9);
    }

    #[test]
    fn line_and_helix_have_no_solution() {
        let line = Helix::new(0., 0., 0., ThreeVector::zeros(), 1);
        assert!(line.path_lengths(&flat_circle(1)).is_none());
        assert!(flat_circle(1).path_lengths(&line).is_none());
    }

    #[test]
    fn crossing_helices() {
        // Two helices crossing at a known point with different dips, so that
        // only one of the two intersections of their projections is a true 3D
        // crossing.
        let vertex = ThreeVector::new(5., 1., -2.);
        let mut h1 = Helix::new(0.004, 0.3, 0.2, ThreeVector::zeros(), 1);
        let mut h2 = Helix::new(0.006, -0.2, 2.1, ThreeVector::zeros(), -1);
        h1.origin = vertex;
        h2.origin = vertex;
        move_origin(&mut h1, -30.);
        move_origin(&mut h2, -50.);
        let (s1, s2) = h1.path_lengths(&h2).unwrap();
        assert_relative_eq!(s1, 30., epsilon = 1e-3);
        assert_relative_eq!(s2, 50., epsilon = 1e-3);
        assert!((h1.at(s1) - h2.at(s2)).norm() < 1e-3);

        // The result is symmetrical
        let (t2, t1) = h2.path_lengths(&h1).unwrap();
        assert_relative_eq!(t1, s1, epsilon = 1e-3);
        assert_relative_eq!(t2, s2, epsilon = 1e-3);
    }

    #[test]
    fn disjoint_helices() {
        // Two flat circles of radius 10 whose centers are 25 apart: the
        // closest points are on the line joining the centers, 5 apart.
        let h1 = flat_circle(1);
        let h2 = Helix::new(0.1, 0., PI, ThreeVector::new(15., 0., 0.), 1);
        let (s1, s2) = h1.path_lengths(&h2).unwrap();
        assert_relative_eq!(h1.at(s1), ThreeVector::new(10., 0., 0.), epsilon = 1e-3);
        assert_relative_eq!(h2.at(s2), ThreeVector::new(15., 0., 0.), epsilon = 1e-3);
    }
}
