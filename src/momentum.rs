//! This module implements some domain-specific 4-momentum handling logic.

use crate::{linalg::ThreeVector, numeric::Float};
use nalgebra::SVector;
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 4-vector
pub const Y: usize = 1;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build the 4-momentum of a particle of known mass from its 3-momentum
pub fn on_shell(p: &ThreeVector, mass: Float) -> Momentum {
    Momentum::new(p.x, p.y, p.z, sqrt(p.norm_squared() + mass.powi(2)))
}

/// Get the spatial part of a 4-momentum
pub fn xyz(m: &Momentum) -> ThreeVector {
    m.fixed_rows::<3>(X).into_owned()
}

/// Invariant mass of a 4-momentum
///
/// Space-like 4-momenta get a negative mass, so that they remain visible in
/// mass spectra instead of turning into NaNs.
///
pub fn invariant_mass(m: &Momentum) -> Float {
    let m2 = m[E].powi(2) - xyz(m).norm_squared();
    if m2 < 0. {
        -sqrt(-m2)
    } else {
        sqrt(m2)
    }
}

/// Transverse momentum of a 4-momentum
pub fn transverse_momentum(m: &Momentum) -> Float {
    sqrt(m[X].powi(2) + m[Y].powi(2))
}
