//! Some shared linear algebra concepts

use crate::numeric::Float;

use nalgebra::Vector3;

/// Cartesian 3-vector of real numbers (positions, momenta, displacements)
pub type ThreeVector = Vector3<Float>;

/// Transverse (xy-plane) magnitude of a 3-vector
pub fn perp(v: &ThreeVector) -> Float {
    v.xy().norm()
}

/// Angle between two 3-vectors, in [0, π]
///
/// Follows the usual HEP convention of returning zero when either vector is
/// null instead of propagating a NaN.
///
pub fn angle(v1: &ThreeVector, v2: &ThreeVector) -> Float {
    v1.angle(v2)
}
