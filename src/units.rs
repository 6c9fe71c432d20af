//! System of units
//!
//! Lengths are expressed in centimeters, momenta and energies in GeV, magnetic
//! fields in tesla and times in nanoseconds. Multiplying a raw value by one of
//! these constants converts it into internal units, dividing converts it back.

#![allow(missing_docs)]

use crate::numeric::Float;

// ### LENGTH ###
pub const CENTIMETER: Float = 1.;
pub const METER: Float = 100. * CENTIMETER;
pub const MICROMETER: Float = 1e-4 * CENTIMETER;

// ### ENERGY ###
pub const GEV: Float = 1.;
pub const MEV: Float = 1e-3 * GEV;

// ### TIME ###
pub const NANOSECOND: Float = 1.;
pub const SECOND: Float = 1e9 * NANOSECOND;

// ### MAGNETIC FIELD ###
pub const TESLA: Float = 1.;
pub const KILOGAUSS: Float = 0.1 * TESLA;

/// Speed of light
pub const C_LIGHT: Float = 299_792_458. * METER / SECOND;

/// Transverse momentum (GeV) carried by a unit charge on a 1 cm radius circle
/// in a 1 T field, i.e. `c · B · R` in internal units
pub const CURVATURE_CONSTANT: Float = C_LIGHT * NANOSECOND / METER * GEV / METER;
