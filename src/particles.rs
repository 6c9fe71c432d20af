//! Flat table of particle definitions
//!
//! Only the numerical properties of the particles are needed by the analysis
//! (mass hypotheses for the decay daughters and the reconstructed parent), so
//! particles are plain table rows that can be looked up by name or PDG code.

use crate::{
    numeric::Float,
    units::{GEV, MEV, NANOSECOND, SECOND},
};

use std::fmt::{self, Display};

/// Broad particle family
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Family {
    /// Force carriers
    GaugeBoson,
    /// Electrons, muons and their antiparticles
    Lepton,
    /// Quark-antiquark states
    Meson,
    /// Three-quark states
    Baryon,
}

/// Properties of a particle species
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleDefinition {
    /// Name (Geant convention, e.g. "pi+", "kaon0S", "anti_lambda")
    pub name: &'static str,

    /// PDG Monte Carlo encoding
    pub pdg_encoding: i32,

    /// Rest mass
    pub mass: Float,

    /// Decay width
    pub width: Float,

    /// Electric charge in units of the positron charge
    pub charge: Float,

    /// Family which the particle belongs to
    pub family: Family,

    /// Mean lifetime (zero for stable particles)
    pub lifetime: Float,
}
//
impl ParticleDefinition {
    /// Look up a particle by name
    pub fn by_name(name: &str) -> Option<&'static Self> {
        PARTICLE_TABLE.iter().find(|p| p.name == name)
    }

    /// Look up a particle by PDG encoding
    pub fn by_pdg(pdg_encoding: i32) -> Option<&'static Self> {
        PARTICLE_TABLE.iter().find(|p| p.pdg_encoding == pdg_encoding)
    }
}

impl Display for ParticleDefinition {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "{} ({:?}, PDG {}): m = {} GeV, q = {}, Γ = {} GeV, τ = {} ns",
            self.name,
            self.family,
            self.pdg_encoding,
            self.mass / GEV,
            self.charge,
            self.width / GEV,
            self.lifetime / NANOSECOND,
        )
    }
}

/// Shorthand for building the table below
const fn def(
    name: &'static str,
    pdg_encoding: i32,
    mass: Float,
    width: Float,
    charge: Float,
    family: Family,
    lifetime: Float,
) -> ParticleDefinition {
    ParticleDefinition {
        name,
        pdg_encoding,
        mass,
        width,
        charge,
        family,
        lifetime,
    }
}

use Family::*;

/// All known particle species
#[rustfmt::skip]
pub static PARTICLE_TABLE: &[ParticleDefinition] = &[
    //   name            PDG      mass                width              charge  family       lifetime
    def("gamma",          22,     0.,                 0.,                0.,     GaugeBoson,  0.),
    def("e-",             11,     0.51099906 * MEV,   0.,               -1.,     Lepton,      0.),
    def("e+",            -11,     0.51099906 * MEV,   0.,                1.,     Lepton,      0.),
    def("mu-",            13,     105.658389 * MEV,   0.,               -1.,     Lepton,      2197.03 * NANOSECOND),
    def("mu+",           -13,     105.658389 * MEV,   0.,                1.,     Lepton,      2197.03 * NANOSECOND),
    def("pi+",           211,     0.1395700 * GEV,    0.,                1.,     Meson,       26.030 * NANOSECOND),
    def("pi-",          -211,     0.1395700 * GEV,    0.,               -1.,     Meson,       26.030 * NANOSECOND),
    def("pi0",           111,     0.1349764 * GEV,    7.8e-6 * MEV,      0.,     Meson,       8.4e-8 * NANOSECOND),
    def("eta",           221,     0.54730 * GEV,      1.20e-3 * MEV,     0.,     Meson,       0.),
    def("rho0",          113,     0.7685 * GEV,       150.7 * MEV,       0.,     Meson,       0.),
    def("omega",         223,     0.78194 * GEV,      8.43 * MEV,        0.,     Meson,       0.),
    def("phi",           333,     1.019413 * GEV,     4.43 * MEV,        0.,     Meson,       0.),
    def("kaon+",         321,     0.493677 * GEV,     0.,                1.,     Meson,       12.386 * NANOSECOND),
    def("kaon-",        -321,     0.493677 * GEV,     0.,               -1.,     Meson,       12.386 * NANOSECOND),
    def("kaon0",         311,     0.497672 * GEV,     0.,                0.,     Meson,       0.),
    def("anti_kaon0",   -311,     0.497672 * GEV,     0.,                0.,     Meson,       0.),
    def("kaon0S",        310,     0.497672 * GEV,     0.,                0.,     Meson,       0.08927 * NANOSECOND),
    def("kaon0L",        130,     0.497672 * GEV,     0.,                0.,     Meson,       51.7 * NANOSECOND),
    def("J/psi",         443,     3.09688 * GEV,      0.087 * MEV,       0.,     Meson,       0.),
    def("proton",       2212,     0.93827231 * GEV,   0.,                1.,     Baryon,      0.),
    def("anti_proton", -2212,     0.93827231 * GEV,   0.,               -1.,     Baryon,      0.),
    def("neutron",      2112,     0.93956563 * GEV,   0.,                0.,     Baryon,      887.0 * SECOND),
    def("lambda",       3122,     1.115684 * GEV,     0.,                0.,     Baryon,      0.2632 * NANOSECOND),
    def("anti_lambda", -3122,     1.115684 * GEV,     0.,                0.,     Baryon,      0.2632 * NANOSECOND),
    def("sigma+",       3222,     1.18937 * GEV,      0.,                1.,     Baryon,      0.0799 * NANOSECOND),
    def("sigma0",       3212,     1.192642 * GEV,     8.9e-3 * MEV,      0.,     Baryon,      7.4e-11 * NANOSECOND),
    def("sigma-",       3112,     1.197436 * GEV,     0.,               -1.,     Baryon,      0.1479 * NANOSECOND),
    def("xi0",          3322,     1.3149 * GEV,       0.,                0.,     Baryon,      0.290 * NANOSECOND),
    def("anti_xi0",    -3322,     1.3149 * GEV,       0.,                0.,     Baryon,      0.290 * NANOSECOND),
    def("xi-",          3312,     1.32132 * GEV,      0.,               -1.,     Baryon,      0.1639 * NANOSECOND),
    def("anti_xi-",    -3312,     1.32132 * GEV,      0.,                1.,     Baryon,      0.1639 * NANOSECOND),
    def("omega-",       3334,     1.67245 * GEV,      0.,               -1.,     Baryon,      0.0822 * NANOSECOND),
    def("anti_omega-", -3334,     1.67245 * GEV,      0.,                1.,     Baryon,      0.0822 * NANOSECOND),
];
