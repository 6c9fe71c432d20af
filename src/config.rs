//! Mechanism for loading and sharing the analysis configuration

use crate::{
    analysis,
    femtodst::PidDetector,
    histogram::Binning,
    numeric::Float,
    particles::ParticleDefinition,
    units::KILOGAUSS,
    Result,
};

use eyre::{bail, ensure, eyre, WrapErr};
use indexmap::IndexMap;
use tracing::info;

use std::{fmt::Display, fs, path::PathBuf, str::FromStr};

/// Analysis configuration
pub struct Configuration {
    /// FemtoDst directory to be analyzed
    pub input: PathBuf,

    /// Directory where results are written
    pub output: PathBuf,

    /// Maximal number of events to be analyzed (0 means all of them)
    pub max_events: usize,

    /// Magnetic field along z (tesla)
    pub b_field: Float,

    /// Mass hypothesis of the decay daughters
    pub daughter: &'static ParticleDefinition,

    /// Detector whose PID traits identify the daughters
    pub pid_detector: PidDetector,

    /// Truth that the per-event and per-track QA histograms are filled
    pub qa: bool,

    /// Histogram binnings which replace the defaults
    pub binnings: IndexMap<String, Binning>,
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and print it out
    pub fn load(file_name: &str) -> Result<Self> {
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read configuration file {file_name}"))?;
        let config = Self::parse(&config_str)?;
        config.print();
        Ok(config)
    }

    /// Decode and check the contents of a configuration file
    ///
    /// Each non-blank line holds a key followed by its value(s), and anything
    /// after a `#` is a comment. All keys but `input` are optional.
    ///
    pub fn parse(config_str: &str) -> Result<Self> {
        let mut input = None;
        let mut config = Self {
            input: PathBuf::new(),
            output: PathBuf::from("k0s_output"),
            max_events: 0,
            b_field: -4.9845 * KILOGAUSS,
            daughter: particle("pi+")?,
            pid_detector: PidDetector::Mtd,
            qa: true,
            binnings: IndexMap::new(),
        };

        for (line_idx, line) in config_str.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();
            let mut words = line.split_whitespace();
            let Some(key) = words.next() else {
                continue;
            };
            let values = words.collect::<Vec<_>>();
            let single = |name: &'static str| {
                match values[..] {
                    [data] => Ok(ConfigItem::new(name, data)),
                    _ => bail!("Configuration of {name} should be a single value (line {})", line_idx + 1),
                }
            };
            match key {
                "input" => input = Some(PathBuf::from(single("input")?.data)),
                "output" => config.output = PathBuf::from(single("output")?.data),
                "max_events" => config.max_events = single("max_events")?.parse::<usize>()?,
                "b_field" => config.b_field = single("b_field")?.parse::<Float>()? * KILOGAUSS,
                "daughter" => config.daughter = particle(single("daughter")?.data)?,
                "pid_detector" => {
                    config.pid_detector = single("pid_detector")?.parse::<PidDetector>()?
                }
                "qa" => config.qa = single("qa")?.parse_bool()?,
                "hist" => {
                    let (name, binning) = parse_binning(&values)
                        .wrap_err_with(|| format!("Invalid histogram binning on line {}", line_idx + 1))?;
                    config.binnings.insert(name, binning);
                }
                other => bail!("Unknown configuration key {other} on line {}", line_idx + 1),
            }
        }

        config.input = input.ok_or_else(|| eyre!("Missing configuration of input"))?;
        ensure!(config.b_field.is_finite(), "The magnetic field must be finite");
        ensure!(
            config.daughter.mass > 0.,
            "Daughters must be massive particles, not {}",
            config.daughter.name
        );
        Ok(config)
    }

    /// Number of events to be analyzed, given how many are available
    pub fn num_events(&self, available: usize) -> usize {
        if self.max_events == 0 {
            available
        } else {
            self.max_events.min(available)
        }
    }

    /// Binning of a histogram, taking overrides into account
    pub fn binning(&self, name: &str) -> Option<Binning> {
        self.binnings
            .get(name)
            .cloned()
            .or_else(|| analysis::default_binning(name))
    }

    /// Display the configuration
    pub fn print(&self) {
        info!("INPUT          : {}", self.input.display());
        info!("OUTPUT         : {}", self.output.display());
        info!("MAX_EVENTS     : {}", self.max_events);
        info!("B_FIELD (kG)   : {}", self.b_field / KILOGAUSS);
        info!("DAUGHTER       : {}", self.daughter);
        info!("PID_DETECTOR   : {}", self.pid_detector);
        info!("QA             : {}", self.qa);
        for (name, binning) in &self.binnings {
            let x = &binning.x;
            match &binning.y {
                None => info!("HIST {name:<10}: {} [{}, {}[", x.num_bins(), x.low(), x.high()),
                Some(y) => info!(
                    "HIST {name:<10}: {} [{}, {}[ x {} [{}, {}[",
                    x.num_bins(),
                    x.low(),
                    x.high(),
                    y.num_bins(),
                    y.low(),
                    y.high()
                ),
            }
        }
    }
}

/// Look up a particle by name or PDG code
fn particle(key: &str) -> Result<&'static ParticleDefinition> {
    let found = match key.parse::<i32>() {
        Ok(pdg_encoding) => ParticleDefinition::by_pdg(pdg_encoding),
        Err(_) => ParticleDefinition::by_name(key),
    };
    found.ok_or_else(|| eyre!("Unknown particle {key}"))
}

/// Decode `<name> <nx> <xlo> <xhi> [<ny> <ylo> <yhi>]`
fn parse_binning(values: &[&str]) -> Result<(String, Binning)> {
    let (name, axes) = values
        .split_first()
        .ok_or_else(|| eyre!("Missing histogram name"))?;
    let default = analysis::default_binning(name)
        .ok_or_else(|| eyre!("The analysis does not fill a histogram named {name}"))?;
    ensure!(
        axes.len() == 3 * default.dimension(),
        "Histogram {name} is {}-dimensional, so it needs {} binning values",
        default.dimension(),
        3 * default.dimension()
    );
    let axis = |idx: usize| -> Result<(usize, Float, Float)> {
        let num_bins = ConfigItem::new("number of bins", axes[3 * idx]).parse::<usize>()?;
        let low = ConfigItem::new("lower bound", axes[3 * idx + 1]).parse::<Float>()?;
        let high = ConfigItem::new("upper bound", axes[3 * idx + 2]).parse::<Float>()?;
        ensure!(num_bins > 0, "Histograms need at least one bin per axis");
        ensure!(low < high, "Axis bounds {low} and {high} are not ordered");
        Ok((num_bins, low, high))
    };
    let binning = if default.dimension() == 1 {
        let (num_bins, low, high) = axis(0)?;
        Binning::one_d(num_bins, low, high)
    } else {
        Binning::two_d(axis(0)?, axis(1)?)
    };
    Ok((name.to_string(), binning))
}

/// A value from the configuration file, tagged with the name of the setting
/// which it is supposed to configure for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a setting name and raw file data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: Display,
    {
        self.data.parse::<T>().map_err(|e| {
            eyre!("{e}").wrap_err(format!(
                "Could not parse configuration of {} from \"{}\"",
                self.name, self.data
            ))
        })
    }

    /// Parse this data using special logic which also handles Fortran's bool
    /// syntax
    fn parse_bool(self) -> Result<bool> {
        match self.data.to_lowercase().as_str() {
            ".true." => Ok(true),
            ".false." => Ok(false),
            _ => self.parse::<bool>(),
        }
    }
}
