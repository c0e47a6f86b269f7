use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{Band, SetAttribute};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Immutable inventory configuration handed to every component.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    #[serde(default)]
    pub fields: FieldsConfig,
    #[serde(default = "default_systems")]
    pub bands: Vec<PhotometricSystem>,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            fields: FieldsConfig::default(),
            bands: default_systems(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Which target attributes get summarized, and which of those also get a range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldsConfig {
    #[serde(default = "default_sets")]
    pub sets: Vec<SetAttribute>,
    #[serde(default = "default_ranges")]
    pub ranges: Vec<SetAttribute>,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            sets: default_sets(),
            ranges: default_ranges(),
        }
    }
}

fn default_sets() -> Vec<SetAttribute> {
    vec![
        SetAttribute::CadenceLabel,
        SetAttribute::LambdaEff,
        SetAttribute::InstrumentLabel,
        SetAttribute::Priority,
        SetAttribute::Value,
        SetAttribute::CadenceId,
        SetAttribute::InstrumentId,
    ]
}

fn default_ranges() -> Vec<SetAttribute> {
    vec![SetAttribute::Priority, SetAttribute::Value, SetAttribute::LambdaEff]
}

// ---------------------------------------------------------------------------
// Photometric systems
// ---------------------------------------------------------------------------

/// A photometric system label and the magnitude bands measured in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhotometricSystem {
    pub system: String,
    pub bands: Vec<Band>,
}

fn default_systems() -> Vec<PhotometricSystem> {
    vec![
        PhotometricSystem {
            system: "SDSS".into(),
            bands: vec![Band::G, Band::R, Band::I, Band::Z],
        },
        PhotometricSystem {
            system: "TMASS".into(),
            bands: vec![Band::H, Band::J, Band::K],
        },
        PhotometricSystem {
            system: "GAIA".into(),
            bands: vec![Band::Bp, Band::Rp, Band::GaiaG],
        },
    ]
}

// ---------------------------------------------------------------------------
// Input + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            header_rows: default_header_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    '|'
}

fn default_header_rows() -> usize {
    1
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl InventoryConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: InventoryConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let mut seen = HashSet::new();
        for attr in &self.fields.sets {
            if !seen.insert(*attr) {
                return Err(ReconError::ConfigValidation(format!(
                    "set attribute '{attr}' listed twice"
                )));
            }
        }

        let mut seen_ranges = HashSet::new();
        for attr in &self.fields.ranges {
            if !self.fields.sets.contains(attr) {
                return Err(ReconError::ConfigValidation(format!(
                    "range attribute '{attr}' is not listed in fields.sets"
                )));
            }
            if !attr.is_numeric() {
                return Err(ReconError::ConfigValidation(format!(
                    "range attribute '{attr}' is not numeric"
                )));
            }
            if !seen_ranges.insert(*attr) {
                return Err(ReconError::ConfigValidation(format!(
                    "range attribute '{attr}' listed twice"
                )));
            }
        }

        let mut seen_bands = HashSet::new();
        for system in &self.bands {
            if system.system.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "photometric system label must not be empty".into(),
                ));
            }
            for band in &system.bands {
                if !seen_bands.insert(*band) {
                    return Err(ReconError::ConfigValidation(format!(
                        "band '{band}' assigned to more than one photometric system"
                    )));
                }
            }
        }

        for (what, delim) in [("input", self.input.delimiter), ("output", self.output.delimiter)] {
            if !delim.is_ascii() || delim.is_ascii_alphanumeric() {
                return Err(ReconError::ConfigValidation(format!(
                    "{what} delimiter must be an ASCII punctuation or whitespace character, got '{delim}'"
                )));
            }
        }

        Ok(())
    }

    /// Set attributes that are reported as a plain set (no range columns).
    pub fn plain_sets(&self) -> impl Iterator<Item = SetAttribute> + '_ {
        self.fields
            .sets
            .iter()
            .copied()
            .filter(|attr| !self.fields.ranges.contains(attr))
    }

    /// Flattened, parallel `(bands, systems)` lists: `bands[i]` belongs to `systems[i]`.
    pub fn band_systems(&self) -> (Vec<Band>, Vec<String>) {
        let mut bands = Vec::new();
        let mut systems = Vec::new();
        for system in &self.bands {
            for band in &system.bands {
                bands.push(*band);
                systems.push(system.system.clone());
            }
        }
        (bands, systems)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = InventoryConfig::from_toml("").unwrap();
        assert_eq!(config, InventoryConfig::default());
        assert_eq!(config.input.delimiter, '|');
        assert_eq!(config.input.header_rows, 1);
        assert_eq!(config.fields.sets.len(), 7);
    }

    #[test]
    fn plain_sets_exclude_ranges() {
        let config = InventoryConfig::default();
        let plain: Vec<_> = config.plain_sets().collect();
        assert_eq!(
            plain,
            vec![
                SetAttribute::CadenceLabel,
                SetAttribute::InstrumentLabel,
                SetAttribute::CadenceId,
                SetAttribute::InstrumentId,
            ]
        );
    }

    #[test]
    fn band_systems_are_parallel() {
        let (bands, systems) = InventoryConfig::default().band_systems();
        assert_eq!(bands.len(), 10);
        assert_eq!(bands.len(), systems.len());
        assert_eq!(bands[0], Band::G);
        assert_eq!(systems[0], "SDSS");
        assert_eq!(bands[5], Band::J);
        assert_eq!(systems[5], "TMASS");
        assert_eq!(bands[9], Band::GaiaG);
        assert_eq!(systems[9], "GAIA");
    }

    #[test]
    fn parse_custom_config() {
        let input = r#"
[fields]
sets = ["cadence_label", "priority"]
ranges = ["priority"]

[[bands]]
system = "GAIA"
bands = ["bp", "rp", "gaia_g"]

[input]
delimiter = ","
header_rows = 2

[output]
delimiter = ";"
"#;
        let config = InventoryConfig::from_toml(input).unwrap();
        assert_eq!(config.fields.sets, vec![SetAttribute::CadenceLabel, SetAttribute::Priority]);
        assert_eq!(config.bands.len(), 1);
        assert_eq!(config.bands[0].bands, vec![Band::Bp, Band::Rp, Band::GaiaG]);
        assert_eq!(config.input.delimiter, ',');
        assert_eq!(config.input.header_rows, 2);
        assert_eq!(config.output.delimiter, ';');
    }

    #[test]
    fn reject_range_outside_sets() {
        let input = r#"
[fields]
sets = ["cadence_label"]
ranges = ["priority"]
"#;
        let err = InventoryConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("not listed in fields.sets"));
    }

    #[test]
    fn reject_label_range() {
        let input = r#"
[fields]
sets = ["cadence_label"]
ranges = ["cadence_label"]
"#;
        let err = InventoryConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn reject_band_in_two_systems() {
        let input = r#"
[[bands]]
system = "SDSS"
bands = ["g"]

[[bands]]
system = "OTHER"
bands = ["g"]
"#;
        let err = InventoryConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("band 'g'"));
    }

    #[test]
    fn reject_unknown_attribute() {
        let input = r#"
[fields]
sets = ["teff"]
"#;
        let err = InventoryConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_alphanumeric_delimiter() {
        let input = r#"
[input]
delimiter = "x"
"#;
        let err = InventoryConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("input delimiter"));
    }
}
