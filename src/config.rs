use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::InputFormat;
use crate::data::model::{PowerUnit, Separator};
use crate::data::select::SpectrumSelector;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Everything one run needs besides the input files.
///
/// Every field has a default, so `{}` is a valid configuration that waits
/// for a quantity set to be chosen.
///
/// ```json
/// {
///   "power_unit": "mW",
///   "header": true,
///   "separator": "semicolon",
///   "quantity_set": "xyz-cct-duv",
///   "spectrum": "LED 2700K",
///   "cie_observer": "1931_2",
///   "relative_xyz": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub power_unit: PowerUnit,
    /// Input file has a header row with spectrum names.
    pub header: bool,
    pub separator: Separator,
    /// Registry key of the quantity set; `None` until one is chosen.
    pub quantity_set: Option<String>,
    pub spectrum: SpectrumSelector,
    pub cie_observer: String,
    /// Normalize XYZ so that Y = 100.
    pub relative_xyz: bool,
    pub annotation: Annotation,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            power_unit: PowerUnit::default(),
            header: false,
            separator: Separator::default(),
            quantity_set: None,
            spectrum: SpectrumSelector::default(),
            cie_observer: "1931_2".to_string(),
            relative_xyz: true,
            annotation: Annotation::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing run configuration")
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Layout options for the spectral input file.
    pub fn input_format(&self) -> InputFormat {
        InputFormat {
            unit: self.power_unit,
            header: self.header,
            separator: self.separator,
        }
    }
}

/// Free-text fields printed on the graphic report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    pub manufacturer: String,
    pub date: String,
    pub model: String,
    pub notes: String,
}
