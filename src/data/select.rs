use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::SpectralTable;
use crate::error::{LuxError, Result};
use crate::quantity::Applicability;

// ---------------------------------------------------------------------------
// Spectrum selection
// ---------------------------------------------------------------------------

/// Which spectra a run is computed over.
///
/// Serialized as `"all"` or `{"single": "<name>"}`. A bare name also reads
/// as `Single`; a spectrum literally named "all" needs the object form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "SelectorRepr")]
pub enum SpectrumSelector {
    Single(String),
    #[default]
    All,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Name(String),
    Single { single: String },
}

impl From<SelectorRepr> for SpectrumSelector {
    fn from(repr: SelectorRepr) -> Self {
        match repr {
            SelectorRepr::Name(name) if name == "all" => SpectrumSelector::All,
            SelectorRepr::Name(name) | SelectorRepr::Single { single: name } => {
                SpectrumSelector::Single(name)
            }
        }
    }
}

impl fmt::Display for SpectrumSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumSelector::Single(name) => write!(f, "{name}"),
            SpectrumSelector::All => write!(f, "all"),
        }
    }
}

/// Resolve a selection into a sub-table holding the chosen spectra.
///
/// Lookup is by name only, so the returned values always belong to the
/// returned names:
/// * `Single(name)` → a one-spectrum table, `InvalidSelection` if the name is unknown
/// * `All` → every spectrum in original column order, `InvalidSelection` for
///   single-only quantity sets
pub fn select(
    table: &SpectralTable,
    applicability: Applicability,
    selector: &SpectrumSelector,
) -> Result<SpectralTable> {
    let names: Vec<String> = match selector {
        SpectrumSelector::Single(name) => {
            if table.position(name).is_none() {
                return Err(LuxError::InvalidSelection(format!(
                    "no spectrum named '{name}' (available: {})",
                    table.names().join(", ")
                )));
            }
            vec![name.clone()]
        }
        SpectrumSelector::All => {
            if applicability == Applicability::SingleOnly {
                return Err(LuxError::InvalidSelection(
                    "this quantity set takes exactly one spectrum, not 'all'".into(),
                ));
            }
            table.names().to_vec()
        }
    };

    let spectra = names
        .iter()
        .map(|n| {
            table
                .spectrum(n)
                .map(<[f64]>::to_vec)
                .ok_or_else(|| LuxError::InvalidSelection(format!("no spectrum named '{n}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Selected {} of {} spectra ({selector})", names.len(), table.len());
    SpectralTable::new(table.wavelengths().to_vec(), names, spectra)
}
