use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::reference;
use crate::error::{LuxError, Result};

// ---------------------------------------------------------------------------
// PowerUnit – unit of the non-wavelength columns in the input file
// ---------------------------------------------------------------------------

/// Spectral power unit of the input columns.
///
/// The factor converts into the canonical watt-based unit and is applied
/// exactly once, by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerUnit {
    /// W/nm (or W/nm·m², W/nm·m²·sr, ...)
    #[default]
    #[serde(rename = "W")]
    Watt,
    /// mW/nm (or mW/nm·m², ...)
    #[serde(rename = "mW")]
    Milliwatt,
}

impl PowerUnit {
    /// Multiplicative factor into watt-based units.
    pub fn factor(self) -> f64 {
        match self {
            PowerUnit::Watt => 1.0,
            PowerUnit::Milliwatt => 1e-3,
        }
    }
}

impl fmt::Display for PowerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerUnit::Watt => write!(f, "W/nm [,.m²,.m².sr, ...]"),
            PowerUnit::Milliwatt => write!(f, "mW/nm [,.m²,.m².sr, ...]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Separator – column delimiter of the input file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    #[default]
    Comma,
    Tab,
    Semicolon,
}

impl Separator {
    pub fn as_byte(self) -> u8 {
        match self {
            Separator::Comma => b',',
            Separator::Tab => b'\t',
            Separator::Semicolon => b';',
        }
    }
}

// ---------------------------------------------------------------------------
// SpectralTable – the canonical numeric matrix
// ---------------------------------------------------------------------------

/// One wavelength grid shared by N uniquely named spectra, in canonical units.
///
/// Seen as a matrix, row 0 is the wavelength (nm, strictly increasing) and
/// rows 1..=N hold the spectra in input column order. The table is built once
/// and never mutated; selections produce new tables.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralTable {
    wavelengths: Vec<f64>,
    names: Vec<String>,
    spectra: Vec<Vec<f64>>,
}

impl SpectralTable {
    /// Build a table, checking the grid and the name/shape invariants.
    pub fn new(wavelengths: Vec<f64>, names: Vec<String>, spectra: Vec<Vec<f64>>) -> Result<Self> {
        if wavelengths.is_empty() {
            return Err(LuxError::MalformedInput("empty wavelength grid".into()));
        }
        if let Some(wl) = wavelengths.iter().find(|w| !w.is_finite()) {
            return Err(LuxError::MalformedInput(format!("wavelength {wl} is not finite")));
        }
        if let Some(i) = wavelengths.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(LuxError::MalformedInput(format!(
                "wavelengths must be strictly increasing ({} nm followed by {} nm)",
                wavelengths[i],
                wavelengths[i + 1]
            )));
        }
        if names.len() != spectra.len() {
            return Err(LuxError::MalformedInput(format!(
                "{} names for {} spectra",
                names.len(),
                spectra.len()
            )));
        }
        if names.is_empty() {
            return Err(LuxError::MalformedInput("no spectrum columns".into()));
        }
        for (name, values) in names.iter().zip(&spectra) {
            if values.len() != wavelengths.len() {
                return Err(LuxError::MalformedInput(format!(
                    "spectrum '{name}' has {} values for {} wavelengths",
                    values.len(),
                    wavelengths.len()
                )));
            }
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(LuxError::MalformedInput(format!(
                    "spectrum '{name}' holds a non-finite value ({v})"
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(LuxError::DuplicateName(name.clone()));
            }
        }
        Ok(SpectralTable {
            wavelengths,
            names,
            spectra,
        })
    }

    /// The built-in CIE D65 table, used when no input file is supplied.
    pub fn reference_d65() -> Self {
        SpectralTable {
            wavelengths: reference::grid(),
            names: vec![reference::DEFAULT_SPECTRUM_NAME.to_string()],
            spectra: vec![reference::D65.to_vec()],
        }
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Spectrum names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn spectra(&self) -> &[Vec<f64>] {
        &self.spectra
    }

    /// Column position of a spectrum, by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Values of the named spectrum.
    pub fn spectrum(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.spectra[i].as_slice())
    }

    /// `(name, values)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(&self.spectra)
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the table holds no spectra.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// The table as a matrix: wavelength row followed by one row per spectrum.
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        std::iter::once(self.wavelengths.clone())
            .chain(self.spectra.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        vec![400.0, 500.0, 600.0]
    }

    #[test]
    fn rejects_non_increasing_grid() {
        let err = SpectralTable::new(
            vec![400.0, 400.0, 500.0],
            vec!["S1".into()],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap_err();
        assert!(matches!(err, LuxError::MalformedInput(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = SpectralTable::new(
            grid(),
            vec!["A".into(), "A".into()],
            vec![vec![1.0; 3], vec![2.0; 3]],
        )
        .unwrap_err();
        assert!(matches!(err, LuxError::DuplicateName(ref n) if n == "A"));
    }

    #[test]
    fn rejects_non_finite_values() {
        let err =
            SpectralTable::new(vec![f64::NAN], vec!["S1".into()], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, LuxError::MalformedInput(_)));

        let mut values = vec![1.0; grid().len()];
        values[3] = f64::INFINITY;
        let err = SpectralTable::new(grid(), vec!["S1".into()], vec![values]).unwrap_err();
        assert!(matches!(err, LuxError::MalformedInput(_)));
    }

    #[test]
    fn rejects_ragged_spectrum() {
        let err = SpectralTable::new(grid(), vec!["S1".into()], vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, LuxError::MalformedInput(_)));
    }

    #[test]
    fn matrix_puts_wavelengths_first() {
        let table = SpectralTable::new(
            grid(),
            vec!["S1".into(), "S2".into()],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        let m = table.matrix();
        assert_eq!(m.len(), 3);
        assert_eq!(m[0], grid());
        assert_eq!(m[2], vec![4.0, 5.0, 6.0]);
        assert_eq!(table.spectrum("S2"), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(table.position("S3"), None);
    }

    #[test]
    fn unit_factors() {
        assert_eq!(PowerUnit::Watt.factor(), 1.0);
        assert_eq!(PowerUnit::Milliwatt.factor(), 1e-3);
        assert_eq!(Separator::Semicolon.as_byte(), b';');
    }
}
