use std::io::Read;

use serde::{Deserialize, Serialize};

use super::model::{PowerUnit, Separator, SpectralTable};
use crate::error::{LuxError, Result};

// ---------------------------------------------------------------------------
// Input format options
// ---------------------------------------------------------------------------

/// How the delimited spectral file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputFormat {
    pub unit: PowerUnit,
    /// First row holds column names.
    pub header: bool,
    pub separator: Separator,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Normalize raw delimited text, or fall back to the built-in D65 spectrum
/// when no input was supplied.
pub fn normalize(input: Option<&str>, format: &InputFormat) -> Result<SpectralTable> {
    match input {
        Some(text) => read_table(text.as_bytes(), format),
        None => Ok(default_table()),
    }
}

/// The default input: CIE D65 named "D65 (default)".
pub fn default_table() -> SpectralTable {
    log::info!("No spectral input supplied, using built-in D65");
    SpectralTable::reference_d65()
}

// ---------------------------------------------------------------------------
// Delimited reader
// ---------------------------------------------------------------------------

/// Column layout: wavelength first, one column per spectrum.
///
/// Without a header the spectra are named `S1..Sk` in column order; with a
/// header the header cells become the names verbatim. Numeric cells may carry
/// surrounding whitespace; `NaN` and infinities are rejected. Every
/// non-wavelength value is multiplied by the unit factor here and nowhere else.
pub fn read_table<R: Read>(reader: R, format: &InputFormat) -> Result<SpectralTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.separator.as_byte())
        .has_headers(format.header)
        .flexible(true)
        .from_reader(reader);

    let header_names: Option<Vec<String>> = if format.header {
        let headers = reader
            .headers()
            .map_err(|e| LuxError::MalformedInput(format!("reading header row: {e}")))?;
        Some(headers.iter().map(|h| h.to_string()).collect())
    } else {
        None
    };

    let factor = format.unit.factor();
    let mut width = header_names.as_ref().map(|h| h.len());
    let mut wavelengths = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LuxError::MalformedInput(format!("row {row_no}: {e}")))?;

        let expected = *width.get_or_insert(record.len());
        if expected < 2 {
            return Err(LuxError::MalformedInput(format!(
                "need a wavelength column and at least one spectrum, found {expected} column(s)"
            )));
        }
        if record.len() != expected {
            return Err(LuxError::MalformedInput(format!(
                "row {row_no}: {} values, expected {expected}",
                record.len()
            )));
        }
        if columns.is_empty() {
            columns = vec![Vec::new(); expected - 1];
        }

        let wl_tok = record.get(0).unwrap_or("");
        let wl = number(wl_tok).ok_or_else(|| {
            LuxError::MalformedInput(format!("row {row_no}: wavelength '{wl_tok}' is not a number"))
        })?;
        wavelengths.push(wl);

        for (col, tok) in record.iter().skip(1).enumerate() {
            let value = number(tok).ok_or_else(|| {
                LuxError::MalformedInput(format!(
                    "row {row_no}, column {}: '{tok}' is not a number",
                    col + 1
                ))
            })?;
            columns[col].push(value * factor);
        }
    }

    if wavelengths.is_empty() {
        return Err(LuxError::MalformedInput("no data rows".into()));
    }

    let names = match header_names {
        Some(h) => h.into_iter().skip(1).collect(),
        None => (1..=columns.len()).map(|i| format!("S{i}")).collect(),
    };

    let table = SpectralTable::new(wavelengths, names, columns)?;
    log::debug!(
        "Normalized {} spectra on {} wavelengths ({}, factor {factor})",
        table.len(),
        table.wavelengths().len(),
        format.unit
    );
    Ok(table)
}

fn number(tok: &str) -> Option<f64> {
    tok.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
