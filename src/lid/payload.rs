use std::path::Path;

use anyhow::Context;
use eulumdat::{Eulumdat, IesParser, Symmetry};

use crate::error::{LuxError, Result};

/// Photometric file flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidFormat {
    /// EULUMDAT (`.ldt`).
    Ldt,
    /// IESNA LM-63 (`.ies`).
    Ies,
}

impl LidFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ldt" => Some(LidFormat::Ldt),
            "ies" => Some(LidFormat::Ies),
            _ => None,
        }
    }

    /// IES files open with an `IESNA` or `IES:` version line; anything else
    /// is read as EULUMDAT.
    pub fn sniff(text: &str) -> Self {
        let first = text.trim_start().lines().next().unwrap_or_default();
        if first.starts_with("IESNA") || first.starts_with("IES:") {
            LidFormat::Ies
        } else {
            LidFormat::Ldt
        }
    }
}

/// A parsed luminous intensity distribution.
///
/// `data` holds the distribution as the photometric parser delivers it:
/// measured C-planes, gamma angles (0 = nadir) and intensities in cd/klm,
/// plus the symmetry flag that completes the remaining planes.
#[derive(Debug, Clone, PartialEq)]
pub struct LidPayload {
    pub name: String,
    pub format: LidFormat,
    pub data: Eulumdat,
}

impl LidPayload {
    /// Parse and validate.
    pub fn parse(text: &str, format: LidFormat) -> Result<Self> {
        let parsed = match format {
            LidFormat::Ldt => Eulumdat::parse(text),
            LidFormat::Ies => IesParser::parse(text),
        }
        .map_err(|e| LuxError::MalformedPhotometry(format!("{format:?}: {e:#}")))?;

        let name = match parsed.luminaire_name.trim() {
            "" => parsed.identification.trim().to_string(),
            name => name.to_string(),
        };
        Self::from_eulumdat(name, format, parsed)
    }

    /// Parse, guessing the flavour from the first line.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::parse(text, LidFormat::sniff(text))
    }

    pub fn from_eulumdat(
        name: impl Into<String>,
        format: LidFormat,
        data: Eulumdat,
    ) -> Result<Self> {
        let payload = LidPayload {
            name: name.into(),
            format,
            data,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Load an `.ldt` or `.ies` file. Other extensions are sniffed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading photometric file {}", path.display()))?;
        let format = LidFormat::from_path(path).unwrap_or_else(|| LidFormat::sniff(&text));
        let mut payload =
            Self::parse(&text, format).with_context(|| format!("loading {}", path.display()))?;

        if payload.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                payload.name = stem.to_string();
            }
        }
        for warning in payload.data.validate() {
            log::debug!("{}: [{}] {}", path.display(), warning.code, warning.message);
        }
        log::info!(
            "Loaded intensity distribution '{}' ({:?}, {}): {} C-planes x {} angles",
            payload.name,
            payload.format,
            payload.data.symmetry.description(),
            payload.data.c_angles.len(),
            payload.data.g_angles.len()
        );
        Ok(payload)
    }

    /// Shape and value checks the render relies on.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(LuxError::MalformedPhotometry(msg));
        let data = &self.data;

        if data.c_angles.is_empty() || data.g_angles.is_empty() {
            return bad("C and gamma angle lists must not be empty".into());
        }
        if data.g_angles.windows(2).any(|w| w[1] <= w[0]) {
            return bad("gamma angles must be strictly increasing".into());
        }
        if data.intensities.is_empty() || data.intensities.len() > data.c_angles.len() {
            return bad(format!(
                "{} intensity rows for {} C-planes",
                data.intensities.len(),
                data.c_angles.len()
            ));
        }
        for (i, row) in data.intensities.iter().enumerate() {
            if row.len() != data.g_angles.len() {
                return bad(format!(
                    "C-plane {} has {} values for {} gamma angles",
                    data.c_angles[i],
                    row.len(),
                    data.g_angles.len()
                ));
            }
            if let Some(v) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return bad(format!("C-plane {}: invalid intensity {v}", data.c_angles[i]));
            }
        }
        Ok(())
    }

    pub fn symmetry(&self) -> Symmetry {
        self.data.symmetry
    }

    /// Candela per stored unit: the file's cd/klm scaled by the lamp flux,
    /// or 1 when no flux is given.
    pub fn candela_factor(&self) -> f64 {
        let flux = self.data.total_luminous_flux();
        if flux > 0.0 { flux / 1000.0 } else { 1.0 }
    }

    pub fn max_intensity(&self) -> f64 {
        self.data.max_intensity() * self.candela_factor()
    }

    /// Intensity (cd) towards C-plane `c` at vertical angle `gamma`, both in
    /// degrees. Symmetry completion and bilinear interpolation are the
    /// parser's; gamma is clamped to 0-180.
    pub fn intensity_at(&self, c: f64, gamma: f64) -> f64 {
        self.data.sample(c, gamma) * self.candela_factor()
    }
}
