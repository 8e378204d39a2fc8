/// Colour-science computations behind one batch-capable interface.
///
/// The dispatch pipeline never computes a colour-science quantity itself: it
/// hands the selected [`SpectralTable`] to a [`ColorEngine`] once per call
/// and arranges whatever comes back. [`BuiltinEngine`] covers colorimetry;
/// fidelity indices, alpha-opic quantities and the graphic report need a
/// fuller backend implementing the same trait.
pub mod builtin;
pub mod chromaticity;

pub use builtin::BuiltinEngine;

use crate::config::Annotation;
use crate::data::model::SpectralTable;

/// CIE tristimulus values `[X, Y, Z]`.
pub type Xyz = [f64; 3];

// ---------------------------------------------------------------------------
// Call parameters
// ---------------------------------------------------------------------------

/// Colour fidelity method for [`ColorEngine::fidelity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FidelityMethod {
    /// CIE 13.3-1995, 8 general samples (Ra).
    CieRa,
    /// CIE 13.3-1995 with the 14 special samples (R1..R14).
    CieRa14,
    /// CIE 224:2017 (Rf, 99 samples).
    Cie224,
}

/// Alpha-opic quantity for [`ColorEngine::alpha_opic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlphaOpicQuantity {
    /// Alpha-opic irradiance (W/m²).
    Irradiance,
    /// Equivalent daylight (D65) illuminance (lux).
    Edi,
    /// Daylight efficacy ratio.
    Der,
    /// Efficacy of luminous radiation (W/lm).
    Elr,
}

impl AlphaOpicQuantity {
    pub fn label(self) -> &'static str {
        match self {
            AlphaOpicQuantity::Irradiance => "a-Ee",
            AlphaOpicQuantity::Edi => "a-EDI",
            AlphaOpicQuantity::Der => "a-DER",
            AlphaOpicQuantity::Elr => "a-ELR",
        }
    }
}

/// Fixed parameters of the alpha-opic computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaOpicParams {
    pub observer: &'static str,
    pub action_spectra: &'static str,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// ANSI/IES TM-30 results for a batch of spectra.
///
/// Vector quantities are laid out `[component][spectrum]`; the number of hue
/// bins and samples is whatever the engine produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tm30Output {
    pub cct: Vec<f64>,
    pub duv: Vec<f64>,
    /// Tristimulus values of the test source white point.
    pub white_xyz: Vec<Xyz>,
    pub rf: Vec<f64>,
    pub rg: Vec<f64>,
    /// Local chroma shift per hue bin.
    pub rcsh: Vec<Vec<f64>>,
    /// Local hue shift per hue bin.
    pub rhsh: Vec<Vec<f64>>,
    /// Local fidelity per hue bin.
    pub rfh: Vec<Vec<f64>>,
    /// Special fidelity per colour evaluation sample.
    pub rfi: Vec<Vec<f64>>,
}

/// General and special fidelity indices, `specific` laid out `[sample][spectrum]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FidelityOutput {
    pub general: Vec<f64>,
    pub specific: Vec<Vec<f64>>,
}

/// One alpha-opic quantity: `values[spectrum][channel]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlphaOpicOutput {
    /// Photoreceptor channel names, one per column.
    pub channels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Rendered TM-30 graphic report for one spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicReport {
    pub source: String,
    pub annotation: Annotation,
    /// PNG-encoded report image.
    pub png: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ColorEngine
// ---------------------------------------------------------------------------

/// Batch colour-science backend. Every method receives all selected spectra
/// at once and returns per-spectrum results in table order.
pub trait ColorEngine {
    fn spd_to_xyz(
        &self,
        spds: &SpectralTable,
        observer: &str,
        relative: bool,
    ) -> anyhow::Result<Vec<Xyz>>;

    /// `(CCT, Duv)` for each tristimulus triple.
    fn xyz_to_cct_duv(&self, xyz: &[Xyz], observer: &str) -> anyhow::Result<Vec<(f64, f64)>>;

    /// Luminous efficacy of radiation (lm/W).
    fn luminous_efficacy(&self, spds: &SpectralTable) -> anyhow::Result<Vec<f64>>;

    fn tm30(&self, spds: &SpectralTable) -> anyhow::Result<Tm30Output>;

    fn fidelity(
        &self,
        spds: &SpectralTable,
        method: FidelityMethod,
    ) -> anyhow::Result<FidelityOutput>;

    fn alpha_opic(
        &self,
        spds: &SpectralTable,
        quantity: AlphaOpicQuantity,
        params: &AlphaOpicParams,
    ) -> anyhow::Result<AlphaOpicOutput>;

    fn tm30_report(
        &self,
        spds: &SpectralTable,
        annotation: &Annotation,
    ) -> anyhow::Result<GraphicReport>;
}
