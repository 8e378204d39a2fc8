//! Quantity-set registry.
//!
//! A closed set of [`QuantitySetId`]s, each bound to a static
//! [`QuantitySetDescriptor`]: the engine calls to make (with their fixed
//! parameters), how the outputs are laid out as columns, whether the set
//! accepts more than one spectrum, and what to do when the engine fails.

pub mod labels;

pub use labels::{BlockShape, Labels};

use crate::engine::{AlphaOpicParams, AlphaOpicQuantity, FidelityMethod};
use crate::error::{LuxError, Result};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuantitySetId {
    Tm30Quantities,
    Tm30Report,
    CieRa,
    Cie224,
    AlphaOpic,
    XyzCctDuv,
    LuminousIntensity,
}

impl QuantitySetId {
    pub const ALL: [QuantitySetId; 7] = [
        QuantitySetId::Tm30Quantities,
        QuantitySetId::Tm30Report,
        QuantitySetId::CieRa,
        QuantitySetId::Cie224,
        QuantitySetId::AlphaOpic,
        QuantitySetId::XyzCctDuv,
        QuantitySetId::LuminousIntensity,
    ];

    pub fn descriptor(self) -> &'static QuantitySetDescriptor {
        match self {
            QuantitySetId::Tm30Quantities => &TM30_QUANTITIES,
            QuantitySetId::Tm30Report => &TM30_REPORT,
            QuantitySetId::CieRa => &CIE_RA,
            QuantitySetId::Cie224 => &CIE_224,
            QuantitySetId::AlphaOpic => &ALPHA_OPIC,
            QuantitySetId::XyzCctDuv => &XYZ_CCT_DUV,
            QuantitySetId::LuminousIntensity => &LUMINOUS_INTENSITY,
        }
    }

    /// Configuration key, e.g. `"tm30-quantities"`.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }
}

/// Find a quantity set by its configuration key.
pub fn lookup(key: &str) -> Result<&'static QuantitySetDescriptor> {
    QuantitySetId::ALL
        .iter()
        .map(|id| id.descriptor())
        .find(|d| d.key == key)
        .ok_or_else(|| LuxError::UnknownQuantitySet(key.to_string()))
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Whether a quantity set accepts the "all spectra" selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    SingleOnly,
    Batch,
}

/// What a failing engine call does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The run fails with `DomainComputation`.
    Propagate,
    /// The run completes with a notice and an empty table.
    Notice,
}

/// One batch call into the colour engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// Tristimulus values with the run's observer and normalization.
    Xyz,
    /// CCT and Duv of the [`EngineCall::Xyz`] result.
    CctDuv,
    Ler,
    Tm30,
    Fidelity(FidelityMethod),
    AlphaOpic(AlphaOpicQuantity, AlphaOpicParams),
    Tm30Report,
}

/// Tristimulus values a chromaticity block is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XyzSource {
    /// Output of [`EngineCall::Xyz`].
    Tristimulus,
    /// White point of the TM-30 test source.
    Tm30White,
}

/// Where a block of columns comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    Xyz,
    Xy(XyzSource),
    UvPrime(XyzSource),
    CctDuv,
    Tm30Cct,
    Tm30Duv,
    Ler,
    Tm30Rf,
    Tm30Rg,
    Tm30Rcsh,
    Tm30Rhsh,
    Tm30Rfh,
    Tm30Rfi,
    General(FidelityMethod),
    Specific(FidelityMethod),
}

/// A contiguous run of columns in the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub source: BlockSource,
    pub labels: Labels,
}

/// How engine outputs become a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One row per spectrum, blocks concatenated as columns in order.
    PerSpectrum(&'static [BlockSpec]),
    /// One row per (quantity, spectrum) pair, one column per photoreceptor.
    QuantityBySpectrum(&'static [AlphaOpicQuantity]),
    /// A rendered report instead of a table.
    Report,
    /// Luminous intensity distribution, not driven by spectra.
    Photometric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantitySetDescriptor {
    pub id: QuantitySetId,
    pub key: &'static str,
    /// Display title; `{observer}` is replaced by the run's observer.
    pub title: &'static str,
    pub calls: &'static [EngineCall],
    pub layout: Layout,
    pub applicability: Applicability,
    pub on_failure: FailurePolicy,
    /// Column explanations shown under the table.
    pub legend: &'static [&'static str],
}

impl QuantitySetDescriptor {
    pub fn title_for(&self, observer: &str) -> String {
        self.title.replace("{observer}", observer)
    }

    /// Whether the set runs on spectral input at all.
    pub fn is_spectral(&self) -> bool {
        self.layout != Layout::Photometric
    }
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

const fn block(source: BlockSource, labels: Labels) -> BlockSpec {
    BlockSpec { source, labels }
}

/// Columns shared by the TM-30 based tables.
const CCT: BlockSpec = block(BlockSource::Tm30Cct, Labels::Fixed(&["CCT"]));
const DUV: BlockSpec = block(BlockSource::Tm30Duv, Labels::Fixed(&["Duv"]));
const XY_WHITE: BlockSpec = block(
    BlockSource::Xy(XyzSource::Tm30White),
    Labels::Fixed(&["x", "y"]),
);
const UV_WHITE: BlockSpec = block(
    BlockSource::UvPrime(XyzSource::Tm30White),
    Labels::Fixed(&["u'", "v'"]),
);
const LER: BlockSpec = block(BlockSource::Ler, Labels::Fixed(&["LER"]));

const COMMON_LEGEND: [&str; 5] = [
    "CCT: Correlated Color Temperature (K)",
    "Duv: distance from Planckian locus",
    "xy: CIE 1931 2° xy chromaticity coordinates of illuminant white point",
    "u'v': CIE 1976 2° u'v' chromaticity coordinates",
    "LER: Luminous Efficacy of Radiation (lm/W)",
];

pub const ALPHA_OPIC_PARAMS: AlphaOpicParams = AlphaOpicParams {
    observer: "1931_2",
    action_spectra: "CIE-S026",
};

static TM30_QUANTITIES: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::Tm30Quantities,
    key: "tm30-quantities",
    title: "ANSI/IES TM30 Quantities (CCT, Duv, Rf, Rg, ...)",
    calls: &[EngineCall::Tm30, EngineCall::Ler],
    layout: Layout::PerSpectrum(&[
        CCT,
        DUV,
        XY_WHITE,
        UV_WHITE,
        LER,
        block(BlockSource::Tm30Rf, Labels::Fixed(&["Rf"])),
        block(BlockSource::Tm30Rg, Labels::Fixed(&["Rg"])),
        block(BlockSource::Tm30Rcsh, Labels::Indexed("Rcsh")),
        block(BlockSource::Tm30Rhsh, Labels::Indexed("Rhsh")),
        block(BlockSource::Tm30Rfh, Labels::Indexed("Rfh")),
        block(BlockSource::Tm30Rfi, Labels::Indexed("Rfi")),
    ]),
    applicability: Applicability::Batch,
    on_failure: FailurePolicy::Propagate,
    legend: &[
        COMMON_LEGEND[0],
        COMMON_LEGEND[1],
        COMMON_LEGEND[2],
        COMMON_LEGEND[3],
        COMMON_LEGEND[4],
        "Rf: general color fidelity index",
        "Rg: gamut area index",
        "Rcshj: local chroma shift for hue bin j",
        "Rhshj: local hue shift for hue bin j",
        "Rfhj: local color fidelity index for hue bin j",
        "Rfi: specific color fidelity index for sample i",
    ],
};

static TM30_REPORT: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::Tm30Report,
    key: "tm30-report",
    title: "ANSI/IES TM30 graphic report",
    calls: &[EngineCall::Tm30Report],
    layout: Layout::Report,
    applicability: Applicability::SingleOnly,
    on_failure: FailurePolicy::Propagate,
    legend: &[],
};

static CIE_RA: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::CieRa,
    key: "cie-ra",
    title: "CIE 13.3-1995 Ra, Ri quantities",
    calls: &[
        EngineCall::Tm30,
        EngineCall::Ler,
        EngineCall::Fidelity(FidelityMethod::CieRa),
        EngineCall::Fidelity(FidelityMethod::CieRa14),
    ],
    layout: Layout::PerSpectrum(&[
        CCT,
        DUV,
        XY_WHITE,
        UV_WHITE,
        LER,
        block(BlockSource::General(FidelityMethod::CieRa), Labels::Fixed(&["Ra"])),
        block(BlockSource::Specific(FidelityMethod::CieRa14), Labels::Indexed("R")),
    ]),
    applicability: Applicability::Batch,
    on_failure: FailurePolicy::Propagate,
    legend: &[
        COMMON_LEGEND[0],
        COMMON_LEGEND[1],
        COMMON_LEGEND[2],
        COMMON_LEGEND[3],
        COMMON_LEGEND[4],
        "Ra: general color rendering index",
        "Ri: specific color rendering index for sample i",
    ],
};

static CIE_224: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::Cie224,
    key: "cie-224",
    title: "CIE 224:2017 Rf, Rfi quantities",
    calls: &[
        EngineCall::Tm30,
        EngineCall::Ler,
        EngineCall::Fidelity(FidelityMethod::Cie224),
    ],
    layout: Layout::PerSpectrum(&[
        CCT,
        DUV,
        XY_WHITE,
        UV_WHITE,
        LER,
        block(BlockSource::General(FidelityMethod::Cie224), Labels::Fixed(&["Rf"])),
        block(BlockSource::Specific(FidelityMethod::Cie224), Labels::Indexed("Rfi")),
    ]),
    applicability: Applicability::Batch,
    on_failure: FailurePolicy::Propagate,
    legend: &[
        COMMON_LEGEND[0],
        COMMON_LEGEND[1],
        COMMON_LEGEND[2],
        COMMON_LEGEND[3],
        COMMON_LEGEND[4],
        "Rf: general color fidelity index",
        "Rfi: specific color fidelity index for sample i",
    ],
};

static ALPHA_OPIC: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::AlphaOpic,
    key: "alpha-opic",
    title: "alpha-opic quantities (CIE S026)",
    calls: &[
        EngineCall::AlphaOpic(AlphaOpicQuantity::Irradiance, ALPHA_OPIC_PARAMS),
        EngineCall::AlphaOpic(AlphaOpicQuantity::Edi, ALPHA_OPIC_PARAMS),
        EngineCall::AlphaOpic(AlphaOpicQuantity::Der, ALPHA_OPIC_PARAMS),
        EngineCall::AlphaOpic(AlphaOpicQuantity::Elr, ALPHA_OPIC_PARAMS),
    ],
    layout: Layout::QuantityBySpectrum(&[
        AlphaOpicQuantity::Irradiance,
        AlphaOpicQuantity::Edi,
        AlphaOpicQuantity::Der,
        AlphaOpicQuantity::Elr,
    ]),
    applicability: Applicability::Batch,
    on_failure: FailurePolicy::Notice,
    legend: &[
        "Ee: irradiance (W/m²)",
        "EDI: Equivalent Daylight Illuminance (lux)",
        "DER: Daylight Efficacy Ratio",
        "ELR: Efficacy of Luminous Radiation (W/lm)",
    ],
};

static XYZ_CCT_DUV: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::XyzCctDuv,
    key: "xyz-cct-duv",
    title: "(X,Y,Z), (x,y), (u',v'), (CCT,Duv) for CIE observer {observer}",
    calls: &[EngineCall::Xyz, EngineCall::CctDuv],
    layout: Layout::PerSpectrum(&[
        block(BlockSource::Xyz, Labels::Fixed(&["X", "Y", "Z"])),
        block(BlockSource::Xy(XyzSource::Tristimulus), Labels::Fixed(&["x", "y"])),
        block(BlockSource::UvPrime(XyzSource::Tristimulus), Labels::Fixed(&["u'", "v'"])),
        block(BlockSource::CctDuv, Labels::Fixed(&["CCT", "Duv"])),
    ]),
    applicability: Applicability::Batch,
    on_failure: FailurePolicy::Propagate,
    legend: &[
        "XYZ: CIE X,Y,Z tristimulus values",
        "xy: CIE xy chromaticity coordinates",
        "u'v': CIE 1976 u'v' chromaticity coordinates",
        "CCT: Correlated Color Temperature (K)",
        "Duv: distance from Planckian locus",
    ],
};

// Selection rules do not apply: this path has no spectra.
static LUMINOUS_INTENSITY: QuantitySetDescriptor = QuantitySetDescriptor {
    id: QuantitySetId::LuminousIntensity,
    key: "lid",
    title: "Luminous Intensity Distribution (polar plot and render)",
    calls: &[],
    layout: Layout::Photometric,
    applicability: Applicability::SingleOnly,
    on_failure: FailurePolicy::Propagate,
    legend: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fidelity_legends_name_the_rfi_columns() {
        for id in [QuantitySetId::Tm30Quantities, QuantitySetId::Cie224] {
            let legend = id.descriptor().legend;
            assert!(legend.contains(&"Rfi: specific color fidelity index for sample i"), "{id:?}");
            assert!(!legend.iter().any(|l| l.starts_with("Rfii")), "{id:?}");
        }
    }

    #[test]
    fn every_id_round_trips_through_its_key() {
        for id in QuantitySetId::ALL {
            let d = lookup(id.key()).unwrap();
            assert_eq!(d.id, id);
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = QuantitySetId::ALL.iter().map(|id| id.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), QuantitySetId::ALL.len());
    }

    #[test]
    fn unknown_key_fails() {
        let err = lookup("cri-2049").unwrap_err();
        assert!(matches!(err, LuxError::UnknownQuantitySet(ref k) if k == "cri-2049"));
    }

    #[test]
    fn report_is_single_only() {
        assert_eq!(
            QuantitySetId::Tm30Report.descriptor().applicability,
            Applicability::SingleOnly
        );
        assert_eq!(
            QuantitySetId::Tm30Quantities.descriptor().applicability,
            Applicability::Batch
        );
    }

    #[test]
    fn scalar_heavy_prefix_of_tm30() {
        let Layout::PerSpectrum(blocks) = QuantitySetId::Tm30Quantities.descriptor().layout else {
            panic!("TM30 quantities must be a per-spectrum table");
        };
        let fixed: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b.labels {
                Labels::Fixed(l) => Some(l),
                Labels::Indexed(_) => None,
            })
            .flatten()
            .copied()
            .collect();
        assert_eq!(fixed, ["CCT", "Duv", "x", "y", "u'", "v'", "LER", "Rf", "Rg"]);
        let variable = blocks
            .iter()
            .filter(|b| b.labels.shape() == BlockShape::Variable)
            .count();
        assert_eq!(variable, 4);
    }

    #[test]
    fn only_alpha_opic_degrades_to_notice() {
        for id in QuantitySetId::ALL {
            let expected = if id == QuantitySetId::AlphaOpic {
                FailurePolicy::Notice
            } else {
                FailurePolicy::Propagate
            };
            assert_eq!(id.descriptor().on_failure, expected);
        }
    }

    #[test]
    fn observer_in_title() {
        let d = QuantitySetId::XyzCctDuv.descriptor();
        assert!(d.title_for("1964_10").ends_with("CIE observer 1964_10"));
        assert!(!QuantitySetId::LuminousIntensity.descriptor().is_spectral());
    }
}
