use anyhow::{Result, bail};

use super::chromaticity::uv_1960;
use super::{
    AlphaOpicOutput, AlphaOpicParams, AlphaOpicQuantity, ColorEngine, FidelityMethod,
    FidelityOutput, GraphicReport, Tm30Output, Xyz,
};
use crate::config::Annotation;
use crate::data::model::SpectralTable;
use crate::data::reference::{self, CIE_X, CIE_Y, CIE_Z, GRID_LEN, GRID_START, GRID_STEP};

/// Maximum luminous efficacy (lm/W) of the CIE 1931 photopic observer.
const KM: f64 = 683.0;

/// Planck's radiation constants (W·m², m·K).
const C1: f64 = 3.741771e-16;
const C2: f64 = 1.4388e-2;

/// Mired search range for the Planckian locus (1000 K .. 100 000 K).
const MIRED_MIN: f64 = 10.0;
const MIRED_MAX: f64 = 1000.0;
const MIRED_SCAN_STEPS: usize = 200;

/// Only observer with built-in colour matching functions.
pub const BUILTIN_OBSERVER: &str = "1931_2";

// ---------------------------------------------------------------------------
// Built-in engine
// ---------------------------------------------------------------------------

/// Colorimetry-only engine backed by the CIE 1931 2° tables in
/// [`crate::data::reference`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

impl ColorEngine for BuiltinEngine {
    fn spd_to_xyz(&self, spds: &SpectralTable, observer: &str, relative: bool) -> Result<Vec<Xyz>> {
        let cmf = ObserverGrid::resample(observer, spds.wavelengths())?;
        Ok(spds
            .spectra()
            .iter()
            .map(|s| {
                let [x, y, z] = cmf.integrate(s);
                let k = if relative { 100.0 / y } else { KM };
                [k * x, k * y, k * z]
            })
            .collect())
    }

    fn xyz_to_cct_duv(&self, xyz: &[Xyz], observer: &str) -> Result<Vec<(f64, f64)>> {
        check_observer(observer)?;
        Ok(xyz.iter().map(cct_duv).collect())
    }

    fn luminous_efficacy(&self, spds: &SpectralTable) -> Result<Vec<f64>> {
        let cmf = ObserverGrid::resample(BUILTIN_OBSERVER, spds.wavelengths())?;
        Ok(spds
            .spectra()
            .iter()
            .map(|s| {
                let power: f64 = s.iter().zip(&cmf.weights).map(|(v, w)| v * w).sum();
                KM * cmf.integrate(s)[1] / power
            })
            .collect())
    }

    fn tm30(&self, _spds: &SpectralTable) -> Result<Tm30Output> {
        unsupported("ANSI/IES TM-30 colour rendition")
    }

    fn fidelity(&self, _spds: &SpectralTable, method: FidelityMethod) -> Result<FidelityOutput> {
        unsupported(&format!("{method:?} colour fidelity"))
    }

    fn alpha_opic(
        &self,
        _spds: &SpectralTable,
        quantity: AlphaOpicQuantity,
        params: &AlphaOpicParams,
    ) -> Result<AlphaOpicOutput> {
        unsupported(&format!(
            "{} ({} action spectra)",
            quantity.label(),
            params.action_spectra
        ))
    }

    fn tm30_report(
        &self,
        _spds: &SpectralTable,
        _annotation: &Annotation,
    ) -> Result<GraphicReport> {
        unsupported("TM-30 graphic report")
    }
}

fn unsupported<T>(what: &str) -> Result<T> {
    bail!(
        "{what} needs an external colour-science backend; \
         the built-in engine covers colorimetry only"
    )
}

fn check_observer(observer: &str) -> Result<()> {
    if observer != BUILTIN_OBSERVER {
        bail!(
            "no colour matching functions for observer '{observer}' (built-in: {BUILTIN_OBSERVER})"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Colour matching functions on an arbitrary grid
// ---------------------------------------------------------------------------

/// CMFs interpolated onto the input grid, with per-bin wavelength widths.
struct ObserverGrid {
    xbar: Vec<f64>,
    ybar: Vec<f64>,
    zbar: Vec<f64>,
    weights: Vec<f64>,
}

impl ObserverGrid {
    fn resample(observer: &str, wavelengths: &[f64]) -> Result<Self> {
        check_observer(observer)?;
        Ok(ObserverGrid {
            xbar: wavelengths.iter().map(|&wl| interpolate(&CIE_X, wl)).collect(),
            ybar: wavelengths.iter().map(|&wl| interpolate(&CIE_Y, wl)).collect(),
            zbar: wavelengths.iter().map(|&wl| interpolate(&CIE_Z, wl)).collect(),
            weights: interval_weights(wavelengths),
        })
    }

    /// Unscaled `Σ S·cmf·Δλ` for the three functions.
    fn integrate(&self, spd: &[f64]) -> [f64; 3] {
        let mut acc = [0.0; 3];
        for (i, (&s, &w)) in spd.iter().zip(&self.weights).enumerate() {
            acc[0] += s * self.xbar[i] * w;
            acc[1] += s * self.ybar[i] * w;
            acc[2] += s * self.zbar[i] * w;
        }
        acc
    }
}

/// Linear interpolation of a reference-grid table; zero outside 380-780 nm.
fn interpolate(table: &[f64; GRID_LEN], wavelength: f64) -> f64 {
    let pos = (wavelength - GRID_START) / GRID_STEP;
    if !(0.0..=(GRID_LEN - 1) as f64).contains(&pos) {
        return 0.0;
    }
    let i = pos.floor() as usize;
    if i >= GRID_LEN - 1 {
        return table[GRID_LEN - 1];
    }
    let t = pos - i as f64;
    table[i] + t * (table[i + 1] - table[i])
}

/// Width of each wavelength bin: half the distance between neighbours,
/// the full neighbour distance at both ends.
fn interval_weights(wavelengths: &[f64]) -> Vec<f64> {
    let n = wavelengths.len();
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| match i {
            0 => wavelengths[1] - wavelengths[0],
            _ if i == n - 1 => wavelengths[n - 1] - wavelengths[n - 2],
            _ => (wavelengths[i + 1] - wavelengths[i - 1]) / 2.0,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CCT / Duv
// ---------------------------------------------------------------------------

/// CIE 1960 `(u, v)` of a blackbody at `cct` kelvin.
fn planckian_uv(cct: f64) -> [f64; 2] {
    let mut xyz = [0.0; 3];
    for (i, wl) in reference::grid().into_iter().enumerate() {
        let wl_m = wl * 1e-9;
        let radiance = C1 / (wl_m.powi(5) * ((C2 / (wl_m * cct)).exp() - 1.0));
        xyz[0] += radiance * CIE_X[i];
        xyz[1] += radiance * CIE_Y[i];
        xyz[2] += radiance * CIE_Z[i];
    }
    uv_1960(&xyz)
}

/// Nearest point on the Planckian locus in mired space: a coarse scan, then
/// golden-section refinement around the best scan point.
fn cct_duv(xyz: &Xyz) -> (f64, f64) {
    let [u, v] = uv_1960(xyz);
    if !u.is_finite() || !v.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let distance = |mired: f64| {
        let [ut, vt] = planckian_uv(1e6 / mired);
        ((u - ut).powi(2) + (v - vt).powi(2)).sqrt()
    };

    let step = (MIRED_MAX - MIRED_MIN) / MIRED_SCAN_STEPS as f64;
    let best = (0..=MIRED_SCAN_STEPS)
        .map(|i| MIRED_MIN + step * i as f64)
        .map(|m| (m, distance(m)))
        .fold((MIRED_MIN, f64::INFINITY), |acc, p| if p.1 < acc.1 { p } else { acc });

    let (mut a, mut b) = ((best.0 - step).max(MIRED_MIN), (best.0 + step).min(MIRED_MAX));
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    while b - a > 1e-6 {
        let c = b - ratio * (b - a);
        let d = a + ratio * (b - a);
        if distance(c) < distance(d) {
            b = d;
        } else {
            a = c;
        }
    }
    let mired = (a + b) / 2.0;
    let cct = 1e6 / mired;
    let [_, vt] = planckian_uv(cct);
    let duv = distance(mired).copysign(v - vt);
    (cct, duv)
}
