use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Annotation;
use crate::data::model::SpectralTable;
use crate::engine::chromaticity;
use crate::engine::{
    AlphaOpicOutput, AlphaOpicQuantity, ColorEngine, FidelityMethod, FidelityOutput,
    GraphicReport, Tm30Output, Xyz,
};
use crate::error::{LuxError, Result};
use crate::quantity::{
    BlockSource, BlockSpec, EngineCall, FailurePolicy, Layout, QuantitySetDescriptor, XyzSource,
};

// ---------------------------------------------------------------------------
// ResultTable
// ---------------------------------------------------------------------------

/// One labeled row of a result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// Labeled output of one run: rows are spectra (or `"{quantity}: {spectrum}"`
/// pairs for alpha-opic), columns are the quantity set's labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub legend: Vec<String>,
}

impl ResultTable {
    pub fn empty(title: impl Into<String>) -> Self {
        ResultTable {
            title: title.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            legend: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn row(&self, label: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell lookup by row label and column label.
    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.row(row).and_then(|r| r.values.get(col).copied())
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Per-run parameters passed through to the engine.
#[derive(Debug, Clone, Copy)]
pub struct RunParams<'a> {
    pub observer: &'a str,
    pub relative_xyz: bool,
    pub annotation: &'a Annotation,
}

/// What a spectral quantity set produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Table(ResultTable),
    Report(GraphicReport),
    /// The engine failed under [`FailurePolicy::Notice`]; the table is empty.
    Notice { message: String, table: ResultTable },
}

/// Run a quantity set over the selected spectra.
///
/// Each registered engine call is made exactly once, over the whole
/// selection. Engine failures end the run, except for quantity sets with
/// [`FailurePolicy::Notice`], which complete with a notice instead.
pub fn assemble(
    engine: &dyn ColorEngine,
    descriptor: &QuantitySetDescriptor,
    spds: &SpectralTable,
    params: &RunParams<'_>,
) -> Result<Assembled> {
    let title = descriptor.title_for(params.observer);
    match build(engine, descriptor, spds, params, &title) {
        Err(LuxError::DomainComputation(cause))
            if descriptor.on_failure == FailurePolicy::Notice =>
        {
            log::warn!("{title}: engine failed, returning notice: {cause}");
            Ok(Assembled::Notice {
                message: format!("Not implemented: {cause}"),
                table: ResultTable::empty(title),
            })
        }
        other => other,
    }
}

fn build(
    engine: &dyn ColorEngine,
    descriptor: &QuantitySetDescriptor,
    spds: &SpectralTable,
    params: &RunParams<'_>,
    title: &str,
) -> Result<Assembled> {
    let outputs = Outputs::invoke(engine, descriptor.calls, spds, params)?;
    let legend = descriptor.legend.iter().map(|s| s.to_string()).collect();

    let assembled = match descriptor.layout {
        Layout::PerSpectrum(blocks) => {
            let (columns, rows) = per_spectrum(blocks, &outputs, spds)?;
            Assembled::Table(ResultTable {
                title: title.to_string(),
                columns,
                rows,
                legend,
            })
        }
        Layout::QuantityBySpectrum(quantities) => {
            let (columns, rows) = quantity_by_spectrum(quantities, &outputs, spds)?;
            Assembled::Table(ResultTable {
                title: title.to_string(),
                columns,
                rows,
                legend,
            })
        }
        Layout::Report => Assembled::Report(
            outputs
                .report
                .ok_or_else(|| missing_output("graphic report"))?,
        ),
        Layout::Photometric => {
            return Err(LuxError::DomainComputation(format!(
                "'{}' does not run on spectra",
                descriptor.key
            )))
        }
    };

    if let Assembled::Table(table) = &assembled {
        log::info!(
            "Assembled '{}': {} rows x {} columns",
            table.title,
            table.len(),
            table.columns.len()
        );
    }
    Ok(assembled)
}

/// Concatenate the blocks in registration order, then transpose so that
/// every spectrum becomes one row.
fn per_spectrum(
    blocks: &[BlockSpec],
    outputs: &Outputs,
    spds: &SpectralTable,
) -> Result<(Vec<String>, Vec<ResultRow>)> {
    let n = spds.len();
    let mut columns = Vec::new();
    let mut components: Vec<Vec<f64>> = Vec::new();

    for spec in blocks {
        let block = outputs.block(spec.source)?;
        if let Some(bad) = block.iter().find(|c| c.len() != n) {
            return Err(LuxError::DomainComputation(format!(
                "{:?}: {} values for {n} spectra",
                spec.source,
                bad.len()
            )));
        }
        columns.extend(spec.labels.generate(block.len())?);
        components.extend(block);
    }

    let rows = spds
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| ResultRow {
            label: name.clone(),
            values: components.iter().map(|c| c[i]).collect(),
        })
        .collect();
    Ok((columns, rows))
}

/// Alpha-opic pivot: photoreceptor channels as columns, one row per
/// `(quantity, spectrum)` pair labeled `"{quantity}: {spectrum}"`,
/// quantity-major.
fn quantity_by_spectrum(
    quantities: &[AlphaOpicQuantity],
    outputs: &Outputs,
    spds: &SpectralTable,
) -> Result<(Vec<String>, Vec<ResultRow>)> {
    let mut channels: Option<&[String]> = None;
    let mut rows = Vec::with_capacity(quantities.len() * spds.len());

    for &q in quantities {
        let out = outputs
            .alpha_opic
            .get(&q)
            .ok_or_else(|| missing_output(q.label()))?;

        let expected = *channels.get_or_insert(&out.channels);
        if expected != out.channels.as_slice() {
            return Err(LuxError::DomainComputation(format!(
                "{}: photoreceptor channels differ from the other quantities",
                q.label()
            )));
        }
        if out.values.len() != spds.len() {
            return Err(LuxError::DomainComputation(format!(
                "{}: {} rows for {} spectra",
                q.label(),
                out.values.len(),
                spds.len()
            )));
        }

        for (name, values) in spds.names().iter().zip(&out.values) {
            if values.len() != expected.len() {
                return Err(LuxError::DomainComputation(format!(
                    "{}: {} values for {} channels",
                    q.label(),
                    values.len(),
                    expected.len()
                )));
            }
            rows.push(ResultRow {
                label: format!("{}: {name}", q.label()),
                values: values.clone(),
            });
        }
    }

    Ok((channels.unwrap_or_default().to_vec(), rows))
}

fn missing_output(what: &str) -> LuxError {
    LuxError::DomainComputation(format!("no {what} output was computed"))
}

fn length_mismatch(what: &str, got: usize, n: usize) -> LuxError {
    LuxError::DomainComputation(format!("{what}: {got} results for {n} spectra"))
}

// ---------------------------------------------------------------------------
// Engine outputs of one run
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Outputs {
    xyz: Option<Vec<Xyz>>,
    cct_duv: Option<Vec<(f64, f64)>>,
    ler: Option<Vec<f64>>,
    tm30: Option<Tm30Output>,
    fidelity: BTreeMap<FidelityMethod, FidelityOutput>,
    alpha_opic: BTreeMap<AlphaOpicQuantity, AlphaOpicOutput>,
    report: Option<GraphicReport>,
}

impl Outputs {
    fn invoke(
        engine: &dyn ColorEngine,
        calls: &[EngineCall],
        spds: &SpectralTable,
        params: &RunParams<'_>,
    ) -> Result<Self> {
        let n = spds.len();
        let mut out = Outputs::default();

        for call in calls {
            log::debug!("Engine call {call:?} over {n} spectra");
            match *call {
                EngineCall::Xyz => {
                    let xyz = engine
                        .spd_to_xyz(spds, params.observer, params.relative_xyz)
                        .map_err(LuxError::computation)?;
                    if xyz.len() != n {
                        return Err(length_mismatch("XYZ", xyz.len(), n));
                    }
                    out.xyz = Some(xyz);
                }
                EngineCall::CctDuv => {
                    let xyz = out.xyz.as_deref().ok_or_else(|| missing_output("XYZ"))?;
                    let cd = engine
                        .xyz_to_cct_duv(xyz, params.observer)
                        .map_err(LuxError::computation)?;
                    if cd.len() != n {
                        return Err(length_mismatch("CCT/Duv", cd.len(), n));
                    }
                    out.cct_duv = Some(cd);
                }
                EngineCall::Ler => {
                    let ler = engine.luminous_efficacy(spds).map_err(LuxError::computation)?;
                    if ler.len() != n {
                        return Err(length_mismatch("LER", ler.len(), n));
                    }
                    out.ler = Some(ler);
                }
                EngineCall::Tm30 => {
                    let tm30 = engine.tm30(spds).map_err(LuxError::computation)?;
                    if tm30.white_xyz.len() != n {
                        return Err(length_mismatch("TM30 white point", tm30.white_xyz.len(), n));
                    }
                    out.tm30 = Some(tm30);
                }
                EngineCall::Fidelity(method) => {
                    let fid = engine.fidelity(spds, method).map_err(LuxError::computation)?;
                    out.fidelity.insert(method, fid);
                }
                EngineCall::AlphaOpic(quantity, ref aparams) => {
                    let ao = engine
                        .alpha_opic(spds, quantity, aparams)
                        .map_err(LuxError::computation)?;
                    out.alpha_opic.insert(quantity, ao);
                }
                EngineCall::Tm30Report => {
                    let report = engine
                        .tm30_report(spds, params.annotation)
                        .map_err(LuxError::computation)?;
                    out.report = Some(report);
                }
            }
        }
        Ok(out)
    }

    fn xyz_of(&self, source: XyzSource) -> Result<&[Xyz]> {
        match source {
            XyzSource::Tristimulus => self.xyz.as_deref().ok_or_else(|| missing_output("XYZ")),
            XyzSource::Tm30White => Ok(self.tm30()?.white_xyz.as_slice()),
        }
    }

    fn tm30(&self) -> Result<&Tm30Output> {
        self.tm30.as_ref().ok_or_else(|| missing_output("TM30"))
    }

    fn fidelity(&self, method: FidelityMethod) -> Result<&FidelityOutput> {
        self.fidelity
            .get(&method)
            .ok_or_else(|| missing_output(&format!("{method:?}")))
    }

    /// Values of one block, laid out `[component][spectrum]`.
    fn block(&self, source: BlockSource) -> Result<Vec<Vec<f64>>> {
        let split = |pairs: Vec<[f64; 2]>| -> Vec<Vec<f64>> {
            (0..2).map(|c| pairs.iter().map(|p| p[c]).collect()).collect()
        };

        Ok(match source {
            BlockSource::Xyz => {
                let xyz = self.xyz_of(XyzSource::Tristimulus)?;
                (0..3).map(|c| xyz.iter().map(|t| t[c]).collect()).collect()
            }
            BlockSource::Xy(src) => split(self.xyz_of(src)?.iter().map(chromaticity::xy).collect()),
            BlockSource::UvPrime(src) => {
                split(self.xyz_of(src)?.iter().map(chromaticity::uv_prime).collect())
            }
            BlockSource::CctDuv => {
                let cd = self.cct_duv.as_ref().ok_or_else(|| missing_output("CCT/Duv"))?;
                vec![
                    cd.iter().map(|p| p.0).collect(),
                    cd.iter().map(|p| p.1).collect(),
                ]
            }
            BlockSource::Ler => vec![self.ler.clone().ok_or_else(|| missing_output("LER"))?],
            BlockSource::Tm30Cct => vec![self.tm30()?.cct.clone()],
            BlockSource::Tm30Duv => vec![self.tm30()?.duv.clone()],
            BlockSource::Tm30Rf => vec![self.tm30()?.rf.clone()],
            BlockSource::Tm30Rg => vec![self.tm30()?.rg.clone()],
            BlockSource::Tm30Rcsh => self.tm30()?.rcsh.clone(),
            BlockSource::Tm30Rhsh => self.tm30()?.rhsh.clone(),
            BlockSource::Tm30Rfh => self.tm30()?.rfh.clone(),
            BlockSource::Tm30Rfi => self.tm30()?.rfi.clone(),
            BlockSource::General(m) => vec![self.fidelity(m)?.general.clone()],
            BlockSource::Specific(m) => self.fidelity(m)?.specific.clone(),
        })
    }
}
