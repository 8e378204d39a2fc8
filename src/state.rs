use crate::assemble::{self, Assembled, ResultTable, RunParams};
use crate::config::RunConfig;
use crate::data::loader;
use crate::data::model::SpectralTable;
use crate::data::select::select;
use crate::engine::{ColorEngine, GraphicReport};
use crate::error::Result;
use crate::lid::{self, LidPayload, LidRender, Scene};
use crate::quantity::{self, QuantitySetId};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Where a run stands after [`dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing to compute yet: no quantity set chosen, or the photometric
    /// path has no payload.
    AwaitingInput,
    /// Inputs resolved; waiting for the trigger.
    Ready,
    Completed,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Table(ResultTable),
    Report(GraphicReport),
    /// The quantity set could not be computed; `table` is empty.
    Notice { message: String, table: ResultTable },
    Photometry(LidRender),
}

impl From<Assembled> for RunOutcome {
    fn from(a: Assembled) -> Self {
        match a {
            Assembled::Table(t) => RunOutcome::Table(t),
            Assembled::Report(r) => RunOutcome::Report(r),
            Assembled::Notice { message, table } => RunOutcome::Notice { message, table },
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One invocation: configuration plus whatever input has been supplied.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub config: RunConfig,
    /// Raw delimited spectral text; `None` uses the D65 reference.
    pub spectra: Option<String>,
    pub photometry: Option<LidPayload>,
    pub scene: Scene,
    /// Compute now; otherwise stop at [`RunState::Ready`].
    pub triggered: bool,
}

impl RunRequest {
    pub fn new(config: RunConfig) -> Self {
        RunRequest {
            config,
            ..Default::default()
        }
    }

    pub fn with_spectra(mut self, text: impl Into<String>) -> Self {
        self.spectra = Some(text.into());
        self
    }

    pub fn with_photometry(mut self, payload: LidPayload) -> Self {
        self.photometry = Some(payload);
        self
    }

    pub fn trigger(mut self) -> Self {
        self.triggered = true;
        self
    }
}

/// What [`dispatch`] hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub state: RunState,
    /// Hint shown while awaiting input.
    pub message: Option<String>,
    /// Normalized spectral input, for preview.
    pub input: Option<SpectralTable>,
    pub outcome: Option<RunOutcome>,
}

impl Dispatch {
    fn awaiting(message: String) -> Self {
        Dispatch {
            state: RunState::AwaitingInput,
            message: Some(message),
            input: None,
            outcome: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Drive one run: Normalizer → Batch Selector → Registry → Assembler, or the
/// photometric path for the luminous intensity set.
///
/// Ingestion, selection and lookup errors end the run with no partial result.
pub fn dispatch(request: &RunRequest, engine: &dyn ColorEngine) -> Result<Dispatch> {
    let config = &request.config;

    let Some(key) = config.quantity_set.as_deref() else {
        let keys: Vec<&str> = QuantitySetId::ALL.iter().map(|id| id.key()).collect();
        return Ok(Dispatch::awaiting(format!(
            "Choose a quantity set: {}",
            keys.join(", ")
        )));
    };
    let descriptor = quantity::lookup(key)?;

    if !descriptor.is_spectral() {
        let Some(payload) = request.photometry.as_ref() else {
            return Ok(Dispatch::awaiting(
                "Load a luminous intensity distribution file first".to_string(),
            ));
        };
        payload.validate()?;
        if !request.triggered {
            return Ok(ready(None));
        }
        let render = lid::run(payload, &request.scene)?;
        return Ok(completed(None, RunOutcome::Photometry(render)));
    }

    let table = loader::normalize(request.spectra.as_deref(), &config.input_format())?;
    let selected = select(&table, descriptor.applicability, &config.spectrum)?;
    log::info!(
        "'{}' over {} spectra ({})",
        descriptor.key,
        selected.len(),
        config.spectrum
    );

    if !request.triggered {
        return Ok(ready(Some(table)));
    }

    let params = RunParams {
        observer: &config.cie_observer,
        relative_xyz: config.relative_xyz,
        annotation: &config.annotation,
    };
    let assembled = assemble::assemble(engine, descriptor, &selected, &params)?;
    Ok(completed(Some(table), assembled.into()))
}

fn ready(input: Option<SpectralTable>) -> Dispatch {
    Dispatch {
        state: RunState::Ready,
        message: None,
        input,
        outcome: None,
    }
}

fn completed(input: Option<SpectralTable>, outcome: RunOutcome) -> Dispatch {
    Dispatch {
        state: RunState::Completed,
        message: None,
        input,
        outcome: Some(outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::select::SpectrumSelector;
    use crate::engine::BuiltinEngine;
    use crate::error::LuxError;
    use crate::lid::payload::tests::DOWNLIGHT_LDT;

    fn config(key: Option<&str>) -> RunConfig {
        RunConfig {
            quantity_set: key.map(str::to_string),
            ..RunConfig::default()
        }
    }

    #[test]
    fn no_quantity_set_awaits_input() {
        let d = dispatch(&RunRequest::new(config(None)), &BuiltinEngine).unwrap();
        assert_eq!(d.state, RunState::AwaitingInput);
        assert!(d.message.unwrap().contains("xyz-cct-duv"));
        assert!(d.outcome.is_none());
    }

    #[test]
    fn untriggered_run_is_ready_with_preview() {
        let d = dispatch(&RunRequest::new(config(Some("xyz-cct-duv"))), &BuiltinEngine).unwrap();
        assert_eq!(d.state, RunState::Ready);
        assert_eq!(d.input.unwrap().names(), ["D65 (default)"]);
        assert!(d.outcome.is_none());
    }

    #[test]
    fn triggered_run_completes() {
        let req = RunRequest::new(config(Some("xyz-cct-duv"))).trigger();
        let d = dispatch(&req, &BuiltinEngine).unwrap();
        assert_eq!(d.state, RunState::Completed);
        match d.outcome {
            Some(RunOutcome::Table(t)) => {
                assert_eq!(t.row_labels(), ["D65 (default)"]);
                assert!((t.value("D65 (default)", "Y").unwrap() - 100.0).abs() < 1e-9);
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn alpha_opic_with_builtin_engine_is_a_notice() {
        let req = RunRequest::new(config(Some("alpha-opic"))).trigger();
        match dispatch(&req, &BuiltinEngine).unwrap().outcome {
            Some(RunOutcome::Notice { table, .. }) => assert!(table.is_empty()),
            other => panic!("expected a notice, got {other:?}"),
        }
    }

    #[test]
    fn errors_end_the_run() {
        let req = RunRequest::new(config(Some("cri-2049"))).trigger();
        assert!(matches!(
            dispatch(&req, &BuiltinEngine),
            Err(LuxError::UnknownQuantitySet(_))
        ));

        // The report needs exactly one spectrum.
        let req = RunRequest::new(config(Some("tm30-report"))).trigger();
        assert!(matches!(
            dispatch(&req, &BuiltinEngine),
            Err(LuxError::InvalidSelection(_))
        ));

        let mut cfg = config(Some("tm30-quantities"));
        cfg.spectrum = SpectrumSelector::Single("D65 (default)".into());
        let req = RunRequest::new(cfg).trigger();
        assert!(matches!(
            dispatch(&req, &BuiltinEngine),
            Err(LuxError::DomainComputation(_))
        ));
    }

    #[test]
    fn photometric_path() {
        let d = dispatch(&RunRequest::new(config(Some("lid"))), &BuiltinEngine).unwrap();
        assert_eq!(d.state, RunState::AwaitingInput);

        let payload = LidPayload::from_text(DOWNLIGHT_LDT).unwrap();
        let mut req = RunRequest::new(config(Some("lid"))).with_photometry(payload);
        req.scene.sensor.resolution = 20;

        let d = dispatch(&req, &BuiltinEngine).unwrap();
        assert_eq!(d.state, RunState::Ready);

        let d = dispatch(&req.trigger(), &BuiltinEngine).unwrap();
        match d.outcome {
            Some(RunOutcome::Photometry(r)) => {
                assert_eq!(r.name, "Test Lamp");
                assert_eq!(r.luminance.values.len(), 400);
                assert!(!r.polar_png.is_empty());
            }
            other => panic!("expected photometry, got {other:?}"),
        }
    }
}
