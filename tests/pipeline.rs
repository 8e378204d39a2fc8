//! End-to-end runs through the public API.

use luxcalc::config::Annotation;
use luxcalc::data::loader::{self, InputFormat};
use luxcalc::data::model::{PowerUnit, Separator};
use luxcalc::data::reference;
use luxcalc::engine::{
    AlphaOpicOutput, AlphaOpicParams, AlphaOpicQuantity, FidelityMethod, FidelityOutput,
    GraphicReport, Tm30Output, Xyz,
};
use luxcalc::lid::{LidFormat, LidPayload};
use luxcalc::{
    BuiltinEngine, ColorEngine, LuxError, RunConfig, RunOutcome, RunRequest, RunState,
    SpectralTable, SpectrumSelector, dispatch, export,
};

/// Colour engine with plausible output shapes: 16 hue bins, 99 samples,
/// 5 photoreceptor channels.
struct ShapeEngine;

impl ColorEngine for ShapeEngine {
    fn spd_to_xyz(
        &self,
        spds: &SpectralTable,
        observer: &str,
        relative: bool,
    ) -> anyhow::Result<Vec<Xyz>> {
        BuiltinEngine.spd_to_xyz(spds, observer, relative)
    }

    fn xyz_to_cct_duv(&self, xyz: &[Xyz], observer: &str) -> anyhow::Result<Vec<(f64, f64)>> {
        BuiltinEngine.xyz_to_cct_duv(xyz, observer)
    }

    fn luminous_efficacy(&self, spds: &SpectralTable) -> anyhow::Result<Vec<f64>> {
        BuiltinEngine.luminous_efficacy(spds)
    }

    fn tm30(&self, spds: &SpectralTable) -> anyhow::Result<Tm30Output> {
        let n = spds.len();
        let per = |k: usize| vec![vec![1.0; n]; k];
        Ok(Tm30Output {
            cct: vec![4000.0; n],
            duv: vec![0.0; n],
            white_xyz: BuiltinEngine.spd_to_xyz(spds, "1931_2", true)?,
            rf: (0..n).map(|i| 80.0 + i as f64).collect(),
            rg: vec![100.0; n],
            rcsh: per(16),
            rhsh: per(16),
            rfh: per(16),
            rfi: per(99),
        })
    }

    fn fidelity(&self, spds: &SpectralTable, _: FidelityMethod) -> anyhow::Result<FidelityOutput> {
        Ok(FidelityOutput {
            general: vec![90.0; spds.len()],
            specific: vec![vec![90.0; spds.len()]; 14],
        })
    }

    fn alpha_opic(
        &self,
        spds: &SpectralTable,
        quantity: AlphaOpicQuantity,
        _: &AlphaOpicParams,
    ) -> anyhow::Result<AlphaOpicOutput> {
        let value = match quantity {
            AlphaOpicQuantity::Irradiance => 0.1,
            AlphaOpicQuantity::Edi => 250.0,
            AlphaOpicQuantity::Der => 0.8,
            AlphaOpicQuantity::Elr => 0.001,
        };
        Ok(AlphaOpicOutput {
            channels: ["sc", "mc", "lc", "rh", "mel"].map(String::from).to_vec(),
            values: vec![vec![value; 5]; spds.len()],
        })
    }

    fn tm30_report(
        &self,
        spds: &SpectralTable,
        annotation: &Annotation,
    ) -> anyhow::Result<GraphicReport> {
        Ok(GraphicReport {
            source: spds.names()[0].clone(),
            annotation: annotation.clone(),
            png: Vec::new(),
        })
    }
}

/// 380-780 nm / 5 nm, one row per wavelength, one column per spectrum.
fn spectra_text(columns: usize, separator: char, header: Option<&[&str]>) -> String {
    let mut text = String::new();
    if let Some(names) = header {
        text.push_str("nm");
        for name in names {
            text.push(separator);
            text.push_str(name);
        }
        text.push('\n');
    }
    for wl in reference::grid() {
        text.push_str(&wl.to_string());
        for c in 0..columns {
            let v = 1.0 + 0.5 * ((wl - 380.0) / 400.0) * (c as f64 + 1.0);
            text.push(separator);
            text.push_str(&format!("{v:.4}"));
        }
        text.push('\n');
    }
    text
}

fn config(key: &str) -> RunConfig {
    RunConfig {
        quantity_set: Some(key.to_string()),
        ..RunConfig::default()
    }
}

fn completed_table(request: &RunRequest, engine: &dyn ColorEngine) -> luxcalc::ResultTable {
    let d = dispatch(request, engine).unwrap();
    assert_eq!(d.state, RunState::Completed);
    match d.outcome {
        Some(RunOutcome::Table(t)) => t,
        other => panic!("expected a table, got {other:?}"),
    }
}

#[test]
fn xyz_end_to_end_single_headerless_spectrum() {
    let mut cfg = config("xyz-cct-duv");
    cfg.power_unit = PowerUnit::Watt;
    cfg.cie_observer = "1931_2".into();
    cfg.relative_xyz = true;

    let request = RunRequest::new(cfg).with_spectra(spectra_text(1, ',', None)).trigger();
    let table = completed_table(&request, &BuiltinEngine);

    assert_eq!(table.row_labels(), ["S1"]);
    assert_eq!(table.columns, ["X", "Y", "Z", "x", "y", "u'", "v'", "CCT", "Duv"]);
    let row = &table.rows[0];
    assert!(row.values.iter().all(|v| v.is_finite()), "{:?}", row.values);
    assert!((table.value("S1", "Y").unwrap() - 100.0).abs() < 1e-9);

    // A spectrum rising towards red is warmer than D65.
    let cct = table.value("S1", "CCT").unwrap();
    assert!(cct > 2000.0 && cct < 6500.0, "CCT {cct}");
}

#[test]
fn tm30_over_three_named_spectra_keeps_order() {
    let mut cfg = config("tm30-quantities");
    cfg.header = true;
    cfg.separator = Separator::Semicolon;
    let names = ["Zeta", "Alpha", "Mid"];

    let request = RunRequest::new(cfg)
        .with_spectra(spectra_text(3, ';', Some(&names)))
        .trigger();
    let table = completed_table(&request, &ShapeEngine);

    assert_eq!(table.row_labels(), names);
    assert_eq!(table.columns.len(), 9 + 16 * 3 + 99);
    assert_eq!(table.value("Alpha", "Rf"), Some(81.0));
    assert_eq!(table.value("Mid", "Rf"), Some(82.0));
}

#[test]
fn alpha_opic_over_two_spectra_has_eight_rows() {
    let request = RunRequest::new(config("alpha-opic"))
        .with_spectra(spectra_text(2, ',', None))
        .trigger();
    let table = completed_table(&request, &ShapeEngine);

    assert_eq!(table.len(), 8);
    assert_eq!(table.row_labels()[0], "a-Ee: S1");
    assert_eq!(table.row_labels()[7], "a-ELR: S2");
    assert_eq!(table.value("a-EDI: S2", "mel"), Some(250.0));
}

#[test]
fn single_selection_is_the_named_column() {
    let text = spectra_text(3, '\t', None);
    let format = InputFormat {
        separator: Separator::Tab,
        ..InputFormat::default()
    };
    let canonical = loader::normalize(Some(&text), &format).unwrap();

    let mut cfg = config("xyz-cct-duv");
    cfg.separator = Separator::Tab;
    cfg.spectrum = SpectrumSelector::Single("S2".into());
    let request = RunRequest::new(cfg).with_spectra(text);
    let d = dispatch(&request, &BuiltinEngine).unwrap();
    assert_eq!(d.state, RunState::Ready);

    let table = completed_table(&request.trigger(), &BuiltinEngine);
    assert_eq!(table.row_labels(), ["S2"]);

    let single = SpectralTable::new(
        canonical.wavelengths().to_vec(),
        vec!["S2".into()],
        vec![canonical.spectrum("S2").unwrap().to_vec()],
    )
    .unwrap();
    let direct = BuiltinEngine.spd_to_xyz(&single, "1931_2", true).unwrap();
    let x = direct[0][0] / direct[0].iter().sum::<f64>();
    assert!((table.value("S2", "x").unwrap() - x).abs() < 1e-12);
}

#[test]
fn milliwatt_input_is_scaled_once() {
    let text = spectra_text(1, ',', None);
    let watts = loader::normalize(Some(&text), &InputFormat::default()).unwrap();
    let milli = loader::normalize(
        Some(&text),
        &InputFormat {
            unit: PowerUnit::Milliwatt,
            ..InputFormat::default()
        },
    )
    .unwrap();

    for (w, m) in watts.spectra()[0].iter().zip(&milli.spectra()[0]) {
        assert!((m / 1e-3 - w).abs() < 1e-12);
    }

    // Absolute XYZ follows the scale, relative XYZ does not.
    let abs_w = BuiltinEngine.spd_to_xyz(&watts, "1931_2", false).unwrap();
    let abs_m = BuiltinEngine.spd_to_xyz(&milli, "1931_2", false).unwrap();
    assert!((abs_m[0][1] * 1e3 - abs_w[0][1]).abs() < 1e-6 * abs_w[0][1]);
}

#[test]
fn default_input_is_reproducible() {
    let a = dispatch(&RunRequest::new(config("xyz-cct-duv")).trigger(), &BuiltinEngine).unwrap();
    let b = dispatch(&RunRequest::new(config("xyz-cct-duv")).trigger(), &BuiltinEngine).unwrap();
    assert_eq!(a, b);

    let input = a.input.unwrap();
    assert_eq!(input.names(), ["D65 (default)"]);
    assert_eq!(input.wavelengths(), reference::grid().as_slice());
}

#[test]
fn ingestion_and_selection_errors() {
    let mut cfg = config("xyz-cct-duv");
    cfg.header = true;
    let dup = RunRequest::new(cfg).with_spectra("nm,A,A\n400,1,2\n410,1,2\n").trigger();
    assert!(matches!(dispatch(&dup, &BuiltinEngine), Err(LuxError::DuplicateName(_))));

    let ragged = RunRequest::new(config("xyz-cct-duv"))
        .with_spectra("400,1,2\n410,1\n")
        .trigger();
    assert!(matches!(dispatch(&ragged, &BuiltinEngine), Err(LuxError::MalformedInput(_))));

    let report_all = RunRequest::new(config("tm30-report"))
        .with_spectra(spectra_text(2, ',', None))
        .trigger();
    assert!(matches!(
        dispatch(&report_all, &ShapeEngine),
        Err(LuxError::InvalidSelection(_))
    ));

    let mut cfg = config("xyz-cct-duv");
    cfg.spectrum = SpectrumSelector::Single("S9".into());
    let missing = RunRequest::new(cfg).with_spectra(spectra_text(2, ',', None)).trigger();
    assert!(matches!(
        dispatch(&missing, &BuiltinEngine),
        Err(LuxError::InvalidSelection(_))
    ));
}

#[test]
fn csv_export_of_a_run() {
    let request = RunRequest::new(config("xyz-cct-duv"))
        .with_spectra(spectra_text(2, ',', None))
        .trigger();
    let table = completed_table(&request, &BuiltinEngine);

    let csv = export::to_csv_string(&table).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(",X,Y,Z,x,y,u',v',CCT,Duv"));
    assert!(lines.next().unwrap().starts_with("S1,"));
    assert!(lines.next().unwrap().starts_with("S2,"));
    assert_eq!(lines.next(), None);
}

#[test]
fn parquet_export_writes_a_file() {
    let request = RunRequest::new(config("xyz-cct-duv")).trigger();
    let table = completed_table(&request, &BuiltinEngine);

    let path = std::env::temp_dir().join("luxcalc_pipeline_test.parquet");
    export::save(&table, &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"PAR1");
    let _ = std::fs::remove_file(path);
}

#[test]
fn ies_file_drives_the_photometric_path() {
    let ies = "IESNA:LM-63-2002
[TEST] pipeline
[LUMINAIRE] Wallwasher
TILT=NONE
1 1000 1 5 1 1 2 1 1 0
1.0 1.0 10
0 22.5 45 67.5 90
0
800 700 450 150 0
";
    let dir = std::env::temp_dir().join("luxcalc_pipeline_lid");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("wallwasher.ies");
    std::fs::write(&path, ies).unwrap();

    let payload = LidPayload::load(&path).unwrap();
    assert_eq!(payload.format, LidFormat::Ies);
    assert!((payload.intensity_at(90.0, 0.0) - 800.0).abs() < 1e-6);

    let mut request = RunRequest::new(config("lid")).with_photometry(payload);
    request.scene.sensor.resolution = 16;
    let d = dispatch(&request.trigger(), &BuiltinEngine).unwrap();
    assert_eq!(d.state, RunState::Completed);
    match d.outcome {
        Some(RunOutcome::Photometry(render)) => {
            assert_eq!(render.luminance.values.len(), 16 * 16);
            assert!(render.luminance.max() > 0.0);
            assert!(!render.diagram.show_c90_c270());
            assert!(!render.luminance_png.is_empty());
        }
        other => panic!("expected photometry, got {other:?}"),
    }
    let _ = std::fs::remove_dir_all(dir);
}
