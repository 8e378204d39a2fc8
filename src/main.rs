use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::util::pretty::pretty_format_batches;

use luxcalc::export;
use luxcalc::lid::LidPayload;
use luxcalc::quantity;
use luxcalc::{BuiltinEngine, ResultTable, RunConfig, RunOutcome, RunRequest, RunState, dispatch};

const USAGE: &str = "\
usage: luxcalc <config.json> [spectra.csv] [--lid payload.json] [-o output] [--dry-run]

  config.json        run configuration (quantity set, units, separator, ...)
  spectra.csv        delimited spectral input; built-in D65 when omitted
  --lid FILE         luminous intensity distribution (.ldt or .ies) for the 'lid' set
  -o, --output PATH  table file (.csv, .json, .parquet) or directory for images
  --dry-run          resolve inputs without computing";

struct Args {
    config: PathBuf,
    spectra: Option<PathBuf>,
    lid: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut lid: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut dry_run = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--lid" => lid = Some(it.next().context("--lid needs a file")?.into()),
            "-o" | "--output" => output = Some(it.next().context("-o needs a path")?.into()),
            "--dry-run" => dry_run = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n\n{USAGE}"),
            _ => positional.push(PathBuf::from(&arg)),
        }
    }

    let mut positional = positional.into_iter();
    let config = positional
        .next()
        .with_context(|| format!("missing configuration file\n\n{USAGE}"))?;
    let spectra = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument {}\n\n{USAGE}", extra.display());
    }

    Ok(Args {
        config,
        spectra,
        lid,
        output,
        dry_run,
    })
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = RunConfig::load(&args.config)?;

    let mut request = RunRequest::new(config);
    if let Some(path) = &args.spectra {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading spectra {}", path.display()))?;
        request = request.with_spectra(text);
    }
    if let Some(path) = &args.lid {
        request = request.with_photometry(LidPayload::load(path)?);
    }
    request.triggered = !args.dry_run;

    let result = dispatch(&request, &BuiltinEngine)?;
    match result.state {
        RunState::AwaitingInput => {
            println!("{}", result.message.unwrap_or_default());
            return Ok(());
        }
        RunState::Ready => {
            if let Some(input) = &result.input {
                println!(
                    "Ready: {} spectra on {} wavelengths ({})",
                    input.len(),
                    input.wavelengths().len(),
                    input.names().join(", ")
                );
            } else {
                println!("Ready");
            }
            return Ok(());
        }
        RunState::Completed => {}
    }

    match result.outcome {
        Some(RunOutcome::Table(table)) => {
            print_table(&table)?;
            let path = match args.output {
                Some(path) => path,
                None => {
                    let key = request.config.quantity_set.as_deref().unwrap_or_default();
                    PathBuf::from(export::default_filename(quantity::lookup(key)?))
                }
            };
            export::save(&table, &path)?;
            println!("Saved {}", path.display());
        }
        Some(RunOutcome::Report(report)) => {
            let dir = output_dir(args.output.as_deref())?;
            let path = export::save_report(&report, &dir)?;
            println!("Saved report {}", path.display());
        }
        Some(RunOutcome::Notice { message, table }) => {
            log::warn!("{}: {message}", table.title);
            println!("{}\n{message}", table.title);
        }
        Some(RunOutcome::Photometry(render)) => {
            let dir = output_dir(args.output.as_deref())?;
            let stem = if render.name.is_empty() { "lid" } else { render.name.as_str() };
            let images = [("polar", &render.polar_png), ("render", &render.luminance_png)];
            for (suffix, bytes) in images {
                let path = dir.join(format!("{stem}_{suffix}.png"));
                std::fs::write(&path, bytes)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Saved {}", path.display());
            }
        }
        None => {}
    }
    Ok(())
}

fn print_table(table: &ResultTable) -> Result<()> {
    println!("{}", table.title);
    let batch = export::record_batch(table)?;
    println!("{}", pretty_format_batches(&[batch])?);
    for line in &table.legend {
        println!("  {line}");
    }
    Ok(())
}

fn output_dir(output: Option<&Path>) -> Result<PathBuf> {
    let dir = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}
