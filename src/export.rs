use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::assemble::ResultTable;
use crate::engine::GraphicReport;
use crate::quantity::QuantitySetDescriptor;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Write a result table. Dispatch by extension.
///
/// * `.csv`     – row labels as the first (unnamed) column, then one column per label
/// * `.json`    – the table with title, columns, rows and legend
/// * `.parquet` – a `spectrum` string column plus one `Float64` column per label
pub fn save(table: &ResultTable, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !matches!(ext.as_str(), "csv" | "json" | "parquet" | "pq") {
        bail!("Unsupported export extension: .{ext}");
    }
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;

    match ext.as_str() {
        "csv" => write_csv(table, file),
        "json" => serde_json::to_writer_pretty(file, table).context("writing JSON"),
        _ => write_parquet(table, file),
    }
    .with_context(|| format!("exporting '{}' to {}", table.title, path.display()))?;

    log::info!(
        "Exported {} rows x {} columns to {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(())
}

/// File name offered when the user does not pick one.
pub fn default_filename(descriptor: &QuantitySetDescriptor) -> String {
    format!("luxcalc_{}.csv", descriptor.key)
}

/// Save the PNG bytes of a graphic report as `{dir}/{spectrum}.png`.
pub fn save_report(report: &GraphicReport, dir: &Path) -> Result<PathBuf> {
    let stem: String = report
        .source
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let path = dir.join(format!("{stem}.png"));
    std::fs::write(&path, &report.png)
        .with_context(|| format!("writing report {}", path.display()))?;
    log::info!("Saved graphic report for '{}' to {}", report.source, path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push("");
    header.extend(table.columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.label.clone());
        record.extend(row.values.iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(table: &ResultTable) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Column-oriented view of the table.
pub fn record_batch(table: &ResultTable) -> Result<RecordBatch> {
    let mut fields = vec![Field::new("spectrum", DataType::Utf8, false)];
    fields.extend(
        table
            .columns
            .iter()
            .map(|c| Field::new(c.as_str(), DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len() + 1);
    arrays.push(Arc::new(StringArray::from(table.row_labels())));
    for col in 0..table.columns.len() {
        let values: Vec<f64> = table.rows.iter().map(|r| r.values[col]).collect();
        arrays.push(Arc::new(Float64Array::from(values)));
    }

    RecordBatch::try_new(schema, arrays).context("building record batch")
}

fn write_parquet<W: Write + Send>(table: &ResultTable, writer: W) -> Result<()> {
    let batch = record_batch(table)?;
    let mut pq = ArrowWriter::try_new(writer, batch.schema(), None)?;
    pq.write(&batch)?;
    pq.close()?;
    Ok(())
}
