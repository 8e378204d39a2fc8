/// Data layer: spectral table, ingestion and spectrum selection.
///
/// Architecture:
/// ```text
///  .csv / .txt / .dat  (or nothing → built-in D65)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  delimited rows → SpectralTable (units resolved once)
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ SpectralTable  │  wavelength grid + named spectra
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  select   │  Single(name) | All → sub-table
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod reference;
pub mod select;
