//! Lighting and colour-science quantities for batches of spectra.
//!
//! A run normalizes delimited spectral input into a [`SpectralTable`],
//! selects the spectra to compute over, looks up the chosen quantity set in
//! the registry and hands the selection to a [`ColorEngine`] once per
//! registered call. The heterogeneous outputs come back as one labeled
//! [`ResultTable`] ready for export. Luminous intensity distributions take a
//! separate path to a polar diagram and a simulated luminance render.

pub mod assemble;
pub mod color;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod lid;
pub mod quantity;
pub mod state;

pub use assemble::{ResultRow, ResultTable};
pub use config::{Annotation, RunConfig};
pub use data::model::SpectralTable;
pub use data::select::SpectrumSelector;
pub use engine::{BuiltinEngine, ColorEngine};
pub use error::{LuxError, Result};
pub use quantity::QuantitySetId;
pub use state::{Dispatch, RunOutcome, RunRequest, RunState, dispatch};
