//! Luminous intensity distribution path.
//!
//! Independent of the spectral pipeline: a photometric payload goes straight
//! to a polar diagram and a simulated luminance render.
//!
//! ```text
//!  .ldt / .ies ──▶ LidPayload ─┬─▶ PolarDiagram ─▶ polar PNG
//!                              └─▶ render(Scene) ─▶ LuminanceMap ─▶ luminance PNG
//! ```

pub mod payload;
pub mod plot;
pub mod render;

pub use eulumdat::Symmetry;
pub use eulumdat::diagram::PolarDiagram;
pub use payload::{LidFormat, LidPayload};
pub use render::{LuminanceMap, Scene};

use crate::error::{LuxError, Result};

/// Everything the photometric path produces for one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LidRender {
    pub name: String,
    pub diagram: PolarDiagram,
    pub luminance: LuminanceMap,
    pub polar_png: Vec<u8>,
    pub luminance_png: Vec<u8>,
}

pub fn run(payload: &LidPayload, scene: &Scene) -> Result<LidRender> {
    payload.validate()?;

    let diagram = PolarDiagram::from_eulumdat(&payload.data);
    let luminance = render::render(payload, scene);
    let polar_png = plot::polar_png(&diagram).map_err(LuxError::computation)?;
    let luminance_png = plot::luminance_png(&luminance).map_err(LuxError::computation)?;

    log::info!(
        "Rendered intensity distribution '{}' (max {:.1} cd, {})",
        payload.name,
        payload.max_intensity(),
        diagram.symmetry.description()
    );
    Ok(LidRender {
        name: payload.name.clone(),
        diagram,
        luminance,
        polar_png,
        luminance_png,
    })
}
