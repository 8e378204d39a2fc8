use std::io::Cursor;

use anyhow::{Context, Result};
use eulumdat::diagram::PolarDiagram;
use image::{ImageFormat, Rgb, RgbImage};

use super::render::LuminanceMap;
use crate::color::{Rgb8, generate_palette, heat_scaled};

const POLAR_SIZE: u32 = 400;
const GRID: Rgb8 = [210, 210, 210];
const AXIS: Rgb8 = [150, 150, 150];

/// Draw the polar diagram: one ring per scale step, the axes and one curve
/// per plane pair. Nadir points down.
pub fn polar_png(diagram: &PolarDiagram) -> Result<Vec<u8>> {
    let mut img = RgbImage::from_pixel(POLAR_SIZE, POLAR_SIZE, Rgb([255, 255, 255]));
    let centre = POLAR_SIZE as f64 / 2.0;
    let radius = centre * 0.9;
    let scale = radius / diagram.scale.scale_max;

    for ring in &diagram.scale.grid_values {
        draw_circle(&mut img, centre, centre, ring * scale, GRID);
    }
    draw_line(&mut img, (centre - radius, centre), (centre + radius, centre), AXIS);
    draw_line(&mut img, (centre, centre - radius), (centre, centre + radius), AXIS);

    let colors = generate_palette(2);
    let mut curves = vec![(&diagram.c0_c180_curve, colors[0])];
    if diagram.show_c90_c270() {
        curves.push((&diagram.c90_c270_curve, colors[1]));
    }

    for (curve, color) in curves {
        let screen: Vec<(f64, f64)> = curve
            .points
            .iter()
            .map(|p| (centre + p.x * scale, centre + p.y * scale))
            .collect();
        for pair in screen.windows(2) {
            draw_line(&mut img, pair[0], pair[1], color);
        }
        if let (Some(&first), Some(&last)) = (screen.first(), screen.last()) {
            draw_line(&mut img, last, first, color);
        }
    }

    encode(&img)
}

/// False-colour luminance image, scaled to the map maximum. Background is black.
pub fn luminance_png(map: &LuminanceMap) -> Result<Vec<u8>> {
    let max = map.max();
    let img = RgbImage::from_fn(map.width as u32, map.height as u32, |x, y| {
        let value = map.get(x as usize, y as usize).unwrap_or(f64::NAN);
        if value.is_nan() {
            Rgb([0, 0, 0])
        } else {
            Rgb(heat_scaled(value, 0.0, max))
        }
    });
    encode(&img)
}

fn encode(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(bytes)
}

fn put(img: &mut RgbImage, x: f64, y: f64, color: Rgb8) {
    let (x, y) = (x.round(), y.round());
    if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, Rgb(color));
    }
}

fn draw_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb8) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        put(img, from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t, color);
    }
}

fn draw_circle(img: &mut RgbImage, cx: f64, cy: f64, r: f64, color: Rgb8) {
    let steps = (2.0 * std::f64::consts::PI * r).ceil().max(8.0) as usize;
    for i in 0..steps {
        let a = 2.0 * std::f64::consts::PI * i as f64 / steps as f64;
        put(img, cx + r * a.cos(), cy + r * a.sin(), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lid::payload::LidPayload;
    use crate::lid::payload::tests::{DOWNLIGHT_LDT, quadrant};

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn polar_png_is_png() {
        let diagram = PolarDiagram::from_eulumdat(&quadrant().data);
        assert!(diagram.show_c90_c270());
        let bytes = polar_png(&diagram).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn polar_curve_hangs_below_centre() {
        let p = LidPayload::from_text(DOWNLIGHT_LDT).unwrap();
        let diagram = PolarDiagram::from_eulumdat(&p.data);
        assert!(!diagram.show_c90_c270());

        let img = image::load_from_memory(&polar_png(&diagram).unwrap())
            .unwrap()
            .to_rgb8();
        let curve = Rgb(generate_palette(2)[0]);
        let centre = POLAR_SIZE / 2;
        let drawn = |rows: std::ops::Range<u32>| {
            rows.flat_map(|y| (0..POLAR_SIZE).map(move |x| (x, y)))
                .filter(|&(x, y)| *img.get_pixel(x, y) == curve)
                .count()
        };
        // The downlight curve is drawn under the horizontal axis only.
        assert!(drawn(centre + 1..POLAR_SIZE) > 100);
        assert_eq!(drawn(0..centre - 1), 0);
    }

    #[test]
    fn luminance_png_decodes_to_map_size() {
        let map = LuminanceMap {
            width: 3,
            height: 2,
            values: vec![0.0, 1.0, 2.0, f64::NAN, 4.0, 5.0],
        };
        let bytes = luminance_png(&map).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 1), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(2, 1), &Rgb(heat_scaled(5.0, 0.0, 5.0)));
    }
}
