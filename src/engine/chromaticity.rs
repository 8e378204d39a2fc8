use palette::convert::FromColorUnclamped;
use palette::white_point::D65;
use palette::{Xyz as PaletteXyz, Yxy};

use super::Xyz;

/// CIE 1931 `(x, y)` chromaticity. A zero triple maps to `(0, 0)`.
pub fn xy(xyz: &Xyz) -> [f64; 2] {
    let yxy: Yxy<D65, f64> =
        Yxy::from_color_unclamped(PaletteXyz::<D65, f64>::new(xyz[0], xyz[1], xyz[2]));
    [yxy.x, yxy.y]
}

/// CIE 1976 `(u', v')` chromaticity. A zero triple gives NaN.
pub fn uv_prime(xyz: &Xyz) -> [f64; 2] {
    let [x, y, z] = *xyz;
    let d = x + 15.0 * y + 3.0 * z;
    if d == 0.0 {
        return [f64::NAN, f64::NAN];
    }
    [4.0 * x / d, 9.0 * y / d]
}

/// CIE 1960 `(u, v)`, the space CCT and Duv are measured in.
pub fn uv_1960(xyz: &Xyz) -> [f64; 2] {
    let [u, v] = uv_prime(xyz);
    [u, v * 2.0 / 3.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_energy_point() {
        let [x, y] = xy(&[1.0, 1.0, 1.0]);
        assert!((x - 1.0 / 3.0).abs() < 1e-12);
        assert!((y - 1.0 / 3.0).abs() < 1e-12);

        let [u, v] = uv_prime(&[1.0, 1.0, 1.0]);
        assert!((u - 4.0 / 19.0).abs() < 1e-12);
        assert!((v - 9.0 / 19.0).abs() < 1e-12);
    }

    #[test]
    fn uv_1960_scales_v() {
        let [_, vp] = uv_prime(&[95.047, 100.0, 108.883]);
        let [_, v] = uv_1960(&[95.047, 100.0, 108.883]);
        assert!((v - vp * 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_is_nan_in_uv() {
        assert!(uv_prime(&[0.0, 0.0, 0.0])[0].is_nan());
    }
}
