//! Simulated luminance render of a luminaire in a wall-and-floor scene.
//!
//! A pin-hole sensor casts one ray per pixel. Where a ray hits a surface
//! the luminance is `ρ·E/π` with the direct illuminance `E = I·cosθ/d²` from
//! the luminaire. No inter-reflections and no shadowing.

use std::f64::consts::PI;

use super::payload::LidPayload;

pub type Vec3 = [f64; 3];

const UP: Vec3 = [0.0, 0.0, 1.0];
const EPS: f64 = 1e-9;

fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn normalize(a: Vec3) -> Vec3 {
    let n = norm(a);
    if n > 0.0 { scale(a, 1.0 / n) } else { a }
}

/// A unit vector perpendicular to `n`, preferring the horizontal plane.
fn perpendicular(n: Vec3) -> Vec3 {
    let c = cross(n, UP);
    if norm(c) > EPS {
        normalize(c)
    } else {
        [1.0, 0.0, 0.0]
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub position: Vec3,
    pub direction: Vec3,
    /// Horizontal and vertical field of view in degrees.
    pub fov: [f64; 2],
    /// Pixels along each axis.
    pub resolution: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Luminaire {
    pub position: Vec3,
    /// Direction of gamma = 0.
    pub aim: Vec3,
}

/// Flat rectangular diffuse reflector.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub center: Vec3,
    pub normal: Vec3,
    /// Width and height in metres.
    pub size: [f64; 2],
    pub reflectance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub sensor: Sensor,
    pub luminaire: Luminaire,
    pub surfaces: Vec<Surface>,
}

impl Default for Scene {
    fn default() -> Self {
        Scene {
            sensor: Sensor {
                position: [0.0, -1.0, 0.8],
                direction: [0.0, 1.0, -0.2],
                fov: [90.0, 90.0],
                resolution: 100,
            },
            luminaire: Luminaire {
                position: [0.0, 1.3, 2.0],
                aim: [0.0, 0.0, -1.0],
            },
            surfaces: vec![
                Surface {
                    name: "wall".into(),
                    center: [0.0, 2.0, 1.0],
                    normal: [0.0, -1.0, 0.0],
                    size: [4.0, 2.0],
                    reflectance: 1.0,
                },
                Surface {
                    name: "floor".into(),
                    center: [0.0, 1.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    size: [4.0, 2.0],
                    reflectance: 1.0,
                },
            ],
        }
    }
}

impl Surface {
    /// Distance along the ray to the rectangle and the normal facing the ray.
    fn hit(&self, origin: Vec3, dir: Vec3) -> Option<(f64, Vec3)> {
        let n = normalize(self.normal);
        let denom = dot(dir, n);
        if denom.abs() < EPS {
            return None;
        }
        let t = dot(sub(self.center, origin), n) / denom;
        if t <= EPS {
            return None;
        }

        let u = perpendicular(n);
        let v = cross(u, n);
        let local = sub(add(origin, scale(dir, t)), self.center);
        let inside = dot(local, u).abs() <= self.size[0] / 2.0 + EPS
            && dot(local, v).abs() <= self.size[1] / 2.0 + EPS;

        inside.then(|| (t, if denom > 0.0 { scale(n, -1.0) } else { n }))
    }
}

impl Luminaire {
    /// `(C, gamma)` in degrees of the direction from the luminaire to `point`.
    fn angles_to(&self, point: Vec3) -> (f64, f64) {
        let nadir = normalize(self.aim);
        let c0 = perpendicular_toward_x(nadir);
        let c90 = cross(c0, nadir);
        let d = normalize(sub(point, self.position));

        let gamma = dot(d, nadir).clamp(-1.0, 1.0).acos().to_degrees();
        let c = dot(d, c90).atan2(dot(d, c0)).to_degrees().rem_euclid(360.0);
        (c, gamma)
    }
}

/// C0 reference: world x projected onto the plane normal to `nadir`.
fn perpendicular_toward_x(nadir: Vec3) -> Vec3 {
    let x = [1.0, 0.0, 0.0];
    let projected = sub(x, scale(nadir, dot(x, nadir)));
    if norm(projected) > EPS {
        normalize(projected)
    } else {
        perpendicular(nadir)
    }
}

// ---------------------------------------------------------------------------
// Luminance map
// ---------------------------------------------------------------------------

/// Luminance (cd/m²) per pixel, row-major from the top-left. Pixels whose
/// ray misses every surface are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceMap {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl LuminanceMap {
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.values[y * self.width + x])
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    pub fn covered(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

pub fn render(payload: &LidPayload, scene: &Scene) -> LuminanceMap {
    let sensor = &scene.sensor;
    let res = sensor.resolution;
    let forward = normalize(sensor.direction);
    let right = perpendicular(forward);
    let up = cross(right, forward);
    let half_w = (sensor.fov[0].to_radians() / 2.0).tan();
    let half_h = (sensor.fov[1].to_radians() / 2.0).tan();

    let mut values = Vec::with_capacity(res * res);
    for row in 0..res {
        let sy = (1.0 - 2.0 * (row as f64 + 0.5) / res as f64) * half_h;
        for col in 0..res {
            let sx = (2.0 * (col as f64 + 0.5) / res as f64 - 1.0) * half_w;
            let ray = normalize(add(forward, add(scale(right, sx), scale(up, sy))));
            values.push(trace(payload, scene, sensor.position, ray));
        }
    }

    let map = LuminanceMap {
        width: res,
        height: res,
        values,
    };
    log::debug!(
        "Rendered {}x{} luminance map, {} pixels on surfaces, max {:.2} cd/m²",
        res,
        res,
        map.covered(),
        map.max()
    );
    map
}

fn trace(payload: &LidPayload, scene: &Scene, origin: Vec3, ray: Vec3) -> f64 {
    let nearest = scene
        .surfaces
        .iter()
        .filter_map(|s| s.hit(origin, ray).map(|(t, n)| (t, n, s)))
        .min_by(|a, b| a.0.total_cmp(&b.0));

    let Some((t, normal, surface)) = nearest else {
        return f64::NAN;
    };
    let point = add(origin, scale(ray, t));
    surface.reflectance * illuminance(payload, &scene.luminaire, point, normal) / PI
}

/// Direct illuminance (lx) at `point` on a surface with `normal`.
pub fn illuminance(payload: &LidPayload, luminaire: &Luminaire, point: Vec3, normal: Vec3) -> f64 {
    let to_lum = sub(luminaire.position, point);
    let d2 = dot(to_lum, to_lum);
    if d2 <= EPS {
        return 0.0;
    }
    let cos_theta = dot(normalize(to_lum), normal);
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let (c, gamma) = luminaire.angles_to(point);
    payload.intensity_at(c, gamma) * cos_theta / d2
}

#[cfg(test)]
mod tests {
    use eulumdat::{Eulumdat, Symmetry};

    use super::*;
    use crate::lid::payload::LidFormat;
    use crate::lid::payload::tests::DOWNLIGHT_LDT;

    fn isotropic(cd: f64) -> LidPayload {
        let data = Eulumdat {
            symmetry: Symmetry::VerticalAxis,
            c_angles: vec![0.0],
            g_angles: vec![0.0, 180.0],
            intensities: vec![vec![cd, cd]],
            ..Eulumdat::default()
        };
        LidPayload::from_eulumdat("iso", LidFormat::Ldt, data).unwrap()
    }

    #[test]
    fn inverse_square_and_cosine() {
        let lum = Luminaire {
            position: [0.0, 0.0, 2.0],
            aim: [0.0, 0.0, -1.0],
        };
        let p = isotropic(100.0);
        let below = illuminance(&p, &lum, [0.0, 0.0, 0.0], UP);
        assert!((below - 25.0).abs() < 1e-9);

        // 45° off-axis: d² = 8, cosθ = 1/√2.
        let off = illuminance(&p, &lum, [2.0, 0.0, 0.0], UP);
        assert!((off - 100.0 / 8.0 / 2f64.sqrt()).abs() < 1e-9);

        // Surface facing away receives nothing.
        assert_eq!(illuminance(&p, &lum, [0.0, 0.0, 0.0], [0.0, 0.0, -1.0]), 0.0);
    }

    #[test]
    fn angles_follow_aim() {
        let lum = Luminaire {
            position: [0.0, 0.0, 1.0],
            aim: [0.0, 0.0, -1.0],
        };
        let (_, nadir) = lum.angles_to([0.0, 0.0, 0.0]);
        assert!(nadir.abs() < 1e-9);

        let (c, g) = lum.angles_to([1.0, 0.0, 1.0]);
        assert!((g - 90.0).abs() < 1e-9);
        assert!(c.abs() < 1e-9);

        let (c, _) = lum.angles_to([0.0, 1.0, 1.0]);
        assert!((c - 90.0).abs() < 1e-9 || (c - 270.0).abs() < 1e-9);
    }

    #[test]
    fn default_scene_sees_both_surfaces() {
        let scene = Scene::default();
        let map = render(&isotropic(1000.0), &scene);
        assert_eq!(map.values.len(), 100 * 100);
        let covered = map.covered();
        assert!(covered > 2000 && covered < 100 * 100, "covered {covered}");
        assert!(map.max() > 0.0);

        // Centre pixel looks down onto the floor/wall and is lit.
        let centre = map.get(50, 50).unwrap();
        assert!(centre.is_finite() && centre > 0.0);
        assert!(map.get(100, 0).is_none());
    }

    #[test]
    fn parsed_file_drives_illuminance() {
        let p = LidPayload::from_text(DOWNLIGHT_LDT).unwrap();
        let lum = Luminaire {
            position: [0.0, 0.0, 2.0],
            aim: [0.0, 0.0, -1.0],
        };
        let below = illuminance(&p, &lum, [0.0, 0.0, 0.0], UP);
        assert!((below - 386.8 * 19.8 / 4.0).abs() < 1e-6);

        // Above the luminaire gamma is 180°, where the downlight is dark.
        assert_eq!(illuminance(&p, &lum, [0.0, 0.0, 3.0], [0.0, 0.0, -1.0]), 0.0);
    }

    #[test]
    fn ray_hits_rectangle_only_inside() {
        let floor = &Scene::default().surfaces[1];
        assert!(floor.hit([0.0, 1.0, 1.0], [0.0, 0.0, -1.0]).is_some());
        assert!(floor.hit([3.0, 1.0, 1.0], [0.0, 0.0, -1.0]).is_none());
        assert!(floor.hit([0.0, 1.0, 1.0], [0.0, 0.0, 1.0]).is_none());
    }
}
