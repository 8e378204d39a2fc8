use anyhow::{Context, Result};

use eulumdat::{Eulumdat, LampSet, Symmetry, TypeIndicator};

use luxcalc::RunConfig;
use luxcalc::data::model::Separator;
use luxcalc::data::reference;
use luxcalc::lid::{LidFormat, LidPayload};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Blue pump plus phosphor emission, in W/nm.
fn led_spectrum(
    wavelengths: &[f64],
    bands: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = bands
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            (signal + rng.gauss(0.0, noise_level)).max(0.0)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_spectra(path: &str, rng: &mut SimpleRng) -> Result<usize> {
    let wavelengths = reference::grid();

    // (name, [(peak nm, width nm, amplitude)])
    let lamps: [(&str, &[(f64, f64, f64)]); 3] = [
        ("LED 2700K", &[(450.0, 10.0, 0.25), (610.0, 55.0, 1.0)]),
        ("LED 4000K", &[(450.0, 10.0, 0.6), (585.0, 60.0, 1.0)]),
        ("LED 6500K", &[(452.0, 11.0, 1.0), (560.0, 60.0, 0.8)]),
    ];
    let spectra: Vec<Vec<f64>> = lamps
        .iter()
        .map(|(_, bands)| led_spectrum(&wavelengths, bands, 0.002, rng))
        .collect();

    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec!["wavelength"];
    header.extend(lamps.iter().map(|(name, _)| *name));
    wtr.write_record(&header)?;

    for (i, wl) in wavelengths.iter().enumerate() {
        let mut record = vec![wl.to_string()];
        record.extend(spectra.iter().map(|s| format!("{:.6}", s[i])));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(lamps.len())
}

fn write_lid(path: &str) -> Result<()> {
    let g_angles: Vec<f64> = (0..=36).map(|i| i as f64 * 5.0).collect();
    // cos^2 downlight with a weak uplight component, cd/klm.
    let plane: Vec<f64> = g_angles
        .iter()
        .map(|g| {
            let c = g.to_radians().cos();
            if c > 0.0 { 400.0 * c * c } else { 15.0 * -c }
        })
        .collect();

    let ldt = Eulumdat {
        identification: "luxcalc sample".into(),
        type_indicator: TypeIndicator::PointSourceSymmetric,
        symmetry: Symmetry::VerticalAxis,
        num_c_planes: 1,
        num_g_planes: g_angles.len(),
        g_plane_distance: 5.0,
        luminaire_name: "sample downlight".into(),
        file_name: path.into(),
        downward_flux_fraction: 96.0,
        light_output_ratio: 100.0,
        lamp_sets: vec![LampSet {
            num_lamps: 1,
            lamp_type: "LED".into(),
            total_luminous_flux: 3000.0,
            color_appearance: "4000".into(),
            color_rendering_group: "80".into(),
            wattage_with_ballast: 25.0,
        }],
        c_angles: vec![0.0],
        g_angles,
        intensities: vec![plane],
        ..Eulumdat::default()
    };
    let payload = LidPayload::from_eulumdat(ldt.luminaire_name.clone(), LidFormat::Ldt, ldt)?;
    payload.data.save(path).with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn write_config(path: &str) -> Result<()> {
    let config = RunConfig {
        header: true,
        separator: Separator::Comma,
        quantity_set: Some("xyz-cct-duv".into()),
        ..RunConfig::default()
    };
    let text = serde_json::to_string_pretty(&config)?;
    std::fs::write(path, text).with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let spectra_path = "sample_spectra.csv";
    let count = write_spectra(spectra_path, &mut rng)?;
    println!(
        "Wrote {count} spectra ({} wavelengths each) to {spectra_path}",
        reference::GRID_LEN
    );

    let lid_path = "sample_lid.ldt";
    write_lid(lid_path)?;
    println!("Wrote luminous intensity distribution to {lid_path}");

    let config_path = "sample_config.json";
    write_config(config_path)?;
    println!("Wrote run configuration to {config_path}");
    log::info!("Try: luxcalc {config_path} {spectra_path}");
    Ok(())
}
