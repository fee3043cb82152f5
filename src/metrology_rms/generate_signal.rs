use rand::Rng;
use std::f64::consts::PI;

use super::types::AdcResolution;

pub const FS: f64 = 2000.0; // Sampling frequency
pub const F: f64 = 50.0; // Frequency in Hz

fn offset(deg: f64) -> f64 {
    deg * 2.0 * PI / 360.0
}

/// One synthetic channel, all values in ADC counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveProfile {
    pub amplitude: f64,
    pub dc_offset: f64,  // Relative to mid-scale
    pub phase_deg: f64,
    pub noise: f64,      // Peak of uniform noise
}

impl Default for WaveProfile {
    fn default() -> Self {
        WaveProfile {
            amplitude: 300.0,
            dc_offset: 0.0,
            phase_deg: 0.0,
            noise: 0.0,
        }
    }
}

/*
* @brief Sine generator producing raw voltage/current ADC code pairs.
* @note Codes are centred on mid-scale, shifted by each profile's DC offset
*       and saturated to the converter range, like a real front-end would.
*/
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    resolution: AdcResolution,
    fs: f64,
    f: f64,
    voltage: WaveProfile,
    current: WaveProfile,
    sample: u64,
}

impl SignalGenerator {
    pub fn new(
        resolution: AdcResolution,
        fs: f64,
        f: f64,
        voltage: WaveProfile,
        current: WaveProfile,
    ) -> Self {
        SignalGenerator {
            resolution,
            fs,
            f,
            voltage,
            current,
            sample: 0,
        }
    }

    fn code<R: Rng>(&self, wave: &WaveProfile, rng: &mut R) -> u16 {
        let t = self.sample as f64;
        let mut value = self.resolution.mid_scale() as f64
            + wave.dc_offset
            + wave.amplitude * (offset(wave.phase_deg) + 2.0 * PI * self.f / self.fs * t).sin();

        if wave.noise > 0.0 {
            value += rng.gen_range(-wave.noise..=wave.noise);
        }

        value.round().clamp(0.0, self.resolution.max_code() as f64) as u16
    }

    /// Next (voltage, current) pair.
    pub fn next_pair<R: Rng>(&mut self, rng: &mut R) -> (u16, u16) {
        let pair = (self.code(&self.voltage, rng), self.code(&self.current, rng));
        self.sample += 1;
        pair
    }

    pub fn samples_per_cycle(&self) -> f64 {
        self.fs / self.f
    }
}

/// Generate `length` code pairs starting at sample zero.
pub fn generate_signals(
    resolution: AdcResolution,
    voltage: WaveProfile,
    current: WaveProfile,
    length: usize,
) -> Vec<(u16, u16)> {
    let mut rng = rand::thread_rng();
    let mut generator = SignalGenerator::new(resolution, FS, F, voltage, current);
    (0..length).map(|_| generator.next_pair(&mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_sine_is_centred_on_mid_scale() {
        let clean = WaveProfile::default();
        let pairs = generate_signals(AdcResolution::Bits10, clean, clean, 40);
        assert_eq!(pairs[0], (512, 512));
        // Quarter cycle at 40 samples per cycle.
        assert_eq!(pairs[10].0, 812);

        let mean: f64 = pairs.iter().map(|p| p.0 as f64).sum::<f64>() / pairs.len() as f64;
        assert!((mean - 512.0).abs() < 1.0);
    }

    #[test]
    fn saturates_at_converter_limits() {
        let loud = WaveProfile {
            amplitude: 400.0,
            ..Default::default()
        };
        let pairs = generate_signals(AdcResolution::Bits8, loud, loud, 40);
        assert!(pairs.iter().any(|p| p.0 == 255));
        assert!(pairs.iter().any(|p| p.0 == 0));
    }

    #[test]
    fn noise_stays_within_bounds() {
        let noisy = WaveProfile {
            amplitude: 0.0,
            dc_offset: 10.0,
            noise: 5.0,
            ..Default::default()
        };
        let pairs = generate_signals(AdcResolution::Bits10, noisy, noisy, 200);
        assert!(pairs.iter().all(|p| (517..=527).contains(&p.1)));
    }
}
