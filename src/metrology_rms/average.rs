use super::accumulator::{WindowEngine, WindowEvent};
use super::scaling::ChannelScale;
use super::types::*;

/// Windowed average of one channel, no baseline restoration.
#[derive(Debug, Clone)]
pub struct AverageMeter {
    engine: WindowEngine<1>,
    scale: ChannelScale,
    outputs: AverageOutputs,
}

impl Default for AverageMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl AverageMeter {
    pub const fn new() -> Self {
        Self {
            engine: WindowEngine::new(),
            scale: ChannelScale::ZERO,
            outputs: AverageOutputs { average: 0.0 },
        }
    }

    /*
    * @brief Configure the meter.
    * @param range Full-scale physical range of the input.
    * @param window Samples per window (1..=255).
    * @param resolution ADC bit depth.
    * @param mode Single or continuous scanning.
    */
    pub fn begin(
        &mut self,
        range: f64,
        window: u8,
        resolution: AdcResolution,
        mode: ScanMode,
    ) -> Result<(), ConfigError> {
        let range = validate_range(range)?;
        let config = WindowConfig::new(
            window,
            resolution,
            BiasRestore::Off,
            mode,
            BoundaryPolicy::Immediate,
        )?;

        self.scale = ChannelScale::new(range, window, resolution);
        self.outputs = AverageOutputs::default();
        self.engine.begin(config);
        Ok(())
    }

    #[inline]
    pub fn update(&mut self, raw: u16) -> Option<WindowEvent> {
        self.engine.update([raw])
    }

    /// Convert the last frozen window and consume the ready flag.
    pub fn publish(&mut self) -> &AverageOutputs {
        let snapshot = self.engine.snapshot();
        self.outputs.average = self.scale.average(snapshot.channels[0].sum);
        self.engine.acknowledge();
        &self.outputs
    }

    pub fn outputs(&self) -> &AverageOutputs {
        &self.outputs
    }

    pub fn last_sample(&self) -> i32 {
        self.engine.last_sample(0)
    }
}

impl_meter!(AverageMeter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrology_rms::Meter;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_scale_codes_average_just_below_range() {
        let mut meter = AverageMeter::new();
        meter.begin(10.0, 4, AdcResolution::Bits8, ScanMode::Single).unwrap();
        meter.start();

        for _ in 0..4 {
            meter.update(255);
        }
        assert!(meter.is_ready());

        let average = meter.publish().average;
        assert_abs_diff_eq!(average, 9.961, epsilon = 1e-3);
        assert!(!meter.is_ready());
    }

    #[test]
    fn outputs_hold_until_next_publish() {
        let mut meter = AverageMeter::new();
        meter.begin(5.0, 2, AdcResolution::Bits10, ScanMode::Continuous).unwrap();
        meter.start();
        meter.update(512);
        meter.update(512);
        meter.publish();
        let first = *meter.outputs();

        meter.update(1023);
        meter.update(1023);
        assert_eq!(*meter.outputs(), first);
        assert!(meter.publish().average > first.average);
    }

    #[test]
    fn rejects_zero_window_and_keeps_configuration() {
        let mut meter = AverageMeter::new();
        meter.begin(5.0, 2, AdcResolution::Bits10, ScanMode::Continuous).unwrap();
        assert_eq!(
            meter.begin(5.0, 0, AdcResolution::Bits10, ScanMode::Continuous),
            Err(ConfigError::ZeroWindow)
        );

        meter.start();
        meter.update(100);
        meter.update(100);
        assert!(meter.is_ready());
    }
}
