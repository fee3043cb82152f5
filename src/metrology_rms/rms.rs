use super::accumulator::{WindowEngine, WindowEvent};
use super::scaling::ChannelScale;
use super::types::*;

/*
* @brief True RMS meter for one channel with optional baseline restoration.
* @note new() corrects the bias in the boundary slot. deferred() spends one
*       extra slot per window on the correction, which keeps the per-sample
*       cost flat when update() runs inside an interrupt.
* @note With restoration on, the average reports the residual mean of the
*       bias-corrected samples.
*/
#[derive(Debug, Clone)]
pub struct RmsMeter {
    engine: WindowEngine<1>,
    policy: BoundaryPolicy,
    scale: ChannelScale,
    outputs: RmsOutputs,
}

impl Default for RmsMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl RmsMeter {
    pub const fn new() -> Self {
        Self::with_policy(BoundaryPolicy::Immediate)
    }

    pub const fn deferred() -> Self {
        Self::with_policy(BoundaryPolicy::ExtraSlot)
    }

    const fn with_policy(policy: BoundaryPolicy) -> Self {
        Self {
            engine: WindowEngine::new(),
            policy,
            scale: ChannelScale::ZERO,
            outputs: RmsOutputs {
                average: 0.0,
                mean_square: 0.0,
                rms: 0.0,
            },
        }
    }

    pub fn begin(
        &mut self,
        range: f64,
        window: u8,
        resolution: AdcResolution,
        bias: BiasRestore,
        mode: ScanMode,
    ) -> Result<(), ConfigError> {
        let range = validate_range(range)?;
        let config = WindowConfig::new(window, resolution, bias, mode, self.policy)?;

        self.scale = ChannelScale::new(range, window, resolution);
        self.outputs = RmsOutputs::default();
        self.engine.begin(config);
        Ok(())
    }

    #[inline]
    pub fn update(&mut self, raw: u16) -> Option<WindowEvent> {
        self.engine.update([raw])
    }

    pub fn publish(&mut self) -> &RmsOutputs {
        let sums = self.engine.snapshot().channels[0];

        let mean_square = self.scale.mean_square(sums.sum_sq);
        self.outputs = RmsOutputs {
            average: self.scale.average(sums.sum),
            mean_square,
            rms: libm::sqrt(mean_square),
        };

        self.engine.acknowledge();
        &self.outputs
    }

    pub fn outputs(&self) -> &RmsOutputs {
        &self.outputs
    }

    pub fn dc_bias(&self) -> i32 {
        self.engine.bias(0)
    }

    pub fn last_sample(&self) -> i32 {
        self.engine.last_sample(0)
    }
}

impl_meter!(RmsMeter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrology_rms::Meter;

    fn run_window(meter: &mut RmsMeter, raw: u16, slots: usize) {
        for _ in 0..slots {
            meter.update(raw);
        }
    }

    #[test]
    fn mid_scale_dc_without_restoration() {
        let mut meter = RmsMeter::new();
        meter.begin(10.0, 4, AdcResolution::Bits8, BiasRestore::Off, ScanMode::Single).unwrap();
        meter.start();
        run_window(&mut meter, 128, 4);

        let out = meter.publish();
        assert_eq!(out.mean_square, 25.0);
        assert_eq!(out.rms, 5.0);
    }

    #[test]
    fn restoration_removes_dc_from_rms() {
        let mut meter = RmsMeter::new();
        meter.begin(10.0, 8, AdcResolution::Bits8, BiasRestore::On, ScanMode::Continuous).unwrap();
        meter.start();
        run_window(&mut meter, 150, 8 * 20);

        assert_eq!(meter.dc_bias(), 150);
        assert_eq!(meter.publish().rms, 0.0);
        assert_eq!(meter.last_sample(), 0);
    }

    #[test]
    fn deferred_meter_needs_one_extra_slot() {
        let mut meter = RmsMeter::deferred();
        meter.begin(10.0, 4, AdcResolution::Bits8, BiasRestore::On, ScanMode::Single).unwrap();
        meter.start();

        run_window(&mut meter, 128, 4);
        assert!(!meter.is_ready());
        assert_eq!(meter.sample_index(), 4);

        meter.update(128);
        assert!(meter.is_ready());
        assert!(!meter.is_acquiring());
        assert_eq!(meter.sample_index(), 0);
    }

    #[test]
    fn deferred_meter_without_restoration_has_plain_window() {
        let mut meter = RmsMeter::deferred();
        meter.begin(10.0, 4, AdcResolution::Bits8, BiasRestore::Off, ScanMode::Single).unwrap();
        meter.start();
        run_window(&mut meter, 128, 4);
        assert!(meter.is_ready());
        assert_eq!(meter.publish().rms, 5.0);
    }

    #[test]
    fn rejects_non_positive_range() {
        let mut meter = RmsMeter::new();
        let err = meter.begin(-1.0, 4, AdcResolution::Bits8, BiasRestore::Off, ScanMode::Single);
        assert_eq!(err, Err(ConfigError::InvalidRange(-1.0)));
    }
}
