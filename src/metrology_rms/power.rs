use super::accumulator::{WindowEngine, WindowEvent, WindowSnapshot};
use super::energy::{EnergyIntegrator, TimeSource};
use super::scaling::PowerScale;
use super::types::*;

pub fn calculate_apparent_power_from_rms(rms1: f64, rms2: f64) -> f64 {
    rms1 * rms2
}

/// NaN when either channel is silent.
pub fn calculate_power_factor_from_apparent_and_real_power(
    apparent_power: f64,
    real_power: f64,
) -> f64 {
    real_power / apparent_power
}

/*
* @brief Conversion of a frozen two channel window into calibrated outputs.
* @note Shared by PowerMeter and SplitPowerMeter. Owns the scale factors,
*       the energy accumulators and the last published outputs.
*/
#[derive(Debug, Clone)]
struct PublishStage {
    scale: PowerScale,
    energy: EnergyIntegrator,
    outputs: PowerOutputs,
}

impl PublishStage {
    const fn new() -> Self {
        Self {
            scale: PowerScale::ZERO,
            energy: EnergyIntegrator::new(),
            outputs: PowerOutputs {
                average1: 0.0,
                average2: 0.0,
                rms1: 0.0,
                rms2: 0.0,
                apparent_power: 0.0,
                real_power: 0.0,
                power_factor: 0.0,
                energy: 0.0,
                energy_imported: 0.0,
                energy_exported: 0.0,
            },
        }
    }

    fn configure(&mut self, range1: f64, range2: f64, window: u8, resolution: AdcResolution) {
        self.scale = PowerScale::new(range1, range2, window, resolution);
        self.energy.reset();
        self.outputs = PowerOutputs::default();
    }

    fn publish(&mut self, snapshot: &WindowSnapshot<2>, now_ms: u32) -> &PowerOutputs {
        let [ch1, ch2] = snapshot.channels;
        let [scale1, scale2] = self.scale.channels;

        let rms1 = scale1.rms(ch1.sum_sq);
        let rms2 = scale2.rms(ch2.sum_sq);
        let apparent_power = calculate_apparent_power_from_rms(rms1, rms2);
        let real_power = self.scale.real_power(snapshot.cross);

        // Energy advances on every publish, fresh window or not.
        let elapsed = self.energy.advance(snapshot.cross, now_ms);
        log::trace!(
            "publish: window {}, {} ms since last publish",
            snapshot.sequence,
            elapsed
        );

        self.outputs = PowerOutputs {
            average1: scale1.average(ch1.sum),
            average2: scale2.average(ch2.sum),
            rms1,
            rms2,
            apparent_power,
            real_power,
            power_factor: calculate_power_factor_from_apparent_and_real_power(
                apparent_power,
                real_power,
            ),
            energy: self.energy.total(self.scale.energy),
            energy_imported: self.energy.imported(self.scale.energy),
            energy_exported: self.energy.exported(self.scale.energy),
        };

        &self.outputs
    }
}

/*
* @brief Configuration, publish and energy access common to both power meters.
* @param $meter Meter type with `engine: WindowEngine<2>` and `stage: PublishStage`.
* @param $policy Boundary policy the meter runs its windows with.
*/
macro_rules! power_meter_front_end {
    ($meter:ident, $policy:expr) => {
        impl Default for $meter {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $meter {
            pub const fn new() -> Self {
                Self {
                    engine: WindowEngine::new(),
                    stage: PublishStage::new(),
                }
            }

            /*
            * @brief Configure the meter and reset the energy accumulators.
            * @param range1 Full-scale range of channel 1 (voltage).
            * @param range2 Full-scale range of channel 2 (current).
            * @param window Samples per window (1..=255).
            * @param resolution ADC bit depth.
            * @param bias Baseline restoration on both channels.
            * @param mode Single or continuous scanning.
            * @note On error the previous configuration stays in effect.
            */
            pub fn begin(
                &mut self,
                range1: f64,
                range2: f64,
                window: u8,
                resolution: AdcResolution,
                bias: BiasRestore,
                mode: ScanMode,
            ) -> Result<(), ConfigError> {
                let range1 = validate_range(range1)?;
                let range2 = validate_range(range2)?;
                let config = WindowConfig::new(window, resolution, bias, mode, $policy)?;

                self.stage.configure(range1, range2, window, resolution);
                self.engine.begin(config);
                Ok(())
            }

            pub fn publish<T: TimeSource + ?Sized>(&mut self, clock: &T) -> &PowerOutputs {
                self.publish_at(clock.now_ms())
            }

            /// Publish with an explicit millisecond tick.
            pub fn publish_at(&mut self, now_ms: u32) -> &PowerOutputs {
                self.stage.publish(self.engine.snapshot(), now_ms);
                self.engine.acknowledge();
                &self.stage.outputs
            }

            pub fn outputs(&self) -> &PowerOutputs {
                &self.stage.outputs
            }

            pub fn dc_bias(&self, channel: usize) -> i32 {
                self.engine.bias(channel)
            }

            pub fn last_sample(&self, channel: usize) -> i32 {
                self.engine.last_sample(channel)
            }

            /// Zero the energy totals; the next publish integrates nothing.
            pub fn reset_energy(&mut self) {
                self.stage.energy.reset();
            }
        }

        impl_meter!($meter);
    };
}

/// Voltage/current meter fed one synchronized sample pair per slot.
#[derive(Debug, Clone)]
pub struct PowerMeter {
    engine: WindowEngine<2>,
    stage: PublishStage,
}

power_meter_front_end!(PowerMeter, BoundaryPolicy::Immediate);

impl PowerMeter {
    #[inline]
    pub fn update(&mut self, sample1: u16, sample2: u16) -> Option<WindowEvent> {
        self.engine.update([sample1, sample2])
    }
}

/*
* @brief Voltage/current meter for a multiplexed converter.
* @note Each slot is fed in two calls: update_phase_a with channel 1, then
*       update_phase_b with channel 2. Bias correction always runs in an extra
*       slot after the window, so a window with restoration on takes W + 1 slots.
*/
#[derive(Debug, Clone)]
pub struct SplitPowerMeter {
    engine: WindowEngine<2>,
    stage: PublishStage,
}

power_meter_front_end!(SplitPowerMeter, BoundaryPolicy::ExtraSlot);

impl SplitPowerMeter {
    #[inline]
    pub fn update_phase_a(&mut self, sample1: u16) {
        self.engine.update_phase_a(sample1);
    }

    #[inline]
    pub fn update_phase_b(&mut self, sample2: u16) -> Option<WindowEvent> {
        self.engine.update_phase_b(sample2)
    }
}
