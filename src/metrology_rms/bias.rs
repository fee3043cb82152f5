use super::types::{AdcResolution, BIAS_FILTER_ALPHA};

/*
* @brief DC bias (baseline) tracker for one channel.
* @note The register starts at ADC mid-scale and is driven by a discrete
*       integral controller: the exponentially filtered window sum, divided by
*       the window length and rounded, is added once per window.
* @note The register is clamped to the converter's code range.
*/
#[derive(Debug, Clone, Copy)]
pub struct BiasTracker {
    register: i32,
    filtered_sum: f64,
    max_code: i32,
}

impl BiasTracker {
    pub const fn new(resolution: AdcResolution) -> Self {
        Self {
            register: resolution.mid_scale(),
            filtered_sum: 0.0,
            max_code: resolution.max_code(),
        }
    }

    pub fn register(&self) -> i32 {
        self.register
    }

    pub fn filtered_sum(&self) -> f64 {
        self.filtered_sum
    }

    /// Raw code minus the current bias estimate.
    #[inline]
    pub fn correct(&self, raw: u16) -> i32 {
        raw as i32 - self.register
    }

    /*
    * @brief Fold the just-completed window into the filtered sum.
    * @param window_sum Sum of the bias-corrected samples of the window.
    */
    pub fn observe(&mut self, window_sum: i64) {
        self.filtered_sum =
            BIAS_FILTER_ALPHA * window_sum as f64 + (1.0 - BIAS_FILTER_ALPHA) * self.filtered_sum;
    }

    /*
    * @brief Move the register by the rounded per-sample filtered mean.
    * @param window Number of samples in the window.
    * @return The correction actually applied after clamping.
    */
    pub fn apply(&mut self, window: u8) -> i32 {
        let step = libm::round(self.filtered_sum / window as f64) as i32;
        let target = self.register.saturating_add(step);
        let clamped = target.clamp(0, self.max_code);

        if clamped != target {
            log::warn!(
                "bias register saturated at {} (requested {}), check sensor offset",
                clamped,
                target
            );
        }

        let applied = clamped - self.register;
        self.register = clamped;
        applied
    }

    /// Immediate variant: observe and apply in the same slot.
    pub fn update(&mut self, window_sum: i64, window: u8) -> i32 {
        self.observe(window_sum);
        self.apply(window)
    }
}
