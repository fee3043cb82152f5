use super::types::{AdcResolution, MS_PER_SECOND};

/*
* @brief Scale factors for one channel, computed once per begin().
* @note value:   range / (W * 2^bits), applied to a window sum gives the average.
* @note squared: range^2 / (W * 2^(2*bits)), applied to a window sum of squares
*       gives the mean square.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelScale {
    pub value: f64,
    pub squared: f64,
}

impl ChannelScale {
    pub const ZERO: ChannelScale = ChannelScale { value: 0.0, squared: 0.0 };

    pub fn new(range: f64, window: u8, resolution: AdcResolution) -> Self {
        let window = window as f64;
        let full_scale = resolution.full_scale() as f64;

        ChannelScale {
            value: range / (window * full_scale),
            squared: (range * range) / (window * full_scale * full_scale),
        }
    }

    pub fn average(&self, window_sum: i64) -> f64 {
        window_sum as f64 * self.value
    }

    pub fn mean_square(&self, window_sum_sq: u64) -> f64 {
        window_sum_sq as f64 * self.squared
    }

    pub fn rms(&self, window_sum_sq: u64) -> f64 {
        libm::sqrt(self.mean_square(window_sum_sq))
    }
}

/*
* @brief Scale factors of a two channel meter.
* @note cross:  (range1 / 2^bits) * (range2 / 2^bits) / W, turns the window sum of
*               products into real power.
* @note energy: cross / 1000, turns the raw power * milliseconds accumulator into W·s.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerScale {
    pub channels: [ChannelScale; 2],
    pub cross: f64,
    pub energy: f64,
}

impl PowerScale {
    pub const ZERO: PowerScale = PowerScale {
        channels: [ChannelScale::ZERO; 2],
        cross: 0.0,
        energy: 0.0,
    };

    pub fn new(range1: f64, range2: f64, window: u8, resolution: AdcResolution) -> Self {
        let full_scale = resolution.full_scale() as f64;
        let lsb1 = range1 / full_scale;
        let lsb2 = range2 / full_scale;
        let cross = lsb1 * lsb2 / window as f64;

        PowerScale {
            channels: [
                ChannelScale::new(range1, window, resolution),
                ChannelScale::new(range2, window, resolution),
            ],
            cross,
            energy: cross / MS_PER_SECOND,
        }
    }

    pub fn real_power(&self, window_cross: i64) -> f64 {
        window_cross as f64 * self.cross
    }
}
