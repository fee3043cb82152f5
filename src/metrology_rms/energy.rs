use core::cell::Cell;

use super::types::WS_PER_KWH;

/// Monotonic millisecond tick, wrapping like an embedded `millis()` counter.
pub trait TimeSource {
    fn now_ms(&self) -> u32;
}

/// Clock advanced by hand, for simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub const fn new(start_ms: u32) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

/// Wall clock backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the same wrap-around an embedded tick counter has.
        self.origin.elapsed().as_millis() as u32
    }
}

/*
* @brief Energy accumulator fed at every publish.
* @note The accumulators hold raw window cross-product sums times elapsed
*       milliseconds; the publish stage applies the energy scale factor.
* @note Imported energy collects intervals with positive real power, exported
*       energy intervals with negative real power; the signed total is their
*       difference.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyIntegrator {
    last_ms: Option<u32>,
    total: f64,
    imported: f64,
    exported: f64,
}

impl EnergyIntegrator {
    pub const fn new() -> Self {
        Self {
            last_ms: None,
            total: 0.0,
            imported: 0.0,
            exported: 0.0,
        }
    }

    /*
    * @brief Integrate raw real power over the time since the previous call.
    * @param raw_power Window sum of channel products (unscaled real power).
    * @param now_ms Current tick.
    * @return Elapsed milliseconds used for this step, zero on the first call.
    */
    pub fn advance(&mut self, raw_power: i64, now_ms: u32) -> u32 {
        let elapsed = match self.last_ms {
            Some(last) => now_ms.wrapping_sub(last),
            None => 0,
        };
        self.last_ms = Some(now_ms);

        let step = raw_power as f64 * elapsed as f64;
        self.total += step;
        if step > 0.0 {
            self.imported += step;
        } else {
            self.exported -= step;
        }

        elapsed
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn total(&self, scale: f64) -> f64 {
        self.total * scale
    }

    pub fn imported(&self, scale: f64) -> f64 {
        self.imported * scale
    }

    pub fn exported(&self, scale: f64) -> f64 {
        self.exported * scale
    }
}

/// Watt-seconds to kilowatt-hours.
pub fn ws_to_kwh(energy_ws: f64) -> f64 {
    energy_ws / WS_PER_KWH
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_call_integrates_nothing() {
        let mut energy = EnergyIntegrator::new();
        assert_eq!(energy.advance(1_000, 5_000), 0);
        assert_eq!(energy.total(1.0), 0.0);
    }

    #[test]
    fn accumulates_power_times_elapsed() {
        let mut energy = EnergyIntegrator::new();
        energy.advance(50, 0);
        energy.advance(50, 1_000);
        energy.advance(-20, 1_500);

        assert_relative_eq!(energy.total(1.0), 50_000.0 - 10_000.0);
        assert_relative_eq!(energy.imported(1.0), 50_000.0);
        assert_relative_eq!(energy.exported(1.0), 10_000.0);
    }

    #[test]
    fn survives_tick_counter_wrap() {
        let mut energy = EnergyIntegrator::new();
        energy.advance(10, u32::MAX - 499);
        let elapsed = energy.advance(10, 500);

        assert_eq!(elapsed, 1_000);
        assert_relative_eq!(energy.total(1.0), 10_000.0);
    }

    #[test]
    fn reset_forgets_timestamp() {
        let mut energy = EnergyIntegrator::new();
        energy.advance(10, 0);
        energy.advance(10, 100);
        energy.reset();

        assert_eq!(energy.advance(10, 10_000), 0);
        assert_eq!(energy.total(1.0), 0.0);
    }

    #[test]
    fn manual_clock_advances_and_wraps() {
        let clock = ManualClock::new(u32::MAX);
        clock.advance(2);
        assert_eq!(clock.now_ms(), 1);
        clock.set(42);
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn kwh_conversion() {
        assert_relative_eq!(ws_to_kwh(3_600_000.0), 1.0);
    }
}
