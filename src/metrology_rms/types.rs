use thiserror::Error;

/// Weight given to the newest window in the baseline restoration filter.
pub const BIAS_FILTER_ALPHA: f64 = 0.7;

pub const MIN_WINDOW: u8 = 1;

/// Milliseconds per second, the energy accumulator integrates raw power over ms.
pub const MS_PER_SECOND: f64 = 1000.0;

/// Watt-seconds in one kilowatt-hour.
pub const WS_PER_KWH: f64 = 3600.0 * 1000.0;

/// Errors raised while configuring a meter.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("window length must be between 1 and 255 samples")]
    ZeroWindow,

    #[error("full-scale range must be finite and positive, got {0}")]
    InvalidRange(f64),

    #[error("unsupported ADC resolution: {0} bits (expected 8, 10 or 12)")]
    UnsupportedResolution(u8),
}

/// Bit depth of the converter feeding the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcResolution {
    Bits8,
    Bits10,
    Bits12,
}

impl AdcResolution {
    pub fn from_bits(bits: u8) -> Result<Self, ConfigError> {
        match bits {
            8 => Ok(AdcResolution::Bits8),
            10 => Ok(AdcResolution::Bits10),
            12 => Ok(AdcResolution::Bits12),
            other => Err(ConfigError::UnsupportedResolution(other)),
        }
    }

    pub const fn bits(&self) -> u32 {
        match self {
            AdcResolution::Bits8 => 8,
            AdcResolution::Bits10 => 10,
            AdcResolution::Bits12 => 12,
        }
    }

    /// Number of distinct codes, 2^bits.
    pub const fn full_scale(&self) -> u32 {
        1 << self.bits()
    }

    /// Starting value of the bias register.
    pub const fn mid_scale(&self) -> i32 {
        (self.full_scale() / 2) as i32
    }

    /// Largest code the converter can produce.
    pub const fn max_code(&self) -> i32 {
        self.full_scale() as i32 - 1
    }
}

impl Default for AdcResolution {
    fn default() -> Self {
        AdcResolution::Bits10
    }
}

/// Baseline (DC bias) restoration switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasRestore {
    On,
    Off,
}

impl BiasRestore {
    pub fn is_on(&self) -> bool {
        matches!(self, BiasRestore::On)
    }
}

impl From<bool> for BiasRestore {
    fn from(on: bool) -> Self {
        if on {
            BiasRestore::On
        } else {
            BiasRestore::Off
        }
    }
}

/// Whether acquisition pauses after each completed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Single,
    Continuous,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Single => "single-scan",
            ScanMode::Continuous => "continuous-scan",
        }
    }
}

/// Where the bias correction step happens relative to the window boundary.
///
/// `ExtraSlot` spends one more sample slot per window on the correction so the
/// work is spread over two calls; it has no effect while bias restoration is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    Immediate,
    ExtraSlot,
}

/// Window geometry shared by every meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    pub window: u8,                  // Samples per window
    pub resolution: AdcResolution,   // ADC bit depth
    pub bias: BiasRestore,           // Baseline restoration switch
    pub mode: ScanMode,              // Single or continuous scanning
    pub policy: BoundaryPolicy,      // Placement of the bias correction step
}

impl WindowConfig {
    pub fn new(
        window: u8,
        resolution: AdcResolution,
        bias: BiasRestore,
        mode: ScanMode,
        policy: BoundaryPolicy,
    ) -> Result<Self, ConfigError> {
        if window < MIN_WINDOW {
            return Err(ConfigError::ZeroWindow);
        }

        Ok(Self {
            window,
            resolution,
            bias,
            mode,
            policy,
        })
    }

    /// True when the correction runs in its own slot after the window.
    pub fn uses_extra_slot(&self) -> bool {
        self.bias.is_on() && self.policy == BoundaryPolicy::ExtraSlot
    }

    /// Sample slots consumed per window, W or W+1.
    pub fn slots_per_window(&self) -> u16 {
        self.window as u16 + self.uses_extra_slot() as u16
    }
}

/// Reject ranges that would poison the precomputed scale factors.
pub fn validate_range(range: f64) -> Result<f64, ConfigError> {
    if range.is_finite() && range > 0.0 {
        Ok(range)
    } else {
        Err(ConfigError::InvalidRange(range))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AverageOutputs {
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RmsOutputs {
    pub average: f64,
    pub mean_square: f64,
    pub rms: f64,
}

/// Calibrated results of a two channel (voltage/current) meter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerOutputs {
    pub average1: f64,
    pub average2: f64,
    pub rms1: f64,
    pub rms2: f64,
    pub apparent_power: f64,
    pub real_power: f64,
    pub power_factor: f64,   // NaN when apparent power is zero
    pub energy: f64,         // Signed total in W·s
    pub energy_imported: f64,
    pub energy_exported: f64,
}
