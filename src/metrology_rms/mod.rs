/// `Meter` for a meter whose samples flow through an `engine: WindowEngine<N>` field.
macro_rules! impl_meter {
    ($meter:ty) => {
        impl $crate::metrology_rms::Meter for $meter {
            fn scan(&self) -> &$crate::metrology_rms::ScanController {
                self.engine.scan()
            }

            fn sample_index(&self) -> u16 {
                self.engine.sample_index()
            }

            fn start(&mut self) {
                self.engine.start();
            }

            fn stop(&mut self) {
                self.engine.stop();
            }
        }
    };
}

pub mod types;
pub mod scan;
pub mod bias;
pub mod accumulator;
pub mod scaling;
pub mod energy;
pub mod average;
pub mod rms;
pub mod power;
pub mod shared;
pub mod print;
#[cfg(feature = "std")]
pub mod generate_signal;

pub use accumulator::{ChannelSums, WindowEngine, WindowEvent, WindowSnapshot};
pub use average::AverageMeter;
pub use bias::BiasTracker;
pub use energy::{ws_to_kwh, EnergyIntegrator, ManualClock, TimeSource};
#[cfg(feature = "std")]
pub use energy::StdClock;
pub use power::{PowerMeter, SplitPowerMeter};
pub use rms::RmsMeter;
pub use scan::{ScanController, ScanState};
pub use shared::SharedMeter;
pub use types::{
    AdcResolution, AverageOutputs, BiasRestore, BoundaryPolicy, ConfigError, PowerOutputs,
    RmsOutputs, ScanMode, WindowConfig,
};

/// Acquisition control shared by every meter.
pub trait Meter {
    fn scan(&self) -> &ScanController;

    /// Slots accumulated in the current window.
    fn sample_index(&self) -> u16;

    /// Begin acquiring a fresh window.
    fn start(&mut self);

    /// Halt acquisition. A window frozen but not yet published stays ready;
    /// sums of an interrupted window are dropped on the next start().
    fn stop(&mut self);

    fn state(&self) -> ScanState {
        self.scan().state()
    }

    fn is_acquiring(&self) -> bool {
        self.scan().is_acquiring()
    }

    /// A frozen window is waiting for publish().
    fn is_ready(&self) -> bool {
        self.scan().is_ready()
    }
}
