use core::cell::RefCell;

use critical_section::Mutex;

/*
* @brief Meter shared between the sampling context and the consumer.
* @note The sampler (interrupt handler or timer thread) calls update() and the
*       consumer calls publish(), both through with(). Every access runs inside
*       a critical section, so a publish never sees a half-processed boundary.
* @note const constructible, so it can live in a static:
*       static METER: SharedMeter<RmsMeter> = SharedMeter::new(RmsMeter::new());
*/
pub struct SharedMeter<M> {
    inner: Mutex<RefCell<M>>,
}

impl<M> SharedMeter<M> {
    pub const fn new(meter: M) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(meter)),
        }
    }

    /// Run `f` with exclusive access to the meter.
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> M {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrology_rms::{AdcResolution, BiasRestore, Meter, RmsMeter, ScanMode};

    #[test]
    fn closure_sees_and_mutates_meter() {
        let shared = SharedMeter::new(RmsMeter::new());
        shared
            .with(|m| m.begin(10.0, 2, AdcResolution::Bits8, BiasRestore::Off, ScanMode::Single))
            .unwrap();
        shared.with(|m| m.start());
        shared.with(|m| {
            m.update(128);
            m.update(128);
        });

        assert!(shared.with(|m| m.is_ready()));
        assert_eq!(shared.with(|m| m.publish().rms), 5.0);
        assert!(!shared.into_inner().is_ready());
    }
}
