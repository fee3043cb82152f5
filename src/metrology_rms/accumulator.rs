use super::bias::BiasTracker;
use super::scan::{ScanController, ScanState};
use super::types::{AdcResolution, ScanMode, WindowConfig};

/// Running (or frozen) sums of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSums {
    pub sum: i64,
    pub sum_sq: u64,
}

impl ChannelSums {
    pub const ZERO: ChannelSums = ChannelSums { sum: 0, sum_sq: 0 };

    #[inline]
    fn add(&mut self, value: i32) {
        self.sum += value as i64;
        self.sum_sq += (value as i64 * value as i64) as u64;
    }
}

/// Sums frozen at the last window boundary, read by the publish stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot<const N: usize> {
    pub channels: [ChannelSums; N],
    pub cross: i64,     // Sum of ch1 * ch2, zero for single channel engines
    pub sequence: u32,  // Number of windows frozen since begin()
}

impl<const N: usize> WindowSnapshot<N> {
    pub const EMPTY: Self = WindowSnapshot {
        channels: [ChannelSums::ZERO; N],
        cross: 0,
        sequence: 0,
    };
}

/// What a sample call did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Sums frozen, the bias correction slot is still pending.
    Snapshot,
    /// Boundary transition done, sample index back at zero.
    Completed,
}

#[inline]
fn cross_term(values: &[i32]) -> i64 {
    match values {
        [a, b] => *a as i64 * *b as i64,
        _ => 0,
    }
}

/*
* @brief Windowed accumulation engine over N synchronized channels.
* @note One engine backs every meter: N = 1 for average/RMS, N = 2 for power.
*       Samples are fed either in one call per slot (update) or, for N = 2,
*       in two calls per slot (update_phase_a then update_phase_b).
* @note The engine is a plain state transformer; callers sharing it between an
*       interrupt and a main loop go through SharedMeter.
*/
#[derive(Debug, Clone)]
pub struct WindowEngine<const N: usize> {
    config: Option<WindowConfig>,
    scan: ScanController,
    index: u16,
    running: [ChannelSums; N],
    running_cross: i64,
    snapshot: WindowSnapshot<N>,
    bias: [BiasTracker; N],
    last: [i32; N],
    pending_a: i32,
}

impl<const N: usize> Default for WindowEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> WindowEngine<N> {
    pub const fn new() -> Self {
        Self {
            config: None,
            scan: ScanController::new(ScanMode::Continuous),
            index: 0,
            running: [ChannelSums::ZERO; N],
            running_cross: 0,
            snapshot: WindowSnapshot::EMPTY,
            bias: [BiasTracker::new(AdcResolution::Bits10); N],
            last: [0; N],
            pending_a: 0,
        }
    }

    /*
    * @brief Apply a configuration and return every register to its initial value.
    * @param config Validated window configuration.
    * @note Running sums, snapshot, sample index and bias registers are reset;
    *       the scan state returns to Idle.
    */
    pub fn begin(&mut self, config: WindowConfig) {
        self.config = Some(config);
        self.scan.reset(config.mode);
        self.index = 0;
        self.running = [ChannelSums::ZERO; N];
        self.running_cross = 0;
        self.snapshot = WindowSnapshot::EMPTY;
        self.bias = [BiasTracker::new(config.resolution); N];
        self.last = [0; N];
        self.pending_a = 0;

        log::debug!(
            "window engine configured: {} channel(s), W={}, {} bits, bias {:?}, {}",
            N,
            config.window,
            config.resolution.bits(),
            config.bias,
            config.mode.as_str()
        );
    }

    /// Start acquiring; partial sums of an interrupted window are discarded.
    pub fn start(&mut self) {
        if self.config.is_none() {
            log::warn!("start() called before begin(), ignoring");
            return;
        }

        self.discard_partial();
        self.scan.start();
        log::debug!("acquisition started");
    }

    /*
    * @brief Halt accumulation; partial sums stay until the next start().
    * @note A window still waiting for its correction slot is closed here, so
    *       its bias update is applied and the window is flagged ready.
    *       An unpublished ready window stays ready.
    */
    pub fn stop(&mut self) {
        if let Some(config) = self.active_config() {
            if self.in_correction_slot(&config) {
                self.run_correction_slot(&config);
            }
        }

        log::debug!(
            "acquisition stopped while {} at sample index {}",
            self.scan.state().as_str(),
            self.index
        );
        self.scan.stop();
    }

    /*
    * @brief Feed one sample slot, one raw code per channel.
    * @param frame Raw ADC codes, channel order.
    * @return The window event this slot caused, if any.
    * @note No-op unless acquiring.
    */
    pub fn update(&mut self, frame: [u16; N]) -> Option<WindowEvent> {
        let config = self.active_config()?;

        if self.in_correction_slot(&config) {
            return Some(self.run_correction_slot(&config));
        }

        let mut corrected = [0i32; N];
        for (ch, &raw) in frame.iter().enumerate() {
            corrected[ch] = self.accept(ch, raw, &config);
        }
        self.running_cross += cross_term(&corrected);

        self.advance(&config)
    }

    pub fn scan(&self) -> &ScanController {
        &self.scan
    }

    pub fn state(&self) -> ScanState {
        self.scan.state()
    }

    pub fn is_acquiring(&self) -> bool {
        self.scan.is_acquiring()
    }

    pub fn is_ready(&self) -> bool {
        self.scan.is_ready()
    }

    /// Consume the ready flag; only the publish stage calls this.
    pub fn acknowledge(&mut self) {
        self.scan.acknowledge();
    }

    pub fn sample_index(&self) -> u16 {
        self.index
    }

    pub fn snapshot(&self) -> &WindowSnapshot<N> {
        &self.snapshot
    }

    /// Current DC bias register of a channel.
    pub fn bias(&self, channel: usize) -> i32 {
        self.bias[channel].register()
    }

    pub fn filtered_sum(&self, channel: usize) -> f64 {
        self.bias[channel].filtered_sum()
    }

    /// Last accepted sample of a channel, bias-corrected when restoration is on.
    pub fn last_sample(&self, channel: usize) -> i32 {
        self.last[channel]
    }

    fn active_config(&self) -> Option<WindowConfig> {
        match self.config {
            Some(config) if self.scan.is_acquiring() => Some(config),
            _ => None,
        }
    }

    fn in_correction_slot(&self, config: &WindowConfig) -> bool {
        config.uses_extra_slot() && self.index == config.window as u16
    }

    fn discard_partial(&mut self) {
        self.index = 0;
        self.running = [ChannelSums::ZERO; N];
        self.running_cross = 0;
        self.pending_a = 0;
    }

    #[inline]
    fn accept(&mut self, channel: usize, raw: u16, config: &WindowConfig) -> i32 {
        let value = if config.bias.is_on() {
            self.bias[channel].correct(raw)
        } else {
            raw as i32
        };

        self.running[channel].add(value);
        self.last[channel] = value;
        value
    }

    /*
    * @brief Count the slot just accumulated and handle the window boundary.
    * @note With the extra slot policy the bias filter sees the window here but
    *       the register update, the reset and the scan transition wait for the
    *       next slot.
    */
    fn advance(&mut self, config: &WindowConfig) -> Option<WindowEvent> {
        self.index += 1;
        if self.index < config.window as u16 {
            return None;
        }

        self.snapshot = WindowSnapshot {
            channels: self.running,
            cross: self.running_cross,
            sequence: self.snapshot.sequence.wrapping_add(1),
        };

        if config.uses_extra_slot() {
            for (tracker, sums) in self.bias.iter_mut().zip(self.running.iter()) {
                tracker.observe(sums.sum);
            }
            return Some(WindowEvent::Snapshot);
        }

        if config.bias.is_on() {
            for (tracker, sums) in self.bias.iter_mut().zip(self.running.iter()) {
                tracker.update(sums.sum, config.window);
            }
        }

        self.finish_window();
        Some(WindowEvent::Completed)
    }

    fn run_correction_slot(&mut self, config: &WindowConfig) -> WindowEvent {
        for tracker in self.bias.iter_mut() {
            tracker.apply(config.window);
        }

        self.finish_window();
        WindowEvent::Completed
    }

    fn finish_window(&mut self) {
        self.discard_partial();
        self.scan.complete_window();
        log::trace!("window {} complete", self.snapshot.sequence);
    }
}

impl WindowEngine<2> {
    /*
    * @brief First half of a sample slot on a multiplexed converter.
    * @param raw Channel 1 code.
    * @note Never completes a window. Must be followed by update_phase_b for the
    *       same slot, otherwise the next cross product pairs stale values.
    */
    pub fn update_phase_a(&mut self, raw: u16) {
        let Some(config) = self.active_config() else {
            return;
        };

        // The correction slot belongs to phase B.
        if self.in_correction_slot(&config) {
            return;
        }

        self.pending_a = self.accept(0, raw, &config);
    }

    /*
    * @brief Second half of a sample slot: channel 2, cross product and boundary.
    * @param raw Channel 2 code.
    * @return The window event this slot caused, if any.
    */
    pub fn update_phase_b(&mut self, raw: u16) -> Option<WindowEvent> {
        let config = self.active_config()?;

        if self.in_correction_slot(&config) {
            return Some(self.run_correction_slot(&config));
        }

        let b = self.accept(1, raw, &config);
        self.running_cross += self.pending_a as i64 * b as i64;

        self.advance(&config)
    }
}
