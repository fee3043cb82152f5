use super::types::ScanMode;

/// Acquisition state of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,      // Not acquiring, no fresh data
    Acquiring, // Consuming samples
    Ready,     // Fresh snapshot waiting for publish
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState::Idle
    }
}

impl ScanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Acquiring => "acquiring",
            ScanState::Ready => "ready",
        }
    }
}

/// Owns every acquire/ready transition so all meter variants share one policy.
///
/// In continuous mode `Ready` keeps consuming samples; in single-scan mode it
/// pauses until the next `start()`. Only `acknowledge()` (publish) and
/// `start()` clear a pending `Ready`; `stop()` halts acquisition but keeps it.
#[derive(Debug, Clone, Copy)]
pub struct ScanController {
    mode: ScanMode,
    state: ScanState,
    halted: bool, // stop() while Ready
}

impl ScanController {
    pub const fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            state: ScanState::Idle,
            halted: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_acquiring(&self) -> bool {
        match self.state {
            ScanState::Acquiring => true,
            ScanState::Ready => self.mode == ScanMode::Continuous && !self.halted,
            ScanState::Idle => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ScanState::Ready
    }

    /// Back to the initial state with a (possibly new) scan mode.
    pub fn reset(&mut self, mode: ScanMode) {
        self.mode = mode;
        self.state = ScanState::Idle;
        self.halted = false;
    }

    pub fn start(&mut self) {
        self.state = ScanState::Acquiring;
        self.halted = false;
    }

    /// Halt acquisition. A fresh window stays `Ready` until published.
    pub fn stop(&mut self) {
        match self.state {
            ScanState::Ready => self.halted = true,
            _ => self.state = ScanState::Idle,
        }
    }

    /// Window boundary reached.
    pub fn complete_window(&mut self) {
        if self.state != ScanState::Idle {
            self.state = ScanState::Ready;
        }
    }

    /// Called by publish: the fresh-data flag is consumed.
    pub fn acknowledge(&mut self) {
        if self.state == ScanState::Ready {
            self.state = match self.mode {
                ScanMode::Continuous if !self.halted => ScanState::Acquiring,
                _ => ScanState::Idle,
            };
            self.halted = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let scan = ScanController::new(ScanMode::Single);
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(!scan.is_acquiring());
        assert!(!scan.is_ready());
    }

    #[test]
    fn single_scan_pauses_at_boundary() {
        let mut scan = ScanController::new(ScanMode::Single);
        scan.start();
        assert!(scan.is_acquiring());

        scan.complete_window();
        assert!(scan.is_ready());
        assert!(!scan.is_acquiring());

        scan.acknowledge();
        assert_eq!(scan.state(), ScanState::Idle);
    }

    #[test]
    fn continuous_scan_keeps_acquiring() {
        let mut scan = ScanController::new(ScanMode::Continuous);
        scan.start();
        scan.complete_window();
        assert!(scan.is_ready());
        assert!(scan.is_acquiring());

        scan.acknowledge();
        assert_eq!(scan.state(), ScanState::Acquiring);
    }

    #[test]
    fn acknowledge_without_fresh_data_changes_nothing() {
        let mut scan = ScanController::new(ScanMode::Continuous);
        scan.acknowledge();
        assert_eq!(scan.state(), ScanState::Idle);

        scan.start();
        scan.acknowledge();
        assert_eq!(scan.state(), ScanState::Acquiring);
    }

    #[test]
    fn stop_while_acquiring_goes_idle() {
        let mut scan = ScanController::new(ScanMode::Continuous);
        scan.start();
        scan.stop();
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(!scan.is_acquiring());
    }

    #[test]
    fn stop_keeps_unpublished_window_ready() {
        let mut scan = ScanController::new(ScanMode::Continuous);
        scan.start();
        scan.complete_window();
        scan.stop();
        assert!(scan.is_ready());
        assert!(!scan.is_acquiring());

        // No more windows may complete once halted
        scan.complete_window();
        assert!(scan.is_ready());

        scan.acknowledge();
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(!scan.is_acquiring());
    }

    #[test]
    fn start_clears_ready() {
        let mut scan = ScanController::new(ScanMode::Single);
        scan.start();
        scan.complete_window();
        scan.start();
        assert_eq!(scan.state(), ScanState::Acquiring);
    }
}
