const MSS: u64 = 1200;
const INITIAL_CWND: u64 = 14720;
const MINIMUM_WINDOW: u64 = 2 * MSS;

/// NewReno-style congestion controller. All arithmetic is integer; the
/// spec's "division by 2" for window reduction is a right shift.
pub struct NewRenoController {
    cwnd: u64,
    ssthresh: Option<u64>,
    in_recovery: bool,
}

impl Default for NewRenoController {
    fn default() -> Self {
        Self {
            cwnd: INITIAL_CWND,
            ssthresh: None,
            in_recovery: false,
        }
    }
}

impl NewRenoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwnd(&self) -> u64 {
        self.cwnd
    }

    pub fn is_in_recovery(&self) -> bool {
        self.in_recovery
    }

    pub fn on_packets_acked(&mut self, bytes_acked: u64) {
        match self.ssthresh {
            Some(ssthresh) if self.cwnd >= ssthresh => {
                self.cwnd += (MSS * bytes_acked / self.cwnd).max(1);
            }
            _ => {
                self.cwnd += bytes_acked;
            }
        }
    }

    /// Triggered on a detected loss or an ECN congestion-experienced
    /// signal. A no-op if recovery is already in progress, since NewReno
    /// reduces the window once per recovery episode.
    pub fn on_congestion_event(&mut self) {
        if self.in_recovery {
            return;
        }
        self.in_recovery = true;
        self.cwnd = (self.cwnd >> 1).max(MINIMUM_WINDOW);
        self.ssthresh = Some(self.cwnd);
    }

    pub fn on_congestion_event_acked(&mut self) {
        self.in_recovery = false;
    }

    pub fn on_persistent_congestion(&mut self) {
        self.cwnd = MINIMUM_WINDOW;
        self.in_recovery = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_start_grows_by_full_bytes_acked() {
        let mut c = NewRenoController::new();
        let before = c.cwnd();
        c.on_packets_acked(1200);
        assert_eq!(c.cwnd(), before + 1200);
    }

    #[test]
    fn congestion_event_halves_window_and_never_drops_below_minimum() {
        let mut c = NewRenoController::new();
        c.on_congestion_event();
        assert_eq!(c.cwnd(), INITIAL_CWND / 2);
        assert!(c.is_in_recovery());

        for _ in 0..20 {
            c.on_congestion_event();
        }
        assert!(c.cwnd() >= MINIMUM_WINDOW);
    }

    #[test]
    fn second_congestion_event_during_recovery_is_a_no_op() {
        let mut c = NewRenoController::new();
        c.on_congestion_event();
        let after_first = c.cwnd();
        c.on_congestion_event();
        assert_eq!(c.cwnd(), after_first);
    }

    #[test]
    fn persistent_congestion_resets_to_minimum() {
        let mut c = NewRenoController::new();
        c.on_congestion_event();
        c.on_persistent_congestion();
        assert_eq!(c.cwnd(), MINIMUM_WINDOW);
        assert!(!c.is_in_recovery());
    }
}
