//! In this module, we keep the runtime stats for a capture session.
//! Nothing here affects what gets reported, the counters are only logged
//! when the session ends.

use tracing::info;

use crate::filter::Verdict;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Lines received from the device
    pub lines: u64,
    /// Lines that failed to decode
    pub malformed: u64,
    /// Readings under the alarm threshold
    pub suppressed: u64,
    /// Readings whose band didn't match
    pub unmatched: u64,
    pub reported: u64,
}

impl CaptureStats {
    pub fn record_malformed(&mut self) {
        self.lines += 1;
        self.malformed += 1;
    }

    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.lines += 1;
        match verdict {
            Verdict::Report => self.reported += 1,
            Verdict::Suppressed => self.suppressed += 1,
            Verdict::NoMatch => self.unmatched += 1,
        }
    }

    pub fn log_summary(&self) {
        info!(
            lines = self.lines,
            malformed = self.malformed,
            suppressed = self.suppressed,
            unmatched = self.unmatched,
            reported = self.reported,
            "Capture session finished"
        );
    }
}
