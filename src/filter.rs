//! Report policy for decoded readings.
//!
//! A reading first has to clear the alarm threshold, then its band is checked
//! against a single [`BandRule`] picked from the configured policy. The order
//! in which the rule is picked matters: a target band overrides the range
//! bounds, and an alarm threshold on its own never reports anything.

use crate::{decode::Reading, magnitude::Magnitude};

/// Runtime filter configuration, fixed for one session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Minimum magnitude for a reading to be considered at all
    pub alarm: Option<Magnitude>,
    /// Exact band to match
    pub target: Option<u16>,
    /// Inclusive lower band bound
    pub fmin: Option<u16>,
    /// Inclusive upper band bound
    pub fmax: Option<u16>,
}

impl PolicyConfig {
    pub fn is_empty(&self) -> bool {
        self.alarm.is_none() && self.target.is_none() && self.fmin.is_none() && self.fmax.is_none()
    }

    /// True if the alarm gate lets this magnitude through
    pub fn alarmed(&self, magnitude: Magnitude) -> bool {
        self.alarm.map_or(true, |alarm| magnitude >= alarm)
    }
}

/// The band check derived from a [`PolicyConfig`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandRule {
    Target(u16),
    AtLeast(u16),
    AtMost(u16),
    Within(u16, u16),
    /// Nothing configured, everything goes
    Everything,
    /// Alarm threshold without any band filter
    Nothing,
}

impl BandRule {
    /// Pick the rule for a policy. The arms are checked top to bottom.
    pub fn from_policy(policy: &PolicyConfig) -> Self {
        match (policy.target, policy.fmin, policy.fmax) {
            (Some(target), _, _) => BandRule::Target(target),
            (None, Some(fmin), None) => BandRule::AtLeast(fmin),
            (None, None, Some(fmax)) => BandRule::AtMost(fmax),
            (None, Some(fmin), Some(fmax)) => BandRule::Within(fmin, fmax),
            (None, None, None) if policy.alarm.is_none() => BandRule::Everything,
            (None, None, None) => BandRule::Nothing,
        }
    }

    pub fn matches(&self, band: u16) -> bool {
        match *self {
            BandRule::Target(target) => band == target,
            BandRule::AtLeast(fmin) => band >= fmin,
            BandRule::AtMost(fmax) => band <= fmax,
            BandRule::Within(fmin, fmax) => (fmin..=fmax).contains(&band),
            BandRule::Everything => true,
            BandRule::Nothing => false,
        }
    }
}

/// Outcome of evaluating one reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Emit the reading
    Report,
    /// Magnitude below the alarm threshold
    Suppressed,
    /// Cleared the alarm gate but the band didn't match
    NoMatch,
}

impl Verdict {
    pub fn is_report(&self) -> bool {
        matches!(self, Verdict::Report)
    }
}

/// Evaluate a reading against the policy
pub fn evaluate(reading: &Reading, policy: &PolicyConfig) -> Verdict {
    if !policy.alarmed(reading.magnitude) {
        return Verdict::Suppressed;
    }
    if BandRule::from_policy(policy).matches(reading.band) {
        Verdict::Report
    } else {
        Verdict::NoMatch
    }
}

/// Shorthand for `evaluate(..).is_report()`
pub fn should_report(reading: &Reading, policy: &PolicyConfig) -> bool {
    evaluate(reading, policy).is_report()
}
