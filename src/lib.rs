//! Decode and filter the RF measurement stream of a Cornet EMF detector.
//!
//! The detector streams one ASCII record per measurement over USB serial.
//! [`decode`] turns a record into a [`Reading`], [`filter`] decides from the
//! configured [`PolicyConfig`] whether it gets reported, and [`capture`] runs
//! the loop that ties both to the device and the outputs in [`exfil`].

pub mod args;
pub mod capture;
pub mod decode;
pub mod exfil;
pub mod filter;
pub mod magnitude;
pub mod monitoring;

pub use decode::{decode_record, shift_point, DecodeError, Reading};
pub use filter::{evaluate, should_report, BandRule, PolicyConfig, Verdict};
pub use magnitude::{Magnitude, MagnitudeError};
