//! Argument parsing for running from the command line

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use clap_verbosity_flag::InfoLevel;

use crate::{capture::SerialSettings, filter::PolicyConfig, magnitude::Magnitude};

const EXAMPLES: &str = "EXAMPLES:
    emf_slurper --source=/dev/ttyUSB1
    emf_slurper --output=test_output
    emf_slurper --alarm=0.352 --target=2400
    emf_slurper -a=0.352 -n=52 -x=2800
    emf_slurper -a=0.352 -t=2400 -o=test_output";

/// Read and filter RF measurements from a Cornet EMF detector (tested on the ED88T plus)
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, after_help = EXAMPLES)]
pub struct Args {
    /// Serial device of the detector (see dmesg | grep tty)
    #[clap(short, long, default_value = "/dev/ttyUSB0")]
    pub source: String,
    /// File to append reported readings to
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Minimum magnitude for a reading to be kept (ie: 0.352)
    #[clap(short, long, value_parser = valid_magnitude)]
    pub alarm: Option<Magnitude>,
    /// Exact frequency band to keep (ie: 2400)
    #[clap(short, long, value_parser = clap::value_parser!(u16))]
    pub target: Option<u16>,
    /// Minimum frequency band to keep, inclusive (ie: 700)
    #[clap(short = 'n', long, value_parser = clap::value_parser!(u16))]
    pub fmin: Option<u16>,
    /// Maximum frequency band to keep, inclusive (ie: 2600)
    #[clap(short = 'x', long, value_parser = clap::value_parser!(u16))]
    pub fmax: Option<u16>,
    /// Serial baud rate
    #[clap(short, long, default_value_t = 9600)]
    #[clap(value_parser = clap::value_parser!(u32).range(1..))]
    pub baud: u32,
    /// Seconds without data before giving up
    #[clap(long, default_value_t = 3)]
    #[clap(value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

impl Args {
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            alarm: self.alarm,
            target: self.target,
            fmin: self.fmin,
            fmax: self.fmax,
        }
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            path: self.source.clone(),
            baud: self.baud,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}

fn valid_magnitude(s: &str) -> Result<Magnitude, String> {
    s.parse().map_err(|e| format!("Invalid magnitude: {e}"))
}
