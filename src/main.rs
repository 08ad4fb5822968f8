use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use emf_slurper::{
    args::{convert_filter, Args},
    capture::{capture_records, open_session, report_end, LineReader, SessionError},
    exfil::{record_timestamp, Exfil},
    filter::{BandRule, PolicyConfig},
    monitoring::CaptureStats,
};
use tracing::{error, info, warn};

fn show_info(args: &Args, policy: &PolicyConfig) {
    info!(
        source = %args.source,
        baud = args.baud,
        "Reading data from your device (stop with Ctrl-C)"
    );
    if let Some(out) = &args.output {
        info!(output = %out.display(), "Appending to output file");
    }
    if let Some(alarm) = policy.alarm {
        info!(%alarm, "Alarm threshold");
    }
    if let Some(target) = policy.target {
        info!(band = target, "Target band");
    }
    if let Some(fmin) = policy.fmin {
        info!(fmin, "Minimum band");
    }
    if let Some(fmax) = policy.fmax {
        info!(fmax, "Maximum band");
    }
    if policy.is_empty() {
        info!("No filter set, reporting every reading");
    }
    if BandRule::from_policy(policy) == BandRule::Nothing {
        warn!("An alarm threshold without --target, --fmin or --fmax reports nothing");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(convert_filter(args.verbose.log_level_filter()))
        .with_writer(io::stderr)
        .init();

    let policy = args.policy();
    let settings = args.serial_settings();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let (port, archive) = match open_session(&settings, args.output.as_deref()) {
        Ok(opened) => opened,
        Err(SessionError::Device(e)) => {
            error!("{e}");
            error!("{}", e.hint());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    show_info(&args, &policy);

    let mut lines = LineReader::new(port);
    let mut exfil = Exfil::new(io::stdout(), archive);
    let mut stats = CaptureStats::default();
    let end = capture_records(&mut lines, &policy, &mut exfil, &mut stats, &running, || {
        record_timestamp(&Local::now())
    })
    .context("Capture failed")?;

    report_end(end);
    stats.log_summary();
    Ok(())
}
