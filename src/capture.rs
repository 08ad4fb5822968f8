//! This module contains all the capture logic

// One line at a time: read it from the serial port, decode it, run it through
// the policy, emit it if it passes. Nothing is buffered between records.

use std::{
    collections::VecDeque,
    fs::File,
    io::{self, Read, Write},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use serialport::{DataBits, Parity, SerialPort, StopBits};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    decode::decode_record,
    exfil::{format_record, open_archive, Exfil},
    filter::{evaluate, PolicyConfig},
    monitoring::CaptureStats,
};

/// Longest line we accept from the device, anything longer is dropped
pub const MAX_LINE_LEN: usize = 256;

/// How to talk to the detector. Framing is always 8N1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialSettings {
    pub path: String,
    pub baud: u32,
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_owned(),
            baud: 9600,
            timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {path} not found")]
    NotFound { path: String },
    #[error("permission denied opening {path}")]
    PermissionDenied { path: String },
    #[error("could not open {path}: {source}")]
    Other {
        path: String,
        #[source]
        source: serialport::Error,
    },
}

impl DeviceError {
    pub fn from_serial(path: &str, err: serialport::Error) -> Self {
        let path = path.to_owned();
        match err.kind() {
            serialport::ErrorKind::NoDevice
            | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => DeviceError::NotFound { path },
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                DeviceError::PermissionDenied { path }
            }
            _ => DeviceError::Other { path, source: err },
        }
    }

    /// What the operator can do about it
    pub fn hint(&self) -> &'static str {
        match self {
            DeviceError::NotFound { .. } => "Device could not be opened, is it plugged in?",
            DeviceError::PermissionDenied { .. } => {
                "Add your user to the \"tty\" and \"dialout\" groups \
                 (sudo usermod -a -G tty,dialout $USER), then log out and back in"
            }
            DeviceError::Other { .. } => "Check the source path and baud rate",
        }
    }
}

/// Open the detector's serial port
pub fn open_device(settings: &SerialSettings) -> Result<Box<dyn SerialPort>, DeviceError> {
    serialport::new(&settings.path, settings.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(settings.timeout)
        .open()
        .map_err(|e| DeviceError::from_serial(&settings.path, e))
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("could not open output file {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Open the device, then the output file if there is one. The file is only
/// created once the device is up.
pub fn open_session(
    settings: &SerialSettings,
    output: Option<&Path>,
) -> Result<(Box<dyn SerialPort>, Option<File>), SessionError> {
    let port = open_device(settings)?;
    let archive = output
        .map(|path| {
            open_archive(path).map_err(|source| SessionError::Archive {
                path: path.display().to_string(),
                source,
            })
        })
        .transpose()?;
    Ok((port, archive))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// The read timed out with nothing pending
    TimedOut,
    /// The source hit end of file
    Closed,
}

/// Splits a byte stream into CR/LF terminated lines.
/// Blank lines are skipped, overlong lines are discarded.
pub struct LineReader<R> {
    inner: R,
    partial: Vec<u8>,
    overflowed: bool,
    ready: VecDeque<String>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            partial: Vec::with_capacity(MAX_LINE_LEN),
            overflowed: false,
            ready: VecDeque::new(),
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                if !self.overflowed {
                    self.finish_line();
                }
                self.partial.clear();
                self.overflowed = false;
            } else if self.partial.len() < MAX_LINE_LEN {
                self.partial.push(byte);
            } else {
                self.overflowed = true;
            }
        }
    }

    fn finish_line(&mut self) {
        let line = String::from_utf8_lossy(&self.partial).trim().to_owned();
        if !line.is_empty() {
            self.ready.push_back(line);
        }
    }

    // Hand out whatever is pending when the stream stalls
    fn flush_partial(&mut self) -> Option<String> {
        if !self.overflowed {
            self.finish_line();
        }
        self.partial.clear();
        self.overflowed = false;
        self.ready.pop_front()
    }

    /// Block until a full line, a timeout, or end of stream
    pub fn next_event(&mut self) -> io::Result<LineEvent> {
        let mut chunk = [0u8; 64];
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(LineEvent::Line(line));
            }
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    return Ok(self.flush_partial().map_or(LineEvent::Closed, LineEvent::Line));
                }
                Ok(n) => self.feed(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Ok(self.flush_partial().map_or(LineEvent::TimedOut, LineEvent::Line));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Why a capture session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Nothing came in before the read timeout
    NoData,
    /// The source closed
    Closed,
    /// The stop flag was cleared
    Stopped,
}

/// Run the read/decode/filter/emit loop until the device goes quiet, the
/// stream closes, or `running` is cleared. `now` supplies the timestamp of
/// each reported line.
pub fn capture_records<R, C, A, T>(
    lines: &mut LineReader<R>,
    policy: &PolicyConfig,
    exfil: &mut Exfil<C, A>,
    stats: &mut CaptureStats,
    running: &AtomicBool,
    mut now: T,
) -> io::Result<SessionEnd>
where
    R: Read,
    C: Write,
    A: Write,
    T: FnMut() -> String,
{
    while running.load(Ordering::SeqCst) {
        let line = match lines.next_event()? {
            LineEvent::Line(line) => line,
            LineEvent::TimedOut => return Ok(SessionEnd::NoData),
            LineEvent::Closed => return Ok(SessionEnd::Closed),
        };
        let reading = match decode_record(&line) {
            Ok(reading) => reading,
            Err(e) => {
                // Bad lines are expected now and then, skip them
                debug!(%line, error = %e, "Skipping malformed record");
                stats.record_malformed();
                continue;
            }
        };
        let verdict = evaluate(&reading, policy);
        stats.record_verdict(verdict);
        if verdict.is_report() {
            exfil.emit(&format_record(&now(), &reading))?;
        }
    }
    Ok(SessionEnd::Stopped)
}

/// Log what a session end means for the operator
pub fn report_end(end: SessionEnd) {
    match end {
        SessionEnd::NoData => {
            warn!("No data returned from your device, is it in RF mode?")
        }
        SessionEnd::Closed => warn!("Device closed the connection"),
        SessionEnd::Stopped => debug!("Capture stopped"),
    }
}
