//! This module is responsible for getting reported readings out of the
//! program: printed on the console and, optionally, appended to a flat file.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

use chrono::{DateTime, Local};

use crate::decode::Reading;

/// Field delimiter of an output line
pub const DELIMITER: char = ',';

/// Bracketed local timestamp, `[2020-06-01 13:37:00]`
pub fn record_timestamp(time: &DateTime<Local>) -> String {
    time.format("[%Y-%m-%d %H:%M:%S]").to_string()
}

/// `<timestamp>,<magnitude>,<band>`
pub fn format_record(timestamp: &str, reading: &Reading) -> String {
    format!(
        "{timestamp}{DELIMITER}{}{DELIMITER}{}",
        reading.magnitude, reading.band
    )
}

/// Open (or create) an output file for appending
pub fn open_archive(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Where reported lines go. The console always gets them, the archive only
/// if one was given.
pub struct Exfil<C, A> {
    console: C,
    archive: Option<A>,
}

impl<C: Write, A: Write> Exfil<C, A> {
    pub fn new(console: C, archive: Option<A>) -> Self {
        Self { console, archive }
    }

    /// Write one line to every sink, flushing so nothing sits in a buffer
    /// if the session is cut short
    pub fn emit(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.console, "{line}")?;
        self.console.flush()?;
        if let Some(archive) = self.archive.as_mut() {
            writeln!(archive, "{line}")?;
            archive.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> (C, Option<A>) {
        (self.console, self.archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading() -> Reading {
        Reading {
            magnitude: "6.90".parse().unwrap(),
            band: 2400,
        }
    }

    #[test]
    fn test_timestamp() {
        let time = Local.with_ymd_and_hms(2020, 6, 1, 9, 5, 7).unwrap();
        assert_eq!(record_timestamp(&time), "[2020-06-01 09:05:07]");
    }

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record("[2020-06-01 09:05:07]", &reading()),
            "[2020-06-01 09:05:07],6.90,2400"
        );
    }

    #[test]
    fn test_emit_to_both_sinks() {
        let mut exfil = Exfil::new(Vec::new(), Some(Vec::new()));
        exfil.emit("a,1,2").unwrap();
        exfil.emit("b,3,4").unwrap();
        let (console, archive) = exfil.into_inner();
        assert_eq!(console, b"a,1,2\nb,3,4\n");
        assert_eq!(archive.unwrap(), b"a,1,2\nb,3,4\n");
    }

    #[test]
    fn test_archive_appends() {
        let path = std::env::temp_dir().join(format!("emf_slurper_{}.csv", std::process::id()));
        let _ = std::fs::remove_file(&path);
        for line in ["first", "second"] {
            let mut exfil = Exfil::new(io::sink(), Some(open_archive(&path).unwrap()));
            exfil.emit(line).unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
