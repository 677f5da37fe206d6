//! Reporter - Console Lines and the Failure Alert

use colored::Colorize;
use std::io::{self, Write};

use crate::dispatch::Settlement;
use crate::options::{ConfigError, LogLevel};

pub const SUCCESS_MARK: &str = "✔";
pub const ERROR_MARK: &str = "✖";
pub const WARNING_MARK: &str = "⚠";
const BELL: &str = "\x07";

/// Writes one notice per settled request, then alerts once if anything failed.
pub struct Reporter<W: Write> {
    out: W,
    level: LogLevel,
    alert: bool,
    alerts_sent: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, level: LogLevel) -> Self {
        Self {
            out,
            level,
            alert: true,
            alerts_sent: 0,
        }
    }

    /// Disables the bell. The alert is still counted.
    pub fn without_alert(mut self) -> Self {
        self.alert = false;
        self
    }

    pub fn begin(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    pub fn settlement(&mut self, settlement: &Settlement) -> io::Result<()> {
        match settlement {
            Settlement::Fulfilled { uri, .. } => {
                writeln!(self.out, "{}", format!("{} {}", SUCCESS_MARK, uri).green())
            }
            Settlement::Rejected(failure) => {
                let uri = failure.descriptor.display_uri();
                match self.level {
                    LogLevel::Verbose => {
                        writeln!(self.out, "{}", uri.red().underline())?;
                        writeln!(self.out, "{}", failure.message)
                    }
                    LogLevel::Default => {
                        writeln!(self.out, "{}", format!("{} {}", ERROR_MARK, uri).red())
                    }
                }
            }
        }
    }

    /// Closes the report block and alerts once when `failures > 0`.
    /// The alert is raised even when the closing line cannot be written.
    pub fn finish(&mut self, failures: usize) -> io::Result<()> {
        let closed = writeln!(self.out);
        let alerted = if failures > 0 { self.alert() } else { Ok(()) };
        closed.and(alerted)?;
        self.out.flush()
    }

    pub fn config_error(&mut self, error: &ConfigError) -> io::Result<()> {
        let warned = writeln!(self.out).and_then(|_| {
            writeln!(self.out, "{}", format!("{} {}", WARNING_MARK, error).yellow())
        });
        let alerted = self.alert();
        warned.and(alerted)?;
        self.out.flush()
    }

    pub fn alerts_sent(&self) -> usize {
        self.alerts_sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn alert(&mut self) -> io::Result<()> {
        self.alerts_sent += 1;
        if self.alert {
            self.out.write_all(BELL.as_bytes())?;
        }
        Ok(())
    }
}
