//! Generation Pipeline - Single Entry Point
//!
//! Idle → Dispatching → Aggregating → {Skipped | Writing} → {Completed | Failed}
//!
//! Configuration is validated before anything is dispatched. The completion
//! callback fires only after a successful write. Console reporting never
//! decides the outcome: a failing sink is logged and the run continues.

use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::aggregate::{aggregate, decide, GenerationOutcome, WriteDecision};
use crate::dispatch::{dispatch, HttpTransport, Settlement, Transport};
use crate::options::{ConfigError, GeneratorConfig, GeneratorOptions, LogLevel};
use crate::output::{OutputError, OutputWriter};
use crate::report::Reporter;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Output(#[from] OutputError),

    #[error("HTTP client setup failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Dispatching,
    Aggregating,
    Skipped,
    Writing,
    Completed,
    Failed,
}

/// Terminal state of a run that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: PathBuf, outcome: GenerationOutcome },
    /// All-or-nothing blocked the write; no file was touched.
    Skipped { outcome: GenerationOutcome },
}

impl RunOutcome {
    pub fn outcome(&self) -> &GenerationOutcome {
        match self {
            RunOutcome::Written { outcome, .. } | RunOutcome::Skipped { outcome } => outcome,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, RunOutcome::Written { .. })
    }
}

pub struct GenerationPipeline<W: Write> {
    transport: Option<Box<dyn Transport>>,
    console: W,
    alert: bool,
    alerts_sent: usize,
    stage: Stage,
}

impl GenerationPipeline<io::Stdout> {
    /// Pipeline reporting to stdout over HTTP.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> GenerationPipeline<W> {
    pub fn new(console: W) -> Self {
        Self {
            transport: None,
            console,
            alert: true,
            alerts_sent: 0,
            stage: Stage::Idle,
        }
    }

    /// Replaces the default HTTP transport.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn without_alert(mut self) -> Self {
        self.alert = false;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Alerts raised across all runs of this pipeline.
    pub fn alerts_sent(&self) -> usize {
        self.alerts_sent
    }

    pub fn into_console(self) -> W {
        self.console
    }

    /// Validates `options`, then runs. A configuration error is reported and
    /// returned before any request is issued.
    pub async fn generate<F>(
        &mut self,
        options: &GeneratorOptions,
        on_complete: F,
    ) -> Result<RunOutcome, GeneratorError>
    where
        F: FnOnce(),
    {
        self.stage = Stage::Idle;
        match options.validate() {
            Ok(config) => self.run(&config, on_complete).await,
            Err(e) => {
                tracing::warn!(error = %e, "invalid options");
                let mut reporter = console_reporter(&mut self.console, LogLevel::Default, self.alert);
                if let Err(console) = reporter.config_error(&e) {
                    tracing::warn!(error = %console, "could not report configuration error");
                }
                self.alerts_sent += reporter.alerts_sent();
                self.stage = Stage::Failed;
                Err(e.into())
            }
        }
    }

    pub async fn run<F>(
        &mut self,
        config: &GeneratorConfig,
        on_complete: F,
    ) -> Result<RunOutcome, GeneratorError>
    where
        F: FnOnce(),
    {
        let transport: Box<dyn Transport> = match self.transport.take() {
            Some(transport) => transport,
            None => match HttpTransport::new(config.timeout) {
                Ok(http) => Box::new(http),
                Err(e) => {
                    self.stage = Stage::Failed;
                    return Err(e.into());
                }
            },
        };

        self.stage = Stage::Dispatching;
        tracing::info!(constants = config.constants.len(), "resolving constants");
        let settlements = dispatch(transport.as_ref(), &config.constants).await;
        self.transport = Some(transport);

        self.stage = Stage::Aggregating;
        let outcome = aggregate(&config.render, &config.constants, &settlements);

        let mut reporter = console_reporter(&mut self.console, config.log_level, self.alert);
        if let Err(e) = report_all(&mut reporter, &settlements, outcome.rejected_count) {
            tracing::warn!(error = %e, "console report incomplete");
        }
        self.alerts_sent += reporter.alerts_sent();

        if decide(&outcome, config.all_or_nothing) == WriteDecision::Skip {
            tracing::warn!(
                rejected = outcome.rejected_count,
                path = %config.filename.display(),
                "all-or-nothing is set and requests failed; not writing"
            );
            self.stage = Stage::Skipped;
            return Ok(RunOutcome::Skipped { outcome });
        }

        self.stage = Stage::Writing;
        let writer = OutputWriter::new(config.beautify.clone());
        if let Err(e) = writer.write(&outcome.rendered_text, &config.filename) {
            self.stage = Stage::Failed;
            return Err(e.into());
        }

        self.stage = Stage::Completed;
        on_complete();
        Ok(RunOutcome::Written { path: config.filename.clone(), outcome })
    }
}

fn console_reporter<W: Write>(console: &mut W, level: LogLevel, alert: bool) -> Reporter<&mut W> {
    let reporter = Reporter::new(console, level);
    if alert {
        reporter
    } else {
        reporter.without_alert()
    }
}

fn report_all<W: Write>(
    reporter: &mut Reporter<W>,
    settlements: &[Settlement],
    failures: usize,
) -> io::Result<()> {
    let mut first_error = reporter.begin().err();
    for settlement in settlements {
        if let Err(e) = reporter.settlement(settlement) {
            first_error.get_or_insert(e);
        }
    }
    if let Err(e) = reporter.finish(failures) {
        first_error.get_or_insert(e);
    }
    first_error.map_or(Ok(()), Err)
}

/// Runs `options` against stdout and the HTTP transport.
pub async fn generate<F>(options: &GeneratorOptions, on_complete: F) -> Result<RunOutcome, GeneratorError>
where
    F: FnOnce(),
{
    GenerationPipeline::stdout().generate(options, on_complete).await
}
