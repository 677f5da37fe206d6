//! Remote Constants CLI
//!
//! Commands: generate, check, wrappers
//! Returns 1 on configuration errors and 2 when the output cannot be written.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use remote_constants::{
    BeautifySetting, GenerationPipeline, GeneratorError, GeneratorOptions, LogLevel,
    ModuleWrapper, Reporter, RunOutcome,
};

#[derive(Parser)]
#[command(name = "remote-constants-cli")]
#[command(about = "Remote Constants - compile remote values into a constants module")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON options file
    #[arg(short, long, default_value = "constants.config.json")]
    options: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every constant and write the module
    Generate {
        /// Output file (overrides `filename`)
        #[arg(short, long)]
        filename: Option<PathBuf>,

        /// Module name (overrides `moduleName`)
        #[arg(short, long)]
        module_name: Option<String>,

        /// Module system wrapper: requirejs, browserify, iife or strict
        #[arg(long)]
        module_system: Option<String>,

        /// Skip the write if any request fails
        #[arg(long)]
        all_or_nothing: bool,

        /// Pretty-print the generated file
        #[arg(long)]
        beautify: bool,

        /// Print full failure messages
        #[arg(short, long)]
        verbose: bool,

        /// Do not ring the terminal bell on failures
        #[arg(long)]
        no_alert: bool,
    },

    /// Validate the options file without fetching anything
    Check,

    /// List available module system wrappers
    Wrappers,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Wrappers => {
            let wrappers: Vec<_> = [
                ModuleWrapper::RequireJs,
                ModuleWrapper::Browserify,
                ModuleWrapper::Iife,
                ModuleWrapper::Strict,
            ]
            .iter()
            .map(|w| serde_json::json!({
                "name": w.as_str(),
                "header": w.header(),
                "footer": w.footer(),
            }))
            .collect();

            match serde_json::to_string_pretty(&wrappers) {
                Ok(text) => {
                    println!("{}", text);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Check => {
            let checked = GeneratorOptions::from_file(&cli.options).and_then(|o| o.validate());
            let output = match &checked {
                Ok(config) => serde_json::json!({
                    "valid": true,
                    "constants": config.constants.names().collect::<Vec<_>>(),
                    "filename": config.filename,
                    "moduleName": config.render.module_name,
                    "moduleSystem": config.render.wrapper,
                }),
                Err(e) => serde_json::json!({
                    "valid": false,
                    "error": e.to_string(),
                }),
            };
            println!("{}", output);
            if checked.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Generate {
            filename,
            module_name,
            module_system,
            all_or_nothing,
            beautify,
            verbose,
            no_alert,
        } => {
            let mut options = match GeneratorOptions::from_file(&cli.options) {
                Ok(o) => o,
                Err(e) => {
                    init_tracing(LogLevel::Default);
                    tracing::warn!(error = %e, "could not load options");
                    let mut reporter = Reporter::new(std::io::stdout(), LogLevel::Default);
                    if no_alert {
                        reporter = reporter.without_alert();
                    }
                    if let Err(console) = reporter.config_error(&e) {
                        tracing::warn!(error = %console, "could not report configuration error");
                    }
                    return ExitCode::FAILURE;
                }
            };

            if filename.is_some() {
                options.filename = filename;
            }
            if module_name.is_some() {
                options.module_name = module_name;
            }
            if module_system.is_some() {
                options.module_system = module_system;
            }
            if all_or_nothing {
                options.all_or_nothing = true;
            }
            if beautify {
                options.beautify = BeautifySetting::Toggle(true);
            }
            if verbose {
                options.log_level = Some(LogLevel::Verbose.to_string());
            }

            let level: LogLevel = options
                .log_level
                .as_deref()
                .and_then(|l| l.parse().ok())
                .unwrap_or_default();
            init_tracing(level);

            let mut pipeline = GenerationPipeline::stdout();
            if no_alert {
                pipeline = pipeline.without_alert();
            }

            match pipeline.generate(&options, || {}).await {
                Ok(RunOutcome::Written { path, outcome }) => {
                    tracing::info!(
                        path = %path.display(),
                        fulfilled = outcome.fulfilled_count,
                        rejected = outcome.rejected_count,
                        "generation complete"
                    );
                    ExitCode::SUCCESS
                }
                Ok(RunOutcome::Skipped { .. }) => ExitCode::SUCCESS,
                Err(GeneratorError::Config(_)) => ExitCode::FAILURE,
                Err(e) => {
                    eprintln!("error: {}", e);
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn init_tracing(level: LogLevel) {
    let fallback = match level {
        LogLevel::Default => "warn",
        LogLevel::Verbose => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
