//! Remote Constants - Build-Time Constants Compiler
//!
//! # The Five Rules
//! 1. Every Constant Gets One Request
//! 2. Failures Stay Local
//! 3. Input Order Is Output Order
//! 4. All-Or-Nothing Means Nothing
//! 5. Configuration Is Checked Before The Network

pub mod request;
pub mod options;
pub mod templates;
pub mod beautify;
pub mod dispatch;
pub mod aggregate;
pub mod report;
pub mod output;
pub mod pipeline;

pub use request::{ConstantSpec, RequestDescriptor};
pub use options::{ConfigError, GeneratorConfig, GeneratorOptions, LogLevel};
pub use templates::{ModuleWrapper, RenderContext};
pub use beautify::{BeautifyOptions, BeautifySetting};
pub use dispatch::{dispatch, Fetched, HttpTransport, RequestFailure, Settlement, Transport, TransportError};
pub use aggregate::{aggregate, GenerationOutcome, WriteDecision};
pub use report::Reporter;
pub use output::{OutputError, OutputWriter};
pub use pipeline::{generate, GenerationPipeline, GeneratorError, RunOutcome, Stage};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_FILE: &str = "./constants.js";
pub const DEFAULT_MODULE: &str = "constants";
