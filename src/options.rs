//! Options - Raw Input and Validated Configuration
//!
//! `GeneratorOptions` mirrors the options file as written. `validate` turns it
//! into a `GeneratorConfig` once, before any request leaves the process.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::beautify::{BeautifyOptions, BeautifySetting};
use crate::request::ConstantSpec;
use crate::templates::{ModuleWrapper, RenderContext, UnknownModuleSystem};
use crate::{DEFAULT_FILE, DEFAULT_MODULE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required option constants is missing.")]
    MissingConstants,

    #[error("defined constants must be of type object.")]
    ConstantsNotObject,

    #[error("constant `{name}`: {reason}")]
    InvalidConstant { name: String, reason: String },

    #[error("{0}")]
    ModuleSystem(#[from] UnknownModuleSystem),

    #[error("unknown log level `{0}` (expected default or verbose)")]
    UnknownLogLevel(String),

    #[error("Failed to read options file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid options: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Default,
    Verbose,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(LogLevel::Default),
            "verbose" => Ok(LogLevel::Verbose),
            other => Err(ConfigError::UnknownLogLevel(other.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Default => f.write_str("default"),
            LogLevel::Verbose => f.write_str("verbose"),
        }
    }
}

/// Options exactly as supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    #[serde(default)]
    pub constants: Option<Value>,
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(default)]
    pub module_declaration: bool,
    #[serde(default)]
    pub module_system: Option<String>,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub template_header: Option<String>,
    #[serde(default)]
    pub template_body: Option<String>,
    #[serde(default)]
    pub template_footer: Option<String>,
    #[serde(default)]
    pub beautify: BeautifySetting,
    #[serde(default)]
    pub all_or_nothing: bool,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Validated, fully defaulted configuration. Read-only after construction.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub constants: ConstantSpec,
    pub filename: PathBuf,
    pub render: RenderContext,
    pub beautify: Option<BeautifyOptions>,
    pub all_or_nothing: bool,
    pub log_level: LogLevel,
    pub timeout: Option<Duration>,
}

impl GeneratorOptions {
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<GeneratorConfig, ConfigError> {
        let constants = match &self.constants {
            None | Some(Value::Null) => return Err(ConfigError::MissingConstants),
            Some(value) if is_falsy(value) => return Err(ConfigError::MissingConstants),
            Some(Value::Object(map)) => ConstantSpec::from_map(map)?,
            Some(_) => return Err(ConfigError::ConstantsNotObject),
        };

        Ok(GeneratorConfig {
            constants,
            filename: self
                .filename
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE)),
            render: self.render_context()?,
            beautify: self.beautify.clone().resolve(),
            all_or_nothing: self.all_or_nothing,
            log_level: self.log_level.as_deref().unwrap_or("").parse()?,
            timeout: self.timeout_ms.map(Duration::from_millis),
        })
    }

    /// An explicit module system wins; `strictMode` only applies when none is set.
    pub fn module_wrapper(&self) -> Result<ModuleWrapper, ConfigError> {
        let wrapper: ModuleWrapper = self.module_system.as_deref().unwrap_or("").parse()?;
        if wrapper == ModuleWrapper::None && self.strict_mode {
            return Ok(ModuleWrapper::Strict);
        }
        Ok(wrapper)
    }

    fn render_context(&self) -> Result<RenderContext, ConfigError> {
        Ok(RenderContext {
            module_name: non_empty(&self.module_name).unwrap_or_else(|| DEFAULT_MODULE.to_string()),
            standalone: self.module_declaration,
            wrapper: self.module_wrapper()?,
            header_template: non_empty(&self.template_header),
            body_template: non_empty(&self.template_body),
            footer_template: non_empty(&self.template_footer),
        })
    }
}

/// `false`, `0` and `""` count as an absent option rather than a wrong type.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(json: &str) -> GeneratorOptions {
        GeneratorOptions::from_json_str(json).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = options(r#"{"constants": {"A": "http://a"}}"#).validate().unwrap();
        assert_eq!(config.filename, PathBuf::from("./constants.js"));
        assert_eq!(config.render.module_name, "constants");
        assert_eq!(config.render.wrapper, ModuleWrapper::None);
        assert!(!config.render.standalone);
        assert!(config.beautify.is_none());
        assert!(!config.all_or_nothing);
        assert_eq!(config.log_level, LogLevel::Default);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_missing_constants() {
        let err = options("{}").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingConstants));
        let err = options(r#"{"constants": null}"#).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingConstants));
    }

    #[test]
    fn test_falsy_constants_reported_as_missing() {
        for json in [
            r#"{"constants": false}"#,
            r#"{"constants": 0}"#,
            r#"{"constants": ""}"#,
        ] {
            let err = options(json).validate().unwrap_err();
            assert!(matches!(err, ConfigError::MissingConstants), "{}", json);
        }
    }

    #[test]
    fn test_constants_wrong_shape() {
        for json in [r#"{"constants": "http://a"}"#, r#"{"constants": ["http://a"]}"#, r#"{"constants": true}"#] {
            let err = options(json).validate().unwrap_err();
            assert!(matches!(err, ConfigError::ConstantsNotObject));
        }
    }

    #[test]
    fn test_strict_mode_only_when_unset() {
        let o = options(r#"{"constants": {}, "strictMode": true}"#);
        assert_eq!(o.module_wrapper().unwrap(), ModuleWrapper::Strict);

        let o = options(r#"{"constants": {}, "strictMode": true, "moduleSystem": " IIFE "}"#);
        assert_eq!(o.module_wrapper().unwrap(), ModuleWrapper::Iife);
    }

    #[test]
    fn test_unknown_module_system_rejected() {
        let err = options(r#"{"constants": {}, "moduleSystem": "amd"}"#).validate().unwrap_err();
        assert!(err.to_string().contains("amd"));
    }

    #[test]
    fn test_log_level_parsing() {
        let config = options(r#"{"constants": {}, "logLevel": " Verbose"}"#).validate().unwrap();
        assert_eq!(config.log_level, LogLevel::Verbose);
        assert!(options(r#"{"constants": {}, "logLevel": "loud"}"#).validate().is_err());
    }

    #[test]
    fn test_empty_templates_fall_back() {
        let config = options(r#"{"constants": {}, "templateBody": "", "moduleName": ""}"#)
            .validate()
            .unwrap();
        assert!(config.render.body_template.is_none());
        assert_eq!(config.render.module_name, "constants");
    }

    #[test]
    fn test_full_options() {
        let config = options(
            r#"{
                "constants": {"B": {"url": "http://b", "qs": {"x": "1"}}, "A": "http://a"},
                "filename": "out/config.js",
                "moduleName": "app.config",
                "moduleDeclaration": true,
                "moduleSystem": "requirejs",
                "beautify": {"indentSize": 2},
                "allOrNothing": true,
                "timeoutMs": 1500
            }"#,
        )
        .validate()
        .unwrap();
        let names: Vec<_> = config.constants.names().collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(config.filename, PathBuf::from("out/config.js"));
        assert!(config.render.standalone);
        assert_eq!(config.render.wrapper, ModuleWrapper::RequireJs);
        assert_eq!(config.beautify.unwrap().indent_size, 2);
        assert!(config.all_or_nothing);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
    }
}
