//! Template System - Header, Body and Footer Contracts
//!
//! Substitution is limited to the named variables of the three templates:
//! `name` and `standalone` for the header, `key` and `value` for the body.
//! The emitted text is never checked for validity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TEMPLATE_HEADER: &str = "angular.module('<%= name %>'<%= standalone %>)";
pub const TEMPLATE_BODY: &str = ".constant('<%= key %>', <%= value %>)";
pub const TEMPLATE_FOOTER: &str = ";";

/// Text substituted for `standalone` when a module declaration is requested.
pub const STANDALONE_MARKER: &str = ", []";

/// Module-loading envelope around the generated module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleWrapper {
    #[default]
    None,
    RequireJs,
    Browserify,
    Iife,
    Strict,
}

impl ModuleWrapper {
    pub fn header(&self) -> &'static str {
        match self {
            ModuleWrapper::None => "",
            ModuleWrapper::RequireJs => {
                "define(['angular'], function(angular) { 'use strict'; return "
            }
            ModuleWrapper::Browserify => "'use strict'; module.exports = ",
            ModuleWrapper::Iife => {
                ";(function (angular, window, document, undefined) { 'use strict';"
            }
            ModuleWrapper::Strict => "'use strict'; ",
        }
    }

    pub fn footer(&self) -> &'static str {
        match self {
            ModuleWrapper::RequireJs => "});",
            ModuleWrapper::Iife => "})(this.angular, this, this.document);",
            ModuleWrapper::None | ModuleWrapper::Browserify | ModuleWrapper::Strict => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleWrapper::None => "none",
            ModuleWrapper::RequireJs => "requirejs",
            ModuleWrapper::Browserify => "browserify",
            ModuleWrapper::Iife => "iife",
            ModuleWrapper::Strict => "strict",
        }
    }
}

impl fmt::Display for ModuleWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModuleSystem(pub String);

impl fmt::Display for UnknownModuleSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown module system `{}` (expected requirejs, browserify, iife or strict)",
            self.0
        )
    }
}

impl std::error::Error for UnknownModuleSystem {}

impl FromStr for ModuleWrapper {
    type Err = UnknownModuleSystem;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(ModuleWrapper::None),
            "requirejs" => Ok(ModuleWrapper::RequireJs),
            "browserify" => Ok(ModuleWrapper::Browserify),
            "iife" => Ok(ModuleWrapper::Iife),
            "strict" => Ok(ModuleWrapper::Strict),
            other => Err(UnknownModuleSystem(other.to_string())),
        }
    }
}

/// Everything needed to render the header, body fragments and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    pub module_name: String,
    #[serde(default)]
    pub standalone: bool,
    #[serde(default)]
    pub wrapper: ModuleWrapper,
    #[serde(default)]
    pub header_template: Option<String>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub footer_template: Option<String>,
}

impl RenderContext {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            standalone: false,
            wrapper: ModuleWrapper::None,
            header_template: None,
            body_template: None,
            footer_template: None,
        }
    }

    pub fn header(&self) -> String {
        let template = self.header_template.as_deref().unwrap_or(TEMPLATE_HEADER);
        let standalone = if self.standalone { STANDALONE_MARKER } else { "" };
        let mut out = String::from(self.wrapper.header());
        out.push_str(&substitute(
            template,
            &[("name", self.module_name.as_str()), ("standalone", standalone)],
        ));
        out
    }

    pub fn body(&self, key: &str, value: &str) -> String {
        let template = self.body_template.as_deref().unwrap_or(TEMPLATE_BODY);
        substitute(template, &[("key", key), ("value", value)])
    }

    /// The footer template takes no variables and is emitted as written.
    pub fn footer(&self) -> String {
        let template = self.footer_template.as_deref().unwrap_or(TEMPLATE_FOOTER);
        let mut out = String::from(template);
        out.push_str(self.wrapper.footer());
        out
    }

    /// header ++ fragments ++ footer
    pub fn render<S: AsRef<str>>(&self, fragments: &[S]) -> String {
        let mut out = self.header();
        for fragment in fragments {
            out.push_str(fragment.as_ref());
        }
        out.push_str(&self.footer());
        out
    }
}

/// Replaces every `<%= var %>` whose name appears in `vars`.
///
/// Unknown variables render as empty text. An unterminated tag is kept
/// verbatim.
pub fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("<%=") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        match after.find("%>") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some((_, value)) = vars.iter().find(|(k, _)| *k == name) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
