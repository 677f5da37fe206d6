//! Output Beautifier
//!
//! A small layout pass over generated script text: one statement per line,
//! object and array members on their own indented lines. String literals and
//! comments are copied through untouched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeautifyOptions {
    #[serde(default = "default_indent_size", alias = "indent_size")]
    pub indent_size: usize,
    #[serde(default = "default_indent_char", alias = "indent_char")]
    pub indent_char: char,
    #[serde(default = "default_true", alias = "preserve_newlines")]
    pub preserve_newlines: bool,
}

fn default_indent_size() -> usize { 4 }
fn default_indent_char() -> char { ' ' }
fn default_true() -> bool { true }

impl Default for BeautifyOptions {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            indent_char: default_indent_char(),
            preserve_newlines: true,
        }
    }
}

/// `beautify` option as written in an options file: a toggle or a settings object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BeautifySetting {
    Toggle(bool),
    Custom(BeautifyOptions),
}

impl Default for BeautifySetting {
    fn default() -> Self {
        BeautifySetting::Toggle(false)
    }
}

impl BeautifySetting {
    pub fn resolve(self) -> Option<BeautifyOptions> {
        match self {
            BeautifySetting::Toggle(false) => None,
            BeautifySetting::Toggle(true) => Some(BeautifyOptions::default()),
            BeautifySetting::Custom(options) => Some(options),
        }
    }
}

pub fn beautify(source: &str, options: &BeautifyOptions) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut f = Layout::new(options);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                i = f.copy_string(&chars, i);
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                i = f.copy_line_comment(&chars, i);
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i = f.copy_block_comment(&chars, i);
                continue;
            }
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                match next_significant(&chars, i + 1) {
                    Some(j) if chars[j] == close => {
                        f.push(c);
                        f.push(close);
                        i = j + 1;
                        continue;
                    }
                    _ => {
                        f.push(c);
                        f.stack.push(c);
                        f.newline();
                    }
                }
            }
            '}' | ']' => {
                f.stack.pop();
                f.newline();
                f.push(c);
            }
            '(' => {
                f.push(c);
                f.stack.push(c);
            }
            ')' => {
                f.stack.pop();
                f.push(c);
            }
            ';' => {
                f.push(c);
                if !f.in_parens() {
                    f.newline();
                }
            }
            ',' => {
                f.push(c);
                if f.in_block() {
                    f.newline();
                } else {
                    f.pending_space = true;
                }
            }
            ':' => {
                f.push(c);
                f.pending_space = true;
            }
            '\n' if options.preserve_newlines && !f.in_parens() => f.newline(),
            c if c.is_whitespace() => {
                if !f.at_line_start {
                    f.pending_space = true;
                }
            }
            _ => f.push(c),
        }
        i += 1;
    }

    f.out.trim_end().to_string()
}

fn next_significant(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| !chars[j].is_whitespace())
}

struct Layout<'a> {
    options: &'a BeautifyOptions,
    out: String,
    stack: Vec<char>,
    at_line_start: bool,
    pending_space: bool,
}

impl<'a> Layout<'a> {
    fn new(options: &'a BeautifyOptions) -> Self {
        Self {
            options,
            out: String::new(),
            stack: vec![],
            at_line_start: true,
            pending_space: false,
        }
    }

    fn depth(&self) -> usize {
        self.stack.iter().filter(|c| **c != '(').count()
    }

    fn in_parens(&self) -> bool {
        self.stack.last() == Some(&'(')
    }

    fn in_block(&self) -> bool {
        matches!(self.stack.last(), Some('{') | Some('['))
    }

    fn push(&mut self, c: char) {
        if self.at_line_start {
            let width = self.depth() * self.options.indent_size;
            self.out.extend(std::iter::repeat(self.options.indent_char).take(width));
            self.at_line_start = false;
        } else if self.pending_space {
            self.out.push(' ');
        }
        self.pending_space = false;
        self.out.push(c);
    }

    fn newline(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.at_line_start = true;
        self.pending_space = false;
    }

    /// Copies a quoted literal starting at `start`; returns the index after it.
    fn copy_string(&mut self, chars: &[char], start: usize) -> usize {
        let quote = chars[start];
        self.push(quote);
        let mut i = start + 1;
        while i < chars.len() {
            let c = chars[i];
            self.out.push(c);
            i += 1;
            if c == '\\' {
                if let Some(&escaped) = chars.get(i) {
                    self.out.push(escaped);
                    i += 1;
                }
            } else if c == quote {
                break;
            }
        }
        i
    }

    fn copy_line_comment(&mut self, chars: &[char], start: usize) -> usize {
        self.push('/');
        let mut i = start + 1;
        while i < chars.len() && chars[i] != '\n' {
            self.out.push(chars[i]);
            i += 1;
        }
        self.newline();
        i
    }

    fn copy_block_comment(&mut self, chars: &[char], start: usize) -> usize {
        self.push('/');
        let mut i = start + 1;
        while i < chars.len() {
            self.out.push(chars[i]);
            if chars[i] == '/' && i > start + 2 && chars[i - 1] == '*' {
                return i + 1;
            }
            i += 1;
        }
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_members_on_own_lines() {
        let src = r#"angular.module('c').constant('A', {"x":1,"y":[1,2]});"#;
        let expected = "angular.module('c').constant('A', {\n    \"x\": 1,\n    \"y\": [\n        1,\n        2\n    ]\n});";
        assert_eq!(beautify(src, &BeautifyOptions::default()), expected);
    }

    #[test]
    fn test_empty_brackets_stay_inline() {
        let src = "angular.module('c', []).constant('E', {});";
        assert_eq!(beautify(src, &BeautifyOptions::default()), src);
    }

    #[test]
    fn test_strings_are_untouched() {
        let src = r#"x('a;{b}, c\' d');"#;
        assert_eq!(beautify(src, &BeautifyOptions::default()), src);
    }

    #[test]
    fn test_statements_split() {
        let src = "'use strict'; module.exports = angular.module('c');";
        assert_eq!(
            beautify(src, &BeautifyOptions::default()),
            "'use strict';\nmodule.exports = angular.module('c');"
        );
    }

    #[test]
    fn test_custom_indent() {
        let options = BeautifyOptions { indent_size: 1, indent_char: '\t', preserve_newlines: true };
        assert_eq!(beautify("f({a:1});", &options), "f({\n\ta: 1\n});");
    }

    #[test]
    fn test_setting_resolution() {
        assert_eq!(BeautifySetting::Toggle(false).resolve(), None);
        assert_eq!(BeautifySetting::Toggle(true).resolve(), Some(BeautifyOptions::default()));
        let custom: BeautifySetting = serde_json::from_str(r#"{"indentSize": 2}"#).unwrap();
        assert_eq!(custom.resolve().unwrap().indent_size, 2);
    }

    #[test]
    fn test_snake_case_keys_accepted() {
        let setting: BeautifySetting = serde_json::from_str(
            r#"{"indent_size": 1, "indent_char": "\t", "preserve_newlines": false}"#,
        )
        .unwrap();
        let options = setting.resolve().unwrap();
        assert_eq!(options.indent_size, 1);
        assert_eq!(options.indent_char, '\t');
        assert!(!options.preserve_newlines);
        assert_eq!(beautify("f({a:1});", &options), "f({\n\ta: 1\n});");
    }
}
