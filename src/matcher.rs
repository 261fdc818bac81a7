//! Frame matching
//!
//! Turns one raw line from the device into the ordered list of field tokens.
//! A line that does not match is not an error; it simply yields no fields.

use crate::error::Result;
use regex::Regex;

/// Compiled capture pattern applied to every incoming line
///
/// When the pattern has a capture group, each match contributes its first
/// group; otherwise the whole match is taken. Tokens stay textual here and
/// are converted to numbers by the history buffer.
#[derive(Debug, Clone)]
pub struct FrameMatcher {
    pattern: Regex,
}

impl FrameMatcher {
    /// Compile a matcher from a regular expression
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Extract field tokens from a line, in order of appearance
    pub fn extract(&self, line: &str) -> Vec<String> {
        if self.pattern.captures_len() > 1 {
            self.pattern
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        } else {
            self.pattern
                .find_iter(line)
                .map(|m| m.as_str().to_string())
                .collect()
        }
    }
}

impl Default for FrameMatcher {
    fn default() -> Self {
        Self {
            pattern: Regex::new(crate::config::DEFAULT_PATTERN).expect("default pattern compiles"),
        }
    }
}
