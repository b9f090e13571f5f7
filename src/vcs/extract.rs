// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pattern extraction from tool output.
//!
//! Backends answer queries in free text. An [`ExtractionRule`] pairs the query
//! to run with a regular expression whose first capturing group is the value
//! of interest. Expressions are applied in multi-line mode, so `^` and `$`
//! anchor to line boundaries, and `.` never crosses a newline.

use crate::vcs::Result;

use regex::{Regex, RegexBuilder};

/// Command to run paired with the pattern that picks values out of its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    /// Command template to run.
    pub cmd: String,

    /// Regular expression; its first capturing group is extracted.
    pub pattern: String,
}

impl ExtractionRule {
    /// Construct new extraction rule.
    pub fn new(cmd: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            pattern: pattern.into(),
        }
    }

    /// Collect first capturing group of every match in `text`.
    ///
    /// Matches are returned in the order they appear. No match at all is an
    /// empty result, not an error.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Pattern`](crate::vcs::VcsError::Pattern) if the
    ///   pattern does not compile.
    pub fn extract_all(&self, text: &str) -> Result<Vec<String>> {
        let regex = self.compile()?;
        Ok(regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|group| group.as_str().to_string())
            .collect())
    }

    /// Extract first capturing group of the first non-empty match in `text`.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Pattern`](crate::vcs::VcsError::Pattern) if the
    ///   pattern does not compile.
    pub fn extract_first(&self, text: &str) -> Result<Option<String>> {
        Ok(self
            .extract_all(text)?
            .into_iter()
            .find(|value| !value.is_empty()))
    }

    fn compile(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&self.pattern)
            .multi_line(true)
            .dot_matches_new_line(false)
            .build()?)
    }
}
