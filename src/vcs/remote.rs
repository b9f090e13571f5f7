// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote repository URL resolution.
//!
//! Turn whatever a backend prints for its configured origin into a proper
//! [`Url`]. Some tools accept an SCP-like shorthand, e.g.,
//! `git@github.com:user/repo`, which is not a valid URL at all. A
//! [`RemoteRule`] can name a pattern for such shorthand so it gets rewritten
//! into an `ssh://` URL first.

use crate::vcs::{Result, VcsError};

use regex::Regex;
use url::Url;

/// SCP-like address used by Git to reach repositories over SSH.
pub const SCP_SYNTAX: &str = r"^([a-zA-Z0-9_]+)@([a-zA-Z0-9._-]+):(.*)$";

/// How a backend reports its remote origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRule {
    /// Command template that prints the remote origin.
    pub cmd: String,

    /// Pattern for shorthand addresses, with user, host, and path groups.
    pub shorthand: Option<String>,
}

impl RemoteRule {
    /// Construct new remote rule.
    pub fn new(cmd: impl Into<String>, shorthand: Option<&str>) -> Self {
        Self {
            cmd: cmd.into(),
            shorthand: shorthand.map(str::to_owned),
        }
    }

    /// Normalize raw query output into a remote URL.
    ///
    /// Surrounding whitespace is ignored. Insecure schemes are accepted as
    /// long as they appear in `schemes`, since this only reports what the
    /// working copy already points at.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Parse`] if the output is neither shorthand nor a
    ///   URL, or its scheme is not in `schemes`.
    /// - Return [`VcsError::Pattern`] if the shorthand pattern does not
    ///   compile.
    pub fn normalize(&self, raw: &str, schemes: &[String]) -> Result<Url> {
        let out = raw.trim();
        let parse_error = |source: Option<url::ParseError>| VcsError::Parse {
            command: self.cmd.clone(),
            source,
        };

        let url = match self.shorthand_url(out)? {
            Some(url) => url,
            None => Url::parse(out).map_err(|err| parse_error(Some(err)))?,
        };

        if schemes.iter().any(|scheme| scheme == url.scheme()) {
            Ok(url)
        } else {
            Err(parse_error(None))
        }
    }

    fn shorthand_url(&self, out: &str) -> Result<Option<Url>> {
        let Some(pattern) = &self.shorthand else {
            return Ok(None);
        };

        let Some(caps) = Regex::new(pattern)?.captures(out) else {
            return Ok(None);
        };

        let group = |index| caps.get(index).map_or("", |group| group.as_str());
        let (user, host, path) = (group(1), group(2), group(3));
        let separator = if path.starts_with('/') { "" } else { "/" };

        Url::parse(&format!("ssh://{user}@{host}{separator}{path}"))
            .map(Some)
            .map_err(|err| VcsError::Parse {
                command: self.cmd.clone(),
                source: Some(err),
            })
    }
}
