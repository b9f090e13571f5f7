// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control abstraction.
//!
//! Devtools never links against a version control library. Instead it drives
//! the tool's own command-line interface, e.g., the `git` binary, through a
//! small declarative protocol.
//!
//! # Command Tables
//!
//! Each backend is described by a [`VcsCmd`] table of command templates. A
//! template is a plain command line with `{key}` placeholders that are filled
//! in per call (see [`template`]). Queries whose answers must be read back,
//! like listing tags, pair a template with a regular expression that picks
//! values out of the tool's output (see [`extract`]).
//!
//! # Operations
//!
//! The [`Vcs`] facade sequences those tables into the supported operations:
//!
//! 1. [`Vcs::ping`] probes whether a repository answers over a scheme.
//! 2. [`Vcs::create`] makes a fresh copy of a repository.
//! 3. [`Vcs::download`] pulls new changes into an existing copy.
//! 4. [`Vcs::tags`] lists known tags and branches.
//! 5. [`Vcs::tag_sync`] moves a working copy to a tag, or to its default state.
//! 6. [`Vcs::remote_repo`] reports where a working copy's origin points.
//!
//! Every call is synchronous and keeps no state between calls. The working
//! copy on disk is owned by the backend tool itself. Concurrent calls are fine
//! as long as each targets its own working directory.

pub mod extract;
pub mod process;
pub mod remote;
pub mod table;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::ExtractionRule;
pub use process::{CommandOutput, Invocation, Report, Runner, SystemRunner};
pub use remote::RemoteRule;
pub use table::{VcsCmd, VcsRegistry};
pub use template::{expand, Bindings};

use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

/// Version control operations over one backend.
#[derive(Debug, Clone)]
pub struct Vcs<R = SystemRunner>
where
    R: Runner,
{
    cmd: VcsCmd,
    runner: R,
    verbose: bool,
}

impl Vcs<SystemRunner> {
    /// Construct facade that runs backend tool as child processes.
    pub fn system(cmd: VcsCmd) -> Self {
        Self::new(cmd, SystemRunner)
    }
}

impl<R> Vcs<R>
where
    R: Runner,
{
    /// Construct new facade over backend `cmd`.
    pub fn new(cmd: VcsCmd, runner: R) -> Self {
        Self {
            cmd,
            runner,
            verbose: false,
        }
    }

    /// Print diagnostics even for failures that are expected answers.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Backend command table.
    pub fn cmd(&self) -> &VcsCmd {
        &self.cmd
    }

    /// Process runner in use.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Probe `repo` over `scheme`.
    ///
    /// Failure is only printed in verbose mode, since callers use this to try
    /// schemes until one answers.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Process`] if the probe fails.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    pub fn ping(&self, scheme: &str, repo: &str) -> Result<()> {
        let bindings = Bindings::new().with("scheme", scheme).with("repo", repo);
        self.run(".", &self.cmd.ping_cmd, &bindings, Report::VerboseOnly)?;
        Ok(())
    }

    /// Create new copy of `repo` in `dir`.
    ///
    /// The parent of `dir` must exist, `dir` must not.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Process`] on the first failing command.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()), level = "debug")]
    pub fn create(&self, dir: impl AsRef<Path>, repo: &str) -> Result<()> {
        let bindings = Bindings::new()
            .with("dir", dir.as_ref().to_string_lossy())
            .with("repo", repo);
        for cmd in &self.cmd.create_cmd {
            self.run(".", cmd, &bindings, Report::Always)?;
        }

        Ok(())
    }

    /// Download new changes into existing copy at `dir`.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Process`] on the first failing command.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()), level = "debug")]
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<()> {
        for cmd in &self.cmd.download_cmd {
            self.run(dir.as_ref(), cmd, &Bindings::new(), Report::Always)?;
        }

        Ok(())
    }

    /// List available tags of copy at `dir`.
    ///
    /// Values from every listing rule are appended in rule order. Duplicates
    /// across rules are kept.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Process`] if a listing command fails.
    /// - Return [`VcsError::Pattern`] if a listing pattern does not compile.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    pub fn tags(&self, dir: impl AsRef<Path>) -> Result<Vec<String>> {
        let mut tags = Vec::new();
        for rule in &self.cmd.tag_cmd {
            let out = self.run(dir.as_ref(), &rule.cmd, &Bindings::new(), Report::Always)?;
            tags.extend(rule.extract_all(&String::from_utf8_lossy(&out))?);
        }

        Ok(tags)
    }

    /// Sync copy at `dir` to `tag`.
    ///
    /// A non-empty `tag` is first run through the lookup rules. The first
    /// rule that recognizes it replaces it with the backend's own name for
    /// it, e.g., `v1` becomes `tags/v1`. A lookup query that fails counts as
    /// not recognizing the tag. Unrecognized tags are passed on as given.
    ///
    /// An empty `tag` runs the default sync commands instead, if the backend
    /// has any.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Process`] if a sync command fails.
    /// - Return [`VcsError::Pattern`] if a lookup pattern does not compile.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()), level = "debug")]
    pub fn tag_sync(&self, dir: impl AsRef<Path>, tag: &str) -> Result<()> {
        let dir = dir.as_ref();
        if self.cmd.tag_sync_cmd.is_empty() && self.cmd.tag_sync_default.is_none() {
            return Ok(());
        }

        let mut tag = tag.to_string();
        if !tag.is_empty() {
            let bindings = Bindings::new().with("tag", tag.as_str());
            for rule in &self.cmd.tag_lookup_cmd {
                let out = match self.run(dir, &rule.cmd, &bindings, Report::VerboseOnly) {
                    Ok(out) => out,
                    Err(VcsError::Process { .. }) => continue,
                    Err(err) => return Err(err),
                };

                if let Some(resolved) = rule.extract_first(&String::from_utf8_lossy(&out))? {
                    debug!("resolved tag {tag:?} to {resolved:?}");
                    tag = resolved;
                    break;
                }
            }
        }

        if tag.is_empty() {
            if let Some(default) = &self.cmd.tag_sync_default {
                for cmd in default {
                    self.run(dir, cmd, &Bindings::new(), Report::Always)?;
                }
                return Ok(());
            }
        }

        let bindings = Bindings::new().with("tag", tag);
        for cmd in &self.cmd.tag_sync_cmd {
            self.run(dir, cmd, &bindings, Report::Always)?;
        }

        Ok(())
    }

    /// Determine remote repository URL of copy at `dir`.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::RemoteNotConfigured`] if no remote origin is set.
    /// - Return [`VcsError::Parse`] if the answer cannot be understood, or
    ///   the backend cannot report remotes at all.
    /// - Return [`VcsError::Process`] if the query fails for another reason.
    /// - Return [`VcsError::ToolMissing`] if backend tool is not installed.
    pub fn remote_repo(&self, dir: impl AsRef<Path>) -> Result<Url> {
        let dir = dir.as_ref();
        let Some(rule) = &self.cmd.remote else {
            return Err(VcsError::Parse {
                command: format!("{} remote lookup", self.cmd.cmd),
                source: None,
            });
        };

        let not_configured = || VcsError::RemoteNotConfigured {
            dir: dir.to_path_buf(),
        };

        // INVARIANT: A silent answer means the query was valid but nothing is set.
        let out = match self.run(dir, &rule.cmd, &Bindings::new(), Report::VerboseOnly) {
            Ok(out) => out,
            Err(VcsError::Process { stdout, stderr, .. })
                if stdout.is_empty() && stderr.trim().is_empty() =>
            {
                return Err(not_configured())
            }
            Err(err) => return Err(err),
        };

        let out = String::from_utf8_lossy(&out);
        if out.trim().is_empty() {
            return Err(not_configured());
        }

        rule.normalize(&out, &self.cmd.scheme)
    }

    fn run(
        &self,
        dir: impl Into<PathBuf>,
        template: &str,
        bindings: &Bindings,
        report: Report,
    ) -> Result<Vec<u8>> {
        Invocation::new(&self.cmd.name, &self.cmd.cmd, dir, expand(template, bindings)).run(
            &self.runner,
            report,
            self.verbose,
        )
    }
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Backend tool is not installed.
    #[error("missing {name} command, install {cmd:?} and make sure it is on your PATH")]
    ToolMissing { name: String, cmd: String },

    /// Backend tool exited unsuccessfully.
    #[error("command {command:?} failed in {:?}: {}", dir.display(), stderr.trim())]
    Process {
        dir: PathBuf,
        command: String,
        status: Option<i32>,
        stderr: String,
        stdout: Vec<u8>,
    },

    /// Output of backend tool cannot be understood.
    #[error("could not determine repository URL from output of {command:?}")]
    Parse {
        command: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// Query worked, but no remote origin is configured.
    #[error("remote origin not configured in {:?}", dir.display())]
    RemoteNotConfigured { dir: PathBuf },

    /// Directory requested by a command cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Backend tool cannot be started.
    #[error("failed to start {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Pattern of a command table does not compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

impl VcsError {
    /// Check if error just means "no remote configured".
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::RemoteNotConfigured { .. })
    }
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
