// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process execution.
//!
//! Backends are driven through their command-line tool. This module turns an
//! expanded argument vector into a child process, captures its standard
//! output, and reports failures.
//!
//! # Directives
//!
//! Two directives may lead an argument vector. They are consumed here and
//! never reach the external tool:
//!
//! - `-vcs-mkdir <path>` creates `<path>` (relative to the working directory
//!   unless absolute) before the tool runs.
//! - `-vcs-cd <path>` changes the working directory the tool runs in.
//!
//! When both are present, `-vcs-mkdir` must come first.

use crate::vcs::{Result, VcsError};

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, instrument};

/// Directive to create a directory before running the tool.
pub const MKDIR_DIRECTIVE: &str = "-vcs-mkdir";

/// Directive to change working directory before running the tool.
pub const CD_DIRECTIVE: &str = "-vcs-cd";

/// Captured result of a finished child process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, if the child exited normally.
    pub status: Option<i32>,

    /// Whether the child exited successfully.
    pub success: bool,

    /// Captured standard output.
    pub stdout: Vec<u8>,

    /// Captured standard error.
    pub stderr: Vec<u8>,
}

/// Execute external programs.
///
/// Layer of indirection between the VCS facade and the operating system.
pub trait Runner {
    /// Locate `program` on the search path.
    fn lookup(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` with `args` inside `dir`, capturing its output.
    fn execute(&self, program: &Path, args: &[String], dir: &Path) -> io::Result<CommandOutput>;

    /// Emit a user-facing diagnostic.
    fn diagnose(&self, message: &[u8]) {
        let _ = io::stderr().write_all(message);
    }
}

/// Run programs as child processes of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn lookup(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn execute(&self, program: &Path, args: &[String], dir: &Path) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .env("PWD", dir)
            .output()?;

        Ok(CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// When a failed command should print its diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Print on every failure.
    #[default]
    Always,

    /// Print only in verbose mode. Failure is an expected answer here.
    VerboseOnly,
}

/// One invocation of a backend tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Display name of the backend, e.g., "Git".
    pub name: String,

    /// Executable to run, e.g., "git".
    pub program: String,

    /// Effective working directory.
    pub dir: PathBuf,

    /// Arguments passed to the tool.
    pub args: Vec<String>,
}

impl Invocation {
    /// Construct new invocation from already expanded arguments.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        dir: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            dir: dir.into(),
            args,
        }
    }

    /// Apply leading directives, returning the invocation that actually runs.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::CreateDir`] if a `-vcs-mkdir` directive fails.
    pub fn apply_directives(&self) -> Result<Self> {
        let mut dir = self.dir.clone();
        let mut args = self.args.as_slice();

        if args.len() >= 2 && args[0] == MKDIR_DIRECTIVE {
            let path = dir.join(&args[1]);
            fs::create_dir(&path).map_err(|err| VcsError::CreateDir { source: err, path })?;
            args = &args[2..];
        }

        if args.len() >= 2 && args[0] == CD_DIRECTIVE {
            dir = dir.join(&args[1]);
            args = &args[2..];
        }

        Ok(Self {
            name: self.name.clone(),
            program: self.program.clone(),
            dir,
            args: args.to_vec(),
        })
    }

    /// Full command line for display.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run invocation through `runner`, returning captured standard output.
    ///
    /// Directives are applied only once the program is known to exist. On
    /// failure, a diagnostic naming the directory, the command line, and
    /// the captured standard error is handed to [`Runner::diagnose`] when
    /// `report` is [`Report::Always`] or `verbose` is set.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::ToolMissing`] if the program is not on the search
    ///   path. Nothing is spawned in this case.
    /// - Return [`VcsError::CreateDir`] if a `-vcs-mkdir` directive fails.
    /// - Return [`VcsError::Spawn`] if the child cannot be started.
    /// - Return [`VcsError::Process`] if the child exits unsuccessfully.
    #[instrument(skip(self, runner), fields(dir = %self.dir.display()), level = "debug")]
    pub fn run<R: Runner + ?Sized>(&self, runner: &R, report: Report, verbose: bool) -> Result<Vec<u8>> {
        let program = runner.lookup(&self.program).ok_or_else(|| VcsError::ToolMissing {
            name: self.name.clone(),
            cmd: self.program.clone(),
        })?;
        let this = self.apply_directives()?;

        debug!("run {}", this.command_line());
        let loud = report == Report::Always || verbose;
        let output = match runner.execute(&program, &this.args, &this.dir) {
            Ok(output) => output,
            Err(err) => {
                if loud {
                    this.diagnose(runner, err.to_string().as_bytes());
                }
                return Err(VcsError::Spawn {
                    source: err,
                    program: this.program.clone(),
                });
            }
        };

        if !output.success {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if loud {
                if output.stderr.is_empty() {
                    let text = match output.status {
                        Some(code) => format!("exit status {code}\n"),
                        None => "terminated by signal\n".to_string(),
                    };
                    this.diagnose(runner, text.as_bytes());
                } else {
                    this.diagnose(runner, &output.stderr);
                }
            }

            return Err(VcsError::Process {
                command: this.command_line(),
                dir: this.dir,
                status: output.status,
                stderr,
                stdout: output.stdout,
            });
        }

        Ok(output.stdout)
    }

    fn diagnose<R: Runner + ?Sized>(&self, runner: &R, detail: &[u8]) {
        let header = format!("# cd {}; {}\n", self.dir.display(), self.command_line());
        runner.diagnose(header.as_bytes());
        runner.diagnose(detail);
    }
}
