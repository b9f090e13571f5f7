// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Test double for [`Runner`].

use crate::vcs::{CommandOutput, Runner};

use std::{
    cell::RefCell,
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

/// Runner that records calls and answers from a script.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    pub(crate) installed: bool,
    pub(crate) unspawnable: bool,
    pub(crate) answers: HashMap<String, CommandOutput>,
    pub(crate) calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    pub(crate) diagnostics: RefCell<Vec<u8>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            installed: true,
            ..Self::default()
        }
    }

    pub(crate) fn answer(mut self, command: &str, stdout: &str) -> Self {
        self.answers.insert(
            command.into(),
            CommandOutput {
                status: Some(0),
                success: true,
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        );
        self
    }

    pub(crate) fn fail(mut self, command: &str, stdout: &str, stderr: &str) -> Self {
        self.answers.insert(
            command.into(),
            CommandOutput {
                status: Some(1),
                success: false,
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            },
        );
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|(_, args)| args.clone()).collect()
    }

    pub(crate) fn diagnostics(&self) -> String {
        String::from_utf8_lossy(&self.diagnostics.borrow()).into_owned()
    }
}

impl Runner for ScriptedRunner {
    fn lookup(&self, program: &str) -> Option<PathBuf> {
        self.installed.then(|| PathBuf::from("/usr/bin").join(program))
    }

    fn execute(&self, _: &Path, args: &[String], dir: &Path) -> io::Result<CommandOutput> {
        if self.unspawnable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }

        self.calls.borrow_mut().push((dir.to_path_buf(), args.to_vec()));
        Ok(self.answers.get(&args.join(" ")).cloned().unwrap_or(CommandOutput {
            status: Some(0),
            success: true,
            ..CommandOutput::default()
        }))
    }

    fn diagnose(&self, message: &[u8]) {
        self.diagnostics.borrow_mut().extend_from_slice(message);
    }
}
