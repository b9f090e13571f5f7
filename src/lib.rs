// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manage your development environment.
//!
//! Devtools keeps working copies of the projects you work on inside one
//! projects directory. Repositories are fetched by driving the version
//! control tool's own command-line interface, see [`vcs`].

pub mod config;
pub mod fetch;
pub mod path;
pub mod vcs;

pub use config::{Config, ProjectEntry};
pub use fetch::{fetch_project, Project};
pub use vcs::{Vcs, VcsCmd, VcsError, VcsRegistry};
