// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::FakeGit;

use anyhow::Result;
use devtools::{
    fetch::{fetch_project, Project},
    vcs::{Vcs, VcsCmd, VcsError},
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{env, fs, path::Path};

const REFS: &str = indoc! {"
    1111 refs/heads/main
    2222 refs/remotes/origin/main
    3333 refs/tags/v1.0
    4444 refs/tags/v1.1
"};

#[sealed_test]
fn create_passes_arguments_verbatim() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    let vcs = Vcs::system(VcsCmd::git());

    vcs.create("my project", "https://host/org/repo")?;
    assert!(Path::new("my project").is_dir());
    assert!(!Path::new("my").exists());

    let calls = git.calls()?;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, 4);
    assert_eq!(calls[0].2, "clone -- https://host/org/repo my project");
    Ok(())
}

#[sealed_test]
fn commands_run_inside_working_copy() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    let dir = env::current_dir()?.join("repo");
    fs::create_dir_all(&dir)?;

    Vcs::system(VcsCmd::git()).download(&dir)?;

    let calls = git.calls()?;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.ends_with("/repo"));
    assert_eq!(calls[0].2, "pull --ff-only");
    Ok(())
}

#[sealed_test]
fn list_tags_and_branches() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    git.refs(REFS)?;

    let tags = Vcs::system(VcsCmd::git()).tags(".")?;
    assert_eq!(tags, vec!["main", "v1.0", "v1.1"]);
    Ok(())
}

#[sealed_test]
fn sync_to_known_tag() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    git.refs(REFS)?;

    Vcs::system(VcsCmd::git()).tag_sync(".", "v1.0")?;
    assert_eq!(git.args()?, vec!["show-ref tags/v1.0 origin/v1.0", "checkout tags/v1.0"]);
    Ok(())
}

#[sealed_test]
fn sync_to_unknown_tag_passes_it_through() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    git.refs(REFS)?;

    Vcs::system(VcsCmd::git()).tag_sync(".", "abc123")?;
    assert_eq!(git.args()?, vec!["show-ref tags/abc123 origin/abc123", "checkout abc123"]);
    Ok(())
}

#[sealed_test]
fn sync_to_default_state() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;

    Vcs::system(VcsCmd::git()).tag_sync(".", "")?;
    assert_eq!(git.args()?, vec!["submodule update --init --recursive"]);
    Ok(())
}

#[sealed_test]
fn remote_in_scp_syntax() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    git.remote("git@example.com:org/repo.git");

    let url = Vcs::system(VcsCmd::git()).remote_repo(".")?;
    assert_eq!(url.as_str(), "ssh://git@example.com/org/repo.git");
    Ok(())
}

#[sealed_test]
fn remote_not_configured() -> Result<()> {
    let _git = FakeGit::install(env::current_dir()?)?;

    let result = Vcs::system(VcsCmd::git()).remote_repo(".");
    assert!(matches!(result, Err(ref err) if err.is_not_configured()));
    Ok(())
}

#[sealed_test]
fn ping_unreachable_repository() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    let vcs = Vcs::system(VcsCmd::git());

    vcs.ping("https", "host/org/repo")?;
    let result = vcs.ping("ssh", "host/org/repo");
    assert!(matches!(result, Err(VcsError::Process { status: Some(128), .. })));
    assert_eq!(git.args()?.len(), 2);
    Ok(())
}

#[sealed_test]
fn missing_tool_spawns_nothing() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    fs::create_dir_all("empty")?;
    env::set_var("PATH", env::current_dir()?.join("empty"));

    let result = Vcs::system(VcsCmd::git()).create("repo", "https://host/org/repo");
    assert!(matches!(result, Err(VcsError::ToolMissing { ref cmd, .. }) if cmd == "git"));
    assert!(git.calls()?.is_empty());
    Ok(())
}

#[sealed_test]
fn mkdir_and_cd_directives() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    let mut cmd = VcsCmd::git();
    cmd.create_cmd = vec!["-vcs-mkdir {dir} -vcs-cd {dir} init".into()];

    Vcs::system(cmd).create("fresh", "https://host/org/repo")?;
    assert!(Path::new("fresh").is_dir());

    let calls = git.calls()?;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.ends_with("/fresh"));
    assert_eq!(calls[0].2, "init");
    Ok(())
}

#[sealed_test]
fn fetch_then_update_project() -> Result<()> {
    let git = FakeGit::install(env::current_dir()?)?;
    git.refs(REFS)?;
    let vcs = Vcs::system(VcsCmd::git());
    let project = Project::new("host/org/repo")?.with_tag("v1.1");

    let dir = fetch_project(&vcs, "projects", &project, false)?;
    assert!(dir.is_dir());
    assert_eq!(
        git.args()?,
        vec![
            "ls-remote https://host/org/repo",
            "clone -- https://host/org/repo projects/repo",
            "show-ref tags/v1.1 origin/v1.1",
            "checkout tags/v1.1",
        ]
    );

    git.remote("https://host/org/repo");
    fetch_project(&vcs, "projects", &project, false)?;
    assert_eq!(
        git.args()?[4..],
        [
            "config remote.origin.url",
            "pull --ff-only",
            "show-ref tags/v1.1 origin/v1.1",
            "checkout tags/v1.1",
        ]
    );
    Ok(())
}
