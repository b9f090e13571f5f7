// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use devtools::{
    config::Config,
    fetch::{fetch_project, list_tags, remote_of, select_backend, FetchError, Project},
    path::{default_config_path, default_projects_dir},
    vcs::{Vcs, VcsRegistry},
};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "devtools [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Print debug logs and diagnostics of expected failures too.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let mut config = Config::load(config_path)?;
        config.settings.verbose |= self.verbose;

        Ok(config)
    }

    async fn run(self, config: Config) -> Result<()> {
        match self.command {
            Command::Fetch(opts) => run_fetch(&config, opts),
            Command::Sync => run_sync(config).await,
            Command::Tags(opts) => run_tags(&config, opts),
            Command::Remote(opts) => run_remote(&config, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fetch a project from VCS.
    #[command(visible_alias = "f", override_usage = "devtools fetch [options] <repo>")]
    Fetch(FetchOptions),

    /// Fetch every project listed in configuration.
    #[command(override_usage = "devtools sync [options]")]
    Sync,

    /// List tags of fetched project.
    #[command(override_usage = "devtools tags [options] <name>")]
    Tags(ProjectOptions),

    /// Show remote repository of fetched project.
    #[command(override_usage = "devtools remote [options] <name>")]
    Remote(ProjectOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct FetchOptions {
    /// Repository to fetch, with or without scheme.
    #[arg(required = true, value_name = "repo")]
    pub repo: String,

    /// Local name of project instead of repository name.
    #[arg(short, long, value_name = "name")]
    pub name: Option<String>,

    /// Tag or branch to sync to.
    #[arg(short, long, value_name = "tag")]
    pub tag: Option<String>,

    /// Version control system to use.
    #[arg(long, value_name = "vcs", default_value = "git")]
    pub vcs: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ProjectOptions {
    /// Name of fetched project.
    #[arg(required = true, value_name = "name")]
    pub name: String,

    /// Version control system to use.
    #[arg(long, value_name = "vcs")]
    pub vcs: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.load_config();

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(&cli, config.as_ref().ok())));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    let result = match config {
        Ok(config) => cli.run(config).await,
        Err(error) => Err(error),
    };
    if let Err(error) = result {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

// INVARIANT: Verbose setting from configuration raises log level just like `-v`.
fn default_log_level(cli: &Cli, config: Option<&Config>) -> &'static str {
    let verbose = cli.verbose || config.is_some_and(|config| config.settings.verbose);
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn projects_dir(config: &Config) -> Result<PathBuf> {
    match &config.settings.projects_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(default_projects_dir()?),
    }
}

fn open_vcs(config: &Config, name: &str) -> Result<Vcs> {
    let cmd = select_backend(&VcsRegistry::builtin(), name)?;
    Ok(Vcs::system(cmd).with_verbose(config.settings.verbose))
}

fn run_fetch(config: &Config, opts: FetchOptions) -> Result<()> {
    let mut project = Project::new(opts.repo)?.with_vcs(opts.vcs);
    if let Some(name) = opts.name {
        project = project.with_name(name);
    }
    if let Some(tag) = opts.tag {
        project = project.with_tag(tag);
    }

    let vcs = open_vcs(config, &project.vcs)?;
    let dir = fetch_project(
        &vcs,
        projects_dir(config)?,
        &project,
        config.settings.allow_insecure,
    )?;
    info!("{} ready at {:?}", project.name, dir.display());

    Ok(())
}

async fn run_sync(config: Config) -> Result<()> {
    let projects_dir = projects_dir(&config)?;
    let tasks = config.projects.iter().map(Project::from).map(|project| {
        let vcs = open_vcs(&config, &project.vcs);
        let projects_dir = projects_dir.clone();
        let allow_insecure = config.settings.allow_insecure;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let dir = fetch_project(&vcs?, projects_dir, &project, allow_insecure)
                .map_err(|err| anyhow!("{}: {err}", project.name))?;
            info!("{} ready at {:?}", project.name, dir.display());
            Ok(())
        })
    });

    let mut failed = 0;
    for result in join_all(tasks).await {
        if let Err(err) = result? {
            error!("{err}");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("failed to sync {failed} of {} projects", config.projects.len()));
    }

    Ok(())
}

fn run_tags(config: &Config, opts: ProjectOptions) -> Result<()> {
    let vcs = project_vcs(config, &opts)?;
    for tag in list_tags(&vcs, projects_dir(config)?, &opts.name)? {
        println!("{tag}");
    }

    Ok(())
}

fn run_remote(config: &Config, opts: ProjectOptions) -> Result<()> {
    let vcs = project_vcs(config, &opts)?;
    match remote_of(&vcs, projects_dir(config)?, &opts.name) {
        Ok(url) => println!("{url}"),
        Err(FetchError::Vcs(err)) if err.is_not_configured() => {
            info!("{} has no remote origin", opts.name)
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

fn project_vcs(config: &Config, opts: &ProjectOptions) -> Result<Vcs> {
    let vcs_name = opts
        .vcs
        .clone()
        .or_else(|| config.project(&opts.name).and_then(|entry| entry.vcs.clone()))
        .unwrap_or_else(|| "git".into());

    open_vcs(config, &vcs_name)
}
