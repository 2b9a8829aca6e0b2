mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod runlog;
mod services;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::pr::{self as pr_cmd, PrCommandArgs};
use crate::cmd::{runs, setup, ticket};
use crate::config::{AppConfig, TrackerProvider};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::directory::DirectorySource;
use crate::infra::fixtures::{FixtureGenerator, FixtureTracker};
use crate::infra::git::GitCli;
use crate::infra::github::GitHubClient;
use crate::infra::jira::JiraClient;
use crate::infra::memory::InMemoryRepository;
use crate::services::{
    CodeGenerationService, IssueTrackerService, RepositoryApi, TestGenerationService,
};
use crate::workflow::delivery::DeliveryRequest;

#[derive(Parser)]
#[command(
    name = "sdlc",
    author,
    version,
    about = "Ticket-to-pull-request developer workflow CLI"
)]
struct Cli {
    /// Log every remote request.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a repository and make it the default target.
    Setup(SetupArgs),
    /// List open tickets.
    Tickets,
    /// Show a ticket and its extracted requirements.
    Ticket(TicketArgs),
    /// Generate code and tests for a ticket and open a pull request.
    Pr(PrArgs),
    /// List recorded pull request workflow runs.
    Runs,
    /// Delete the branch left behind by a ticket's latest failed run.
    Abort(TicketArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct SetupArgs {
    /// Repository URL, e.g. https://github.com/owner/repo
    url: String,
    /// Do not store the repository in the config file.
    #[arg(long)]
    no_save: bool,
}

#[derive(Args)]
struct TicketArgs {
    /// Ticket key, e.g. ASCII-1
    ticket_id: String,
}

#[derive(Args)]
struct PrArgs {
    /// Ticket key, e.g. ASCII-1
    ticket_id: String,
    /// Branch name (default: feature/<ticket>-ascii-art-converter).
    #[arg(long)]
    branch: Option<String>,
    /// Pull request title.
    #[arg(long)]
    title: Option<String>,
    /// Pull request description.
    #[arg(long)]
    description: Option<String>,
    /// Take implementation files from this directory instead of generating them.
    #[arg(long)]
    impl_dir: Option<PathBuf>,
    /// Take test files from this directory instead of generating them.
    #[arg(long)]
    tests_dir: Option<PathBuf>,
    /// Run against an in-memory repository; nothing is pushed.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "sdlc=debug" } else { "sdlc=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    // A second initialization only happens in tests; keep the first one.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Returns whether the command succeeded.
async fn run(command: Commands) -> AppResult<bool> {
    match command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(true)
        }
        Commands::Runs => {
            runs::list()?;
            Ok(true)
        }
        other => run_with_config(other).await,
    }
}

async fn run_with_config(command: Commands) -> AppResult<bool> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd)?;

    match command {
        Commands::Setup(args) => {
            let ctx = build_context(config, Sources::default())?;
            let local = setup::run(&ctx, &args.url, !args.no_save).await?;
            println!(
                "Repository {} ready at {}",
                local.coordinates,
                local.local_path.display()
            );
            Ok(true)
        }
        Commands::Tickets => {
            let ctx = build_context(config, Sources::default())?;
            ticket::list(&ctx).await?;
            Ok(true)
        }
        Commands::Ticket(args) => {
            let ctx = build_context(config, Sources::default())?;
            ticket::show(&ctx, &args.ticket_id).await?;
            Ok(true)
        }
        Commands::Abort(args) => {
            let ctx = build_context(config, Sources::default())?;
            let branch = runs::abort(&ctx, &args.ticket_id).await?;
            println!("Deleted branch {branch}");
            Ok(true)
        }
        Commands::Pr(args) => {
            let sources = Sources {
                impl_dir: args.impl_dir,
                tests_dir: args.tests_dir,
                dry_run: args.dry_run,
            };
            let ctx = build_context(config, sources)?;
            let outcome = pr_cmd::run(
                &ctx,
                PrCommandArgs {
                    request: DeliveryRequest {
                        ticket_id: args.ticket_id,
                        branch: args.branch,
                        title: args.title,
                        description: args.description,
                    },
                    record: !args.dry_run,
                },
            )
            .await?;
            pr_cmd::report(&outcome);
            Ok(outcome.result.is_success())
        }
        Commands::Config(_) | Commands::Runs => Ok(true),
    }
}

#[derive(Default)]
struct Sources {
    impl_dir: Option<PathBuf>,
    tests_dir: Option<PathBuf>,
    dry_run: bool,
}

fn build_context(config: AppConfig, sources: Sources) -> AppResult<AppContext> {
    if !sources.dry_run {
        if config.github.token.is_none() {
            warn!("GitHub token not configured; pull request creation will fail.");
        }
        if config.github.owner.is_none() {
            warn!("GitHub owner not configured; run `sdlc setup <url>` or set GITHUB_ORG.");
        }
    }

    let issue_tracker: Arc<dyn IssueTrackerService> = match &config.tracker {
        TrackerProvider::Fixture => Arc::new(FixtureTracker),
        TrackerProvider::Jira => Arc::new(JiraClient::new(config.jira.clone())),
        TrackerProvider::Custom(provider) => {
            warn!(provider = %provider, "unknown ticket tracker, using fixture tickets");
            Arc::new(FixtureTracker)
        }
    };

    let code_generator: Arc<dyn CodeGenerationService> = match sources.impl_dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)),
        None => Arc::new(FixtureGenerator),
    };
    let test_generator: Arc<dyn TestGenerationService> = match sources.tests_dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)),
        None => Arc::new(FixtureGenerator),
    };

    let repository: Arc<dyn RepositoryApi> = if sources.dry_run {
        Arc::new(InMemoryRepository::new().with_branch(&config.github.base_branch))
    } else {
        Arc::new(GitHubClient::new(&config.github)?)
    };

    Ok(AppContext::new(
        config,
        Arc::new(GitCli),
        issue_tracker,
        code_generator,
        test_generator,
        repository,
    ))
}
