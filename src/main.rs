// Copyright 2026 Memetrace Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use memetrace::cli;
use memetrace::config::default_cookie_path;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "memetrace",
    about = "Memetrace — track a meme's lifecycle from a live social feed",
    version,
    after_help = "Run 'memetrace <command> --help' for details on each command."
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll-collect posts mentioning a phrase into a raw CSV
    Collect {
        /// The search phrase (e.g. "chill guy")
        query: String,
        /// Stop after this many posts
        #[arg(long)]
        max_posts: Option<usize>,
        /// Run with a visible browser window instead of headless
        #[arg(long)]
        show_browser: bool,
        /// Path to the exported session cookie file
        #[arg(long)]
        cookies: Option<PathBuf>,
    },
    /// Clean and enrich the latest raw capture for a phrase
    Preprocess {
        query: String,
    },
    /// Generate the lifecycle report from the processed set
    Report {
        query: String,
    },
    /// Full pipeline: collect, preprocess, report
    Run {
        query: String,
        /// Stop collection after this many posts
        #[arg(long, default_value = "1000")]
        max_posts: usize,
        /// Skip the collection stage and reuse existing captures
        #[arg(long)]
        skip_collection: bool,
        /// Run with a visible browser window instead of headless
        #[arg(long)]
        show_browser: bool,
        /// Path to the exported session cookie file
        #[arg(long)]
        cookies: Option<PathBuf>,
    },
    /// Check environment and diagnose issues
    Doctor {
        /// Path to the exported session cookie file
        #[arg(long)]
        cookies: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags flow through env vars so every module can check them
    if cli.quiet {
        std::env::set_var("MEMETRACE_QUIET", "1");
    }
    if cli.no_color {
        std::env::set_var("MEMETRACE_NO_COLOR", "1");
    }

    let default_level = if cli.verbose {
        "memetrace=debug"
    } else if cli.quiet {
        "memetrace=warn"
    } else {
        "memetrace=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Collect {
            query,
            max_posts,
            show_browser,
            cookies,
        } => {
            let cookie_path = cookies.unwrap_or_else(default_cookie_path);
            cli::collect_cmd::run(&query, max_posts, show_browser, &cookie_path)
                .await
                .map(|_| ())
        }
        Commands::Preprocess { query } => cli::preprocess_cmd::run(&query).map(|_| ()),
        Commands::Report { query } => cli::report_cmd::run(&query).map(|_| ()),
        Commands::Run {
            query,
            max_posts,
            skip_collection,
            show_browser,
            cookies,
        } => {
            let cookie_path = cookies.unwrap_or_else(default_cookie_path);
            cli::run_cmd::run(
                &query,
                Some(max_posts),
                skip_collection,
                show_browser,
                &cookie_path,
            )
            .await
        }
        Commands::Doctor { cookies } => cli::doctor::run(cookies.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "memetrace", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
