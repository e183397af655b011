use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use standup_core::{render_digest, Member, Report, ReportRepository, SqliteRepository, TelegramClient};

/// Standup: operator tool for the daily report bot
#[derive(Parser, Debug)]
#[command(name = "standup")]
#[command(about = "Operator tool for the daily standup report bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the stored reports
    List(DbArgs),
    /// Render the publish digest without sending or clearing anything
    Digest(DbArgs),
    /// Delete all stored reports
    Clear(DbArgs),
    /// List the group administrators via the Bot API
    Members(MembersArgs),
}

#[derive(Parser, Debug)]
struct DbArgs {
    /// Directory holding the report database (if not provided, will use the
    /// STATE_DIR environment variable, then the current directory)
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MembersArgs {
    /// Group chat id to query
    #[arg(long)]
    group_id: i64,

    /// Bot token (if not provided, will use TELEGRAM_BOT_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,
}

fn open_repository(args: &DbArgs) -> Result<SqliteRepository> {
    let state_dir = args
        .state_dir
        .clone()
        .or_else(|| std::env::var("STATE_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let db_path = state_dir.join("standup-reports.db");
    SqliteRepository::new(&db_path)
        .with_context(|| format!("Failed to open report database at {}", db_path.display()))
}

fn print_report(report: &Report) {
    println!(
        "Report from user {} ({}):",
        report.user_id,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Today I worked on:\n{}", report.tasks_today);
    println!("Questions/Blockers:\n{}", report.blockers);
    println!("Tomorrow I will be working on:\n{}\n", report.tasks_tomorrow);
}

async fn run_list(args: DbArgs) -> Result<()> {
    let repository = open_repository(&args)?;
    let reports = repository.list().await?;

    if reports.is_empty() {
        println!("No reports stored.");
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }

    Ok(())
}

async fn run_digest(args: DbArgs) -> Result<()> {
    let repository = open_repository(&args)?;
    let reports = repository.list().await?;

    if reports.is_empty() {
        println!("No daily reports found.");
        return Ok(());
    }

    // No Bot API access here, so every author gets the fallback name.
    let entries: Vec<(Member, Report)> = reports
        .into_iter()
        .map(|report| (Member::unresolved(report.user_id), report))
        .collect();

    println!("{}", render_digest(&entries));

    Ok(())
}

async fn run_clear(args: DbArgs) -> Result<()> {
    let repository = open_repository(&args)?;
    let removed = repository.take_all().await?;

    println!("Removed {} reports.", removed.len());

    Ok(())
}

async fn run_members(args: MembersArgs) -> Result<()> {
    let token = args
        .token
        .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
        .context(
            "Bot token must be provided via --token argument or TELEGRAM_BOT_TOKEN environment variable",
        )?;

    let client = TelegramClient::new(&token, None)?;
    let mut administrators = client.get_chat_administrators(args.group_id).await?;

    // Sort by user id for consistent output
    administrators.sort_by_key(|info| info.user.id);

    for info in administrators {
        let bot_marker = if info.user.is_bot { " (bot)" } else { "" };
        println!(
            "{}\t{}\t{}{}",
            info.user.id,
            info.status,
            info.user.display_name(),
            bot_marker
        );
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List(args) => run_list(args).await,
        Commands::Digest(args) => run_digest(args).await,
        Commands::Clear(args) => run_clear(args).await,
        Commands::Members(args) => run_members(args).await,
    }
}
