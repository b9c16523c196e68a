use std::process::ExitCode;

use clap::Parser;
use db_cleaner::config::env::{database_url, options_from_env, parse_list};
use db_cleaner::safeguard::Safeguard;
use db_cleaner::{
    connect_single_session, sanitize_db_url, CleanerError, Truncation, TruncationOptions,
};
use tracing::error;

#[derive(Parser)]
#[command(name = "db-clean")]
#[command(about = "Empty the tables of a test database, keeping its schema")]
struct Args {
    /// Database URL (defaults to DATABASE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Comma-separated tables to truncate; nothing else is touched
    #[arg(long, conflicts_with = "except")]
    only: Option<String>,

    /// Comma-separated tables to leave alone
    #[arg(long)]
    except: Option<String>,

    /// Skip tables that were never written to (MySQL)
    #[arg(long)]
    pre_count: bool,

    /// Keep identity and auto-increment counters
    #[arg(long)]
    keep_ids: bool,

    /// Allow a database URL that does not point at this machine
    #[arg(long)]
    allow_remote: bool,

    /// Print the tables that would be truncated and exit
    #[arg(long)]
    dry_run: bool,
}

enum Failure {
    Usage(CleanerError),
    Clean(CleanerError),
}

impl Failure {
    fn code(&self) -> u8 {
        match self {
            Failure::Usage(_) => 2,
            Failure::Clean(_) => 1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_env_filter("db_cleaner=info,sqlx=warn")
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            match &failure {
                Failure::Usage(e) => eprintln!("{e}"),
                Failure::Clean(e) => {
                    error!(error = %e, "clean=failed");
                    eprintln!("Cleaning failed: {e}");
                }
            }
            ExitCode::from(failure.code())
        }
    }
}

/// Flags win over `DB_CLEANER_*` variables. A table list given on the
/// command line replaces both lists from the environment.
fn apply_args(mut options: TruncationOptions, args: &Args) -> TruncationOptions {
    if let Some(only) = args.only.as_deref() {
        options.only = Some(parse_list(only));
        options.except.clear();
    }
    if let Some(except) = args.except.as_deref() {
        options.except = parse_list(except);
        options.only = None;
    }
    if args.pre_count {
        options.pre_count = true;
    }
    if args.keep_ids {
        options.reset_ids = false;
    }
    options
}

async fn run(args: Args) -> Result<(), Failure> {
    let url = match args.url.clone() {
        Some(url) => url,
        None => database_url().map_err(Failure::Usage)?,
    };

    let options = options_from_env().map_err(Failure::Usage)?;
    let cleaner = Truncation::new(apply_args(options, &args)).map_err(Failure::Usage)?;

    Safeguard::from_env()
        .allow_remote(args.allow_remote)
        .check(&url)
        .map_err(Failure::Usage)?;

    let conn = connect_single_session(&url)
        .await
        .map_err(Failure::Clean)?;

    if args.dry_run {
        let tables = cleaner
            .tables_to_truncate(&conn)
            .await
            .map_err(Failure::Clean)?;
        println!(
            "{} table(s) would be truncated in {}:",
            tables.len(),
            sanitize_db_url(&url)
        );
        for table in tables {
            println!("  {table}");
        }
        return Ok(());
    }

    cleaner.clean(&conn).await.map_err(Failure::Clean)?;
    println!("Cleaned {}", sanitize_db_url(&url));
    Ok(())
}
