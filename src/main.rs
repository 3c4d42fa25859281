//! student-crawler command line entry point
//!
//! Run with: cargo run -- <locator> [--mode <keyword>] [--config <file>] [--dry-run] [--preview]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use student_crawler::domain::StudentStore;
use student_crawler::infrastructure::{DatabaseConnection, InMemoryStudentStore, SqliteStudentRepository};
use student_crawler::{CrawlPipeline, CrawlerConfig, init_logging};

/// Extract student records from a page and import them into the database
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// http(s) URL, file:// URL or path of the page to crawl
    locator: String,

    /// auto, student_list, student_detail or frontend
    #[arg(short, long, default_value = "auto")]
    mode: String,

    /// TOML/JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured database URL
    #[arg(long)]
    database: Option<String>,

    /// Import into an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    /// Extract and normalize only, print the records
    #[arg(long)]
    preview: bool,
}

async fn open_store(config: &CrawlerConfig, dry_run: bool) -> Result<Arc<dyn StudentStore>> {
    if dry_run {
        info!("Dry run: importing into an in-memory store");
        return Ok(Arc::new(InMemoryStudentStore::new()));
    }

    let db = DatabaseConnection::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    db.migrate().await.context("Failed to migrate database")?;
    Ok(Arc::new(SqliteStudentRepository::new(db.pool().clone())))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.as_deref().map(|path| path.to_string_lossy());
    let mut config = CrawlerConfig::load(config_path.as_deref())?;
    if let Some(url) = args.database {
        config.database_url = url;
    }
    init_logging(&config.logging)?;
    info!("student-crawler {} starting", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config, args.dry_run || args.preview).await?;
    let pipeline = CrawlPipeline::new(&config, store)?;

    let output = if args.preview {
        serde_json::to_string_pretty(&pipeline.preview(&args.locator, &args.mode).await?)?
    } else {
        serde_json::to_string_pretty(&pipeline.run(&args.locator, &args.mode).await?)?
    };
    println!("{output}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "student-crawler",
            "http://localhost:5500/",
            "--mode",
            "frontend",
            "-c",
            "crawler.toml",
            "--database",
            "sqlite::memory:",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.locator, "http://localhost:5500/");
        assert_eq!(args.mode, "frontend");
        assert_eq!(args.config, Some(PathBuf::from("crawler.toml")));
        assert_eq!(args.database.as_deref(), Some("sqlite::memory:"));
        assert!(args.dry_run);
        assert!(!args.preview);
    }

    #[test]
    fn mode_defaults_to_auto() {
        let args = Args::try_parse_from(["student-crawler", "page.html", "--preview"]).unwrap();
        assert_eq!(args.mode, "auto");
        assert_eq!(args.config, None);
        assert!(args.preview);
    }

    #[test]
    fn rejects_bad_command_lines() {
        assert!(Args::try_parse_from(["student-crawler"]).is_err());
        assert!(Args::try_parse_from(["student-crawler", "a.html", "b.html"]).is_err());
        assert!(Args::try_parse_from(["student-crawler", "a.html", "--mode"]).is_err());
        assert!(Args::try_parse_from(["student-crawler", "a.html", "--verbose"]).is_err());

        let help = Args::try_parse_from(["student-crawler", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
