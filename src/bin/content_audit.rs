//! Content audit binary - reports duplicate and orphaned content rows
//!
//! Usage:
//!   cargo run --bin content-audit                          # Print summary
//!   cargo run --bin content-audit -- --output audit.json   # Also write JSON report
//!
//! Required environment variables:
//! - STORE_URL
//! - STORE_API_KEY
//!
//! Exits with status 1 when the audit finds problems.

use anyhow::{Context, Result};
use showcase_content::{audit, config::Config, store::RestStore};
use std::path::PathBuf;
use tracing::info;

/// `--output <file>` or `--output=<file>`.
fn output_path(args: &[String]) -> Result<Option<PathBuf>> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--output=") {
            return Ok(Some(PathBuf::from(path)));
        }
        if arg == "--output" {
            let path = iter.next().context("--output requires a file path")?;
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("showcase_content=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = output_path(&args)?;

    let config = Config::from_env()?;
    let store = RestStore::from_config(&config);

    let report = audit::run_audit(&store).await?;

    println!("\n========== CONTENT AUDIT ==========");
    println!("{}", report.summary());
    for group in &report.duplicates {
        println!(
            "duplicate: {}/{}/{}/{} -> {}",
            group.section_key,
            group.media_id.as_deref().unwrap_or("-"),
            group.language_code,
            group.content_key,
            group.ids.join(", ")
        );
    }
    for orphan in &report.orphaned_sections {
        println!("unknown section '{}': row {}", orphan.missing, orphan.id);
    }
    for orphan in &report.orphaned_media {
        println!("unknown media '{}': row {}", orphan.missing, orphan.id);
    }
    println!("===================================\n");

    if let Some(path) = output {
        audit::write_report(&report, &path)?;
        info!("Report written to {}", path.display());
    }

    if !report.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}
