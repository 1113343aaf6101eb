use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use clap::Args;
use client::{Api, ImportPipeline};
use engine::ImportOptions;

use crate::commands::CommandResult;
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import.
    file: PathBuf,
    /// Currency applied to rows without one; defaults to the configured
    /// one.
    #[arg(long)]
    currency: Option<String>,
    /// Create categories the file names but the backend does not know.
    #[arg(long)]
    create_categories: bool,
    /// Create vendors the file names but the backend does not know.
    #[arg(long)]
    create_vendors: bool,
    /// Write the validation issues to this file as CSV.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Validate and preview only; create nothing.
    #[arg(long)]
    dry_run: bool,
    /// Import the valid rows even when some rows are invalid.
    #[arg(long)]
    force: bool,
}

pub async fn run(api: &Api, settings: &AppConfig, args: ImportArgs) -> CommandResult {
    let currencies = api
        .currencies_list()
        .await?
        .into_iter()
        .map(|c| c.code)
        .collect();
    let categories = api.categories_list().await?;
    let vendors = api.vendors_list().await?;

    let default_currency = args
        .currency
        .unwrap_or_else(|| settings.default_currency.clone())
        .to_uppercase();

    let mut pipeline = ImportPipeline::new(
        currencies,
        &categories,
        &vendors,
        default_currency.clone(),
    );
    pipeline.load_file(File::open(&args.file)?)?;
    pipeline.to_options()?;
    pipeline.set_options(ImportOptions {
        default_currency,
        create_missing_categories: args.create_categories,
        create_missing_vendors: args.create_vendors,
    })?;

    let valid = pipeline.validation().valid.len();
    let invalid = pipeline.validation().invalid.len();
    println!("{valid} of {} rows valid", valid + invalid);
    for issue in pipeline.validation().issues() {
        println!("  row {}: {} ({})", issue.row, issue.message, issue.field);
    }

    if let Some(path) = &args.report {
        std::fs::write(path, pipeline.error_report()?)?;
        println!("wrote issue report to {}", path.display());
    }

    if args.dry_run {
        return Ok(());
    }
    if invalid > 0 && !args.force {
        eprintln!("{invalid} invalid row(s); rerun with --force to import only the valid rows");
        std::process::exit(1);
    }

    let summary = pipeline
        .run(api, |done, total| {
            print!("\rimporting {done}/{total}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    println!("imported {}, failed {}", summary.imported, summary.failed);
    for issue in &summary.errors {
        println!("  row {}: {} ({})", issue.row, issue.message, issue.field);
    }
    Ok(())
}
