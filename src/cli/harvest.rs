//! Harvest commands.

use std::path::Path;

use console::style;
#[cfg(feature = "browser")]
use indicatif::{ProgressBar, ProgressStyle};

use listharvest::config::Settings;
#[cfg(feature = "browser")]
use listharvest::harvest::Outcome;
use listharvest::sink::{merge_category_files, MergeSummary};

/// Harvest one listing page.
#[cfg(feature = "browser")]
pub async fn cmd_crawl(
    settings: &Settings,
    url: &str,
    count: usize,
    output: &Path,
) -> anyhow::Result<()> {
    println!(
        "{} Harvesting up to {} items from {}",
        style("→").cyan(),
        count,
        url
    );

    let harvest = listharvest::runner::harvest_page(settings, url, count, output).await?;

    let marker = match harvest.outcome {
        Outcome::ReachedTarget => style("✓").green(),
        Outcome::Exhausted => style("!").yellow(),
    };
    println!(
        "{} {} items ({}, {} scans, {} scrolls)",
        marker,
        harvest.items.len(),
        harvest.outcome,
        harvest.stats.scans,
        harvest.stats.scrolls
    );
    println!("  Saved to {}", output.display());
    Ok(())
}

/// Harvest every selected category and merge the results.
#[cfg(feature = "browser")]
pub async fn cmd_batch(settings: &Settings, only: &[String], count: usize) -> anyhow::Result<()> {
    let categories = settings.select_categories(only)?;
    if categories.is_empty() {
        println!("{} No categories configured", style("!").yellow());
        return Ok(());
    }

    println!(
        "{} {} categories, {} items each (up to {} total)",
        style("→").cyan(),
        categories.len(),
        count,
        categories.len() * count
    );

    let progress = ProgressBar::new(categories.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );

    let report = listharvest::runner::run_batch(settings, &categories, count, |done| {
        progress.set_message(format!("{} ({} items)", done.key, done.collected));
        progress.inc(1);
    })
    .await?;
    progress.finish_and_clear();

    for failed in report.failed() {
        println!(
            "{} {} ({}): {}",
            style("✗").red(),
            failed.label,
            failed.key,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    print_summary(&report.merged);
    Ok(())
}

#[cfg(not(feature = "browser"))]
pub async fn cmd_crawl(
    _settings: &Settings,
    _url: &str,
    _count: usize,
    _output: &Path,
) -> anyhow::Result<()> {
    Err(browser_missing())
}

#[cfg(not(feature = "browser"))]
pub async fn cmd_batch(_settings: &Settings, _only: &[String], _count: usize) -> anyhow::Result<()> {
    Err(browser_missing())
}

#[cfg(not(feature = "browser"))]
fn browser_missing() -> anyhow::Error {
    anyhow::anyhow!("Browser support not compiled. Rebuild with: cargo build --features browser")
}

/// Merge existing per-category files.
pub fn cmd_merge(settings: &Settings) -> anyhow::Result<()> {
    let summary = merge_category_files(&settings.categories, &settings.output)?;
    print_summary(&summary);
    Ok(())
}

/// List configured categories.
pub fn cmd_categories(settings: &Settings) {
    println!("\n{}", style("Categories").bold());
    println!("{}", "-".repeat(60));
    for category in &settings.categories {
        println!("{:<22} {}", category.key, category.label);
        println!("{:<22} {}", "", style(&category.url).dim());
    }
}

fn print_summary(summary: &MergeSummary) {
    println!("\n{}", style("Collected per category").bold());
    for (key, count) in &summary.counts {
        println!("  {:<22} {}", key, count);
    }
    println!(
        "{} {} items saved to {}",
        style("✓").green(),
        summary.total(),
        summary.path.display()
    );
}
