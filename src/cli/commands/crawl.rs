//! Crawl command.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::super::helpers::{build_fetcher, print_theme_summary};
use crate::config::Settings;
use crate::scrapers::PortalCrawler;
use crate::storage::DatasetWriter;

/// Crawl the portal and download every resolved dataset.
///
/// With `verbose`, every resolved dataset is printed in full before its
/// theme's summary.
pub async fn cmd_crawl(
    settings: &Settings,
    themes: &[String],
    max_pages: Option<u32>,
    no_download: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let portal = settings.portal.clone().with_max_pages(max_pages);
    let fetcher = build_fetcher(settings)?;
    let mut crawler = PortalCrawler::new(portal, fetcher.clone())?;
    if !no_download {
        let writer = DatasetWriter::new(fetcher, crawler.base_url().clone(), &settings.data_dir);
        crawler = crawler.with_sink(Arc::new(writer));
    }

    println!(
        "{} Crawling {}{}",
        style("→").cyan(),
        crawler.base_url(),
        if no_download { " (metadata only)" } else { "" }
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Enumerating themes and datasets...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = crawler.run(themes).await;
    pb.finish_and_clear();
    let summary = result?;

    if summary.themes.is_empty() {
        println!("{} No themes to crawl", style("!").yellow());
        return Ok(());
    }

    for (theme, report) in summary.themes.iter().zip(&summary.reports) {
        if verbose {
            for dataset in theme.datasets() {
                println!("{}", style("=".repeat(50)).dim());
                println!("{}", dataset);
            }
        }
        print_theme_summary(theme, report);
    }

    let persisted: usize = summary.reports.iter().map(|r| r.persisted).sum();
    println!(
        "{} Loading complete: {} datasets across {} themes",
        style("✓").green(),
        summary.dataset_count(),
        summary.themes.len()
    );
    if !no_download {
        println!(
            "  {} {} files saved under {}",
            style("→").dim(),
            persisted,
            settings.data_dir.display()
        );
    }
    println!(
        "  {} Run log: {}",
        style("→").dim(),
        settings.log_file().display()
    );

    Ok(())
}
