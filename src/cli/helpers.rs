//! Shared helper functions for CLI commands.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::models::Theme;
use crate::scrapers::{HttpClient, ListingState, PageFetcher, ThemeReport};

/// Build the HTTP fetcher from settings.
pub fn build_fetcher(settings: &Settings) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let client =
        HttpClient::with_options(settings.user_agent.as_deref(), settings.request_timeout())?;
    Ok(Arc::new(client))
}

/// Print a theme's datasets and the way its listing ended.
pub fn print_theme_summary(theme: &Theme, report: &ThemeReport) {
    let marker = match report.state {
        ListingState::Aborted => style("!").yellow(),
        _ => style("✓").green(),
    };
    println!("{} {}", marker, style(&theme.name).bold());
    for line in theme.to_string().lines().skip(1) {
        println!("  {}", line);
    }

    let mut details = vec![format!("{} pages", report.pages.len())];
    if report.skipped > 0 {
        details.push(format!("{} skipped", report.skipped));
    }
    if report.persist_failures > 0 {
        details.push(format!("{} downloads failed", report.persist_failures));
    }
    if report.state == ListingState::Aborted {
        details.push("listing aborted".to_string());
    }
    println!("  {} {}", style("→").dim(), details.join(", "));
}
