//! Theme listing command.

use console::style;

use super::super::helpers::build_fetcher;
use crate::config::Settings;
use crate::scrapers::PortalCrawler;

/// Discover and print the portal's themes.
pub async fn cmd_themes(settings: &Settings) -> anyhow::Result<()> {
    let crawler = PortalCrawler::new(settings.portal.clone(), build_fetcher(settings)?)?;
    let themes = crawler.discover_themes().await?;

    if themes.is_empty() {
        println!(
            "{} No themes found at {}",
            style("!").yellow(),
            crawler.base_url()
        );
        return Ok(());
    }

    println!(
        "{} {} themes at {}",
        style("✓").green(),
        themes.len(),
        crawler.base_url()
    );
    for theme in &themes {
        println!("  {} {}", style(&theme.name).cyan(), style(&theme.listing_path).dim());
    }

    Ok(())
}
