//! Web server command.

use console::style;

use crate::config::Settings;

/// Start the read API.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let bucket_dir = settings.object_root.join(&settings.bucket);
    if !bucket_dir.is_dir() {
        println!(
            "{} Bucket directory {} does not exist yet; every lookup will return 404",
            style("!").yellow(),
            bucket_dir.display()
        );
    }

    println!(
        "{} Starting read API at http://{}",
        style("→").cyan(),
        bind.unwrap_or(&settings.bind)
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, bind).await
}
