//! User agent handling for HTTP requests.

pub const USER_AGENT: &str = concat!(
    "datagov/",
    env!("CARGO_PKG_VERSION"),
    " (open data harvester)"
);

/// Resolve user agent from config value.
/// - None or blank => default harvester user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
