//! Web server command.

use crate::cli::icons::{dim_arrow, info, success};
use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    settings.ensure_directories()?;
    println!(
        "{} Uploads stored in {}",
        success(),
        settings.upload_dir.display()
    );
    if settings.oauth.client_id.is_none() {
        println!(
            "  {} No OAuth client configured; export will be unavailable",
            dim_arrow()
        );
    }

    println!(
        "{} Starting doclabel server at http://{}:{}",
        info(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Default port when only a host is given.
const DEFAULT_PORT: u16 = 5000;

/// Parse a bind address that can be:
/// - Just a port: "5000" -> 127.0.0.1:5000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:5000
/// - Host and port: "0.0.0.0:5000" -> 0.0.0.0:5000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("8080").unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 5000)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:3030").unwrap(),
            ("0.0.0.0".to_string(), 3030)
        );
        assert!(parse_bind_address("").is_err());
    }
}
