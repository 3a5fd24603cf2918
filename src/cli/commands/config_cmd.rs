//! Configuration display command.

use crate::config::Settings;

/// Print the effective settings as TOML.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(settings)?;
    print!("{}", text);
    Ok(())
}
