//! Environment variable overrides

use super::file::{FacadeConfig, SinkKind};
use super::{ConfigError, ConfigResult};
use crate::level::LogLevel;
use crate::providers::ProviderKind;

/// Path of the YAML config file
pub const ENV_CONFIG_PATH: &str = "LOGLINK_CONFIG";
/// `1`/`true` disables all logging through the facade
pub const ENV_DISABLED: &str = "LOGLINK_DISABLED";
/// Preferred provider (`memlog`, `log`)
pub const ENV_PROVIDER: &str = "LOGLINK_PROVIDER";
/// Diagnostics sink (`none`, `console`, `file`)
pub const ENV_DIAGNOSTICS: &str = "LOGLINK_DIAGNOSTICS";
/// Minimum diagnostics level
pub const ENV_DIAGNOSTICS_LEVEL: &str = "LOGLINK_DIAGNOSTICS_LEVEL";

/// Apply `LOGLINK_*` variables from `vars` onto `config`
///
/// Takes the variables as an iterator so callers can pass `std::env::vars()`
/// or a fixed list. Valid variables are applied even when another one is
/// rejected; the first rejection is returned.
pub fn apply_overrides<I>(config: &mut FacadeConfig, vars: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut first_error = None;

    for (key, value) in vars {
        let result = match key.as_str() {
            ENV_DISABLED => parse_bool(&key, &value).map(|v| config.disabled = v),
            ENV_PROVIDER => parse_provider(&key, &value).map(|v| config.provider = v),
            ENV_DIAGNOSTICS => parse_sink(&key, &value).map(|v| config.diagnostics.sink = v),
            ENV_DIAGNOSTICS_LEVEL => value
                .parse::<LogLevel>()
                .map(|v| config.diagnostics.level = v)
                .map_err(|_| invalid(&key, &value)),
            _ => Ok(()),
        };
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_provider(key: &str, value: &str) -> ConfigResult<Option<ProviderKind>> {
    let value_trimmed = value.trim();
    if value_trimmed.is_empty() || value_trimmed.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    value_trimmed
        .parse::<ProviderKind>()
        .map(Some)
        .map_err(|_| invalid(key, value))
}

fn parse_sink(key: &str, value: &str) -> ConfigResult<SinkKind> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" | "off" => Ok(SinkKind::None),
        "console" | "stderr" => Ok(SinkKind::Console),
        "file" => Ok(SinkKind::File),
        _ => Err(invalid(key, value)),
    }
}
