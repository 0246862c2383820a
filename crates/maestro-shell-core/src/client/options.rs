//! `key=value` option parsing for configuration commands.
//!
//! Keys are case-insensitive. Values are split at the first `=`, so a value
//! may itself contain `=`. Every token is validated before anything is sent to
//! the daemon. Unknown keys are ignored with a warning.

use tracing::warn;

use super::types::{InterfaceConfig, LogFilter};

/// A command-line option that cannot be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Invalid argument: {key}={value}")]
    InvalidArgument { key: String, value: String },

    #[error("Missing IfName")]
    MissingIfName,

    #[error("Missing target")]
    MissingTarget,

    #[error("Missing server")]
    MissingServer,
}

/// Split `key=value`, lowercasing the key.
pub fn split_option(token: &str) -> Result<(String, &str), ValidationError> {
    token
        .split_once('=')
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .ok_or_else(|| ValidationError::InvalidOption(token.to_string()))
}

/// Accepts `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ValidationError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(invalid_argument(key, value)),
    }
}

/// Integers are 64-bit.
pub fn parse_int(key: &str, value: &str) -> Result<i64, ValidationError> {
    value.parse().map_err(|_| invalid_argument(key, value))
}

fn invalid_argument(key: &str, value: &str) -> ValidationError {
    ValidationError::InvalidArgument {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl InterfaceConfig {
    /// Build a configuration from `key=value` tokens. `ifname` is required.
    pub fn from_options<'a, I>(tokens: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut config = InterfaceConfig::default();

        for token in tokens {
            let (key, value) = split_option(token)?;
            let text = || Some(value.to_string());
            match key.as_str() {
                "ifname" => config.name = non_empty(value),
                "ifindex" => config.index = Some(parse_int(&key, value)?),
                "dhcpv4enabled" => config.dhcp_v4_enabled = Some(parse_bool(&key, value)?),
                "ipv4addr" => config.ipv4_addr = text(),
                "ipv4mask" => config.ipv4_mask = Some(parse_int(&key, value)?),
                "ipv4bcast" => config.ipv4_bcast = text(),
                "ipv6addr" => config.ipv6_addr = text(),
                "hwaddr" => config.hw_addr = text(),
                "replaceaddress" => config.replace_address = text(),
                "clearaddresses" => config.clear_addresses = Some(parse_bool(&key, value)?),
                "down" => config.down = Some(parse_bool(&key, value)?),
                "defaultgateway" => config.default_gateway = text(),
                "fallbackdefaultgateway" => config.fallback_default_gateway = text(),
                "routepriority" => config.route_priority = Some(parse_int(&key, value)?),
                "aux" => config.aux = Some(parse_bool(&key, value)?),
                "nameserveroverrides" => config.nameserver_overrides = text(),
                "dhcpdisableclearaddresses" => {
                    config.dhcp_disable_clear_addresses = Some(parse_bool(&key, value)?)
                }
                "dhcpsteptimeout" => config.dhcp_step_timeout = Some(parse_int(&key, value)?),
                "existing" => config.existing = text(),
                "type" => config.link_type = text(),
                "serialdevice" => config.serial_device = text(),
                "apn" => config.apn = text(),
                _ => warn!(option = %key, "ignoring unknown interface option"),
            }
        }

        if config.name.is_none() {
            return Err(ValidationError::MissingIfName);
        }
        Ok(config)
    }
}

impl LogFilter {
    /// Build a filter from `key=value` tokens. `target` is required.
    pub fn from_options<'a, I>(tokens: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut filter = LogFilter::default();

        for token in tokens {
            let (key, value) = split_option(token)?;
            let text = Some(value.to_string());
            match key.as_str() {
                "target" => filter.target = non_empty(value),
                "levels" => filter.levels = text,
                "tag" => filter.tag = text,
                "pre" => filter.pre = text,
                "post" => filter.post = text,
                "post-fmt-pre-msg" => filter.post_fmt_pre_msg = text,
                _ => warn!(option = %key, "ignoring unknown logging option"),
            }
        }

        if filter.target.is_none() {
            return Err(ValidationError::MissingTarget);
        }
        Ok(filter)
    }
}

/// DNS server arguments; at least one is required.
pub fn dns_servers<'a, I>(args: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let servers: Vec<String> = args.into_iter().map(str::to_string).collect();
    if servers.is_empty() {
        return Err(ValidationError::MissingServer);
    }
    Ok(servers)
}
