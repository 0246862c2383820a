//! Request/response bodies of the maestro daemon API.
//!
//! Field names follow the daemon's JSON. Optional request fields that were
//! not given on the command line are left out of the body entirely.

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// `GET /alive` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveResponse {
    #[serde(default, alias = "Ok")]
    pub ok: bool,

    /// Daemon uptime in nanoseconds.
    #[serde(default, alias = "Uptime", alias = "uptimeNanoseconds")]
    pub uptime: i64,
}

impl AliveResponse {
    /// Uptime as `seconds.nanoseconds`, e.g. `12.000000500`.
    pub fn uptime_display(&self) -> String {
        format!(
            "{}.{:09}",
            self.uptime / NANOS_PER_SEC,
            (self.uptime % NANOS_PER_SEC).abs()
        )
    }
}

/// `GET /net/events` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub error: String,
}

/// Error body the daemon sends with failing statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One interface configuration for `PUT /net/interfaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    #[serde(rename = "if_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "if_index", skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(rename = "dhcpv4", skip_serializing_if = "Option::is_none")]
    pub dhcp_v4_enabled: Option<bool>,
    #[serde(rename = "ipv4_addr", skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
    #[serde(rename = "ipv4_mask", skip_serializing_if = "Option::is_none")]
    pub ipv4_mask: Option<i64>,
    #[serde(rename = "ipv4_bcast", skip_serializing_if = "Option::is_none")]
    pub ipv4_bcast: Option<String>,
    #[serde(rename = "ipv6_addr", skip_serializing_if = "Option::is_none")]
    pub ipv6_addr: Option<String>,
    #[serde(rename = "hw_addr", skip_serializing_if = "Option::is_none")]
    pub hw_addr: Option<String>,
    #[serde(rename = "replace_addr", skip_serializing_if = "Option::is_none")]
    pub replace_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_addresses: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_default_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameserver_overrides: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_disable_clear_addresses: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_step_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(rename = "serial", skip_serializing_if = "Option::is_none")]
    pub serial_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apn: Option<String>,
}

/// A logging target filter for `PUT`/`DELETE /log/filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(rename = "post-fmt-pre-msg", skip_serializing_if = "Option::is_none")]
    pub post_fmt_pre_msg: Option<String>,
}
