use std::time::Duration;

/// Configuration for [`Transport`](crate::Transport)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransportConfig {
    /// max duration to establish an outbound connection
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_connect_timeout"))]
    pub connect_timeout: Duration,

    /// max duration to wait for the response to a request (resolve, is_node_up)
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_request_timeout"))]
    pub request_timeout: Duration,

    /// how often a remote monitor pings the observed node
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_heartbeat_interval"))]
    pub heartbeat_interval: Duration,

    /// silence after which the observed node is considered lost
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_heartbeat_timeout"))]
    pub heartbeat_timeout: Duration,

    /// max payload length of a single frame
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_max_frame_len"))]
    pub max_frame_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: defaults::default_connect_timeout(),
            request_timeout: defaults::default_request_timeout(),
            heartbeat_interval: defaults::default_heartbeat_interval(),
            heartbeat_timeout: defaults::default_heartbeat_timeout(),
            max_frame_len: defaults::default_max_frame_len(),
        }
    }
}

mod defaults {
    use super::*;

    pub(super) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub(super) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
    pub(super) const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
    pub(super) const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);
    pub(super) const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

    pub(super) fn default_connect_timeout() -> Duration {
        DEFAULT_CONNECT_TIMEOUT
    }
    pub(super) fn default_request_timeout() -> Duration {
        DEFAULT_REQUEST_TIMEOUT
    }
    pub(super) fn default_heartbeat_interval() -> Duration {
        DEFAULT_HEARTBEAT_INTERVAL
    }
    pub(super) fn default_heartbeat_timeout() -> Duration {
        DEFAULT_HEARTBEAT_TIMEOUT
    }
    pub(super) fn default_max_frame_len() -> usize {
        DEFAULT_MAX_FRAME_LEN
    }
}
