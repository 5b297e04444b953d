use myrmidon_actors::{RestartIntensity, SystemConfig};
use myrmidon_net::TransportConfig;

/// Configuration for [`Runtime`](crate::Runtime)
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub system: SystemConfig,

    #[cfg_attr(feature = "serde", serde(default))]
    pub transport: TransportConfig,

    /// restart intensity of the supervisors created by path
    #[cfg_attr(feature = "serde", serde(default))]
    pub path_supervisor_intensity: RestartIntensity,

    /// worker threads of the owned tokio runtime, as many as the CPU cores if not set
    #[cfg_attr(feature = "serde", serde(default))]
    pub worker_threads: Option<usize>,
}
