use std::sync::Arc;
use std::time::Duration;

use crate::exit_handler::{ExitHandler, LogExitHandler};

/// What happens to the messages still queued in a mailbox when its actor is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopPolicy {
    /// The handler keeps processing the queued messages, then the actor terminates.
    #[default]
    Drain,

    /// The queued messages are dropped at once.
    Discard,
}

/// Configuration for [`System`](crate::system::System)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemConfig {
    /// node id placed in the upper half of every [`Pid`](crate::pid::Pid). Auto-assigned if
    /// not set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub node_id: Option<u32>,

    /// max number of actors in the [`System`](crate::system::System)
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_max_actors"))]
    pub max_actors: usize,

    /// number of messages an actor may receive before yielding to the scheduler
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_budget"))]
    pub default_budget: usize,

    /// max number of data messages queued in a mailbox, unbounded if not set
    #[cfg_attr(feature = "serde", serde(default))]
    pub mailbox_capacity: Option<usize>,

    /// what to do with the queued messages upon stop
    #[cfg_attr(feature = "serde", serde(default))]
    pub stop_policy: StopPolicy,

    /// max duration given for an actor to gracefully terminate
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_actor_termination_timeout"))]
    pub actor_termination_timeout: Duration,

    /// max number of bytes held by the live buffer regions
    #[cfg_attr(feature = "serde", serde(default = "defaults::default_max_buffer_bytes"))]
    pub max_buffer_bytes: usize,

    /// exit handler
    #[cfg_attr(feature = "serde", serde(skip, default = "defaults::default_exit_handler"))]
    pub exit_handler: Arc<dyn ExitHandler>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            max_actors: defaults::default_max_actors(),
            default_budget: defaults::default_budget(),
            mailbox_capacity: None,
            stop_policy: StopPolicy::default(),
            actor_termination_timeout: defaults::default_actor_termination_timeout(),
            max_buffer_bytes: defaults::default_max_buffer_bytes(),
            exit_handler: defaults::default_exit_handler(),
        }
    }
}

mod defaults {
    use super::*;

    pub(super) const DEFAULT_MAX_ACTORS: usize = 1_024;
    pub(super) const DEFAULT_ACTOR_TERMINATION_TIMEOUT: Duration = Duration::from_secs(30);
    pub(super) const DEFAULT_MAX_BUFFER_BYTES: usize = 1 << 30;

    pub(super) fn default_max_actors() -> usize {
        DEFAULT_MAX_ACTORS
    }

    pub(super) fn default_budget() -> usize {
        myrmidon_utils::reductions::DEFAULT_BUDGET
    }

    pub(super) fn default_actor_termination_timeout() -> Duration {
        DEFAULT_ACTOR_TERMINATION_TIMEOUT
    }

    pub(super) fn default_max_buffer_bytes() -> usize {
        DEFAULT_MAX_BUFFER_BYTES
    }

    pub(super) fn default_exit_handler() -> Arc<dyn ExitHandler> {
        Arc::new(LogExitHandler)
    }
}
