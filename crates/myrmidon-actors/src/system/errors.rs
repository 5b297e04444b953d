use crate::pid::Pid;

#[derive(Debug, thiserror::Error)]
pub enum SysSpawnError {
    #[error("No available slots (max_actors limit reached)")]
    MaxActorsLimit,

    #[error("Parent {} is not alive", _0)]
    NoParent(Pid),

    #[error("The system is shutting down")]
    ShuttingDown,
}

#[derive(Debug, thiserror::Error)]
pub enum HotSwapError {
    #[error("No such actor")]
    NoActor,

    #[error("Only push-mode actors can have their handler swapped")]
    NotPushMode,
}

#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("No such actor")]
    NoActor,

    #[error("The actor is not observed: its messages are consumed by its own handler")]
    NotObserved,
}
