use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of an actor. Only ever advances: `Spawned -> Running -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ActorState {
    Spawned = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn get(&self) -> ActorState {
        ActorState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move forward to `to`, unless already past it. Returns the previous state.
    pub fn advance(&self, to: ActorState) -> ActorState {
        ActorState::from_u8(self.0.fetch_max(to as u8, Ordering::AcqRel))
    }
}

impl ActorState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Spawned,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let cell = StateCell::default();
        assert_eq!(cell.get(), ActorState::Spawned);
        assert_eq!(cell.advance(ActorState::Stopping), ActorState::Spawned);
        assert_eq!(cell.advance(ActorState::Running), ActorState::Stopping);
        assert_eq!(cell.get(), ActorState::Stopping);
        cell.advance(ActorState::Stopped);
        assert_eq!(cell.get(), ActorState::Stopped);
    }
}
