mod impl_fmt;

#[cfg(feature = "serde")]
mod serde;


/// Identifier of an actor.
///
/// The high 32 bits identify the owning node, the low 32 bits identify the actor slot within
/// that node. E.g. `4294967296` is the actor in slot `0` of the node `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u64);

impl Pid {
    /// Create a new [`Pid`] from the provided components
    pub const fn new(node: u32, slot: u32) -> Self {
        Self(((node as u64) << 32) | slot as u64)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Get `node` component
    pub const fn node(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Get `slot` component
    pub const fn slot(&self) -> u32 {
        self.0 as u32
    }
}

impl From<u64> for Pid {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Pid> for u64 {
    fn from(pid: Pid) -> Self {
        pid.to_raw()
    }
}
