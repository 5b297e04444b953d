//! Name and path registries.
//!
//! Names are flat: binding a name that is already bound replaces the binding (last write wins).
//! Paths are `/`-separated and can be listed by prefix. A subtree of paths may have its own
//! [`Supervisor`](myrmidon_actors::Supervisor), see [`PathSupervisors`].

mod names;
mod paths;
mod supervisors;


pub use names::{NameRegistry, RegGuard};
pub use paths::PathError;
pub use supervisors::{PathSupervisorError, PathSupervisors};
