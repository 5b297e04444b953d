use tokio::sync::oneshot;

use crate::exit::ExitReason;
use crate::handler::Mode;
use crate::pid::Pid;
use crate::system::ActorState;

#[derive(Debug)]
pub(crate) enum SysMsg {
    Stop(ExitReason),
    Link(Pid),
    Unlink(Pid),
    Exited(Pid, ExitReason),
    Monitor(Pid),
    Demonitor(Pid),
    AdoptChild(Pid),
    ChildExited(Pid),
    TrapExit(bool),
    GetInfo(oneshot::Sender<ActorInfo>),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorInfo {
    pub pid: Pid,
    #[cfg_attr(feature = "serde", serde(skip, default = "default_mode"))]
    pub mode: Mode,
    pub state: ActorState,
    pub budget: usize,
    pub mailbox_len: usize,
    pub trap_exit: bool,
    pub parent: Option<Pid>,
    pub links: Box<[Pid]>,
    pub monitors: Box<[Pid]>,
    pub children: Box<[Pid]>,
}

#[cfg(feature = "serde")]
fn default_mode() -> Mode {
    Mode::Push
}
