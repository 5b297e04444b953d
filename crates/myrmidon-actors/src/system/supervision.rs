use super::*;

impl System {
    /// Link two actors: when one of them fails, the other one exits too (unless it traps exits).
    pub fn link(&self, left: Pid, right: Pid) {
        let left_accepted_sys_msg = self.send_sys_msg(left, SysMsg::Link(right));
        let right_accepted_sys_msg = self.send_sys_msg(right, SysMsg::Link(left));

        if !right_accepted_sys_msg {
            self.send_sys_msg(left, SysMsg::Exited(right, ExitReason::no_actor()));
        }
        if !left_accepted_sys_msg {
            self.send_sys_msg(right, SysMsg::Exited(left, ExitReason::no_actor()));
        }
    }

    pub fn unlink(&self, left: Pid, right: Pid) {
        self.send_sys_msg(left, SysMsg::Unlink(right));
        self.send_sys_msg(right, SysMsg::Unlink(left));
    }

    /// Deliver a [`SystemMessage::Down`] into the `watcher`'s mailbox once `watched` terminates.
    ///
    /// If `watched` does not exist, the notification (with [`ExitReason::NoActor`]) is delivered
    /// right away, and `false` is returned.
    pub fn monitor(&self, watcher: Pid, watched: Pid) -> bool {
        if self.send_sys_msg(watched, SysMsg::Monitor(watcher)) {
            true
        } else {
            let down = SystemMessage::Down { pid: watched, reason: ExitReason::no_actor() };
            self.send_system(watcher, down);
            false
        }
    }

    pub fn demonitor(&self, watcher: Pid, watched: Pid) -> bool {
        self.send_sys_msg(watched, SysMsg::Demonitor(watcher))
    }

    /// Make the linked actors' exits arrive as [`SystemMessage::Exit`] rather than terminate
    /// `pid`.
    pub fn trap_exit(&self, pid: Pid, trap_exit: bool) -> bool {
        self.send_sys_msg(pid, SysMsg::TrapExit(trap_exit))
    }
}
