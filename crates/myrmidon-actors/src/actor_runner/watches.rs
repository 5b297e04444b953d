use std::collections::HashSet;

use crate::message::{Message, SystemMessage};

use super::*;

#[derive(Debug, Default)]
pub(crate) struct Watches {
    pub trap_exit: bool,
    pub parent: Option<Pid>,
    pub links: HashSet<Pid>,
    pub monitors: HashSet<Pid>,
    pub children: HashSet<Pid>,
}

impl Backend {
    pub(super) fn notify_linked_actors(&mut self, exit_reason: &ExitReason) {
        for linked in std::mem::take(&mut self.watches.links) {
            self.send_sys_msg(linked, SysMsg::Exited(self.pid, exit_reason.to_owned()));
        }
    }

    pub(super) fn notify_monitors(&mut self, exit_reason: &ExitReason) {
        for watcher in std::mem::take(&mut self.watches.monitors) {
            self.send_down(watcher, exit_reason);
        }
    }

    pub(super) fn stop_children(&mut self) {
        for child in std::mem::take(&mut self.watches.children) {
            log::trace!("[{}] stopping child {}", self.pid, child);
            self.send_sys_msg(child, SysMsg::Stop(ExitReason::shutdown()));
        }
    }

    pub(super) fn notify_parent(&mut self) {
        if let Some(parent) = self.watches.parent.take() {
            self.send_sys_msg(parent, SysMsg::ChildExited(self.pid));
        }
    }

    pub(super) fn send_down(&self, watcher: Pid, exit_reason: &ExitReason) {
        if let Some(system) = self.system.rc_upgrade() {
            let down = SystemMessage::Down { pid: self.pid, reason: exit_reason.to_owned() };
            if !system.send_system(watcher, down) {
                log::trace!("[{}] watcher {} is gone", self.pid, watcher);
            }
        }
    }

    pub(super) fn do_link(&mut self, link_to: Pid) {
        if self.watches.links.insert(link_to) {
            log::trace!("[{}] linking to {}", self.pid, link_to);

            if !self.send_sys_msg(link_to, SysMsg::Link(self.pid)) {
                let _ = self.sys_msg_tx.send(SysMsg::Exited(link_to, ExitReason::no_actor()));
            }
        }
    }

    pub(super) fn do_adopt(&mut self, parent: Pid) {
        log::trace!("[{}] adopted by {}", self.pid, parent);
        if !self.send_sys_msg(parent, SysMsg::AdoptChild(self.pid)) {
            self.watches.parent = None;
            let _ = self.sys_msg_tx.send(SysMsg::Stop(ExitReason::shutdown()));
        }
    }

    pub(super) fn handle_set_trap_exit(&mut self, trap_exit: bool) -> Result<(), ExitReason> {
        if self.watches.trap_exit != trap_exit {
            log::trace!("[{}] trap_exit = {}", self.pid, trap_exit);
            self.watches.trap_exit = trap_exit;
        }
        Ok(())
    }

    pub(super) fn handle_sys_msg_exited(
        &mut self,
        terminated: Pid,
        exit_reason: ExitReason,
    ) -> Result<(), ExitReason> {
        if !self.watches.links.remove(&terminated) {
            return Ok(())
        }

        log::trace!(
            "[{}] linked {} exited: {} [trap-exit: {}]",
            self.pid,
            terminated,
            exit_reason,
            self.watches.trap_exit
        );
        if self.watches.trap_exit {
            let exit = SystemMessage::Exit { from: terminated, reason: exit_reason };
            let _ = self.mailbox_tx.send(Message::System(exit));
            Ok(())
        } else if exit_reason.is_failure() {
            Err(ExitReason::linked(terminated, exit_reason))
        } else {
            Ok(())
        }
    }

    pub(super) fn handle_sys_msg_link(&mut self, link_to: Pid) -> Result<(), ExitReason> {
        self.watches.links.insert(link_to);
        Ok(())
    }

    pub(super) fn handle_sys_msg_unlink(&mut self, unlink_from: Pid) -> Result<(), ExitReason> {
        self.watches.links.remove(&unlink_from);
        Ok(())
    }

    pub(super) fn handle_sys_msg_monitor(&mut self, watcher: Pid) -> Result<(), ExitReason> {
        self.watches.monitors.insert(watcher);
        Ok(())
    }

    pub(super) fn handle_sys_msg_demonitor(&mut self, watcher: Pid) -> Result<(), ExitReason> {
        self.watches.monitors.remove(&watcher);
        Ok(())
    }

    pub(super) fn handle_sys_msg_adopt_child(&mut self, child: Pid) -> Result<(), ExitReason> {
        if self.stop_requested.is_some() {
            self.send_sys_msg(child, SysMsg::Stop(ExitReason::shutdown()));
        } else {
            self.watches.children.insert(child);
        }
        Ok(())
    }

    pub(super) fn handle_sys_msg_child_exited(&mut self, child: Pid) -> Result<(), ExitReason> {
        self.watches.children.remove(&child);
        Ok(())
    }
}
