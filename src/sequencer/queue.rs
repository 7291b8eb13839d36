//! Per-target command queue

use std::collections::VecDeque;

use super::command::MicCommand;

/// Pending commands and in-flight flag for one target
#[derive(Debug, Default)]
pub(crate) struct TargetQueue {
    pending: VecDeque<MicCommand>,
    in_flight: bool,
}

impl TargetQueue {
    pub(crate) fn push(&mut self, command: MicCommand) {
        self.pending.push_back(command);
    }

    /// Take the head command if the target is idle
    pub(crate) fn start(&mut self) -> Option<MicCommand> {
        if self.in_flight {
            return None;
        }
        self.next()
    }

    /// Finish the in-flight command and take the next one, if any
    pub(crate) fn complete(&mut self) -> Option<MicCommand> {
        self.in_flight = false;
        self.next()
    }

    fn next(&mut self) -> Option<MicCommand> {
        let command = self.pending.pop_front()?;
        self.in_flight = true;
        Some(command)
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_idle(&self) -> bool {
        !self.in_flight && self.pending.is_empty()
    }
}
