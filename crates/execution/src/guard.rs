//! Loading flags that refuse a second submission of an action while the
//! first is still pending.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// User-triggered actions that must not overlap with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Connect,
    Approve,
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Approve => "approval",
            Self::Swap => "swap",
            Self::AddLiquidity => "add liquidity",
            Self::RemoveLiquidity => "remove liquidity",
        };
        f.write_str(name)
    }
}

/// A single loading flag.
#[derive(Debug)]
pub struct ActionGuard {
    kind: ActionKind,
    busy: AtomicBool,
}

impl ActionGuard {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            busy: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claims the flag, or returns `None` while another submission holds
    /// it. The flag is released when the ticket drops.
    pub fn try_begin(&self) -> Option<ActionTicket<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(action = %self.kind, "Refusing duplicate submission");
            return None;
        }
        Some(ActionTicket { guard: self })
    }
}

/// Proof that an action is in flight.
#[derive(Debug)]
pub struct ActionTicket<'a> {
    guard: &'a ActionGuard,
}

impl Drop for ActionTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_refused_until_release() {
        let guard = ActionGuard::new(ActionKind::Swap);
        let ticket = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());
        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }
}
