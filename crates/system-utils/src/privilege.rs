/// Answers whether the current process runs under a privileged identity.
pub trait PrivilegeProbe: Send + Sync {
    fn is_privileged(&self) -> bool;
}

/// Reads the real user id of this process; uid 0 counts as privileged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIdentity;

impl PrivilegeProbe for ProcessIdentity {
    #[cfg(unix)]
    fn is_privileged(&self) -> bool {
        unsafe { libc::getuid() == 0 }
    }

    #[cfg(not(unix))]
    fn is_privileged(&self) -> bool {
        false
    }
}

/// Fixed answer, for wiring tests and for operators who want to force a branch.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrivilege(pub bool);

impl PrivilegeProbe for FixedPrivilege {
    fn is_privileged(&self) -> bool {
        self.0
    }
}
