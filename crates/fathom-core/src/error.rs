/// Locally-contained simulation errors. None of these are fatal: callers log
/// and abort the offending call without mutating state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A method was invoked on a role that must never invoke it.
    RoleViolation {
        operation: &'static str,
        detail: &'static str,
    },
    /// A required collaborator is unavailable.
    MissingDependency(&'static str),
    /// A resource exists but is not initialized yet; feature stays disabled.
    NotReady(&'static str),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleViolation { operation, detail } => {
                write!(f, "role violation in {operation}: {detail}")
            },
            Self::MissingDependency(what) => write!(f, "missing dependency: {what}"),
            Self::NotReady(what) => write!(f, "not ready: {what}"),
        }
    }
}

impl std::error::Error for SimError {}
