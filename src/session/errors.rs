#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionErrorKind {
    Closed,
    AlreadyClosed,
    AlreadyArmed,
    NotArmed,
    NoRuntime,
}

/// Lifecycle error of a scanning session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn closed() -> Self {
        Self {
            kind: SessionErrorKind::Closed,
            message: "session is closed".to_string(),
        }
    }

    pub fn already_closed() -> Self {
        Self {
            kind: SessionErrorKind::AlreadyClosed,
            message: "session is already closed".to_string(),
        }
    }

    pub fn already_armed() -> Self {
        Self {
            kind: SessionErrorKind::AlreadyArmed,
            message: "session is already armed".to_string(),
        }
    }

    pub fn not_armed() -> Self {
        Self {
            kind: SessionErrorKind::NotArmed,
            message: "session is not armed".to_string(),
        }
    }

    pub fn no_runtime() -> Self {
        Self {
            kind: SessionErrorKind::NoRuntime,
            message: "arming requires a running tokio runtime".to_string(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}
