//! Seams between the reconcilers and the presentation layer.

/// Yes/no prompt shown before a consequential action (state changes,
/// deletions, compound workflows). The presentation layer decides how to
/// render it; tests inject plain closures.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Outcome message for the user, owned by the reconciler that produced it
/// and rendered declaratively by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    /// Validation problems and partial outcomes the user must act on.
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}
