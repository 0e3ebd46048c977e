use std::fmt;

use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCause {
    /// No credential was configured; no request was attempted.
    Unconfigured,
    /// A request was attempted and failed. Holds the rendered error.
    Failed(String),
}

impl FallbackCause {
    pub fn label(&self) -> &'static str {
        match self {
            FallbackCause::Unconfigured => "unconfigured",
            FallbackCause::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for FallbackCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackCause::Unconfigured => f.write_str("no API credential configured"),
            FallbackCause::Failed(reason) => write!(f, "request failed: {reason}"),
        }
    }
}

/// Result of a content operation: either what the model produced, or a fixed
/// substitute of the same shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Live(T),
    Fallback { value: T, cause: FallbackCause },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Outcome::Live(value) => value,
            Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Live(value) => value,
            Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Outcome::Live(_))
    }

    pub fn is_fallback(&self) -> bool {
        !self.is_live()
    }

    pub fn cause(&self) -> Option<&FallbackCause> {
        match self {
            Outcome::Live(_) => None,
            Outcome::Fallback { cause, .. } => Some(cause),
        }
    }

    pub fn source_label(&self) -> &'static str {
        if self.is_live() {
            "live"
        } else {
            "fallback"
        }
    }
}

#[derive(Debug)]
pub enum Attempt<T> {
    Unconfigured,
    Completed(Result<T, ServiceError>),
}

/// Chooses between a live value and one of the two fallbacks. Pure: the
/// fallback constructors run only for the branch that needs them.
pub fn settle<T>(
    attempt: Attempt<T>,
    on_unconfigured: impl FnOnce() -> T,
    on_failure: impl FnOnce() -> T,
) -> Outcome<T> {
    match attempt {
        Attempt::Unconfigured => Outcome::Fallback {
            value: on_unconfigured(),
            cause: FallbackCause::Unconfigured,
        },
        Attempt::Completed(Ok(value)) => Outcome::Live(value),
        Attempt::Completed(Err(err)) => Outcome::Fallback {
            value: on_failure(),
            cause: FallbackCause::Failed(err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_value_passes_through_without_building_fallbacks() {
        let outcome = settle(
            Attempt::Completed(Ok(7)),
            || panic!("unconfigured fallback built"),
            || panic!("failure fallback built"),
        );
        assert_eq!(outcome, Outcome::Live(7));
        assert!(outcome.cause().is_none());
        assert_eq!(outcome.source_label(), "live");
    }

    #[test]
    fn unconfigured_and_failed_pick_different_fallbacks() {
        let unconfigured = settle(Attempt::<&str>::Unconfigured, || "opening", || "lost");
        assert_eq!(unconfigured.value(), &"opening");
        assert_eq!(unconfigured.cause(), Some(&FallbackCause::Unconfigured));

        let failed = settle(
            Attempt::Completed(Err(ServiceError::EmptyResponse)),
            || "opening",
            || "lost",
        );
        assert!(failed.is_fallback());
        assert_eq!(failed.source_label(), "fallback");
        assert_eq!(
            failed.cause(),
            Some(&FallbackCause::Failed(
                "model returned no response text".to_string()
            ))
        );
        assert_eq!(failed.into_value(), "lost");
    }

    #[test]
    fn cause_labels_are_stable() {
        assert_eq!(FallbackCause::Unconfigured.label(), "unconfigured");
        assert_eq!(FallbackCause::Failed("x".to_string()).label(), "failed");
        assert_eq!(
            FallbackCause::Failed("timeout".to_string()).to_string(),
            "request failed: timeout"
        );
    }
}
