//! Request-scoped context
//!
//! Every layer boundary (handler → service → store) takes a `RequestContext`
//! by reference. The context carries the correlation id, the active
//! OpenTelemetry span, and the request deadline. Contexts are never mutated
//! in place: adding information derives a new instance, so concurrent
//! requests can never observe each other's state.

use crate::error::{Error, Result};
use opentelemetry::Context as OtelContext;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Correlation identifier joining logs, metrics, and traces for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh identifier (UUID v4, 122 bits of entropy).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse an identifier supplied by an upstream caller.
    ///
    /// Returns `None` for an empty value so the caller falls back to
    /// generating one.
    pub fn from_header(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable-append request context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    otel: OtelContext,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            otel: OtelContext::new(),
            deadline: None,
        }
    }

    /// Derive a context with a deadline `budget` from now.
    pub fn with_deadline(&self, budget: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + budget),
            ..self.clone()
        }
    }

    /// Derive a context with a different active OpenTelemetry context
    /// (used when a layer opens a child span).
    pub fn with_otel(&self, otel: OtelContext) -> Self {
        Self {
            otel,
            ..self.clone()
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn otel(&self) -> &OtelContext {
        &self.otel
    }

    /// Remaining budget before the deadline, `None` if no deadline is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has elapsed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with `DeadlineExceeded` if the request budget is spent.
    ///
    /// Downstream layers call this before starting work so they abandon
    /// operations the caller has already given up on.
    pub fn check_deadline(&self) -> Result<()> {
        match self.remaining() {
            Some(rem) if rem.is_zero() => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_from_header_rejects_empty() {
        assert!(RequestId::from_header("").is_none());
        let id = RequestId::from_header("req-abc123").unwrap();
        assert_eq!(id.as_str(), "req-abc123");
    }

    #[test]
    fn test_no_deadline_never_expires() {
        let ctx = RequestContext::new(RequestId::generate());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check_deadline().is_ok());
    }

    #[test]
    fn test_deadline_enforcement() {
        let ctx = RequestContext::new(RequestId::generate());

        let live = ctx.with_deadline(Duration::from_secs(60));
        assert!(live.check_deadline().is_ok());
        assert!(live.remaining().unwrap() <= Duration::from_secs(60));

        let expired = ctx.with_deadline(Duration::ZERO);
        assert!(matches!(
            expired.check_deadline(),
            Err(Error::DeadlineExceeded)
        ));
    }

    #[test]
    fn test_derivation_does_not_mutate_parent() {
        let parent = RequestContext::new(RequestId::generate());
        let child = parent.with_deadline(Duration::from_secs(5));
        assert!(parent.remaining().is_none());
        assert!(child.remaining().is_some());
        assert_eq!(parent.request_id(), child.request_id());
    }
}
