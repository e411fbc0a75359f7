//! Per-call request models derived from a descriptor and template variables.

use std::fmt;

use super::EndpointDescriptor;

/// Opaque bearer credential forwarded to the upstream API.
///
/// Debug and Display print `[REDACTED]` so a token never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a token, rejecting empty or whitespace-only values
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Access the raw token value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Optional `start_date`/`end_date` pair, both in `YYYY-MM-DD` form.
///
/// Dates are forwarded verbatim; empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRange {
    pub fn new(start_date: Option<String>, end_date: Option<String>) -> Self {
        Self {
            start_date: start_date.filter(|d| !d.is_empty()),
            end_date: end_date.filter(|d| !d.is_empty()),
        }
    }

    /// A range that lets the upstream apply its own default
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }

    /// Query parameters to send, in `start_date`, `end_date` order
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(start) = &self.start_date {
            pairs.push(("start_date", start.as_str()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_date", end.as_str()));
        }
        pairs
    }
}

/// A catalog entry resolved against a concrete resource URI.
///
/// Lives only for the duration of one upstream call.
#[derive(Debug, Clone)]
pub struct ResolvedRequest<'a> {
    pub endpoint: &'a EndpointDescriptor,
    /// The URI the client asked for; echoed back in the content envelope
    pub uri: String,
    /// Token taken from the URI path (token-in-path mode only)
    pub token: Option<BearerToken>,
    pub dates: DateRange,
}
