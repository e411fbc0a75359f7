//! Endpoint descriptor model: one entry of the resource catalog.

use serde::{Serialize, Serializer};

bitflags::bitflags! {
    /// Addressing properties of an endpoint
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EndpointFlags: u32 {
        /// Accepts `start_date`/`end_date` template variables
        const DATE_RANGE = 1 << 0;
        /// Carries the bearer token as a `{token}` path segment
        const TOKEN_IN_PATH = 1 << 1;
    }
}

/// An immutable description of one upstream endpoint and the MCP resource
/// that republishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    /// Resource name (e.g., "daily-sleep")
    pub name: &'static str,

    /// Human-readable name, matched by the search tool (e.g., "Daily Sleep")
    pub display_name: &'static str,

    /// First URI segment after the scheme (e.g., "daily_sleep")
    pub resource: &'static str,

    /// Path below the upstream base URL (e.g., "/usercollection/daily_sleep")
    pub upstream_path: &'static str,

    /// Description shown to MCP clients
    pub description: &'static str,

    /// Fully rendered URI template for the active token mode
    pub uri_template: String,

    #[serde(serialize_with = "serialize_flags")]
    pub flags: EndpointFlags,
}

impl EndpointDescriptor {
    /// Whether this endpoint takes the optional date range
    pub fn accepts_date_range(&self) -> bool {
        self.flags.contains(EndpointFlags::DATE_RANGE)
    }

    /// Whether the bearer token travels in the resource URI
    pub fn requires_token_in_path(&self) -> bool {
        self.flags.contains(EndpointFlags::TOKEN_IN_PATH)
    }

    /// Whether this endpoint is addressable by a constant URI
    pub fn is_fixed(&self) -> bool {
        !self.uri_template.contains('{')
    }
}

fn serialize_flags<S: Serializer>(flags: &EndpointFlags, serializer: S) -> Result<S::Ok, S::Error> {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    names.serialize(serializer)
}
