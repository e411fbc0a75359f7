//! Core data models for endpoints, resolved requests and search operations.

mod endpoint;
mod request;
mod search;

pub use endpoint::{EndpointDescriptor, EndpointFlags};
pub use request::{BearerToken, DateRange, ResolvedRequest};
pub use search::{SearchInput, SearchResultEntry};
