//! The fixed catalog of Oura endpoints republished as MCP resources.
//!
//! This module defines the twelve [`EndpointDescriptor`]s the server knows
//! about, renders their URI templates for the active [`TokenMode`], resolves
//! concrete resource URIs back to descriptors, and implements the display
//! name filter behind the `search-oura-data` tool.
//!
//! # Token Modes
//!
//! - [`TokenMode::Env`]: the bearer token comes from `OURA_API_TOKEN` and is
//!   bound once for the whole process. Templates carry only date variables:
//!   `oura://daily_sleep/{start_date}/{end_date}`.
//! - [`TokenMode::Path`]: the bearer token travels in the resource URI right
//!   after the resource segment: `oura://daily_sleep/{token}/{start_date}/{end_date}`.
//!
//! # Resolution
//!
//! ```rust
//! use oura_mcp::catalog::{EndpointCatalog, TokenMode};
//!
//! let catalog = EndpointCatalog::new(TokenMode::Env);
//! let request = catalog.resolve("oura://sleep/2024-01-01/2024-01-02").unwrap();
//! assert_eq!(request.endpoint.upstream_path, "/usercollection/sleep");
//! assert_eq!(request.dates.start_date.as_deref(), Some("2024-01-01"));
//! ```

mod template;

pub use template::UriTemplate;

use serde::{Deserialize, Serialize};

use crate::models::{BearerToken, DateRange, EndpointDescriptor, EndpointFlags, ResolvedRequest};

/// URI scheme for every resource this server exposes
pub const URI_SCHEME: &str = "oura";

/// Where the bearer token comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// One token from configuration, shared for the process lifetime
    #[default]
    Env,
    /// A token per request, carried in the resource URI
    Path,
}

/// Errors raised while resolving a resource URI
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No catalog entry matches the URI
    #[error("Resource not found: {0}")]
    UnknownResource(String),

    /// Token-in-path mode and the URI carries no token
    #[error("Authorization token required")]
    MissingToken,

    /// The URI is not of the form `scheme://...`
    #[error("Invalid resource URI: {0}")]
    InvalidUri(String),
}

struct EndpointSpec {
    name: &'static str,
    display_name: &'static str,
    resource: &'static str,
    upstream_path: &'static str,
    description: &'static str,
    dated: bool,
}

const ENDPOINTS: &[EndpointSpec] = &[
    EndpointSpec {
        name: "personal-info",
        display_name: "Personal Info",
        resource: "personal_info",
        upstream_path: "/usercollection/personal_info",
        description: "User's personal information including age, weight, height, and biological sex from their Oura profile",
        dated: false,
    },
    EndpointSpec {
        name: "daily-sleep",
        display_name: "Daily Sleep",
        resource: "daily_sleep",
        upstream_path: "/usercollection/daily_sleep",
        description: "Daily sleep metrics including total sleep time, sleep score, and sleep efficiency. Dates should be in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "sleep",
        display_name: "Sleep",
        resource: "sleep",
        upstream_path: "/usercollection/sleep",
        description: "Detailed sleep analysis including sleep stages, heart rate, HRV, and temperature variations for individual sleep sessions. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "daily-activity",
        display_name: "Daily Activity",
        resource: "daily_activity",
        upstream_path: "/usercollection/daily_activity",
        description: "Daily activity metrics including steps, calories burned, activity score, and movement throughout the day. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "daily-readiness",
        display_name: "Daily Readiness",
        resource: "daily_readiness",
        upstream_path: "/usercollection/daily_readiness",
        description: "Daily readiness score and contributing factors like sleep balance, activity balance, and body temperature. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "heart-rate",
        display_name: "Heart Rate",
        resource: "heart_rate",
        upstream_path: "/usercollection/heartrate",
        description: "Continuous heart rate measurements throughout the day and night, providing insights into cardiovascular health. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "sessions",
        display_name: "Sessions",
        resource: "sessions",
        upstream_path: "/usercollection/session",
        description: "Meditation, relaxation, and other focused sessions recorded by the user. Includes session type, duration, and biometric data. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "tags",
        display_name: "Tags",
        resource: "tags",
        upstream_path: "/usercollection/tag",
        description: "User-created tags and annotations for tracking lifestyle factors, symptoms, or other personal markers. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "workouts",
        display_name: "Workouts",
        resource: "workouts",
        upstream_path: "/usercollection/workout",
        description: "Workout sessions including type, duration, intensity, and associated biometric data. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "daily-stress",
        display_name: "Daily Stress",
        resource: "daily_stress",
        upstream_path: "/usercollection/daily_stress",
        description: "Daily stress levels and recovery metrics based on heart rate variability and other biometric data. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "rest-mode",
        display_name: "Rest Mode",
        resource: "rest_mode",
        upstream_path: "/usercollection/rest_mode_period",
        description: "Periods when the user has enabled Rest Mode, indicating times of illness, recovery, or reduced activity. Dates in YYYY-MM-DD format.",
        dated: true,
    },
    EndpointSpec {
        name: "ring-configuration",
        display_name: "Ring Configuration",
        resource: "ring_configuration",
        upstream_path: "/usercollection/ring_configuration",
        description: "Technical details about the user's Oura ring including hardware version, firmware version, and sizing information",
        dated: false,
    },
];

impl EndpointSpec {
    fn describe(&self, mode: TokenMode) -> EndpointDescriptor {
        let mut flags = EndpointFlags::empty();
        let mut uri_template = format!("{}://{}", URI_SCHEME, self.resource);

        if mode == TokenMode::Path {
            flags |= EndpointFlags::TOKEN_IN_PATH;
            uri_template.push_str("/{token}");
        }
        if self.dated {
            flags |= EndpointFlags::DATE_RANGE;
            uri_template.push_str("/{start_date}/{end_date}");
        }

        EndpointDescriptor {
            name: self.name,
            display_name: self.display_name,
            resource: self.resource,
            upstream_path: self.upstream_path,
            description: self.description,
            uri_template,
            flags,
        }
    }
}

/// Catalog of all endpoints, in fixed declaration order
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    mode: TokenMode,
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointCatalog {
    /// Build the catalog for the given token mode
    pub fn new(mode: TokenMode) -> Self {
        Self {
            mode,
            endpoints: ENDPOINTS.iter().map(|entry| entry.describe(mode)).collect(),
        }
    }

    pub fn mode(&self) -> TokenMode {
        self.mode
    }

    /// All endpoints in declaration order
    pub fn all(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }

    /// Get an endpoint by resource name (e.g., "daily-sleep")
    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Get an endpoint by name, returning an error if not found
    pub fn get_required(&self, name: &str) -> Result<&EndpointDescriptor, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::UnknownResource(name.to_string()))
    }

    /// Endpoints addressable by a constant URI (listed by `resources/list`)
    pub fn fixed(&self) -> Vec<&EndpointDescriptor> {
        self.all().filter(|e| e.is_fixed()).collect()
    }

    /// Endpoints that need template variables (listed by `resources/templates/list`)
    pub fn templated(&self) -> Vec<&EndpointDescriptor> {
        self.all().filter(|e| !e.is_fixed()).collect()
    }

    /// Endpoints whose display name contains `query`, ignoring case.
    ///
    /// Plain substring match in catalog order: no tokenization, no ranking.
    pub fn search(&self, query: &str) -> Vec<&EndpointDescriptor> {
        let query_lower = query.to_lowercase();
        self.all()
            .filter(|e| e.display_name.to_lowercase().contains(&query_lower))
            .collect()
    }

    /// Resolve a concrete resource URI into a request.
    ///
    /// In token-in-path mode a missing token is rejected here, before any
    /// network call can happen.
    pub fn resolve(&self, uri: &str) -> Result<ResolvedRequest<'_>, CatalogError> {
        if !uri.contains("://") {
            return Err(CatalogError::InvalidUri(uri.to_string()));
        }

        let (endpoint, template, mut vars) = self
            .endpoints
            .iter()
            .find_map(|endpoint| {
                let template = UriTemplate::parse(&endpoint.uri_template)?;
                let vars = template.match_uri(uri)?;
                Some((endpoint, template, vars))
            })
            .ok_or_else(|| CatalogError::UnknownResource(uri.to_string()))?;

        let token = if endpoint.requires_token_in_path() {
            // Positional matching: a short URI would bind a date as the token
            if template.match_uri_strict(uri).is_none() {
                return Err(CatalogError::MissingToken);
            }

            let token = vars
                .remove("token")
                .and_then(BearerToken::new)
                .ok_or(CatalogError::MissingToken)?;
            Some(token)
        } else {
            None
        };

        Ok(ResolvedRequest {
            endpoint,
            uri: uri.to_string(),
            token,
            dates: DateRange::new(vars.remove("start_date"), vars.remove("end_date")),
        })
    }

    /// Get the number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::new(TokenMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_basic() {
        let catalog = EndpointCatalog::new(TokenMode::Env);
        assert_eq!(catalog.len(), 12);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_env_mode_templates() {
        let catalog = EndpointCatalog::new(TokenMode::Env);

        assert_eq!(
            catalog.get("personal-info").unwrap().uri_template,
            "oura://personal_info"
        );
        assert_eq!(
            catalog.get("daily-sleep").unwrap().uri_template,
            "oura://daily_sleep/{start_date}/{end_date}"
        );
        assert_eq!(
            catalog.get("heart-rate").unwrap().uri_template,
            "oura://heart_rate/{start_date}/{end_date}"
        );
        assert_eq!(
            catalog.get("ring-configuration").unwrap().uri_template,
            "oura://ring_configuration"
        );
    }

    #[test]
    fn test_path_mode_templates() {
        let catalog = EndpointCatalog::new(TokenMode::Path);

        assert_eq!(
            catalog.get("personal-info").unwrap().uri_template,
            "oura://personal_info/{token}"
        );
        assert_eq!(
            catalog.get("daily-sleep").unwrap().uri_template,
            "oura://daily_sleep/{token}/{start_date}/{end_date}"
        );
        assert!(catalog.all().all(|e| e.requires_token_in_path()));
        assert!(catalog.fixed().is_empty());
    }

    #[test]
    fn test_upstream_paths() {
        let catalog = EndpointCatalog::default();
        let expected = [
            ("personal-info", "/usercollection/personal_info"),
            ("daily-sleep", "/usercollection/daily_sleep"),
            ("sleep", "/usercollection/sleep"),
            ("daily-activity", "/usercollection/daily_activity"),
            ("daily-readiness", "/usercollection/daily_readiness"),
            ("heart-rate", "/usercollection/heartrate"),
            ("sessions", "/usercollection/session"),
            ("tags", "/usercollection/tag"),
            ("workouts", "/usercollection/workout"),
            ("daily-stress", "/usercollection/daily_stress"),
            ("rest-mode", "/usercollection/rest_mode_period"),
            ("ring-configuration", "/usercollection/ring_configuration"),
        ];

        let names: Vec<&str> = catalog.all().map(|e| e.name).collect();
        let expected_names: Vec<&str> = expected.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, expected_names);

        for (name, path) in expected {
            assert_eq!(catalog.get(name).unwrap().upstream_path, path);
        }
    }

    #[test]
    fn test_templates_resolve_uniquely() {
        for mode in [TokenMode::Env, TokenMode::Path] {
            let catalog = EndpointCatalog::new(mode);
            let templates: HashSet<&str> =
                catalog.all().map(|e| e.uri_template.as_str()).collect();
            assert_eq!(templates.len(), catalog.len());

            for endpoint in catalog.all() {
                let uri = endpoint
                    .uri_template
                    .replace("{token}", "tok")
                    .replace("{start_date}", "2024-01-01")
                    .replace("{end_date}", "2024-01-02");
                let resolved = catalog.resolve(&uri).unwrap();
                assert_eq!(resolved.endpoint.upstream_path, endpoint.upstream_path);
            }
        }
    }

    #[test]
    fn test_fixed_and_templated_split() {
        let catalog = EndpointCatalog::new(TokenMode::Env);
        let fixed: Vec<&str> = catalog.fixed().iter().map(|e| e.name).collect();
        assert_eq!(fixed, vec!["personal-info", "ring-configuration"]);
        assert_eq!(catalog.templated().len(), 10);
    }

    #[test]
    fn test_resolve_dates() {
        let catalog = EndpointCatalog::new(TokenMode::Env);

        let request = catalog
            .resolve("oura://daily_sleep/2024-01-01/2024-01-02")
            .unwrap();
        assert_eq!(request.endpoint.name, "daily-sleep");
        assert_eq!(request.uri, "oura://daily_sleep/2024-01-01/2024-01-02");
        assert_eq!(
            request.dates,
            DateRange::new(Some("2024-01-01".into()), Some("2024-01-02".into()))
        );
        assert!(request.token.is_none());

        let no_dates = catalog.resolve("oura://daily_sleep").unwrap();
        assert!(no_dates.dates.is_empty());
    }

    #[test]
    fn test_resolve_token_in_path() {
        let catalog = EndpointCatalog::new(TokenMode::Path);

        let request = catalog
            .resolve("oura://sleep/my-token/2024-01-01/2024-01-02")
            .unwrap();
        assert_eq!(request.token.unwrap().expose(), "my-token");
        assert_eq!(request.dates.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(request.dates.end_date.as_deref(), Some("2024-01-02"));

        let fixed = catalog.resolve("oura://personal_info/my-token").unwrap();
        assert_eq!(fixed.endpoint.name, "personal-info");
        assert_eq!(fixed.token.unwrap().expose(), "my-token");
    }

    #[test]
    fn test_resolve_missing_token() {
        let catalog = EndpointCatalog::new(TokenMode::Path);

        assert!(matches!(
            catalog.resolve("oura://personal_info"),
            Err(CatalogError::MissingToken)
        ));
        assert!(matches!(
            catalog.resolve("oura://daily_sleep//2024-01-01/2024-01-02"),
            Err(CatalogError::MissingToken)
        ));
    }

    #[test]
    fn test_resolve_path_mode_needs_every_segment() {
        let catalog = EndpointCatalog::new(TokenMode::Path);

        for uri in [
            "oura://daily_sleep/2024-01-01/2024-01-02",
            "oura://daily_sleep/2024-01-01",
            "oura://daily_sleep/tok",
        ] {
            assert!(
                matches!(catalog.resolve(uri), Err(CatalogError::MissingToken)),
                "{uri} should be rejected"
            );
        }

        let request = catalog.resolve("oura://daily_sleep/tok//").unwrap();
        assert_eq!(request.token.unwrap().expose(), "tok");
        assert!(request.dates.is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = EndpointCatalog::new(TokenMode::Env);

        assert!(matches!(
            catalog.resolve("oura://steps/2024-01-01/2024-01-02"),
            Err(CatalogError::UnknownResource(_))
        ));
        assert!(matches!(
            catalog.resolve("oura://personal_info/extra"),
            Err(CatalogError::UnknownResource(_))
        ));
        assert!(matches!(
            catalog.resolve("personal_info"),
            Err(CatalogError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_search_sleep() {
        let catalog = EndpointCatalog::default();
        let names: Vec<&str> = catalog
            .search("sleep")
            .iter()
            .map(|e| e.display_name)
            .collect();
        assert_eq!(names, vec!["Daily Sleep", "Sleep"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let catalog = EndpointCatalog::default();
        let names: Vec<&str> = catalog
            .search("DAILY")
            .iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "daily-sleep",
                "daily-activity",
                "daily-readiness",
                "daily-stress"
            ]
        );
    }

    #[test]
    fn test_search_no_match() {
        let catalog = EndpointCatalog::default();
        assert!(catalog.search("glucose").is_empty());
    }

    #[test]
    fn test_token_mode_serde() {
        let mode: TokenMode = serde_json::from_str("\"path\"").unwrap();
        assert_eq!(mode, TokenMode::Path);
        assert_eq!(serde_json::to_string(&TokenMode::Env).unwrap(), "\"env\"");
    }
}
