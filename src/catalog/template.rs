//! Minimal URI templates of the form `scheme://literal/{var}/{var}`.
//!
//! Only whole-segment variables are supported, which is all the catalog
//! needs. Matching is positional; trailing variables may be omitted unless
//! the match is strict.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed URI template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    scheme: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template; returns `None` when the scheme separator is missing
    pub fn parse(template: &str) -> Option<Self> {
        let (scheme, rest) = template.split_once("://")?;
        let segments = rest
            .split('/')
            .map(|part| {
                match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(name) => Segment::Variable(name.to_string()),
                    None => Segment::Literal(part.to_string()),
                }
            })
            .collect();

        Some(Self {
            scheme: scheme.to_string(),
            segments,
        })
    }

    /// Match a concrete URI, returning the non-empty variables it binds.
    ///
    /// Variables are percent-decoded. A variable that is empty or lies past
    /// the end of the URI is simply absent from the result; literals must
    /// all be present.
    pub fn match_uri(&self, uri: &str) -> Option<HashMap<String, String>> {
        let (scheme, rest) = uri.split_once("://")?;
        if scheme != self.scheme {
            return None;
        }

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() > self.segments.len() {
            return None;
        }

        let mut vars = HashMap::new();
        for (i, segment) in self.segments.iter().enumerate() {
            let part = parts.get(i).copied();
            match segment {
                Segment::Literal(lit) => {
                    if part != Some(lit.as_str()) {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    let Some(raw) = part.filter(|p| !p.is_empty()) else {
                        continue;
                    };
                    let value = urlencoding::decode(raw).ok()?.into_owned();
                    vars.insert(name.clone(), value);
                }
            }
        }

        Some(vars)
    }

    /// Like [`UriTemplate::match_uri`], but the URI must have exactly one
    /// segment per template segment. Variables may still be empty.
    pub fn match_uri_strict(&self, uri: &str) -> Option<HashMap<String, String>> {
        let (_, rest) = uri.split_once("://")?;
        if rest.split('/').count() != self.segments.len() {
            return None;
        }
        self.match_uri(uri)
    }
}
