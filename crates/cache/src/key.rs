//! Semantic cache keys.

use std::fmt;

/// Ordered tuple identifying one query: a resource name followed by
/// every parameter that affects the response.
///
/// Two requests with equal keys are the same query and must be coalesced
/// into one in-flight fetch. Parameters that are semantically absent
/// (e.g. the incidents view's optional container filter) are encoded as
/// a distinct `*` segment so that "absent" never collides with a real
/// value like `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    segments: Vec<String>,
}

impl QueryKey {
    /// Start a key for the given resource name.
    pub fn resource(name: &str) -> Self {
        QueryKey {
            segments: vec![name.to_string()],
        }
    }

    /// Append one parameter segment.
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.segments.push(part.to_string());
        self
    }

    /// Append an optional parameter segment; `None` becomes `*`.
    pub fn with_opt(mut self, part: Option<impl fmt::Display>) -> Self {
        self.segments.push(match part {
            Some(value) => value.to_string(),
            None => "*".to_string(),
        });
        self
    }

    /// The resource name (first segment).
    pub fn resource_name(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_parameters_produce_equal_keys() {
        let a = QueryKey::resource("alerts").with("c1").with(300);
        let b = QueryKey::resource("alerts").with("c1").with(300);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_window_is_distinct_from_absent() {
        let zero = QueryKey::resource("incidents").with_opt(Some("c1")).with(0);
        let absent = QueryKey::resource("incidents")
            .with_opt(None::<&str>)
            .with(0);
        assert_ne!(zero, absent);
    }

    #[test]
    fn display_joins_segments_for_logging() {
        let key = QueryKey::resource("alerts").with("c1").with(300);
        assert_eq!(key.to_string(), "alerts/c1/300");
        assert_eq!(key.resource_name(), "alerts");
    }
}
