use std::{fmt, sync::Arc};

use http::Method;

use crate::mock::{pattern::PathPattern, wrapper::WrappedHandler};

/// The methods a mock rule can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl MockMethod {
    /// Expansion order for route keys without an explicit method.
    pub const ALL: [MockMethod; 5] = [
        MockMethod::Get,
        MockMethod::Post,
        MockMethod::Put,
        MockMethod::Patch,
        MockMethod::Delete,
    ];

    /// Parses a method token case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MockMethod::Get => "get",
            MockMethod::Post => "post",
            MockMethod::Put => "put",
            MockMethod::Patch => "patch",
            MockMethod::Delete => "delete",
        }
    }

    pub fn matches(&self, method: &Method) -> bool {
        method.as_str().eq_ignore_ascii_case(self.as_str())
    }

    /// GET requests skip body decoding.
    pub fn decodes_body(&self) -> bool {
        *self != MockMethod::Get
    }
}

impl fmt::Display for MockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct CompiledRule {
    pub method: MockMethod,
    pub pattern: PathPattern,
    pub handler: WrappedHandler,
    /// The route key this rule was expanded from.
    pub source_key: Arc<str>,
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("handler", &self.handler.kind())
            .field("source_key", &self.source_key)
            .finish()
    }
}

/// Ordered rules; position is match priority.
#[derive(Debug, Clone, Default)]
pub struct RuleList {
    rules: Vec<CompiledRule>,
}

impl RuleList {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleList {
    type Item = &'a CompiledRule;
    type IntoIter = std::slice::Iter<'a, CompiledRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_tokens_are_case_insensitive() {
        assert_eq!(MockMethod::from_token("POST"), Some(MockMethod::Post));
        assert_eq!(MockMethod::from_token("pAtCh"), Some(MockMethod::Patch));
        assert_eq!(MockMethod::from_token("options"), None);
    }

    #[test]
    fn methods_store_lower_case_and_compare_loosely() {
        assert_eq!(MockMethod::Delete.to_string(), "delete");
        assert!(MockMethod::Delete.matches(&Method::DELETE));
        assert!(!MockMethod::Delete.matches(&Method::GET));
    }

    #[test]
    fn only_get_skips_body_decoding() {
        assert!(!MockMethod::Get.decodes_body());
        assert!(MockMethod::ALL.iter().filter(|m| m.decodes_body()).count() == 4);
    }
}
