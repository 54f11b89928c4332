//! Request matching against a compiled rule list.
//!
//! # Responsibilities
//! - Compare the request method case-insensitively
//! - Match the request path against each rule's pattern
//! - Return the first hit; rule order is the only tie-breaker
//!
//! Matching never mutates the list and keeps no state between calls.

use http::Method;

use crate::mock::{
    pattern::PathParams,
    rule::{CompiledRule, RuleList},
};

#[derive(Debug)]
pub struct MatchedRule<'a> {
    pub rule: &'a CompiledRule,
    pub params: PathParams,
}

/// Finds the first rule whose method and pattern accept the request.
pub fn match_request<'a>(method: &Method, path: &str, rules: &'a RuleList) -> Option<MatchedRule<'a>> {
    if rules.is_empty() {
        return None;
    }

    rules
        .iter()
        .filter(|rule| rule.method.matches(method))
        .find_map(|rule| rule.pattern.matches(path).map(|params| MatchedRule { rule, params }))
}
