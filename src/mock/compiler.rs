//! Turns the raw mock mapping into an ordered rule list.

use std::sync::Arc;

use serde_yaml::{Mapping, Value as YamlValue};
use tracing::debug;

use crate::{
    constants::mock::FUNCTION_TAG,
    errors::MockError,
    mock::{
        handler::HandlerRegistry,
        pattern::PathPattern,
        rule::{CompiledRule, MockMethod, RuleList},
        wrapper::{HandlerValue, wrap},
    },
};

/// Compiles every entry of `config` in declaration order.
pub fn compile(config: &Mapping, registry: &HandlerRegistry) -> Result<RuleList, MockError> {
    let mut rules = Vec::new();

    for (key, value) in config {
        let key = match key {
            YamlValue::String(key) => key.as_str(),
            other => return Err(MockError::invalid_route_key(format!("{:?}", other), "route keys must be strings")),
        };
        let handler = resolve_handler(key, value, registry)?;
        rules.extend(compile_entry(key, &handler)?);
    }

    debug!(rules = rules.len(), "Compiled mock rules");
    Ok(RuleList::new(rules))
}

/// Expands one route key into its rules. A key without a method yields one
/// rule per supported method, all sharing `handler`.
pub fn compile_entry(key: &str, handler: &HandlerValue) -> Result<Vec<CompiledRule>, MockError> {
    let (methods, path) = match key.trim().split_once(' ') {
        Some((token, path)) => {
            let method = MockMethod::from_token(token)
                .ok_or_else(|| MockError::invalid_route_key(key, format!("unsupported method `{}`", token)))?;
            (vec![method], path.trim())
        }
        None => (MockMethod::ALL.to_vec(), key.trim()),
    };

    let pattern = PathPattern::parse(path).map_err(|e| MockError::invalid_route_key(key, e))?;
    let source_key: Arc<str> = Arc::from(key);

    methods
        .into_iter()
        .map(|method| {
            let wrapped = wrap(method, handler).map_err(|e| MockError::config_type(key, format!("unserializable value ({})", e)))?;
            Ok(CompiledRule {
                method,
                pattern: pattern.clone(),
                handler: wrapped,
                source_key: source_key.clone(),
            })
        })
        .collect()
}

/// Resolves a configuration value into a handler. `!fn name` looks up a
/// registered function; any other tag is rejected; everything else is data.
fn resolve_handler(key: &str, value: &YamlValue, registry: &HandlerRegistry) -> Result<HandlerValue, MockError> {
    match value {
        YamlValue::Tagged(tagged) if tagged.tag == FUNCTION_TAG => {
            let YamlValue::String(name) = &tagged.value else {
                return Err(MockError::config_type(key, "!fn without a handler name"));
            };
            registry
                .get(name)
                .map(HandlerValue::Function)
                .ok_or_else(|| MockError::config_type(key, format!("unregistered handler `{}`", name)))
        }
        YamlValue::Tagged(tagged) => Err(MockError::config_type(key, format!("tagged value {}", tagged.tag))),
        data => serde_json::to_value(data)
            .map(HandlerValue::Static)
            .map_err(|e| MockError::config_type(key, format!("unserializable value ({})", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::handler::{MockReply, MockRequest};

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new().register("ok", |_req: MockRequest| async { MockReply::json(serde_json::json!({"ok": true})) })
    }

    #[test]
    fn methodless_key_expands_to_all_methods_in_order() {
        let rules = compile(&mapping("/api/user: {id: 1}"), &registry()).unwrap();
        let methods: Vec<_> = rules.iter().map(|r| r.method).collect();
        assert_eq!(methods, MockMethod::ALL.to_vec());
        assert!(rules.iter().all(|r| &*r.source_key == "/api/user"));
    }

    #[test]
    fn explicit_method_yields_single_rule() {
        let rules = compile(&mapping("POST /upload: !fn ok"), &registry()).unwrap();
        assert_eq!(rules.len(), 1);
        let rule = rules.iter().next().unwrap();
        assert_eq!(rule.method, MockMethod::Post);
        assert_eq!(rule.pattern.as_str(), "/upload");
        assert_eq!(rule.handler.kind(), "function");
    }

    #[test]
    fn method_token_is_normalized() {
        let rules = compile(&mapping("dElEtE /x: 1"), &registry()).unwrap();
        assert_eq!(rules.iter().next().unwrap().method, MockMethod::Delete);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let rules = compile(&mapping("GET /b: 1\nGET /a: 2\n/c: 3\n"), &registry()).unwrap();
        let keys: Vec<_> = rules.iter().map(|r| r.source_key.to_string()).collect();
        assert_eq!(keys[..3], ["GET /b", "GET /a", "/c"]);
        assert_eq!(rules.len(), 7);
    }

    #[test]
    fn strings_and_nulls_are_static_values() {
        let rules = compile(&mapping("/s: hello\n/n: ~\n/l: [1, 2]\n"), &registry()).unwrap();
        assert!(rules.iter().all(|r| r.handler.kind() == "static"));
    }

    #[test]
    fn unknown_tags_are_config_type_errors() {
        let err = compile(&mapping("/x: !sql select 1"), &registry()).unwrap_err();
        assert!(matches!(err, MockError::ConfigType { ref key, .. } if key == "/x"));
    }

    #[test]
    fn unregistered_function_is_config_type_error() {
        let err = compile(&mapping("/x: !fn missing"), &registry()).unwrap_err();
        assert_eq!(
            err,
            MockError::config_type("/x", "unregistered handler `missing`")
        );
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let err = compile(&mapping("OPTIONS /x: 1"), &registry()).unwrap_err();
        assert!(matches!(err, MockError::InvalidRouteKey { .. }));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = compile(&mapping("\"GET /x/{id\": 1"), &registry()).unwrap_err();
        assert!(matches!(err, MockError::InvalidRouteKey { .. }));
    }

    #[test]
    fn empty_mapping_compiles_to_empty_list() {
        assert!(compile(&Mapping::new(), &registry()).unwrap().is_empty());
    }
}
