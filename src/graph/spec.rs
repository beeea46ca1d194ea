#![forbid(unsafe_code)]

//! Pluggable per-language construction rules.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::graph::ty::{InvalidType, TypeRef, INVALID_IDENTIFIER};
use crate::graph::value::{InvalidValue, ValueRef};

/// JSON-encoded AST node of one code line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AstJson(JsonValue);

impl AstJson {
    /// Wraps a decoded JSON document.
    pub fn new(json: JsonValue) -> Self {
        Self(json)
    }

    /// Placeholder used when a line's AST cannot be decoded.
    pub fn invalid() -> Self {
        Self(json!({ "_identifier": INVALID_IDENTIFIER }))
    }

    /// Syntax-kind identifier (`_identifier`, falling back to `_type`).
    pub fn identifier(&self) -> &str {
        self.0
            .get("_identifier")
            .or_else(|| self.0.get("_type"))
            .and_then(JsonValue::as_str)
            .unwrap_or(INVALID_IDENTIFIER)
    }

    /// Raw field access.
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    /// Nested AST node stored under `field`.
    pub fn child(&self, field: &str) -> Option<AstJson> {
        self.0
            .get(field)
            .filter(|value| value.is_object())
            .cloned()
            .map(AstJson)
    }

    /// Nested AST nodes stored as an array under `field`.
    pub fn children(&self, field: &str) -> Vec<AstJson> {
        match self.0.get(field) {
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .cloned()
                .map(AstJson)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// String field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(JsonValue::as_str)
    }

    /// Underlying JSON.
    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }
}

impl From<JsonValue> for AstJson {
    fn from(value: JsonValue) -> Self {
        AstJson(value)
    }
}

/// Which syntax kinds a rule applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleTypes {
    /// Exactly one identifier.
    One(String),
    /// Any identifier in the list.
    Many(Vec<String>),
    /// Every identifier (`"*"`).
    Any,
}

impl RuleTypes {
    /// Whether the rule applies to `identifier`.
    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            RuleTypes::One(name) => name == identifier,
            RuleTypes::Many(names) => names.iter().any(|name| name == identifier),
            RuleTypes::Any => true,
        }
    }
}

impl From<&str> for RuleTypes {
    fn from(value: &str) -> Self {
        if value == "*" {
            RuleTypes::Any
        } else {
            RuleTypes::One(value.to_string())
        }
    }
}

impl From<String> for RuleTypes {
    fn from(value: String) -> Self {
        RuleTypes::from(value.as_str())
    }
}

impl From<Vec<&str>> for RuleTypes {
    fn from(values: Vec<&str>) -> Self {
        RuleTypes::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RuleTypes {
    fn from(values: [&str; N]) -> Self {
        RuleTypes::Many(values.iter().map(|s| s.to_string()).collect())
    }
}

type ValueBuild = dyn Fn(&AstJson, &ValueFactory) -> Option<ValueRef> + Send + Sync;
type TypeBuild = dyn Fn(&AstJson, &ValueFactory) -> Option<TypeRef> + Send + Sync;

/// Builds a [`Value`](crate::graph::Value) for matching AST nodes.
#[derive(Clone)]
pub struct ValueRule {
    types: RuleTypes,
    build: Arc<ValueBuild>,
}

impl ValueRule {
    /// Creates a rule for `types`.
    pub fn new<T, F>(types: T, build: F) -> Self
    where
        T: Into<RuleTypes>,
        F: Fn(&AstJson, &ValueFactory) -> Option<ValueRef> + Send + Sync + 'static,
    {
        Self {
            types: types.into(),
            build: Arc::new(build),
        }
    }

    /// Syntax kinds the rule applies to.
    pub fn types(&self) -> &RuleTypes {
        &self.types
    }
}

impl fmt::Debug for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRule").field("types", &self.types).finish()
    }
}

/// Builds a [`Type`](crate::graph::Type) for matching AST nodes.
#[derive(Clone)]
pub struct TypeRule {
    types: RuleTypes,
    build: Arc<TypeBuild>,
}

impl TypeRule {
    /// Creates a rule for `types`.
    pub fn new<T, F>(types: T, build: F) -> Self
    where
        T: Into<RuleTypes>,
        F: Fn(&AstJson, &ValueFactory) -> Option<TypeRef> + Send + Sync + 'static,
    {
        Self {
            types: types.into(),
            build: Arc::new(build),
        }
    }
}

impl fmt::Debug for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRule").field("types", &self.types).finish()
    }
}

/// Ordered construction rules for one source language.
///
/// Rules are tried in registration order and the first match wins.
#[derive(Clone, Debug, Default)]
pub struct LanguageSpecification {
    name: String,
    value_rules: Vec<ValueRule>,
    type_rules: Vec<TypeRule>,
}

impl LanguageSpecification {
    /// Empty specification.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_rules: Vec::new(),
            type_rules: Vec::new(),
        }
    }

    /// Language name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a value rule.
    pub fn value_rule(mut self, rule: ValueRule) -> Self {
        self.value_rules.push(rule);
        self
    }

    /// Appends a type rule.
    pub fn type_rule(mut self, rule: TypeRule) -> Self {
        self.type_rules.push(rule);
        self
    }
}

/// Applies a [`LanguageSpecification`] to AST nodes.
#[derive(Clone, Debug)]
pub struct ValueFactory {
    spec: Arc<LanguageSpecification>,
}

impl ValueFactory {
    /// Factory over `spec`.
    pub fn new(spec: LanguageSpecification) -> Self {
        Self {
            spec: Arc::new(spec),
        }
    }

    /// Language the factory builds for.
    pub fn specification(&self) -> &LanguageSpecification {
        &self.spec
    }

    /// Builds the value for `json`; a placeholder when nothing matches.
    pub fn build_value(&self, json: &AstJson) -> ValueRef {
        let identifier = json.identifier();
        self.spec
            .value_rules
            .iter()
            .find(|rule| rule.types.matches(identifier))
            .and_then(|rule| (rule.build)(json, self))
            .unwrap_or_else(|| Arc::new(InvalidValue::new(identifier)))
    }

    /// Builds the type for `json`; a placeholder when nothing matches.
    pub fn build_type(&self, json: &AstJson) -> TypeRef {
        let identifier = json.identifier();
        self.spec
            .type_rules
            .iter()
            .find(|rule| rule.types.matches(identifier))
            .and_then(|rule| (rule.build)(json, self))
            .unwrap_or_else(|| Arc::new(InvalidType::new(identifier)))
    }
}
