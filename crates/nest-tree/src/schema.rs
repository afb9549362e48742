//! Document body validation.
//!
//! The tree validates every body it stores through a [`SchemaValidator`].
//! [`AllowAll`] accepts anything; [`JsonSchema`] compiles the commonly used
//! subset of JSON Schema: type and value checks, numeric, string, array and
//! object bounds, the `allOf`/`anyOf`/`oneOf`/`not` combinators and local
//! `$ref`s. Annotation keywords are ignored. Any other keyword is refused at
//! compile time, so a schema never validates less than it appears to.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::SchemaError;

/// Why a body was rejected, and where.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("at {pointer}: {reason}")]
pub struct ValidationError {
    /// JSON pointer of the offending value (`""` for the root).
    pub pointer: String,
    pub reason: String,
}

impl ValidationError {
    fn new(pointer: &str, reason: impl Into<String>) -> Self {
        Self {
            pointer: pointer.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validates document bodies before they are stored.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, body: &Value) -> Result<(), ValidationError>;

    /// Validate raw request bytes, which must first parse as JSON.
    fn validate_bytes(&self, raw: &[u8]) -> Result<Value, ValidationError> {
        let body: Value = serde_json::from_slice(raw)
            .map_err(|e| ValidationError::new("", format!("not valid JSON: {e}")))?;
        self.validate(&body)?;
        Ok(body)
    }
}

/// Accepts every body.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl SchemaValidator for AllowAll {
    fn validate(&self, _body: &Value) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Result<Self, SchemaError> {
        Ok(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            other => return Err(SchemaError::Unsupported(format!("unknown type {other:?}"))),
        })
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Null, Value::Null) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (Self::String, Value::String(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
enum Additional {
    #[default]
    Allow,
    Deny,
    Schema(Box<Node>),
}

/// Keywords with a validation meaning.
const ASSERTIONS: &[&str] = &[
    "type",
    "properties",
    "required",
    "additionalProperties",
    "items",
    "enum",
    "const",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "$ref",
];

/// Keywords that carry no constraint.
const ANNOTATIONS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "definitions",
    "$defs",
    "readOnly",
    "writeOnly",
    "deprecated",
];

type Refs = BTreeMap<String, Node>;

/// One compiled schema.
#[derive(Clone, Debug, Default)]
struct Node {
    /// `false` schema: nothing validates.
    reject: bool,
    reference: Option<String>,
    types: Option<Vec<JsonType>>,
    properties: BTreeMap<String, Node>,
    required: Vec<String>,
    additional: Additional,
    items: Option<Box<Node>>,
    allowed: Option<Vec<Value>>,
    constant: Option<Value>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    exclusive_minimum: Option<f64>,
    exclusive_maximum: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    unique_items: bool,
    min_properties: Option<usize>,
    max_properties: Option<usize>,
    all_of: Vec<Node>,
    any_of: Vec<Node>,
    one_of: Vec<Node>,
    not: Option<Box<Node>>,
}

fn unsupported(reason: impl Into<String>) -> SchemaError {
    SchemaError::Unsupported(reason.into())
}

fn number(fields: &Map<String, Value>, key: &str) -> Result<Option<f64>, SchemaError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(unsupported(format!("{key:?} must be a number"))),
    }
}

fn count(fields: &Map<String, Value>, key: &str) -> Result<Option<usize>, SchemaError> {
    match fields.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(usize::try_from(n).unwrap_or(usize::MAX)))
            .ok_or_else(|| unsupported(format!("{key:?} must be a non-negative integer"))),
    }
}

/// Draft 6+ numeric form, or the draft 4 boolean form that turns `inclusive`
/// into an exclusive bound.
fn exclusive_bound(
    fields: &Map<String, Value>,
    key: &str,
    inclusive: &mut Option<f64>,
) -> Result<Option<f64>, SchemaError> {
    match fields.get(key) {
        None | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Bool(true)) => Ok(inclusive.take()),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(unsupported(format!("{key:?} must be a number"))),
    }
}

/// Compiles schema documents, resolving local `$ref`s once each.
struct Compiler<'a> {
    root: &'a Value,
    refs: Refs,
    pending: BTreeSet<String>,
}

impl<'a> Compiler<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            refs: Refs::new(),
            pending: BTreeSet::new(),
        }
    }

    fn list(&mut self, fields: &Map<String, Value>, key: &str) -> Result<Vec<Node>, SchemaError> {
        match fields.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(schemas)) if !schemas.is_empty() => {
                schemas.iter().map(|sub| self.node(sub)).collect()
            }
            Some(_) => Err(unsupported(format!("{key:?} must be a non-empty array of schemas"))),
        }
    }

    fn reference(&mut self, target: &str) -> Result<(), SchemaError> {
        if self.refs.contains_key(target) || self.pending.contains(target) {
            return Ok(());
        }
        let pointer = target
            .strip_prefix('#')
            .ok_or_else(|| unsupported(format!("only local references are supported, got {target:?}")))?;
        let root = self.root;
        let resolved = root
            .pointer(pointer)
            .ok_or_else(|| unsupported(format!("unresolved reference {target:?}")))?;
        self.pending.insert(target.to_string());
        let node = self.node(resolved)?;
        self.pending.remove(target);
        self.refs.insert(target.to_string(), node);
        Ok(())
    }

    fn node(&mut self, schema: &Value) -> Result<Node, SchemaError> {
        let fields = match schema {
            Value::Bool(true) => return Ok(Node::default()),
            Value::Bool(false) => {
                return Ok(Node {
                    reject: true,
                    ..Node::default()
                })
            }
            Value::Object(fields) => fields,
            other => return Err(unsupported(format!("schema must be an object or boolean, got {other}"))),
        };
        if let Some(key) = fields
            .keys()
            .find(|k| !ASSERTIONS.contains(&k.as_str()) && !ANNOTATIONS.contains(&k.as_str()))
        {
            return Err(unsupported(format!("keyword {key:?} is not supported")));
        }

        let mut node = Node::default();
        node.reference = match fields.get("$ref") {
            None => None,
            Some(Value::String(target)) => {
                self.reference(target)?;
                Some(target.clone())
            }
            Some(_) => return Err(unsupported("\"$ref\" must be a string")),
        };
        node.types = match fields.get("type") {
            None => None,
            Some(Value::String(name)) => Some(vec![JsonType::parse(name)?]),
            Some(Value::Array(names)) => Some(
                names
                    .iter()
                    .map(|n| {
                        n.as_str()
                            .ok_or_else(|| unsupported("type names must be strings"))
                            .and_then(JsonType::parse)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            Some(_) => return Err(unsupported("\"type\" must be a string or array")),
        };
        match fields.get("properties") {
            None => {}
            Some(Value::Object(props)) => {
                for (name, sub) in props {
                    let compiled = self.node(sub)?;
                    node.properties.insert(name.clone(), compiled);
                }
            }
            Some(_) => return Err(unsupported("\"properties\" must be an object")),
        }
        node.required = match fields.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|n| {
                    n.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| unsupported("required names must be strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(unsupported("\"required\" must be an array")),
        };
        node.additional = match fields.get("additionalProperties") {
            None | Some(Value::Bool(true)) => Additional::Allow,
            Some(Value::Bool(false)) => Additional::Deny,
            Some(sub) => Additional::Schema(Box::new(self.node(sub)?)),
        };
        node.items = match fields.get("items") {
            None => None,
            Some(Value::Array(_)) => return Err(unsupported("tuple \"items\" is not supported")),
            Some(sub) => Some(Box::new(self.node(sub)?)),
        };
        node.allowed = match fields.get("enum") {
            None => None,
            Some(Value::Array(values)) => Some(values.clone()),
            Some(_) => return Err(unsupported("\"enum\" must be an array")),
        };
        node.constant = fields.get("const").cloned();

        node.minimum = number(fields, "minimum")?;
        node.maximum = number(fields, "maximum")?;
        node.exclusive_minimum = exclusive_bound(fields, "exclusiveMinimum", &mut node.minimum)?;
        node.exclusive_maximum = exclusive_bound(fields, "exclusiveMaximum", &mut node.maximum)?;
        node.min_length = count(fields, "minLength")?;
        node.max_length = count(fields, "maxLength")?;
        node.min_items = count(fields, "minItems")?;
        node.max_items = count(fields, "maxItems")?;
        node.unique_items = match fields.get("uniqueItems") {
            None => false,
            Some(Value::Bool(unique)) => *unique,
            Some(_) => return Err(unsupported("\"uniqueItems\" must be a boolean")),
        };
        node.min_properties = count(fields, "minProperties")?;
        node.max_properties = count(fields, "maxProperties")?;

        node.all_of = self.list(fields, "allOf")?;
        node.any_of = self.list(fields, "anyOf")?;
        node.one_of = self.list(fields, "oneOf")?;
        node.not = match fields.get("not") {
            None => None,
            Some(sub) => Some(Box::new(self.node(sub)?)),
        };
        Ok(node)
    }
}

impl Node {
    /// `depth` counts `$ref` hops since the last descent into `value`. More
    /// hops than there are distinct references means a cycle.
    fn check(&self, value: &Value, pointer: &str, refs: &Refs, depth: usize) -> Result<(), ValidationError> {
        if self.reject {
            return Err(ValidationError::new(pointer, "no value is allowed here"));
        }
        if let Some(target) = &self.reference {
            if depth >= refs.len() {
                return Err(ValidationError::new(pointer, "schema references loop without consuming the value"));
            }
            let referenced = refs
                .get(target)
                .ok_or_else(|| ValidationError::new(pointer, format!("unresolved reference {target}")))?;
            referenced.check(value, pointer, refs, depth + 1)?;
        }
        if let Some(types) = &self.types {
            if !types.iter().any(|t| t.matches(value)) {
                return Err(ValidationError::new(pointer, format!("expected type {types:?}")));
            }
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|a| nest_patch::json_eq(a, value)) {
                return Err(ValidationError::new(pointer, "value is not one of the enumerated values"));
            }
        }
        if let Some(constant) = &self.constant {
            if !nest_patch::json_eq(constant, value) {
                return Err(ValidationError::new(pointer, format!("value must be {constant}")));
            }
        }

        for sub in &self.all_of {
            sub.check(value, pointer, refs, depth)?;
        }
        if !self.any_of.is_empty()
            && !self.any_of.iter().any(|sub| sub.check(value, pointer, refs, depth).is_ok())
        {
            return Err(ValidationError::new(pointer, "value matches none of the anyOf schemas"));
        }
        if !self.one_of.is_empty() {
            let matched = self
                .one_of
                .iter()
                .filter(|sub| sub.check(value, pointer, refs, depth).is_ok())
                .count();
            if matched != 1 {
                return Err(ValidationError::new(
                    pointer,
                    format!("value matches {matched} of the oneOf schemas, expected exactly one"),
                ));
            }
        }
        if let Some(not) = &self.not {
            if not.check(value, pointer, refs, depth).is_ok() {
                return Err(ValidationError::new(pointer, "value matches a schema it must not"));
            }
        }

        match value {
            Value::Number(n) => {
                let n = n.as_f64().unwrap_or_default();
                if self.minimum.is_some_and(|min| n < min) {
                    return Err(ValidationError::new(pointer, format!("{n} is below the minimum")));
                }
                if self.maximum.is_some_and(|max| n > max) {
                    return Err(ValidationError::new(pointer, format!("{n} is above the maximum")));
                }
                if self.exclusive_minimum.is_some_and(|min| n <= min) {
                    return Err(ValidationError::new(pointer, format!("{n} is not above the exclusive minimum")));
                }
                if self.exclusive_maximum.is_some_and(|max| n >= max) {
                    return Err(ValidationError::new(pointer, format!("{n} is not below the exclusive maximum")));
                }
            }
            Value::String(s) => {
                let len = s.chars().count();
                if self.min_length.is_some_and(|min| len < min) {
                    return Err(ValidationError::new(pointer, "string is too short"));
                }
                if self.max_length.is_some_and(|max| len > max) {
                    return Err(ValidationError::new(pointer, "string is too long"));
                }
            }
            Value::Array(items) => {
                if self.min_items.is_some_and(|min| items.len() < min) {
                    return Err(ValidationError::new(pointer, "array has too few items"));
                }
                if self.max_items.is_some_and(|max| items.len() > max) {
                    return Err(ValidationError::new(pointer, "array has too many items"));
                }
                if self.unique_items {
                    for (i, item) in items.iter().enumerate() {
                        if items[..i].iter().any(|earlier| nest_patch::json_eq(earlier, item)) {
                            return Err(ValidationError::new(pointer, format!("item {i} is a duplicate")));
                        }
                    }
                }
                if let Some(schema) = &self.items {
                    for (i, item) in items.iter().enumerate() {
                        schema.check(item, &format!("{pointer}/{i}"), refs, 0)?;
                    }
                }
            }
            Value::Object(members) => {
                if self.min_properties.is_some_and(|min| members.len() < min) {
                    return Err(ValidationError::new(pointer, "object has too few properties"));
                }
                if self.max_properties.is_some_and(|max| members.len() > max) {
                    return Err(ValidationError::new(pointer, "object has too many properties"));
                }
                for name in &self.required {
                    if !members.contains_key(name) {
                        return Err(ValidationError::new(
                            pointer,
                            format!("missing required property {name:?}"),
                        ));
                    }
                }
                for (name, member) in members {
                    let child = format!("{pointer}/{}", name.replace('~', "~0").replace('/', "~1"));
                    match (self.properties.get(name), &self.additional) {
                        (Some(schema), _) => schema.check(member, &child, refs, 0)?,
                        (None, Additional::Allow) => {}
                        (None, Additional::Deny) => {
                            return Err(ValidationError::new(
                                &child,
                                "additional properties are not allowed",
                            ))
                        }
                        (None, Additional::Schema(schema)) => schema.check(member, &child, refs, 0)?,
                    }
                }
            }
            Value::Null | Value::Bool(_) => {}
        }
        Ok(())
    }
}

/// A compiled JSON Schema.
#[derive(Clone, Debug)]
pub struct JsonSchema {
    root: Node,
    refs: Refs,
}

impl JsonSchema {
    /// Compile `schema`. Unknown keywords, malformed keyword values and
    /// non-local references fail with [`SchemaError::Unsupported`].
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        let mut compiler = Compiler::new(schema);
        let root = compiler.node(schema)?;
        Ok(Self {
            root,
            refs: compiler.refs,
        })
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, SchemaError> {
        Self::compile(&serde_json::from_slice(raw)?)
    }

    /// Load and compile a schema file.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        Self::from_slice(&std::fs::read(path)?)
    }
}

impl SchemaValidator for JsonSchema {
    fn validate(&self, body: &Value) -> Result<(), ValidationError> {
        self.root.check(body, "", &self.refs, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn schema() -> JsonSchema {
        JsonSchema::compile(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 1, "maxLength": 8},
                "age": {"type": "integer", "minimum": 0, "maximum": 150},
                "tags": {"type": "array", "items": {"type": "string"}},
                "role": {"enum": ["admin", "user"]}
            },
            "additionalProperties": false
        }))
        .unwrap()
    }

    #[test]
    fn allow_all_accepts_anything() {
        assert!(AllowAll.validate(&json!([1, "x", null])).is_ok());
    }

    #[test]
    fn conforming_body_passes() {
        let body = json!({"name": "ada", "age": 36, "tags": ["x"], "role": "admin"});
        assert!(schema().validate(&body).is_ok());
    }

    #[test]
    fn missing_required_property() {
        let err = schema().validate(&json!({"age": 3})).unwrap_err();
        assert_eq!(err.pointer, "");
        assert!(err.reason.contains("name"));
    }

    #[test]
    fn wrong_type_reports_pointer() {
        let err = schema().validate(&json!({"name": "a", "tags": ["x", 3]})).unwrap_err();
        assert_eq!(err.pointer, "/tags/1");
    }

    #[test]
    fn additional_properties_denied() {
        let err = schema().validate(&json!({"name": "a", "extra": true})).unwrap_err();
        assert_eq!(err.pointer, "/extra");
    }

    #[test]
    fn bounds_and_enum_enforced() {
        assert!(schema().validate(&json!({"name": "a", "age": -1})).is_err());
        assert!(schema().validate(&json!({"name": "a", "age": 2.5})).is_err());
        assert!(schema().validate(&json!({"name": "toolongname"})).is_err());
        assert!(schema().validate(&json!({"name": "a", "role": "root"})).is_err());
    }

    #[test]
    fn integer_accepts_whole_floats() {
        assert!(schema().validate(&json!({"name": "a", "age": 30.0})).is_ok());
    }

    #[test]
    fn boolean_schemas() {
        let never = JsonSchema::compile(&json!(false)).unwrap();
        assert!(never.validate(&json!({})).is_err());
        let always = JsonSchema::compile(&json!(true)).unwrap();
        assert!(always.validate(&json!(42)).is_ok());
    }

    #[test]
    fn unknown_type_rejected_at_compile() {
        assert!(JsonSchema::compile(&json!({"type": "date"})).is_err());
    }

    #[test]
    fn unsupported_keywords_fail_compilation() {
        for schema in [
            json!({"type": "string", "pattern": "^a"}),
            json!({"properties": {"email": {"format": "email"}}}),
            json!({"items": [{"type": "string"}]}),
            json!({"$ref": "https://example.com/other.json"}),
            json!({"$ref": "#/definitions/missing"}),
            json!({"minLength": "three"}),
            json!({"required": "name"}),
            json!({"anyOf": []}),
        ] {
            assert!(
                matches!(JsonSchema::compile(&schema), Err(SchemaError::Unsupported(_))),
                "{schema}"
            );
        }
    }

    #[test]
    fn annotations_are_accepted() {
        let schema = JsonSchema::compile(&json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "urn:nest:doc",
            "title": "doc",
            "description": "any object",
            "default": {},
            "examples": [{}],
            "type": "object"
        }))
        .unwrap();
        assert!(schema.validate(&json!({})).is_ok());
    }

    #[test]
    fn combined_keywords_reject_nonconforming_documents() {
        let schema = JsonSchema::compile(&json!({
            "definitions": {"nonEmpty": {"type": "string", "minLength": 1}},
            "type": "object",
            "required": ["id", "kind", "tags"],
            "properties": {
                "id": {"$ref": "#/definitions/nonEmpty"},
                "kind": {"const": "msg"},
                "tags": {
                    "type": "array",
                    "minItems": 1,
                    "uniqueItems": true,
                    "items": {"$ref": "#/definitions/nonEmpty"}
                },
                "body": {"oneOf": [{"type": "string"}, {"type": "object", "minProperties": 1}]},
                "score": {"type": "number", "exclusiveMinimum": 0, "not": {"const": 13}}
            }
        }))
        .unwrap();

        let good = json!({"id": "abc", "kind": "msg", "tags": ["a", "b"], "body": "hi", "score": 0.5});
        assert!(schema.validate(&good).is_ok());

        let cases = [
            (json!({"id": "", "kind": "msg", "tags": ["a"]}), "/id"),
            (json!({"id": "abc", "kind": "other", "tags": ["a"]}), "/kind"),
            (json!({"id": "abc", "kind": "msg", "tags": []}), "/tags"),
            (json!({"id": "abc", "kind": "msg", "tags": ["a", "a"]}), "/tags"),
            (json!({"id": "abc", "kind": "msg", "tags": [""]}), "/tags/0"),
            (json!({"id": "abc", "kind": "msg", "tags": ["a"], "body": 42}), "/body"),
            (json!({"id": "abc", "kind": "msg", "tags": ["a"], "body": {}}), "/body"),
            (json!({"id": "abc", "kind": "msg", "tags": ["a"], "score": 0}), "/score"),
            (json!({"id": "abc", "kind": "msg", "tags": ["a"], "score": 13}), "/score"),
        ];
        for (body, pointer) in cases {
            assert_eq!(schema.validate(&body).unwrap_err().pointer, pointer, "{body}");
        }
    }

    #[test]
    fn any_of_and_all_of() {
        let schema = JsonSchema::compile(&json!({
            "allOf": [{"type": "object"}, {"maxProperties": 2}],
            "anyOf": [{"required": ["a"]}, {"required": ["b"]}]
        }))
        .unwrap();
        assert!(schema.validate(&json!({"b": 1})).is_ok());
        assert!(schema.validate(&json!({"c": 1})).is_err());
        assert!(schema.validate(&json!({"a": 1, "b": 2, "c": 3})).is_err());
        assert!(schema.validate(&json!([])).is_err());
    }

    #[test]
    fn draft4_boolean_exclusive_bounds() {
        let schema =
            JsonSchema::compile(&json!({"minimum": 0, "exclusiveMinimum": true, "maximum": 10})).unwrap();
        assert!(schema.validate(&json!(0)).is_err());
        assert!(schema.validate(&json!(10)).is_ok());
        assert!(schema.validate(&json!(0.1)).is_ok());
    }

    #[test]
    fn recursive_references() {
        let node = JsonSchema::compile(&json!({
            "type": "object",
            "properties": {
                "value": {"type": "integer"},
                "children": {"type": "array", "items": {"$ref": "#"}}
            }
        }))
        .unwrap();
        let nested = json!({"value": 1, "children": [{"value": 2, "children": []}]});
        assert!(node.validate(&nested).is_ok());
        let err = node
            .validate(&json!({"value": 1, "children": [{"value": "x"}]}))
            .unwrap_err();
        assert_eq!(err.pointer, "/children/0/value");

        let looping = JsonSchema::compile(&json!({"$ref": "#"})).unwrap();
        assert!(looping.validate(&json!(1)).is_err());
    }

    #[test]
    fn validate_bytes_rejects_non_json() {
        assert!(AllowAll.validate_bytes(b"{not json").is_err());
        assert_eq!(AllowAll.validate_bytes(b"{\"a\":1}").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "object"}}"#).unwrap();
        let schema = JsonSchema::from_file(file.path()).unwrap();
        assert!(schema.validate(&json!({})).is_ok());
        assert!(schema.validate(&json!([])).is_err());
    }
}
