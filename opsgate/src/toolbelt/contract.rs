//! Operation contracts: argument kinds, typed values and the contract itself.

use super::OperationHandler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The kind of value an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// A UTF-8 string.
    String,
    /// A boolean flag.
    Boolean,
    /// A signed 64-bit integer.
    Integer,
    /// A floating point number.
    Number,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
        }
    }
}

impl ArgKind {
    /// Coerces a raw JSON value into a typed value of this kind.
    ///
    /// Integers also accept floats with no fractional part, since
    /// function-call arguments produced by language models often encode
    /// `10` as `10.0`. Returns `None` when the value does not fit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn coerce(self, value: &serde_json::Value) -> Option<ArgValue> {
        match (self, value) {
            (Self::String, serde_json::Value::String(s)) => Some(ArgValue::String(s.clone())),
            (Self::Boolean, serde_json::Value::Bool(b)) => Some(ArgValue::Boolean(*b)),
            (Self::Integer, serde_json::Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(ArgValue::Integer(i));
                }
                let f = n.as_f64()?;
                // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
                let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
                (f.is_finite() && f.fract() == 0.0 && in_range).then(|| ArgValue::Integer(f as i64))
            }
            (Self::Number, serde_json::Value::Number(n)) => n.as_f64().map(ArgValue::Number),
            _ => None,
        }
    }
}

/// A validated, typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Number(f64),
    /// A string value.
    String(String),
}

impl ArgValue {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Boolean(_) => ArgKind::Boolean,
            Self::Integer(_) => ArgKind::Integer,
            Self::Number(_) => ArgKind::Number,
            Self::String(_) => ArgKind::String,
        }
    }

    /// Returns the string if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float for numeric kinds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Boolean(b) => serde_json::json!(b),
            Self::Integer(i) => serde_json::json!(i),
            Self::Number(f) => serde_json::json!(f),
            Self::String(s) => serde_json::json!(s),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Validated arguments keyed by name.
///
/// Ordered by name so that rendering and logging are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, ArgValue>);

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, returning the updated set.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    /// Gets an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    /// Gets a string argument, failing with a descriptive error.
    pub fn require_str(&self, name: &str) -> anyhow::Result<&str> {
        self.get(name)
            .and_then(ArgValue::as_str)
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' must be a string"))
    }

    /// Gets a boolean argument, failing with a descriptive error.
    pub fn require_bool(&self, name: &str) -> anyhow::Result<bool> {
        self.get(name)
            .and_then(ArgValue::as_bool)
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' must be a boolean"))
    }

    /// Gets an integer argument, failing with a descriptive error.
    pub fn require_i64(&self, name: &str) -> anyhow::Result<i64> {
        self.get(name)
            .and_then(ArgValue::as_i64)
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' must be an integer"))
    }

    /// Returns true if the argument is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over arguments in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.0.iter()
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Declaration of a single operation argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// The argument name.
    pub name: String,
    /// The expected kind.
    pub kind: ArgKind,
    /// Whether the proposer must supply it.
    pub required: bool,
    /// Value used when an optional argument is omitted.
    pub default: Option<ArgValue>,
    /// Human-readable description.
    pub description: String,
}

impl ArgSpec {
    /// Declares a required argument.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: String::new(),
        }
    }

    /// Declares an optional argument with a default value.
    ///
    /// The registry refuses the contract if the default does not coerce to
    /// `kind`.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ArgKind, default: impl Into<ArgValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: Some(default.into()),
            description: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    fn schema(&self) -> serde_json::Value {
        let mut schema = serde_json::json!({
            "type": self.kind.to_string(),
        });
        if !self.description.is_empty() {
            schema["description"] = serde_json::json!(self.description);
        }
        if let Some(ref default) = self.default {
            schema["default"] = default.to_json();
        }
        schema
    }
}

/// Contract for a single operation in the toolbelt.
///
/// Contracts are built once from a fixed manifest and are immutable after
/// registration: every field is private and only readable.
#[derive(Clone)]
pub struct OperationContract {
    name: String,
    description: String,
    args: Vec<ArgSpec>,
    handler: Arc<dyn OperationHandler>,
}

impl OperationContract {
    /// Creates a new contract with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: Arc<dyn OperationHandler>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            args: Vec::new(),
            handler,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Appends an argument declaration.
    #[must_use]
    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared arguments in declaration order.
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Finds an argument declaration by name.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn OperationHandler> {
        &self.handler
    }

    /// Builds a function declaration suitable for a tool-calling model.
    #[must_use]
    pub fn declaration(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .args
            .iter()
            .map(|a| (a.name.clone(), a.schema()))
            .collect();
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect();

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        })
    }
}

impl fmt::Debug for OperationContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContract")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
