//! Script-side and host-side value representations.
//!
//! [`ScriptValue`] is a tagged view over an engine value, [`HostValue`] is
//! what callers get back. Neither retains the engine beyond the handles Boa
//! already reference-counts.

use std::fmt;

use boa_engine::object::builtins::JsArray;
use boa_engine::{JsString, JsValue};
use serde_json::{Number, Value};

use crate::error::BridgeError;

/// Tag of a script value, as far as marshalling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Undefined,
    Null,
    Boolean,
    Integer32,
    Integer64,
    Float64,
    String,
    Array,
    Other,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer32 => "int32",
            ValueKind::Integer64 => "int64",
            ValueKind::Float64 => "float64",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Other => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine value classified by tag.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Integer32(i32),
    /// A BigInt that fits in 64 bits.
    Integer64(i64),
    Float64(f64),
    String(JsString),
    Array(JsArray),
    /// Objects, functions, symbols and oversized BigInts.
    Other(JsValue),
}

impl ScriptValue {
    pub fn classify(value: &JsValue) -> Self {
        match value {
            JsValue::Undefined => ScriptValue::Undefined,
            JsValue::Null => ScriptValue::Null,
            JsValue::Boolean(b) => ScriptValue::Boolean(*b),
            JsValue::Integer(i) => ScriptValue::Integer32(*i),
            JsValue::Rational(f) => ScriptValue::Float64(*f),
            JsValue::String(s) => ScriptValue::String(s.clone()),
            JsValue::BigInt(big) => match big.to_string().parse::<i64>() {
                Ok(v) => ScriptValue::Integer64(v),
                Err(_) => ScriptValue::Other(value.clone()),
            },
            JsValue::Object(obj) if obj.is_array() => match JsArray::from_object(obj.clone()) {
                Ok(array) => ScriptValue::Array(array),
                Err(_) => ScriptValue::Other(value.clone()),
            },
            _ => ScriptValue::Other(value.clone()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ScriptValue::Undefined => ValueKind::Undefined,
            ScriptValue::Null => ValueKind::Null,
            ScriptValue::Boolean(_) => ValueKind::Boolean,
            ScriptValue::Integer32(_) => ValueKind::Integer32,
            ScriptValue::Integer64(_) => ValueKind::Integer64,
            ScriptValue::Float64(_) => ValueKind::Float64,
            ScriptValue::String(_) => ValueKind::String,
            ScriptValue::Array(_) => ValueKind::Array,
            ScriptValue::Other(_) => ValueKind::Other,
        }
    }
}

/// Script value handed to the host unconverted.
///
/// Binding it back into a session installs the very same script value.
#[derive(Debug, Clone)]
pub struct OpaqueHandle(JsValue);

impl OpaqueHandle {
    pub fn new(value: JsValue) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &JsValue {
        &self.0
    }

    pub fn into_inner(self) -> JsValue {
        self.0
    }

    /// Short description of what the handle points at.
    pub fn describe(&self) -> &'static str {
        match &self.0 {
            JsValue::Object(obj) if obj.is_callable() => "function",
            JsValue::Object(_) => "object",
            JsValue::Symbol(_) => "symbol",
            JsValue::BigInt(_) => "bigint",
            _ => "value",
        }
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.strict_equals(&other.0)
    }
}

/// Homogeneous or mixed host sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArray {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
    /// Element-wise translated values, order preserved.
    Mixed(Vec<HostValue>),
}

impl HostArray {
    /// The canonical empty array: an empty integer sequence.
    pub fn empty() -> Self {
        HostArray::Int(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            HostArray::Bool(v) => v.len(),
            HostArray::Int(v) => v.len(),
            HostArray::Long(v) => v.len(),
            HostArray::Double(v) => v.len(),
            HostArray::String(v) => v.len(),
            HostArray::Mixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostArray::Bool(_) => "bool[]",
            HostArray::Int(_) => "int[]",
            HostArray::Long(_) => "long[]",
            HostArray::Double(_) => "double[]",
            HostArray::String(_) => "string[]",
            HostArray::Mixed(_) => "value[]",
        }
    }
}

/// Result of translating a script value into host terms.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// `undefined` and `null` both land here.
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Array(HostArray),
    /// Structured copy produced by the object converter.
    Object(Value),
    /// Nothing could convert it; the raw script value.
    Opaque(OpaqueHandle),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Long(_) => "long",
            HostValue::Double(_) => "double",
            HostValue::String(_) => "string",
            HostValue::Array(array) => array.type_name(),
            HostValue::Object(_) => "object",
            HostValue::Opaque(_) => "opaque",
        }
    }

    fn mismatch(&self, expected: &'static str) -> BridgeError {
        BridgeError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }
}

// ─── Host constructors ────────────────────────────────────────────────────────

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<i32> for HostValue {
    fn from(v: i32) -> Self {
        HostValue::Int(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        HostValue::Long(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Double(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::String(v.to_string())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::String(v)
    }
}

impl From<HostArray> for HostValue {
    fn from(v: HostArray) -> Self {
        HostValue::Array(v)
    }
}

impl From<Value> for HostValue {
    fn from(v: Value) -> Self {
        HostValue::Object(v)
    }
}

impl From<OpaqueHandle> for HostValue {
    fn from(v: OpaqueHandle) -> Self {
        HostValue::Opaque(v)
    }
}

// ─── Typed extraction ─────────────────────────────────────────────────────────

macro_rules! impl_extract {
    ($ty:ty, $expected:literal, $($pat:pat => $out:expr),+) => {
        impl TryFrom<HostValue> for $ty {
            type Error = BridgeError;

            fn try_from(value: HostValue) -> Result<Self, Self::Error> {
                match value {
                    $($pat => Ok($out),)+
                    other => Err(other.mismatch($expected)),
                }
            }
        }

        impl TryFrom<HostValue> for Option<$ty> {
            type Error = BridgeError;

            fn try_from(value: HostValue) -> Result<Self, Self::Error> {
                match value {
                    HostValue::Null => Ok(None),
                    other => <$ty>::try_from(other).map(Some),
                }
            }
        }
    };
}

impl_extract!(bool, "bool", HostValue::Bool(v) => v);
impl_extract!(i32, "int", HostValue::Int(v) => v);
impl_extract!(i64, "long",
    HostValue::Long(v) => v,
    HostValue::Int(v) => i64::from(v));
impl_extract!(f64, "double",
    HostValue::Double(v) => v,
    HostValue::Int(v) => f64::from(v));
impl_extract!(String, "string", HostValue::String(v) => v);
impl_extract!(Vec<bool>, "bool[]", HostValue::Array(HostArray::Bool(v)) => v);
impl_extract!(Vec<i32>, "int[]", HostValue::Array(HostArray::Int(v)) => v);
impl_extract!(Vec<i64>, "long[]",
    HostValue::Array(HostArray::Long(v)) => v,
    HostValue::Array(HostArray::Int(v)) => v.into_iter().map(i64::from).collect());
impl_extract!(Vec<f64>, "double[]",
    HostValue::Array(HostArray::Double(v)) => v,
    HostValue::Array(HostArray::Int(v)) => v.into_iter().map(f64::from).collect());
impl_extract!(Vec<String>, "string[]", HostValue::Array(HostArray::String(v)) => v);
impl_extract!(Vec<HostValue>, "value[]", HostValue::Array(HostArray::Mixed(v)) => v);
impl_extract!(Value, "object", HostValue::Object(v) => v);

// ─── JSON rendering ───────────────────────────────────────────────────────────

fn json_number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

impl From<&HostArray> for Value {
    fn from(array: &HostArray) -> Self {
        match array {
            HostArray::Bool(v) => Value::Array(v.iter().map(|b| Value::Bool(*b)).collect()),
            HostArray::Int(v) => Value::Array(v.iter().map(|n| Value::from(*n)).collect()),
            HostArray::Long(v) => Value::Array(v.iter().map(|n| Value::from(*n)).collect()),
            HostArray::Double(v) => Value::Array(v.iter().map(|n| json_number(*n)).collect()),
            HostArray::String(v) => Value::Array(v.iter().map(|s| Value::String(s.clone())).collect()),
            HostArray::Mixed(v) => Value::Array(v.iter().map(Value::from).collect()),
        }
    }
}

impl From<&HostValue> for Value {
    fn from(value: &HostValue) -> Self {
        match value {
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Int(n) => Value::from(*n),
            HostValue::Long(n) => Value::from(*n),
            HostValue::Double(n) => json_number(*n),
            HostValue::String(s) => Value::String(s.clone()),
            HostValue::Array(array) => Value::from(array),
            HostValue::Object(v) => v.clone(),
            HostValue::Opaque(handle) => Value::String(format!("[opaque {}]", handle.describe())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_engine::{Context, Source};
    use serde_json::json;

    fn eval(context: &mut Context, src: &str) -> JsValue {
        context.eval(Source::from_bytes(src)).unwrap()
    }

    #[test]
    fn test_classify_primitives() {
        let mut context = Context::default();
        assert_eq!(ScriptValue::classify(&JsValue::undefined()).kind(), ValueKind::Undefined);
        assert_eq!(ScriptValue::classify(&JsValue::null()).kind(), ValueKind::Null);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "true")).kind(), ValueKind::Boolean);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "42")).kind(), ValueKind::Integer32);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "1.5")).kind(), ValueKind::Float64);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "'x'")).kind(), ValueKind::String);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "[1]")).kind(), ValueKind::Array);
        assert_eq!(ScriptValue::classify(&eval(&mut context, "({})")).kind(), ValueKind::Other);
    }

    #[test]
    fn test_classify_bigint_range() {
        let mut context = Context::default();
        match ScriptValue::classify(&eval(&mut context, "9007199254740993n")) {
            ScriptValue::Integer64(v) => assert_eq!(v, 9_007_199_254_740_993),
            other => panic!("unexpected classification: {:?}", other.kind()),
        }
        let huge = eval(&mut context, "2n ** 80n");
        assert_eq!(ScriptValue::classify(&huge).kind(), ValueKind::Other);
    }

    #[test]
    fn test_extract_scalars() {
        assert!(bool::try_from(HostValue::Bool(true)).unwrap());
        assert_eq!(i32::try_from(HostValue::Int(7)).unwrap(), 7);
        assert_eq!(i64::try_from(HostValue::Int(7)).unwrap(), 7);
        assert_eq!(f64::try_from(HostValue::Int(2)).unwrap(), 2.0);
        assert_eq!(String::try_from(HostValue::from("ab")).unwrap(), "ab");
        assert_eq!(Option::<i32>::try_from(HostValue::Null).unwrap(), None);
        assert_eq!(Option::<i32>::try_from(HostValue::Int(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_extract_mismatch() {
        let err = i32::try_from(HostValue::from("nope")).unwrap_err();
        match err {
            BridgeError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(Vec::<String>::try_from(HostValue::Array(HostArray::empty())).is_err());
    }

    #[test]
    fn test_json_rendering() {
        let value = HostValue::Array(HostArray::Mixed(vec![
            HostValue::Int(1),
            HostValue::from("two"),
            HostValue::Array(HostArray::Double(vec![0.5, f64::NAN])),
            HostValue::Null,
        ]));
        assert_eq!(Value::from(&value), json!([1, "two", [0.5, null], null]));

        let opaque = HostValue::Opaque(OpaqueHandle::new(JsValue::undefined()));
        assert_eq!(Value::from(&opaque), json!("[opaque value]"));
    }

    #[test]
    fn test_empty_array_is_int_kind() {
        let empty = HostArray::empty();
        assert!(empty.is_empty());
        assert_eq!(empty, HostArray::Int(vec![]));
        assert_eq!(empty.type_name(), "int[]");
    }

    #[test]
    fn test_host_value_equality() {
        let mut context = Context::default();
        let object = eval(&mut context, "({})");
        let same = HostValue::Opaque(OpaqueHandle::new(object.clone()));
        let other = HostValue::Opaque(OpaqueHandle::new(eval(&mut context, "({})")));

        assert_eq!(same, HostValue::Opaque(OpaqueHandle::new(object)));
        assert_ne!(same, other);
        assert_ne!(HostValue::Int(1), HostValue::Long(1));
        assert_ne!(HostValue::Double(f64::NAN), HostValue::Double(f64::NAN));
    }
}
