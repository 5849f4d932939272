//! Script → host value translation.
//!
//! Primitives map one-to-one. Arrays are specialized by the tag of their
//! first element: every element must then carry that same tag, otherwise the
//! whole array fails with the offending index. Arrays whose first element is
//! not a scalar take the generic path and are translated element by element.
//!
//! Values that are neither primitives nor arrays go through the session's
//! [`ObjectConverter`]; when that fails the raw value is passed through so a
//! successful evaluation never fails on an unknown nested value.

use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsString, JsValue};

use crate::config::SessionConfig;
use crate::convert::ObjectConverter;
use crate::error::TranslationError;
use crate::value::{HostArray, HostValue, OpaqueHandle, ScriptValue, ValueKind};

/// Upper bound on capacity reserved from a script-reported length.
const MAX_PREALLOCATED_ELEMENTS: u32 = 1024;

/// Translates engine values produced within one evaluation.
pub struct Translator<'a> {
    context: &'a mut Context,
    converter: &'a dyn ObjectConverter,
    config: &'a SessionConfig,
}

impl<'a> Translator<'a> {
    pub fn new(
        context: &'a mut Context,
        converter: &'a dyn ObjectConverter,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            context,
            converter,
            config,
        }
    }

    /// Convert a single script value into its most specific host form.
    pub fn translate(&mut self, value: &JsValue) -> Result<HostValue, TranslationError> {
        self.translate_at(value, 0)
    }

    /// Convert a script array, choosing the element type from element 0.
    pub fn specialize(&mut self, array: &JsArray) -> Result<HostValue, TranslationError> {
        self.specialize_at(array, 0)
    }

    fn translate_at(&mut self, value: &JsValue, depth: usize) -> Result<HostValue, TranslationError> {
        Ok(match ScriptValue::classify(value) {
            ScriptValue::Undefined | ScriptValue::Null => HostValue::Null,
            ScriptValue::Boolean(b) => HostValue::Bool(b),
            ScriptValue::Integer32(v) => HostValue::Int(v),
            ScriptValue::Integer64(v) => HostValue::Long(v),
            ScriptValue::Float64(v) => HostValue::Double(v),
            ScriptValue::String(s) => HostValue::String(host_string(&s)?),
            ScriptValue::Array(array) => self.specialize_at(&array, depth)?,
            ScriptValue::Other(value) => self.convert_object(&value),
        })
    }

    fn specialize_at(&mut self, array: &JsArray, depth: usize) -> Result<HostValue, TranslationError> {
        if depth >= self.config.max_depth {
            return Err(TranslationError::new(format!(
                "array nesting exceeds {} levels",
                self.config.max_depth
            )));
        }

        let len = array
            .length(self.context)
            .map_err(|e| TranslationError::new(e.to_string()))?;
        let len = u32::try_from(len)
            .map_err(|_| TranslationError::new(format!("array length {len} out of range")))?;

        if len == 0 {
            return Ok(HostValue::Array(HostArray::empty()));
        }

        let first_raw = self.element(array, 0)?;
        let first = ScriptValue::classify(&first_raw);
        log::trace!("Specializing array of {} elements as {}", len, first.kind());

        let host = match first.kind() {
            ValueKind::Boolean => HostArray::Bool(self.collect(array, len, first, |v| match v {
                ScriptValue::Boolean(b) => Some(b),
                _ => None,
            })?),
            ValueKind::Integer32 => HostArray::Int(self.collect(array, len, first, |v| match v {
                ScriptValue::Integer32(n) => Some(n),
                _ => None,
            })?),
            ValueKind::Integer64 => HostArray::Long(self.collect(array, len, first, |v| match v {
                ScriptValue::Integer64(n) => Some(n),
                _ => None,
            })?),
            ValueKind::Float64 => HostArray::Double(self.collect(array, len, first, |v| match v {
                ScriptValue::Float64(n) => Some(n),
                _ => None,
            })?),
            ValueKind::String => {
                let strings = self.collect(array, len, first, |v| match v {
                    ScriptValue::String(s) => Some(s),
                    _ => None,
                })?;
                let strings = strings
                    .iter()
                    .enumerate()
                    .map(|(index, s)| host_string(s).map_err(|e| e.nested_in(index)))
                    .collect::<Result<Vec<_>, _>>()?;
                HostArray::String(strings)
            }
            ValueKind::Undefined | ValueKind::Null | ValueKind::Array | ValueKind::Other => {
                let mut items = Vec::with_capacity(len.min(MAX_PREALLOCATED_ELEMENTS) as usize);
                items.push(
                    self.translate_at(&first_raw, depth + 1)
                        .map_err(|e| e.nested_in(0))?,
                );
                for index in 1..len {
                    let element = self.element(array, index)?;
                    items.push(
                        self.translate_at(&element, depth + 1)
                            .map_err(|e| e.nested_in(index as usize))?,
                    );
                }
                HostArray::Mixed(items)
            }
        };

        Ok(HostValue::Array(host))
    }

    /// Read every element with the kind of `first`; any other tag aborts.
    fn collect<T>(
        &mut self,
        array: &JsArray,
        len: u32,
        first: ScriptValue,
        extract: impl Fn(ScriptValue) -> Option<T>,
    ) -> Result<Vec<T>, TranslationError> {
        let kind = first.kind();
        let mut out = Vec::with_capacity(len.min(MAX_PREALLOCATED_ELEMENTS) as usize);
        let mut next = Some(first);

        for index in 0..len {
            let element = match next.take() {
                Some(element) => element,
                None => ScriptValue::classify(&self.element(array, index)?),
            };
            let found = element.kind();
            match extract(element) {
                Some(v) => out.push(v),
                None => return Err(TranslationError::kind_mismatch(index as usize, kind, found)),
            }
        }

        Ok(out)
    }

    fn element(&mut self, array: &JsArray, index: u32) -> Result<JsValue, TranslationError> {
        array
            .get(index, self.context)
            .map_err(|e| TranslationError::element(index as usize, e.to_string()))
    }

    fn convert_object(&mut self, value: &JsValue) -> HostValue {
        if !self.config.convert_objects {
            return HostValue::Opaque(OpaqueHandle::new(value.clone()));
        }
        match self.converter.to_host(value, self.context) {
            Ok(converted) => HostValue::Object(converted),
            Err(message) => {
                log::warn!("Object conversion failed, passing value through: {}", message);
                HostValue::Opaque(OpaqueHandle::new(value.clone()))
            }
        }
    }
}

fn host_string(s: &JsString) -> Result<String, TranslationError> {
    s.to_std_string()
        .map_err(|_| TranslationError::new("string contains unpaired UTF-16 surrogates"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::JsonConverter;
    use boa_engine::Source;
    use serde_json::json;

    fn run_with(config: &SessionConfig, src: &str) -> Result<HostValue, TranslationError> {
        let mut context = Context::default();
        let value = context.eval(Source::from_bytes(src)).unwrap();
        Translator::new(&mut context, &JsonConverter, config).translate(&value)
    }

    fn run(src: &str) -> Result<HostValue, TranslationError> {
        run_with(&SessionConfig::default(), src)
    }

    fn array(value: HostValue) -> HostArray {
        match value {
            HostValue::Array(array) => array,
            other => panic!("expected array, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(run("undefined").unwrap(), HostValue::Null);
        assert_eq!(run("null").unwrap(), HostValue::Null);
        assert_eq!(run("true").unwrap(), HostValue::Bool(true));
        assert_eq!(run("42").unwrap(), HostValue::Int(42));
        assert_eq!(run("1.5").unwrap(), HostValue::Double(1.5));
        assert_eq!(run("10n ** 12n").unwrap(), HostValue::Long(1_000_000_000_000));
        assert_eq!(run("'héllo ✓'").unwrap(), HostValue::from("héllo ✓"));
    }

    #[test]
    fn test_unpaired_surrogate_fails() {
        let err = run("'\\uD800'").unwrap_err();
        assert!(err.path.is_empty());
        assert!(err.message.contains("surrogate"));
    }

    #[test]
    fn test_empty_array_defaults_to_int() {
        assert_eq!(array(run("[]").unwrap()), HostArray::Int(vec![]));
    }

    #[test]
    fn test_homogeneous_arrays() {
        assert_eq!(
            array(run("[true, false, true]").unwrap()),
            HostArray::Bool(vec![true, false, true])
        );
        assert_eq!(array(run("[1, 2, 3]").unwrap()), HostArray::Int(vec![1, 2, 3]));
        assert_eq!(array(run("[1n, 2n]").unwrap()), HostArray::Long(vec![1, 2]));
        assert_eq!(array(run("[0.5, 1.25]").unwrap()), HostArray::Double(vec![0.5, 1.25]));
        assert_eq!(
            array(run("['a', 'b']").unwrap()),
            HostArray::String(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_first_element_decides_kind() {
        let err = run("['a', 1]").unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.expected, Some(ValueKind::String));

        // Integer-valued numbers are int32 in the engine, so this is mixed too
        let err = run("[1, 2.5]").unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.expected, Some(ValueKind::Integer32));
    }

    #[test]
    fn test_nested_arrays_take_generic_path() {
        let value = array(run("[[1, 2], [3, 4]]").unwrap());
        assert_eq!(
            value,
            HostArray::Mixed(vec![
                HostValue::Array(HostArray::Int(vec![1, 2])),
                HostValue::Array(HostArray::Int(vec![3, 4])),
            ])
        );
    }

    #[test]
    fn test_generic_path_mixed_content() {
        let value = array(run("[null, 1, 'x', { a: 1 }]").unwrap());
        assert_eq!(
            value,
            HostArray::Mixed(vec![
                HostValue::Null,
                HostValue::Int(1),
                HostValue::from("x"),
                HostValue::Object(json!({ "a": 1 })),
            ])
        );
    }

    #[test]
    fn test_nested_failure_path() {
        let err = run("[[1, 2], [3, 'x']]").unwrap_err();
        assert_eq!(err.path, vec![1, 1]);
        assert_eq!(err.expected, Some(ValueKind::Integer32));
    }

    #[test]
    fn test_element_fetch_failure_aborts() {
        let src = "var a = [1, 2]; \
                   Object.defineProperty(a, 1, { get: function () { throw 'boom'; } }); \
                   a";
        let err = run(src).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.expected, None);
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_huge_sparse_array_fails_at_first_bad_element() {
        let err = run("var a = []; a.length = 4294967295; a[0] = 1; a[1] = 'x'; a").unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.expected, Some(ValueKind::Integer32));

        let err = run("var b = []; b.length = 4294967295; b[0] = null; b[1] = ['x', 1]; b").unwrap_err();
        assert_eq!(err.path, vec![1, 1]);
        assert_eq!(err.expected, Some(ValueKind::String));
    }

    #[test]
    fn test_self_containing_array_hits_depth_limit() {
        let config = SessionConfig::new().with_max_depth(4);
        let err = run_with(&config, "var a = [0]; a[0] = a; a").unwrap_err();
        assert_eq!(err.path, vec![0, 0, 0, 0]);
        assert!(err.message.contains("4 levels"));
    }

    #[test]
    fn test_object_conversion() {
        assert_eq!(
            run("({ title: 'x', chapters: [1, 2] })").unwrap(),
            HostValue::Object(json!({ "title": "x", "chapters": [1, 2] }))
        );
    }

    #[test]
    fn test_unconvertible_values_pass_through() {
        match run("(function () {})").unwrap() {
            HostValue::Opaque(handle) => assert_eq!(handle.describe(), "function"),
            other => panic!("expected opaque, got {}", other.type_name()),
        }
        match run("Symbol('s')").unwrap() {
            HostValue::Opaque(handle) => assert_eq!(handle.describe(), "symbol"),
            other => panic!("expected opaque, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_object_conversion_disabled() {
        let config = SessionConfig::new().without_object_conversion();
        assert!(matches!(run_with(&config, "({ a: 1 })").unwrap(), HostValue::Opaque(_)));
    }
}
