//! Structured conversion for values the translator does not know.
//!
//! The translator only handles primitives and arrays itself. Objects go
//! through an [`ObjectConverter`] owned by the session, and bindings that
//! carry structured data use the reverse direction.

use boa_engine::{js_string, Context, JsValue};
use serde_json::Value;

/// Engine-side converter between script objects and structured host data.
pub trait ObjectConverter {
    /// Copy a script value into host data. An `Err` makes the translator
    /// hand the value back as a passthrough handle.
    fn to_host(&self, value: &JsValue, context: &mut Context) -> Result<Value, String>;

    /// Build a script value from host data.
    fn to_script(&self, value: &Value, context: &mut Context) -> Result<JsValue, String>;
}

/// Converter backed by the engine's own JSON support.
///
/// Whatever `JSON.stringify` refuses (functions, symbols, cycles, BigInts)
/// fails here too.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConverter;

impl ObjectConverter for JsonConverter {
    fn to_host(&self, value: &JsValue, context: &mut Context) -> Result<Value, String> {
        let json = context
            .global_object()
            .get(js_string!("JSON"), context)
            .map_err(|e| e.to_string())?;
        let stringify = json
            .as_object()
            .ok_or("global JSON is not an object")?
            .get(js_string!("stringify"), context)
            .map_err(|e| e.to_string())?;
        let stringify = stringify
            .as_callable()
            .ok_or("JSON.stringify is not callable")?;

        let text = stringify
            .call(&JsValue::undefined(), &[value.clone()], context)
            .map_err(|e| e.to_string())?;

        match text {
            JsValue::String(s) => {
                serde_json::from_str(&s.to_std_string_escaped()).map_err(|e| e.to_string())
            }
            _ => Err("value has no JSON representation".to_string()),
        }
    }

    fn to_script(&self, value: &Value, context: &mut Context) -> Result<JsValue, String> {
        JsValue::from_json(value, context).map_err(|e| e.to_string())
    }
}
