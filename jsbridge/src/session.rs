//! Engine session: one live script engine and its lifecycle.
//!
//! A session moves from open to closed exactly once. Every operation checks
//! for the engine first and reports [`BridgeError::SessionClosed`] instead of
//! touching a released engine; closing again is a no-op.
//!
//! Operations take `&mut self`, so one session can never run two evaluations
//! at the same time. The engine is not `Send`; a session stays on the thread
//! that created it. Scripts that never terminate block the caller.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use boa_engine::object::builtins::JsArray;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsBigInt, JsResult, JsString, JsValue, NativeFunction, Source};

use crate::config::SessionConfig;
use crate::convert::{JsonConverter, ObjectConverter};
use crate::error::{BridgeError, BridgeResult};
use crate::translate::Translator;
use crate::value::{HostArray, HostValue};

/// Host function callable from scripts.
pub type HostFunction = fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Words that cannot name a global binding.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// A script engine instance plus the converter used for non-primitive values.
pub struct Session {
    context: Option<Context>,
    converter: Box<dyn ObjectConverter>,
    config: SessionConfig,
}

impl Session {
    /// Start an engine with the default configuration.
    pub fn create() -> BridgeResult<Self> {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> BridgeResult<Self> {
        Self::with_converter(config, Box::new(JsonConverter))
    }

    /// Start an engine that converts objects with `converter`.
    pub fn with_converter(
        config: SessionConfig,
        converter: Box<dyn ObjectConverter>,
    ) -> BridgeResult<Self> {
        let context = Context::builder()
            .build()
            .map_err(|e| BridgeError::EngineInit(e.to_string()))?;
        log::debug!("Script session created (max_depth={})", config.max_depth);

        Ok(Self {
            context: Some(context),
            converter,
            config,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.context.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run `source` in the global scope and translate its completion value.
    ///
    /// `file_name` only labels diagnostics.
    pub fn evaluate(&mut self, source: &str, file_name: &str) -> BridgeResult<HostValue> {
        let Self {
            context,
            converter,
            config,
        } = self;
        let context = context.as_mut().ok_or(BridgeError::SessionClosed)?;

        log::trace!("Evaluating {} bytes from {}", source.len(), file_name);
        let result = context
            .eval(Source::from_bytes(source).with_path(Path::new(file_name)))
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

        let host = Translator::new(context, &**converter, config).translate(&result)?;
        Ok(host)
    }

    /// [`evaluate`](Self::evaluate) with the configured default file name.
    pub fn eval(&mut self, source: &str) -> BridgeResult<HostValue> {
        let file_name = self.config.default_file_name.clone();
        self.evaluate(source, &file_name)
    }

    /// Evaluate and extract a concrete Rust type from the result.
    ///
    /// `HostValue` itself is accepted and returns the result unchanged.
    pub fn evaluate_as<T>(&mut self, source: &str, file_name: &str) -> BridgeResult<T>
    where
        T: TryFrom<HostValue>,
        T::Error: Into<BridgeError>,
    {
        T::try_from(self.evaluate(source, file_name)?).map_err(Into::into)
    }

    /// Package source for later execution.
    ///
    /// The package is the UTF-8 source text itself; nothing is compiled.
    pub fn compile_to_bytecode(&self, source: &str, file_name: &str) -> Vec<u8> {
        log::debug!("Packaging {} ({} bytes)", file_name, source.len());
        source.as_bytes().to_vec()
    }

    /// Run a package produced by [`compile_to_bytecode`](Self::compile_to_bytecode).
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn execute_bytecode(&mut self, bytecode: &[u8]) -> BridgeResult<HostValue> {
        let source = String::from_utf8_lossy(bytecode);
        self.eval(&source)
    }

    /// Install `value` as a global visible to later evaluations.
    ///
    /// Opaque handles are installed as the exact script value they wrap.
    pub fn bind(&mut self, name: &str, value: impl Into<HostValue>) -> BridgeResult<()> {
        let value = value.into();
        let Self {
            context, converter, ..
        } = self;
        let context = context.as_mut().ok_or(BridgeError::SessionClosed)?;
        validate_binding_name(name)?;

        let script_value = to_script_value(&value, context, &**converter)
            .map_err(|message| binding_error(name, message))?;
        // Existing globals (including `var` declarations) are assigned, not redefined
        let global = context.global_object();
        let exists = global
            .has_own_property(JsString::from(name), context)
            .map_err(|e| binding_error(name, e.to_string()))?;
        if exists {
            global
                .set(JsString::from(name), script_value, true, context)
                .map_err(|e| binding_error(name, e.to_string()))?;
        } else {
            context
                .register_global_property(JsString::from(name), script_value, Attribute::all())
                .map_err(|e| binding_error(name, e.to_string()))?;
        }

        log::trace!("Bound global '{}' ({})", name, value.type_name());
        Ok(())
    }

    /// Install a host function as a global callable.
    pub fn bind_function(&mut self, name: &str, arity: usize, function: HostFunction) -> BridgeResult<()> {
        let context = self.context.as_mut().ok_or(BridgeError::SessionClosed)?;
        validate_binding_name(name)?;

        context
            .register_global_callable(
                JsString::from(name),
                arity,
                NativeFunction::from_fn_ptr(function),
            )
            .map_err(|e| binding_error(name, e.to_string()))?;

        log::trace!("Bound global function '{}'/{}", name, arity);
        Ok(())
    }

    /// Release the engine. Safe to call any number of times.
    pub fn close(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        // Teardown failures are logged, never propagated
        match panic::catch_unwind(AssertUnwindSafe(move || drop(context))) {
            Ok(()) => log::debug!("Script session closed"),
            Err(_) => log::warn!("Script engine teardown failed; session closed anyway"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Create a session with the default configuration.
pub fn create_session() -> BridgeResult<Session> {
    Session::create()
}

/// Evaluate `source` in a throwaway session and extract the result.
pub fn evaluate_once<T>(source: &str) -> BridgeResult<T>
where
    T: TryFrom<HostValue>,
    T::Error: Into<BridgeError>,
{
    let mut session = Session::create()?;
    let result = session.eval(source);
    session.close();
    T::try_from(result?).map_err(Into::into)
}

fn binding_error(name: &str, message: impl Into<String>) -> BridgeError {
    BridgeError::Binding {
        name: name.to_string(),
        message: message.into(),
    }
}

fn validate_binding_name(name: &str) -> BridgeResult<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if !valid_start || !valid_rest {
        return Err(binding_error(name, "not a valid identifier"));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(binding_error(name, "reserved word"));
    }
    Ok(())
}

/// Host → script direction used by `bind`.
fn to_script_value(
    value: &HostValue,
    context: &mut Context,
    converter: &dyn ObjectConverter,
) -> Result<JsValue, String> {
    Ok(match value {
        HostValue::Null => JsValue::null(),
        HostValue::Bool(b) => JsValue::from(*b),
        HostValue::Int(n) => JsValue::from(*n),
        HostValue::Long(n) => JsValue::from(JsBigInt::from(*n)),
        HostValue::Double(n) => JsValue::from(*n),
        HostValue::String(s) => JsValue::from(JsString::from(s.as_str())),
        HostValue::Array(array) => {
            let elements: Vec<JsValue> = match array {
                HostArray::Bool(v) => v.iter().map(|b| JsValue::from(*b)).collect(),
                HostArray::Int(v) => v.iter().map(|n| JsValue::from(*n)).collect(),
                HostArray::Long(v) => v.iter().map(|n| JsValue::from(JsBigInt::from(*n))).collect(),
                HostArray::Double(v) => v.iter().map(|n| JsValue::from(*n)).collect(),
                HostArray::String(v) => v
                    .iter()
                    .map(|s| JsValue::from(JsString::from(s.as_str())))
                    .collect(),
                HostArray::Mixed(v) => v
                    .iter()
                    .map(|item| to_script_value(item, context, converter))
                    .collect::<Result<_, _>>()?,
            };
            JsArray::from_iter(elements, context).into()
        }
        HostValue::Object(json) => converter.to_script(json, context)?,
        HostValue::Opaque(handle) => handle.value().clone(),
    })
}
