//! Embeds a JavaScript engine and marshals its values into native Rust types.
//!
//! ```ignore
//! use jsbridge::{HostValue, Session};
//!
//! let mut session = Session::create()?;
//! session.bind("limit", 3)?;
//! let pages: Vec<i32> = session.evaluate_as("[1, 2, 3].slice(0, limit)", "pages.js")?;
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod session;
pub mod translate;
pub mod value;

pub use config::SessionConfig;
pub use convert::{JsonConverter, ObjectConverter};
pub use error::{BridgeError, BridgeResult, TranslationError};
pub use session::{create_session, evaluate_once, HostFunction, Session, SessionState};
pub use translate::Translator;
pub use value::{HostArray, HostValue, OpaqueHandle, ScriptValue, ValueKind};
