//! Shared plumbing: errors, clock, file persistence and data paths.

pub mod clock;
pub mod errors;
pub mod file_handler;
pub mod paths;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ConfigError, IdentityError, PersistenceError, UnknownCategory};
pub use file_handler::FileHandler;

/// Opaque caller-supplied context attached to a thought or an action.
pub type ContextMap = std::collections::HashMap<String, serde_json::Value>;

/// JSON truthiness: `false`, `null`, zero, and empty strings, arrays and
/// objects are falsy.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Clamp a value into `[0, 1]`. NaN maps to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a per-call delta into `[-limit, limit]`. NaN maps to no change.
pub(crate) fn clamp_delta(delta: f64, limit: f64) -> f64 {
    if delta.is_nan() {
        return 0.0;
    }
    delta.clamp(-limit, limit)
}
