//! Typed environment access.
//!
//! Deployments hand this code a flat bag of strings; applications want a
//! struct. [`typed_env`] bridges the two with a serde round-trip: define the
//! schema as a `Deserialize` type, get back either the validated value or a
//! configuration error naming what's wrong. Fail-fast material for startup
//! paths.
//!
//! ```rust,no_run
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Env {
//!     #[serde(rename = "DATABASE_URL")]
//!     database_url: String,
//!     #[serde(rename = "SENTRY_DSN")]
//!     sentry_dsn: Option<String>,
//! }
//!
//! let env: Env = torii::typed_env().expect("environment is complete");
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Validates the process environment against the schema `T`.
///
/// Environment values are strings, so `T`'s fields should be `String`,
/// `Option<String>`, or types that deserialize from strings. Unknown
/// variables are ignored; a missing required field is an
/// [`Error::Config`].
pub fn typed_env<T: DeserializeOwned>() -> Result<T, Error> {
    typed_env_from(std::env::vars())
}

/// Like [`typed_env`], over an explicit set of variables.
pub fn typed_env_from<T: DeserializeOwned>(
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<T, Error> {
    let object: serde_json::Map<String, Value> = vars
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    serde_json::from_value(Value::Object(object))
        .map_err(|err| Error::Config(format!("environment does not match schema: {err}")))
}
