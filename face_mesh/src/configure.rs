use std::fmt::Display;

use serde_json::Value;
use tracing::debug;

use crate::environment::Environment;
use crate::error::ConfigureError;
use crate::params::{allowed_values, FlagConfig, FlagValue};

/// Runtime whose backends are torn down and re-initialised when flags change.
pub const RESETTING_RUNTIME: &str = "tfjs";

/// A `<runtime>-<backend>` identifier such as `tfjs-webgl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendId {
    pub runtime: String,
    pub backend: String,
}

impl BackendId {
    /// Only the first two `-` separated components are significant.
    pub fn parse(id: &str) -> Result<Self, ConfigureError> {
        let mut parts = id.split('-');
        match (parts.next(), parts.next()) {
            (Some(runtime), Some(backend)) if !runtime.is_empty() && !backend.is_empty() => {
                Ok(BackendId {
                    runtime: runtime.to_owned(),
                    backend: backend.to_owned(),
                })
            }
            _ => Err(ConfigureError::InvalidArgument(format!(
                "A backend of the form <runtime>-<backend> is expected, while {id:?} is found."
            ))),
        }
    }

    pub fn resets_backend(&self) -> bool {
        self.runtime == RESETTING_RUNTIME
    }
}

impl Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.runtime, self.backend)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_value(flag: &str, value: FlagValue) -> Result<(), ConfigureError> {
    let allowed =
        allowed_values(flag).ok_or_else(|| ConfigureError::UnknownFlag(flag.to_owned()))?;
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ConfigureError::InvalidFlagValue {
            flag: flag.to_owned(),
            value: value.to_string(),
            allowed,
        })
    }
}

/// Turns a JSON object into a [`FlagConfig`], rejecting unknown flags and illegal values.
pub fn parse_flag_config(value: &Value) -> Result<FlagConfig, ConfigureError> {
    let Value::Object(map) = value else {
        return Err(ConfigureError::InvalidArgument(format!(
            "An object is expected, while a(n) {} is found.",
            json_kind(value)
        )));
    };
    let mut config = FlagConfig::new();
    for (flag, raw) in map {
        let Some(allowed) = allowed_values(flag) else {
            return Err(ConfigureError::UnknownFlag(flag.clone()));
        };
        let value = FlagValue::from_json(raw).ok_or_else(|| ConfigureError::InvalidFlagValue {
            flag: flag.clone(),
            value: raw.to_string(),
            allowed,
        })?;
        check_value(flag, value)?;
        config.insert(flag.clone(), value);
    }
    Ok(config)
}

/// Checks every entry of `config` without touching any environment.
pub fn validate_flags(config: &FlagConfig) -> Result<(), ConfigureError> {
    config
        .iter()
        .try_for_each(|(flag, value)| check_value(flag, *value))
}

/// Validates `flag_config`, applies it to `env` and, for the `tfjs` runtime,
/// resets the target backend so it picks the new flags up.
///
/// A missing or `null` config is a no-op and the backend id is not examined.
///
/// ```ignore
/// let flags = serde_json::json!({ "WEBGL_PACK": false });
/// configure(&mut env, Some(&flags), "tfjs-webgl").await?;
/// assert_eq!(env.flags().get_bool("WEBGL_PACK"), Some(false));
/// ```
pub async fn configure(
    env: &mut Environment,
    flag_config: Option<&Value>,
    backend_id: &str,
) -> Result<(), ConfigureError> {
    let config = match flag_config {
        None | Some(Value::Null) => return Ok(()),
        Some(value) => parse_flag_config(value)?,
    };
    configure_flags(env, &config, backend_id).await
}

/// Typed counterpart of [`configure`].
///
/// Everything that can fail before the reset is checked before any flag is
/// written, so an error here leaves `env` exactly as it was.
pub async fn configure_flags(
    env: &mut Environment,
    config: &FlagConfig,
    backend_id: &str,
) -> Result<(), ConfigureError> {
    validate_flags(config)?;
    let target = BackendId::parse(backend_id)?;
    if target.resets_backend() && !env.is_registered(&target.backend) {
        return Err(ConfigureError::BackendNotRegistered(target.backend));
    }

    env.set_flags(config);
    debug!("Applied {} flag(s) for {target}: {config:?}", config.len());

    if target.resets_backend() {
        let token = env.begin_reset(&target.backend)?;
        env.await_reset(token).await?;
        debug!("Reset {} backend", target.backend);
    }
    Ok(())
}
