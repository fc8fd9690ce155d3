use anyhow::{bail, Context};
use serde_json::{Map, Value};

/// Merges `--flags-json` and repeated `--flag NAME=VALUE` arguments into one
/// JSON object. Returns `None` when neither was given so configuration is skipped.
///
/// Values are parsed as JSON, so `true`, `2` and `0.25` keep their types and
/// anything else stays a string for the configurator to reject.
pub(crate) fn collect(flags: &[String], json: Option<&str>) -> anyhow::Result<Option<Value>> {
    if flags.is_empty() && json.is_none() {
        return Ok(None);
    }
    let mut merged = match json {
        Some(raw) => match serde_json::from_str(raw).context("Invalid --flags-json")? {
            Value::Object(map) => map,
            // the configurator reports the wrong type
            other if flags.is_empty() => return Ok(Some(other)),
            _ => bail!("--flags-json must be a JSON object"),
        },
        None => Map::new(),
    };
    for flag in flags {
        let Some((name, value)) = flag.split_once('=') else {
            bail!("Expected NAME=VALUE, found {flag:?}");
        };
        let value = value.trim();
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        merged.insert(name.trim().to_owned(), value);
    }
    Ok(Some(Value::Object(merged)))
}
