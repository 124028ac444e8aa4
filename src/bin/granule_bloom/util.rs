use anyhow::{anyhow, Result};

use granule_bloom::Value;

/// Convert a JSON scalar into an index value.
pub fn json_to_value(v: &serde_json::Value) -> Result<Value> {
    match v {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::UInt(*b as u64)),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Value::UInt(u))
            } else if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(anyhow!("unsupported number {}", n))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        other => Err(anyhow!("expected a scalar, got {}", other)),
    }
}

/// Parse a --value argument: JSON scalar if it parses, plain string otherwise.
pub fn parse_value_arg(arg: &str) -> Result<Value> {
    match serde_json::from_str::<serde_json::Value>(arg) {
        Ok(v) => json_to_value(&v),
        Err(_) => Ok(Value::Str(arg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_args() {
        assert_eq!(parse_value_arg("42").unwrap(), Value::UInt(42));
        assert_eq!(parse_value_arg("-3").unwrap(), Value::Int(-3));
        assert_eq!(parse_value_arg("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse_value_arg("\"x\"").unwrap(), Value::Str("x".into()));
        assert_eq!(parse_value_arg("plain").unwrap(), Value::Str("plain".into()));
        assert!(parse_value_arg("[1]").is_err());
    }
}
