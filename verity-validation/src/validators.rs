// Post-validators

use serde_json::Value;

/// User-supplied check that runs after every constraint passed
///
/// A post-validator may transform the value it receives; the next one in the
/// chain observes the transformed value. Returning `Err(message)` stops the
/// chain for that field.
pub trait PostValidator: Send + Sync {
    /// Name reported alongside failures
    fn name(&self) -> &str;

    /// Accept (possibly transformed) or reject the value
    fn apply(&self, value: Value) -> Result<Value, String>;
}

/// Post-validator backed by a closure
pub struct FnValidator<F> {
    name: String,
    func: F,
}

impl<F> FnValidator<F>
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> PostValidator for FnValidator<F>
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, value: Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

/// Strips surrounding whitespace from strings
pub struct Trim;

impl PostValidator for Trim {
    fn name(&self) -> &str {
        "trim"
    }

    fn apply(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            other => Ok(other),
        }
    }
}

/// Lowercases strings
pub struct Lowercase;

impl PostValidator for Lowercase {
    fn name(&self) -> &str {
        "lowercase"
    }

    fn apply(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fn_validator() {
        let validator = FnValidator::new("no_spaces", |value: Value| {
            if value.as_str().is_some_and(|s| s.contains(' ')) {
                Err("must not contain spaces".to_string())
            } else {
                Ok(value)
            }
        });

        assert_eq!(validator.name(), "no_spaces");
        assert_eq!(validator.apply(json!("john")), Ok(json!("john")));
        assert_eq!(
            validator.apply(json!("john doe")),
            Err("must not contain spaces".to_string())
        );
    }

    #[test]
    fn test_transformers() {
        assert_eq!(Trim.apply(json!("  padded ")), Ok(json!("padded")));
        assert_eq!(Lowercase.apply(json!("MiXeD")), Ok(json!("mixed")));
        assert_eq!(Trim.apply(json!(3)), Ok(json!(3)));
    }
}
