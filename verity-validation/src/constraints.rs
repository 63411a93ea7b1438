// Built-in constraints

use crate::{FieldType, SchemaError, SchemaResult};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
enum Rule {
    GreaterThan(f64),
    GreaterOrEqual(f64),
    LessThan(f64),
    LessOrEqual(f64),
    MultipleOf(f64),
    MinLength(usize),
    MaxLength(usize),
    NotEmpty,
    Pattern(Regex),
    OneOf(Vec<Value>),
    Custom {
        name: String,
        message: String,
        predicate: PredicateFn,
    },
}

/// A named predicate a coerced value must satisfy
///
/// Failure messages may be overridden with a template; `{value}` and
/// `{limit}` are substituted.
#[derive(Clone)]
pub struct Constraint {
    rule: Rule,
    message: Option<String>,
}

impl Constraint {
    fn from_rule(rule: Rule) -> Self {
        Self { rule, message: None }
    }

    /// value > limit
    pub fn greater_than(limit: impl Into<f64>) -> Self {
        Self::from_rule(Rule::GreaterThan(limit.into()))
    }

    /// value >= limit
    pub fn greater_or_equal(limit: impl Into<f64>) -> Self {
        Self::from_rule(Rule::GreaterOrEqual(limit.into()))
    }

    /// value < limit
    pub fn less_than(limit: impl Into<f64>) -> Self {
        Self::from_rule(Rule::LessThan(limit.into()))
    }

    /// value <= limit
    pub fn less_or_equal(limit: impl Into<f64>) -> Self {
        Self::from_rule(Rule::LessOrEqual(limit.into()))
    }

    /// value is a whole multiple of `step`
    pub fn multiple_of(step: impl Into<f64>) -> Self {
        Self::from_rule(Rule::MultipleOf(step.into()))
    }

    /// At least `min` characters or elements
    pub fn min_length(min: usize) -> Self {
        Self::from_rule(Rule::MinLength(min))
    }

    /// At most `max` characters or elements
    pub fn max_length(max: usize) -> Self {
        Self::from_rule(Rule::MaxLength(max))
    }

    /// Non-blank string or non-empty sequence
    pub fn not_empty() -> Self {
        Self::from_rule(Rule::NotEmpty)
    }

    /// String matches a regular expression
    pub fn pattern(pattern: &str) -> SchemaResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_rule(Rule::Pattern(regex)))
    }

    /// Value equals one of the allowed scalars
    pub fn one_of<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::from_rule(Rule::OneOf(allowed.into_iter().map(Into::into).collect()))
    }

    /// User predicate with its own name and failure message
    pub fn custom<F>(name: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::from_rule(Rule::Custom {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        })
    }

    /// Override the failure message template
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Stable constraint name
    pub fn name(&self) -> &str {
        match &self.rule {
            Rule::GreaterThan(_) => "greater_than",
            Rule::GreaterOrEqual(_) => "greater_or_equal",
            Rule::LessThan(_) => "less_than",
            Rule::LessOrEqual(_) => "less_or_equal",
            Rule::MultipleOf(_) => "multiple_of",
            Rule::MinLength(_) => "min_length",
            Rule::MaxLength(_) => "max_length",
            Rule::NotEmpty => "not_empty",
            Rule::Pattern(_) => "pattern",
            Rule::OneOf(_) => "one_of",
            Rule::Custom { name, .. } => name,
        }
    }

    /// Whether the constraint can observe values of the given type
    pub fn applies_to(&self, field_type: &FieldType) -> bool {
        match &self.rule {
            Rule::GreaterThan(_)
            | Rule::GreaterOrEqual(_)
            | Rule::LessThan(_)
            | Rule::LessOrEqual(_)
            | Rule::MultipleOf(_) => field_type.is_numeric(),
            Rule::MinLength(_) | Rule::MaxLength(_) | Rule::NotEmpty => {
                field_type.is_textual() || matches!(field_type, FieldType::Sequence(_))
            }
            Rule::Pattern(_) => field_type.is_textual(),
            Rule::OneOf(_) => field_type.is_scalar(),
            Rule::Custom { .. } => true,
        }
    }

    /// Reject limits that can never be satisfied meaningfully
    pub(crate) fn verify(&self) -> SchemaResult<()> {
        let invalid = |reason: &str| SchemaError::InvalidConstraint {
            constraint: self.name().to_string(),
            reason: reason.to_string(),
        };

        match &self.rule {
            Rule::GreaterThan(limit)
            | Rule::GreaterOrEqual(limit)
            | Rule::LessThan(limit)
            | Rule::LessOrEqual(limit)
                if !limit.is_finite() =>
            {
                Err(invalid("limit must be a finite number"))
            }
            Rule::MultipleOf(step) if !step.is_finite() || *step <= 0.0 => {
                Err(invalid("step must be a positive finite number"))
            }
            Rule::OneOf(allowed) if allowed.is_empty() => Err(invalid("allowed list is empty")),
            _ => Ok(()),
        }
    }

    /// Check a coerced value; `Some(message)` on failure
    pub fn check(&self, value: &Value) -> Option<String> {
        if self.passes(value) {
            None
        } else {
            Some(self.failure_message(value))
        }
    }

    fn passes(&self, value: &Value) -> bool {
        match &self.rule {
            Rule::GreaterThan(limit) => number(value).is_some_and(|v| v > *limit),
            Rule::GreaterOrEqual(limit) => number(value).is_some_and(|v| v >= *limit),
            Rule::LessThan(limit) => number(value).is_some_and(|v| v < *limit),
            Rule::LessOrEqual(limit) => number(value).is_some_and(|v| v <= *limit),
            Rule::MultipleOf(step) if !step.is_finite() || *step <= 0.0 => false,
            Rule::MultipleOf(step) => match (value.as_i64(), as_whole(*step)) {
                (Some(v), Some(step)) => v.checked_rem(step) == Some(0),
                _ => number(value).is_some_and(|v| {
                    let ratio = v / step;
                    (ratio - ratio.round()).abs() < 1e-9
                }),
            },
            Rule::MinLength(min) => length(value).is_some_and(|len| len >= *min),
            Rule::MaxLength(max) => length(value).is_some_and(|len| len <= *max),
            Rule::NotEmpty => match value {
                Value::String(s) => !s.trim().is_empty(),
                Value::Array(items) => !items.is_empty(),
                _ => false,
            },
            Rule::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Rule::OneOf(allowed) => allowed.iter().any(|candidate| same_value(candidate, value)),
            Rule::Custom { predicate, .. } => predicate(value),
        }
    }

    fn limit_text(&self) -> String {
        match &self.rule {
            Rule::GreaterThan(limit)
            | Rule::GreaterOrEqual(limit)
            | Rule::LessThan(limit)
            | Rule::LessOrEqual(limit)
            | Rule::MultipleOf(limit) => limit.to_string(),
            Rule::MinLength(n) | Rule::MaxLength(n) => n.to_string(),
            Rule::NotEmpty | Rule::Custom { .. } => String::new(),
            Rule::Pattern(regex) => regex.as_str().to_string(),
            Rule::OneOf(allowed) => allowed
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn failure_message(&self, value: &Value) -> String {
        let template = match (&self.message, &self.rule) {
            (Some(template), _) => template.clone(),
            (None, Rule::Custom { message, .. }) => message.clone(),
            (None, rule) => default_template(rule, value).to_string(),
        };

        template
            .replace("{value}", &display_value(value))
            .replace("{limit}", &self.limit_text())
    }
}

fn default_template(rule: &Rule, value: &Value) -> &'static str {
    let unit_is_items = value.is_array();
    match rule {
        Rule::GreaterThan(_) => "{value} should be greater than {limit}",
        Rule::GreaterOrEqual(_) => "{value} should be greater than or equal to {limit}",
        Rule::LessThan(_) => "{value} should be less than {limit}",
        Rule::LessOrEqual(_) => "{value} should be less than or equal to {limit}",
        Rule::MultipleOf(_) => "{value} should be a multiple of {limit}",
        Rule::MinLength(_) if unit_is_items => "should have at least {limit} items",
        Rule::MinLength(_) => "should have at least {limit} characters",
        Rule::MaxLength(_) if unit_is_items => "should have at most {limit} items",
        Rule::MaxLength(_) => "should have at most {limit} characters",
        Rule::NotEmpty => "should not be empty",
        Rule::Pattern(_) => "{value} should match pattern '{limit}'",
        Rule::OneOf(_) => "{value} should be one of [{limit}]",
        Rule::Custom { .. } => "{value} is invalid",
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name())
            .field("limit", &self.limit_text())
            .field("message", &self.message)
            .finish()
    }
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn as_whole(step: f64) -> Option<i64> {
    (step.fract() == 0.0 && step.abs() < i64::MAX as f64).then_some(step as i64)
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

// 30 and 30.0 are the same allowed value
fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Strings render bare, everything else as JSON
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_greater_than() {
        let constraint = Constraint::greater_than(0);
        assert_eq!(constraint.check(&json!(1)), None);
        assert_eq!(
            constraint.check(&json!(-1)),
            Some("-1 should be greater than 0".to_string())
        );
        assert!(constraint.check(&json!(0)).is_some());
    }

    #[test]
    fn test_message_template() {
        let constraint =
            Constraint::greater_than(0).with_message("{value} should be greater than zero");
        assert_eq!(
            constraint.check(&json!(-1)),
            Some("-1 should be greater than zero".to_string())
        );

        let constraint = Constraint::max_length(3).with_message("{value} exceeds {limit}");
        assert_eq!(constraint.check(&json!("abcd")), Some("abcd exceeds 3".to_string()));
    }

    #[test]
    fn test_bounds_inclusive_and_exclusive() {
        assert!(Constraint::greater_or_equal(10).check(&json!(10)).is_none());
        assert!(Constraint::less_than(10).check(&json!(10)).is_some());
        assert!(Constraint::less_or_equal(10.5).check(&json!(10.5)).is_none());
        assert!(Constraint::less_or_equal(10.5).check(&json!(11)).is_some());
    }

    #[test]
    fn test_multiple_of() {
        assert!(Constraint::multiple_of(5).check(&json!(25)).is_none());
        assert!(Constraint::multiple_of(5).check(&json!(26)).is_some());
        assert!(Constraint::multiple_of(0.5).check(&json!(2.5)).is_none());
        assert!(Constraint::multiple_of(0.5).check(&json!(2.3)).is_some());
    }

    #[test]
    fn test_multiple_of_unverified_step_never_panics() {
        assert!(Constraint::multiple_of(0).check(&json!(5)).is_some());
        assert!(Constraint::multiple_of(0).check(&json!(0)).is_some());
        assert!(Constraint::multiple_of(-1).check(&json!(i64::MIN)).is_some());
        assert!(Constraint::multiple_of(f64::NAN).check(&json!(4)).is_some());
        assert!(Constraint::multiple_of(3).check(&json!(i64::MIN)).is_some());
        assert!(Constraint::multiple_of(2).check(&json!(i64::MIN)).is_none());
    }

    #[test]
    fn test_lengths_count_chars_and_items() {
        let min = Constraint::min_length(3);
        assert!(min.check(&json!("héé")).is_none());
        assert!(min.check(&json!("hi")).is_some());
        assert_eq!(
            min.check(&json!([1])),
            Some("should have at least 3 items".to_string())
        );

        let max = Constraint::max_length(5);
        assert!(max.check(&json!("exact")).is_none());
        assert_eq!(
            max.check(&json!("sixsix")),
            Some("should have at most 5 characters".to_string())
        );
    }

    #[test]
    fn test_not_empty() {
        let constraint = Constraint::not_empty();
        assert!(constraint.check(&json!("test")).is_none());
        assert!(constraint.check(&json!("  \t")).is_some());
        assert!(constraint.check(&json!([])).is_some());
        assert!(constraint.check(&json!([0])).is_none());
    }

    #[test]
    fn test_pattern() {
        let constraint = Constraint::pattern(r"^\d{5}$").unwrap();
        assert!(constraint.check(&json!("12345")).is_none());
        assert_eq!(
            constraint.check(&json!("1234")),
            Some(r"1234 should match pattern '^\d{5}$'".to_string())
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Constraint::pattern("([a-z]").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_one_of() {
        let constraint = Constraint::one_of(["admin", "user"]);
        assert!(constraint.check(&json!("admin")).is_none());
        assert_eq!(
            constraint.check(&json!("root")),
            Some("root should be one of [admin, user]".to_string())
        );

        let numeric = Constraint::one_of([1, 2, 3]);
        assert!(numeric.check(&json!(2.0)).is_none());
    }

    #[test]
    fn test_custom() {
        let even = Constraint::custom("even", "{value} should be even", |v| {
            v.as_i64().is_some_and(|n| n % 2 == 0)
        });
        assert_eq!(even.name(), "even");
        assert!(even.check(&json!(4)).is_none());
        assert_eq!(even.check(&json!(3)), Some("3 should be even".to_string()));
    }

    #[test]
    fn test_applies_to() {
        assert!(Constraint::greater_than(0).applies_to(&FieldType::Float));
        assert!(!Constraint::greater_than(0).applies_to(&FieldType::String));
        assert!(Constraint::max_length(2).applies_to(&FieldType::sequence(FieldType::Integer)));
        assert!(!Constraint::max_length(2).applies_to(&FieldType::Integer));
        assert!(!Constraint::pattern("a").unwrap().applies_to(&FieldType::Boolean));
        assert!(Constraint::one_of([true]).applies_to(&FieldType::Boolean));
    }

    #[test]
    fn test_verify_rejects_degenerate_limits() {
        assert!(Constraint::multiple_of(0).verify().is_err());
        assert!(Constraint::greater_than(f64::NAN).verify().is_err());
        assert!(Constraint::one_of(Vec::<Value>::new()).verify().is_err());
        assert!(Constraint::greater_than(0).verify().is_ok());
    }
}
