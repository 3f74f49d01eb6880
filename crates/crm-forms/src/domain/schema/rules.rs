//! Per-field validation rules
//!
//! One tagged variant per rule kind. A rule either returns the value to
//! keep for the field or a human-readable reason.

use regex::Regex;
use tracing::warn;

use crate::domain::value_objects::{EmailAddress, FieldConstraints, FieldDescriptor, FieldType, FieldValue};

pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const INVALID_NUMBER: &str = "Please enter a valid number";
pub const INVALID_OPTION: &str = "Please select a valid option";

#[derive(Clone, Debug)]
pub enum FieldRule {
    Text(TextRule),
    Email(TextRule),
    Number(NumberRule),
    Choice(ChoiceRule),
    MultiChoice(ChoiceRule),
    Boolean,
}

/// Shared by text, textarea and email fields
#[derive(Clone, Debug, Default)]
pub struct TextRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NumberRule {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ChoiceRule {
    pub required: bool,
    pub values: Vec<String>,
}

impl FieldRule {
    /// Derive the rule for a well-formed descriptor
    pub fn for_descriptor(descriptor: &FieldDescriptor) -> Self {
        let constraints = descriptor.constraints.clone().unwrap_or_default();
        match descriptor.field_type {
            FieldType::Text | FieldType::Textarea => {
                Self::Text(TextRule::build(&descriptor.id, descriptor.required, constraints))
            }
            FieldType::Email => Self::Email(TextRule::build(&descriptor.id, descriptor.required, constraints)),
            FieldType::Number => Self::Number(NumberRule {
                required: descriptor.required,
                min: constraints.min,
                max: constraints.max,
                message: constraints.message,
            }),
            FieldType::Select | FieldType::Radio => {
                let rule = ChoiceRule {
                    required: descriptor.required,
                    values: descriptor.option_values().map(str::to_string).collect(),
                };
                if descriptor.multiple {
                    Self::MultiChoice(rule)
                } else {
                    Self::Choice(rule)
                }
            }
            FieldType::Checkbox => Self::Boolean,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Email(_) => "email",
            Self::Number(_) => "number",
            Self::Choice(_) => "choice",
            Self::MultiChoice(_) => "multi_choice",
            Self::Boolean => "boolean",
        }
    }

    /// Check one candidate value. `None` means the key was absent and is
    /// treated as the field's zero value.
    pub fn check(&self, label: &str, value: Option<&FieldValue>) -> Result<FieldValue, String> {
        match self {
            Self::Text(rule) => {
                let text = expect_text(label, value)?;
                if text.trim().is_empty() {
                    return blank(rule.required, label, text);
                }
                rule.check_constraints(&text)?;
                Ok(FieldValue::Text(text))
            }
            Self::Email(rule) => {
                let text = expect_text(label, value)?;
                if text.trim().is_empty() {
                    return blank(rule.required, label, text);
                }
                if !EmailAddress::is_valid(&text) {
                    return Err(INVALID_EMAIL.to_string());
                }
                rule.check_constraints(&text)?;
                Ok(FieldValue::Text(text))
            }
            Self::Number(rule) => {
                let text = expect_text(label, value)?;
                if text.trim().is_empty() {
                    return blank(rule.required, label, text);
                }
                let number = parse_number(&text).ok_or_else(|| INVALID_NUMBER.to_string())?;
                rule.check_range(number)?;
                Ok(FieldValue::Text(text))
            }
            Self::Choice(rule) => {
                let text = expect_text(label, value)?;
                if text.is_empty() {
                    return blank(rule.required, label, text);
                }
                if !rule.values.iter().any(|v| *v == text) {
                    return Err(INVALID_OPTION.to_string());
                }
                Ok(FieldValue::Text(text))
            }
            Self::MultiChoice(rule) => {
                let selected = match value {
                    None => vec![],
                    Some(FieldValue::List(items)) => items.clone(),
                    Some(_) => return Err(mismatch(label)),
                };
                if selected.is_empty() && rule.required {
                    return Err(required(label));
                }
                if selected.iter().any(|s| !rule.values.contains(s)) {
                    return Err(INVALID_OPTION.to_string());
                }
                Ok(FieldValue::List(selected))
            }
            // false is a valid answer, so required never blocks a checkbox
            Self::Boolean => match value {
                None => Ok(FieldValue::Bool(false)),
                Some(FieldValue::Bool(b)) => Ok(FieldValue::Bool(*b)),
                Some(_) => Err(mismatch(label)),
            },
        }
    }
}

impl TextRule {
    fn build(field_id: &str, required: bool, constraints: FieldConstraints) -> Self {
        let pattern = constraints.pattern.as_deref().and_then(|p| {
            Regex::new(&format!("^(?:{p})$"))
                .map_err(|e| warn!(field_id, pattern = p, error = %e, "dropping uncompilable pattern"))
                .ok()
        });
        Self {
            required,
            min_length: constraints.min_length,
            max_length: constraints.max_length,
            pattern,
            message: constraints.message,
        }
    }

    fn check_constraints(&self, text: &str) -> Result<(), String> {
        let length = text.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Err(self.failure(format!("Must be at least {min} characters")));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(self.failure(format!("Must be at most {max} characters")));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Err(self.failure("Value has an invalid format".to_string()));
            }
        }
        Ok(())
    }

    fn failure(&self, default: String) -> String {
        self.message.clone().unwrap_or(default)
    }
}

impl NumberRule {
    fn check_range(&self, number: f64) -> Result<(), String> {
        if let Some(min) = self.min {
            if number < min {
                return Err(self.message.clone().unwrap_or_else(|| format!("Must be at least {min}")));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(self.message.clone().unwrap_or_else(|| format!("Must be at most {max}")));
            }
        }
        Ok(())
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn expect_text(label: &str, value: Option<&FieldValue>) -> Result<String, String> {
    match value {
        None => Ok(String::new()),
        Some(FieldValue::Text(s)) => Ok(s.clone()),
        Some(_) => Err(mismatch(label)),
    }
}

fn blank(is_required: bool, label: &str, text: String) -> Result<FieldValue, String> {
    if is_required {
        Err(required(label))
    } else {
        Ok(FieldValue::Text(text))
    }
}

fn required(label: &str) -> String {
    format!("{label} is required")
}

fn mismatch(label: &str) -> String {
    format!("{label} has an unexpected value type")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_rule(required: bool) -> FieldRule {
        FieldRule::Text(TextRule { required, ..Default::default() })
    }

    #[test]
    fn test_text_required_rejects_whitespace() {
        let rule = text_rule(true);
        assert_eq!(rule.check("Name", Some(&FieldValue::text("  "))), Err("Name is required".into()));
        assert_eq!(rule.check("Name", None), Err("Name is required".into()));
        assert_eq!(rule.check("Name", Some(&FieldValue::text(" Ada "))), Ok(FieldValue::text(" Ada ")));
    }

    #[test]
    fn test_optional_text_accepts_empty() {
        assert_eq!(text_rule(false).check("Notes", None), Ok(FieldValue::text("")));
    }

    #[test]
    fn test_type_mismatch() {
        let err = text_rule(false).check("Notes", Some(&FieldValue::Bool(true))).unwrap_err();
        assert_eq!(err, "Notes has an unexpected value type");
    }

    #[test]
    fn test_number_keeps_text() {
        let rule = FieldRule::Number(NumberRule { required: true, min: Some(1.0), ..Default::default() });
        assert_eq!(rule.check("Seats", Some(&FieldValue::text("12.5"))), Ok(FieldValue::text("12.5")));
        assert_eq!(rule.check("Seats", Some(&FieldValue::text("twelve"))), Err(INVALID_NUMBER.into()));
        assert_eq!(rule.check("Seats", Some(&FieldValue::text("NaN"))), Err(INVALID_NUMBER.into()));
        assert_eq!(rule.check("Seats", Some(&FieldValue::text("0"))), Err("Must be at least 1".into()));
    }

    #[test]
    fn test_length_and_pattern_with_custom_message() {
        let descriptor = FieldDescriptor::new("zip", FieldType::Text, "Zip").with_constraints(FieldConstraints {
            max_length: Some(5),
            pattern: Some("[0-9]+".into()),
            message: Some("Enter a 5 digit zip".into()),
            ..Default::default()
        });
        let rule = FieldRule::for_descriptor(&descriptor);
        assert!(rule.check("Zip", Some(&FieldValue::text("12345"))).is_ok());
        assert_eq!(rule.check("Zip", Some(&FieldValue::text("123456"))), Err("Enter a 5 digit zip".into()));
        assert_eq!(rule.check("Zip", Some(&FieldValue::text("12a45"))), Err("Enter a 5 digit zip".into()));
    }

    #[test]
    fn test_bad_pattern_is_dropped() {
        let descriptor = FieldDescriptor::new("code", FieldType::Text, "Code").with_constraints(FieldConstraints {
            pattern: Some("([".into()),
            ..Default::default()
        });
        match FieldRule::for_descriptor(&descriptor) {
            FieldRule::Text(rule) => assert!(rule.pattern.is_none()),
            other => panic!("unexpected rule {}", other.kind()),
        }
    }

    #[test]
    fn test_checkbox_false_is_valid() {
        assert_eq!(FieldRule::Boolean.check("Subscribe", Some(&FieldValue::Bool(false))), Ok(FieldValue::Bool(false)));
        assert_eq!(FieldRule::Boolean.check("Subscribe", None), Ok(FieldValue::Bool(false)));
        assert!(FieldRule::Boolean.check("Subscribe", Some(&FieldValue::text("yes"))).is_err());
    }

    #[test]
    fn test_multi_choice() {
        let rule = FieldRule::MultiChoice(ChoiceRule { required: true, values: vec!["a".into(), "b".into()] });
        assert!(rule.check("Topics", Some(&FieldValue::List(vec!["a".into(), "b".into()]))).is_ok());
        assert_eq!(rule.check("Topics", Some(&FieldValue::List(vec![]))), Err("Topics is required".into()));
        assert_eq!(rule.check("Topics", Some(&FieldValue::List(vec!["c".into()]))), Err(INVALID_OPTION.into()));
        assert!(rule.check("Topics", Some(&FieldValue::text("a"))).is_err());
    }
}
