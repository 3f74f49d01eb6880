//! Field Descriptor model
//!
//! Authoring-time definition of one form input. Descriptors arrive as
//! untyped JSON from the form builder; [`FieldDescriptor::from_value`] is
//! the only way in and reports authoring defects instead of panicking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::value::FieldValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
}

impl FieldType {
    /// Parse the authoring tag; `None` for anything outside the closed set
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(Self::Text),
            "email" => Some(Self::Email),
            "number" => Some(Self::Number),
            "textarea" => Some(Self::Textarea),
            "select" => Some(Self::Select),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }
}

/// Optional constraints layered on top of the base rule of a field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regex the whole value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Replaces the default message of a failed constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(rename = "validation", skip_serializing_if = "Option::is_none")]
    pub constraints: Option<FieldConstraints>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            required: false,
            options: vec![],
            multiple: false,
            placeholder: None,
            help_text: None,
            constraints: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn with_options<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.options = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                FieldOption::new(v.clone(), v)
            })
            .collect();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Parse one authored field definition.
    pub fn from_value(raw: &Value) -> Result<Self, DescriptorDefect> {
        let object = raw.as_object().ok_or(DescriptorDefect::NotAnObject)?;

        let id = match object.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            _ => return Err(DescriptorDefect::MissingId),
        };

        let field_type = match object.get("type").and_then(Value::as_str) {
            Some(tag) => FieldType::from_tag(tag).unwrap_or_else(|| {
                debug!(field_id = %id, field_type = tag, "unrecognised field type, using text handling");
                FieldType::Text
            }),
            None => FieldType::Text,
        };

        let options = if field_type.has_options() {
            parse_options(&id, object.get("options"))?
        } else {
            vec![]
        };

        let constraints = match object.get("validation") {
            None | Some(Value::Null) => None,
            Some(v) => match serde_json::from_value::<FieldConstraints>(v.clone()) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(field_id = %id, error = %e, "ignoring malformed validation block");
                    None
                }
            },
        };

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        let descriptor = Self {
            label: text("label").unwrap_or_else(|| id.clone()),
            required: object.get("required").and_then(Value::as_bool).unwrap_or(false),
            multiple: field_type == FieldType::Select
                && object.get("multiple").and_then(Value::as_bool).unwrap_or(false),
            placeholder: text("placeholder"),
            help_text: text("helpText"),
            id,
            field_type,
            options,
            constraints,
        };
        descriptor.verify()?;
        Ok(descriptor)
    }

    /// Check the per-field invariants. Uniqueness of ids across a form is
    /// checked by the schema synthesizer.
    pub fn verify(&self) -> Result<(), DescriptorDefect> {
        if self.id.trim().is_empty() {
            return Err(DescriptorDefect::MissingId);
        }
        if self.field_type.has_options() {
            if self.options.is_empty() {
                return Err(DescriptorDefect::MissingOptions { field_id: self.id.clone() });
            }
            let mut seen = HashSet::new();
            for option in &self.options {
                if !seen.insert(option.value.as_str()) {
                    return Err(DescriptorDefect::DuplicateOption {
                        field_id: self.id.clone(),
                        value: option.value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Value a freshly rendered control starts with
    pub fn zero_value(&self) -> FieldValue {
        match self.field_type {
            FieldType::Checkbox => FieldValue::Bool(false),
            FieldType::Select if self.multiple => FieldValue::List(vec![]),
            _ => FieldValue::Text(String::new()),
        }
    }

    pub fn option_values(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.value.as_str())
    }
}

fn parse_options(field_id: &str, raw: Option<&Value>) -> Result<Vec<FieldOption>, DescriptorDefect> {
    let items = match raw {
        Some(Value::Array(items)) => items,
        _ => return Err(DescriptorDefect::MissingOptions { field_id: field_id.to_string() }),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => Ok(FieldOption::new(s.clone(), s.clone())),
            Value::Object(o) => {
                let value = o.get("value").and_then(Value::as_str).ok_or_else(|| {
                    DescriptorDefect::MalformedOption { field_id: field_id.to_string(), index }
                })?;
                let label = o.get("label").and_then(Value::as_str).unwrap_or(value);
                Ok(FieldOption::new(value, label))
            }
            _ => Err(DescriptorDefect::MalformedOption { field_id: field_id.to_string(), index }),
        })
        .collect()
}

/// Authoring defect that excludes a field from the synthesized schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorDefect {
    #[error("field definition is not an object")]
    NotAnObject,
    #[error("field definition has no id")]
    MissingId,
    #[error("duplicate field id '{0}'")]
    DuplicateId(String),
    #[error("field '{field_id}' needs at least one option")]
    MissingOptions { field_id: String },
    #[error("field '{field_id}' has a malformed option at position {index}")]
    MalformedOption { field_id: String, index: usize },
    #[error("field '{field_id}' repeats option value '{value}'")]
    DuplicateOption { field_id: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_descriptor() {
        let raw = json!({
            "id": "plan",
            "type": "select",
            "label": "Plan",
            "required": true,
            "options": [{"value": "free", "label": "Free"}, {"value": "pro", "label": "Pro"}],
            "placeholder": "Pick one",
            "helpText": "You can change later"
        });
        let field = FieldDescriptor::from_value(&raw).unwrap();
        assert_eq!(field.field_type, FieldType::Select);
        assert!(field.required);
        assert_eq!(field.option_values().collect::<Vec<_>>(), vec!["free", "pro"]);
        assert_eq!(field.help_text.as_deref(), Some("You can change later"));
        assert_eq!(field.zero_value(), FieldValue::text(""));
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let field = FieldDescriptor::from_value(&json!({"id": "dob", "type": "date"})).unwrap();
        assert_eq!(field.field_type, FieldType::Text);
        assert_eq!(field.label, "dob");
    }

    #[test]
    fn test_defects() {
        assert_eq!(FieldDescriptor::from_value(&json!("email")), Err(DescriptorDefect::NotAnObject));
        assert_eq!(FieldDescriptor::from_value(&json!({"type": "text"})), Err(DescriptorDefect::MissingId));
        assert_eq!(FieldDescriptor::from_value(&json!({"id": "  "})), Err(DescriptorDefect::MissingId));
        assert!(matches!(
            FieldDescriptor::from_value(&json!({"id": "r", "type": "radio", "options": []})),
            Err(DescriptorDefect::MissingOptions { .. })
        ));
        assert!(matches!(
            FieldDescriptor::from_value(&json!({"id": "r", "type": "radio", "options": ["a", "a"]})),
            Err(DescriptorDefect::DuplicateOption { .. })
        ));
        assert!(matches!(
            FieldDescriptor::from_value(&json!({"id": "r", "type": "radio", "options": [1]})),
            Err(DescriptorDefect::MalformedOption { index: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_validation_block_is_dropped() {
        let field =
            FieldDescriptor::from_value(&json!({"id": "name", "validation": {"minLength": "three"}})).unwrap();
        assert!(field.constraints.is_none());
    }

    #[test]
    fn test_multiple_only_applies_to_select() {
        let select = FieldDescriptor::from_value(&json!({
            "id": "topics", "type": "select", "multiple": true, "options": ["a", "b"]
        }))
        .unwrap();
        assert!(select.multiple);
        assert_eq!(select.zero_value(), FieldValue::List(vec![]));

        let radio = FieldDescriptor::from_value(&json!({
            "id": "size", "type": "radio", "multiple": true, "options": ["s", "m"]
        }))
        .unwrap();
        assert!(!radio.multiple);
    }

    #[test]
    fn test_serialized_shape_parses_back() {
        let field = FieldDescriptor::new("email", FieldType::Email, "Email")
            .required()
            .with_placeholder("you@example.com");
        let raw = serde_json::to_value(&field).unwrap();
        assert_eq!(raw["type"], json!("email"));
        assert_eq!(FieldDescriptor::from_value(&raw).unwrap(), field);
    }
}
