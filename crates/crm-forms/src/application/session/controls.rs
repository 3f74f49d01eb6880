//! Control rendering
//!
//! Maps each synthesized field to the widget a client should draw.

use crate::application::dto::{ControlKind, ControlView};
use crate::domain::schema::{FieldError, SchemaField, ValidationSchema};
use crate::domain::value_objects::{FieldType, Payload};

pub fn control_kind(field: &SchemaField) -> ControlKind {
    let descriptor = &field.descriptor;
    match descriptor.field_type {
        FieldType::Text => ControlKind::TextInput,
        FieldType::Email => ControlKind::EmailInput,
        FieldType::Number => ControlKind::NumberInput,
        FieldType::Textarea => ControlKind::TextArea,
        FieldType::Select => ControlKind::Select {
            options: descriptor.options.clone(),
            multiple: descriptor.multiple,
        },
        FieldType::Radio => ControlKind::RadioGroup { options: descriptor.options.clone() },
        FieldType::Checkbox => ControlKind::Checkbox,
    }
}

/// Render every field with its current value and inline error.
/// Fields missing from `values` show their zero value.
pub fn render(schema: &ValidationSchema, values: &Payload, errors: &[FieldError]) -> Vec<ControlView> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let descriptor = &field.descriptor;
            ControlView {
                field_id: descriptor.id.clone(),
                label: descriptor.label.clone(),
                control: control_kind(field),
                // checkbox required is never enforced, so it is not advertised either
                required: descriptor.required && descriptor.field_type != FieldType::Checkbox,
                placeholder: descriptor.placeholder.clone(),
                help_text: descriptor.help_text.clone(),
                value: values
                    .get(&descriptor.id)
                    .cloned()
                    .unwrap_or_else(|| descriptor.zero_value()),
                error: errors
                    .iter()
                    .find(|e| e.field_id == descriptor.id)
                    .map(|e| e.message.clone()),
            }
        })
        .collect()
}
