use super::EntitySchema;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("required field '{0}' is missing or empty")]
    MissingField(String),

    #[error("content must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Shallow presence check of the schema's `required` list.
///
/// A field fails when it is absent, `null`, or the empty string. Nested shapes and
/// value types are not inspected.
pub fn validate_content(content: &JsonValue, schema: &EntitySchema) -> Result<(), ValidationFailure> {
    let required = schema.required_fields();
    if required.is_empty() {
        return Ok(());
    }

    let Some(object) = content.as_object() else {
        return Err(ValidationFailure::NotAnObject(json_kind(content)));
    };

    for field in required {
        let present = match object.get(field) {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::String(text)) => !text.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ValidationFailure::MissingField(field.to_string()));
        }
    }

    Ok(())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> EntitySchema {
        EntitySchema::from_required("project_task", 1, &["title", "project_id"])
    }

    #[test]
    fn accepts_content_with_all_required_fields() {
        let content = json!({"title": "Ship it", "project_id": "p1", "extra": null});
        assert_eq!(validate_content(&content, &schema()), Ok(()));
    }

    #[test]
    fn rejects_missing_null_and_empty_fields() {
        let missing = json!({"title": "Ship it"});
        assert_eq!(
            validate_content(&missing, &schema()),
            Err(ValidationFailure::MissingField("project_id".into()))
        );

        let null = json!({"title": null, "project_id": "p1"});
        assert_eq!(
            validate_content(&null, &schema()),
            Err(ValidationFailure::MissingField("title".into()))
        );

        let empty = json!({"title": "", "project_id": "p1"});
        assert!(validate_content(&empty, &schema()).is_err());
    }

    #[test]
    fn zero_and_false_count_as_present() {
        let schema = EntitySchema::from_required("vote_submission", 1, &["choice_index", "anonymous"]);
        let content = json!({"choice_index": 0, "anonymous": false});
        assert_eq!(validate_content(&content, &schema), Ok(()));
    }

    #[test]
    fn non_objects_fail_only_when_something_is_required() {
        assert_eq!(
            validate_content(&json!([1, 2]), &schema()),
            Err(ValidationFailure::NotAnObject("array"))
        );

        let lenient = EntitySchema::from_required("note", 1, &[]);
        assert_eq!(validate_content(&json!("free text"), &lenient), Ok(()));
    }
}
