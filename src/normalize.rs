// Wire-shape repair for quiz records
//
// The backend spells the schedule field `schadule` on some paths. This
// module is the single place that drift is repaired; everything past it
// only ever sees `schedule`. All functions are pure and total: unknown
// fields pass through untouched and nothing here can fail.
use serde_json::Value;

use crate::types::Quiz;

/// Copy `schadule` into `schedule` when the latter is absent. An explicit
/// `schedule` always wins. Idempotent.
pub fn normalize_quiz(raw: &Value) -> Value {
    let Some(obj) = raw.as_object() else {
        return raw.clone();
    };

    let mut out = obj.clone();
    if !out.contains_key("schedule") {
        if let Some(schadule) = out.get("schadule").cloned() {
            out.insert("schedule".to_string(), schadule);
        }
    }
    Value::Object(out)
}

/// Normalize every object element of an array payload, skipping anything
/// that is not an object. A non-array input yields an empty list.
pub fn normalize_quiz_array(raw: &Value) -> Vec<Value> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .map(normalize_quiz)
        .collect()
}

/// Repair then deserialize a single record. Merely missing fields fall back
/// to defaults; a record that is not an object yields `None`.
pub fn quiz_from_value(raw: &Value) -> Option<Quiz> {
    if !raw.is_object() {
        return None;
    }
    serde_json::from_value(normalize_quiz(raw)).ok()
}

/// Repair then deserialize an array payload
pub fn quizzes_from_value(raw: &Value) -> Vec<Quiz> {
    normalize_quiz_array(raw)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn copies_schadule_when_schedule_absent() {
        let raw = json!({ "_id": "q1", "schadule": "2025-01-01T10:00:00Z" });
        let fixed = normalize_quiz(&raw);
        assert_eq!(fixed["schedule"], "2025-01-01T10:00:00Z");
        // the original spelling stays; only the internal name is added
        assert_eq!(fixed["schadule"], "2025-01-01T10:00:00Z");
    }

    #[test]
    fn explicit_schedule_wins() {
        let raw = json!({
            "_id": "q1",
            "schedule": "2025-02-02T08:00:00Z",
            "schadule": "2025-01-01T10:00:00Z"
        });
        let fixed = normalize_quiz(&raw);
        assert_eq!(fixed["schedule"], "2025-02-02T08:00:00Z");
    }

    #[test]
    fn is_idempotent() {
        let raw = json!({ "_id": "q1", "schadule": "2025-01-01T10:00:00Z", "extra": [1, 2] });
        let once = normalize_quiz(&raw);
        let twice = normalize_quiz(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let raw = json!({ "_id": "q1", "somethingNew": { "nested": true } });
        let fixed = normalize_quiz(&raw);
        assert_eq!(fixed["somethingNew"], json!({ "nested": true }));
    }

    #[test]
    fn array_normalization_skips_non_objects() {
        let raw = json!([
            { "_id": "q1", "schadule": "2025-01-01T10:00:00Z" },
            "stray string",
            42,
            { "_id": "q2" }
        ]);
        let fixed = normalize_quiz_array(&raw);
        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed[0]["schedule"], "2025-01-01T10:00:00Z");
    }

    #[test]
    fn non_array_payload_yields_empty() {
        assert!(normalize_quiz_array(&json!({ "data": [] })).is_empty());
        assert!(normalize_quiz_array(&json!(null)).is_empty());
    }

    #[test]
    fn typed_conversion_carries_the_repaired_field() {
        let raw = json!([{ "_id": "q1", "schadule": "2025-01-01T10:00:00Z", "title": "Drift" }]);
        let quizzes = quizzes_from_value(&raw);
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].schedule.as_deref(), Some("2025-01-01T10:00:00Z"));
        assert_eq!(quizzes[0].title, "Drift");
    }

    #[test]
    fn single_record_conversion() {
        assert!(quiz_from_value(&json!("nope")).is_none());
        let quiz = quiz_from_value(&json!({ "_id": "q9" })).unwrap();
        assert_eq!(quiz.id, "q9");
    }
}
