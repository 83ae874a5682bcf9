//! JSON merge patch (RFC 7386).

use serde_json::Value;

/// Apply `patch` to `target` in place. `null` removes a key; objects merge
/// recursively; anything else, lists included, replaces the target.
pub fn apply_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                apply_merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rfc_examples() {
        let cases = [
            (json!({"a": "b"}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "b"}), json!({"b": "c"}), json!({"a": "b", "b": "c"})),
            (json!({"a": "b"}), json!({"a": null}), json!({})),
            (json!({"a": ["b"]}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "c"}), json!({"a": ["b"]}), json!({"a": ["b"]})),
            (
                json!({"a": {"b": "c"}}),
                json!({"a": {"b": "d", "c": null}}),
                json!({"a": {"b": "d"}}),
            ),
            (json!(["a", "b"]), json!({"a": "b"}), json!({"a": "b"})),
            (json!({"e": null}), json!({"a": 1}), json!({"e": null, "a": 1})),
        ];
        for (mut target, patch, expected) in cases {
            apply_merge_patch(&mut target, &patch);
            assert_eq!(target, expected, "patch {}", patch);
        }
    }

    #[test]
    fn test_lists_are_replaced_wholesale() {
        let mut workflow = json!({
            "status": {
                "phase": "Running",
                "conditions": [
                    {"type": "Suspended", "status": "True"},
                    {"type": "PodRunning", "status": "True"}
                ]
            }
        });
        apply_merge_patch(
            &mut workflow,
            &json!({"status": {"conditions": [{"type": "PodRunning", "status": "True"}]}}),
        );
        assert_eq!(workflow["status"]["phase"], "Running");
        assert_eq!(workflow["status"]["conditions"].as_array().unwrap().len(), 1);
    }
}
