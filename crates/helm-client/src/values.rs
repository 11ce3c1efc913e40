//! Value overlay merging

use serde_json::{Map, Value};

/// Deep-merges `overrides` onto `defaults`, left to right.
///
/// - objects merge key by key, recursively
/// - arrays concatenate (earlier items first)
/// - any other later value replaces the earlier one, except `null`, which
///   keeps the earlier value
pub fn mergeconcat<I>(defaults: Value, overrides: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    overrides.into_iter().fold(defaults, merge_pair)
}

fn merge_pair(defaults: Value, overrides: Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(mut merged), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let value = match merged.remove(&key) {
                    Some(existing) => merge_pair(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (Value::Array(mut merged), Value::Array(overrides)) => {
            merged.extend(overrides);
            Value::Array(merged)
        }
        (defaults, Value::Null) => defaults,
        (_, overrides) => overrides,
    }
}

/// Merges overlays onto an empty object, as the installer does.
pub fn merge_overlays(overlays: &[Value]) -> Value {
    mergeconcat(Value::Object(Map::new()), overlays.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lists_concatenate() {
        let merged = mergeconcat(json!({"a": [1]}), [json!({"a": [2]})]);
        assert_eq!(merged, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_later_scalar_wins() {
        let merged = mergeconcat(json!({"a": 1}), [json!({"a": 2})]);
        assert_eq!(merged, json!({"a": 2}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let base = json!({
            "clusterNetworking": {"internalNetwork": {"nodeCidr": "10.0.0.0/24"}},
            "addons": {"monitoring": {"enabled": false}}
        });
        let overlay = json!({
            "clusterNetworking": {"dnsNameservers": ["8.8.8.8"]},
            "addons": {"monitoring": {"enabled": true}}
        });
        assert_eq!(
            mergeconcat(base, [overlay]),
            json!({
                "clusterNetworking": {
                    "internalNetwork": {"nodeCidr": "10.0.0.0/24"},
                    "dnsNameservers": ["8.8.8.8"]
                },
                "addons": {"monitoring": {"enabled": true}}
            })
        );
    }

    #[test]
    fn test_null_keeps_earlier_value() {
        let merged = mergeconcat(json!({"a": 1, "b": {"c": 2}}), [json!({"a": null, "b": null, "d": null})]);
        assert_eq!(merged, json!({"a": 1, "b": {"c": 2}, "d": null}));
    }

    #[test]
    fn test_type_mismatch_takes_later_value() {
        assert_eq!(mergeconcat(json!({"a": [1]}), [json!({"a": "x"})]), json!({"a": "x"}));
        assert_eq!(mergeconcat(json!({"a": {"b": 1}}), [json!({"a": [1]})]), json!({"a": [1]}));
    }

    #[test]
    fn test_left_to_right_fold_is_associative() {
        let a = json!({"list": [1], "x": 1, "nested": {"list": ["a"]}});
        let b = json!({"list": [2], "y": 2, "nested": {"list": ["b"], "k": 1}});
        let c = json!({"list": [3], "x": 3, "nested": {"k": 2}});

        let all_at_once = mergeconcat(a.clone(), [b.clone(), c.clone()]);
        let left_first = mergeconcat(mergeconcat(a.clone(), [b.clone()]), [c.clone()]);
        let right_first = mergeconcat(a, [mergeconcat(b, [c])]);

        assert_eq!(all_at_once, left_first);
        assert_eq!(all_at_once, right_first);
        assert_eq!(
            all_at_once,
            json!({"list": [1, 2, 3], "x": 3, "y": 2, "nested": {"list": ["a", "b"], "k": 2}})
        );
    }

    #[test]
    fn test_merge_overlays_starts_empty() {
        assert_eq!(merge_overlays(&[]), json!({}));
        assert_eq!(merge_overlays(&[json!({"a": 1}), json!({"b": [1]})]), json!({"a": 1, "b": [1]}));
    }
}
