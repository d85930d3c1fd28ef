//! Deep merge of a structured template with a property overlay.

use serde_yaml::Value;

/// Merge `overlay` on top of `base`.
///
/// Mapping keys from `overlay` override `base` keys at every nesting level,
/// keeping `base` key order for keys that already exist. Sequences and
/// scalars are replaced wholesale, never concatenated.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => {
                        let existing = std::mem::replace(slot, Value::Null);
                        *slot = deep_merge(existing, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).expect("yaml fixture")
    }

    #[test]
    fn overlay_wins_and_arrays_are_replaced() {
        let template = yaml("spec:\n  replicas: 1\n  tags: [x]\n");
        let overlay = yaml("spec:\n  replicas: 3\n  tags: [y, z]\n");
        let merged = deep_merge(template, overlay);
        assert_eq!(merged, yaml("spec:\n  replicas: 3\n  tags: [y, z]\n"));
    }

    #[test]
    fn untouched_template_keys_survive_at_every_level() {
        let template = yaml(
            "metadata:\n  name: web\n  labels:\n    app: web\nspec:\n  replicas: 1\n",
        );
        let overlay = yaml("metadata:\n  labels:\n    tier: frontend\n");
        let merged = deep_merge(template, overlay);
        assert_eq!(
            merged,
            yaml(
                "metadata:\n  name: web\n  labels:\n    app: web\n    tier: frontend\nspec:\n  replicas: 1\n"
            )
        );
    }

    #[test]
    fn key_order_of_template_is_preserved() {
        let template = yaml("a: 1\nb: 2\nc: 3\n");
        let overlay = yaml("a: 10\nd: 4\n");
        let merged = deep_merge(template, overlay);
        let out = serde_yaml::to_string(&merged).unwrap();
        assert_eq!(out, "a: 10\nb: 2\nc: 3\nd: 4\n");
    }

    #[rstest]
    #[case("a: {b: 1}", "a: 5", "a: 5")]
    #[case("a: 5", "a: {b: 1}", "a: {b: 1}")]
    #[case("a: [1, 2]", "a: {b: 1}", "a: {b: 1}")]
    #[case("a: 1", "a: null", "a: null")]
    fn mismatched_shapes_take_the_overlay(
        #[case] base: &str,
        #[case] overlay: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(deep_merge(yaml(base), yaml(overlay)), yaml(expected));
    }
}
