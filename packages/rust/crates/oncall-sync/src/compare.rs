//! Order-independent comparison of member identifier lists.

/// Returns `true` when `a` and `b` hold the same multiset of identifiers, ignoring order
/// and ASCII case.
///
/// Used only to decide whether a group needs rewriting; empty inputs compare equal.
pub fn equal_as_sets(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    sorted_folded(a) == sorted_folded(b)
}

fn sorted_folded(values: &[String]) -> Vec<String> {
    let mut folded: Vec<String> = values.iter().map(|v| v.to_ascii_lowercase()).collect();
    folded.sort_unstable();
    folded
}

#[cfg(test)]
mod tests {
    use super::equal_as_sets;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn compares_as_multisets() {
        let cases: Vec<(Vec<String>, Vec<String>, bool)> = vec![
            (Vec::new(), Vec::new(), true),
            (ids(&["a", "b"]), ids(&["a", "b"]), true),
            (ids(&["a", "c"]), ids(&["a", "b"]), false),
            (ids(&["a", "b"]), ids(&["a", "b", "b"]), false),
            (ids(&["b", "a", "d", "c"]), ids(&["a", "b", "c", "d"]), true),
            (ids(&["foo", "bar", "baz"]), ids(&["bar", "baz", "foo"]), true),
            (ids(&["a", "a", "b"]), ids(&["a", "b", "b"]), false),
        ];

        for (index, (left, right, expected)) in cases.iter().enumerate() {
            assert_eq!(
                equal_as_sets(left, right),
                *expected,
                "case {index}: {left:?} vs {right:?}"
            );
            assert_eq!(
                equal_as_sets(right, left),
                *expected,
                "case {index} reversed: {right:?} vs {left:?}"
            );
        }
    }

    #[test]
    fn ignores_case() {
        assert!(equal_as_sets(
            &ids(&["U01ABC", "Alice@Example.com"]),
            &ids(&["alice@example.com", "u01abc"])
        ));
    }

    #[test]
    fn does_not_reorder_inputs() {
        let left = ids(&["b", "a"]);
        let right = ids(&["a", "b"]);
        assert!(equal_as_sets(&left, &right));
        assert_eq!(left, ids(&["b", "a"]));
    }
}
