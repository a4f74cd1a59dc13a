//! Field-name normalization
//!
//! Records come out of the store with snake_case field names and leave the
//! listing with camelCase ones. Only top-level keys are rewritten; nested
//! objects are passed through untouched.

use crate::types::Document;
use std::borrow::Cow;

/// Shape of a field name, which decides how it is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyShape<'a> {
    /// No underscore at all: returned unchanged
    Plain(&'a str),
    /// Leading underscore(s), e.g. `_id`: prefix dropped, first word lowercased
    Internal(&'a str),
    /// Underscore-separated words, e.g. `first_name`
    Compound(&'a str),
}

impl<'a> KeyShape<'a> {
    fn classify(key: &'a str) -> Self {
        if !key.contains('_') {
            KeyShape::Plain(key)
        } else if key.starts_with('_') {
            KeyShape::Internal(key.trim_start_matches('_'))
        } else {
            KeyShape::Compound(key)
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn join_words(first: &str, rest: std::str::Split<'_, char>) -> String {
    let mut out = String::from(first);
    for word in rest {
        out.push_str(&capitalize(word));
    }
    out
}

/// Rewrite one snake_case field name to camelCase
///
/// Every leading underscore is dropped and the first word is lowercased, so
/// `_id` and `__id` both become `id` (never `Id`). Names without an
/// underscore, and names made only of underscores, come back unchanged.
pub fn to_camel_case(key: &str) -> Cow<'_, str> {
    match KeyShape::classify(key) {
        KeyShape::Plain(name) => Cow::Borrowed(name),
        KeyShape::Internal("") => Cow::Borrowed(key),
        KeyShape::Internal(stripped) => {
            let mut words = stripped.split('_');
            let first = words.next().unwrap_or_default().to_lowercase();
            Cow::Owned(join_words(&first, words))
        }
        KeyShape::Compound(name) => {
            let mut words = name.split('_');
            let first = words.next().unwrap_or_default();
            Cow::Owned(join_words(first, words))
        }
    }
}

/// Rewrite every top-level field name of `document` to camelCase
///
/// Values are moved over unchanged. If two names collapse to the same
/// camelCase name the one iterated last wins.
pub fn normalize_keys(document: Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (to_camel_case(&key).into_owned(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::compound("first_name", "firstName")]
    #[case::three_words("available_balance_total", "availableBalanceTotal")]
    #[case::internal_id("_id", "id")]
    #[case::internal_compound("_created_at", "createdAt")]
    #[case::internal_capitalized("_Id", "id")]
    #[case::double_leading("__id", "id")]
    #[case::plain("name", "name")]
    #[case::plain_camel("pageSize", "pageSize")]
    #[case::trailing("name_", "name")]
    #[case::doubled_separator("payment__date", "paymentDate")]
    #[case::mixed_case_word("user_TYPE", "userType")]
    #[case::digits("tier_2_rate", "tier2Rate")]
    #[case::only_underscores("__", "__")]
    #[case::empty("", "")]
    fn test_to_camel_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_camel_case(input), expected);
    }

    #[test]
    fn test_plain_key_is_borrowed() {
        assert!(matches!(to_camel_case("status"), Cow::Borrowed("status")));
    }

    #[test]
    fn test_normalize_keys_rewrites_top_level_only() {
        let doc = json!({
            "_id": "65f1a2b3c4d5e6f708192a3b",
            "user_type": "affiliate",
            "status": "pending",
            "bank_details": {"account_number": "123"}
        })
        .as_object()
        .cloned()
        .unwrap();

        let normalized = normalize_keys(doc);

        assert_eq!(
            serde_json::Value::Object(normalized),
            json!({
                "id": "65f1a2b3c4d5e6f708192a3b",
                "userType": "affiliate",
                "status": "pending",
                "bankDetails": {"account_number": "123"}
            })
        );
    }

    #[test]
    fn test_normalize_keys_preserves_values() {
        let doc = json!({"amount_due": 125, "is_paid": false, "notes": null})
            .as_object()
            .cloned()
            .unwrap();

        let normalized = normalize_keys(doc);

        assert_eq!(normalized.get("amountDue"), Some(&json!(125)));
        assert_eq!(normalized.get("isPaid"), Some(&json!(false)));
        assert_eq!(normalized.get("notes"), Some(&json!(null)));
    }
}
