//! Recording policy: the required-field gate plus the field filter.

use serde_json::Value;

use crate::enums::RequiredField;
use crate::filter::FieldFilter;

/// Decides whether a mutation is recorded and what part of its delta is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingPolicy {
    pub filter: FieldFilter,
    pub required: Vec<RequiredField>,
}

impl RecordingPolicy {
    #[must_use]
    pub const fn new(filter: FieldFilter, required: Vec<RequiredField>) -> Self {
        Self { filter, required }
    }

    /// Check the gate. A missing required field means "skip recording",
    /// never an error.
    ///
    /// A field counts as absent when it is missing, JSON `null`, or an empty
    /// string.
    #[must_use]
    pub fn admits(&self, actor: Option<&Value>, reason: Option<&str>) -> bool {
        self.missing(actor, reason).is_none()
    }

    /// The first required field the context lacks, if any.
    #[must_use]
    pub fn missing(&self, actor: Option<&Value>, reason: Option<&str>) -> Option<RequiredField> {
        self.required.iter().copied().find(|field| match field {
            RequiredField::Actor => !actor.is_some_and(is_present),
            RequiredField::Reason => !reason.is_some_and(|r| !r.is_empty()),
        })
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn requiring(fields: &[RequiredField]) -> RecordingPolicy {
        RecordingPolicy::new(FieldFilter::none(), fields.to_vec())
    }

    #[test]
    fn no_requirements_admit_everything() {
        assert!(requiring(&[]).admits(None, None));
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some("ticket #42"), true)]
    fn reason_gate(#[case] reason: Option<&str>, #[case] admitted: bool) {
        assert_eq!(requiring(&[RequiredField::Reason]).admits(None, reason), admitted);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(json!(null)), false)]
    #[case(Some(json!("")), false)]
    #[case(Some(json!("alice")), true)]
    #[case(Some(json!({"id": 7, "role": "admin"})), true)]
    fn actor_gate(#[case] actor: Option<Value>, #[case] admitted: bool) {
        assert_eq!(
            requiring(&[RequiredField::Actor]).admits(actor.as_ref(), None),
            admitted
        );
    }

    #[test]
    fn reports_first_missing_field() {
        let policy = requiring(&[RequiredField::Actor, RequiredField::Reason]);
        assert_eq!(
            policy.missing(Some(&json!("bob")), None),
            Some(RequiredField::Reason)
        );
        assert_eq!(policy.missing(None, Some("why")), Some(RequiredField::Actor));
        assert_eq!(policy.missing(Some(&json!("bob")), Some("why")), None);
    }
}
