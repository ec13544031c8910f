//! Typed description of a partial update.
//!
//! Collaborators describe an update as "set these dotted paths, unset those"
//! instead of handing over a raw update query. The recorder diffs the
//! top-level fields the update touches, taken whole from the current
//! document, against the same fields with the update applied. Untouched
//! fields never show up in the record, and nested paths are written into the
//! real containers (arrays stay arrays, scalars are replaced).

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldUpdate {
    /// Dotted path -> new value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, Value>,
    /// Dotted paths to remove.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unset: BTreeSet<String>,
}

impl FieldUpdate {
    #[must_use]
    pub fn builder() -> FieldUpdateBuilder {
        FieldUpdateBuilder::new()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Every path the update touches.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.set.keys().chain(self.unset.iter()).map(String::as_str)
    }

    /// Check that every path is well formed and no path is both set and unset.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` describing the first bad path.
    pub fn validate(&self) -> Result<(), CoreError> {
        for p in self.paths() {
            path::parse(p)?;
        }
        if let Some(p) = self.unset.iter().find(|p| self.set.contains_key(*p)) {
            return Err(CoreError::Validation(format!(
                "path '{p}' is both set and unset"
            )));
        }
        Ok(())
    }

    /// Top-level fields the update touches, in the order they first appear.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        let mut seen = BTreeSet::new();
        self.paths()
            .filter_map(|p| p.split('.').next())
            .filter(move |field| seen.insert(*field))
    }

    /// The top-level fields of `current` that the update touches, copied whole.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the update is invalid.
    pub fn before(&self, current: &Value) -> Result<Value, CoreError> {
        self.validate()?;
        let projection = self
            .fields()
            .filter_map(|field| Some((field.to_string(), current.get(field)?.clone())))
            .collect::<Map<String, Value>>();
        Ok(Value::Object(projection))
    }

    /// The projection returned by [`before`](Self::before) with the update applied.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the update is invalid.
    pub fn after(&self, current: &Value) -> Result<Value, CoreError> {
        let mut projection = self.before(current)?;
        self.write(&mut projection);
        Ok(projection)
    }

    /// Apply the update to a whole document in place.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the update is invalid.
    pub fn apply_to(&self, document: &mut Value) -> Result<(), CoreError> {
        self.validate()?;
        self.write(document);
        Ok(())
    }

    fn write(&self, target: &mut Value) {
        for (p, value) in &self.set {
            let segments: Vec<&str> = p.split('.').collect();
            path::set(target, &segments, value.clone());
        }
        for p in &self.unset {
            let segments: Vec<&str> = p.split('.').collect();
            path::remove(target, &segments);
        }
    }
}

pub struct FieldUpdateBuilder(FieldUpdate);

impl FieldUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(FieldUpdate::default())
    }

    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.set.insert(path.into(), value.into());
        self
    }

    #[must_use]
    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.0.unset.insert(path.into());
        self
    }

    #[must_use]
    pub fn build(self) -> FieldUpdate {
        self.0
    }
}

impl Default for FieldUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn current() -> Value {
        json!({
            "title": "Ship it",
            "status": "open",
            "meta": {"priority": 2, "owner": "ann"},
            "tmp": true
        })
    }

    #[test]
    fn before_projects_touched_top_level_fields() {
        let update = FieldUpdate::builder()
            .set("status", "closed")
            .set("meta.priority", 1)
            .unset("tmp")
            .build();
        assert_eq!(
            update.before(&current()).unwrap(),
            json!({"status": "open", "meta": {"priority": 2, "owner": "ann"}, "tmp": true})
        );
        assert_eq!(
            update.after(&current()).unwrap(),
            json!({"status": "closed", "meta": {"priority": 1, "owner": "ann"}})
        );
    }

    #[test]
    fn index_paths_keep_arrays_as_arrays() {
        let doc = json!({"tags": ["a", "b", "c"], "title": "x"});
        let update = FieldUpdate::builder().set("tags.1", "z").build();
        assert_eq!(update.before(&doc).unwrap(), json!({"tags": ["a", "b", "c"]}));
        assert_eq!(update.after(&doc).unwrap(), json!({"tags": ["a", "z", "c"]}));

        let update = FieldUpdate::builder().unset("tags.0").build();
        assert_eq!(update.after(&doc).unwrap(), json!({"tags": ["b", "c"]}));
    }

    #[test]
    fn nested_set_over_a_scalar_keeps_the_old_scalar_before() {
        let doc = json!({"meta": 5});
        let update = FieldUpdate::builder().set("meta.owner", "bob").build();
        assert_eq!(update.before(&doc).unwrap(), json!({"meta": 5}));
        assert_eq!(update.after(&doc).unwrap(), json!({"meta": {"owner": "bob"}}));
    }

    #[test]
    fn fields_are_deduplicated() {
        let update = FieldUpdate::builder()
            .set("meta.owner", "bob")
            .set("meta.priority", 1)
            .unset("meta.tmp")
            .build();
        assert_eq!(update.fields().collect::<Vec<_>>(), vec!["meta"]);
    }

    #[test]
    fn setting_a_new_field_projects_nothing_before() {
        let update = FieldUpdate::builder().set("labels", json!(["x"])).build();
        assert_eq!(update.before(&current()).unwrap(), json!({}));
        assert_eq!(update.after(&current()).unwrap(), json!({"labels": ["x"]}));
    }

    #[test]
    fn apply_to_changes_whole_document() {
        let mut doc = current();
        FieldUpdate::builder()
            .set("meta.owner", "bob")
            .unset("tmp")
            .build()
            .apply_to(&mut doc)
            .unwrap();
        assert_eq!(
            doc,
            json!({"title": "Ship it", "status": "open", "meta": {"priority": 2, "owner": "bob"}})
        );
    }

    #[test]
    fn conflicting_paths_are_rejected() {
        let update = FieldUpdate::builder().set("a", 1).unset("a").build();
        assert!(matches!(update.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let update = FieldUpdate::builder().set("a..b", 1).build();
        assert!(matches!(
            update.before(&current()),
            Err(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn deserializes_from_partial_json() {
        let update: FieldUpdate = serde_json::from_str(r#"{"set": {"a.b": 1}}"#).unwrap();
        assert!(update.unset.is_empty());
        assert_eq!(update.paths().collect::<Vec<_>>(), vec!["a.b"]);
    }
}
