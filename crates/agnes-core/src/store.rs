//! Rubric store - validated scenario catalog
//!
//! Catalogs are JSON arrays of [`Scenario`]. Every entry is checked at load
//! time so malformed data never reaches the scorer.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::scenario::{Role, Scenario};

const BUILTIN_CATALOG: &str = include_str!("../data/scenarios.json");

/// Errors from loading or querying the catalog
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to parse scenario catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid scenario '{id}': {reason}")]
    Invalid { id: String, reason: String },
    #[error("Duplicate scenario id: {0}")]
    DuplicateId(String),
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
    #[error("No scenarios available for role: {0}")]
    NoScenariosForRole(Role),
}

/// In-memory scenario catalog
#[derive(Debug, Clone, Default)]
pub struct RubricStore {
    scenarios: Vec<Arc<Scenario>>,
    index: HashMap<String, usize>,
}

impl RubricStore {
    /// Build a store, validating every scenario
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, StoreError> {
        let mut store = Self::default();
        for scenario in scenarios {
            scenario.check().map_err(|reason| StoreError::Invalid {
                id: scenario.id.clone(),
                reason,
            })?;
            if store.index.contains_key(&scenario.id) {
                return Err(StoreError::DuplicateId(scenario.id));
            }
            store
                .index
                .insert(scenario.id.clone(), store.scenarios.len());
            store.scenarios.push(Arc::new(scenario));
        }

        tracing::debug!(scenarios = store.scenarios.len(), "Rubric store loaded");
        Ok(store)
    }

    /// Parse a JSON array of scenarios
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let scenarios: Vec<Scenario> = serde_json::from_str(json)?;
        Self::new(scenarios)
    }

    /// The bundled training catalog
    pub fn builtin() -> Result<Self, StoreError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Scenarios for a role, in catalog order
    pub fn list_for_role(&self, role: Role) -> Result<Vec<Arc<Scenario>>, StoreError> {
        let scenarios: Vec<Arc<Scenario>> = self
            .scenarios
            .iter()
            .filter(|s| s.role == role)
            .cloned()
            .collect();

        if scenarios.is_empty() {
            return Err(StoreError::NoScenariosForRole(role));
        }
        Ok(scenarios)
    }

    /// Look up a scenario by id
    pub fn get(&self, id: &str) -> Result<Arc<Scenario>, StoreError> {
        self.index
            .get(id)
            .map(|&idx| self.scenarios[idx].clone())
            .ok_or_else(|| StoreError::ScenarioNotFound(id.to_string()))
    }

    /// All scenarios, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.iter()
    }

    /// Roles that have at least one scenario
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.scenarios.iter().any(|s| s.role == *r))
            .collect()
    }

    /// Number of scenarios in the catalog
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the catalog has no scenarios
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let store = RubricStore::builtin().unwrap();
        assert!(store.len() >= 8);
        assert_eq!(store.roles(), Role::ALL.to_vec());

        for scenario in store.iter() {
            assert!(!scenario.expected_key_points.is_empty(), "{}", scenario.id);
        }
    }

    #[test]
    fn test_lookup_by_id_and_role() {
        let store = RubricStore::builtin().unwrap();

        let scenario = store.get("m9-claim-fear").unwrap();
        assert_eq!(scenario.role, Role::Homeowner);

        let adjusters = store.list_for_role(Role::Adjuster).unwrap();
        assert!(adjusters.iter().all(|s| s.role == Role::Adjuster));
    }

    #[test]
    fn test_missing_id_is_distinct_error() {
        let store = RubricStore::builtin().unwrap();
        assert!(matches!(
            store.get("does-not-exist"),
            Err(StoreError::ScenarioNotFound(id)) if id == "does-not-exist"
        ));
    }

    #[test]
    fn test_empty_role_is_fatal() {
        let store = RubricStore::new(vec![Scenario::new(
            "only",
            Role::Homeowner,
            "Hello",
            &["hi"],
        )])
        .unwrap();

        assert!(matches!(
            store.list_for_role(Role::Adjuster),
            Err(StoreError::NoScenariosForRole(Role::Adjuster))
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_invalid_entries() {
        let a = Scenario::new("dup", Role::Homeowner, "Hello", &["hi"]);
        let result = RubricStore::new(vec![a.clone(), a]);
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == "dup"));

        let json = r#"[{"id":"x","role":"homeowner","prompt":"","expectedKeyPoints":["a"]}]"#;
        assert!(matches!(
            RubricStore::from_json(json),
            Err(StoreError::Invalid { id, .. }) if id == "x"
        ));
    }

    #[test]
    fn test_rejects_unknown_role_at_parse() {
        let json = r#"[{"id":"x","role":"landlord","prompt":"Hi","expectedKeyPoints":[]}]"#;
        assert!(matches!(
            RubricStore::from_json(json),
            Err(StoreError::Parse(_))
        ));
    }
}
