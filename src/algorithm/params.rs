//! Algorithm parameters: required/default declarations composed along an
//! inheritance chain and resolved against the values given at bind time.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{SimError, SimResult};

// ── Params ────────────────────────────────────────────────────────────

/// Parameter values by name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Deserialize a parameter into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, algorithm: &str, name: &str) -> SimResult<T> {
        let value = self.0.get(name).ok_or_else(|| SimError::MissingParam {
            algorithm: algorithm.to_string(),
            param: name.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| SimError::InvalidParam {
            algorithm: algorithm.to_string(),
            param: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── ParamSpec ─────────────────────────────────────────────────────────

/// Which parameters an algorithm type needs and which have defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSpec {
    required: BTreeSet<String>,
    defaults: BTreeMap<String, Value>,
}

impl ParamSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: declare a required parameter.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    /// Builder: declare a parameter with a default value.
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// A single declaration may not list a name as both required and default.
    pub fn validate(&self) -> SimResult<()> {
        match self.required.iter().find(|name| self.defaults.contains_key(*name)) {
            Some(name) => Err(SimError::ParamConflict { param: name.clone() }),
            None => Ok(()),
        }
    }

    /// Compose `self` (the parent) with a child declaration.
    ///
    /// A child may override a parent's default value. It may not re-declare
    /// a parent's required parameter, turn a parent default into a
    /// requirement, or give a parent requirement a default.
    pub fn extend(self, child: ParamSpec) -> SimResult<ParamSpec> {
        self.validate()?;
        child.validate()?;
        if let Some(name) = child.required.intersection(&self.required).next() {
            return Err(SimError::DuplicateRequiredParam { param: name.clone() });
        }
        if let Some(name) = child.required.iter().find(|n| self.defaults.contains_key(*n)) {
            return Err(SimError::ParamConflict { param: name.clone() });
        }
        if let Some(name) = child.defaults.keys().find(|n| self.required.contains(*n)) {
            return Err(SimError::ParamConflict { param: name.clone() });
        }

        let mut merged = self;
        merged.required.extend(child.required);
        merged.defaults.extend(child.defaults);
        Ok(merged)
    }

    /// Fold a root-first chain of declarations.
    pub fn chain(specs: impl IntoIterator<Item = ParamSpec>) -> SimResult<ParamSpec> {
        specs
            .into_iter()
            .try_fold(ParamSpec::new(), |parent, child| parent.extend(child))
    }

    /// Check `supplied` against this declaration and fill in defaults.
    pub fn resolve(&self, algorithm: &str, supplied: &Params) -> SimResult<Params> {
        self.validate()?;
        if let Some(missing) = self.required.iter().find(|name| !supplied.contains(name)) {
            return Err(SimError::MissingParam {
                algorithm: algorithm.to_string(),
                param: missing.clone(),
            });
        }
        let mut resolved = supplied.clone();
        for (name, value) in &self.defaults {
            if !resolved.contains(name) {
                resolved.insert(name.clone(), value.clone());
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parent() -> ParamSpec {
        ParamSpec::new()
            .required("rp1")
            .required("rp2")
            .default_value("dp1", "x")
            .default_value("dp2", 2)
    }

    #[test]
    fn test_child_may_override_default() {
        let child = ParamSpec::new().required("rp3").default_value("dp1", "y");
        let merged = parent().extend(child).expect("override is allowed");
        assert_eq!(merged.defaults()["dp1"], json!("y"));
        assert_eq!(merged.required_names().count(), 3);
    }

    #[test]
    fn test_required_redeclared_is_rejected() {
        let child = ParamSpec::new().required("rp1");
        assert_eq!(
            parent().extend(child),
            Err(SimError::DuplicateRequiredParam { param: "rp1".into() })
        );
    }

    #[test]
    fn test_default_of_inherited_required_is_rejected() {
        let child = ParamSpec::new().default_value("rp1", 1);
        assert!(matches!(
            parent().extend(child),
            Err(SimError::ParamConflict { .. })
        ));
    }

    #[test]
    fn test_required_of_inherited_default_is_rejected() {
        let child = ParamSpec::new().required("dp2");
        assert!(matches!(
            parent().extend(child),
            Err(SimError::ParamConflict { .. })
        ));
    }

    #[test]
    fn test_chain_of_three() {
        let merged = ParamSpec::chain([
            parent(),
            ParamSpec::new().required("rp3"),
            ParamSpec::new().default_value("dp3", true),
        ])
        .unwrap();
        assert_eq!(merged.required_names().count(), 3);
        assert_eq!(merged.defaults().len(), 3);
    }

    #[test]
    fn test_resolve_fills_defaults_and_reports_missing() {
        let spec = parent();
        let mut supplied = Params::new();
        supplied.insert("rp1", 1);
        let err = spec.resolve("Demo", &supplied).unwrap_err();
        assert_eq!(
            err,
            SimError::MissingParam { algorithm: "Demo".into(), param: "rp2".into() }
        );

        supplied.insert("rp2", 2);
        supplied.insert("dp2", 20);
        let resolved = spec.resolve("Demo", &supplied).unwrap();
        assert_eq!(resolved.get("dp1"), Some(&json!("x")));
        assert_eq!(resolved.get("dp2"), Some(&json!(20)), "supplied value wins");
    }

    #[test]
    fn test_get_as_reports_wrong_type() {
        let mut params = Params::new();
        params.insert("count", "three");
        assert!(matches!(
            params.get_as::<u32>("Demo", "count"),
            Err(SimError::InvalidParam { .. })
        ));
        assert_eq!(params.get_as::<String>("Demo", "count").unwrap(), "three");
    }
}
