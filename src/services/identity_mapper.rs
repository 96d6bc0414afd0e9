use std::collections::HashMap;

use crate::errors::{CoreError, CoreResult};
use crate::services::graph_consistency::EntityKind;

/// External (snapshot) id to row id, per entity kind, for one import call.
#[derive(Debug, Default)]
pub struct IdentityMapper {
    maps: HashMap<EntityKind, HashMap<String, i32>>,
}

impl IdentityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly inserted row. External ids are unique per kind.
    pub fn register(&mut self, kind: EntityKind, external_id: &str, internal_id: i32) -> CoreResult<()> {
        let map = self.maps.entry(kind).or_default();
        if map.contains_key(external_id) {
            return Err(CoreError::validation(format!(
                "Duplicate {} id '{}' in snapshot",
                kind, external_id
            ))
            .with_field("entity", kind.label())
            .with_field("id", external_id));
        }
        map.insert(external_id.to_string(), internal_id);
        Ok(())
    }

    pub fn lookup(&self, kind: EntityKind, external_id: &str) -> Option<i32> {
        self.maps.get(&kind)?.get(external_id).copied()
    }

    /// Resolves a reference held by `owner`; a miss is a dangling reference.
    pub fn resolve(&self, kind: EntityKind, external_id: &str, owner: &str) -> CoreResult<i32> {
        self.lookup(kind, external_id).ok_or_else(|| {
            CoreError::import(format!(
                "{} references unknown {} '{}'",
                owner, kind, external_id
            ))
            .with_field("entity", kind.label())
            .with_field("id", external_id)
        })
    }

    pub fn resolve_optional(
        &self,
        kind: EntityKind,
        external_id: Option<&str>,
        owner: &str,
    ) -> CoreResult<Option<i32>> {
        match external_id {
            Some(id) => self.resolve(kind, id, owner).map(Some),
            None => Ok(None),
        }
    }

    pub fn resolve_all<S: AsRef<str>>(
        &self,
        kind: EntityKind,
        external_ids: &[S],
        owner: &str,
    ) -> CoreResult<Vec<i32>> {
        external_ids
            .iter()
            .map(|id| self.resolve(kind, id.as_ref(), owner))
            .collect()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.maps.get(&kind).map(HashMap::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn kinds_are_independent() {
        let mut mapper = IdentityMapper::new();
        mapper.register(EntityKind::Researcher, "1", 10).unwrap();
        mapper.register(EntityKind::Lab, "1", 20).unwrap();

        assert_eq!(mapper.lookup(EntityKind::Researcher, "1"), Some(10));
        assert_eq!(mapper.lookup(EntityKind::Lab, "1"), Some(20));
        assert_eq!(mapper.lookup(EntityKind::Grant, "1"), None);
        assert_eq!(mapper.count(EntityKind::Researcher), 1);
    }

    #[test]
    fn duplicate_registration_is_a_validation_error() {
        let mut mapper = IdentityMapper::new();
        mapper.register(EntityKind::Project, "p1", 1).unwrap();
        let err = mapper.register(EntityKind::Project, "p1", 2).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }

    #[test]
    fn dangling_reference_is_an_import_error() {
        let mut mapper = IdentityMapper::new();
        mapper.register(EntityKind::Researcher, "r1", 1).unwrap();

        let ids = vec!["r1".to_string(), "r9".to_string()];
        let err = mapper
            .resolve_all(EntityKind::Researcher, &ids, "Grant 'g1'")
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Import);
        assert!(err.message().contains("r9"));
        assert_eq!(
            mapper
                .resolve_optional(EntityKind::Researcher, None, "Lab 'l1'")
                .unwrap(),
            None
        );
    }
}
