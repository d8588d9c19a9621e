//! Intersection directory.
//!
//! An explicitly constructed and explicitly owned concurrent mapping from
//! intersection id to intersection. There is no ambient global registry; the
//! controller holds the instance it was built with.

use super::error::ControlError;
use crate::intersection::Intersection;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent id -> intersection directory.
#[derive(Default)]
pub struct IntersectionRegistry {
    intersections: RwLock<HashMap<String, Arc<Intersection>>>,
}

impl IntersectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intersection.
    ///
    /// Fails if an intersection with the same id is already registered.
    pub fn register(&self, intersection: Arc<Intersection>) -> Result<(), ControlError> {
        let mut intersections = self.intersections.write();
        let id = intersection.id().to_string();
        if intersections.contains_key(&id) {
            return Err(ControlError::DuplicateIntersection { id });
        }
        intersections.insert(id, intersection);
        Ok(())
    }

    /// Look up an intersection by id.
    pub fn get(&self, id: &str) -> Option<Arc<Intersection>> {
        self.intersections.read().get(id).cloned()
    }

    /// Remove an intersection. Returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.intersections.write().remove(id).is_some()
    }

    /// All registered intersections.
    pub fn all(&self) -> Vec<Arc<Intersection>> {
        self.intersections.read().values().cloned().collect()
    }

    /// Whether an intersection with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.intersections.read().contains_key(id)
    }

    /// Number of registered intersections.
    pub fn len(&self) -> usize {
        self.intersections.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.intersections.read().is_empty()
    }

    /// Remove all registered intersections.
    pub fn clear(&self) {
        self.intersections.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::IntersectionBuilder;

    fn intersection(id: &str) -> Arc<Intersection> {
        Arc::new(
            IntersectionBuilder::new()
                .id(id)
                .standard_four_way()
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn register_and_get() {
        let registry = IntersectionRegistry::new();
        registry.register(intersection("r1")).unwrap();

        assert!(registry.contains("r1"));
        assert_eq!(registry.get("r1").unwrap().id(), "r1");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = IntersectionRegistry::new();
        registry.register(intersection("r2")).unwrap();

        let err = registry.register(intersection("r2")).unwrap_err();
        assert_eq!(
            err,
            ControlError::DuplicateIntersection {
                id: "r2".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let registry = IntersectionRegistry::new();
        registry.register(intersection("r3")).unwrap();

        assert!(registry.remove("r3"));
        assert!(!registry.remove("r3"));
        assert!(registry.is_empty());
    }

    #[test]
    fn all_returns_every_registered_intersection() {
        let registry = IntersectionRegistry::new();
        registry.register(intersection("a")).unwrap();
        registry.register(intersection("b")).unwrap();

        let mut ids: Vec<String> = registry
            .all()
            .iter()
            .map(|intersection| intersection.id().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
