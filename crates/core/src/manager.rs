//! Ownership of the mutable source list.
//!
//! The manager is the only mutable shared state in the core. Evaluators never
//! hold a reference into it; they take a [`snapshot`](SourceManager::snapshot)
//! so a batch of traces cannot observe a half-applied edit.

use std::sync::Arc;

use crate::bounds::Bounds;
use crate::field_source::{SingularitySource, SourceKind, SourcePatch};
use crate::prng::Xorshift64;

/// Insertion-ordered collection of [`SingularitySource`]s with unique ids.
///
/// Ids are decimal strings from a monotonic counter starting at `"1"`. They
/// are never reused for the lifetime of the manager, not even after
/// [`clear`](SourceManager::clear).
#[derive(Debug, Clone)]
pub struct SourceManager {
    sources: Vec<SingularitySource>,
    next_id: u64,
    bounds: Bounds,
    rng: Xorshift64,
}

impl SourceManager {
    /// Creates an empty manager. New sources are placed at random inside
    /// `bounds`, drawn from a PRNG seeded with `seed`.
    pub fn new(bounds: Bounds, seed: u64) -> Self {
        Self {
            sources: Vec::new(),
            next_id: 1,
            bounds,
            rng: Xorshift64::new(seed),
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    /// Adds a source of `kind` at a random in-bounds position with default
    /// strength, returning its id.
    pub fn add(&mut self, kind: SourceKind) -> String {
        let id = self.allocate_id();
        let p = self.rng.next_point(&self.bounds);
        self.sources
            .push(SingularitySource::new(id.clone(), kind, p.x, p.y));
        log::debug!("added {} source {id} at ({:.1}, {:.1})", kind.name(), p.x, p.y);
        id
    }

    /// Adds a fully specified source (e.g. loaded from a scene file).
    ///
    /// Whatever id it carried is replaced with a fresh one, which is returned.
    /// An empty name is replaced with the kind's default label.
    pub fn add_source(&mut self, mut source: SingularitySource) -> String {
        let id = self.allocate_id();
        source.id.clone_from(&id);
        if source.name.is_empty() {
            source.name = format!("{} {id}", source.kind.label());
        }
        source.sanitize();
        self.sources.push(source);
        id
    }

    /// Removes the source with `id`. Returns false if no such source exists.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.sources.iter().position(|s| s.id == id) {
            Some(idx) => {
                self.sources.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Applies `patch` to the source with `id`. Returns false if no such source exists.
    pub fn update(&mut self, id: &str, patch: &SourcePatch) -> bool {
        match self.sources.iter_mut().find(|s| s.id == id) {
            Some(source) => {
                patch.apply_to(source);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&SingularitySource> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// All sources in insertion order.
    pub fn list(&self) -> &[SingularitySource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Removes every source. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Copies the current list into a shareable, immutable snapshot.
    pub fn snapshot(&self) -> Arc<[SingularitySource]> {
        Arc::from(self.sources.as_slice())
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Changes where future [`add`](SourceManager::add) calls place sources.
    /// Existing sources keep their positions.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn manager() -> SourceManager {
        SourceManager::new(Bounds::from_size(800.0, 600.0).unwrap(), 42)
    }

    #[test]
    fn first_ids_follow_the_counter() {
        let mut m = manager();
        let first = m.add(SourceKind::Vortex);
        let second = m.add(SourceKind::Source);
        assert_eq!(first, "1");
        assert_ne!(first, second);
        assert!(m.remove("1"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.list()[0].id, second);
        assert_eq!(m.list()[0].kind, SourceKind::Source);
    }

    #[test]
    fn add_grows_list_with_unique_id() {
        let mut m = manager();
        let mut seen = HashSet::new();
        for (i, kind) in SourceKind::ALL.iter().cycle().take(40).enumerate() {
            let id = m.add(*kind);
            assert!(seen.insert(id.clone()), "duplicate id {id}");
            assert_eq!(m.len(), i + 1);
        }
    }

    #[test]
    fn added_sources_land_inside_bounds_with_defaults() {
        let mut m = manager();
        for kind in SourceKind::ALL {
            let id = m.add(kind);
            let s = m.get(&id).unwrap();
            assert!(m.bounds().contains(s.position()), "{id} placed at {}", s.position());
            assert_eq!(s.strength, kind.default_strength());
            assert_eq!(s.name, format!("{} {id}", kind.label()));
        }
    }

    #[test]
    fn remove_shrinks_list_and_unknown_is_noop() {
        let mut m = manager();
        let a = m.add(SourceKind::Vortex);
        m.add(SourceKind::Sink);
        assert!(m.remove(&a));
        assert_eq!(m.len(), 1);
        let before = m.list().to_vec();
        assert!(!m.remove("999"));
        assert!(!m.remove(&a), "second remove of the same id must be a no-op");
        assert_eq!(m.list(), before.as_slice());
    }

    #[test]
    fn update_patches_known_and_rejects_unknown() {
        let mut m = manager();
        let id = m.add(SourceKind::Uniform);
        let patch = SourcePatch {
            strength: Some(4.0),
            angle: Some(450.0),
            name: Some("wind".into()),
            ..Default::default()
        };
        assert!(m.update(&id, &patch));
        let s = m.get(&id).unwrap();
        assert_eq!(s.strength, 4.0);
        assert_eq!(s.angle, 90.0);
        assert_eq!(s.name, "wind");
        assert!(!m.update("nope", &patch));
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut m = manager();
        let ids: Vec<String> = SourceKind::ALL.iter().map(|k| m.add(*k)).collect();
        m.remove(&ids[1]);
        let listed: Vec<&str> = m.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(listed, vec![ids[0].as_str(), ids[2].as_str(), ids[3].as_str()]);
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut m = manager();
        m.add(SourceKind::Vortex);
        m.add(SourceKind::Vortex);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.add(SourceKind::Sink), "3");
    }

    #[test]
    fn add_source_reassigns_id_and_fills_name() {
        let mut m = manager();
        let loaded = SingularitySource {
            id: "stale".into(),
            name: String::new(),
            kind: SourceKind::Sink,
            x: 10.0,
            y: 20.0,
            strength: -5.0,
            angle: -90.0,
        };
        let id = m.add_source(loaded);
        let s = m.get(&id).unwrap();
        assert_eq!(id, "1");
        assert_eq!(s.name, "Sink 1");
        assert_eq!(s.angle, 270.0);
        assert!(m.get("stale").is_none());
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut m = manager();
        let id = m.add(SourceKind::Vortex);
        let snap = m.snapshot();
        m.update(
            &id,
            &SourcePatch {
                strength: Some(-1.0),
                ..Default::default()
            },
        );
        m.add(SourceKind::Source);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].strength, 50.0);
    }

    #[test]
    fn same_seed_places_sources_identically() {
        let mut a = manager();
        let mut b = manager();
        for kind in SourceKind::ALL {
            a.add(kind);
            b.add(kind);
        }
        assert_eq!(a.list(), b.list());
    }
}
