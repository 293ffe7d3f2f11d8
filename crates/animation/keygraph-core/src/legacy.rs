//! Hierarchical keyframe store: categories own animation entries, entries own keyframes.
//!
//! Each level allocates its ids independently. Removing a parent drops all of
//! its descendants. Keyframe successors inside an entry follow the same rules
//! as the flat graph, and an entry can be flattened into a [`KeyframeGraph`]
//! with [`CategoryStore::import_animation`].

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::GraphError;
use crate::graph::{Keyframe, KeyframeGraph};
use crate::ids::{CategoryId, EntryId, IdAllocator, KeyframeId};
use crate::traverse::{traverse, KeyframeLinks, Traversal};
use keygraph_api_core::EaseCurve;

fn missing(err: GraphError) -> GraphError {
    log::warn!("{err}");
    err
}

/// Named group of keyframes with its own start node.
#[derive(Clone, Debug, Default)]
pub struct AnimationEntry {
    pub name: String,
    pub position: [f32; 2],
    pub start_frame_index: KeyframeId,
    keyframes: BTreeMap<KeyframeId, Keyframe>,
    ids: IdAllocator,
}

impl AnimationEntry {
    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.get(&id)
    }

    pub fn keyframes(&self) -> impl Iterator<Item = (KeyframeId, &Keyframe)> {
        self.keyframes.iter().map(|(id, kf)| (*id, kf))
    }

    /// Insert under a fixed id (document loading).
    pub(crate) fn insert_keyframe(&mut self, id: KeyframeId, keyframe: Keyframe) {
        self.ids.observe(id.0);
        self.keyframes.insert(id, keyframe);
    }
}

impl KeyframeLinks for AnimationEntry {
    fn contains(&self, id: KeyframeId) -> bool {
        self.keyframes.contains_key(&id)
    }

    fn next(&self, id: KeyframeId) -> KeyframeId {
        self.keyframes
            .get(&id)
            .map_or(KeyframeId::NONE, |k| k.next_keyframe)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Category {
    pub name: String,
    animations: BTreeMap<EntryId, AnimationEntry>,
    ids: IdAllocator,
}

impl Category {
    pub fn animation(&self, id: EntryId) -> Option<&AnimationEntry> {
        self.animations.get(&id)
    }

    pub fn animations(&self) -> impl Iterator<Item = (EntryId, &AnimationEntry)> {
        self.animations.iter().map(|(id, a)| (*id, a))
    }

    pub(crate) fn insert_animation(&mut self, id: EntryId, entry: AnimationEntry) {
        self.ids.observe(id.0);
        self.animations.insert(id, entry);
    }
}

macro_rules! entry_keyframe_field {
    ($get:ident, $set:ident, $field:ident, $ty:ty) => {
        pub fn $get(&self, category: CategoryId, animation: EntryId, id: KeyframeId) -> $ty {
            self.entry(category, animation)
                .and_then(|e| e.keyframes.get(&id))
                .map(|k| k.$field.clone())
                .unwrap_or_default()
        }

        pub fn $set(
            &mut self,
            category: CategoryId,
            animation: EntryId,
            id: KeyframeId,
            value: $ty,
        ) -> Result<(), GraphError> {
            let kf = self.keyframe_mut(category, animation, id)?;
            kf.$field = value;
            Ok(())
        }
    };
}

macro_rules! entry_field {
    ($get:ident, $set:ident, $field:ident, $ty:ty) => {
        pub fn $get(&self, category: CategoryId, animation: EntryId) -> $ty {
            self.entry(category, animation)
                .map(|e| e.$field.clone())
                .unwrap_or_default()
        }

        pub fn $set(
            &mut self,
            category: CategoryId,
            animation: EntryId,
            value: $ty,
        ) -> Result<(), GraphError> {
            self.entry_mut(category, animation)?.$field = value;
            Ok(())
        }
    };
}

#[derive(Clone, Debug, Default)]
pub struct CategoryStore {
    categories: BTreeMap<CategoryId, Category>,
    ids: IdAllocator,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- categories ----

    pub fn add_category(&mut self) -> Result<CategoryId, GraphError> {
        let max_live = self.categories.keys().next_back().map(|c| c.0);
        let id = self
            .ids
            .alloc(max_live)
            .map(CategoryId)
            .ok_or_else(|| missing(GraphError::IdsExhausted("category")))?;
        self.categories.insert(id, Category::default());
        Ok(id)
    }

    pub fn remove_category(&mut self, id: CategoryId) -> Result<Category, GraphError> {
        self.categories
            .remove(&id)
            .ok_or_else(|| missing(GraphError::CategoryNotFound(id)))
    }

    pub fn has_category(&self, id: CategoryId) -> bool {
        self.categories.contains_key(&id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn category_indices(&self) -> Vec<CategoryId> {
        self.categories.keys().copied().collect()
    }

    pub fn category_name(&self, id: CategoryId) -> String {
        self.categories
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    pub fn set_category_name(
        &mut self,
        id: CategoryId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.category_mut(id)?.name = name.into();
        Ok(())
    }

    fn category_mut(&mut self, id: CategoryId) -> Result<&mut Category, GraphError> {
        self.categories
            .get_mut(&id)
            .ok_or_else(|| missing(GraphError::CategoryNotFound(id)))
    }

    pub(crate) fn insert_category(&mut self, id: CategoryId, category: Category) {
        self.ids.observe(id.0);
        self.categories.insert(id, category);
    }

    // ---- animation entries ----

    pub fn add_animation(&mut self, category: CategoryId) -> Result<EntryId, GraphError> {
        let cat = self.category_mut(category)?;
        let max_live = cat.animations.keys().next_back().map(|a| a.0);
        let id = cat
            .ids
            .alloc(max_live)
            .map(EntryId)
            .ok_or_else(|| missing(GraphError::IdsExhausted("animation")))?;
        cat.animations.insert(id, AnimationEntry::default());
        Ok(id)
    }

    pub fn remove_animation(
        &mut self,
        category: CategoryId,
        animation: EntryId,
    ) -> Result<AnimationEntry, GraphError> {
        self.category_mut(category)?
            .animations
            .remove(&animation)
            .ok_or_else(|| {
                missing(GraphError::AnimationNotFound {
                    category,
                    animation,
                })
            })
    }

    pub fn has_animation(&self, category: CategoryId, animation: EntryId) -> bool {
        self.entry(category, animation).is_some()
    }

    /// Entry ids of `category`; empty when the category is missing.
    pub fn animation_indices(&self, category: CategoryId) -> Vec<EntryId> {
        self.categories
            .get(&category)
            .map(|c| c.animations.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn entry(&self, category: CategoryId, animation: EntryId) -> Option<&AnimationEntry> {
        self.categories.get(&category)?.animations.get(&animation)
    }

    fn entry_mut(
        &mut self,
        category: CategoryId,
        animation: EntryId,
    ) -> Result<&mut AnimationEntry, GraphError> {
        self.category_mut(category)?
            .animations
            .get_mut(&animation)
            .ok_or_else(|| {
                missing(GraphError::AnimationNotFound {
                    category,
                    animation,
                })
            })
    }

    entry_field!(animation_name, set_animation_name, name, String);
    entry_field!(animation_position, set_animation_position, position, [f32; 2]);
    entry_field!(
        animation_start_frame_index,
        set_animation_start_frame_index,
        start_frame_index,
        KeyframeId
    );

    // ---- keyframes ----

    pub fn add_keyframe(
        &mut self,
        category: CategoryId,
        animation: EntryId,
    ) -> Result<KeyframeId, GraphError> {
        let entry = self.entry_mut(category, animation)?;
        let max_live = entry.keyframes.keys().next_back().map(|k| k.0);
        let id = entry
            .ids
            .alloc(max_live)
            .map(KeyframeId)
            .ok_or_else(|| missing(GraphError::IdsExhausted("keyframe")))?;
        entry.keyframes.insert(id, Keyframe::default());
        Ok(id)
    }

    pub fn remove_keyframe(
        &mut self,
        category: CategoryId,
        animation: EntryId,
        id: KeyframeId,
    ) -> Result<Keyframe, GraphError> {
        self.entry_mut(category, animation)?
            .keyframes
            .remove(&id)
            .ok_or_else(|| missing(GraphError::KeyframeNotFound(id)))
    }

    pub fn has_keyframe(&self, category: CategoryId, animation: EntryId, id: KeyframeId) -> bool {
        self.entry(category, animation)
            .is_some_and(|e| e.keyframes.contains_key(&id))
    }

    pub fn keyframe_indices(&self, category: CategoryId, animation: EntryId) -> Vec<KeyframeId> {
        self.entry(category, animation)
            .map(|e| e.keyframes.keys().copied().collect())
            .unwrap_or_default()
    }

    fn keyframe_mut(
        &mut self,
        category: CategoryId,
        animation: EntryId,
        id: KeyframeId,
    ) -> Result<&mut Keyframe, GraphError> {
        self.entry_mut(category, animation)?
            .keyframes
            .get_mut(&id)
            .ok_or_else(|| missing(GraphError::KeyframeNotFound(id)))
    }

    entry_keyframe_field!(keyframe_name, set_keyframe_name, name, String);
    entry_keyframe_field!(
        keyframe_source_frame_index,
        set_keyframe_source_frame_index,
        source_frame_index,
        i32
    );
    entry_keyframe_field!(keyframe_next, set_keyframe_next, next_keyframe, KeyframeId);
    entry_keyframe_field!(keyframe_in_curve, set_keyframe_in_curve, curve, Option<EaseCurve>);
    entry_keyframe_field!(keyframe_position, set_keyframe_position, position, [f32; 2]);

    /// Walk an entry's chain from `start`.
    pub fn bake_from(
        &self,
        category: CategoryId,
        animation: EntryId,
        start: KeyframeId,
    ) -> Result<Traversal, GraphError> {
        let entry = self.entry(category, animation).ok_or_else(|| {
            missing(GraphError::AnimationNotFound {
                category,
                animation,
            })
        })?;
        Ok(traverse(entry, start, &entry.name))
    }

    /// Flatten one entry into a standalone graph. Keyframe ids, successors and
    /// the start node carry over unchanged.
    pub fn import_animation(
        &self,
        category: CategoryId,
        animation: EntryId,
        config: Config,
    ) -> Result<KeyframeGraph, GraphError> {
        let entry = self.entry(category, animation).ok_or_else(|| {
            missing(GraphError::AnimationNotFound {
                category,
                animation,
            })
        })?;
        let mut graph = KeyframeGraph::with_config(entry.name.clone(), config);
        for (id, kf) in entry.keyframes() {
            graph.insert_keyframe(id, kf.clone())?;
        }
        graph.set_start_frame_index(entry.start_frame_index);
        graph.set_start_node_position(entry.position);
        log::debug!(
            "imported '{}' ({} keyframes) from category {category}",
            entry.name,
            graph.len()
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_level_allocates_independently() {
        let mut store = CategoryStore::new();
        let c0 = store.add_category().unwrap();
        let c1 = store.add_category().unwrap();
        assert_eq!((c0, c1), (CategoryId(0), CategoryId(1)));
        let a0 = store.add_animation(c1).unwrap();
        assert_eq!(a0, EntryId(0));
        assert_eq!(store.add_keyframe(c1, a0).unwrap(), KeyframeId(0));
        assert_eq!(store.add_keyframe(c1, a0).unwrap(), KeyframeId(1));
        assert_eq!(store.add_animation(c0).unwrap(), EntryId(0));
    }

    #[test]
    fn removing_a_category_drops_descendants() {
        let mut store = CategoryStore::new();
        let c = store.add_category().unwrap();
        let a = store.add_animation(c).unwrap();
        let k = store.add_keyframe(c, a).unwrap();
        let removed = store.remove_category(c).unwrap();
        assert_eq!(removed.animations().count(), 1);
        assert!(!store.has_keyframe(c, a, k));
        assert!(store.animation_indices(c).is_empty());
        assert_eq!(store.add_category().unwrap(), CategoryId(1));
    }

    #[test]
    fn removing_an_animation_drops_its_keyframes() {
        let mut store = CategoryStore::new();
        let c = store.add_category().unwrap();
        let a = store.add_animation(c).unwrap();
        let keep = store.add_animation(c).unwrap();
        let k = store.add_keyframe(c, a).unwrap();
        store.add_keyframe(c, a).unwrap();
        store.add_keyframe(c, keep).unwrap();

        let removed = store.remove_animation(c, a).unwrap();
        assert_eq!(removed.keyframes().count(), 2);
        assert!(!store.has_animation(c, a));
        assert!(!store.has_keyframe(c, a, k));
        assert!(store.keyframe_indices(c, a).is_empty());
        assert_eq!(
            store.remove_animation(c, a).unwrap_err(),
            GraphError::AnimationNotFound {
                category: c,
                animation: a
            }
        );
        // siblings and the parent survive
        assert!(store.has_category(c));
        assert_eq!(store.keyframe_indices(c, keep), vec![KeyframeId(0)]);
    }

    #[test]
    fn missing_parents_are_reported_per_level() {
        let mut store = CategoryStore::new();
        assert_eq!(
            store.add_animation(CategoryId(3)),
            Err(GraphError::CategoryNotFound(CategoryId(3)))
        );
        let c = store.add_category().unwrap();
        assert_eq!(
            store.add_keyframe(c, EntryId(0)),
            Err(GraphError::AnimationNotFound {
                category: c,
                animation: EntryId(0)
            })
        );
        let a = store.add_animation(c).unwrap();
        assert_eq!(
            store.set_keyframe_name(c, a, KeyframeId(0), "x".into()),
            Err(GraphError::KeyframeNotFound(KeyframeId(0)))
        );
        assert_eq!(store.keyframe_name(c, a, KeyframeId(0)), "");
    }

    #[test]
    fn import_keeps_ids_and_links() {
        let mut store = CategoryStore::new();
        let c = store.add_category().unwrap();
        let a = store.add_animation(c).unwrap();
        store.set_animation_name(c, a, "run".into()).unwrap();
        let k0 = store.add_keyframe(c, a).unwrap();
        let k1 = store.add_keyframe(c, a).unwrap();
        store.set_keyframe_next(c, a, k0, k1).unwrap();
        store.set_keyframe_source_frame_index(c, a, k1, 4).unwrap();
        store.set_animation_start_frame_index(c, a, k0).unwrap();

        let walk = store.bake_from(c, a, k0).unwrap();
        assert_eq!(walk.visited, vec![k0, k1]);

        let mut graph = store.import_animation(c, a, Config::default()).unwrap();
        assert_eq!(graph.name(), "run");
        assert_eq!(graph.start_frame_index(), k0);
        assert_eq!(graph.keyframe_next(k0), k1);
        assert_eq!(graph.keyframe_source_frame_index(k1), 4);
        assert_eq!(graph.add_keyframe().unwrap(), KeyframeId(2));
    }
}
