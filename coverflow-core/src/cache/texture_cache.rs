//! Resident GPU textures keyed by item index
//!
//! The cache stores opaque handles and never destroys them itself:
//! eviction hands the removed handles back to the caller, which owns the
//! GPU context. Context loss drops the map wholesale and bumps the
//! generation, without touching handles that no longer exist.

use std::collections::HashMap;

#[derive(Debug)]
pub struct TextureCache<T> {
    entries: HashMap<usize, T>,
    generation: u64,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            generation: 0,
        }
    }
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert a freshly uploaded texture. Returns the handle it replaced.
    pub fn insert(&mut self, index: usize, texture: T) -> Option<T> {
        self.entries.insert(index, texture)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// Remove every entry farther than `distance` from `center` and return
    /// the removed handles for destruction.
    pub fn evict_outside(&mut self, center: f32, distance: f32) -> Vec<T> {
        let doomed: Vec<usize> = self
            .entries
            .keys()
            .copied()
            .filter(|&index| (index as f32 - center).abs() > distance)
            .collect();
        doomed
            .into_iter()
            .filter_map(|index| self.entries.remove(&index))
            .collect()
    }

    /// Remove every entry at or past `item_count` (the dataset shrank).
    pub fn evict_out_of_range(&mut self, item_count: usize) -> Vec<T> {
        let doomed: Vec<usize> = self
            .entries
            .keys()
            .copied()
            .filter(|&index| index >= item_count)
            .collect();
        doomed
            .into_iter()
            .filter_map(|index| self.entries.remove(&index))
            .collect()
    }

    /// Take every handle out, leaving the generation unchanged.
    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain().map(|(_, texture)| texture).collect()
    }

    /// Forget all entries without yielding them and start a new
    /// generation. Returns the new generation.
    pub fn invalidate(&mut self) -> u64 {
        self.entries.clear();
        self.generation += 1;
        self.generation
    }
}
