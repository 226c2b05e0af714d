// src/fonts.rs

//! Font cache keyed by `(family, size)`.
//!
//! The cache is an append-only arena: entries are never evicted or replaced,
//! and the handle returned for a key stays valid for the life of the window.
//! Every miss loads the same configured fallback face whatever family was
//! asked for; only the size is passed through to the platform.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;

/// Font family requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Fixed,
    Variable,
}

/// Index of an entry in a [`FontCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub usize);

#[derive(Debug)]
struct FontEntry<F> {
    family: FontFamily,
    size: i32,
    font: F,
}

#[derive(Debug)]
pub struct FontCache<F> {
    entries: Vec<FontEntry<F>>,
    fallback_face: String,
}

impl<F> FontCache<F> {
    pub fn new(fallback_face: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            fallback_face: fallback_face.into(),
        }
    }

    /// Linear scan for an existing entry.
    pub fn lookup(&self, family: FontFamily, size: i32) -> Option<FontId> {
        self.entries
            .iter()
            .position(|e| e.family == family && e.size == size)
            .map(FontId)
    }

    /// Returns the entry for `(family, size)`, loading the fallback face
    /// through `load` on a miss.
    pub fn resolve<L>(&mut self, family: FontFamily, size: i32, load: L) -> Result<FontId, FrontendError>
    where
        L: FnOnce(&str, i32) -> anyhow::Result<F>,
    {
        if let Some(id) = self.lookup(family, size) {
            return Ok(id);
        }
        let font = load(&self.fallback_face, size).map_err(|e| FrontendError::FontLoad {
            face: self.fallback_face.clone(),
            size,
            reason: format!("{e:#}"),
        })?;
        self.entries.push(FontEntry { family, size, font });
        let id = FontId(self.entries.len() - 1);
        debug!(
            "Font cache miss for {:?} at {}: loaded '{}' as entry {}",
            family, size, self.fallback_face, id.0
        );
        Ok(id)
    }

    pub fn get(&self, id: FontId) -> Option<&F> {
        self.entries.get(id.0).map(|e| &e.font)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback_face(&self) -> &str {
        &self.fallback_face
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test_log::test]
    fn same_key_twice_reuses_the_entry() {
        let mut cache: FontCache<(String, i32)> = FontCache::new("variable");
        let mut loads = 0;
        let a = cache
            .resolve(FontFamily::Variable, 12, |face, size| {
                loads += 1;
                Ok((face.to_string(), size))
            })
            .unwrap();
        let b = cache
            .resolve(FontFamily::Variable, 12, |_, _| -> anyhow::Result<(String, i32)> {
                panic!("cache hit must not load")
            })
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn every_family_loads_the_fallback_face() {
        let mut cache: FontCache<(String, i32)> = FontCache::new("variable");
        let fixed = cache
            .resolve(FontFamily::Fixed, 10, |face, size| Ok((face.to_string(), size)))
            .unwrap();
        let variable = cache
            .resolve(FontFamily::Variable, 10, |face, size| Ok((face.to_string(), size)))
            .unwrap();
        assert_ne!(fixed, variable);
        assert_eq!(cache.get(fixed), Some(&("variable".to_string(), 10)));
        assert_eq!(cache.get(variable), Some(&("variable".to_string(), 10)));
        assert_eq!(cache.len(), 2);
    }

    #[test_log::test]
    fn load_failure_becomes_font_load_error() {
        let mut cache: FontCache<()> = FontCache::new("variable");
        let err = cache
            .resolve(FontFamily::Fixed, 14, |_, _| bail!("no such face"))
            .unwrap_err();
        assert!(matches!(err, FrontendError::FontLoad { size: 14, .. }));
        assert!(cache.is_empty());
    }
}
