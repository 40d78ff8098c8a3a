//! Static item catalog.
//!
//! The catalog is a read-only data table the engine consumes; parsing that
//! table from its source format is out of scope here. This module owns the
//! in-memory representation and the lookups every engine needs: by-kind
//! listing, by-name lookup, image-URL resolution, and case-pool filtering.

use std::collections::HashMap;

use crate::model::item::{CaseType, Item, ItemKind, RarityKey};

#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<Item>,
    by_name: HashMap<String, usize>,
    image_urls: HashMap<String, String>,
}

/// Normalize a name for case-insensitive / transliteration-tolerant lookup:
/// lowercase, fold `ё` to `е`, strip anything that isn't alphanumeric.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
    .replace('ё', "е")
    .chars()
    .filter(|c| c.is_alphanumeric())
    .collect()
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a flat item list, auto-classifying rarity for any
    /// item that doesn't carry an explicit `rarity_key`. An explicit key
    /// always wins; otherwise rarity is assigned per kind by a thirds rule.
    pub fn load(items: Vec<Item>) -> Self {
        let mut catalog = Catalog::new();
        let mut by_kind: HashMap<ItemKind, Vec<usize>> = HashMap::new();
        catalog.items = items;

        for (idx, item) in catalog.items.iter().enumerate() {
            by_kind.entry(item.kind).or_default().push(idx);
        }

        for indices in by_kind.values() {
            classify_rarity(&mut catalog.items, indices);
        }

        for (idx, item) in catalog.items.iter().enumerate() {
            catalog.by_name.insert(normalize_name(&item.name), idx);
        }
        catalog
    }

    pub fn register_image(&mut self, name: &str, url: impl Into<String>) {
        self.image_urls.insert(normalize_name(name), url.into());
    }

    pub fn items_by_kind(&self, kind: ItemKind) -> Vec<&Item> {
        self.items.iter().filter(|i| i.kind == kind).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        self.by_name
        .get(&normalize_name(name))
        .map(|&idx| &self.items[idx])
    }

    pub fn image_url(&self, name: &str) -> Option<&str> {
        self.image_urls.get(&normalize_name(name)).map(|s| s.as_str())
    }

    /// Every item eligible for `case_type`, optionally including sign items
    /// (signs are usually drawn from a dedicated sign pool, see).
    pub fn items_for_case(&self, case_type: CaseType, include_signs: bool) -> Vec<&Item> {
        self.items
        .iter()
        .filter(|i| i.case_eligible && i.case_types.contains(&case_type))
        .filter(|i| include_signs || i.kind != ItemKind::Sign)
        .collect()
    }

    pub fn all(&self) -> &[Item] {
        &self.items
    }
}

/// Sort `indices` (into `items`) by ascending `chance` and split into thirds:
/// top third (highest weight) → very_rare, middle → rare, bottom → common.
/// Guarantees at least one item lands in the very_rare bucket.
fn classify_rarity(items: &mut [Item], indices: &[usize]) {
    let mut to_classify: Vec<usize> = indices
    .iter()
    .copied()
    .filter(|&i| items[i].rarity_key.is_none())
    .collect();
    if to_classify.is_empty() {
        return;
    }
    to_classify.sort_by(|&a, &b| {
        items[a]
        .chance
        .partial_cmp(&items[b].chance)
        .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = to_classify.len();
    let third = (n / 3).max(1);
    let very_rare_cut = third.min(n);
    let rare_cut = (third * 2).min(n).max(very_rare_cut);

    for (pos, &idx) in to_classify.iter().enumerate() {
        let rarity = if pos < very_rare_cut {
            RarityKey::VeryRare
        } else if pos < rare_cut {
            RarityKey::Rare
        } else {
            RarityKey::Common
        };
        items[idx].rarity_key = Some(rarity);
    }
}
