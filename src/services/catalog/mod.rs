use crate::models::{CatalogEntry, ItemId};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Display metadata for catalog items. Owned by the serving side; the engine
/// never sees it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<ItemId, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.item_id.clone(), position))
            .collect();
        Self { entries, by_id }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open catalog {}", path.display()))?;
        let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;

        info!("Loaded catalog from {}: {} entries", path.display(), entries.len());
        Ok(Self::new(entries))
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&CatalogEntry> {
        self.by_id.get(item_id).map(|&position| &self.entries[position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-personalized listing: a seeded sample of `min(n, len)` entries.
    pub fn default_listing(&self, n: usize, seed: u64) -> Vec<&CatalogEntry> {
        seeded_sample(self.entries.len(), n, seed)
            .into_iter()
            .map(|position| &self.entries[position])
            .collect()
    }
}

/// `min(amount, length)` distinct positions in `[0, length)`, reproducible for a seed.
pub fn seeded_sample(length: usize, amount: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, length, amount.min(length)).into_vec()
}
