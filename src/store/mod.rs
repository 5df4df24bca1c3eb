use crate::error::LoadError;
use crate::models::{ItemId, ItemIndex};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Trained artifacts as produced by the offline factorization job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifacts {
    /// One row of latent factors per item index.
    pub item_factors: Vec<Vec<f64>>,
    pub item_biases: Vec<f64>,
    pub item_index: HashMap<ItemId, ItemIndex>,
}

impl ModelArtifacts {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// Immutable, validated view of the trained item model.
///
/// Factors are held column-per-item (`K x item_count`) so each item's latent
/// row is a contiguous slice and scoring is a single transposed product.
#[derive(Debug, Clone)]
pub struct ModelStore {
    factors: DMatrix<f64>,
    biases: DVector<f64>,
    index_of: HashMap<ItemId, ItemIndex>,
    id_of: Vec<ItemId>,
}

impl ModelStore {
    pub fn new(
        item_factors: Vec<Vec<f64>>,
        item_biases: Vec<f64>,
        item_index: HashMap<ItemId, ItemIndex>,
    ) -> Result<Self, LoadError> {
        let item_count = item_factors.len();
        if item_count != item_biases.len() {
            return Err(LoadError::ShapeMismatch {
                factor_rows: item_count,
                bias_len: item_biases.len(),
            });
        }

        let dimension = item_factors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(LoadError::EmptyDimension);
        }

        for (row, factors) in item_factors.iter().enumerate() {
            if factors.len() != dimension {
                return Err(LoadError::RaggedFactors {
                    row,
                    expected: dimension,
                    found: factors.len(),
                });
            }
            if factors.iter().any(|x| !x.is_finite()) {
                return Err(LoadError::NonFiniteValue {
                    what: "item factors",
                    index: row,
                });
            }
        }

        if let Some(index) = item_biases.iter().position(|b| !b.is_finite()) {
            return Err(LoadError::NonFiniteValue {
                what: "item biases",
                index,
            });
        }

        let id_of = invert_index(&item_index, item_count)?;

        let factors = DMatrix::from_iterator(
            dimension,
            item_count,
            item_factors.into_iter().flatten(),
        );

        Ok(Self {
            factors,
            biases: DVector::from_vec(item_biases),
            index_of: item_index,
            id_of,
        })
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, LoadError> {
        Self::new(
            artifacts.item_factors,
            artifacts.item_biases,
            artifacts.item_index,
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let store = Self::from_artifacts(ModelArtifacts::from_json_file(path)?)?;
        info!(
            "Loaded model from {}: {} items, {} latent factors",
            path.display(),
            store.item_count(),
            store.factor_dimension()
        );
        Ok(store)
    }

    /// Unknown ids are `None`, never an error.
    pub fn index_of(&self, item_id: &ItemId) -> Option<ItemIndex> {
        self.index_of.get(item_id).copied()
    }

    /// Panics if `index >= item_count()`.
    pub fn id_of(&self, index: ItemIndex) -> &ItemId {
        &self.id_of[index]
    }

    pub fn factor_row(&self, index: ItemIndex) -> &[f64] {
        let k = self.factor_dimension();
        &self.factors.as_slice()[index * k..(index + 1) * k]
    }

    pub fn bias(&self, index: ItemIndex) -> f64 {
        self.biases[index]
    }

    pub fn item_count(&self) -> usize {
        self.id_of.len()
    }

    pub fn factor_dimension(&self) -> usize {
        self.factors.nrows()
    }

    /// The `K x item_count` factor matrix, one column per item.
    pub fn factors(&self) -> &DMatrix<f64> {
        &self.factors
    }

    pub fn biases(&self) -> &DVector<f64> {
        &self.biases
    }
}

fn invert_index(
    item_index: &HashMap<ItemId, ItemIndex>,
    item_count: usize,
) -> Result<Vec<ItemId>, LoadError> {
    let mut slots: Vec<Option<ItemId>> = vec![None; item_count];

    for (item_id, &index) in item_index {
        let slot = slots.get_mut(index).ok_or_else(|| LoadError::IndexOutOfRange {
            item_id: item_id.clone(),
            index,
            item_count,
        })?;
        if let Some(first) = slot.as_ref() {
            // Report the pair in a stable order regardless of map iteration.
            let (first, second) = if first <= item_id {
                (first.clone(), item_id.clone())
            } else {
                (item_id.clone(), first.clone())
            };
            return Err(LoadError::DuplicateIndex {
                index,
                first,
                second,
            });
        }
        *slot = Some(item_id.clone());
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or(LoadError::MissingIndex { index }))
        .collect()
}
