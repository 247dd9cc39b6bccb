//! Flat inner-product vector index over pre-normalized embeddings.
//!
//! Vectors are L2-normalized upstream, so the inner product equals cosine
//! similarity and queries need no per-call normalization. The index is a
//! plain value: it is built in full, then published through [`SharedIndex`]
//! with an atomic reference swap, never mutated in place.

pub mod snapshot;

mod error;

pub use error::{Error, Result};

use std::{
	cmp::Ordering,
	path::Path,
	sync::{Arc, RwLock},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
	pub similarity: f32,
	pub slot: usize,
}

#[derive(Debug)]
pub struct VectorIndex {
	dim: usize,
	vectors: Vec<Vec<f32>>,
	resource_ids: Vec<i64>,
}

impl VectorIndex {
	pub fn build(vectors: Vec<Vec<f32>>, resource_ids: Vec<i64>) -> Result<Self> {
		if vectors.len() != resource_ids.len() {
			return Err(Error::LengthMismatch {
				vectors: vectors.len(),
				resource_ids: resource_ids.len(),
			});
		}
		if vectors.is_empty() {
			return Err(Error::EmptyIndex);
		}

		let dim = vectors[0].len();

		if dim == 0 {
			return Err(Error::EmptyIndex);
		}

		for vector in &vectors {
			if vector.len() != dim {
				return Err(Error::DimensionMismatch { expected: dim, actual: vector.len() });
			}
		}

		Ok(Self { dim, vectors, resource_ids })
	}

	pub fn dim(&self) -> usize {
		self.dim
	}

	pub fn len(&self) -> usize {
		self.vectors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vectors.is_empty()
	}

	pub(crate) fn vectors(&self) -> &[Vec<f32>] {
		&self.vectors
	}

	pub fn all_resource_ids(&self) -> &[i64] {
		&self.resource_ids
	}

	/// Top-k slots by inner product, descending. Ties resolve to the lower
	/// slot (insertion order) so repeated queries are deterministic.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if query.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
		}

		let mut hits: Vec<SearchHit> = self
			.vectors
			.iter()
			.enumerate()
			.map(|(slot, vector)| SearchHit { similarity: inner_product(query, vector), slot })
			.collect();

		hits.sort_by(|lhs, rhs| {
			cmp_f32_desc(lhs.similarity, rhs.similarity).then_with(|| lhs.slot.cmp(&rhs.slot))
		});
		hits.truncate(k);

		Ok(hits)
	}

	pub fn resource_ids(&self, slots: &[usize]) -> Result<Vec<i64>> {
		slots
			.iter()
			.map(|&slot| {
				self.resource_ids
					.get(slot)
					.copied()
					.ok_or(Error::SlotOutOfRange { slot, len: self.resource_ids.len() })
			})
			.collect()
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		snapshot::save(self, path)
	}

	pub fn load(path: &Path) -> Result<Self> {
		snapshot::load(path)
	}
}

/// The published handle. Writers build a [`VectorIndex`] fully, then
/// [`publish`](Self::publish) it. Readers take [`current`](Self::current)
/// once and run their whole request against that one generation; slot
/// numbers are only meaningful within the generation that produced them, so
/// there is deliberately no search-through-the-handle shortcut here.
#[derive(Debug, Default)]
pub struct SharedIndex {
	inner: RwLock<Option<Arc<VectorIndex>>>,
}

impl SharedIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn current(&self) -> Option<Arc<VectorIndex>> {
		self.inner.read().ok().and_then(|guard| guard.clone())
	}

	pub fn is_ready(&self) -> bool {
		self.current().is_some()
	}

	/// Swap in a fully built generation and hand it back; a writer that keeps
	/// working with the new index (snapshotting it, answering the rest of a
	/// request) uses the returned `Arc`, not a re-read of the handle.
	pub fn publish(&self, index: VectorIndex) -> Arc<VectorIndex> {
		let index = Arc::new(index);

		if let Ok(mut guard) = self.inner.write() {
			*guard = Some(Arc::clone(&index));
		}

		index
	}
}

pub fn inner_product(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| l * r).sum()
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
