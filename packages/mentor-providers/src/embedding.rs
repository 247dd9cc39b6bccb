//! OpenAI-compatible `/embeddings` adapter.
//!
//! The provider contract is strict: one unit-norm vector per input, in input
//! order, at the configured dimensionality. The adapter enforces the count
//! and dimension here, so callers never have to re-check a batch before
//! indexing it.

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	index: Option<usize>,
	embedding: Vec<f32>,
}

pub async fn embed(
	cfg: &mentor_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client.post(url).headers(request_headers(cfg)?).json(&body).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Rejected { status: status.as_u16() });
	}

	let payload = res.bytes().await?;
	let parsed: EmbeddingResponse = serde_json::from_slice(&payload)
		.map_err(|err| Error::InvalidResponse { message: err.to_string() })?;

	check_batch(order_by_index(parsed), texts.len(), cfg.dimensions as usize)
}

fn request_headers(cfg: &mentor_config::EmbeddingProviderConfig) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {}", cfg.api_key).parse()?);

	for (key, value) in &cfg.default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("default header {key:?} must be a string"),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Batch items may arrive out of order; the `index` field is authoritative,
/// the array position only a fallback.
fn order_by_index(response: EmbeddingResponse) -> Vec<Vec<f32>> {
	let mut indexed: Vec<(usize, Vec<f32>)> = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
		.collect();

	indexed.sort_by_key(|(index, _)| *index);

	indexed.into_iter().map(|(_, embedding)| embedding).collect()
}

fn check_batch(vectors: Vec<Vec<f32>>, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
	if vectors.len() != expected {
		return Err(Error::VectorCount { expected, actual: vectors.len() });
	}

	for vector in &vectors {
		if vector.len() != dim {
			return Err(Error::Dimension { expected: dim, actual: vector.len() });
		}
	}

	Ok(vectors)
}
