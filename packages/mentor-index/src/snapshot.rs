//! Durable snapshot of a built index: a gzip-compressed JSON envelope with an
//! explicit format version, resource ids in slot order, and each vector
//! base64-encoded as little-endian f32 bytes so a save/load round trip is
//! bit-identical.

use std::{
	fs::File,
	io::{BufReader, BufWriter, Read, Write},
	path::Path,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, VectorIndex};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
	version: u32,
	dim: u32,
	resource_ids: Vec<i64>,
	vectors: Vec<String>,
}

pub fn encode_vector(vector: &[f32]) -> String {
	let bytes: Vec<u8> = vector.iter().flat_map(|value| value.to_le_bytes()).collect();

	STANDARD.encode(bytes)
}

pub fn decode_vector(encoded: &str) -> Result<Vec<f32>, String> {
	let bytes = STANDARD.decode(encoded).map_err(|err| format!("invalid base64: {err}"))?;

	if bytes.len() % 4 != 0 {
		return Err(format!("vector byte length {} is not a multiple of 4", bytes.len()));
	}

	Ok(bytes
		.chunks_exact(4)
		.map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
		.collect())
}

pub fn save(index: &VectorIndex, path: &Path) -> Result<()> {
	let envelope = Envelope {
		version: SNAPSHOT_VERSION,
		dim: index.dim() as u32,
		resource_ids: index.all_resource_ids().to_vec(),
		vectors: index.vectors().iter().map(|vector| encode_vector(vector)).collect(),
	};
	let io_err = |source| Error::SnapshotIo { path: path.to_path_buf(), source };

	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		std::fs::create_dir_all(parent).map_err(io_err)?;
	}

	let file = File::create(path).map_err(io_err)?;
	let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
	let payload = serde_json::to_vec(&envelope).map_err(|err| Error::SnapshotCorrupt {
		path: path.to_path_buf(),
		message: err.to_string(),
	})?;

	encoder.write_all(&payload).map_err(io_err)?;
	encoder.finish().map_err(io_err)?;

	Ok(())
}

pub fn load(path: &Path) -> Result<VectorIndex> {
	let corrupt = |message: String| Error::SnapshotCorrupt { path: path.to_path_buf(), message };
	let file =
		File::open(path).map_err(|source| Error::SnapshotIo { path: path.to_path_buf(), source })?;
	let mut decoder = GzDecoder::new(BufReader::new(file));
	let mut payload = Vec::new();

	decoder
		.read_to_end(&mut payload)
		.map_err(|source| Error::SnapshotIo { path: path.to_path_buf(), source })?;

	let envelope: Envelope =
		serde_json::from_slice(&payload).map_err(|err| corrupt(err.to_string()))?;

	if envelope.version != SNAPSHOT_VERSION {
		return Err(Error::SnapshotVersion {
			found: envelope.version,
			expected: SNAPSHOT_VERSION,
		});
	}

	let dim = envelope.dim as usize;
	let mut vectors = Vec::with_capacity(envelope.vectors.len());

	for (slot, encoded) in envelope.vectors.iter().enumerate() {
		let vector = decode_vector(encoded).map_err(corrupt)?;

		if vector.len() != dim {
			return Err(corrupt(format!(
				"slot {slot} has dimension {} (expected {dim})",
				vector.len()
			)));
		}

		vectors.push(vector);
	}

	VectorIndex::build(vectors, envelope.resource_ids)
}
