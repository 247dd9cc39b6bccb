pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot build an index from zero vectors.")]
	EmptyIndex,
	#[error("Vector count {vectors} does not match resource id count {resource_ids}.")]
	LengthMismatch { vectors: usize, resource_ids: usize },
	#[error("Vector dimension {actual} does not match index dimension {expected}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Slot {slot} is out of range for an index of {len} vectors.")]
	SlotOutOfRange { slot: usize, len: usize },
	#[error("Snapshot IO failed at {path:?}.")]
	SnapshotIo { path: std::path::PathBuf, source: std::io::Error },
	#[error("Snapshot at {path:?} is corrupt: {message}")]
	SnapshotCorrupt { path: std::path::PathBuf, message: String },
	#[error("Snapshot version {found} is unsupported (expected {expected}).")]
	SnapshotVersion { found: u32, expected: u32 },
}
