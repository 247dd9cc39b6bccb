pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Embedding endpoint answered HTTP {status}.")]
	Rejected { status: u16 },
	#[error("Malformed embedding response: {message}")]
	InvalidResponse { message: String },
	#[error("Provider returned {actual} embedding vectors for {expected} inputs.")]
	VectorCount { expected: usize, actual: usize },
	#[error("Provider returned a vector of dimension {actual} (configured {expected}).")]
	Dimension { expected: usize, actual: usize },
}
