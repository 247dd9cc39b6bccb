pub mod db;
pub mod models;
pub mod queries;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// pgvector text rendering, e.g. `[0.1,0.2]`. Queries cast through text so
/// the crate needs no compile-time knowledge of the vector extension.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub fn parse_pg_vector(text: &str) -> Result<Vec<f32>> {
	let trimmed = text.trim();
	let without_brackets =
		trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')).ok_or_else(|| {
			Error::InvalidVector { message: "vector text is not bracketed".to_string() }
		})?;

	if without_brackets.trim().is_empty() {
		return Ok(Vec::new());
	}

	let mut vec = Vec::new();

	for part in without_brackets.split(',') {
		let value: f32 = part.trim().parse().map_err(|_| Error::InvalidVector {
			message: format!("non-numeric component {:?}", part.trim()),
		})?;

		vec.push(value);
	}

	Ok(vec)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_text_round_trips() {
		let vec = vec![0.25_f32, -1.5, 0.000_123];
		let text = vector_to_pg(&vec);
		let parsed = parse_pg_vector(&text).expect("parse failed");

		assert_eq!(parsed, vec);
	}

	#[test]
	fn parse_rejects_unbracketed_text() {
		assert!(parse_pg_vector("0.1,0.2").is_err());
	}

	#[test]
	fn parse_rejects_non_numeric_component() {
		assert!(parse_pg_vector("[0.1,abc]").is_err());
	}

	#[test]
	fn parse_accepts_empty_vector() {
		assert_eq!(parse_pg_vector("[]").expect("parse failed"), Vec::<f32>::new());
	}
}
