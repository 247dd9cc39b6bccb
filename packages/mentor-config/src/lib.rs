mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Index, Postgres, Providers, Ranking, Recency, Retrieval,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.index.snapshot_path.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.snapshot_path must be non-empty.".to_string(),
		});
	}
	if cfg.retrieval.min_candidates == 0 {
		return Err(Error::Validation {
			message: "retrieval.min_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.per_item_factor == 0 {
		return Err(Error::Validation {
			message: "retrieval.per_item_factor must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.default_top_n == 0 {
		return Err(Error::Validation {
			message: "retrieval.default_top_n must be greater than zero.".to_string(),
		});
	}
	if !cfg.ranking.mmr_lambda.is_finite() {
		return Err(Error::Validation {
			message: "ranking.mmr_lambda must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.ranking.mmr_lambda) {
		return Err(Error::Validation {
			message: "ranking.mmr_lambda must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.recency.window_days == 0 {
		return Err(Error::Validation {
			message: "recency.window_days must be greater than zero.".to_string(),
		});
	}
	if cfg.recency.positive_actions.is_empty() {
		return Err(Error::Validation {
			message: "recency.positive_actions must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for action in &mut cfg.recency.positive_actions {
		*action = action.trim().to_string();
	}

	cfg.recency.positive_actions.retain(|action| !action.is_empty());
}
