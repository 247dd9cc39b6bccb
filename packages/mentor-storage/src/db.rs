use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

/// Outcome of schema bootstrap. The embeddings table needs the pgvector
/// extension; when that is unavailable the core tables still come up and the
/// caller decides how loudly to complain.
#[derive(Debug, Clone)]
pub struct SchemaReport {
	pub embeddings_enabled: bool,
	pub skipped_reason: Option<String>,
}

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &mentor_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<SchemaReport> {
		let lock_id: i64 = 7_318_201;
		// Advisory locks are held per connection. Use a single transaction so
		// the lock is scoped to one connection and released when it ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		run_statements(&mut tx, schema::render_core_schema()).await?;

		tx.commit().await?;

		// pgvector setup runs apart from the core tables so a missing
		// extension degrades to a reported skip instead of failing boot.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		match run_statements(&mut tx, &schema::render_embeddings_schema(vector_dim)).await {
			Ok(()) => {
				tx.commit().await?;

				Ok(SchemaReport { embeddings_enabled: true, skipped_reason: None })
			},
			Err(err) => {
				let _ = tx.rollback().await;

				Ok(SchemaReport { embeddings_enabled: false, skipped_reason: Some(err.to_string()) })
			},
		}
	}
}

async fn run_statements(
	tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
	sql: &str,
) -> Result<(), sqlx::Error> {
	for statement in sql.split(';') {
		let trimmed = statement.trim();

		if trimmed.is_empty() {
			continue;
		}

		sqlx::query(trimmed).execute(&mut **tx).await?;
	}

	Ok(())
}
