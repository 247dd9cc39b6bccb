pub fn render_core_schema() -> &'static str {
	include_str!("../sql/init.sql")
}

pub fn render_embeddings_schema(vector_dim: u32) -> String {
	include_str!("../sql/embeddings.sql").replace("<VECTOR_DIM>", &vector_dim.to_string())
}
