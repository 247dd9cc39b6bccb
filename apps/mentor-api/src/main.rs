use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = mentor_api::Args::parse();
	mentor_api::run(args).await
}
