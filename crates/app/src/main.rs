use clap::Parser;
use migration::{Migrator, MigratorTrait};

mod cli;
mod commands;
mod error;
mod prompt;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "mvault={level},engine={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    let store = engine::SqliteStore::connect(&settings.database_url).await?;
    Migrator::up(store.database(), None).await?;
    tracing::debug!(url = %settings.database_url, "database ready");

    let engine = engine::Engine::builder()
        .store(store)
        .session_ttl(settings.session_ttl())
        .build()
        .await?;

    let mut ctx = commands::Context {
        engine,
        settings,
        json: cli.json,
    };
    commands::run(&mut ctx, cli.command).await?;

    Ok(())
}
