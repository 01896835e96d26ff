use clap::Subcommand;

use crate::cli::{connect_registry, utils::output_success, OutputFormat};

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Create the protected_pages table and index if missing")]
    Schema,
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Schema => {
            let registry = connect_registry().await?;
            registry.ensure_schema().await?;
            output_success(&output_format, "Schema is ready", None)
        }
    }
}
