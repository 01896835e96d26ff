use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{connect_registry, utils, OutputFormat};
use crate::config;
use crate::database::registry::ProtectedPathRegistry;
use crate::handlers::admin::validate_path;
use crate::types::{Pagination, PathUpdate, Pid};

#[derive(Subcommand)]
pub enum PageCommands {
    #[command(about = "Protect a path with a shared password")]
    Add {
        #[arg(help = "Internal path or alias, e.g. /node/12")]
        path: String,
        #[arg(help = "Shared password")]
        password: String,
    },

    #[command(about = "List protected pages")]
    List {
        #[arg(long, default_value_t = Pagination::DEFAULT_LIMIT)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    #[command(about = "Replace the path and/or password of a protected page")]
    Edit {
        pid: Pid,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    #[command(about = "Remove protection from a page")]
    Delete { pid: Pid },
}

pub async fn handle(cmd: PageCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = connect_registry().await?;

    match cmd {
        PageCommands::Add { path, password } => {
            let path = validate_path(&path).map_err(|e| anyhow::anyhow!("{}", e))?;
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }
            let pid = registry.insert(&path, &hash_password(&password)).await?;
            utils::output_success(
                &output_format,
                &format!("Protected {} (pid {})", path, pid),
                Some(json!({ "pid": pid, "path": path })),
            )
        }
        PageCommands::List { limit, offset } => {
            let page = Pagination::new(limit, offset).capped(config::config().registry.max_limit);
            let pages = registry.list_all(page).await?;
            utils::output_pages(&output_format, &pages)
        }
        PageCommands::Edit { pid, path, password } => {
            let update = PathUpdate {
                path: path
                    .as_deref()
                    .map(validate_path)
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("{}", e))?,
                password: password.filter(|p| !p.is_empty()).map(|p| hash_password(&p)),
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass --path and/or --password");
            }
            registry.update(pid, update).await?;
            utils::output_success(&output_format, &format!("Updated protected page {}", pid), Some(json!({ "pid": pid })))
        }
        PageCommands::Delete { pid } => {
            registry.delete(pid).await?;
            utils::output_success(&output_format, &format!("Deleted protected page {}", pid), Some(json!({ "pid": pid })))
        }
    }
}
