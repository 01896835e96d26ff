use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, AdminClaims, ADMIN_PERMISSION, BYPASS_PERMISSION};
use crate::cli::{utils, OutputFormat};
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a bearer token for the admin API and/or gate bypass")]
    Issue {
        #[arg(help = "Subject recorded in audit logs")]
        subject: String,
        #[arg(long, help = "Grant the admin API permission")]
        admin: bool,
        #[arg(long, help = "Grant the gate bypass permission")]
        bypass: bool,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { subject, admin, bypass } => {
            let mut permissions = vec![];
            if admin {
                permissions.push(ADMIN_PERMISSION.to_string());
            }
            if bypass {
                permissions.push(BYPASS_PERMISSION.to_string());
            }
            if permissions.is_empty() {
                anyhow::bail!("Pass --admin and/or --bypass");
            }

            let security = &config::config().security;
            let claims = AdminClaims::new(subject, permissions, security);
            let token = generate_jwt(&claims, security)?;

            match output_format {
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
                OutputFormat::Json => utils::output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp, "permissions": claims.permissions })),
                ),
            }
        }
    }
}
