use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::types::ProtectedPath;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output protected page records as a table or JSON array
pub fn output_pages(output_format: &OutputFormat, pages: &[ProtectedPath]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "protected_pages": pages }))?);
        }
        OutputFormat::Text => {
            if pages.is_empty() {
                println!("No records available.");
                return Ok(());
            }
            println!("{:>6}  {}", "PID", "PATH");
            for page in pages {
                println!("{:>6}  {}", page.pid, page.path);
            }
        }
    }
    Ok(())
}
