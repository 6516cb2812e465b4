//! Service health and readiness

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthResponse, ReadinessResponse};
use crate::output::{color_status, format_timestamp, print_json, OutputFormat};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

#[derive(Serialize)]
struct StatusReport {
    health: HealthResponse,
    readiness: ReadinessResponse,
}

/// Show component health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (health, readiness) = tokio::try_join!(client.health(), client.readiness())?;

    match format {
        OutputFormat::Json => print_json(&StatusReport { health, readiness })?,
        OutputFormat::Table => {
            let ready = if readiness.ready { "ready" } else { "not ready" };
            println!(
                "Service: {} ({})",
                color_status(&health.status),
                color_status(ready)
            );
            if let Some(reason) = &readiness.reason {
                println!("Reason: {}", reason);
            }

            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                    checked: format_timestamp(component.last_check_timestamp),
                })
                .collect();

            if !rows.is_empty() {
                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}
