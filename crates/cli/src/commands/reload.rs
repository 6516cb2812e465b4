//! On-demand data reload

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_success, print_warning, OutputFormat};

fn loaded(flag: bool) -> String {
    color_status(if flag { "loaded" } else { "missing" })
}

/// Trigger a reload and print what the service loaded
pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let outcome = client.reload().await?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Table => {
            if outcome.swapped {
                print_success("Recommender data reloaded");
            } else {
                print_warning("Reload found no usable data, previous data is still served");
            }

            let report = &outcome.report;
            println!(
                "Similarity: {} ({} donors, {} curve points)",
                loaded(report.similarity_loaded),
                report.donors,
                report.curve_points
            );
            println!(
                "Locale:     {} ({} locales)",
                loaded(report.locale_loaded),
                report.locales
            );
        }
    }

    Ok(())
}
