//! Recommendation lookup for a single client

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, RecommendationResponse};
use crate::output::{print_info, print_json, print_warning, OutputFormat};

/// Row for the recommendations table
#[derive(Tabled)]
struct AddonRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Add-on")]
    addon: String,
}

fn rows(response: &RecommendationResponse) -> Vec<AddonRow> {
    response
        .results
        .iter()
        .enumerate()
        .map(|(idx, addon)| AddonRow {
            rank: idx + 1,
            addon: addon.clone(),
        })
        .collect()
}

/// Fetch and print recommendations for a client
pub async fn recommend(
    client: &ApiClient,
    client_id: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let response = client.recommend(client_id, limit).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let Some(recommender) = response.recommender.as_deref() else {
                print_warning(&format!("No recommender can serve client {}", client_id));
                return Ok(());
            };

            if response.results.is_empty() {
                print_warning(&format!(
                    "The {} recommender found nothing for client {}",
                    recommender, client_id
                ));
                return Ok(());
            }

            print_info(&format!("Recommended by the {} recommender", recommender));
            let table = tabled::Table::new(rows(&response))
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} add-ons", response.results.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_ranked_in_order() {
        let response = RecommendationResponse {
            client_id: "client-1".into(),
            recommender: Some("similarity".into()),
            results: vec!["b".into(), "a".into()],
        };

        let rows = rows(&response);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].rank, rows[0].addon.as_str()), (1, "b"));
        assert_eq!((rows[1].rank, rows[1].addon.as_str()), (2, "a"));
    }
}
