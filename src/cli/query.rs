use crate::api::Api;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use reqwest::Url;
use std::collections::HashMap;

/// Runs a single API request given as a query string and prints the JSON envelope.
pub async fn run(api: &Api, query: &str) -> Result<()> {
    let params = parse_query(query)?;
    let response = api.handle_query(&params, Utc::now()).await;

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        bail!("Request failed with status {}", response.status);
    }
    Ok(())
}

/// Accepts `action=...&from=...`, optionally prefixed with `?`.
fn parse_query(query: &str) -> Result<HashMap<String, String>> {
    let mut url = Url::parse("http://localhost/").context("Failed to build request URL")?;
    url.set_query(Some(query.trim().trim_start_matches('?')));
    Ok(url.query_pairs().into_owned().collect())
}
