use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::state::AppState;

/// Pass-through record from the label lookup. Absent fields are left
/// off the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrugInfo {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DrugInfo {
    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Drug-information collaborator. Lookups never fail the caller;
/// network or decoding trouble degrades to `found: false`.
#[async_trait]
pub trait DrugLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> DrugInfo;
}

/// Proxy to the OpenFDA label endpoint.
pub struct OpenFdaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFdaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    async fn fetch(&self, query: &str) -> anyhow::Result<Value> {
        let search = format!("openfda.brand_name:{query}+openfda.generic_name:{query}");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("search", search.as_str()), ("limit", "1")])
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

fn first_entry(result: &Value, key: &str) -> Option<String> {
    result
        .get(key)?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

/// Maps an OpenFDA label payload to the boundary record. An empty
/// result set is a plain not-found.
fn from_label_payload(payload: &Value) -> DrugInfo {
    let Some(result) = payload
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    else {
        return DrugInfo::not_found();
    };

    DrugInfo {
        found: true,
        purpose: first_entry(result, "indications_and_usage"),
        side_effects: first_entry(result, "adverse_reactions"),
        dosage: first_entry(result, "dosage_and_administration"),
        source: Some("OpenFDA".into()),
    }
}

#[async_trait]
impl DrugLookup for OpenFdaClient {
    async fn lookup(&self, query: &str) -> DrugInfo {
        match self.fetch(query).await {
            Ok(payload) => from_label_payload(&payload),
            Err(e) => {
                warn!(error = %e, query, "drug lookup failed");
                DrugInfo::not_found()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DrugQuery {
    pub q: String,
}

#[instrument(skip(state))]
async fn drug_info(
    State(state): State<AppState>,
    Query(params): Query<DrugQuery>,
) -> Json<DrugInfo> {
    Json(state.drug_lookup.lookup(&params.q).await)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/drug-info", get(drug_info))
}
