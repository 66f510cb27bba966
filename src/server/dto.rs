use serde::Deserialize;

use crate::types::EntryType;

#[derive(Debug, Deserialize)]
pub struct CreateNamedRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNamedRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddAssociationRequest {
    pub business_line_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAssociationsRequest {
    pub business_line_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub description: String,
    pub amount: f64,
    pub year: i32,
    pub month: i32,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub business_line_id: Option<String>,
    #[serde(default)]
    pub cost_center_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub business_line_id: Option<String>,
    #[serde(default)]
    pub cost_center_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesParams {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    #[serde(default)]
    pub year: Option<i32>,
}
