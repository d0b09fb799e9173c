//! Typed requests, produced from a validated argument bundle.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Operation;
use super::schema::{self, JsonObject, Violation};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ListAssetsArgs {
    pub project: Option<String>,
    #[serde(default)]
    pub asset_types: Vec<String>,
    pub content_type: String,
    pub page_size: u64,
    pub snapshot: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SearchAssetsArgs {
    pub project: Option<String>,
    pub query: String,
    pub page_size: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AssetHistoryArgs {
    pub project: Option<String>,
    pub asset_name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub content_type: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ServicesArgs {
    pub project: Option<String>,
}

/// A fully validated call, ready for command construction.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetRequest {
    ListAssets(ListAssetsArgs),
    SearchAssets(SearchAssetsArgs),
    GetAssetHistory(AssetHistoryArgs),
    GetProjects,
    GetServices(ServicesArgs),
    GetCurrentProject,
}

impl AssetRequest {
    /// Validate `raw` against the operation's schema and lift it into a typed request.
    pub fn parse(operation: Operation, raw: Option<&JsonObject>) -> Result<Self, Vec<Violation>> {
        let args = schema::validate(operation.descriptor().params, raw)?;
        let request = match operation {
            Operation::ListAssets => AssetRequest::ListAssets(typed(args)?),
            Operation::SearchAssets => AssetRequest::SearchAssets(typed(args)?),
            Operation::GetAssetHistory => AssetRequest::GetAssetHistory(typed(args)?),
            Operation::GetProjects => AssetRequest::GetProjects,
            Operation::GetServices => AssetRequest::GetServices(typed(args)?),
            Operation::GetCurrentProject => AssetRequest::GetCurrentProject,
        };
        Ok(request)
    }

    pub fn operation(&self) -> Operation {
        match self {
            AssetRequest::ListAssets(_) => Operation::ListAssets,
            AssetRequest::SearchAssets(_) => Operation::SearchAssets,
            AssetRequest::GetAssetHistory(_) => Operation::GetAssetHistory,
            AssetRequest::GetProjects => Operation::GetProjects,
            AssetRequest::GetServices(_) => Operation::GetServices,
            AssetRequest::GetCurrentProject => Operation::GetCurrentProject,
        }
    }
}

// The schema check already guarantees the shape; a mismatch here means the
// parameter table and the args struct disagree.
fn typed<T: DeserializeOwned>(args: JsonObject) -> Result<T, Vec<Violation>> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| vec![Violation::new("arguments", e.to_string())])
}
