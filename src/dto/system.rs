use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredFileInfo {
    pub name: String,
    pub size: u64,
    pub url: String,
    pub created: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadsListing {
    pub status: String,
    pub path: String,
    pub files: Vec<StoredFileInfo>,
    pub count: usize,
    pub server_url: String,
}
