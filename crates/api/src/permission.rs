//! Privilege catalogue.

use serde::{Deserialize, Serialize};
use weknora_client::HttpClient;
use weknora_core::ApiResult;

pub const PRIVILEGE_PATH: &str = "/api/user/v1/get/privilege";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub privilege_id: i64,
    pub privilege: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPermissionListResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Vec<Privilege>,
}

pub async fn get_permission_list(client: &HttpClient) -> ApiResult<GetPermissionListResponse> {
    client.get(PRIVILEGE_PATH).await
}
