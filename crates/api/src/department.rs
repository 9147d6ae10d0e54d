//! Department hierarchy lookup.

use serde::{Deserialize, Serialize};
use weknora_client::HttpClient;
use weknora_core::ApiResult;

pub const DEPARTMENT_PATH: &str = "/api/user/v1/get/department";

/// A department and its children, down to the requested depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: i64,
    pub parent_id: Option<i64>,
    pub department_name: String,
    pub department_level: i32,
    #[serde(default)]
    pub sub_department: Vec<Department>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDepartmentResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Vec<Department>,
}

/// Query parameters; without `department_id` the roots are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    pub query_depth: u32,
}

pub async fn get_department(
    client: &HttpClient,
    query: &DepartmentQuery,
) -> ApiResult<GetDepartmentResponse> {
    client.get_with_query(DEPARTMENT_PATH, query).await
}
