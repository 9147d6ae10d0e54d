//! Authentication, account and user-management endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use weknora_client::HttpClient;
use weknora_core::{ApiResult, ErrorEnvelope};
use weknora_session::{NewSession, SessionKey, SessionStore};

use crate::reply::{ApiReply, CodeMessage};

pub const LOGIN_PATH: &str = "/api/user/v1/login";
pub const LOGOUT_PATH: &str = "/api/user/v1/logout";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const CURRENT_USER_PATH: &str = "/api/v1/auth/me";
pub const CURRENT_TENANT_PATH: &str = "/api/v1/auth/tenant";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub const VALIDATE_PATH: &str = "/api/v1/auth/validate";
pub const USER_LIST_PATH: &str = "/api/user/v1/get/user";
pub const DELETE_USER_PATH: &str = "/api/user/v1/del/user";
pub const UPDATE_USER_PATH: &str = "/api/user/v1/update/user";

/// Row of the user-management list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub account: String,
    pub department_name: String,
    pub privilege: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub account: String,
    pub user_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub user_id: String,
    pub account: String,
    pub user_name: Option<String>,
    pub department_name: Option<String>,
    pub privilege: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: LoginData,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTenant {
    pub id: String,
    pub name: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    pub user: RegisteredUser,
    pub tenant: RegisteredTenant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub tenant_id: String,
    pub can_access_all_tenants: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tenant_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub document_count: Option<u64>,
    pub chunk_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub status: Option<String>,
    pub business: Option<String>,
    pub owner_id: String,
    pub storage_quota: Option<u64>,
    pub storage_used: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
    pub knowledge_bases: Option<Vec<KnowledgeBaseInfo>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: UserInfo,
    pub tenant: TenantInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    #[serde(default)]
    pub success: bool,
    pub valid: Option<bool>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    success: bool,
    access_token: Option<String>,
    refresh_token: Option<String>,
    message: Option<String>,
}

/// Authenticate. A 401 comes back as an envelope with the credentials
/// message and leaves any existing session alone.
pub async fn login(client: &HttpClient, request: &LoginRequest) -> ApiResult<LoginResponse> {
    client.post(LOGIN_PATH, request).await
}

/// Log in and persist the returned token and profile in the client's session.
pub async fn sign_in(client: &HttpClient, request: &LoginRequest) -> ApiResult<LoginResponse> {
    let response = login(client, request).await?;

    let Some(token) = response.access_token.clone().filter(|t| !t.is_empty()) else {
        return Err(ErrorEnvelope::decode("login response carried no access token"));
    };

    let session = NewSession {
        token,
        refresh_token: None,
        user: serde_json::to_value(&response.data).ok(),
        tenant: None,
    };
    client.session().establish(&session).map_err(|err| {
        tracing::error!(error = %err, "failed to persist session");
        ErrorEnvelope::encode(format!("failed to persist session: {err}"))
    })?;

    tracing::info!(user_id = %response.data.user_id, "signed in");
    Ok(response)
}

/// Store the default tenant returned by [`get_current_user`] so tenant
/// selection can be compared against it.
pub fn remember_default_tenant(client: &HttpClient, tenant: &TenantInfo) -> ApiResult<()> {
    let value = serde_json::to_string(tenant)
        .map_err(|e| ErrorEnvelope::encode(format!("failed to serialize tenant: {e}")))?;
    client
        .session()
        .set(SessionKey::Tenant, &value)
        .map_err(|e| ErrorEnvelope::encode(format!("failed to persist tenant: {e}")))
}

pub async fn register(client: &HttpClient, request: &RegisterRequest) -> ApiReply<RegisterData> {
    client
        .post(REGISTER_PATH, request)
        .await
        .unwrap_or_else(ApiReply::from)
}

pub async fn get_current_user(client: &HttpClient) -> ApiReply<CurrentUser> {
    client
        .get(CURRENT_USER_PATH)
        .await
        .unwrap_or_else(ApiReply::from)
}

pub async fn get_current_tenant(client: &HttpClient) -> ApiReply<TenantInfo> {
    client
        .get(CURRENT_TENANT_PATH)
        .await
        .unwrap_or_else(ApiReply::from)
}

/// Exchange a refresh token. A successful reply counts only when it carries
/// at least one of the two tokens.
pub async fn refresh_token(client: &HttpClient, refresh_token: &str) -> ApiReply<TokenPair> {
    let body = json!({ "refreshToken": refresh_token });
    let response: RefreshResponse = match client.post(REFRESH_PATH, &body).await {
        Ok(response) => response,
        Err(err) => return err.into(),
    };

    let pair = TokenPair {
        token: response.access_token.filter(|t| !t.is_empty()),
        refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
    };
    if response.success && (pair.token.is_some() || pair.refresh_token.is_some()) {
        return ApiReply::ok(pair);
    }

    ApiReply::failed(
        response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "token refresh failed".to_string()),
    )
}

/// Tell the backend the session is over; the local session is cleared
/// whatever the backend answers.
pub async fn logout(client: &HttpClient) -> ApiResult<ApiReply<Value>> {
    let result = client.post(LOGOUT_PATH, &json!({})).await;

    if let Err(err) = client.session().clear() {
        tracing::error!(error = %err, "failed to clear session on logout");
    }
    result
}

pub async fn validate_token(client: &HttpClient) -> TokenValidation {
    client
        .get(VALIDATE_PATH)
        .await
        .unwrap_or_else(|err: ErrorEnvelope| TokenValidation {
            success: false,
            valid: Some(false),
            message: Some(err.message().to_string()),
        })
}

pub async fn get_user_list(client: &HttpClient) -> ApiResult<UserListResponse> {
    client.get(USER_LIST_PATH).await
}

pub async fn delete_user(client: &HttpClient, user_id: &str) -> ApiResult<CodeMessage> {
    client
        .post(DELETE_USER_PATH, &json!({ "user_id": user_id }))
        .await
}

pub async fn update_user(
    client: &HttpClient,
    user_id: &str,
    department_id: i64,
    privilege_id: i64,
) -> ApiResult<CodeMessage> {
    let body = json!({
        "user_id": user_id,
        "department_id": department_id,
        "privilege_id": privilege_id,
    });
    client.post(UPDATE_USER_PATH, &body).await
}
