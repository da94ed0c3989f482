use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MatchStatus, Race, Sex};

// -- JWT Claims --

/// JWT claims issued at register/login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: usize,
}

// -- Envelopes --

/// Success body: `{"message": ..., "data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    pub fn success(data: T) -> Self {
        Self::new("success", data)
    }
}

/// Error body: `{"status": "Error", "message": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

/// Body of responses that only echo the affected record.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

/// Id accepted in request bodies either as `"12"` or `12`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
    Number(i64),
    Text(String),
}

impl IdParam {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IdParam::Number(n) => Some(*n),
            IdParam::Text(s) => s.trim().parse().ok(),
        }
    }
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub email: String,
    pub name: String,
    pub access_token: String,
}

// -- Cats --

/// Create/update body. Fields are kept loose so validation can report every
/// problem at once instead of failing on the first serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatPayload {
    pub name: String,
    pub race: String,
    pub sex: String,
    pub age_in_month: i64,
    pub description: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatListQuery {
    pub id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub race: Option<String>,
    pub sex: Option<String>,
    pub has_matched: Option<bool>,
    pub age_in_month: Option<String>,
    pub owned: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatCreatedResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatResponse {
    pub id: String,
    pub name: String,
    pub race: Race,
    pub sex: Sex,
    pub age_in_month: i64,
    pub description: String,
    pub image_urls: Vec<String>,
    pub has_matched: bool,
    pub created_at: DateTime<Utc>,
}

// -- Matches --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub match_cat_id: IdParam,
    pub user_cat_id: IdParam,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchActionRequest {
    pub match_id: IdParam,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreatedResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchApprovedResponse {
    pub id: String,
    pub removed_matches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchIssuer {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: String,
    pub issued_by: MatchIssuer,
    pub match_cat_detail: CatResponse,
    pub user_cat_detail: CatResponse,
    pub message: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_param_accepts_strings_and_numbers() {
        let req: MatchActionRequest = serde_json::from_str(r#"{"matchId":"42"}"#).unwrap();
        assert_eq!(req.match_id.as_i64(), Some(42));

        let req: MatchActionRequest = serde_json::from_str(r#"{"matchId":7}"#).unwrap();
        assert_eq!(req.match_id.as_i64(), Some(7));

        let req: MatchActionRequest = serde_json::from_str(r#"{"matchId":"abc"}"#).unwrap();
        assert_eq!(req.match_id.as_i64(), None);
    }

    #[test]
    fn cat_payload_missing_fields_default() {
        let payload: CatPayload = serde_json::from_str(r#"{"name":"Tom"}"#).unwrap();
        assert_eq!(payload.name, "Tom");
        assert!(payload.image_urls.is_empty());
        assert_eq!(payload.age_in_month, 0);
    }
}
