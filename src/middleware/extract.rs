use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// `Query<T>` whose rejection is rendered as an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e.body_text())))
    }
}

/// Parse a JSON request body. Called after authorization so a forbidden
/// caller never sees body validation errors.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return serde_json::from_slice(b"{}").map_err(body_error);
    }
    serde_json::from_slice(body).map_err(body_error)
}

fn body_error(err: serde_json::Error) -> ApiError {
    use serde_json::error::Category;

    match err.classify() {
        Category::Syntax | Category::Eof | Category::Io => {
            ApiError::invalid_json(format!("Malformed JSON body: {}", err))
        }
        Category::Data => ApiError::bad_request(format!("Invalid request body: {}", err)),
    }
}

/// Parse a path or query id.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        name: String,
    }

    #[test]
    fn empty_body_uses_defaults() {
        let payload: Payload = parse_body(&Bytes::new()).unwrap();
        assert_eq!(payload.name, "");
    }

    #[test]
    fn malformed_json_is_invalid_json() {
        let err = parse_body::<Payload>(&Bytes::from_static(b"{\"name\":")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidJson(_)));
    }

    #[test]
    fn wrong_types_are_bad_requests() {
        let err = parse_body::<Payload>(&Bytes::from_static(b"{\"name\": 5}")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn ids_must_be_uuids() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
