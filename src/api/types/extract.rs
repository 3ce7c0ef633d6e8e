//! Extractors that report rejections in the API error format

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::{ApiErrorDetail, ApiErrorResponse, ApiErrorType};

/// JSON body extractor; malformed bodies become `invalid_request_error`
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

/// Query string extractor with the same rejection format as [`Json`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

/// Extraction failure rendered as an API error
#[derive(Debug)]
pub struct ExtractRejection {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ExtractRejection {
    fn into_response(self) -> Response {
        let response = ApiErrorResponse {
            error: ApiErrorDetail {
                message: self.message,
                error_type: ApiErrorType::InvalidRequestError,
                param: None,
                code: Some(self.code.to_string()),
            },
        };

        (self.status, AxumJson(response)).into_response()
    }
}

impl<T: serde::Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ExtractRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ExtractRejection {
                status: rejection.status(),
                code: "json_parse_error",
                message: json_rejection_message(&rejection),
            }),
        }
    }
}

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ExtractRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(ExtractRejection {
                status: StatusCode::BAD_REQUEST,
                code: "invalid_query",
                message: format!("Invalid query string: {}", rejection.body_text()),
            }),
        }
    }
}

fn json_rejection_message(rejection: &axum::extract::rejection::JsonRejection) -> String {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        BytesRejection(err) => format!("Failed to read request body: {}", err.body_text()),
        _ => "Invalid JSON request".to_string(),
    }
}
