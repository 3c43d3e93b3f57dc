use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection,
        rejection::QueryRejection,
        FromRequest, FromRequestParts, Multipart, Query, Request,
    },
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;

/// Query string extractor that answers with the standard error envelope
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppQueryRejection(rejection)),
        }
    }
}

pub struct AppQueryRejection(QueryRejection);

impl IntoResponse for AppQueryRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                format!("Invalid query parameters: {}", err.body_text())
            }
            _ => "Failed to parse query string".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Multipart extractor that answers with the standard error envelope
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppMultipartRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Multipart::from_request(req, state).await {
            Ok(multipart) => Ok(Self(multipart)),
            Err(rejection) => Err(AppMultipartRejection(rejection)),
        }
    }
}

pub struct AppMultipartRejection(MultipartRejection);

impl IntoResponse for AppMultipartRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            MultipartRejection::InvalidBoundary(err) => {
                format!("Expected a multipart/form-data request: {}", err.body_text())
            }
            _ => "Failed to parse multipart body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}
