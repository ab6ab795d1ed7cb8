use crate::dispatch::NotificationDispatcher;
use crate::storage::{MediaStorage, StorageError, UploadValidationError};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use openbook_common::config::OpenbookConfig;
use openbook_common::model::post::{CommentMarker, PostMarker};
use openbook_common::model::{Id, ModelValidationError};
use openbook_db::client::{DbClient, DbError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod actor;
mod json;
mod routes;

pub use actor::{ACTOR_HEADER, Actor};

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub storage: Arc<MediaStorage>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub config: Arc<OpenbookConfig>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Multipart body rejected: {0}")]
    Multipart(#[from] MultipartError),
    #[error("The {0} header is missing.")]
    MissingActorHeader(&'static str),
    #[error("The {0} header is not a valid user id.")]
    InvalidActorHeader(&'static str),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Malformed field: {0}")]
    MalformedField(&'static str),
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Upload(#[from] UploadValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Only the creator may edit post {0}.")]
    NotPostCreator(Id<PostMarker>),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
}

impl ServerError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MissingActorHeader(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotPostCreator(_) => StatusCode::FORBIDDEN,
            ServerError::InvalidActorHeader(_)
            | ServerError::JsonRejection(_)
            | ServerError::Multipart(_)
            | ServerError::MissingField(_)
            | ServerError::MalformedField(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Upload(UploadValidationError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServerError::Upload(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::JsonResponse(_)
            | ServerError::Storage(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}
