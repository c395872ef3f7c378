use crate::users::{parse_id, UserRecord, UserStore};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the user records API
#[derive(Clone)]
pub struct UsersAppState {
    pub store: Arc<UserStore>,
}

/// Response for successful deletion
#[derive(Serialize)]
struct DeleteResponse {
    message: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create user records API router. `body_limit` caps JSON request bodies.
pub fn create_users_router(state: Arc<UsersAppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// POST /users - Create a record from a JSON object body
async fn create_user(
    State(state): State<Arc<UsersAppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), UsersError> {
    let fields = object_body(body)?;
    let record = state.store.create(fields).map_err(UsersError::Store)?;

    info!(user_id = %record.id, "User created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /users - List all records
async fn list_users(
    State(state): State<Arc<UsersAppState>>,
) -> Result<Json<Vec<UserRecord>>, UsersError> {
    let records = state.store.list().map_err(UsersError::Store)?;
    Ok(Json(records))
}

/// GET /users/:id - Get one record
async fn get_user(
    State(state): State<Arc<UsersAppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserRecord>, UsersError> {
    let id = parse_id(&id).ok_or(UsersError::InvalidId)?;

    let record = state
        .store
        .get(&id)
        .map_err(UsersError::Store)?
        .ok_or(UsersError::NotFound)?;

    Ok(Json(record))
}

/// PUT /users/:id - Merge the body's fields into an existing record
async fn update_user(
    State(state): State<Arc<UsersAppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserRecord>, UsersError> {
    let id = parse_id(&id).ok_or(UsersError::InvalidId)?;
    let fields = object_body(body)?;

    let record = state
        .store
        .update(&id, fields)
        .map_err(UsersError::Store)?
        .ok_or(UsersError::NotFound)?;

    info!(user_id = %record.id, "User updated");

    Ok(Json(record))
}

/// DELETE /users/:id - Delete a record
async fn delete_user(
    State(state): State<Arc<UsersAppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, UsersError> {
    let id = parse_id(&id).ok_or(UsersError::InvalidId)?;

    if !state.store.delete(&id).map_err(UsersError::Store)? {
        return Err(UsersError::NotFound);
    }

    info!(user_id = %id, "User deleted");

    Ok(Json(DeleteResponse {
        message: "User deleted".to_string(),
    }))
}

/// Unwrap a JSON body that must be an object
fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, UsersError> {
    match body {
        Ok(Json(Value::Object(fields))) => Ok(fields),
        Ok(Json(_)) => Err(UsersError::NotAnObject),
        Err(rejection) => Err(UsersError::BadBody(rejection)),
    }
}

/// User API error types
#[derive(Debug)]
enum UsersError {
    InvalidId,
    NotFound,
    NotAnObject,
    BadBody(JsonRejection),
    Store(anyhow::Error),
}

impl IntoResponse for UsersError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            UsersError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid ID".to_string()),
            UsersError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            UsersError::NotAnObject => (
                StatusCode::BAD_REQUEST,
                "User record must be a JSON object".to_string(),
            ),
            UsersError::BadBody(rejection) => {
                // Oversized bodies keep their 413; every other parse failure is a 400
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, rejection.body_text())
            }
            UsersError::Store(e) => {
                error!(error = %format!("{:#}", e), "User store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
