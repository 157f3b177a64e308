use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::error::GameError;
use crate::store::{CreateRoomRequest, MemoryRoomStore, RoomEnvelope, RoomStore};

/// Largest room document the local store accepts
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// All room store routes under `/api/rooms`, plus `/health`
pub fn routes(
    store: Arc<MemoryRoomStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    create_room(store.clone())
        .or(get_room(store.clone()))
        .or(replace_room(store))
        .or(health_check())
}

/// `POST /api/rooms`
pub fn create_room(
    store: Arc<MemoryRoomStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "rooms")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_store(store))
        .and_then(handle_create)
}

/// `GET /api/rooms/{room_id}`
pub fn get_room(
    store: Arc<MemoryRoomStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "rooms" / String)
        .and(warp::get())
        .and(with_store(store))
        .and_then(handle_get)
}

/// `PUT /api/rooms/{room_id}`
pub fn replace_room(
    store: Arc<MemoryRoomStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "rooms" / String)
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_store(store))
        .and_then(handle_replace)
}

pub fn health_check() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("health")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&serde_json::json!({
                "status": "healthy",
                "service": "Room Store",
                "version": env!("CARGO_PKG_VERSION")
            }))
        })
}

async fn handle_create(
    request: CreateRoomRequest,
    store: Arc<MemoryRoomStore>,
) -> Result<Response, Infallible> {
    match store.create(&request.initial_state).await {
        Ok(created) => Ok(warp::reply::with_status(
            warp::reply::json(&created),
            StatusCode::CREATED,
        )
        .into_response()),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_get(room_id: String, store: Arc<MemoryRoomStore>) -> Result<Response, Infallible> {
    match store.fetch(&room_id).await {
        Ok(game_state) => Ok(warp::reply::json(&RoomEnvelope { game_state }).into_response()),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_replace(
    room_id: String,
    envelope: RoomEnvelope,
    store: Arc<MemoryRoomStore>,
) -> Result<Response, Infallible> {
    match store.replace(&room_id, &envelope.game_state).await {
        Ok(()) => Ok(warp::reply::json(&envelope).into_response()),
        Err(e) => Ok(error_reply(&e)),
    }
}

fn error_reply(error: &GameError) -> Response {
    let status = match error {
        GameError::RoomNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %error, "Room store request failed");
    }

    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": error.to_string() })),
        status,
    )
    .into_response()
}

fn with_store(
    store: Arc<MemoryRoomStore>,
) -> impl Filter<Extract = (Arc<MemoryRoomStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}
