//! Server-sent change notifications.
//!
//! Each frame only says that something changed; clients re-fetch the
//! endpoints they display.

use std::convert::Infallible;

use actix_web::{HttpResponse, Responder, web};
use futures::stream;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::auth::AuthUser;
use crate::notifier::StoreChange;
use crate::state::AppState;

pub fn sse_frame(change: &StoreChange) -> web::Bytes {
    let data = serde_json::to_string(change).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: change\ndata: {data}\n\n"))
}

#[utoipa::path(
    get,
    path = "/api/stream",
    responses(
        (status = 200, description = "text/event-stream of `change` events", content_type = "text/event-stream", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Realtime"
)]
pub async fn changes(_auth: AuthUser, state: web::Data<AppState>) -> impl Responder {
    let receiver = state.notifier.receiver();
    let frames = stream::unfold(receiver, |mut receiver| async move {
        let change = match receiver.recv().await {
            Ok(change) => change,
            Err(RecvError::Lagged(_)) => StoreChange::Resync,
            Err(RecvError::Closed) => return None,
        };
        Some((Ok::<_, Infallible>(sse_frame(&change)), receiver))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(frames)
}
