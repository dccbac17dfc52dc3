//! # server
//!
//! why: serve one peer's replication operations over http
//! relations: wraps rlog-core's BasicPeer, answered by client.rs on the calling side
//! what: route table, handlers, ApiError mapping, bind/serve helpers

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::web::{self, Data, Json};
use actix_web::{App, HttpResponse, HttpServer, ResponseError};
use rlog_core::{BasicPeer, Entry, EntryInfo, Message, Peer, PeerError};
use thiserror::Error;

use crate::wire::{self, EntryRequest, ErrorBody};

/// The peer a server exposes, shared between worker threads
pub type SharedPeer = Arc<Mutex<BasicPeer>>;

/// Errors a handler answers with; always rendered as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.to_string()))
    }
}

/// Register the five peer endpoints, serving `peer`.
pub fn configure(peer: SharedPeer) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(Data::from(peer))
            .app_data(json_config())
            .service(web::resource(wire::FOLLOWERS_COUNT).route(web::get().to(followers_count)))
            .service(web::resource(wire::LOG_COUNT).route(web::get().to(log_count)))
            .service(web::resource(wire::LOG_ENTRY).route(web::post().to(log_entry)))
            .service(web::resource(wire::LOG_ADD_ENTRIES).route(web::post().to(add_entries)))
            .service(web::resource(wire::LOG_SEND).route(web::post().to(send)));
    }
}

/// Bind an http server for `peer`. Must be called inside an actix system.
///
/// Returns the server future together with the addresses actually bound,
/// which differ from `addr` when port 0 is requested.
pub fn bind(peer: SharedPeer, addr: impl ToSocketAddrs) -> io::Result<(Server, Vec<SocketAddr>)> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure(peer.clone()))
    })
    .bind(addr)?;

    let addrs = server.addrs();
    Ok((server.run(), addrs))
}

/// Serve `peer` on `addr` until the server is stopped
pub async fn serve(peer: SharedPeer, addr: impl ToSocketAddrs) -> io::Result<()> {
    let id = lock_id(&peer);
    let (server, addrs) = bind(peer, addr)?;
    tracing::info!(peer = ?id, ?addrs, "serving peer");
    server.await
}

fn lock_id(peer: &SharedPeer) -> Option<u64> {
    peer.lock().ok().map(|p| p.id())
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, req| {
            tracing::warn!(path = req.path(), %err, "cannot decode request body");
            ApiError::BadRequest(err.to_string()).into()
        })
}

/// Run `f` against the peer on the blocking pool.
///
/// A leader's send talks to remote followers synchronously, so no peer
/// operation runs on an async worker. The outer error covers the lock and
/// the pool, the inner one is the peer's own answer.
async fn with_peer<T, F>(peer: Data<Mutex<BasicPeer>>, f: F) -> Result<Result<T, PeerError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut BasicPeer) -> Result<T, PeerError> + Send + 'static,
{
    let peer = peer.into_inner();
    let res = web::block(move || {
        let mut guard = peer
            .lock()
            .map_err(|e| ApiError::Internal(format!("peer lock poisoned: {e}")))?;
        Ok::<_, ApiError>(f(&mut *guard))
    })
    .await;

    match res {
        Ok(inner) => inner,
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

async fn followers_count(peer: Data<Mutex<BasicPeer>>) -> Result<String, ApiError> {
    let count = with_peer(peer, |p| p.peer_count())
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(count.to_string())
}

async fn log_count(peer: Data<Mutex<BasicPeer>>) -> Result<String, ApiError> {
    let count = with_peer(peer, |p| p.log_count())
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(count.to_string())
}

async fn log_entry(
    peer: Data<Mutex<BasicPeer>>,
    req: Json<EntryRequest>,
) -> Result<Json<Entry>, ApiError> {
    let id = req.entry_id;
    let entry = with_peer(peer, move |p| p.entry(id)).await?.map_err(|e| {
        tracing::debug!(entry = id, %e, "entry lookup failed");
        ApiError::BadRequest(format!("unable to retrieve entry with id {id}: {e}"))
    })?;
    Ok(Json(entry))
}

async fn add_entries(
    peer: Data<Mutex<BasicPeer>>,
    body: Json<EntryInfo>,
) -> Result<HttpResponse, ApiError> {
    let info = body.into_inner();
    let commands = info.commands();
    with_peer(peer, move |p| p.add_entries(&info)).await?.map_err(|e| {
        tracing::warn!(%e, "add entries failed");
        ApiError::BadRequest(format!("failed to add entries: {commands}: {e}"))
    })?;
    Ok(HttpResponse::Ok().finish())
}

async fn send(peer: Data<Mutex<BasicPeer>>, body: Json<Message>) -> Result<HttpResponse, ApiError> {
    let msg = body.into_inner();
    let commands = msg.commands();
    with_peer(peer, move |p| p.send(&msg)).await?.map_err(|e| {
        tracing::warn!(%e, "send failed");
        ApiError::BadRequest(format!("failed to send message with entries, {commands}: {e}"))
    })?;
    Ok(HttpResponse::Ok().finish())
}
