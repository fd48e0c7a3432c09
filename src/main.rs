use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Path as UrlPath, State},
    http::{Response, StatusCode},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use cards::CardCatalog;
use draft::{server::DraftServer, DraftConfig};
use status::{Code, Status};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

mod cards;
mod deckcode;
mod draft;
mod status;

pub use status::{err, Res};

const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(serde::Serialize)]
struct Resp {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<Code>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

impl Resp {
    fn axum(self, status: StatusCode) -> Response<String> {
        match serde_json::ser::to_string(&self) {
            Ok(body) => {
                let mut resp = Response::new(body);
                *resp.status_mut() = status;
                resp
            }
            Err(e) => {
                let mut resp = Response::new(format!("Failed to JSON encode response: {e}"));
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            }
        }
    }

    fn failure<S: ToString>(message: S, code: Code) -> Response<String> {
        Self {
            success: false,
            message: message.to_string(),
            code: Some(code),
            value: None,
        }
        .axum(http_status(code))
    }

    fn ok<S: ToString>(message: S) -> Response<String> {
        Self {
            success: true,
            message: message.to_string(),
            code: None,
            value: None,
        }
        .axum(StatusCode::OK)
    }

    fn value<S: ToString, T: serde::Serialize>(message: S, value: &T) -> Response<String> {
        match serde_json::to_value(value) {
            Ok(value) => Self {
                success: true,
                message: message.to_string(),
                code: None,
                value: Some(value),
            }
            .axum(StatusCode::OK),
            Err(e) => Self::e500(format!("Failed to JSON encode value: {e}")),
        }
    }

    fn status(status: &Status) -> Response<String> {
        Self::failure(&status.message, status.code)
    }

    fn e500<S: ToString>(message: S) -> Response<String> {
        Self::failure(message, Code::InternalServerError)
    }

    fn e422<S: ToString>(message: S) -> Response<String> {
        Self::failure(message, Code::InvalidClientReq)
    }
}

fn http_status(code: Code) -> StatusCode {
    match code {
        Code::InvalidClientReq
        | Code::InvalidDeckCode
        | Code::NotPendingCard
        | Code::IncorrectNumChosenCards
        | Code::IllegalCardCombination => StatusCode::UNPROCESSABLE_ENTITY,
        Code::NotInDraftSession => StatusCode::NOT_FOUND,
        Code::InvalidStateTransition
        | Code::NotWaitingForCardSelection
        | Code::DraftComplete
        | Code::RoundInFlight => StatusCode::CONFLICT,
        Code::MaxRedrawsExceeded | Code::NoEligibleCards => StatusCode::SERVICE_UNAVAILABLE,
        Code::InternalServerError | Code::FileReadError | Code::InvalidSetPackFormat => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn join_handler(State(server): State<Arc<DraftServer>>, body: Bytes) -> Response<String> {
    draft::handlers::handle_join(server, body)
}

async fn current_handler(
    State(server): State<Arc<DraftServer>>,
    UrlPath(id): UrlPath<String>,
) -> Response<String> {
    draft::handlers::handle_current(server, &id)
}

async fn pool_handler(
    State(server): State<Arc<DraftServer>>,
    UrlPath(id): UrlPath<String>,
) -> Response<String> {
    draft::handlers::handle_next_pool(server, &id)
}

async fn choose_handler(
    State(server): State<Arc<DraftServer>>,
    UrlPath(id): UrlPath<String>,
    body: Bytes,
) -> Response<String> {
    draft::handlers::handle_choose(server, &id, body)
}

async fn close_handler(
    State(server): State<Arc<DraftServer>>,
    UrlPath(id): UrlPath<String>,
) -> Response<String> {
    draft::handlers::handle_close(server, &id)
}

async fn decode_handler(
    State(server): State<Arc<DraftServer>>,
    UrlPath(code): UrlPath<String>,
) -> Response<String> {
    draft::handlers::handle_decode(server, &code)
}

async fn evict_idle_sessions(server: Arc<DraftServer>) {
    let mut interval = tokio::time::interval(EVICTION_INTERVAL);
    loop {
        interval.tick().await;
        match server.evict_idle(Instant::now()) {
            Ok(0) => {}
            Ok(n) => tracing::info!("Discarded {n} idle draft sessions."),
            Err(e) => tracing::error!("Failed to discard idle sessions: {e}"),
        }
    }
}

async fn load_catalog(data: &Path) -> Res<CardCatalog> {
    let cards = cards::setpack::load_cards(data).await?;
    tracing::debug!("Inserting set pack data to card catalog.");
    let mut catalog = CardCatalog::new();
    for card in cards {
        catalog.add(card);
    }
    tracing::debug!(
        "Succesfully populated card catalog with {} cards.",
        catalog.size()
    );
    Ok(catalog)
}

#[tokio::main]
async fn main() {
    const USAGE: &str = "Usage: lor-draft <static path> <data path> <port>";

    let content = std::env::args().nth(1).expect(USAGE);
    let data = std::env::args().nth(2).expect(USAGE);
    let port = std::env::args()
        .nth(3)
        .map(|s| s.parse::<u16>().expect(&format!("Invalid port number: {s}")))
        .expect(USAGE);

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let catalog = match load_catalog(&PathBuf::from(data)).await {
        Ok(catalog) => catalog,
        Err(e) => panic!("Failed to load card catalog: {e}"),
    };
    let server = Arc::new(DraftServer::new(Arc::new(catalog), DraftConfig::new()));
    tokio::spawn(evict_idle_sessions(server.clone()));

    let app = Router::new()
        .fallback_service(ServeDir::new(content).append_index_html_on_directories(true))
        .route("/api/draft", post(join_handler))
        .route("/api/draft/:id", get(current_handler).delete(close_handler))
        .route("/api/draft/:id/pool", post(pool_handler))
        .route("/api/draft/:id/choose", post(choose_handler))
        .route("/api/deckcode/:code", get(decode_handler))
        .with_state(server)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect(&format!("Failed to open port {port}"));

    tracing::info!("Listening on port {port}.");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Closed due to error: {e}");
    }
}
