//! # Módulo Web — A Interface do Advisor
//!
//! Camada web construída com **Axum** + **Maud**.
//!
//! ## Arquitetura Web
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Browser (entrevista em JS inline)                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                                    │
//! │  ├── GET  /                         → index + entrevista     │
//! │  ├── GET  /results/{session_id}     → laudo HTML             │
//! │  ├── GET  /status                   → JSON: base pronta?     │
//! │  ├── POST /api/diagnose             → JSON: laudo completo   │
//! │  ├── POST /api/next_question        → JSON: pergunta ou fim  │
//! │  ├── GET  /api/results/{session_id} → JSON: laudo salvo      │
//! │  └── POST /api/infer                → JSON: inferência bruta │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Static Assets (tower_http::ServeDir → /assets/)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`) |
//! | [`handlers`] | Handlers Axum e `ApiError` |
//! | [`templates`] | Templates Maud (HTML server-side) |

pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
///
/// O estado `AppState` é compartilhado entre todos os handlers via
/// extrator `State<AppState>`. Cada requisição passa pelo `TraceLayer`
/// (span `tracing` por requisição) e por um CORS permissivo, para que a
/// API JSON possa ser chamada de outra origem.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── Páginas HTML ──────────────────────────────────────
        .route("/", get(handlers::index))
        .route("/results/{session_id}", get(handlers::results_page))
        // ── API JSON ──────────────────────────────────────────
        .route("/status", get(handlers::status))
        .route("/api/diagnose", post(handlers::diagnose))
        .route("/api/next_question", post(handlers::next_question))
        .route("/api/results/{session_id}", get(handlers::result_json))
        .route("/api/infer", post(handlers::infer))
        // ── Arquivos estáticos ────────────────────────────────
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
