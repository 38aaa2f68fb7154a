//! # Handlers HTTP — Os Endpoints do Advisor
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`].
//!
//! ## Padrão de Resposta
//!
//! | Handler | Método | Retorno | Uso |
//! |---------|--------|---------|-----|
//! | `index` | GET | HTML completo | Página inicial + entrevista |
//! | `status` | GET | JSON | Base carregada? avisos da validação |
//! | `diagnose` | POST | JSON | Respostas completas → laudo salvo |
//! | `next_question` | POST | JSON | Próxima pergunta ou laudo |
//! | `result_json` | GET | JSON | Laudo salvo |
//! | `results_page` | GET | HTML completo | Laudo com explicações |
//! | `infer` | POST | JSON | Inferência bruta sobre a base carregada |
//!
//! ## Erros
//!
//! Falhas viram `{ "ok": false, "error": "..." }` com o status adequado
//! ([`ApiError`]). Erros internos do núcleo nunca chegam crus ao usuário.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::AppState;
use super::templates;
use crate::core::{fact_set, FactSet, ParseModeError};
use crate::diagnosis::{AskReason, DiagnosisReport, InterviewStep, Severity};
use crate::inference::{ForwardInferencer, InferenceResult, Strategy, TieBreak};
use crate::medical::document::Question;
use crate::medical::AnswerMap;
use crate::persistence::is_valid_session_id;

/// Erro de API serializado como `{ ok: false, error }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("requisição inválida: {0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidMode(#[from] ParseModeError),

    #[error("laudo não encontrado: {0}")]
    NotFound(String),

    #[error("erro interno: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidMode(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Falha ao atender requisição");
        }
        let body = ErrorResponse {
            ok: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Converte Maud Markup em resposta Html<String> do Axum.
fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

fn result_url(session_id: &str) -> String {
    format!("/results/{}", session_id)
}

// ─── Tipos de requisição/resposta ────────────────────────────────

/// Corpo de `/api/diagnose` e `/api/next_question`.
#[derive(Deserialize)]
pub struct AnswersRequest {
    #[serde(default)]
    pub answers: AnswerMap,
}

/// Resposta do endpoint `/status`.
#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    /// `true` quando a base carregou e a validação não achou erros.
    pub ready: bool,
    pub kb_name: String,
    pub version: String,
    pub rules: usize,
    pub diseases: usize,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct DiagnoseResponse {
    pub ok: bool,
    pub session_id: String,
    pub result_url: String,
    pub report: DiagnosisReport,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Summary {
    pub label: String,
    pub severity: Severity,
}

/// Resposta de `/api/next_question`: ou `question`, ou `result_url`.
#[derive(Serialize)]
pub struct NextQuestionResponse {
    pub ok: bool,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AskReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

/// Corpo de `/api/infer`.
#[derive(Deserialize)]
pub struct InferRequest {
    pub facts: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub tie_break: Option<String>,
}

/// Resposta de `/api/infer`: o resultado bruto mais os objetivos atingidos.
#[derive(Serialize)]
pub struct InferResponse {
    #[serde(flatten)]
    pub result: InferenceResult,
    pub reached_goals: FactSet,
}

// ─── Páginas HTML ────────────────────────────────────────────────

/// GET `/` — Página inicial com metadados da base e a entrevista.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    markup_to_html(templates::landing_page(&state.kb, &state.validation))
}

/// GET `/results/{session_id}` — Laudo renderizado com as explicações.
pub async fn results_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Html<String>) {
    match load_report(&state, &session_id) {
        Ok(report) => (
            StatusCode::OK,
            markup_to_html(templates::results_page(&report, &state.kb)),
        ),
        Err(e) => (
            e.status_code(),
            markup_to_html(templates::error_page(&e.to_string())),
        ),
    }
}

// ─── API JSON ────────────────────────────────────────────────────

/// GET `/status` — Estado da base carregada.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = &state.validation;
    Json(StatusResponse {
        ready: report.valid,
        kb_name: state.kb.name().to_string(),
        version: state.kb.document().version.clone(),
        rules: report.total_rules,
        diseases: report.total_diseases,
        warnings: report.warnings.clone(),
    })
}

/// POST `/api/diagnose` — Diagnóstico completo a partir das respostas.
///
/// O laudo é salvo antes da resposta; a página fica em `result_url`.
pub async fn diagnose(
    State(state): State<AppState>,
    payload: Result<Json<AnswersRequest>, JsonRejection>,
) -> Result<Json<DiagnoseResponse>, ApiError> {
    let Json(request) = payload?;
    let report = state.diagnosis().diagnose(&request.answers);
    save_report(&state, &report)?;

    Ok(Json(DiagnoseResponse {
        ok: true,
        session_id: report.session_id.clone(),
        result_url: result_url(&report.session_id),
        report,
    }))
}

/// POST `/api/next_question` — Próximo passo da entrevista.
///
/// Quando a entrevista termina (parada antecipada ou banco esgotado), o
/// laudo é salvo e a resposta traz `result_url` + resumo.
pub async fn next_question(
    State(state): State<AppState>,
    payload: Result<Json<AnswersRequest>, JsonRejection>,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let Json(request) = payload?;

    let response = match state.diagnosis().next_question(&request.answers) {
        InterviewStep::Ask { question, reason } => NextQuestionResponse {
            ok: true,
            done: false,
            question: Some(question),
            reason: Some(reason),
            early: None,
            session_id: None,
            result_url: None,
            summary: None,
        },
        InterviewStep::Done { early, report } => {
            save_report(&state, &report)?;
            NextQuestionResponse {
                ok: true,
                done: true,
                question: None,
                reason: None,
                early: Some(early),
                result_url: Some(result_url(&report.session_id)),
                session_id: Some(report.session_id.clone()),
                summary: Some(Summary {
                    label: report.diagnosis.disease_label.clone(),
                    severity: report.diagnosis.severity,
                }),
            }
        }
    };
    Ok(Json(response))
}

/// GET `/api/results/{session_id}` — Laudo salvo em JSON.
pub async fn result_json(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DiagnosisReport>, ApiError> {
    load_report(&state, &session_id).map(Json)
}

/// POST `/api/infer` — Encadeamento progressivo bruto sobre a base carregada.
///
/// Sem `strategy`/`tie_break`, usa os modos configurados no servidor.
pub async fn infer(
    State(state): State<AppState>,
    payload: Result<Json<InferRequest>, JsonRejection>,
) -> Result<Json<InferResponse>, ApiError> {
    let Json(request) = payload?;

    let strategy = match request.strategy.as_deref() {
        Some(raw) => raw.parse::<Strategy>()?,
        None => state.strategy,
    };
    let tie_break = match request.tie_break.as_deref() {
        Some(raw) => raw.parse::<TieBreak>()?,
        None => state.tie_break,
    };

    let facts = fact_set(request.facts.iter().map(|f| f.trim()).filter(|f| !f.is_empty()));
    let goals = fact_set(request.goals.iter().map(|g| g.trim()).filter(|g| !g.is_empty()));

    let result = ForwardInferencer::infer_with_index(
        state.kb.knowledge_base(),
        state.kb.index(),
        &facts,
        &goals,
        strategy,
        tie_break,
    );
    let reached_goals = result.reached_goals();
    Ok(Json(InferResponse {
        result,
        reached_goals,
    }))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn save_report(state: &AppState, report: &DiagnosisReport) -> Result<(), ApiError> {
    state
        .store
        .save(report)
        .map(|_| ())
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))
}

fn load_report(state: &AppState, session_id: &str) -> Result<DiagnosisReport, ApiError> {
    if !is_valid_session_id(session_id) {
        return Err(ApiError::BadRequest(format!(
            "session_id inválido: {:?}",
            session_id
        )));
    }
    match state.store.load(session_id) {
        Ok(Some(report)) => Ok(report),
        Ok(None) => Err(ApiError::NotFound(session_id.to_string())),
        Err(e) => Err(ApiError::Internal(format!("{:#}", e))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::medical::test_support::sinusitis_kb;
    use crate::persistence::ResultStore;
    use crate::web::create_router;

    fn app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            Arc::new(sinusitis_kb()),
            Arc::new(ResultStore::new(dir.path())),
            Strategy::Stack,
            TieBreak::Min,
        );
        (create_router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn viral_answers() -> Value {
        json!({
            "answers": {
                "thoi_gian_trieu_chung": 5,
                "loai_dich_mui": "Trong, loãng",
                "nghet_mui": true,
                "dau_vung_xoang_ham": true
            }
        })
    }

    #[tokio::test]
    async fn status_reports_loaded_base() {
        let (app, _dir) = app();
        let (status, body) = send(&app, get("/status")).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert!(parsed.ready);
        assert_eq!(parsed.kb_name, "Sinusitis KB");
        assert_eq!(parsed.rules, 20);
        assert!(parsed.warnings.is_empty());
    }

    #[tokio::test]
    async fn index_renders() {
        let (app, _dir) = app();
        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Sinusitis KB"));
    }

    #[tokio::test]
    async fn diagnose_persists_and_serves_report() {
        let (app, _dir) = app();
        let (status, body) = send(&app, post_json("/api/diagnose", viral_answers())).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["ok"], true);
        assert_eq!(parsed["report"]["diagnosis"]["disease"], "viem_xoang_cap_do_virus");
        let session_id = parsed["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get(&format!("/api/results/{}", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        let stored: DiagnosisReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(stored.session_id, session_id);
        assert_eq!(stored.diagnosis.severity, Severity::Low);

        let (status, body) = send(&app, get(&format!("/results/{}", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Viêm xoang cấp do virus"));
        assert!(html.contains("R006"));
    }

    #[tokio::test]
    async fn next_question_opens_then_concludes() {
        let (app, _dir) = app();

        let (status, body) = send(&app, post_json("/api/next_question", json!({ "answers": {} }))).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["done"], false);
        assert_eq!(parsed["question"]["variable"], "thoi_gian_trieu_chung");
        assert_eq!(parsed["question"]["type"], "number");
        assert_eq!(parsed["reason"]["kind"], "opening");

        let (status, body) = send(&app, post_json("/api/next_question", viral_answers())).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["done"], true);
        assert_eq!(parsed["early"], true);
        assert_eq!(parsed["summary"]["severity"], "low");
        let url = parsed["result_url"].as_str().unwrap().to_string();

        let (status, _) = send(&app, get(&url)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_answers_are_bad_request() {
        let (app, _dir) = app();
        let (status, body) = send(
            &app,
            post_json("/api/diagnose", json!({ "answers": { "ho": [true] } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["ok"], false);
        assert!(parsed["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_and_invalid_sessions() {
        let (app, _dir) = app();
        let (status, _) = send(&app, get("/api/results/deadbeef")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/api/results/not-a-session")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, get("/results/deadbeef")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(String::from_utf8(body).unwrap().contains("deadbeef"));
    }

    #[tokio::test]
    async fn raw_inference_stops_at_goal() {
        let (app, _dir) = app();
        let (status, body) = send(
            &app,
            post_json(
                "/api/infer",
                json!({
                    "facts": ["trieu_chung_duoi_10_ngay", "chay_mui_trong", "nghet_mui", "dau_nang_mat"],
                    "goals": ["viem_xoang_cap"],
                    "strategy": "queue"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result: InferenceResult = serde_json::from_slice(&body).unwrap();
        assert!(result.success());
        assert!(result.early_stopped());
        assert!(result.final_facts().contains("viem_xoang_cap"));
        // parou antes de refinar a etiologia
        assert!(!result.final_facts().contains("viem_xoang_cap_do_virus"));

        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["reached_goals"], json!(["viem_xoang_cap"]));
    }

    #[tokio::test]
    async fn raw_inference_rejects_unknown_strategy() {
        let (app, _dir) = app();
        let (status, body) = send(
            &app,
            post_json("/api/infer", json!({ "facts": ["a"], "strategy": "dfs" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("dfs"));
    }
}
