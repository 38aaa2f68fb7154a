#![allow(dead_code)]
#![allow(rustdoc::broken_intra_doc_links)]
//! # Diagnostic Advisor — Sinusite
//!
//! **Ponto de entrada principal** do advisor.
//!
//! Um sistema especialista de encadeamento progressivo: respostas do
//! paciente viram fatos, fatos disparam regras proposicionais
//! (`a ^ b -> c`), e a conclusão priorizada vira um laudo explicado.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging (RUST_LOG, padrão "info")
//!   ├── Lê AppConfig do ambiente (ADVISOR_*)
//!   ├── Carrega e indexa a base médica (falha → processo encerra)
//!   ├── Valida a base (erros e avisos vão para o log)
//!   ├── Monta AppState (base + ResultStore) e Router
//!   └── Inicia servidor TCP
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! cargo run
//!
//! # Outra base, estratégia FIFO, logs detalhados
//! ADVISOR_KB_PATH=minha_base.json ADVISOR_STRATEGY=queue RUST_LOG=debug cargo run
//! ```

/// Módulo `core` — átomos, regras e a base de conhecimento proposicional.
mod core;

/// Módulo `inference` — índice de regras e motor de encadeamento progressivo.
mod inference;

/// Módulo `medical` — documento JSON da base, respostas, condições e validação.
mod medical;

/// Módulo `diagnosis` — do conjunto de respostas ao laudo; entrevista adaptativa.
mod diagnosis;

/// Módulo `persistence` — laudos por sessão em disco.
mod persistence;

/// Módulo `config` — configuração via variáveis de ambiente.
mod config;

/// Módulo `web` — servidor axum, handlers HTTP e templates.
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::medical::MedicalKnowledgeBase;
use crate::persistence::ResultStore;
use crate::web::state::AppState;

/// Sobe o advisor.
///
/// # Erros
///
/// Retorna erro se a configuração for inválida, se a base não puder ser
/// carregada (arquivo ausente, JSON inválido, regra malformada), ou se o
/// bind no endereço configurado falhar.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🩺 Diagnostic Advisor — Starting...");

    let config = AppConfig::from_env()?;

    let kb = MedicalKnowledgeBase::load(&config.kb_path).with_context(|| {
        format!(
            "Falha ao carregar a base médica de {}",
            config.kb_path.display()
        )
    })?;

    let state = AppState::new(
        Arc::new(kb),
        Arc::new(ResultStore::new(&config.results_dir)),
        config.strategy,
        config.tie_break,
    );

    let validation = &state.validation;
    for error in &validation.errors {
        tracing::error!("{}", error);
    }
    if !validation.valid {
        tracing::warn!(
            errors = validation.errors.len(),
            "Base carregada com erros de validação"
        );
    }

    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao fazer bind em {}", config.bind_addr))?;
    tracing::info!(
        strategy = config.strategy.as_str(),
        tie_break = config.tie_break.as_str(),
        "🚀 Server running at http://{}",
        config.bind_addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
