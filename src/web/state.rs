//! # Estado da Aplicação Web
//!
//! Tudo é montado em `main` antes do servidor subir e compartilhado entre os
//! handlers via `State<AppState>`:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ AppState (Clone)             │
//! │  ├── kb: Arc<MedicalKB>      │  imutável, índice pronto
//! │  ├── store: Arc<ResultStore> │  disco + cache RwLock
//! │  ├── strategy / tie_break    │  da configuração
//! │  └── validation: Arc<Report> │  avisos para /status
//! └──────────────────────────────┘
//! ```

use std::sync::Arc;

use crate::diagnosis::DiagnosisService;
use crate::inference::{Strategy, TieBreak};
use crate::medical::{MedicalKnowledgeBase, ValidationReport};
use crate::persistence::ResultStore;

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    /// Base médica carregada no startup (somente leitura).
    pub kb: Arc<MedicalKnowledgeBase>,
    /// Laudos por sessão.
    pub store: Arc<ResultStore>,
    pub strategy: Strategy,
    pub tie_break: TieBreak,
    /// Resultado da validação feita no startup.
    pub validation: Arc<ValidationReport>,
}

impl AppState {
    pub fn new(
        kb: Arc<MedicalKnowledgeBase>,
        store: Arc<ResultStore>,
        strategy: Strategy,
        tie_break: TieBreak,
    ) -> Self {
        let validation = Arc::new(kb.validate());
        Self {
            kb,
            store,
            strategy,
            tie_break,
            validation,
        }
    }

    /// Serviço de diagnóstico configurado com a estratégia do servidor.
    pub fn diagnosis(&self) -> DiagnosisService<'_> {
        DiagnosisService::new(&self.kb, self.strategy, self.tie_break)
    }
}
