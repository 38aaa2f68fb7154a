//! # Documento JSON da Base de Conhecimento
//!
//! Modelo serde do arquivo autorado pelos especialistas (ex:
//! `data/sinusitis_kb.json`). O núcleo de inferência não conhece este
//! formato — o [`loader`](super::loader) traduz cada regra para a notação
//! textual e guarda os metadados numa tabela lateral.
//!
//! ## Layout
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "metadata": { "name": "...", "modules": [{ "code": "ACUTE_DIAGNOSIS", "name": "..." }] },
//!   "symptoms":  [{ "variable": "nghet_mui", "label": "Nghẹt mũi" }],
//!   "diseases":  [{ "variable": "viem_xoang_cap", "label": "...", "severity": "Moderate" }],
//!   "rules":     [{ "id": "R006", "module": "...", "premises": ["..."], "conclusion": "...",
//!                  "confidence": 0.85, "notes": "..." }],
//!   "fact_rules": [{ "fact": "sot", "condition": "nhiet_do >= 38" }],
//!   "recommendations": [{ "condition": "viem_xoang_cap", "recommendation": "..." }],
//!   "interview": { "questions": [...], "priority_order": [...], ... }
//! }
//! ```
//!
//! Campos desconhecidos são ignorados; seções opcionais assumem vazio.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raiz do arquivo.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KbDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: KbMetadata,
    #[serde(default)]
    pub symptoms: Vec<SymptomEntry>,
    #[serde(default)]
    pub diseases: Vec<DiseaseEntry>,
    pub rules: Vec<RuleEntry>,
    #[serde(default)]
    pub fact_rules: Vec<FactRuleEntry>,
    #[serde(default)]
    pub recommendations: Vec<RecommendationEntry>,
    #[serde(default)]
    pub interview: InterviewConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KbMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub total_rules: Option<usize>,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

/// Módulo clínico que agrupa regras (ex: `ACUTE_DIAGNOSIS`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymptomEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub variable: String,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiseaseEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub variable: String,
    pub label: String,
    /// `Mild`, `Moderate`, `Severe`, `Critical` ou `Info`.
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub icd10: Option<String>,
}

/// Regra como autorada — premissas em lista, metadados opacos ao motor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    pub premises: Vec<String>,
    pub conclusion: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Mapeia uma condição sobre respostas brutas para um fato inicial.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactRuleEntry {
    pub fact: String,
    pub condition: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub condition: String,
    pub recommendation: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Configuração da entrevista e da escolha do diagnóstico.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Banco ordenado de perguntas (sinais de alarme primeiro).
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Variável perguntada quando ainda não há nenhuma resposta.
    #[serde(default)]
    pub opening: Option<String>,
    /// Fato derivado → variável da pergunta que o alimenta.
    #[serde(default)]
    pub derived_map: BTreeMap<String, String>,
    /// Diagnósticos em ordem de prioridade (o primeiro presente vence).
    #[serde(default)]
    pub priority_order: Vec<String>,
    /// Conclusões cujas regras guiam a escolha da próxima pergunta.
    #[serde(default)]
    pub target_conclusions: Vec<String>,
    /// Diagnóstico → variáveis que precisam estar respondidas antes de concluir.
    #[serde(default)]
    pub refine: BTreeMap<String, Vec<String>>,
    /// Conclusão "negativa" (ex: `khong_phai_viem_xoang`) — não encerra a entrevista.
    #[serde(default)]
    pub negative: Option<String>,
    /// Diagnóstico → módulos cujas regras entram na explicação.
    #[serde(default)]
    pub module_scope: BTreeMap<String, Vec<String>>,
}

/// Tipo de controle da pergunta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Boolean,
    Number,
    Radio,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub variable: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}
