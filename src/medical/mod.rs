//! # Módulo Medical — Base Clínica sobre o Núcleo de Regras
//!
//! O núcleo ([`crate::core`] + [`crate::inference`]) só conhece átomos e
//! regras. Este módulo acrescenta o que é específico do domínio:
//!
//! | Sub-módulo | Papel |
//! |------------|-------|
//! | [`document`] | modelo serde do arquivo JSON autorado |
//! | [`loader`] | traduz o documento para o núcleo + tabela lateral de metadados |
//! | [`validator`] | variáveis desconhecidas, conflitos, duplicatas |
//! | [`answers`] | respostas tipadas do paciente |
//! | [`condition`] | expressões `nhiet_do >= 38 && ...` das `fact_rules` |
//! | [`facts`] | respostas → fatos iniciais |
//!
//! ```text
//! JSON ──► KbDocument ──► MedicalKnowledgeBase ──► KnowledgeBase + RuleIndex
//!                                  │
//! respostas ──► AnswerMap ──► extract_facts ──► FactSet ──► ForwardInferencer
//! ```

pub mod answers;
pub mod condition;
pub mod document;
pub mod error;
pub mod facts;
pub mod loader;
pub mod validator;

pub use answers::AnswerMap;
pub use facts::extract_facts;
pub use loader::MedicalKnowledgeBase;
pub use validator::ValidationReport;

#[cfg(test)]
pub(crate) mod test_support {
    use super::MedicalKnowledgeBase;

    pub const SINUSITIS_KB_JSON: &str = include_str!("../../data/sinusitis_kb.json");

    pub fn sinusitis_kb() -> MedicalKnowledgeBase {
        MedicalKnowledgeBase::from_json(SINUSITIS_KB_JSON).unwrap()
    }
}
