//! # Módulo Inference — Motor de Encadeamento Progressivo
//!
//! Este módulo contém o **motor de inferência** do advisor, responsável por
//! derivar todas as consequências de um conjunto de fatos observados,
//! disparando regras até o ponto fixo — ou até que algum diagnóstico
//! procurado apareça.
//!
//! ## Componentes
//!
//! | Tipo | Papel |
//! |------|-------|
//! | [`RuleIndex`] | átomo → regras que o usam como premissa |
//! | [`ForwardInferencer`] | o laço de ponto fixo com worklist |
//! | [`Strategy`] / [`TieBreak`] | ordem de disparo |
//! | [`InferenceResult`] / [`result::InferenceStep`] | fatos finais + trilha de proveniência |
//!
//! ## Exemplo
//!
//! ```text
//! Regras: a -> b, b -> c, c -> d      Fatos: {a}      Objetivos: {c}
//! Disparos: (a -> b), (b -> c)  → objetivo atingido, d não é derivado
//! ```

/// Sub-módulo com o índice premissa → regras.
pub mod index;

/// Sub-módulo com o laço de ponto fixo.
pub mod forward;

/// Sub-módulo com o contrato de saída.
pub mod result;

pub use forward::{ForwardInferencer, Strategy, TieBreak};
pub use index::RuleIndex;
pub use result::InferenceResult;
