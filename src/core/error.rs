//! Erros tipados do núcleo de inferência.
//!
//! Só existem erros de **autoria**: texto de regra malformado e nomes de
//! modo desconhecidos. A inferência em si nunca falha — "nenhum
//! diagnóstico" é `success = false`, não um erro.

use thiserror::Error;

/// Texto de regra que viola a gramática `premissa (^ premissa)* -> conclusão`.
///
/// Sempre carrega o texto original para que o carregador possa reportar
/// qual regra do arquivo foi rejeitada.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRuleError {
    #[error("regra sem seta de implicação '->': {text:?}")]
    MissingArrow { text: String },

    #[error("regra com mais de uma seta '->': {text:?}")]
    MultipleArrows { text: String },

    #[error("regra sem premissas: {text:?}")]
    EmptyPremises { text: String },

    #[error("regra sem conclusão: {text:?}")]
    EmptyConclusion { text: String },

    #[error("premissa vazia (operador '^' sobrando?): {text:?}")]
    EmptyToken { text: String },

    #[error("token {token:?} contém espaço interno (falta o operador '^'?): {text:?}")]
    WhitespaceInToken { token: String, text: String },

    #[error("a conclusão deve ser um único átomo, sem '^': {text:?}")]
    ConjunctiveConclusion { text: String },
}

/// Nome de estratégia ou de desempate que não corresponde a nenhum modo suportado.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseModeError {
    #[error("estratégia desconhecida {0:?} (esperado \"stack\" ou \"queue\")")]
    UnknownStrategy(String),

    #[error("modo de desempate desconhecido {0:?} (esperado \"min\")")]
    UnknownTieBreak(String),
}
