//! Erros da camada médica: carga da base, condições de fatos e respostas.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::MalformedRuleError;

/// Falha ao carregar o arquivo JSON da base de conhecimento.
///
/// A política do carregador é abortar o lote inteiro: uma base com uma regra
/// quebrada não sobe.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("arquivo da base não encontrado: {path}")]
    NotFound { path: PathBuf },

    #[error("falha ao ler {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON inválido na base: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regra {rule} malformada: {source}")]
    MalformedRule {
        rule: String,
        #[source]
        source: MalformedRuleError,
    },

    #[error("condição inválida para o fato {fact:?}: {source}")]
    InvalidCondition {
        fact: String,
        #[source]
        source: ConditionError,
    },
}

/// Expressão de condição rejeitada no parse (momento da carga).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("expressão vazia")]
    Empty,

    #[error("operador desconhecido em {0:?}")]
    UnknownOperator(String),

    #[error("literal inválido {literal:?} em {expr:?}")]
    BadLiteral { literal: String, expr: String },

    #[error("comparação de ordem exige literal numérico: {0:?}")]
    NonNumericOrdering(String),

    #[error("expressão não reconhecida: {0:?}")]
    Invalid(String),
}

/// Valor de resposta que não tem leitura booleana.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("valor {value} não é um booleano reconhecido (true/false, 0/1, \"true\"/\"false\")")]
pub struct CoercionError {
    pub value: String,
}

/// Falha ao avaliar uma condição contra as respostas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("resposta de {variable:?} não é numérica: {value}")]
    NotNumeric { variable: String, value: String },

    #[error("resposta de {variable:?}: {source}")]
    Coercion {
        variable: String,
        #[source]
        source: CoercionError,
    },
}

/// Payload de respostas com um valor que não é booleano, número ou texto.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resposta de {variable:?} tem tipo não suportado ({kind})")]
pub struct AnswerError {
    pub variable: String,
    pub kind: &'static str,
}
