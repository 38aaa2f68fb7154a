//! # Respostas da Entrevista
//!
//! O formulário/entrevista envia um objeto JSON `variável → valor`. Aqui
//! esse objeto vira um [`AnswerMap`] tipado:
//!
//! | JSON | [`Answer`] |
//! |------|------------|
//! | `true` / `false` | `Bool` |
//! | `38.5` | `Number` |
//! | `"Trong, loãng"` | `Text` |
//! | `null`, `""` | (não respondida — omitida) |
//! | array / objeto | erro [`AnswerError`] |
//!
//! ## Coerção Booleana
//!
//! [`Answer::as_bool`] é uma função **total e explícita**: booleanos,
//! números `0`/`1` e os textos `"true"`/`"false"` (sem diferenciar
//! maiúsculas). Qualquer outra coisa é [`CoercionError`] — nunca um
//! `false` silencioso.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{AnswerError, CoercionError};

/// Valor de uma resposta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Answer {
    /// Converte um valor JSON; `None` para `null` e texto vazio.
    pub fn from_json(variable: &str, value: &Value) -> Result<Option<Answer>, AnswerError> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Answer::Bool(*b))),
            Value::Number(n) => Ok(n.as_f64().map(Answer::Number)),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(Answer::Text(s.clone()))),
            Value::Array(_) => Err(AnswerError {
                variable: variable.to_string(),
                kind: "array",
            }),
            Value::Object(_) => Err(AnswerError {
                variable: variable.to_string(),
                kind: "object",
            }),
        }
    }

    /// Leitura booleana explícita (ver doc do módulo).
    pub fn as_bool(&self) -> Result<bool, CoercionError> {
        match self {
            Answer::Bool(b) => Ok(*b),
            Answer::Number(n) if *n == 0.0 => Ok(false),
            Answer::Number(n) if *n == 1.0 => Ok(true),
            Answer::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(CoercionError { value: self.to_string() }),
            },
            Answer::Number(_) => Err(CoercionError { value: self.to_string() }),
        }
    }

    /// Leitura numérica: números e textos que fazem parse como número.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Number(n) => Some(*n),
            Answer::Text(s) => s.trim().replace(',', ".").parse().ok(),
            Answer::Bool(_) => None,
        }
    }

    /// `true` para um "sim" explícito: `Bool(true)` ou texto `"true"`.
    ///
    /// Números ficam de fora de propósito — `thoi_gian_trieu_chung: 1`
    /// é uma duração, não uma afirmação.
    pub fn is_affirmative(&self) -> bool {
        match self {
            Answer::Bool(b) => *b,
            Answer::Text(_) => self.as_bool().unwrap_or(false),
            Answer::Number(_) => false,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{}", b),
            Answer::Number(n) => write!(f, "{}", n),
            Answer::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Respostas por variável, ordenadas por nome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>")]
pub struct AnswerMap(BTreeMap<String, Answer>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str) -> Option<&Answer> {
        self.0.get(variable)
    }

    pub fn is_answered(&self, variable: &str) -> bool {
        self.0.contains_key(variable)
    }

    pub fn insert(&mut self, variable: impl Into<String>, answer: Answer) {
        self.0.insert(variable.into(), answer);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Converte o objeto JSON do payload; valores vazios são descartados.
impl TryFrom<BTreeMap<String, Value>> for AnswerMap {
    type Error = AnswerError;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        let mut answers = BTreeMap::new();
        for (variable, value) in &raw {
            if let Some(answer) = Answer::from_json(variable, value)? {
                answers.insert(variable.clone(), answer);
            }
        }
        Ok(Self(answers))
    }
}
