//! # Rule — Implicação Proposicional
//!
//! Uma [`Rule`] é uma conjunção de premissas que implica uma única conclusão:
//!
//! ```text
//! nghet_mui ^ dau_nang_mat ^ dieu_kien_cap_day_du -> viem_xoang_cap
//! ```
//!
//! ## Notação Textual
//!
//! | Elemento | Sintaxe |
//! |----------|---------|
//! | Conjunção | `^` |
//! | Implicação | `->` (exatamente uma) |
//! | Átomo | token sem espaços internos |
//!
//! O parser ([`parse_rule_text`]) divide primeiro pela seta, depois o lado
//! esquerdo pelo operador de conjunção, aparando espaços de cada token.
//! Premissas repetidas colapsam, preservando a ordem da primeira ocorrência
//! (usada na explicação do diagnóstico).
//!
//! Regras são imutáveis: criadas uma vez pela
//! [`KnowledgeBase`](super::KnowledgeBase) e nunca alteradas.

use std::fmt;

use serde::Serialize;

use super::atom::{Atom, FactSet};
use super::error::MalformedRuleError;

/// Identificador sequencial de uma regra — denso em `[0, len)` e igual à
/// posição de inserção na [`KnowledgeBase`](super::KnowledgeBase).
pub type RuleId = usize;

/// Seta de implicação da notação textual.
pub const ARROW: &str = "->";

/// Operador de conjunção da notação textual.
pub const CONJUNCTION: char = '^';

/// Regra `premissas -> conclusão`, imutável após a criação.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    id: RuleId,
    premises: Vec<Atom>,
    conclusion: Atom,
}

impl Rule {
    /// Só a KnowledgeBase cria regras — é ela quem garante ids densos e
    /// premissas não vazias e sem duplicatas.
    pub(crate) fn new(id: RuleId, premises: Vec<Atom>, conclusion: Atom) -> Self {
        debug_assert!(!premises.is_empty());
        Self {
            id,
            premises,
            conclusion,
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Premissas em ordem de primeira ocorrência no texto.
    pub fn premises(&self) -> &[Atom] {
        &self.premises
    }

    pub fn conclusion(&self) -> &Atom {
        &self.conclusion
    }

    /// `true` quando todas as premissas estão em `facts` — condição para disparo.
    pub fn is_satisfied_by(&self, facts: &FactSet) -> bool {
        self.premises.iter().all(|p| facts.contains(p))
    }
}

/// Forma canônica: `a ^ b -> c`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, premise) in self.premises.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", CONJUNCTION)?;
            }
            write!(f, "{}", premise)?;
        }
        write!(f, " {} {}", ARROW, self.conclusion)
    }
}

/// Resultado do parse — tokens emprestados do texto original, já aparados
/// e com premissas deduplicadas.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRule<'a> {
    pub premises: Vec<&'a str>,
    pub conclusion: &'a str,
}

/// Faz o parse de `premissa (^ premissa)* -> conclusão`.
///
/// # Erros
///
/// [`MalformedRuleError`] quando a seta falta ou se repete, quando um dos
/// lados fica vazio, quando algum token fica vazio após o trim, ou quando
/// um token tem espaço interno (`"a b -> c"`).
pub fn parse_rule_text(text: &str) -> Result<ParsedRule<'_>, MalformedRuleError> {
    let mut sides = text.split(ARROW);
    let (lhs, rhs) = match (sides.next(), sides.next(), sides.next()) {
        (Some(lhs), Some(rhs), None) => (lhs, rhs),
        (_, None, _) => {
            return Err(MalformedRuleError::MissingArrow {
                text: text.to_string(),
            })
        }
        _ => {
            return Err(MalformedRuleError::MultipleArrows {
                text: text.to_string(),
            })
        }
    };

    let lhs = lhs.trim();
    let conclusion = rhs.trim();
    if lhs.is_empty() {
        return Err(MalformedRuleError::EmptyPremises {
            text: text.to_string(),
        });
    }
    if conclusion.is_empty() {
        return Err(MalformedRuleError::EmptyConclusion {
            text: text.to_string(),
        });
    }
    if conclusion.contains(CONJUNCTION) {
        return Err(MalformedRuleError::ConjunctiveConclusion {
            text: text.to_string(),
        });
    }
    check_token(conclusion, text)?;

    let mut premises: Vec<&str> = Vec::new();
    for raw in lhs.split(CONJUNCTION) {
        let token = raw.trim();
        check_token(token, text)?;
        if !premises.contains(&token) {
            premises.push(token);
        }
    }

    Ok(ParsedRule {
        premises,
        conclusion,
    })
}

/// Valida um token isolado (já aparado): não vazio e sem espaço interno.
pub(crate) fn check_token(token: &str, text: &str) -> Result<(), MalformedRuleError> {
    if token.is_empty() {
        return Err(MalformedRuleError::EmptyToken {
            text: text.to_string(),
        });
    }
    if token.chars().any(char::is_whitespace) {
        return Err(MalformedRuleError::WhitespaceInToken {
            token: token.to_string(),
            text: text.to_string(),
        });
    }
    Ok(())
}
