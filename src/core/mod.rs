//! # Módulo Core — Modelo de Dados das Regras
//!
//! Tipos fundamentais sobre os quais o motor de inferência trabalha:
//!
//! - [`Atom`] — token opaco que nomeia um fato (ex: `sot`, `nghet_mui`)
//! - [`FactSet`] — conjunto de átomos conhecidos como verdadeiros
//! - [`Rule`] — implicação `premissas -> conclusão`, imutável
//! - [`KnowledgeBase`] — coleção ordenada de regras + parser da notação textual
//! - [`MalformedRuleError`] / [`ParseModeError`] — erros de autoria
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use crate::core::{fact_set, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::new();
//! kb.add_rule_from_text("a -> b")?;
//! kb.add_rule_from_text("b -> c")?;
//! let facts = fact_set(["a"]);
//! ```

/// Sub-módulo com [`Atom`] e [`FactSet`].
pub mod atom;

/// Sub-módulo com os erros tipados do núcleo.
pub mod error;

/// Sub-módulo com [`Rule`], [`RuleId`] e o parser da notação textual.
pub mod rule;

/// Sub-módulo com a implementação de [`KnowledgeBase`].
pub mod knowledge_base;

pub use atom::{fact_set, Atom, FactSet};
pub use error::{MalformedRuleError, ParseModeError};
pub use knowledge_base::KnowledgeBase;
pub use rule::{Rule, RuleId};
