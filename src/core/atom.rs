//! # Atom — Token Opaco de Fato
//!
//! Um [`Atom`] nomeia um fato ou condição (ex: `sot`, `nghet_mui`,
//! `viem_xoang_cap`). Átomos não carregam valor de verdade próprio —
//! um átomo só é "verdadeiro" quando pertence a um [`FactSet`].
//!
//! ## Representação
//!
//! Internamente é um `Arc<str>`: clonar um átomo custa um incremento
//! de contador, e a [`KnowledgeBase`](super::KnowledgeBase) reaproveita
//! a mesma alocação para todas as ocorrências do mesmo token (interning).
//!
//! A ordenação é lexicográfica, o que torna a iteração de um [`FactSet`]
//! (um `BTreeSet`) determinística — requisito para que duas execuções
//! idênticas da inferência produzam o mesmo histórico.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token interned que nomeia um fato. Comparado apenas por igualdade/ordem.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(Arc<str>);

/// Conjunto de fatos conhecidos como verdadeiros.
///
/// Cresce monotonicamente durante uma execução da inferência —
/// fatos nunca são removidos.
pub type FactSet = BTreeSet<Atom>;

impl Atom {
    /// Cria um átomo a partir de um token já validado.
    pub fn new(token: &str) -> Self {
        Self(Arc::from(token))
    }

    /// O texto do token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Atom {
    fn from(token: &str) -> Self {
        Atom::new(token)
    }
}

impl From<String> for Atom {
    fn from(token: String) -> Self {
        Self(Arc::from(token))
    }
}

// Serializado como string JSON simples ("sot"), sem envelope.
impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Atom::from(token))
    }
}

/// Constrói um [`FactSet`] a partir de tokens — atalho usado em testes e
/// na camada de extração de fatos.
pub fn fact_set<I, S>(tokens: I) -> FactSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| Atom::new(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_set_lookup_by_str() {
        let facts = fact_set(["sot", "ho"]);
        assert!(facts.contains("sot"));
        assert!(!facts.contains("sot_cao"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Atom::new("nghet_mui")).unwrap();
        assert_eq!(json, "\"nghet_mui\"");
        let back: Atom = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "nghet_mui");
    }

    #[test]
    fn iteration_is_sorted() {
        let facts = fact_set(["c", "a", "b"]);
        let order: Vec<&str> = facts.iter().map(Atom::as_str).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
