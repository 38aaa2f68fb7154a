//! # RuleIndex — Seleção de Candidatos por Premissa
//!
//! Mapa `átomo → {ids das regras que o usam como premissa}`, construído em
//! uma única passada sobre a [`KnowledgeBase`].
//!
//! Quando um fato novo entra no conjunto de trabalho, só as regras
//! indexadas por ele podem ter se tornado disparáveis — o motor consulta
//! [`candidates()`](RuleIndex::candidates) em vez de reescanear todas as
//! regras a cada passo.
//!
//! O índice é dado derivado e imutável: reflete exatamente a base no
//! momento do [`build()`](RuleIndex::build). Se a base mudar, reconstrua.

use std::collections::HashMap;

use crate::core::{KnowledgeBase, RuleId};

/// Índice reverso premissa → regras.
#[derive(Clone, Debug, Default)]
pub struct RuleIndex {
    /// Ids em ordem crescente para cada átomo (as regras são percorridas em
    /// ordem de id e premissas já vêm deduplicadas).
    by_premise: HashMap<String, Vec<RuleId>>,
    /// Quantas regras a base tinha no build — usado para detectar índice velho.
    rule_count: usize,
}

impl RuleIndex {
    /// Constrói o índice em O(total de ocorrências de premissas).
    pub fn build(kb: &KnowledgeBase) -> Self {
        let mut by_premise: HashMap<String, Vec<RuleId>> = HashMap::new();
        for rule in kb.rules() {
            for premise in rule.premises() {
                by_premise
                    .entry(premise.as_str().to_string())
                    .or_default()
                    .push(rule.id());
            }
        }
        tracing::debug!(
            atoms = by_premise.len(),
            rules = kb.len(),
            "RuleIndex construído"
        );
        Self {
            by_premise,
            rule_count: kb.len(),
        }
    }

    /// Regras que têm `atom` como premissa, em ordem crescente de id.
    /// Átomo desconhecido → slice vazio.
    pub fn candidates(&self, atom: &str) -> &[RuleId] {
        self.by_premise
            .get(atom)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_premise.is_empty()
    }

    /// `true` se o índice foi construído sobre uma base com o mesmo número
    /// de regras. Como a base é append-only, isso basta para detectar que
    /// regras foram adicionadas depois do build.
    pub fn matches(&self, kb: &KnowledgeBase) -> bool {
        self.rule_count == kb.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_gives_empty_index() {
        let index = RuleIndex::build(&KnowledgeBase::new());
        assert!(index.is_empty());
        assert!(index.candidates("a").is_empty());
    }

    #[test]
    fn maps_every_premise_occurrence() {
        let mut kb = KnowledgeBase::new();
        kb.add_rule_from_text("a ^ b -> c").unwrap();
        kb.add_rule_from_text("b -> d").unwrap();
        kb.add_rule_from_text("c ^ a -> e").unwrap();

        let index = RuleIndex::build(&kb);
        assert_eq!(index.candidates("a"), &[0, 2]);
        assert_eq!(index.candidates("b"), &[0, 1]);
        assert_eq!(index.candidates("c"), &[2]);
        // conclusões que não são premissas não entram no índice
        assert!(index.candidates("d").is_empty());
        assert!(index.candidates("e").is_empty());
    }

    #[test]
    fn duplicate_premise_indexed_once() {
        let mut kb = KnowledgeBase::new();
        kb.add_rule_from_text("a ^ a -> b").unwrap();
        let index = RuleIndex::build(&kb);
        assert_eq!(index.candidates("a"), &[0]);
    }

    #[test]
    fn detects_stale_index() {
        let mut kb = KnowledgeBase::new();
        kb.add_rule_from_text("a -> b").unwrap();
        let index = RuleIndex::build(&kb);
        assert!(index.matches(&kb));
        kb.add_rule_from_text("b -> c").unwrap();
        assert!(!index.matches(&kb));
    }
}
