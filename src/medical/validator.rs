//! # RuleValidator — Verificação Estática da Base
//!
//! Roda depois da carga (o parse já garantiu sintaxe) e procura problemas
//! de autoria:
//!
//! | Verificação | Severidade |
//! |-------------|------------|
//! | premissa/conclusão com variável desconhecida | erro |
//! | mesmas premissas, conclusões diferentes (conflito) | aviso |
//! | mesmas premissas e mesma conclusão (duplicata) | aviso |
//! | doença que nenhuma regra conclui (inalcançável) | aviso |
//!
//! Variáveis conhecidas = sintomas ∪ doenças ∪ fatos de `fact_rules` ∪
//! conclusões de regras. As conclusões entram porque átomos intermediários
//! (`dieu_kien_cap_day_du`) são legítimos.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::Rule;

use super::loader::MedicalKnowledgeBase;

/// Resultado da validação.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_rules: usize,
    pub total_symptoms: usize,
    pub total_diseases: usize,
}

pub struct RuleValidator;

impl RuleValidator {
    pub fn validate_all(kb: &MedicalKnowledgeBase) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        Self::check_variables(kb, &mut errors);
        Self::check_conflicts_and_duplicates(kb, &mut warnings);
        Self::check_unreachable(kb, &mut warnings);
        Self::check_unasked(kb, &mut warnings);

        for w in &warnings {
            warn!(warning = %w, "Validação: aviso");
        }
        info!(
            errors = errors.len(),
            warnings = warnings.len(),
            "✅ Validação da base concluída"
        );

        let doc = kb.document();
        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            total_rules: kb.knowledge_base().len(),
            total_symptoms: doc.symptoms.len(),
            total_diseases: doc.diseases.len(),
        }
    }

    fn code(kb: &MedicalKnowledgeBase, rule: &Rule) -> String {
        kb.rule_info(rule.id())
            .map(|m| m.code.clone())
            .unwrap_or_else(|| format!("#{}", rule.id()))
    }

    fn check_variables(kb: &MedicalKnowledgeBase, errors: &mut Vec<String>) {
        let doc = kb.document();
        let mut known: HashSet<&str> = HashSet::new();
        known.extend(doc.symptoms.iter().map(|s| s.variable.as_str()));
        known.extend(doc.diseases.iter().map(|d| d.variable.as_str()));
        known.extend(kb.fact_rules().iter().map(|f| f.fact.as_str()));
        known.extend(kb.knowledge_base().rules().iter().map(|r| r.conclusion().as_str()));

        for rule in kb.knowledge_base().rules() {
            for premise in rule.premises() {
                if !known.contains(premise.as_str()) {
                    errors.push(format!(
                        "Regra {}: premissa desconhecida '{}'",
                        Self::code(kb, rule),
                        premise
                    ));
                }
            }
        }
    }

    fn check_conflicts_and_duplicates(kb: &MedicalKnowledgeBase, warnings: &mut Vec<String>) {
        // premissas (ordenadas) → [(código, conclusão)]
        let mut by_premises: BTreeMap<BTreeSet<&str>, Vec<(String, &str)>> = BTreeMap::new();

        for rule in kb.knowledge_base().rules() {
            let key: BTreeSet<&str> = rule.premises().iter().map(|p| p.as_str()).collect();
            let entry = by_premises.entry(key).or_default();

            let code = Self::code(kb, rule);
            let conclusion = rule.conclusion().as_str();
            if entry.iter().any(|(_, c)| *c == conclusion) {
                warnings.push(format!("Regra duplicada: {}", code));
            }
            entry.push((code, conclusion));
        }

        for rules in by_premises.values() {
            let conclusions: BTreeSet<&str> = rules.iter().map(|(_, c)| *c).collect();
            if conclusions.len() > 1 {
                let codes: Vec<&str> = rules.iter().map(|(code, _)| code.as_str()).collect();
                let conclusions: Vec<&str> = conclusions.into_iter().collect();
                warnings.push(format!(
                    "Possível conflito: regras {} têm as mesmas premissas e conclusões diferentes: {}",
                    codes.join(", "),
                    conclusions.join(", ")
                ));
            }
        }
    }

    fn check_unreachable(kb: &MedicalKnowledgeBase, warnings: &mut Vec<String>) {
        for disease in kb.diseases() {
            if kb
                .knowledge_base()
                .rules_concluding(&disease.variable)
                .next()
                .is_none()
            {
                warnings.push(format!(
                    "Doença inalcançável: nenhuma regra conclui '{}'",
                    disease.variable
                ));
            }
        }
    }

    /// Variáveis usadas por `fact_rules` que nenhuma pergunta coleta.
    /// Base sem perguntas (uso só via API) não é checada.
    fn check_unasked(kb: &MedicalKnowledgeBase, warnings: &mut Vec<String>) {
        let questions = &kb.interview().questions;
        if questions.is_empty() {
            return;
        }
        let asked: HashSet<&str> = questions.iter().map(|q| q.variable.as_str()).collect();

        for fact_rule in kb.fact_rules() {
            for variable in fact_rule.condition.variables() {
                if !asked.contains(variable) {
                    warnings.push(format!(
                        "Fato '{}': variável '{}' não é perguntada na entrevista",
                        fact_rule.fact, variable
                    ));
                }
            }
        }
    }
}
