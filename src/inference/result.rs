//! # InferenceResult — Contrato de Saída da Inferência
//!
//! Tudo o que uma camada de explicação precisa para justificar um
//! diagnóstico:
//!
//! | Campo | Conteúdo |
//! |-------|----------|
//! | `final_facts` | fatos no ponto fixo (ou na parada antecipada) |
//! | `fired_rules` | ids das regras disparadas, em ordem, sem repetição |
//! | `history` | um [`InferenceStep`] por disparo |
//! | `success` | algum objetivo está em `final_facts` |
//!
//! O resultado é construído uma vez no fim da execução e nunca muda.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Atom, FactSet, RuleId};

/// Um disparo de regra: qual regra, quais premissas a satisfizeram e qual
/// fato novo produziu.
///
/// `new_fact` é `None` quando a conclusão já era conhecida — o disparo
/// consome a única vez da regra mas não acrescenta nada.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceStep {
    pub rule_id: RuleId,
    pub premises: Vec<Atom>,
    pub new_fact: Option<Atom>,
}

/// Resultado imutável de uma execução de
/// [`ForwardInferencer::infer`](super::ForwardInferencer::infer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    initial_facts: FactSet,
    final_facts: FactSet,
    fired_rules: Vec<RuleId>,
    history: Vec<InferenceStep>,
    goals: FactSet,
    success: bool,
    early_stopped: bool,
}

impl InferenceResult {
    pub(crate) fn new(
        initial_facts: FactSet,
        final_facts: FactSet,
        fired_rules: Vec<RuleId>,
        history: Vec<InferenceStep>,
        goals: FactSet,
        early_stopped: bool,
    ) -> Self {
        let success = !goals.is_empty() && goals.iter().any(|g| final_facts.contains(g));
        Self {
            initial_facts,
            final_facts,
            fired_rules,
            history,
            goals,
            success,
            early_stopped,
        }
    }

    pub fn final_facts(&self) -> &FactSet {
        &self.final_facts
    }

    pub fn fired_rules(&self) -> &[RuleId] {
        &self.fired_rules
    }

    pub fn history(&self) -> &[InferenceStep] {
        &self.history
    }

    /// `true` sse o conjunto de objetivos não é vazio e algum objetivo foi derivado.
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn initial_facts(&self) -> &FactSet {
        &self.initial_facts
    }

    /// `true` quando a execução parou por atingir um objetivo, antes do ponto fixo.
    pub fn early_stopped(&self) -> bool {
        self.early_stopped
    }

    /// Objetivos presentes em `final_facts`.
    pub fn reached_goals(&self) -> FactSet {
        self.goals
            .iter()
            .filter(|g| self.final_facts.contains(*g))
            .cloned()
            .collect()
    }

    /// Fatos produzidos pela inferência (finais menos iniciais).
    pub fn derived_facts(&self) -> FactSet {
        self.final_facts
            .difference(&self.initial_facts)
            .cloned()
            .collect()
    }

    /// Passos que explicam `atom`, em ordem de disparo.
    ///
    /// Parte do passo que produziu `atom` e segue para trás pelas premissas
    /// que também foram derivadas. Fato inicial ou desconhecido → vazio.
    pub fn derivation_chain(&self, atom: &str) -> Vec<&InferenceStep> {
        let mut needed: BTreeSet<usize> = BTreeSet::new();
        let mut pending: Vec<&str> = vec![atom];

        while let Some(current) = pending.pop() {
            let producer = self
                .history
                .iter()
                .position(|s| s.new_fact.as_ref().is_some_and(|f| f.as_str() == current));
            if let Some(pos) = producer {
                if needed.insert(pos) {
                    pending.extend(self.history[pos].premises.iter().map(Atom::as_str));
                }
            }
        }

        needed.into_iter().map(|pos| &self.history[pos]).collect()
    }
}
