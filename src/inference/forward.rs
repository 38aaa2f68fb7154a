//! # Encadeamento Progressivo — O Laço de Ponto Fixo
//!
//! Implementação do motor de inferência **forward chaining** sobre as
//! regras da [`KnowledgeBase`].
//!
//! ## Como Funciona
//!
//! ```text
//! fatos := cópia(fatos_iniciais)
//! worklist := regras já satisfeitas pelos fatos iniciais (ordem: desempate)
//! enquanto worklist ≠ ∅ e nenhum objetivo foi atingido:
//!     r := próxima(worklist)              // stack → LIFO, queue → FIFO
//!     se r já disparou ou premissas ⊄ fatos: pula
//!     dispara r, registra no histórico
//!     se conclusão(r) é nova:
//!         fatos += conclusão(r)
//!         worklist += regras indexadas pela conclusão e agora satisfeitas
//! ```
//!
//! ## Estratégias
//!
//! | Estratégia | Worklist | Efeito |
//! |------------|----------|--------|
//! | [`Strategy::Stack`] | LIFO | profundidade: a regra habilitada mais recentemente dispara primeiro |
//! | [`Strategy::Queue`] | FIFO | largura: regras disparam na ordem em que foram habilitadas |
//!
//! Regras habilitadas **pelo mesmo fato** formam um lote; o lote é ordenado
//! pelo [`TieBreak`] e inserido de forma que seja consumido em ordem
//! crescente de id nas duas estratégias (na pilha, o lote é empilhado ao
//! contrário para que o menor id fique no topo).
//!
//! ## Terminação
//!
//! Fatos só crescem e cada regra dispara no máximo uma vez por execução,
//! então o laço termina após no máximo `N` disparos para `N` regras,
//! independentemente da estratégia.
//!
//! ## Parada Antecipada
//!
//! Com objetivos não vazios, a execução para logo após o disparo que
//! colocou algum objetivo no conjunto de fatos. O histórico resultante é
//! prefixo do histórico que a mesma entrada produziria sem objetivos.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::index::RuleIndex;
use super::result::{InferenceResult, InferenceStep};
use crate::core::{Atom, FactSet, KnowledgeBase, ParseModeError, RuleId};

/// Disciplina de consumo da worklist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Profundidade — LIFO.
    #[default]
    Stack,
    /// Largura — FIFO.
    Queue,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Stack => "stack",
            Strategy::Queue => "queue",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stack" => Ok(Strategy::Stack),
            "queue" => Ok(Strategy::Queue),
            _ => Err(ParseModeError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Ordem determinística de um lote de regras habilitadas ao mesmo tempo.
///
/// Só `min` (id crescente — regras definidas antes têm preferência) é
/// suportado; novos modos entram como variantes deste enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Min,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::Min => "min",
        }
    }

    /// Ordena o lote in-place.
    fn order(&self, batch: &mut [RuleId]) {
        match self {
            TieBreak::Min => batch.sort_unstable(),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(TieBreak::Min),
            _ => Err(ParseModeError::UnknownTieBreak(s.to_string())),
        }
    }
}

/// Worklist com disciplina selecionável. Um id nunca aparece duas vezes.
struct Worklist {
    strategy: Strategy,
    items: VecDeque<RuleId>,
    enqueued: HashSet<RuleId>,
}

impl Worklist {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            items: VecDeque::new(),
            enqueued: HashSet::new(),
        }
    }

    fn contains(&self, id: RuleId) -> bool {
        self.enqueued.contains(&id)
    }

    /// Insere um lote já ordenado pelo desempate; o lote sai na mesma ordem.
    fn insert_batch(&mut self, batch: &[RuleId]) {
        match self.strategy {
            Strategy::Queue => {
                for &id in batch {
                    if self.enqueued.insert(id) {
                        self.items.push_back(id);
                    }
                }
            }
            Strategy::Stack => {
                for &id in batch.iter().rev() {
                    if self.enqueued.insert(id) {
                        self.items.push_back(id);
                    }
                }
            }
        }
    }

    fn next(&mut self) -> Option<RuleId> {
        match self.strategy {
            Strategy::Stack => self.items.pop_back(),
            Strategy::Queue => self.items.pop_front(),
        }
    }
}

/// Motor de encadeamento progressivo — struct sem estado.
///
/// Todo o estado de trabalho (fatos, worklist, regras disparadas) é local a
/// uma chamada; a base e o índice são só leitura. Por isso várias
/// inferências podem rodar em paralelo sobre a mesma base.
///
/// ## Uso
///
/// ```rust
/// let result = ForwardInferencer::infer(&kb, &facts, &goals, Strategy::Stack, TieBreak::Min);
/// if result.success() {
///     for step in result.history() { /* explicar */ }
/// }
/// ```
pub struct ForwardInferencer;

impl ForwardInferencer {
    /// Roda o laço até o ponto fixo ou até atingir um objetivo.
    ///
    /// Constrói um [`RuleIndex`] novo para esta execução. Para reaproveitar
    /// um índice compartilhado, use [`infer_with_index`](Self::infer_with_index).
    ///
    /// Nunca falha: base bem formada → sempre termina e sempre retorna
    /// resultado. `goals` vazio → ponto fixo completo e `success = false`.
    pub fn infer(
        kb: &KnowledgeBase,
        initial_facts: &FactSet,
        goals: &FactSet,
        strategy: Strategy,
        tie_break: TieBreak,
    ) -> InferenceResult {
        let index = RuleIndex::build(kb);
        Self::infer_with_index(kb, &index, initial_facts, goals, strategy, tie_break)
    }

    /// Igual a [`infer`](Self::infer), usando um índice já construído sobre `kb`.
    pub fn infer_with_index(
        kb: &KnowledgeBase,
        index: &RuleIndex,
        initial_facts: &FactSet,
        goals: &FactSet,
        strategy: Strategy,
        tie_break: TieBreak,
    ) -> InferenceResult {
        debug_assert!(index.matches(kb), "RuleIndex construído sobre outra base");

        // Cópia: o conjunto do chamador nunca é alterado.
        let mut facts: FactSet = initial_facts.clone();
        let mut fired: HashSet<RuleId> = HashSet::new();
        let mut fired_rules: Vec<RuleId> = Vec::new();
        let mut history: Vec<InferenceStep> = Vec::new();
        let mut worklist = Worklist::new(strategy);

        // Semeadura: todas as regras já satisfeitas pelos fatos iniciais
        // formam um único lote.
        // Os fatos não mudam durante a semeadura: cada id é avaliado uma vez.
        let mut seen: HashSet<RuleId> = HashSet::new();
        let mut seed: Vec<RuleId> = Vec::new();
        for atom in &facts {
            for &id in index.candidates(atom.as_str()) {
                if seen.insert(id) && Self::is_firable(kb, id, &facts, &fired, &worklist) {
                    seed.push(id);
                }
            }
        }
        tie_break.order(&mut seed);
        worklist.insert_batch(&seed);

        let goal_reached = |facts: &FactSet| !goals.is_empty() && goals.iter().any(|g| facts.contains(g));
        // Objetivo já presente nos fatos iniciais: nada a disparar.
        let mut early_stopped = goal_reached(&facts);

        while !early_stopped {
            let Some(id) = worklist.next() else {
                break;
            };
            let Some(rule) = kb.rule(id) else {
                tracing::debug!(rule_id = id, "id fora da base na worklist, ignorado");
                continue;
            };

            if fired.contains(&id) || !rule.is_satisfied_by(&facts) {
                // Só acontece se a invariante "enfileira só regras satisfeitas" quebrar.
                tracing::debug!(rule_id = id, "candidato não disparável, ignorado");
                continue;
            }

            fired.insert(id);
            fired_rules.push(id);

            let conclusion: &Atom = rule.conclusion();
            let is_new = facts.insert(conclusion.clone());
            history.push(InferenceStep {
                rule_id: id,
                premises: rule.premises().to_vec(),
                new_fact: is_new.then(|| conclusion.clone()),
            });
            tracing::debug!(
                step = history.len(),
                rule_id = id,
                rule = %rule,
                new_fact = is_new,
                "regra disparada"
            );

            if is_new {
                let mut batch: Vec<RuleId> = index
                    .candidates(conclusion.as_str())
                    .iter()
                    .copied()
                    .filter(|&cand| Self::is_firable(kb, cand, &facts, &fired, &worklist))
                    .collect();
                tie_break.order(&mut batch);
                worklist.insert_batch(&batch);
            }

            early_stopped = goal_reached(&facts);
        }

        let result = InferenceResult::new(
            initial_facts.clone(),
            facts,
            fired_rules,
            history,
            goals.clone(),
            early_stopped,
        );
        tracing::debug!(
            strategy = %strategy,
            tie_break = %tie_break,
            fired = result.fired_rules().len(),
            facts = result.final_facts().len(),
            success = result.success(),
            early_stopped,
            "inferência concluída"
        );
        result
    }

    /// Regra ainda não disparada, fora da worklist e com todas as premissas conhecidas.
    fn is_firable(
        kb: &KnowledgeBase,
        id: RuleId,
        facts: &FactSet,
        fired: &HashSet<RuleId>,
        worklist: &Worklist,
    ) -> bool {
        !fired.contains(&id)
            && !worklist.contains(id)
            && kb.rule(id).is_some_and(|r| r.is_satisfied_by(facts))
    }
}
