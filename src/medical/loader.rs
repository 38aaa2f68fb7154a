//! # MedicalKnowledgeBase — Carga da Base Autorada
//!
//! Lê o documento JSON, traduz cada regra para a notação textual do núcleo
//! (`a ^ b -> c`) e registra via
//! [`KnowledgeBase::add_rule_from_text`](crate::core::KnowledgeBase::add_rule_from_text).
//! O núcleo só conhece átomos; tudo o que é clínico (código `R006`, módulo,
//! confiança, notas) fica numa tabela lateral indexada pelo id numérico que o
//! núcleo devolve.
//!
//! ```text
//! { "id": "R006", "premises": ["a", "b"], "conclusion": "c" }
//!        │
//!        ├──► "a ^ b -> c" ──► KnowledgeBase (Rule #5)
//!        └──► meta[5] = RuleMeta { code: "R006", module, confidence, notes }
//! ```
//!
//! Uma regra malformada aborta a carga inteira, citando o código autorado.
//! As condições das `fact_rules` também são parseadas aqui, uma única vez.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::{Atom, FactSet, KnowledgeBase, Rule, RuleId};
use crate::inference::RuleIndex;

use super::condition::Condition;
use super::document::{DiseaseEntry, InterviewConfig, KbDocument, KbMetadata};
use super::error::LoadError;
use super::validator::{RuleValidator, ValidationReport};

/// Texto usado quando a base não tem recomendação para o diagnóstico.
pub const DEFAULT_RECOMMENDATION: &str = "Cần khám bác sĩ để được tư vấn chi tiết.";

/// Metadados clínicos de uma regra, opacos ao motor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleMeta {
    /// Código autorado (`R006`); `#<posição>` quando o autor não deu um.
    pub code: String,
    pub module: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
}

/// `fact_rule` com a condição já parseada.
#[derive(Clone, Debug)]
pub struct FactRule {
    pub fact: String,
    pub condition: Condition,
}

/// Base de conhecimento médica: documento + base do núcleo + índice.
#[derive(Debug)]
pub struct MedicalKnowledgeBase {
    document: KbDocument,
    kb: KnowledgeBase,
    index: RuleIndex,
    meta: HashMap<RuleId, RuleMeta>,
    fact_rules: Vec<FactRule>,
}

impl MedicalKnowledgeBase {
    /// Carrega e valida o arquivo em `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let kb = Self::from_json(&raw)?;
        info!(path = %path.display(), "📚 Base médica carregada do disco");
        Ok(kb)
    }

    /// Parse de um documento em texto JSON.
    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let document: KbDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    /// Constrói a base a partir de um documento já desserializado.
    pub fn from_document(document: KbDocument) -> Result<Self, LoadError> {
        let name = document
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| "Medical KB".to_string());
        let mut kb = KnowledgeBase::named(name);
        let mut meta = HashMap::with_capacity(document.rules.len());

        for (position, entry) in document.rules.iter().enumerate() {
            let code = entry
                .id
                .clone()
                .unwrap_or_else(|| format!("#{}", position + 1));
            let text = format!("{} -> {}", entry.premises.join(" ^ "), entry.conclusion);

            let rule = kb
                .add_rule_from_text(&text)
                .map_err(|source| LoadError::MalformedRule {
                    rule: code.clone(),
                    source,
                })?;

            debug!(code = %code, rule_id = rule.id(), "Base médica: regra traduzida");
            meta.insert(
                rule.id(),
                RuleMeta {
                    code,
                    module: entry.module.clone(),
                    confidence: entry.confidence,
                    notes: entry.notes.clone(),
                },
            );
        }

        let fact_rules = document
            .fact_rules
            .iter()
            .map(|entry| {
                Condition::parse(&entry.condition)
                    .map(|condition| FactRule {
                        fact: entry.fact.clone(),
                        condition,
                    })
                    .map_err(|source| LoadError::InvalidCondition {
                        fact: entry.fact.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = RuleIndex::build(&kb);

        info!(
            name = kb.name(),
            rules = kb.len(),
            fact_rules = fact_rules.len(),
            diseases = document.diseases.len(),
            "📚 Base médica pronta"
        );

        Ok(Self {
            document,
            kb,
            index,
            meta,
            fact_rules,
        })
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Índice construído uma vez na carga, compartilhado entre requisições.
    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    pub fn document(&self) -> &KbDocument {
        &self.document
    }

    pub fn name(&self) -> &str {
        self.kb.name()
    }

    pub fn rule_info(&self, id: RuleId) -> Option<&RuleMeta> {
        self.meta.get(&id)
    }

    /// Regras de um módulo clínico, em ordem de inserção.
    pub fn rules_by_module(&self, module: &str) -> Vec<&Rule> {
        self.kb
            .rules()
            .iter()
            .filter(|rule| {
                self.rule_info(rule.id())
                    .and_then(|m| m.module.as_deref())
                    == Some(module)
            })
            .collect()
    }

    pub fn disease_info(&self, variable: &str) -> Option<&DiseaseEntry> {
        self.document
            .diseases
            .iter()
            .find(|d| d.variable == variable)
    }

    pub fn diseases(&self) -> &[DiseaseEntry] {
        &self.document.diseases
    }

    /// Objetivos da inferência: todas as variáveis de doença.
    pub fn disease_goals(&self) -> FactSet {
        self.document
            .diseases
            .iter()
            .map(|d| Atom::new(&d.variable))
            .collect()
    }

    pub fn recommendation(&self, disease: &str) -> &str {
        self.document
            .recommendations
            .iter()
            .find(|r| r.condition == disease)
            .map(|r| r.recommendation.as_str())
            .unwrap_or(DEFAULT_RECOMMENDATION)
    }

    /// Rótulo legível: sintoma, depois doença, depois `snake_case` → `Title Case`.
    pub fn symptom_label(&self, variable: &str) -> String {
        if let Some(s) = self.document.symptoms.iter().find(|s| s.variable == variable) {
            return s.label.clone();
        }
        if let Some(d) = self.disease_info(variable) {
            return d.label.clone();
        }
        title_case(variable)
    }

    /// Nome legível de um módulo; o próprio código se não estiver declarado.
    pub fn module_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.document
            .metadata
            .modules
            .iter()
            .find(|m| m.code == code)
            .map(|m| m.name.as_str())
            .unwrap_or(code)
    }

    pub fn metadata(&self) -> &KbMetadata {
        &self.document.metadata
    }

    pub fn interview(&self) -> &InterviewConfig {
        &self.document.interview
    }

    pub fn fact_rules(&self) -> &[FactRule] {
        &self.fact_rules
    }

    /// Atalho para [`RuleValidator::validate_all`].
    pub fn validate(&self) -> ValidationReport {
        RuleValidator::validate_all(self)
    }
}

fn title_case(variable: &str) -> String {
    variable
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
