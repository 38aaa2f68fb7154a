//! # Diagnóstico — Da Resposta ao Laudo
//!
//! O [`DiagnosisService`] coordena as camadas para cada requisição:
//!
//! ```text
//! AnswerMap
//!   │
//!   ├── 1. extract_facts        → fatos observados (fonte: paciente)
//!   ├── 2. ForwardInferencer    → ponto fixo completo sobre o índice compartilhado
//!   ├── 3. priority_order       → o primeiro diagnóstico presente vence
//!   └── 4. explicações          → regras disparadas, filtradas pelo escopo do diagnóstico
//! ```
//!
//! A inferência roda sem objetivos: várias doenças *refinam* outra
//! (`viem_xoang_cap ^ trieu_chung_duoi_10_ngay -> viem_xoang_cap_do_virus`) e
//! uma execução dirigida a objetivos pararia no diagnóstico mais grosso.
//!
//! ## Entrevista
//!
//! [`DiagnosisService::next_question`] decide, a cada resposta, se já há um
//! diagnóstico para encerrar ou qual pergunta fazer:
//!
//! | Passo | Regra |
//! |-------|-------|
//! | abertura | sem respostas → pergunta configurada em `opening` |
//! | parada antecipada | diagnóstico priorizado não negativo, com as variáveis de `refine` respondidas |
//! | premissa faltante | regras-alvo parcialmente satisfeitas → premissa mais frequente |
//! | banco | primeira pergunta ainda não respondida |
//! | fim | nada mais a perguntar → laudo |

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{FactSet, RuleId};
use crate::inference::{ForwardInferencer, InferenceResult, Strategy, TieBreak};
use crate::medical::document::Question;
use crate::medical::{extract_facts, AnswerMap, MedicalKnowledgeBase};

/// Código usado quando nem um diagnóstico nem a conclusão negativa existem.
pub const UNDETERMINED: &str = "undetermined";

/// Gravidade normalizada para a interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Info,
}

impl Severity {
    /// `Mild→low`, `Moderate→medium`, `Severe→high`, `Critical→critical`,
    /// `Info→info`; qualquer outra coisa é `low`.
    pub fn from_label(raw: Option<&str>) -> Self {
        match raw {
            Some("Mild") => Severity::Low,
            Some("Moderate") => Severity::Medium,
            Some("Severe") => Severity::High,
            Some("Critical") => Severity::Critical,
            Some("Info") => Severity::Info,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease: String,
    pub disease_label: String,
    pub severity: Severity,
    /// Rótulo como autorado (`Moderate`) ou `Unknown`.
    pub severity_raw: String,
    pub icd10: Option<String>,
    /// O diagnóstico escolhido foi de fato inferido.
    pub success: bool,
}

/// De onde veio um fato usado como premissa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PremiseSource {
    Patient,
    Inferred,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiseExplanation {
    pub code: String,
    pub label: String,
    pub satisfied: bool,
    pub source: PremiseSource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionExplanation {
    pub code: String,
    pub label: String,
    pub is_goal: bool,
}

/// Uma regra disparada, pronta para exibição.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleExplanation {
    /// Código autorado (`R006`).
    pub rule_id: String,
    pub engine_id: RuleId,
    pub module: Option<String>,
    pub module_label: Option<String>,
    pub notes: Option<String>,
    pub confidence: Option<f64>,
    pub premises: Vec<PremiseExplanation>,
    pub conclusion: ConclusionExplanation,
    /// `false` quando a conclusão já era conhecida no disparo.
    pub new_fact: bool,
    /// A regra está na cadeia de derivação do diagnóstico escolhido.
    #[serde(default)]
    pub supports_diagnosis: bool,
}

/// Linha de recomendação, opcionalmente marcada com `@seção:`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendationLine {
    pub section: Option<String>,
    pub text: String,
}

/// Laudo completo de uma sessão; é o que vai para o disco.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub diagnosis: Diagnosis,
    /// Todas as doenças presentes nos fatos finais, em ordem de prioridade.
    pub inferred_diseases: Vec<String>,
    pub answers: AnswerMap,
    pub extracted_facts: FactSet,
    pub recommendation: String,
    pub explanations: Vec<RuleExplanation>,
    pub strategy: Strategy,
    pub tie_break: TieBreak,
    pub inference: InferenceResult,
}

impl DiagnosisReport {
    /// Quebra a recomendação em linhas não vazias, separando `@seção:`.
    pub fn recommendation_lines(&self) -> Vec<RecommendationLine> {
        self.recommendation
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.strip_prefix('@').and_then(|r| r.split_once(':')) {
                Some((section, text)) if !section.contains(char::is_whitespace) => {
                    RecommendationLine {
                        section: Some(section.to_string()),
                        text: text.trim().to_string(),
                    }
                }
                _ => RecommendationLine {
                    section: None,
                    text: line.to_string(),
                },
            })
            .collect()
    }
}

/// Motivo pelo qual uma pergunta foi escolhida.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AskReason {
    Opening,
    MissingPremise { fact: String },
    BankOrder,
}

/// Próximo passo da entrevista.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InterviewStep {
    Ask {
        question: Question,
        reason: AskReason,
    },
    Done {
        /// `true` quando um diagnóstico encerrou a entrevista antes do fim do banco.
        early: bool,
        report: Box<DiagnosisReport>,
    },
}

/// Fatos + resultado de uma execução, reaproveitados entre os passos.
struct Evaluation {
    facts: FactSet,
    result: InferenceResult,
    diagnosed: Option<String>,
}

/// Serviço sem estado sobre uma base compartilhada.
pub struct DiagnosisService<'a> {
    kb: &'a MedicalKnowledgeBase,
    strategy: Strategy,
    tie_break: TieBreak,
}

impl<'a> DiagnosisService<'a> {
    pub fn new(kb: &'a MedicalKnowledgeBase, strategy: Strategy, tie_break: TieBreak) -> Self {
        Self {
            kb,
            strategy,
            tie_break,
        }
    }

    fn evaluate(&self, answers: &AnswerMap) -> Evaluation {
        let facts = extract_facts(answers, self.kb);
        let result = ForwardInferencer::infer_with_index(
            self.kb.knowledge_base(),
            self.kb.index(),
            &facts,
            &FactSet::new(),
            self.strategy,
            self.tie_break,
        );
        let diagnosed = self
            .ranked_diseases(result.final_facts())
            .into_iter()
            .next();
        Evaluation {
            facts,
            result,
            diagnosed,
        }
    }

    /// Doenças presentes em `facts`: primeiro na ordem de prioridade, depois
    /// as demais na ordem do documento.
    fn ranked_diseases(&self, facts: &FactSet) -> Vec<String> {
        let mut ranked: Vec<String> = Vec::new();
        let priority = &self.kb.interview().priority_order;
        let declared = self.kb.diseases().iter().map(|d| &d.variable);
        for disease in priority.iter().chain(declared) {
            if facts.contains(disease.as_str()) && !ranked.contains(disease) {
                ranked.push(disease.clone());
            }
        }
        ranked
    }

    /// Roda a inferência completa e monta o laudo.
    pub fn diagnose(&self, answers: &AnswerMap) -> DiagnosisReport {
        let evaluation = self.evaluate(answers);
        self.build_report(answers, evaluation)
    }

    fn build_report(&self, answers: &AnswerMap, evaluation: Evaluation) -> DiagnosisReport {
        let Evaluation {
            facts,
            result,
            diagnosed,
        } = evaluation;

        let disease = diagnosed
            .or_else(|| self.kb.interview().negative.clone())
            .unwrap_or_else(|| UNDETERMINED.to_string());

        let info = self.kb.disease_info(&disease);
        let severity_raw = info
            .and_then(|d| d.severity.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let diagnosis = Diagnosis {
            disease_label: info
                .map(|d| d.label.clone())
                .unwrap_or_else(|| disease.clone()),
            severity: Severity::from_label(Some(severity_raw.as_str())),
            severity_raw,
            icd10: info.and_then(|d| d.icd10.clone()),
            success: result.final_facts().contains(disease.as_str()),
            disease,
        };

        let explanations = self.explain(&diagnosis.disease, &facts, &result);
        let session_id = Uuid::new_v4().simple().to_string();

        info!(
            session_id = %session_id,
            disease = %diagnosis.disease,
            severity = diagnosis.severity.as_str(),
            facts = facts.len(),
            fired = result.fired_rules().len(),
            "🩺 Diagnóstico concluído"
        );

        DiagnosisReport {
            session_id,
            created_at: Utc::now(),
            inferred_diseases: self.ranked_diseases(result.final_facts()),
            recommendation: self.kb.recommendation(&diagnosis.disease).to_string(),
            diagnosis,
            answers: answers.clone(),
            extracted_facts: facts,
            explanations,
            strategy: self.strategy,
            tie_break: self.tie_break,
            inference: result,
        }
    }

    /// Explicações das regras disparadas, limitadas aos módulos do escopo do
    /// diagnóstico (sem escopo declarado → todas).
    fn explain(
        &self,
        disease: &str,
        patient_facts: &FactSet,
        result: &InferenceResult,
    ) -> Vec<RuleExplanation> {
        let scope = self.kb.interview().module_scope.get(disease);
        let goals = self.kb.disease_goals();
        let final_facts = result.final_facts();
        let chain: BTreeSet<RuleId> = result
            .derivation_chain(disease)
            .iter()
            .map(|step| step.rule_id)
            .collect();

        result
            .history()
            .iter()
            .filter_map(|step| {
                let rule = self.kb.knowledge_base().rule(step.rule_id)?;
                let meta = self.kb.rule_info(step.rule_id);
                let module = meta.and_then(|m| m.module.clone());

                if let Some(allowed) = scope.filter(|s| !s.is_empty()) {
                    match &module {
                        Some(m) if allowed.contains(m) => {}
                        _ => return None,
                    }
                }

                let premises = rule
                    .premises()
                    .iter()
                    .map(|atom| PremiseExplanation {
                        code: atom.to_string(),
                        label: self.kb.symptom_label(atom.as_str()),
                        satisfied: final_facts.contains(atom),
                        source: if patient_facts.contains(atom) {
                            PremiseSource::Patient
                        } else {
                            PremiseSource::Inferred
                        },
                    })
                    .collect();

                let code = rule.conclusion().as_str();
                let conclusion = ConclusionExplanation {
                    code: code.to_string(),
                    label: self
                        .kb
                        .disease_info(code)
                        .map(|d| d.label.clone())
                        .unwrap_or_else(|| self.kb.symptom_label(code)),
                    is_goal: goals.contains(code),
                };

                Some(RuleExplanation {
                    rule_id: meta
                        .map(|m| m.code.clone())
                        .unwrap_or_else(|| format!("Rule {}", step.rule_id)),
                    engine_id: step.rule_id,
                    module_label: module
                        .as_deref()
                        .map(|m| self.kb.module_label(m).to_string()),
                    module,
                    notes: meta.and_then(|m| m.notes.clone()),
                    confidence: meta.and_then(|m| m.confidence),
                    premises,
                    conclusion,
                    new_fact: step.new_fact.is_some(),
                    supports_diagnosis: chain.contains(&step.rule_id),
                })
            })
            .collect()
    }

    /// Escolhe a próxima pergunta ou encerra com um laudo.
    pub fn next_question(&self, answers: &AnswerMap) -> InterviewStep {
        let interview = self.kb.interview();

        if answers.is_empty() {
            if let Some(question) = interview
                .opening
                .as_deref()
                .and_then(|v| self.question_for_variable(v))
            {
                debug!(variable = %question.variable, "Entrevista: pergunta de abertura");
                return InterviewStep::Ask {
                    question: question.clone(),
                    reason: AskReason::Opening,
                };
            }
        }

        let evaluation = self.evaluate(answers);

        if let Some(disease) = &evaluation.diagnosed {
            if self.can_conclude(disease, answers) {
                debug!(disease = %disease, "Entrevista: parada antecipada");
                return InterviewStep::Done {
                    early: true,
                    report: Box::new(self.build_report(answers, evaluation)),
                };
            }
        }

        for fact in self.missing_premises(evaluation.result.final_facts()) {
            if let Some(question) = self.question_for_fact(&fact) {
                if !answers.is_answered(&question.variable) {
                    debug!(fact = %fact, variable = %question.variable, "Entrevista: premissa faltante");
                    return InterviewStep::Ask {
                        question: question.clone(),
                        reason: AskReason::MissingPremise { fact },
                    };
                }
            }
        }

        if let Some(question) = interview
            .questions
            .iter()
            .find(|q| !answers.is_answered(&q.variable))
        {
            return InterviewStep::Ask {
                question: question.clone(),
                reason: AskReason::BankOrder,
            };
        }

        InterviewStep::Done {
            early: false,
            report: Box::new(self.build_report(answers, evaluation)),
        }
    }

    fn can_conclude(&self, disease: &str, answers: &AnswerMap) -> bool {
        let interview = self.kb.interview();
        if interview.negative.as_deref() == Some(disease) {
            return false;
        }
        interview
            .refine
            .get(disease)
            .map_or(true, |vars| vars.iter().all(|v| answers.is_answered(v)))
    }

    /// Premissas que faltam às regras-alvo parcialmente satisfeitas, da mais
    /// frequente para a menos; empates na ordem em que aparecem.
    fn missing_premises(&self, known: &FactSet) -> Vec<String> {
        let interview = self.kb.interview();
        let targets: BTreeSet<&str> = if interview.target_conclusions.is_empty() {
            self.kb.diseases().iter().map(|d| d.variable.as_str()).collect()
        } else {
            interview
                .target_conclusions
                .iter()
                .map(String::as_str)
                .collect()
        };

        let mut counts: Vec<(String, usize)> = Vec::new();
        for rule in self.kb.knowledge_base().rules() {
            if !targets.contains(rule.conclusion().as_str()) {
                continue;
            }
            let missing: Vec<&str> = rule
                .premises()
                .iter()
                .filter(|p| !known.contains(*p))
                .map(|p| p.as_str())
                .collect();
            if missing.is_empty() || missing.len() == rule.premises().len() {
                continue;
            }
            for fact in missing {
                match counts.iter_mut().find(|(f, _)| f == fact) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((fact.to_string(), 1)),
                }
            }
        }

        // sort_by é estável: empates preservam a ordem de aparição
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(fact, _)| fact).collect()
    }

    fn question_for_variable(&self, variable: &str) -> Option<&'a Question> {
        self.kb
            .interview()
            .questions
            .iter()
            .find(|q| q.variable == variable)
    }

    /// Pergunta direta (variável == fato) ou via `derived_map`.
    fn question_for_fact(&self, fact: &str) -> Option<&'a Question> {
        self.question_for_variable(fact).or_else(|| {
            self.kb
                .interview()
                .derived_map
                .get(fact)
                .and_then(|v| self.question_for_variable(v))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medical::document::QuestionKind;
    use crate::medical::test_support::sinusitis_kb;
    use crate::medical::answers::Answer;
    use serde_json::json;

    fn answers(value: serde_json::Value) -> AnswerMap {
        serde_json::from_value(value).unwrap()
    }

    fn viral() -> AnswerMap {
        answers(json!({
            "thoi_gian_trieu_chung": 5,
            "loai_dich_mui": "Trong, loãng",
            "nghet_mui": true,
            "dau_vung_xoang_ham": true
        }))
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(Severity::from_label(Some("Mild")), Severity::Low);
        assert_eq!(Severity::from_label(Some("Moderate")), Severity::Medium);
        assert_eq!(Severity::from_label(Some("Severe")), Severity::High);
        assert_eq!(Severity::from_label(Some("Critical")), Severity::Critical);
        assert_eq!(Severity::from_label(Some("Info")), Severity::Info);
        assert_eq!(Severity::from_label(Some("Unknown")), Severity::Low);
        assert_eq!(Severity::from_label(None), Severity::Low);
    }

    #[test]
    fn viral_acute_sinusitis() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&viral());

        assert_eq!(report.diagnosis.disease, "viem_xoang_cap_do_virus");
        assert_eq!(report.diagnosis.severity, Severity::Low);
        assert!(report.diagnosis.success);
        assert_eq!(
            report.inferred_diseases,
            vec!["viem_xoang_cap_do_virus".to_string(), "viem_xoang_cap".to_string()]
        );
        assert!(report.extracted_facts.contains("trieu_chung_duoi_10_ngay"));
        assert_eq!(report.session_id.len(), 32);

        let codes: Vec<&str> = report.explanations.iter().map(|e| e.rule_id.as_str()).collect();
        assert_eq!(codes, vec!["R001", "R003", "R005", "R006", "R007"]);

        let r006 = &report.explanations[3];
        assert!(r006.conclusion.is_goal);
        assert_eq!(r006.module_label.as_deref(), Some("Chẩn đoán viêm xoang cấp"));
        let sources: Vec<(&str, PremiseSource)> = r006
            .premises
            .iter()
            .map(|p| (p.code.as_str(), p.source))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("dieu_kien_cap_day_du", PremiseSource::Inferred),
                ("nghet_mui", PremiseSource::Patient),
                ("dau_nang_mat", PremiseSource::Patient),
            ]
        );
        assert!(r006.premises.iter().all(|p| p.satisfied));
        assert!(report.explanations.iter().all(|e| e.supports_diagnosis));
    }

    #[test]
    fn red_flag_chain_excludes_acute_rules() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&answers(json!({
            "sung_quanh_mat": true,
            "thoi_gian_trieu_chung": 5,
            "loai_dich_mui": "Trong, loãng",
            "nghet_mui": true,
            "dau_vung_xoang_ham": true
        })));
        assert_eq!(report.diagnosis.disease, "nguy_co_bien_chung");

        let chain: Vec<&str> = report
            .explanations
            .iter()
            .filter(|e| e.supports_diagnosis)
            .map(|e| e.rule_id.as_str())
            .collect();
        assert_eq!(chain, vec!["R016"]);
        // regras agudas seguem no escopo, fora da cadeia
        assert!(report
            .explanations
            .iter()
            .any(|e| e.rule_id == "R006" && !e.supports_diagnosis));
    }

    #[test]
    fn bacterial_takes_priority_over_acute() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Queue, TieBreak::Min).diagnose(&answers(json!({
            "thoi_gian_trieu_chung": 14,
            "loai_dich_mui": "Đặc, vàng/xanh",
            "nghet_mui": true,
            "dau_vung_xoang_tran": true
        })));
        assert_eq!(report.diagnosis.disease, "viem_xoang_cap_do_vi_khuan");
        assert_eq!(report.diagnosis.severity, Severity::Medium);
        assert_eq!(report.strategy, Strategy::Queue);
    }

    #[test]
    fn red_flag_scopes_explanations() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&answers(json!({
            "sung_quanh_mat": true,
            "thoi_gian_trieu_chung": 120,
            "nghet_mui": true,
            "giam_khuu_giac": true
        })));
        assert_eq!(report.diagnosis.disease, "nguy_co_bien_chung");
        assert_eq!(report.diagnosis.severity, Severity::Critical);
        assert!(report.inferred_diseases.contains(&"viem_xoang_man_tinh".to_string()));
        // R012 (mạn tính) disparou mas está fora do escopo de biến chứng
        assert!(report.inference.fired_rules().len() > report.explanations.len());
        assert!(report
            .explanations
            .iter()
            .all(|e| e.module.as_deref() != Some("CHRONIC_DIAGNOSIS")));
        assert!(report.explanations.iter().any(|e| e.rule_id == "R016"));
    }

    #[test]
    fn nothing_inferred_falls_back_to_negative() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&AnswerMap::new());
        assert_eq!(report.diagnosis.disease, "khong_phai_viem_xoang");
        assert!(!report.diagnosis.success);
        assert_eq!(report.diagnosis.severity, Severity::Info);
        assert!(report.explanations.is_empty());
    }

    #[test]
    fn undetermined_without_negative() {
        let kb = MedicalKnowledgeBase::from_json(
            &json!({ "rules": [{ "premises": ["a"], "conclusion": "b" }] }).to_string(),
        )
        .unwrap();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&AnswerMap::new());
        assert_eq!(report.diagnosis.disease, UNDETERMINED);
        assert_eq!(report.diagnosis.severity_raw, "Unknown");
        assert_eq!(report.diagnosis.severity, Severity::Low);
    }

    #[test]
    fn recommendation_sections() {
        let kb = sinusitis_kb();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&viral());
        let lines = report.recommendation_lines();
        assert_eq!(lines[0].section.as_deref(), Some("summary"));
        assert!(lines.iter().any(|l| l.section.as_deref() == Some("home_care")));
        assert!(lines.iter().all(|l| !l.text.starts_with('@')));
    }

    #[test]
    fn interview_opens_with_duration() {
        let kb = sinusitis_kb();
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).next_question(&AnswerMap::new());
        match step {
            InterviewStep::Ask { question, reason } => {
                assert_eq!(question.variable, "thoi_gian_trieu_chung");
                assert_eq!(question.kind, QuestionKind::Number);
                assert_eq!(reason, AskReason::Opening);
            }
            other => panic!("esperava pergunta, veio {:?}", other),
        }
    }

    #[test]
    fn interview_falls_back_to_bank_order() {
        let kb = sinusitis_kb();
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min)
            .next_question(&answers(json!({ "thoi_gian_trieu_chung": 5 })));
        match step {
            InterviewStep::Ask { question, reason } => {
                assert_eq!(question.variable, "sung_quanh_mat");
                assert_eq!(reason, AskReason::BankOrder);
            }
            other => panic!("esperava pergunta, veio {:?}", other),
        }
    }

    #[test]
    fn interview_asks_for_most_wanted_premise() {
        let kb = sinusitis_kb();
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).next_question(&answers(json!({
            "thoi_gian_trieu_chung": 5,
            "sung_quanh_mat": false,
            "nhin_mo": false,
            "dau_dau_du_doi": false,
            "cung_gay": false,
            "nghet_mui": true,
            "dau_vung_xoang_ham": true
        })));
        match step {
            InterviewStep::Ask { question, reason } => {
                // trieu_chung_keo_dai_12_tuan é a mais frequente, mas sua
                // pergunta já foi respondida
                assert_eq!(question.variable, "loai_dich_mui");
                assert_eq!(
                    reason,
                    AskReason::MissingPremise {
                        fact: "dieu_kien_cap_day_du".into()
                    }
                );
            }
            other => panic!("esperava pergunta, veio {:?}", other),
        }
    }

    #[test]
    fn interview_stops_early_on_diagnosis() {
        let kb = sinusitis_kb();
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).next_question(&viral());
        match step {
            InterviewStep::Done { early, report } => {
                assert!(early);
                assert_eq!(report.diagnosis.disease, "viem_xoang_cap_do_virus");
            }
            other => panic!("esperava laudo, veio {:?}", other),
        }
    }

    #[test]
    fn negative_conclusion_keeps_asking() {
        let kb = sinusitis_kb();
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).next_question(&answers(json!({
            "co_di_ung": true,
            "hat_hoi": true,
            "loai_dich_mui": "Trong, loãng"
        })));
        assert!(matches!(step, InterviewStep::Ask { .. }));
    }

    #[test]
    fn refinable_diagnosis_waits_for_refine_variables() {
        let kb = MedicalKnowledgeBase::from_json(
            &json!({
                "diseases": [{ "variable": "x", "label": "X" }],
                "rules": [{ "premises": ["a"], "conclusion": "x" }],
                "interview": {
                    "questions": [
                        { "id": "a", "variable": "a", "type": "boolean", "label": "A?" },
                        { "id": "b", "variable": "b", "type": "boolean", "label": "B?" }
                    ],
                    "priority_order": ["x"],
                    "refine": { "x": ["b"] }
                }
            })
            .to_string(),
        )
        .unwrap();
        let service = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min);

        let step = service.next_question(&answers(json!({ "a": true })));
        assert!(matches!(step, InterviewStep::Ask { ref question, .. } if question.variable == "b"));

        let step = service.next_question(&answers(json!({ "a": true, "b": false })));
        assert!(matches!(step, InterviewStep::Done { early: true, .. }));
    }

    #[test]
    fn exhausted_bank_finishes() {
        let kb = sinusitis_kb();
        let mut all = AnswerMap::new();
        for q in &kb.interview().questions {
            let answer = match q.kind {
                QuestionKind::Boolean => Answer::Bool(false),
                QuestionKind::Number => Answer::Number(q.min.unwrap_or(0.0)),
                QuestionKind::Radio => Answer::Text(q.options[0].clone()),
            };
            all.insert(q.variable.clone(), answer);
        }
        let step = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).next_question(&all);
        match step {
            InterviewStep::Done { early, report } => {
                assert!(!early);
                assert_eq!(report.diagnosis.disease, "khong_phai_viem_xoang");
                assert!(!report.diagnosis.success);
            }
            other => panic!("esperava laudo, veio {:?}", other),
        }
    }
}
