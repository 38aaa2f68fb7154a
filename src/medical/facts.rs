//! Extração de fatos iniciais a partir das respostas do paciente.

use tracing::{debug, warn};

use crate::core::{Atom, FactSet};

use super::answers::AnswerMap;
use super::loader::MedicalKnowledgeBase;

/// Fatos observados: os das `fact_rules` cuja condição vale, mais toda
/// variável respondida com um "sim" explícito.
///
/// Uma condição que não consegue ser avaliada (resposta do tipo errado) é
/// registrada em `warn` e ignorada; as demais continuam.
pub fn extract_facts(answers: &AnswerMap, kb: &MedicalKnowledgeBase) -> FactSet {
    let mut facts = FactSet::new();

    for rule in kb.fact_rules() {
        match rule.condition.evaluate(answers) {
            Ok(true) => {
                facts.insert(Atom::new(&rule.fact));
            }
            Ok(false) => {}
            Err(e) => {
                warn!(fact = %rule.fact, condition = %rule.condition, error = %e, "Fatos: condição ignorada");
            }
        }
    }

    for (variable, answer) in answers.iter() {
        if answer.is_affirmative() {
            facts.insert(Atom::new(variable));
        }
    }

    debug!(answers = answers.len(), facts = facts.len(), "Fatos extraídos");
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medical::answers::Answer;
    use crate::medical::test_support::sinusitis_kb;

    #[test]
    fn duration_and_discharge_become_facts() {
        let kb = sinusitis_kb();
        let mut answers = AnswerMap::new();
        answers.insert("thoi_gian_trieu_chung", Answer::Number(14.0));
        answers.insert("loai_dich_mui", Answer::Text("Đặc, vàng/xanh".into()));
        answers.insert("nghet_mui", Answer::Bool(true));
        answers.insert("ho", Answer::Bool(false));

        let facts = extract_facts(&answers, &kb);
        assert!(facts.contains("trieu_chung_tren_10_ngay"));
        assert!(!facts.contains("trieu_chung_duoi_10_ngay"));
        assert!(facts.contains("chay_mui_dac"));
        assert!(facts.contains("nghet_mui"));
        assert!(!facts.contains("ho"));
        // números não viram fatos diretos
        assert!(!facts.contains("thoi_gian_trieu_chung"));
    }

    #[test]
    fn fever_thresholds() {
        let kb = sinusitis_kb();
        let mut answers = AnswerMap::new();
        answers.insert("nhiet_do", Answer::Number(39.2));
        let facts = extract_facts(&answers, &kb);
        assert!(facts.contains("sot"));
        assert!(facts.contains("sot_cao"));
    }

    #[test]
    fn mistyped_answer_skips_only_that_condition() {
        let kb = sinusitis_kb();
        let mut answers = AnswerMap::new();
        answers.insert("nhiet_do", Answer::Text("nóng".into()));
        answers.insert("thoi_gian_trieu_chung", Answer::Number(3.0));
        let facts = extract_facts(&answers, &kb);
        assert!(!facts.contains("sot"));
        assert!(facts.contains("trieu_chung_duoi_10_ngay"));
    }

    #[test]
    fn either_pain_location_gives_facial_pain() {
        let kb = sinusitis_kb();
        let mut answers = AnswerMap::new();
        answers.insert("dau_vung_xoang_tran", Answer::Bool(true));
        let facts = extract_facts(&answers, &kb);
        assert!(facts.contains("dau_nang_mat"));
    }
}
