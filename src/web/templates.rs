//! # Templates Maud — HTML Server-Side Rendering
//!
//! Páginas renderizadas com o macro [`maud`](https://maud.lambda.xyz/).
//! A entrevista roda num script inline pequeno que conversa com a API JSON;
//! o laudo final é HTML puro, sem JavaScript.
//!
//! | Função | Descrição |
//! |--------|-----------|
//! | [`landing_page()`] | Metadados da base + entrevista pergunta a pergunta |
//! | [`results_page()`] | Diagnóstico, recomendações e regras disparadas |
//! | [`error_page()`] | Laudo ausente ou id inválido |
//!
//! ## Layout do Laudo
//!
//! ```text
//! ┌──────────────── nav-bar ─────────────────────┐
//! │ DA │ Nova entrevista                        │
//! ├──────────────────────────────────────────────┤
//! │ [gravidade] Diagnóstico  (CID-10)            │
//! │ Recomendações por seção                      │
//! │ Sintomas informados                          │
//! │ Tabela: regra │ módulo │ premissas → concl.  │
//! │ Estatísticas da inferência                   │
//! └──────────────────────────────────────────────┘
//! ```

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::diagnosis::{DiagnosisReport, PremiseSource, RuleExplanation, Severity};
use crate::medical::{MedicalKnowledgeBase, ValidationReport};

/// Título de cada seção `@seção:` das recomendações.
fn section_title(section: &str) -> &str {
    match section {
        "summary" => "Resumo",
        "home_care" => "Cuidados em casa",
        "medical_visit" => "Quando procurar o médico",
        "follow_up" => "Acompanhamento",
        "emergency" => "Emergência",
        other => other,
    }
}

fn severity_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "Leve",
        Severity::Medium => "Moderada",
        Severity::High => "Grave",
        Severity::Critical => "Crítica",
        Severity::Info => "Informativo",
    }
}

fn row_class(rule: &RuleExplanation) -> Option<&'static str> {
    match (rule.supports_diagnosis, rule.new_fact) {
        (true, true) => Some("chain"),
        (true, false) => Some("chain redundant"),
        (false, false) => Some("redundant"),
        (false, true) => None,
    }
}

/// Casca comum: head, nav-bar e conteúdo.
fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="/assets/style.css";
            }
            body {
                div class="app-shell" {
                    nav class="nav-bar" {
                        a href="/" class="nav-brand" {
                            span class="nav-brand-icon" { "DA" }
                            span class="nav-brand-text" { "Diagnostic " em { "Advisor" } }
                        }
                        div class="nav-links" {
                            a href="/" class="nav-link" {
                                span class="nav-link-icon" { "🩺" }
                                span class="nav-link-label" { "Nova entrevista" }
                            }
                        }
                    }
                    main class="content" {
                        (body)
                    }
                }
            }
        }
    }
}

/// Página inicial — metadados da base e a entrevista.
///
/// O script inline mantém as respostas num objeto, chama
/// `/api/next_question` a cada resposta e redireciona para `result_url`
/// quando a entrevista termina. "Diagnosticar agora" usa `/api/diagnose`
/// com o que já foi respondido.
pub fn landing_page(kb: &MedicalKnowledgeBase, validation: &ValidationReport) -> Markup {
    let doc = kb.document();
    let modules = &kb.metadata().modules;

    page(
        kb.name(),
        html! {
            section class="card kb-card" {
                h1 { (kb.name()) }
                @if !doc.version.is_empty() {
                    span class="badge" { "v" (doc.version) }
                }
                @if !doc.description.is_empty() {
                    p class="muted" { (doc.description) }
                }
                div class="kb-stats" {
                    span { (validation.total_rules) " regras" }
                    span { (validation.total_symptoms) " sintomas" }
                    span { (validation.total_diseases) " diagnósticos" }
                }
                @if !modules.is_empty() {
                    ul class="module-list" {
                        @for module in modules {
                            li {
                                code { (module.code) } " " (module.name)
                                span class="muted small" {
                                    " · " (kb.rules_by_module(&module.code).len()) " regras"
                                }
                            }
                        }
                    }
                }
                @if !validation.warnings.is_empty() {
                    details class="warnings" {
                        summary { "⚠️ " (validation.warnings.len()) " avisos de validação" }
                        ul {
                            @for warning in &validation.warnings {
                                li { (warning) }
                            }
                        }
                    }
                }
            }

            section class="card interview" {
                h2 { "Entrevista" }
                p class="muted" {
                    "Responda uma pergunta por vez. A entrevista termina assim que "
                    "houver um diagnóstico."
                }
                div id="question" class="question" { "Carregando..." }
                div class="interview-actions" {
                    span id="progress" class="muted" {}
                    button id="diagnose-now" class="secondary" type="button" { "Diagnosticar agora" }
                }
                div id="interview-error" class="error" {}
            }

            (PreEscaped(INTERVIEW_SCRIPT))
        },
    )
}

const INTERVIEW_SCRIPT: &str = r#"<script>
(function() {
  var answers = {};
  var box = document.getElementById('question');
  var progress = document.getElementById('progress');
  var errorBox = document.getElementById('interview-error');

  function post(url) {
    return fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ answers: answers })
    }).then(function(r) { return r.json(); });
  }

  function button(text, onClick) {
    var b = document.createElement('button');
    b.type = 'button';
    b.textContent = text;
    b.addEventListener('click', onClick);
    return b;
  }

  function answer(variable, value) {
    answers[variable] = value;
    step();
  }

  function render(q) {
    box.innerHTML = '';
    var label = document.createElement('p');
    label.className = 'question-label';
    label.textContent = q.label;
    box.appendChild(label);

    var controls = document.createElement('div');
    controls.className = 'question-controls';
    if (q.type === 'boolean') {
      controls.appendChild(button('Sim', function() { answer(q.variable, true); }));
      controls.appendChild(button('Não', function() { answer(q.variable, false); }));
    } else if (q.type === 'number') {
      var input = document.createElement('input');
      input.type = 'number';
      if (q.min !== undefined) input.min = q.min;
      if (q.max !== undefined) input.max = q.max;
      if (q.step !== undefined) input.step = q.step;
      controls.appendChild(input);
      controls.appendChild(button('Responder', function() {
        if (input.value === '') return;
        answer(q.variable, Number(input.value));
      }));
    } else {
      (q.options || []).forEach(function(opt) {
        controls.appendChild(button(opt, function() { answer(q.variable, opt); }));
      });
    }
    box.appendChild(controls);
    progress.textContent = Object.keys(answers).length + ' respostas';
  }

  function handle(data) {
    if (!data.ok) {
      errorBox.textContent = data.error || 'erro';
      return;
    }
    if (data.done || data.result_url) {
      window.location.href = data.result_url;
      return;
    }
    render(data.question);
  }

  function fail(e) { errorBox.textContent = String(e); }

  function step() {
    errorBox.textContent = '';
    post('/api/next_question').then(handle).catch(fail);
  }

  document.getElementById('diagnose-now').addEventListener('click', function() {
    post('/api/diagnose').then(handle).catch(fail);
  });

  step();
})();
</script>"#;

/// Laudo completo de uma sessão.
pub fn results_page(report: &DiagnosisReport, kb: &MedicalKnowledgeBase) -> Markup {
    let diagnosis = &report.diagnosis;
    let inference = &report.inference;
    let derived = inference.derived_facts();
    let others: Vec<&String> = report
        .inferred_diseases
        .iter()
        .filter(|d| **d != diagnosis.disease)
        .collect();
    let chain: Vec<_> = report
        .explanations
        .iter()
        .filter(|rule| rule.supports_diagnosis)
        .collect();

    // linhas consecutivas da mesma seção ficam sob um único título
    let mut grouped: Vec<(Option<String>, Vec<String>)> = Vec::new();
    for line in report.recommendation_lines() {
        match grouped.last_mut() {
            Some((section, texts)) if *section == line.section => texts.push(line.text),
            _ => grouped.push((line.section, vec![line.text])),
        }
    }

    page(
        &format!("Laudo — {}", diagnosis.disease_label),
        html! {
            section class={ "card diagnosis severity-" (diagnosis.severity.as_str()) } {
                span class="badge severity" { (severity_title(diagnosis.severity)) }
                h1 { (diagnosis.disease_label) }
                @if let Some(icd10) = &diagnosis.icd10 {
                    span class="muted" { "CID-10 " (icd10) }
                }
                @if !diagnosis.success {
                    p class="muted" { "Nenhum diagnóstico foi inferido a partir das respostas." }
                }
                @if !others.is_empty() {
                    p class="muted" {
                        "Também inferidos: "
                        @for (i, code) in others.iter().enumerate() {
                            @if i > 0 { ", " }
                            (kb.symptom_label(code))
                        }
                    }
                }
                p class="muted small" {
                    "Sessão " code { (report.session_id) } " · "
                    (report.created_at.format("%d/%m/%Y %H:%M UTC"))
                }
            }

            section class="card" {
                h2 { "Recomendações" }
                @for (section, texts) in &grouped {
                    @match section {
                        Some(section) => {
                            div class={ "recommendation section-" (section) } {
                                h3 { (section_title(section)) }
                                @for text in texts { p { (text) } }
                            }
                        }
                        None => {
                            @for text in texts { p class="recommendation" { (text) } }
                        }
                    }
                }
            }

            section class="card" {
                h2 { "Sintomas informados" }
                @if report.extracted_facts.is_empty() {
                    p class="muted" { "Nenhum sintoma confirmado." }
                } @else {
                    ul class="fact-list" {
                        @for fact in &report.extracted_facts {
                            li { (kb.symptom_label(fact.as_str())) }
                        }
                    }
                }
            }

            section class="card" {
                h2 { "Como chegamos aqui" }
                @if report.explanations.is_empty() {
                    p class="muted" { "Nenhuma regra disparou." }
                } @else {
                    @if !chain.is_empty() {
                        ol class="derivation-chain" {
                            @for rule in &chain {
                                li {
                                    code { (rule.rule_id) } " → " (rule.conclusion.label)
                                }
                            }
                        }
                    }
                    table class="explanations" {
                        thead {
                            tr {
                                th { "Regra" }
                                th { "Módulo" }
                                th { "Premissas" }
                                th { "Conclusão" }
                            }
                        }
                        tbody {
                            @for rule in &report.explanations {
                                tr class=[row_class(rule)] {
                                    td {
                                        code { (rule.rule_id) }
                                        @if let Some(confidence) = rule.confidence {
                                            br;
                                            span class="muted small" { (format!("{:.0}%", confidence * 100.0)) }
                                        }
                                    }
                                    td { (rule.module_label.as_deref().unwrap_or("—")) }
                                    td {
                                        ul class="premises" {
                                            @for premise in &rule.premises {
                                                li class=[(premise.source == PremiseSource::Inferred).then_some("inferred")] {
                                                    (premise.label)
                                                    @if premise.source == PremiseSource::Inferred {
                                                        " " span class="muted small" { "(inferido)" }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                    td class=[rule.conclusion.is_goal.then_some("goal")] {
                                        (rule.conclusion.label)
                                        @if let Some(notes) = &rule.notes {
                                            br;
                                            span class="muted small" { (notes) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            section class="card stats" {
                h2 { "Inferência" }
                div class="kb-stats" {
                    span { "Estratégia: " code { (report.strategy.as_str()) } }
                    span { "Desempate: " code { (report.tie_break.as_str()) } }
                    span { (inference.fired_rules().len()) " regras disparadas" }
                    span { (inference.initial_facts().len()) " fatos iniciais" }
                    span { (derived.len()) " fatos derivados" }
                }
            }
        },
    )
}

/// Página de erro simples (laudo inexistente, id inválido).
pub fn error_page(message: &str) -> Markup {
    page(
        "Laudo indisponível",
        html! {
            section class="card" {
                h1 { "Laudo indisponível" }
                p { (message) }
                a href="/" { "← Voltar para a entrevista" }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::DiagnosisService;
    use crate::inference::{Strategy, TieBreak};
    use crate::medical::test_support::sinusitis_kb;
    use serde_json::json;

    #[test]
    fn landing_lists_modules() {
        let kb = sinusitis_kb();
        let html = landing_page(&kb, &kb.validate()).into_string();
        assert!(html.contains("Sinusitis KB"));
        assert!(html.contains("/api/next_question"));
        for module in &kb.metadata().modules {
            assert!(html.contains(&module.code));
        }
        // ACUTE_CONTEXT tem R001..R005
        assert!(html.contains(" · 5 regras"));
    }

    #[test]
    fn results_show_sections_and_rules() {
        let kb = sinusitis_kb();
        let answers = serde_json::from_value(json!({
            "thoi_gian_trieu_chung": 5,
            "loai_dich_mui": "Trong, loãng",
            "nghet_mui": true,
            "dau_vung_xoang_ham": true
        }))
        .unwrap();
        let report = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&answers);
        let html = results_page(&report, &kb).into_string();

        assert!(html.contains("severity-low"));
        assert!(html.contains("Viêm xoang cấp do virus"));
        assert!(html.contains("Cuidados em casa"));
        assert!(html.contains("R007"));
        assert!(html.contains("derivation-chain"));
        assert!(html.contains(r#"<tr class="chain">"#));
        assert!(html.contains(&report.session_id));
    }

    #[test]
    fn error_page_escapes_message() {
        let html = error_page("<script>x</script>").into_string();
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
