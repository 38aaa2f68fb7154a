//! # KnowledgeBase — Contêiner de Regras
//!
//! A [`KnowledgeBase`] é a coleção **ordenada e append-only** de [`Rule`]s
//! sobre a qual o motor de inferência trabalha.
//!
//! ## Invariantes
//!
//! - Ids são atribuídos na inserção: a regra `i` está na posição `i`
//!   (`ids` densos em `[0, len)`).
//! - Regras nunca são removidas nem alteradas — remoção é uma operação de
//!   autoria, feita regenerando o arquivo da base.
//! - Uma inserção que falha no parse **não altera** a base.
//!
//! ## Interning de Átomos
//!
//! Todas as ocorrências de um mesmo token compartilham a mesma alocação
//! (`atoms: HashSet<Atom>`). Com ~50 regras e ~40 variáveis a economia é
//! pequena, mas as comparações de conjunto ficam baratas.
//!
//! ## Concorrência
//!
//! Durante a inferência a base é só leitura, então pode ser compartilhada
//! via `&KnowledgeBase` / `Arc` entre execuções simultâneas. Quem adiciona
//! regras concorrentemente com inferências é responsável por serializar o
//! acesso — o servidor web monta a base no startup e nunca mais a altera.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! let mut kb = KnowledgeBase::new();
//! let r = kb.add_rule_from_text("nghet_mui ^ dau_nang_mat -> nghi_viem_xoang")?;
//! assert_eq!(r.id(), 0);
//! assert_eq!(kb.len(), 1);
//! ```

use std::collections::HashSet;

use super::atom::Atom;
use super::error::MalformedRuleError;
use super::rule::{check_token, parse_rule_text, Rule, RuleId, ARROW};

/// Base de regras in-memory.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeBase {
    /// Nome usado nos logs (ex: "Sinusitis KB").
    name: String,
    /// Regras em ordem de inserção — `rules[i].id() == i`.
    rules: Vec<Rule>,
    /// Pool de átomos para interning.
    atoms: HashSet<Atom>,
}

impl KnowledgeBase {
    /// Cria uma base vazia e sem nome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria uma base vazia com nome para logs.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faz o parse de `"a ^ b -> c"` e adiciona a regra com o próximo id.
    ///
    /// Retorna a regra criada para que o chamador possa associar metadados
    /// externos (confiança, notas, módulo) ao id — o núcleo não guarda nada
    /// além de premissas e conclusão.
    ///
    /// # Erros
    ///
    /// [`MalformedRuleError`] se o texto violar a gramática. Nesse caso a
    /// base permanece inalterada.
    pub fn add_rule_from_text(&mut self, text: &str) -> Result<Rule, MalformedRuleError> {
        let parsed = parse_rule_text(text)?;
        Ok(self.push_rule(&parsed.premises, parsed.conclusion))
    }

    /// Variante estruturada de [`add_rule_from_text`](Self::add_rule_from_text):
    /// recebe premissas e conclusão já separadas e aplica as mesmas
    /// validações de token.
    pub fn add_rule<S: AsRef<str>>(
        &mut self,
        premises: &[S],
        conclusion: &str,
    ) -> Result<Rule, MalformedRuleError> {
        let display = || {
            let lhs: Vec<&str> = premises.iter().map(|p| p.as_ref()).collect();
            format!("{} {} {}", lhs.join(" ^ "), ARROW, conclusion)
        };

        if premises.is_empty() {
            return Err(MalformedRuleError::EmptyPremises { text: display() });
        }
        let conclusion = conclusion.trim();
        if conclusion.is_empty() {
            return Err(MalformedRuleError::EmptyConclusion { text: display() });
        }
        check_token(conclusion, &display())?;

        let mut tokens: Vec<&str> = Vec::with_capacity(premises.len());
        for premise in premises {
            let token = premise.as_ref().trim();
            check_token(token, &display())?;
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Ok(self.push_rule(&tokens, conclusion))
    }

    /// Insere tokens já validados — único ponto que atribui ids.
    fn push_rule(&mut self, premises: &[&str], conclusion: &str) -> Rule {
        let id = self.rules.len();
        let premises: Vec<Atom> = premises.iter().map(|p| self.intern(p)).collect();
        let conclusion = self.intern(conclusion);
        let rule = Rule::new(id, premises, conclusion);
        tracing::debug!(id, rule = %rule, "KB: regra adicionada");
        self.rules.push(rule.clone());
        rule
    }

    /// Retorna o átomo compartilhado para `token`, criando-o se necessário.
    pub fn intern(&mut self, token: &str) -> Atom {
        if let Some(existing) = self.atoms.get(token) {
            return existing.clone();
        }
        let atom = Atom::new(token);
        self.atoms.insert(atom.clone());
        atom
    }

    /// Todas as regras, em ordem de id.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Busca O(1) por id (o id é a posição).
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Número de regras.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Regras cuja conclusão é `atom` — usado pelo validador para achar
    /// diagnósticos que nenhuma regra conclui.
    pub fn rules_concluding<'a>(&'a self, atom: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.conclusion().as_str() == atom)
    }
}
