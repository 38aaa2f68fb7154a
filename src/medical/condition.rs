//! # Condições sobre Respostas
//!
//! As `fact_rules` da base traduzem respostas brutas em fatos através de
//! pequenas expressões:
//!
//! ```text
//! thoi_gian_trieu_chung >= 10 && thoi_gian_trieu_chung < 84
//! loai_dich_mui === 'Đặc, vàng/xanh'
//! dau_vung_xoang_ham || dau_vung_xoang_tran
//! ```
//!
//! ## Gramática
//!
//! ```text
//! expr := all (("||" | " v ") all)*
//! all  := cmp (("&&" | " ^ ") cmp)*
//! cmp  := variável op literal | variável
//! op   := > | >= | < | <= | === | !== | == | !=
//! lit  := número | true | false | 'texto' | "texto"
//! ```
//!
//! Separadores dentro de aspas não contam, então `'Trong, loãng'` é um
//! literal só. Tudo é validado no parse (momento da carga da base); a
//! avaliação só falha quando a *resposta* não tem o tipo que a comparação
//! exige.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::answers::{Answer, AnswerMap};
use super::error::{ConditionError, EvalError};

const ANY_SEPARATORS: &[&str] = &["||", " v "];
const ALL_SEPARATORS: &[&str] = &["&&", " ^ "];

/// Operador de comparação. `===`/`==` e `!==`/`!=` são sinônimos.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            "===" | "==" => Some(CompareOp::Eq),
            "!==" | "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    fn is_ordering(self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "===",
            CompareOp::Ne => "!==",
        }
    }
}

/// Lado direito de uma comparação.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Expressão já parseada.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Compare {
        variable: String,
        op: CompareOp,
        literal: Literal,
    },
    /// Variável sozinha: verdadeira quando a resposta é um "sim".
    Flag(String),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

/// Regexes da gramática, compiladas uma vez.
struct ConditionParser {
    compare_re: Regex,
    flag_re: Regex,
}

impl ConditionParser {
    fn new() -> Self {
        Self {
            compare_re: Regex::new(
                r"^([A-Za-z_][A-Za-z0-9_]*)\s*(===|!==|==|!=|>=|<=|>|<)\s*(.+)$",
            )
            .unwrap(),
            flag_re: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap(),
        }
    }

    fn shared() -> &'static ConditionParser {
        static PARSER: OnceLock<ConditionParser> = OnceLock::new();
        PARSER.get_or_init(ConditionParser::new)
    }

    fn parse_any(&self, expr: &str) -> Result<Condition, ConditionError> {
        let parts = split_unquoted(expr, ANY_SEPARATORS);
        if parts.len() == 1 {
            return self.parse_all(parts[0]);
        }
        let branches = parts
            .into_iter()
            .map(|part| self.parse_all(part))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Condition::Any(branches))
    }

    fn parse_all(&self, expr: &str) -> Result<Condition, ConditionError> {
        let parts = split_unquoted(expr, ALL_SEPARATORS);
        if parts.len() == 1 {
            return self.parse_comparison(parts[0]);
        }
        let terms = parts
            .into_iter()
            .map(|part| self.parse_comparison(part))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Condition::All(terms))
    }

    fn parse_comparison(&self, expr: &str) -> Result<Condition, ConditionError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(ConditionError::Empty);
        }

        if self.flag_re.is_match(expr) {
            return Ok(Condition::Flag(expr.to_string()));
        }

        let Some(caps) = self.compare_re.captures(expr) else {
            return if expr.contains(['=', '<', '>', '!']) {
                Err(ConditionError::UnknownOperator(expr.to_string()))
            } else {
                Err(ConditionError::Invalid(expr.to_string()))
            };
        };

        let variable = caps[1].to_string();
        let op = CompareOp::from_symbol(&caps[2])
            .ok_or_else(|| ConditionError::UnknownOperator(expr.to_string()))?;
        let literal = parse_literal(caps[3].trim(), expr)?;

        if op.is_ordering() && !matches!(literal, Literal::Number(_)) {
            return Err(ConditionError::NonNumericOrdering(expr.to_string()));
        }

        Ok(Condition::Compare {
            variable,
            op,
            literal,
        })
    }
}

fn parse_literal(raw: &str, expr: &str) -> Result<Literal, ConditionError> {
    let bad = || ConditionError::BadLiteral {
        literal: raw.to_string(),
        expr: expr.to_string(),
    };

    for quote in ['\'', '"'] {
        if raw.starts_with(quote) {
            return match raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
                Some(inner) if !inner.contains(quote) => Ok(Literal::Text(inner.to_string())),
                _ => Err(bad()),
            };
        }
    }

    match raw {
        "true" => Ok(Literal::Bool(true)),
        "false" => Ok(Literal::Bool(false)),
        _ => raw.parse::<f64>().map(Literal::Number).map_err(|_| bad()),
    }
}

/// Divide `expr` em qualquer separador que esteja fora de aspas.
fn split_unquoted<'a>(expr: &'a str, separators: &[&str]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut i = 0;

    while i < expr.len() {
        let rest = &expr[i..];
        let Some(ch) = rest.chars().next() else { break };

        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None => {
                if let Some(sep) = separators.iter().find(|sep| rest.starts_with(**sep)) {
                    parts.push(&expr[start..i]);
                    i += sep.len();
                    start = i;
                    continue;
                }
            }
        }
        i += ch.len_utf8();
    }

    parts.push(&expr[start..]);
    parts
}

/// Texto canônico para igualdade: NFC + trim.
fn normalize(text: &str) -> String {
    text.trim().nfc().collect()
}

fn answer_text(answer: &Answer) -> String {
    match answer {
        Answer::Text(s) => normalize(s),
        other => other.to_string(),
    }
}

impl Condition {
    /// Parse de uma expressão completa.
    pub fn parse(expr: &str) -> Result<Condition, ConditionError> {
        if expr.trim().is_empty() {
            return Err(ConditionError::Empty);
        }
        ConditionParser::shared().parse_any(expr)
    }

    /// Avalia contra as respostas.
    ///
    /// Variável sem resposta torna a comparação falsa, exceto `!==`, que
    /// fica verdadeira (o valor ausente é diferente de qualquer literal).
    pub fn evaluate(&self, answers: &AnswerMap) -> Result<bool, EvalError> {
        match self {
            Condition::Flag(variable) => match answers.get(variable) {
                None => Ok(false),
                Some(answer) => answer.as_bool().map_err(|source| EvalError::Coercion {
                    variable: variable.clone(),
                    source,
                }),
            },
            Condition::Compare {
                variable,
                op,
                literal,
            } => match answers.get(variable) {
                None => Ok(*op == CompareOp::Ne),
                Some(answer) => compare(variable, answer, *op, literal),
            },
            Condition::All(terms) => {
                for term in terms {
                    if !term.evaluate(answers)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(branches) => {
                for branch in branches {
                    if branch.evaluate(answers)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Variáveis referenciadas, na ordem em que aparecem, sem repetição.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Flag(variable) | Condition::Compare { variable, .. } => {
                if !out.contains(&variable.as_str()) {
                    out.push(variable);
                }
            }
            Condition::All(children) | Condition::Any(children) => {
                for child in children {
                    child.collect_variables(out);
                }
            }
        }
    }
}

fn compare(
    variable: &str,
    answer: &Answer,
    op: CompareOp,
    literal: &Literal,
) -> Result<bool, EvalError> {
    let not_numeric = || EvalError::NotNumeric {
        variable: variable.to_string(),
        value: answer.to_string(),
    };

    let equal = match literal {
        Literal::Number(expected) => {
            let actual = answer.as_number().ok_or_else(not_numeric)?;
            return Ok(match op {
                CompareOp::Gt => actual > *expected,
                CompareOp::Ge => actual >= *expected,
                CompareOp::Lt => actual < *expected,
                CompareOp::Le => actual <= *expected,
                CompareOp::Eq => actual == *expected,
                CompareOp::Ne => actual != *expected,
            });
        }
        Literal::Bool(expected) => {
            let actual = answer.as_bool().map_err(|source| EvalError::Coercion {
                variable: variable.to_string(),
                source,
            })?;
            actual == *expected
        }
        Literal::Text(expected) => answer_text(answer) == normalize(expected),
    };

    Ok(match op {
        CompareOp::Eq => equal,
        CompareOp::Ne => !equal,
        // ordenação com literal não numérico é rejeitada no parse
        _ => false,
    })
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Flag(variable) => write!(f, "{}", variable),
            Condition::Compare {
                variable,
                op,
                literal,
            } => write!(f, "{} {} {}", variable, op.symbol(), literal),
            Condition::All(terms) => join(f, terms, " && "),
            Condition::Any(branches) => join(f, branches, " || "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: &[Condition], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, Answer)]) -> AnswerMap {
        let mut map = AnswerMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.clone());
        }
        map
    }

    #[test]
    fn parses_range_conjunction() {
        let cond = Condition::parse("thoi_gian >= 10 && thoi_gian < 84").unwrap();
        match &cond {
            Condition::All(terms) => assert_eq!(terms.len(), 2),
            other => panic!("esperava All, veio {:?}", other),
        }
        assert_eq!(cond.variables(), vec!["thoi_gian"]);

        let inside = answers(&[("thoi_gian", Answer::Number(14.0))]);
        let outside = answers(&[("thoi_gian", Answer::Number(90.0))]);
        assert!(cond.evaluate(&inside).unwrap());
        assert!(!cond.evaluate(&outside).unwrap());
    }

    #[test]
    fn alternative_separators() {
        let any = Condition::parse("a v b").unwrap();
        let all = Condition::parse("a ^ b").unwrap();
        let only_b = answers(&[("b", Answer::Bool(true))]);
        assert!(any.evaluate(&only_b).unwrap());
        assert!(!all.evaluate(&only_b).unwrap());
    }

    #[test]
    fn quoted_text_keeps_separators() {
        let cond = Condition::parse("loai_dich_mui === 'Trong, loãng || đục'").unwrap();
        assert!(matches!(cond, Condition::Compare { .. }));
    }

    #[test]
    fn text_equality_is_normalized() {
        let cond = Condition::parse("loai_dich_mui === 'Đặc, vàng/xanh'").unwrap();
        // mesma string em forma decomposta (NFD) e com espaços
        let decomposed: String = "Đặc, vàng/xanh".nfd().collect();
        let a = answers(&[("loai_dich_mui", Answer::Text(format!("  {}  ", decomposed)))]);
        assert!(cond.evaluate(&a).unwrap());
    }

    #[test]
    fn boolean_literal_uses_explicit_coercion() {
        let cond = Condition::parse("co_di_ung === true").unwrap();
        assert!(cond.evaluate(&answers(&[("co_di_ung", Answer::Text("true".into()))])).unwrap());
        assert!(cond.evaluate(&answers(&[("co_di_ung", Answer::Number(1.0))])).unwrap());
        assert!(cond.evaluate(&answers(&[("co_di_ung", Answer::Text("có".into()))])).is_err());
    }

    #[test]
    fn missing_answer_semantics() {
        let empty = AnswerMap::new();
        assert!(!Condition::parse("sot").unwrap().evaluate(&empty).unwrap());
        assert!(!Condition::parse("nhiet_do >= 38").unwrap().evaluate(&empty).unwrap());
        assert!(Condition::parse("x !== 'a'").unwrap().evaluate(&empty).unwrap());
    }

    #[test]
    fn numeric_comparison_rejects_text_answer() {
        let cond = Condition::parse("nhiet_do >= 38").unwrap();
        let err = cond
            .evaluate(&answers(&[("nhiet_do", Answer::Text("cao".into()))]))
            .unwrap_err();
        assert!(matches!(err, EvalError::NotNumeric { .. }));

        let numeric_text = answers(&[("nhiet_do", Answer::Text("38.5".into()))]);
        assert!(cond.evaluate(&numeric_text).unwrap());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Condition::parse("  "), Err(ConditionError::Empty));
        assert!(matches!(
            Condition::parse("a => 3"),
            Err(ConditionError::BadLiteral { .. }) | Err(ConditionError::UnknownOperator(_))
        ));
        assert!(matches!(
            Condition::parse("a > 'x'"),
            Err(ConditionError::NonNumericOrdering(_))
        ));
        assert!(matches!(
            Condition::parse("a === abc"),
            Err(ConditionError::BadLiteral { .. })
        ));
        assert!(matches!(
            Condition::parse("a b"),
            Err(ConditionError::Invalid(_))
        ));
        assert!(matches!(Condition::parse("a && "), Err(ConditionError::Empty)));
    }

    #[test]
    fn display_is_canonical() {
        let cond = Condition::parse("a == 1 ^ b v c").unwrap();
        assert_eq!(cond.to_string(), "a === 1 && b || c");
    }
}
