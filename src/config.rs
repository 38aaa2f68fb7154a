//! # Configuração
//!
//! Constantes padrão sobrescritas por variáveis de ambiente. O nível de log
//! continua vindo de `RUST_LOG` (ver `main`).
//!
//! | Variável | Padrão |
//! |----------|--------|
//! | `ADVISOR_KB_PATH` | `data/sinusitis_kb.json` |
//! | `ADVISOR_BIND_ADDR` | `0.0.0.0:3000` |
//! | `ADVISOR_RESULTS_DIR` | `data/results` |
//! | `ADVISOR_STRATEGY` | `stack` |
//! | `ADVISOR_TIE_BREAK` | `min` |

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::inference::{Strategy, TieBreak};

const DEFAULT_KB_PATH: &str = "data/sinusitis_kb.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_RESULTS_DIR: &str = "data/results";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub kb_path: PathBuf,
    pub bind_addr: String,
    pub results_dir: PathBuf,
    pub strategy: Strategy,
    pub tie_break: TieBreak,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kb_path: PathBuf::from(DEFAULT_KB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            strategy: Strategy::default(),
            tie_break: TieBreak::default(),
        }
    }
}

impl AppConfig {
    /// Lê o ambiente do processo.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual a [`from_env`](Self::from_env) com uma fonte de variáveis injetada.
    ///
    /// # Erros
    ///
    /// Estratégia ou desempate com valor desconhecido.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("ADVISOR_KB_PATH") {
            config.kb_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("ADVISOR_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(dir) = lookup("ADVISOR_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("ADVISOR_STRATEGY") {
            config.strategy = raw.parse().context("ADVISOR_STRATEGY inválida")?;
        }
        if let Some(raw) = lookup("ADVISOR_TIE_BREAK") {
            config.tie_break = raw.parse().context("ADVISOR_TIE_BREAK inválido")?;
        }

        Ok(config)
    }
}
