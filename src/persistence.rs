//! # Persistência — Laudos por Sessão em Disco
//!
//! Cada diagnóstico concluído é gravado como JSON "pretty-printed" em
//! `<raiz>/<session_id>/result.json`, para que a página de resultados possa
//! ser reaberta depois (`GET /results/{session_id}`).
//!
//! ```text
//! data/results/
//! └── 3f2a…9c/
//!     └── result.json
//! ```
//!
//! Na frente do disco fica um cache em memória limitado
//! ([`DEFAULT_CACHE_CAPACITY`] laudos): um laudo recém-salvo é servido sem
//! reler o arquivo, e o mais antigo sai quando o limite é passado. O disco
//! continua sendo a fonte de verdade.
//!
//! ## ⚠️ Atomicidade
//!
//! A escrita **não é atômica** — crash durante a escrita pode deixar um
//! `result.json` truncado, que será reportado como erro de leitura.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;

use crate::diagnosis::DiagnosisReport;

/// Nome do arquivo dentro do diretório da sessão.
const RESULT_FILE: &str = "result.json";

/// Quantos laudos ficam em memória.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Cache FIFO de laudos: passado o limite, sai o inserido há mais tempo.
#[derive(Debug)]
struct ReportCache {
    capacity: usize,
    reports: HashMap<String, DiagnosisReport>,
    order: VecDeque<String>,
}

impl ReportCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            reports: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, session_id: &str) -> Option<&DiagnosisReport> {
        self.reports.get(session_id)
    }

    fn insert(&mut self, session_id: String, report: DiagnosisReport) {
        if self.capacity == 0 {
            return;
        }
        if self.reports.insert(session_id.clone(), report).is_some() {
            return;
        }
        self.order.push_back(session_id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.reports.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.reports.len()
    }
}

/// Repositório de laudos.
#[derive(Debug)]
pub struct ResultStore {
    root: PathBuf,
    cache: RwLock<ReportCache>,
}

/// Aceita só ids hexadecimais/uuid (`[0-9a-fA-F-]`), sem `..` nem `/`.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 64
        && session_id
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-')
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache_capacity(root, DEFAULT_CACHE_CAPACITY)
    }

    /// `capacity == 0` desliga o cache: toda leitura vai ao disco.
    pub fn with_cache_capacity(root: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(ReportCache::new(capacity)),
        }
    }

    /// Laudos atualmente em memória.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    fn result_path(&self, session_id: &str) -> Result<PathBuf> {
        if !is_valid_session_id(session_id) {
            bail!("session_id inválido: {:?}", session_id);
        }
        Ok(self.root.join(session_id).join(RESULT_FILE))
    }

    /// Salva o laudo em disco e no cache.
    ///
    /// # Erros
    ///
    /// Retorna erro se o `session_id` for inválido, ou se não conseguir
    /// criar o diretório, serializar, ou escrever no arquivo.
    pub fn save(&self, report: &DiagnosisReport) -> Result<PathBuf> {
        let path = self.result_path(&report.session_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(report)
            .context("Falha ao serializar DiagnosisReport")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Falha ao escrever {}", path.display()))?;

        self.cache
            .write()
            .insert(report.session_id.clone(), report.clone());
        tracing::info!(session_id = %report.session_id, path = %path.display(), "💾 Laudo salvo");
        Ok(path)
    }

    /// Carrega um laudo; `Ok(None)` se a sessão não existe.
    ///
    /// # Erros
    ///
    /// Retorna erro se o `session_id` for inválido, ou se o arquivo existir
    /// mas estiver corrompido ou incompatível com a struct atual.
    pub fn load(&self, session_id: &str) -> Result<Option<DiagnosisReport>> {
        let path = self.result_path(session_id)?;

        if let Some(report) = self.cache.read().get(session_id) {
            return Ok(Some(report.clone()));
        }

        if !path.exists() {
            tracing::debug!(session_id, "Laudo não encontrado");
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Falha ao ler {}", path.display()))?;
        let report: DiagnosisReport = serde_json::from_str(&json)
            .with_context(|| format!("Falha ao desserializar {}", path.display()))?;

        self.cache
            .write()
            .insert(session_id.to_string(), report.clone());
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::DiagnosisService;
    use crate::inference::{Strategy, TieBreak};
    use crate::medical::test_support::sinusitis_kb;
    use crate::medical::AnswerMap;
    use serde_json::json;

    fn report() -> DiagnosisReport {
        let kb = sinusitis_kb();
        let answers = serde_json::from_value(json!({
            "thoi_gian_trieu_chung": 5,
            "loai_dich_mui": "Trong, loãng",
            "nghet_mui": true,
            "dau_vung_xoang_ham": true
        }))
        .unwrap();
        DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min).diagnose(&answers)
    }

    #[test]
    fn session_id_validation() {
        assert!(is_valid_session_id("3f2a9c0d4e5b6a7f8091a2b3c4d5e6f7"));
        assert!(is_valid_session_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../etc"));
        assert!(!is_valid_session_id("abc/def"));
        assert!(!is_valid_session_id("xyz"));
    }

    #[test]
    fn save_then_load_from_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();

        let path = ResultStore::new(dir.path()).save(&report).unwrap();
        assert!(path.ends_with(format!("{}/result.json", report.session_id)));

        // store novo: cache vazio, lê do disco
        let loaded = ResultStore::new(dir.path())
            .load(&report.session_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn cache_is_bounded_and_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::with_cache_capacity(dir.path(), 4);
        let kb = sinusitis_kb();
        let service = DiagnosisService::new(&kb, Strategy::Stack, TieBreak::Min);

        let reports: Vec<DiagnosisReport> = (0..10)
            .map(|_| service.diagnose(&AnswerMap::new()))
            .collect();
        for report in &reports {
            store.save(report).unwrap();
        }
        assert_eq!(store.cached_len(), 4);

        // despejado do cache, mas ainda no disco
        let first = store.load(&reports[0].session_id).unwrap().unwrap();
        assert_eq!(first, reports[0]);
        assert_eq!(store.cached_len(), 4);
    }

    #[test]
    fn resaving_same_session_does_not_grow_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::with_cache_capacity(dir.path(), 4);
        let report = report();
        store.save(&report).unwrap();
        store.save(&report).unwrap();
        store.load(&report.session_id).unwrap();
        assert_eq!(store.cached_len(), 1);
    }

    #[test]
    fn zero_capacity_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::with_cache_capacity(dir.path(), 0);
        let report = report();
        store.save(&report).unwrap();
        assert_eq!(store.cached_len(), 0);
        assert_eq!(store.load(&report.session_id).unwrap(), Some(report));
    }

    #[test]
    fn unknown_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        assert!(store.load("deadbeef").unwrap().is_none());
    }

    #[test]
    fn invalid_session_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        assert!(store.load("../../secret").is_err());
    }

    #[test]
    fn corrupted_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("abcdef");
        std::fs::create_dir_all(&session).unwrap();
        std::fs::write(session.join(RESULT_FILE), "{ nope").unwrap();
        let store = ResultStore::new(dir.path());
        assert!(store.load("abcdef").is_err());
    }
}
