use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MalformedPolicy;
use crate::error::Result;
use crate::models::{BibliographicEntry, CanonicalPaper, Researcher};
use crate::policy::{ClassificationPolicy, Decision, PolicyContext};
use crate::source::BibliographySource;
use crate::store::PaperStore;
use crate::triage::{TriageLog, UnresolvedCase};
use crate::xref::LinkResolver;

/// Per-researcher bookkeeping, reset for every researcher.
#[derive(Debug, Default)]
struct ResearcherSession {
    papers: Vec<String>,
    found_paper: bool,
}

impl ResearcherSession {
    fn record(&mut self, identifier: &str) {
        self.found_paper = true;
        if !self.papers.iter().any(|p| p == identifier) {
            self.papers.push(identifier.to_string());
        }
    }
}

/// Accepted papers of one active researcher, in source order.
#[derive(Debug, Clone, Serialize)]
pub struct ResearcherExtract {
    pub researcher: Researcher,
    pub papers: Vec<String>,
}

impl ResearcherExtract {
    pub fn resolve<'s>(&'s self, store: &'s PaperStore) -> impl Iterator<Item = &'s CanonicalPaper> {
        self.papers.iter().filter_map(|id| store.get(id))
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RunStats {
    pub researchers: usize,
    pub active_researchers: usize,
    pub accepted_entries: usize,
    pub rejected_entries: usize,
    pub skipped_malformed: usize,
}

pub struct RunOutcome {
    pub store: PaperStore,
    pub extracts: Vec<ResearcherExtract>,
    pub unresolved: Vec<UnresolvedCase>,
    pub stats: RunStats,
}

/// Feeds every researcher's records through the policy into the store.
///
/// Researchers are processed strictly in order; duplicate detection and
/// department credit depend on what earlier researchers contributed.
pub struct RunDriver<'a, S, R> {
    policy: ClassificationPolicy<'a>,
    source: S,
    resolver: R,
    store: PaperStore,
    triage: TriageLog,
    on_malformed: MalformedPolicy,
    extracts: Vec<ResearcherExtract>,
    stats: RunStats,
}

impl<'a, S, R> RunDriver<'a, S, R>
where
    S: BibliographySource,
    R: LinkResolver,
{
    pub fn new(ctx: &'a PolicyContext, source: S, resolver: R, triage: TriageLog) -> Self {
        Self {
            policy: ClassificationPolicy::new(ctx),
            source,
            resolver,
            store: PaperStore::new(),
            triage,
            on_malformed: MalformedPolicy::default(),
            extracts: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    pub fn triage(&self) -> &TriageLog {
        &self.triage
    }

    /// Processes one researcher. Returns whether they had any accepted paper.
    pub async fn process_researcher(&mut self, researcher: &Researcher) -> Result<bool> {
        self.stats.researchers += 1;
        self.store.ensure_department(&researcher.department);

        let records = self.source.records(researcher).await?;
        let mut session = ResearcherSession::default();

        for raw in &records {
            let entry = BibliographicEntry::from_raw(raw);
            let decision = match self.policy.evaluate(&entry, &mut self.triage) {
                Ok(decision) => decision,
                Err(e) if e.is_malformed_source() && self.on_malformed == MalformedPolicy::Skip => {
                    warn!("skipping record of {}: {e}", researcher.name);
                    self.stats.skipped_malformed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match decision {
                Decision::Rejected(reason) => {
                    debug!("{}: rejected {:?} ({reason})", researcher.name, entry.title);
                    self.stats.rejected_entries += 1;
                }
                Decision::Accepted(classification) => {
                    session.record(&classification.identifier);
                    self.store
                        .add_new_paper(
                            &classification,
                            &entry,
                            &researcher.department,
                            &mut self.resolver,
                        )
                        .await?;
                    self.stats.accepted_entries += 1;
                }
            }
        }

        if !session.found_paper {
            return Ok(false);
        }

        self.store.register_professor(researcher);
        self.stats.active_researchers += 1;
        info!(
            "{} >> {}, {}",
            self.stats.researchers, researcher.name, researcher.department
        );
        self.extracts.push(ResearcherExtract {
            researcher: researcher.clone(),
            papers: session.papers,
        });
        Ok(true)
    }

    /// Processes every researcher, then persists the resolver cache and
    /// flushes the triage log. Both are saved on an aborted run too.
    pub async fn run(mut self, researchers: &[Researcher]) -> Result<RunOutcome> {
        for researcher in researchers {
            if let Err(e) = self.process_researcher(researcher).await {
                if let Err(flush) = self.save_progress().await {
                    warn!("failed to flush triage log after abort: {flush}");
                }
                return Err(e);
            }
        }
        self.finish().await
    }

    async fn save_progress(&mut self) -> Result<usize> {
        if let Err(e) = self.resolver.persist().await {
            warn!("failed to persist cross-reference cache: {e}");
        }
        self.triage.flush()
    }

    pub async fn finish(mut self) -> Result<RunOutcome> {
        self.save_progress().await?;
        if !self.triage.is_empty() {
            warn!(
                "found {} papers in multi-area journals awaiting manual classification",
                self.triage.len()
            );
        }

        info!(
            "processed {} researchers, {} active, {} papers",
            self.stats.researchers,
            self.stats.active_researchers,
            self.store.len()
        );

        Ok(RunOutcome {
            store: self.store,
            extracts: self.extracts,
            unresolved: self.triage.cases().to_vec(),
            stats: self.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::models::{RawField, RawRecord, Weight, XrefLink};
    use crate::source::MemorySource;
    use crate::tables::PolicyTables;
    use crate::config::RunConfig;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: usize,
        persisted: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LinkResolver for CountingResolver {
        async fn resolve(&mut self, _doi: Option<&str>, _title: &str) -> XrefLink {
            self.calls += 1;
            XrefLink::NotFound
        }

        async fn persist(&mut self) -> Result<()> {
            self.persisted.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn context() -> PolicyContext {
        let mut tables = PolicyTables::default();
        tables.registry.insert("ICSE", "ICSE", Weight(1));
        tables.registry.insert("ESEM", "ESEM", Weight(2));
        tables.registry.insert("Empir. Softw. Eng.", "EMSE", Weight(4));
        tables.manual_journals.insert("Empir. Softw. Eng.".to_string());
        let mut config = RunConfig::default();
        config.run.area = "se".to_string();
        PolicyContext::new(&config, tables)
    }

    fn paper(booktitle: &str, id: &str, year: &str) -> RawRecord {
        let mut raw = RawRecord::new("inproceedings")
            .with("booktitle", booktitle)
            .with("year", year)
            .with("title", "Some Title.")
            .with("pages", "1-12")
            .with("url", id);
        raw.insert("author", RawField::text("Ana"));
        raw
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert(
            "1/1",
            vec![
                paper("ICSE", "db/conf/icse/shared.html", "2023"),
                paper("ESEM", "db/conf/esem/own.html", "2021"),
                paper("ICSE", "db/conf/icse/old.html", "2015"),
            ],
        );
        source.insert(
            "2/2",
            vec![
                paper("ICSE", "db/conf/icse/shared.html", "2023"),
                paper("ICSE", "db/conf/icse/shared.html", "2023"),
            ],
        );
        source.insert("3/3", vec![paper("Workshop", "db/conf/w/a.html", "2022")]);
        source
    }

    fn roster() -> Vec<Researcher> {
        vec![
            Researcher::new("Ana", "UFMG", "1/1"),
            Researcher::new("Bruno", "USP", "2/2"),
            Researcher::new("Carla", "UFPE", "3/3"),
        ]
    }

    #[tokio::test]
    async fn test_full_run() {
        let ctx = context();
        let driver = RunDriver::new(&ctx, source(), CountingResolver::default(), TriageLog::in_memory());
        let outcome = driver.run(&roster()).await.unwrap();
        let store = &outcome.store;

        assert_eq!(store.len(), 2);
        let shared = store.get("db/conf/icse/shared.html").unwrap();
        assert_eq!(shared.departments, vec!["UFMG", "USP"]);
        assert!((store.score("UFMG") - 1.66).abs() < 1e-9);
        assert_eq!(store.score("USP"), 1.0);
        assert_eq!(store.score("UFPE"), 0.0);

        assert_eq!(outcome.stats.researchers, 3);
        assert_eq!(outcome.stats.active_researchers, 2);
        assert_eq!(outcome.extracts.len(), 2);
        assert_eq!(outcome.extracts[1].papers, vec!["db/conf/icse/shared.html"]);
        assert_eq!(store.professor_counts().get("UFPE"), Some(&0));
        assert_eq!(store.professor_counts().get("USP"), Some(&1));
    }

    #[tokio::test]
    async fn test_resolver_called_once_per_paper_and_persisted() {
        let ctx = context();
        let mut driver =
            RunDriver::new(&ctx, source(), CountingResolver::default(), TriageLog::in_memory());
        for r in roster() {
            driver.process_researcher(&r).await.unwrap();
        }
        assert_eq!(driver.resolver.calls, 2);
        driver.resolver.persist().await.unwrap();
        assert!(driver.resolver.persisted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unclassified_journal_logged_once_across_researchers() {
        let ctx = context();
        let journal = RawRecord::new("article")
            .with("journal", "Empir. Softw. Eng.")
            .with("year", "2022")
            .with("title", "Multi Area.")
            .with("url", "db/journals/ese/x.html");
        let mut source = MemorySource::new();
        source.insert("1/1", vec![journal.clone()]);
        source.insert("2/2", vec![journal]);

        let driver = RunDriver::new(&ctx, source, CountingResolver::default(), TriageLog::in_memory());
        let outcome = driver.run(&roster()[..2]).await.unwrap();
        assert!(outcome.store.is_empty());
        assert_eq!(outcome.unresolved.len(), 1);
        assert_eq!(outcome.unresolved[0].identifier, "db/journals/ese/x.html");
    }

    #[tokio::test]
    async fn test_malformed_record_policy() {
        let ctx = context();
        let broken = RawRecord::new("inproceedings").with("year", "2022");
        let mut records = MemorySource::new();
        records.insert(
            "1/1",
            vec![broken, paper("ICSE", "db/conf/icse/ok.html", "2022")],
        );

        let driver = RunDriver::new(&ctx, records.clone(), CountingResolver::default(), TriageLog::in_memory());
        let err = driver.run(&roster()[..1]).await.err().unwrap();
        assert!(matches!(err, IndexError::MalformedSource(_)));

        let driver = RunDriver::new(&ctx, records, CountingResolver::default(), TriageLog::in_memory())
            .with_malformed_policy(MalformedPolicy::Skip);
        let outcome = driver.run(&roster()[..1]).await.unwrap();
        assert_eq!(outcome.stats.skipped_malformed, 1);
        assert_eq!(outcome.store.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_aborts() {
        let ctx = context();
        let driver = RunDriver::new(&ctx, MemorySource::new(), CountingResolver::default(), TriageLog::in_memory());
        let err = driver.run(&roster()).await.err().unwrap();
        assert!(matches!(err, IndexError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_aborted_run_still_saves_progress() {
        let ctx = context();
        let tmp = tempfile::TempDir::new().unwrap();
        let log_path = tmp.path().join("unresolved.csv");
        let journal = RawRecord::new("article")
            .with("journal", "Empir. Softw. Eng.")
            .with("year", "2022")
            .with("title", "Multi Area.")
            .with("url", "db/journals/ese/x.html");
        let mut source = MemorySource::new();
        source.insert(
            "1/1",
            vec![paper("ICSE", "db/conf/icse/ok.html", "2022"), journal],
        );

        let resolver = CountingResolver::default();
        let persisted = Arc::clone(&resolver.persisted);
        let roster = vec![
            Researcher::new("Ana", "UFMG", "1/1"),
            Researcher::new("Nobody", "UFRJ", "9/9"),
        ];
        let driver = RunDriver::new(&ctx, source, resolver, TriageLog::with_path(&log_path));
        let err = driver.run(&roster).await.err().unwrap();

        assert!(matches!(err, IndexError::SourceUnavailable { .. }));
        assert!(persisted.load(Ordering::SeqCst));
        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("db/journals/ese/x.html"));
    }
}
