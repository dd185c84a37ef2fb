use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csindex_core::{CanonicalPaper, RunOutcome, VenueRegistry, VenueType};
use tracing::debug;

/// Writes the end-of-run tables of one area under an output directory.
pub struct OutputFiles {
    dir: PathBuf,
    area: String,
}

impl OutputFiles {
    pub fn new(dir: impl Into<PathBuf>, area: &str) -> Self {
        Self {
            dir: dir.into(),
            area: area.to_string(),
        }
    }

    pub fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}-out-{table}.csv", self.area))
    }

    pub fn professor_dir(&self) -> PathBuf {
        self.dir.join("profs")
    }

    pub fn professor_path(&self, file_stem: &str) -> PathBuf {
        self.professor_dir()
            .join(format!("{}-{file_stem}-papers.csv", self.area))
    }

    /// Removes per-researcher files left by an earlier run of this area.
    pub fn clear_professor_files(&self) -> Result<usize> {
        let dir = self.professor_dir();
        if !dir.exists() {
            return Ok(0);
        }
        let prefix = format!("{}-", self.area);
        let mut removed = 0;
        for entry in fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            let stale = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with("-papers.csv"));
            if stale {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("removed {removed} stale researcher files");
        Ok(removed)
    }

    /// Writes every table and returns the paths written.
    pub fn write_all(
        &self,
        outcome: &RunOutcome,
        registry: &VenueRegistry,
        professor_limit: usize,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let store = &outcome.store;
        let mut written = Vec::new();

        let path = self.path("papers");
        write_papers(&path, store.papers_sorted(), true)?;
        written.push(path);

        let path = self.path("scores");
        write_rows(
            &path,
            store
                .department_scores()
                .into_iter()
                .map(|(dept, score)| [dept.to_string(), format!("{score:.2}")]),
        )?;
        written.push(path);

        let path = self.path("profs");
        write_rows(
            &path,
            store
                .department_professor_counts(Some(professor_limit))
                .into_iter()
                .map(|(dept, n)| [dept.to_string(), n.to_string()]),
        )?;
        written.push(path);

        let path = self.path("profs-list");
        write_rows(
            &path,
            store
                .professors_sorted()
                .into_iter()
                .map(|r| [r.name.clone(), r.department.clone()]),
        )?;
        written.push(path);

        for (table, venue_type) in [("confs", VenueType::Conference), ("journals", VenueType::Journal)] {
            let counts = store.venue_counts(registry, venue_type);
            if counts.is_empty() {
                continue;
            }
            let path = self.path(table);
            write_rows(
                &path,
                counts.into_iter().map(|(name, n)| [name.to_string(), n.to_string()]),
            )?;
            written.push(path);
        }

        if !outcome.extracts.is_empty() {
            fs::create_dir_all(self.professor_dir())?;
        }
        for extract in &outcome.extracts {
            let path = self.professor_path(&extract.researcher.file_stem());
            write_papers(&path, extract.resolve(store), false)?;
            written.push(path);
        }

        Ok(written)
    }
}

fn writer(path: &Path, quote_style: csv::QuoteStyle) -> Result<csv::Writer<fs::File>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(quote_style)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))
}

fn write_rows<I, R>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut w = writer(path, csv::QuoteStyle::Necessary)?;
    for row in rows {
        w.write_record(row)?;
    }
    w.flush()?;
    Ok(())
}

fn write_papers<'a>(
    path: &Path,
    papers: impl IntoIterator<Item = &'a CanonicalPaper>,
    with_departments: bool,
) -> Result<()> {
    // titles arrive pre-quoted and never contain `"` themselves
    let mut w = writer(path, csv::QuoteStyle::Never)?;
    for paper in papers {
        write_paper(&mut w, paper, with_departments)?;
    }
    w.flush()?;
    Ok(())
}

/// One paper row: year, venue, title, [departments,] authors, doi, tier,
/// type, preprint link, citations.
fn write_paper<W: io::Write>(
    w: &mut csv::Writer<W>,
    paper: &CanonicalPaper,
    with_departments: bool,
) -> Result<()> {
    let mut row = vec![paper.year.to_string(), paper.venue.clone(), paper.quoted_title()];
    if with_departments {
        row.push(paper.department_attribution());
    }
    row.push(paper.authors.join("; "));
    row.push(paper.doi.clone().unwrap_or_default());
    row.push(paper.tier.to_string());
    row.push(paper.venue_type.code().to_string());
    row.push(paper.xref.to_string());
    row.push(paper.citations.map(|c| c.to_string()).unwrap_or_default());
    w.write_record(&row)?;
    Ok(())
}
