//! Read-only configuration tables, loaded once before a run.
//!
//! All tables keep the on-disk formats maintained by the people curating the
//! index: headerless CSV files and plain one-entry-per-line lists.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::config::RunConfig;
use crate::error::{IndexError, Result};
use crate::models::{Researcher, VenueInfo, VenueType, Weight};

/// Raw DBLP venue key → canonical venue name and weight.
#[derive(Debug, Clone, Default)]
pub struct VenueRegistry {
    venues: HashMap<String, VenueInfo>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>, weight: Weight) {
        self.venues.insert(
            key.into(),
            VenueInfo {
                name: name.into(),
                weight,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&VenueInfo> {
        self.venues.get(key)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Distinct canonical names of every venue of the given type, sorted.
    pub fn names_of_type(&self, venue_type: VenueType) -> Vec<&str> {
        self.venues
            .values()
            .filter(|v| v.weight.venue_type() == venue_type)
            .map(|v| v.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Loads `<area>-confs.csv` rows of `dblp_key,name,weight`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for (line, row) in read_rows(path)?.into_iter().enumerate() {
            let [key, name, weight] = row.as_slice() else {
                return Err(IndexError::table(
                    path,
                    format!("line {}: expected 3 columns, found {}", line + 1, row.len()),
                ));
            };
            let weight: u8 = weight.parse().map_err(|_| {
                IndexError::table(path, format!("line {}: invalid weight {weight:?}", line + 1))
            })?;
            registry.insert(key.clone(), name.clone(), Weight(weight));
        }
        debug!("loaded {} venues from {}", registry.len(), path.display());
        Ok(registry)
    }
}

/// Everything the classification policy consults besides the entry itself.
#[derive(Debug, Clone, Default)]
pub struct PolicyTables {
    pub registry: VenueRegistry,
    pub black_list: HashSet<String>,
    pub white_list: HashSet<String>,
    /// Multi-area venues whose papers need a per-paper area decision.
    pub manual_journals: HashSet<String>,
    /// Paper identifier → research area it was manually assigned to.
    pub manual_classification: HashMap<String, String>,
    pub default_min_pages: i32,
}

impl PolicyTables {
    pub fn load(config: &RunConfig) -> Result<Self> {
        Ok(Self {
            registry: VenueRegistry::load(&config.venues_path())?,
            black_list: read_line_list(&config.black_list_path())?,
            white_list: read_line_list(&config.white_list_path())?,
            manual_journals: read_line_list(&config.manual_journals_path())?,
            manual_classification: load_manual_classification(
                &config.manual_classification_path(),
            )?,
            default_min_pages: load_default_min_pages(
                &config.research_areas_path(),
                &config.run.area,
            )?,
        })
    }
}

/// Reads a one-entry-per-line list; a missing file is an empty list.
pub fn read_line_list(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        debug!("optional list {} not found", path.display());
        return Ok(HashSet::new());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Loads `manual-classification.csv` rows of `area,_,_,_,url`.
pub fn load_manual_classification(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let mut out = HashMap::new();
    for (line, row) in read_rows(path)?.into_iter().enumerate() {
        if row.len() != 5 {
            return Err(IndexError::table(
                path,
                format!("line {}: expected 5 columns, found {}", line + 1, row.len()),
            ));
        }
        out.insert(row[4].clone(), row[0].clone());
    }
    Ok(out)
}

/// Default minimum page count of `area` from `research-areas-config.csv`.
///
/// Areas without a row (or a missing file) accept papers of any length.
pub fn load_default_min_pages(path: &Path, area: &str) -> Result<i32> {
    if !path.exists() {
        return Ok(0);
    }
    for row in read_rows(path)? {
        if row.first().map(String::as_str) == Some(area) {
            let raw = row.get(1).map(String::as_str).unwrap_or_default();
            return raw.parse().map_err(|_| {
                IndexError::table(path, format!("invalid minimum page count {raw:?} for {area}"))
            });
        }
    }
    Ok(0)
}

/// Loads the roster `all-researchers.csv` of `name,department,pid`.
pub fn load_researchers(path: &Path) -> Result<Vec<Researcher>> {
    read_rows(path)?
        .into_iter()
        .enumerate()
        .map(|(line, row)| match row.as_slice() {
            [name, department, pid, ..] => Ok(Researcher::new(name, department, pid)),
            _ => Err(IndexError::table(
                path,
                format!("line {}: expected name,department,pid", line + 1),
            )),
        })
        .collect()
}

fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| IndexError::table(path, e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_registry_load() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "cs-confs.csv",
            "ICSE,ICSE,1\nSBES,SBES,3\nIEEE Trans. Software Eng.,TSE,4\nIEEE Softw.,IEEE Software,6\n",
        );
        let registry = VenueRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("IEEE Trans. Software Eng.").unwrap().name, "TSE");
        assert_eq!(registry.get("SBES").unwrap().weight, Weight(3));
        assert_eq!(registry.names_of_type(VenueType::Conference), vec!["ICSE", "SBES"]);
        assert_eq!(
            registry.names_of_type(VenueType::Journal),
            vec!["IEEE Software", "TSE"]
        );
    }

    #[test]
    fn test_registry_rejects_bad_weight() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "cs-confs.csv", "ICSE,ICSE,top\n");
        let err = VenueRegistry::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid weight"));
    }

    #[test]
    fn test_missing_list_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_line_list(&dir.path().join("nope.txt")).unwrap().is_empty());
        let path = write(&dir, "cs-black-list.txt", "db/a.html\n\n db/b.html \n");
        let list = read_line_list(&path).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains("db/b.html"));
    }

    #[test]
    fn test_manual_classification() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "manual-classification.csv",
            "se,2021,\"Inf. Softw. Technol.\",\"A, B\",db/journals/infsof/x.html\n",
        );
        let map = load_manual_classification(&path).unwrap();
        assert_eq!(map.get("db/journals/infsof/x.html").map(String::as_str), Some("se"));
    }

    #[test]
    fn test_default_min_pages() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "research-areas-config.csv", "se,10\ncs,0\nai,8,extra\n");
        assert_eq!(load_default_min_pages(&path, "se").unwrap(), 10);
        assert_eq!(load_default_min_pages(&path, "ai").unwrap(), 8);
        assert_eq!(load_default_min_pages(&path, "db").unwrap(), 0);
    }

    #[test]
    fn test_load_researchers() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "all-researchers.csv", "Ana Silva,UFMG,12/345\nBruno Costa,USP,67/890\n");
        let roster = load_researchers(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[1], Researcher::new("Bruno Costa", "USP", "67/890"));
    }

    #[test]
    fn test_load_policy_tables() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cs-confs.csv", "ICSE,ICSE,1\n");
        write(&dir, "cs-white-list.txt", "db/w.html\n");
        write(&dir, "research-areas-config.csv", "cs,10\n");
        let mut config = RunConfig::default();
        config.paths.data_dir = dir.path().to_path_buf();

        let tables = PolicyTables::load(&config).unwrap();
        assert_eq!(tables.registry.len(), 1);
        assert!(tables.white_list.contains("db/w.html"));
        assert!(tables.black_list.is_empty());
        assert_eq!(tables.default_min_pages, 10);
    }
}
