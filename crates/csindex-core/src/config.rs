use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Root run configuration, loaded from `~/.config/csindex/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run: RunSection,
    pub paths: PathsConfig,
    pub policy: PolicyConfig,
    pub arxiv: ArxivConfig,
    pub dblp: DblpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Research area prefix, e.g. `cs` or `se`. Selects the area's tables.
    pub area: String,
    pub first_year: i32,
    pub last_year: i32,
    pub on_malformed: MalformedPolicy,
    /// How many departments the professor-count table keeps.
    pub professor_table_limit: usize,
}

/// What the driver does with a record the source should never have produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Journals publishing under numbered sub-venues (`number` field).
    pub umbrella_journals: Vec<String>,
    /// Venues whose DBLP records never carry page numbers.
    pub unpaged_venues: Vec<String>,
    /// Page count assumed for white-listed papers and unpaged venues.
    pub nominal_pages: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub enabled: bool,
    pub base_url: String,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DblpConfig {
    pub base_url: String,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for RunSection {
    fn default() -> Self {
        Self {
            area: "cs".to_string(),
            first_year: 2020,
            last_year: 2025,
            on_malformed: MalformedPolicy::Abort,
            professor_table_limit: 16,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/configs"),
            cache_dir: PathBuf::from("cache"),
            output_dir: PathBuf::from("data"),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            umbrella_journals: [
                "PACMPL",
                "PACMHCI",
                "Proc. ACM Program. Lang.",
                "Proc. ACM Softw. Eng.",
                "Proc. ACM Hum. Comput. Interact.",
            ]
            .map(String::from)
            .to_vec(),
            unpaged_venues: ["Briefings Bioinform.", "J. Intell. Robotic Syst.", "NeurIPS"]
                .map(String::from)
                .to_vec(),
            nominal_pages: 10,
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://export.arxiv.org/api/query".to_string(),
            min_interval_ms: 3000,
            timeout_secs: 30,
            similarity_threshold: 0.9,
        }
    }
}

impl Default for DblpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dblp.org/pid".to_string(),
            min_interval_ms: 1000,
            timeout_secs: 60,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl RunConfig {
    /// Standard config file path: `~/.config/csindex/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CSINDEX_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("csindex")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.area.trim().is_empty() {
            return Err(IndexError::ConfigError("run.area must not be empty".to_string()));
        }
        if self.run.first_year > self.run.last_year {
            return Err(IndexError::ConfigError(format!(
                "empty year window {}..={}",
                self.run.first_year, self.run.last_year
            )));
        }
        if !(0.0..=1.0).contains(&self.arxiv.similarity_threshold) {
            return Err(IndexError::ConfigError(
                "arxiv.similarity_threshold must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    fn area_file(&self, suffix: &str) -> PathBuf {
        self.paths
            .data_dir
            .join(format!("{}-{suffix}", self.run.area))
    }

    /// `<area>-confs.csv`: `dblp_key,name,weight`.
    pub fn venues_path(&self) -> PathBuf {
        self.area_file("confs.csv")
    }

    pub fn black_list_path(&self) -> PathBuf {
        self.area_file("black-list.txt")
    }

    pub fn white_list_path(&self) -> PathBuf {
        self.area_file("white-list.txt")
    }

    pub fn research_areas_path(&self) -> PathBuf {
        self.paths.data_dir.join("research-areas-config.csv")
    }

    pub fn manual_journals_path(&self) -> PathBuf {
        self.paths.data_dir.join("manual-journals.txt")
    }

    pub fn manual_classification_path(&self) -> PathBuf {
        self.paths.data_dir.join("manual-classification.csv")
    }

    pub fn unresolved_log_path(&self) -> PathBuf {
        self.paths.data_dir.join("manual-classification-failed.csv")
    }

    pub fn researchers_path(&self) -> PathBuf {
        self.paths.data_dir.join("all-researchers.csv")
    }

    pub fn dblp_cache_dir(&self) -> PathBuf {
        self.paths.cache_dir.join("dblp")
    }

    pub fn arxiv_cache_path(&self) -> PathBuf {
        self.paths
            .cache_dir
            .join("arxiv")
            .join(format!("{}-arxiv-cache.csv", self.run.area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = RunConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.run.first_year, 2020);
        assert_eq!(cfg.run.last_year, 2025);
        assert_eq!(cfg.policy.umbrella_journals.len(), 5);
        assert_eq!(cfg.arxiv.similarity_threshold, 0.9);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = RunConfig::default();
        cfg.run.area = "se".to_string();
        cfg.run.on_malformed = MalformedPolicy::Skip;
        cfg.save_to(&path).unwrap();

        let loaded = RunConfig::load_from(&path).unwrap();
        assert_eq!(loaded.run.area, "se");
        assert_eq!(loaded.run.on_malformed, MalformedPolicy::Skip);
        assert_eq!(loaded.dblp.base_url, cfg.dblp.base_url);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\narea = \"ai\"\nlast_year = 2024\n").unwrap();

        let loaded = RunConfig::load_from(&path).unwrap();
        assert_eq!(loaded.run.area, "ai");
        assert_eq!(loaded.run.first_year, 2020);
        assert_eq!(loaded.run.last_year, 2024);
        assert_eq!(loaded.policy.nominal_pages, 10);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\nfirst_year = 2025\nlast_year = 2020\n").unwrap();
        assert!(RunConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = RunConfig::load_from(Path::new("/tmp/nonexistent_csindex_config.toml")).unwrap();
        assert_eq!(cfg.run.area, "cs");
    }

    #[test]
    fn test_derived_paths() {
        let cfg = RunConfig::default();
        assert!(cfg.venues_path().ends_with("cs-confs.csv"));
        assert!(cfg.arxiv_cache_path().ends_with("arxiv/cs-arxiv-cache.csv"));
        assert!(cfg.dblp_cache_dir().ends_with("dblp"));
    }
}
