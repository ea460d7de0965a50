//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["scout.toml", ".scout.toml"];

/// One place configuration may come from, for `trend-scout config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: Option<PathBuf>,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SCOUT_*` environment variables, nested with `__`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./scout.toml` or `./.scout.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/trend-scout/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(Path::new("."), config_path)
            .merge(Env::prefixed("SCOUT_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// File layers only, with project files looked up in `project_dir`.
    fn figment(project_dir: &Path, config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::find_project_config(project_dir) {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("trend-scout").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::find_project_config(Path::new("."))
    }

    fn find_project_config(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Config file locations in priority order, highest first.
    pub fn config_sources(config_path: Option<&PathBuf>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                found: path.exists(),
                path: Some(path.clone()),
            });
        }
        let project = Self::project_config_path();
        sources.push(ConfigSource {
            label: "Project",
            found: project.is_some(),
            path: project.or_else(|| Some(PathBuf::from(PROJECT_FILES[0]))),
        });
        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                path: Some(path),
            });
        }
        sources.push(ConfigSource {
            label: "Default",
            path: None,
            found: true,
        });
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.cycle.max_in_flight, 8);
        assert!(config.reports.json);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("trend-scout"));
    }

    #[test]
    fn test_project_file_then_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".scout.toml"),
            "[cycle]\nmax_in_flight = 3\ntask_timeout_secs = 20\n",
        )
        .unwrap();
        let explicit = dir.path().join("ci.toml");
        fs::write(&explicit, "[cycle]\ntask_timeout_secs = 90\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(dir.path(), None).extract().unwrap();
        assert_eq!(config.cycle.max_in_flight, 3);
        assert_eq!(config.cycle.task_timeout_secs, 20);

        let config: FileConfig = ConfigLoader::figment(dir.path(), Some(&explicit))
            .extract()
            .unwrap();
        assert_eq!(config.cycle.max_in_flight, 3);
        assert_eq!(config.cycle.task_timeout_secs, 90);
        assert_eq!(config.keywords.batch_size, 5);
    }

    #[test]
    fn test_platform_table_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("scout.toml"),
            "[platforms.web]\ninit_timeout_secs = 90\n",
        )
        .unwrap();
        let config: FileConfig = ConfigLoader::figment(dir.path(), None).extract().unwrap();
        assert_eq!(config.platforms["web"].init_timeout_secs, Some(90));
        assert!(config.platforms["web"].command.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scout.toml"), "[cycle]\nmax_in_flight = \"many\"\n").unwrap();
        let result: Result<FileConfig, _> = ConfigLoader::figment(dir.path(), None).extract();
        assert!(result.is_err());
    }
}
