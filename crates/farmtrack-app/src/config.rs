use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use farmtrack_core::dashboard::DEFAULT_UPCOMING_LIMIT;
use farmtrack_core::export::DEFAULT_FILE_PREFIX;
use serde::Deserialize;
use time::UtcOffset;
use time::macros::format_description;

const CONFIG_DIR: &str = ".farmtrack";
const CONFIG_FILE: &str = "config.toml";

/// Top-level project configuration loaded from `.farmtrack/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Record storage settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
    /// Calendar settings.
    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl ProjectConfig {
    /// Load configuration from a project directory. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or fails validation.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
        Ok(config)
    }

    /// Data directory resolved against the project directory.
    #[must_use]
    pub fn data_dir(&self, workdir: impl AsRef<Path>) -> PathBuf {
        if self.store.data_dir.is_absolute() {
            self.store.data_dir.clone()
        } else {
            workdir.as_ref().join(&self.store.data_dir)
        }
    }

    /// Offset used to decide which calendar day "now" falls on.
    ///
    /// # Errors
    /// Returns an error when the configured offset is malformed.
    pub fn utc_offset(&self) -> Result<UtcOffset> {
        self.calendar.offset()
    }

    fn validate(&self) -> Result<()> {
        if self.dashboard.upcoming_limit == 0 {
            bail!("dashboard.upcoming_limit must be at least 1");
        }
        if self.export.file_prefix.trim().is_empty() {
            bail!("export.file_prefix must not be empty");
        }
        self.calendar.offset().map(|_| ())
    }
}

/// `[store]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the collection files, relative to the project.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// `[dashboard]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Number of upcoming tasks shown on the dashboard.
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

const fn default_upcoming_limit() -> usize {
    DEFAULT_UPCOMING_LIMIT
}

/// `[export]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// File name prefix for CSV exports.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_owned()
}

/// `[calendar]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Offset such as `+09:00`, `-05:30`, `Z` or `UTC`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_utc_offset() -> String {
    "+00:00".to_owned()
}

impl CalendarConfig {
    /// Parsed offset.
    ///
    /// # Errors
    /// Returns an error when the offset is not `±HH:MM`, `Z` or `UTC`.
    pub fn offset(&self) -> Result<UtcOffset> {
        parse_offset(&self.utc_offset)
    }
}

fn parse_offset(raw: &str) -> Result<UtcOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(trimmed, &format)
        .with_context(|| format!("calendar.utc_offset '{raw}' is not of the form +HH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::offset;

    fn write_config(dir: &Path, body: &str) -> Result<()> {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;
        fs::write(config_dir.join(CONFIG_FILE), body)?;
        Ok(())
    }

    #[test]
    fn missing_config_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.dashboard.upcoming_limit, 3);
        assert_eq!(cfg.export.file_prefix, "farmtrack-finances");
        assert_eq!(cfg.utc_offset()?, UtcOffset::UTC);
        assert_eq!(cfg.data_dir(dir.path()), dir.path().join("data"));
        Ok(())
    }

    #[test]
    fn load_config_with_every_section() -> Result<()> {
        let dir = tempdir()?;
        write_config(
            dir.path(),
            r#"
[store]
data_dir = "records"

[dashboard]
upcoming_limit = 5

[export]
file_prefix = "north-field"

[calendar]
utc_offset = "-05:30"
"#,
        )?;
        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.data_dir(dir.path()), dir.path().join("records"));
        assert_eq!(cfg.dashboard.upcoming_limit, 5);
        assert_eq!(cfg.export.file_prefix, "north-field");
        assert_eq!(cfg.utc_offset()?, offset!(-5:30));
        Ok(())
    }

    #[test]
    fn partial_config_keeps_other_defaults() -> Result<()> {
        let dir = tempdir()?;
        write_config(dir.path(), "[calendar]\nutc_offset = \"UTC\"\n")?;
        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.dashboard.upcoming_limit, 3);
        assert_eq!(cfg.store.data_dir, PathBuf::from("data"));
        Ok(())
    }

    #[test]
    fn zero_upcoming_limit_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        write_config(dir.path(), "[dashboard]\nupcoming_limit = 0\n")?;
        let Err(err) = ProjectConfig::from_workdir(dir.path()) else {
            panic!("zero limit should be rejected");
        };
        assert!(format!("{err:#}").contains("upcoming_limit"));
        Ok(())
    }

    #[test]
    fn blank_prefix_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        write_config(dir.path(), "[export]\nfile_prefix = \"  \"\n")?;
        assert!(ProjectConfig::from_workdir(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn malformed_offset_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        write_config(dir.path(), "[calendar]\nutc_offset = \"nine\"\n")?;
        let Err(err) = ProjectConfig::from_workdir(dir.path()) else {
            panic!("malformed offset should be rejected");
        };
        assert!(format!("{err:#}").contains("utc_offset"));
        Ok(())
    }

    #[test]
    fn absolute_data_dir_is_kept() {
        let cfg = ProjectConfig {
            store: StoreConfig {
                data_dir: std::env::temp_dir(),
            },
            ..ProjectConfig::default()
        };
        assert_eq!(cfg.data_dir("/ignored"), std::env::temp_dir());
    }
}
