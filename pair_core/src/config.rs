use crate::http_share::paths;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Only one of -f (single file) or -x (multiple files) can be used")]
    ConflictingModes,
    #[error("Failed to get current working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

/// Which files the download routes are allowed to serve.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadMode {
    #[default]
    None,
    /// One relative path (via -f)
    Single(String),
    /// Ordered, de-duplicated relative paths (via -x)
    Multi(Vec<String>),
}

impl DownloadMode {
    /// Relative paths in configured order
    pub fn paths(&self) -> &[String] {
        match self {
            DownloadMode::None => &[],
            DownloadMode::Single(path) => std::slice::from_ref(path),
            DownloadMode::Multi(paths) => paths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }
}

/// Process-wide configuration, built once before serving and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    work_dir: PathBuf,
    mode: DownloadMode,
}

impl ServerConfig {
    /// Build a config rooted at `work_dir`. The directory is lexically normalized.
    pub fn new(work_dir: impl AsRef<Path>, mode: DownloadMode) -> Self {
        Self {
            work_dir: paths::normalize(work_dir.as_ref()),
            mode,
        }
    }

    /// Resolve the raw `-f` / `-x` option values against the process working directory.
    pub fn from_options(single: Option<&str>, multi: Option<&str>) -> Result<Self, ConfigError> {
        let mode = resolve_mode(single, multi)?;
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        let cwd = std::path::absolute(&cwd).map_err(ConfigError::WorkingDir)?;
        Ok(Self::new(cwd, mode))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn mode(&self) -> &DownloadMode {
        &self.mode
    }

    /// Absolute, cleaned location of a configured relative path
    pub fn resolve(&self, rel_path: &str) -> PathBuf {
        paths::join_clean(&self.work_dir, Path::new(rel_path))
    }
}

/// Pick the download mode, rejecting `-f` and `-x` used together.
pub fn resolve_mode(single: Option<&str>, multi: Option<&str>) -> Result<DownloadMode, ConfigError> {
    let single = single.filter(|s| !s.is_empty());
    let multi = multi.map(parse_multi_paths).unwrap_or_default();

    match (single, multi.is_empty()) {
        (Some(_), false) => Err(ConfigError::ConflictingModes),
        (Some(path), true) => Ok(DownloadMode::Single(path.to_string())),
        (None, false) => Ok(DownloadMode::Multi(multi)),
        (None, true) => Ok(DownloadMode::None),
    }
}

/// Split a comma-separated `-x` value: trim entries, drop empty ones and
/// collapse duplicates while keeping first-seen order.
pub fn parse_multi_paths(raw: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !paths.iter().any(|p| p == entry) {
            paths.push(entry.to_string());
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_paths_trims_and_dedups() {
        let paths = parse_multi_paths(" b.txt, a.txt ,,b.txt, docs/c.md ,a.txt");
        assert_eq!(paths, vec!["b.txt", "a.txt", "docs/c.md"]);
    }

    #[test]
    fn test_parse_multi_paths_only_separators() {
        assert!(parse_multi_paths(" , ,").is_empty());
        assert!(parse_multi_paths("").is_empty());
    }

    #[test]
    fn test_resolve_mode_conflict() {
        let err = resolve_mode(Some("a.txt"), Some("b.txt,c.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingModes));
    }

    #[test]
    fn test_resolve_mode_empty_values_do_not_conflict() {
        assert_eq!(
            resolve_mode(Some(""), Some("b.txt")).unwrap(),
            DownloadMode::Multi(vec!["b.txt".to_string()])
        );
        assert_eq!(
            resolve_mode(Some("a.txt"), Some(" , ")).unwrap(),
            DownloadMode::Single("a.txt".to_string())
        );
        assert_eq!(resolve_mode(None, None).unwrap(), DownloadMode::None);
    }

    #[test]
    fn test_config_normalizes_work_dir() {
        let config = ServerConfig::new("/srv/share/./sub/..", DownloadMode::None);
        assert_eq!(config.work_dir(), Path::new("/srv/share"));
        assert_eq!(config.resolve("docs/../a.txt"), PathBuf::from("/srv/share/a.txt"));
    }

    #[test]
    fn test_mode_paths() {
        assert!(DownloadMode::None.is_empty());
        assert_eq!(DownloadMode::Single("a".into()).paths(), ["a".to_string()]);
    }
}
