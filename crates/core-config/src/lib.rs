//! Configuration loading and parsing.
//!
//! Parses `search.toml` (or an override path provided by the binary) into
//! `SearchConfig`. Every field has a default, so a missing file, a missing
//! section or an unparsable file all yield a usable configuration. Unknown
//! fields are ignored (TOML deserialization tolerance).
//!
//! Clamping: `history.capacity` is clamped into `1..=HISTORY_CAPACITY_MAX`
//! by `SearchConfig::apply_limits`; the raw parsed value is retained in
//! `file` so a caller can report what was asked for.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const HISTORY_CAPACITY_DEFAULT: usize = 30;
pub const HISTORY_CAPACITY_MAX: usize = 1000;

/// How a history ring behaves when rotated past its oldest/newest entry.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Wrap,
    Bounded,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub rotation: RotationPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            rotation: RotationPolicy::default(),
        }
    }
}

impl HistoryConfig {
    const fn default_capacity() -> usize {
        HISTORY_CAPACITY_DEFAULT
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSection {
    /// Fold case until the user types an uppercase letter.
    #[serde(default = "default_true")]
    pub case_fold: bool,
    /// A repeat after a failed search wraps around the buffer.
    #[serde(default = "default_true")]
    pub wrap: bool,
    #[serde(default)]
    pub whole_word: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            case_fold: true,
            wrap: true,
            whole_word: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaceSection {
    #[serde(default = "default_true")]
    pub preserve_case: bool,
}

impl Default for ReplaceSection {
    fn default() -> Self {
        Self {
            preserve_case: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub replace: ReplaceSection,
}

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective_history_capacity: usize,
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("search.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxsearch").join("search.toml");
    }
    PathBuf::from("search.toml")
}

/// Parse configuration text. Errors carry the TOML diagnostic.
pub fn parse(content: &str) -> Result<SearchConfig> {
    let file = toml::from_str::<ConfigFile>(content).context("parsing search configuration")?;
    let mut cfg = SearchConfig {
        raw: Some(content.to_string()),
        file,
        effective_history_capacity: 0,
    };
    cfg.apply_limits();
    Ok(cfg)
}

pub fn load_from(path: Option<PathBuf>) -> Result<SearchConfig> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(SearchConfig::defaults());
    };
    match parse(&content) {
        Ok(cfg) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(cfg)
        }
        Err(e) => {
            // On parse error fall back to defaults.
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(SearchConfig::defaults())
        }
    }
}

impl SearchConfig {
    pub fn defaults() -> Self {
        let mut cfg = Self::default();
        cfg.apply_limits();
        cfg
    }

    /// Clamp the history capacity into its supported range. Returns the effective value.
    pub fn apply_limits(&mut self) -> usize {
        let raw = self.file.history.capacity;
        let clamped = raw.clamp(1, HISTORY_CAPACITY_MAX);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max = HISTORY_CAPACITY_MAX,
                "history_capacity_clamped"
            );
        }
        self.effective_history_capacity = clamped;
        clamped
    }

    pub fn case_fold(&self) -> bool {
        self.file.search.case_fold
    }
    pub fn wrap(&self) -> bool {
        self.file.search.wrap
    }
    pub fn whole_word(&self) -> bool {
        self.file.search.whole_word
    }
    pub fn preserve_case(&self) -> bool {
        self.file.replace.preserve_case
    }
    pub fn rotation(&self) -> RotationPolicy {
        self.file.history.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.effective_history_capacity, HISTORY_CAPACITY_DEFAULT);
        assert!(cfg.case_fold());
        assert!(cfg.wrap());
        assert!(!cfg.whole_word());
        assert!(cfg.preserve_case());
        assert_eq!(cfg.rotation(), RotationPolicy::Wrap);
    }

    #[test]
    fn parses_all_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[history]\ncapacity = 5\nrotation = \"bounded\"\n[search]\ncase_fold = false\nwrap = false\nwhole_word = true\n[replace]\npreserve_case = false\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_history_capacity, 5);
        assert_eq!(cfg.rotation(), RotationPolicy::Bounded);
        assert!(!cfg.case_fold());
        assert!(!cfg.wrap());
        assert!(cfg.whole_word());
        assert!(!cfg.preserve_case());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse("[search]\nwrap = false\n").unwrap();
        assert!(!cfg.wrap());
        assert!(cfg.case_fold());
        assert_eq!(cfg.effective_history_capacity, HISTORY_CAPACITY_DEFAULT);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history\ncapacity = ").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.effective_history_capacity, HISTORY_CAPACITY_DEFAULT);
        assert!(parse("[history\n").is_err());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = parse("[history]\ncapacity = 0\n").unwrap();
        assert_eq!(cfg.file.history.capacity, 0);
        assert_eq!(cfg.effective_history_capacity, 1);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || parse("[history]\ncapacity = 5000\n").unwrap());

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("history_capacity_clamped"));
        assert_eq!(cfg.effective_history_capacity, HISTORY_CAPACITY_MAX);
    }
}
