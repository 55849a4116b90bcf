//! Configuration system: optional TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{ExpectError, Result};

/// File name probed in the current directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "expect.toml";

/// Full expect_patch configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub rewrite: RewriteConfig,
    pub journal: JournalConfig,
}

/// Source rewriting behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Replace mismatched expected values instead of failing.
    pub override_mode: bool,
    /// Patch a call site at most once per engine lifetime.
    pub dedupe_repeated_calls: bool,
    /// Directory that `file!()` paths are relative to. Discovered when unset.
    pub workspace_root: Option<PathBuf>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            override_mode: false,
            dedupe_repeated_calls: true,
            workspace_root: None,
        }
    }
}

/// JSONL rewrite journal settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: env::temp_dir().join("expect_patch").join("rewrites.jsonl"),
        }
    }
}

impl Config {
    /// Config path used when none is passed explicitly.
    ///
    /// `$EXPECT_CONFIG` wins over `./expect.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        env_var("EXPECT_CONFIG").map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ExpectError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(ExpectError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for journal entries.
    ///
    /// FNV-1a so the value is stable across processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("EXPECT_OVERRIDE") {
            self.rewrite.override_mode = parse_env_bool("EXPECT_OVERRIDE", &raw)?;
        }
        if let Some(raw) = lookup("EXPECT_DEDUPE") {
            self.rewrite.dedupe_repeated_calls = parse_env_bool("EXPECT_DEDUPE", &raw)?;
        }
        if let Some(raw) = lookup("EXPECT_WORKSPACE_ROOT") {
            self.rewrite.workspace_root = Some(PathBuf::from(raw.trim()));
        }
        if let Some(raw) = lookup("EXPECT_JOURNAL") {
            self.journal.enabled = parse_env_bool("EXPECT_JOURNAL", &raw)?;
        }
        if let Some(raw) = lookup("EXPECT_JOURNAL_PATH") {
            self.journal.path = PathBuf::from(raw.trim());
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(root) = &self.rewrite.workspace_root
            && !root.is_absolute()
        {
            return Err(ExpectError::InvalidConfig {
                details: format!(
                    "rewrite.workspace_root must be absolute, got {}",
                    root.display()
                ),
            });
        }

        if self.journal.enabled && self.journal.path.as_os_str().is_empty() {
            return Err(ExpectError::InvalidConfig {
                details: "journal.path must be set when the journal is enabled".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| ExpectError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
