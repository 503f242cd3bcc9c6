//! Team-name canonicalization
//!
//! The NCAA pages spell some programs differently from one page (and one
//! season) to the next. [`AliasTable`] maps each known spelling to a single
//! canonical name. Targets are resolved at construction so that
//! canonicalizing an already-canonical name is a no-op.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Spellings seen on the championship archive pages
const DEFAULT_ALIASES: [(&str, &str); 7] = [
    ("Albany (NY)", "Albany"),
    ("Detroit", "Detroit Mercy"),
    ("NAVY", "Navy"),
    ("OSU", "Ohio St."),
    ("UAlbany", "Albany"),
    ("Yale Bulldogs", "Yale"),
    ("YALE", "Yale"),
];

/// Alias file format: `{"aliases": {"UAlbany": "Albany", ...}}`
#[derive(Debug, Serialize, Deserialize)]
struct AliasFile {
    aliases: HashMap<String, String>,
}

/// Alias -> canonical team name
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let pairs = DEFAULT_ALIASES
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()));
        // The built-in table has no chains or cycles
        Self {
            aliases: pairs.collect(),
        }
    }
}

impl AliasTable {
    /// Build a table, resolving alias chains (`A -> B -> C` becomes `A -> C`).
    pub fn new<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: HashMap<String, String> = pairs
            .into_iter()
            .map(|(alias, canonical)| (alias.trim().to_string(), canonical.trim().to_string()))
            .filter(|(alias, canonical)| alias != canonical)
            .collect();

        let mut aliases = HashMap::with_capacity(raw.len());
        for alias in raw.keys() {
            let mut target = &raw[alias];
            let mut hops = 0;
            while let Some(next) = raw.get(target) {
                hops += 1;
                if hops > raw.len() {
                    return Err(ConfigError::AliasCycle(alias.clone()));
                }
                target = next;
            }
            aliases.insert(alias.clone(), target.clone());
        }

        Ok(Self { aliases })
    }

    /// Load a table from a JSON alias file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::AliasFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: AliasFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::AliasFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::new(file.aliases)
    }

    /// Canonical form of `name` (trimmed; unknown names pass through)
    pub fn canonicalize(&self, name: &str) -> String {
        let name = name.trim();
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Splits ranking-table keys like `"Duke (ACC)"` into team and conference
pub struct TeamKeySplitter {
    conference_pattern: Regex,
}

impl Default for TeamKeySplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamKeySplitter {
    pub fn new() -> Self {
        Self {
            conference_pattern: Regex::new(r"\(([^()]*)\)\s*$").unwrap(),
        }
    }

    /// Team part of the key: everything before the first `(`
    pub fn team<'a>(&self, key: &'a str) -> &'a str {
        strip_conference(key)
    }

    /// Conference: the last parenthetical group, empty if there is none
    pub fn conference(&self, key: &str) -> String {
        self.conference_pattern
            .captures(key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }

    /// Canonical team name and conference
    pub fn split(&self, key: &str, aliases: &AliasTable) -> (String, String) {
        (aliases.canonicalize(self.team(key)), self.conference(key))
    }
}

/// Drop a trailing `(Conference)` suffix
pub fn strip_conference(key: &str) -> &str {
    key.split('(').next().unwrap_or(key).trim()
}
