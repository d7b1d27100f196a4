//! Config schema and deserialization

use crate::rules::{RuleSet, SKIP_REASON, XUNIT_NAMESPACE};
use crate::PassId;
use serde::Deserialize;
use std::path::Path;

/// Per-path override configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    /// Glob patterns this override applies to
    pub files: Vec<String>,

    /// Optional skip reason for matched files
    #[serde(default)]
    pub skip_reason: Option<String>,

    /// Extra passes to disable for matched files
    #[serde(default)]
    pub disabled_passes: Vec<PassId>,

    /// Leave matched files untouched
    #[serde(default)]
    pub ignore: Option<bool>,
}

/// Root config structure for .unitportrc.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Reason written into `Skip = "..."` for ignored tests. Default: "Ignored in MSTest"
    #[serde(default)]
    pub skip_reason: Option<String>,

    /// Namespace imported instead of MSTest. Default: "Xunit"
    #[serde(default)]
    pub target_namespace: Option<String>,

    /// Extra framework namespaces that may appear in `#if` import blocks
    #[serde(default)]
    pub conditional_namespaces: Vec<String>,

    /// Passes that never run, by kebab-case id
    #[serde(default)]
    pub disabled_passes: Vec<PassId>,

    /// Glob patterns for files to leave untouched
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Per-path configuration overrides
    #[serde(default)]
    pub overrides: Vec<ConfigOverride>,
}

impl Config {
    /// Configuration with no per-file overrides applied
    pub fn effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            skip_reason: self.skip_reason.clone(),
            target_namespace: self.target_namespace.clone(),
            conditional_namespaces: self.conditional_namespaces.clone(),
            disabled_passes: self.disabled_passes.clone(),
            ignored: false,
        }
    }

    /// Get effective config for a specific file path, applying overrides
    pub fn effective_for_file(&self, file_path: &Path) -> EffectiveConfig {
        let mut effective = self.effective();
        effective.ignored = Self::matches_patterns(file_path, &self.ignore);

        // Apply matching overrides in order
        for override_cfg in &self.overrides {
            if Self::matches_patterns(file_path, &override_cfg.files) {
                if let Some(reason) = &override_cfg.skip_reason {
                    effective.skip_reason = Some(reason.clone());
                }
                for pass in &override_cfg.disabled_passes {
                    if !effective.disabled_passes.contains(pass) {
                        effective.disabled_passes.push(*pass);
                    }
                }
                if let Some(ignore) = override_cfg.ignore {
                    effective.ignored = ignore;
                }
            }
        }

        effective
    }

    /// Rules for files without overrides
    pub fn rule_set(&self) -> RuleSet {
        self.effective().rule_set()
    }

    /// Check if a file path matches any of the patterns
    fn matches_patterns(file_path: &Path, patterns: &[String]) -> bool {
        if patterns.is_empty() {
            return false;
        }
        match super::build_glob_set(patterns) {
            Ok(set) => set.is_match(file_path),
            Err(e) => {
                tracing::warn!("ignoring invalid file patterns: {e:#}");
                false
            }
        }
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.skip_reason.is_none() {
            self.skip_reason = base.skip_reason;
        }
        if self.target_namespace.is_none() {
            self.target_namespace = base.target_namespace;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }

        let mut namespaces = base.conditional_namespaces;
        for namespace in self.conditional_namespaces.drain(..) {
            if !namespaces.contains(&namespace) {
                namespaces.push(namespace);
            }
        }
        self.conditional_namespaces = namespaces;

        for pass in base.disabled_passes {
            if !self.disabled_passes.contains(&pass) {
                self.disabled_passes.push(pass);
            }
        }

        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        // Prepend base overrides
        let mut all_overrides = base.overrides;
        all_overrides.append(&mut self.overrides);
        self.overrides = all_overrides;
    }
}

/// Effective configuration for a specific file (after applying overrides)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub skip_reason: Option<String>,
    pub target_namespace: Option<String>,
    pub conditional_namespaces: Vec<String>,
    pub disabled_passes: Vec<PassId>,
    /// Matched an ignore pattern
    pub ignored: bool,
}

impl EffectiveConfig {
    pub fn is_enabled(&self, pass: PassId) -> bool {
        !self.disabled_passes.contains(&pass)
    }

    /// Immutable rule tables for these settings
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::mstest_with(
            self.skip_reason.as_deref().unwrap_or(SKIP_REASON),
            self.target_namespace.as_deref().unwrap_or(XUNIT_NAMESPACE),
            &self.conditional_namespaces,
        )
    }
}
