//! Configuration loading for unitport

mod schema;

pub use schema::{Config, ConfigOverride, EffectiveConfig};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".unitportrc.json";

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_config = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base_config);
    }

    Ok(config)
}

/// Resolve an extends reference, relative to the extending config
fn resolve_extends(
    config_path: &Path,
    extends: &str,
    visited: &mut HashSet<PathBuf>,
) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let extends_path = config_dir.join(extends);

    // Ensure it has .json extension
    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

/// Search for .unitportrc.json in directory and its parents
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.exists())
}

/// Build a GlobSet from file patterns
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid file pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to compile file patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PassId;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert!(config.skip_reason.is_none());
        assert!(config.disabled_passes.is_empty());
    }

    #[test]
    fn finds_config_in_parent_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILENAME, r#"{ "skipReason": "Parent" }"#);
        let nested = dir.path().join("tests").join("unit");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested, None).unwrap();
        assert_eq!(config.skip_reason.as_deref(), Some("Parent"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path(), Some(Path::new("missing.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_extends() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.json",
            r#"{
                "skipReason": "Base reason",
                "targetNamespace": "Xunit",
                "conditionalNamespaces": ["My.Testing"],
                "disabledPasses": ["assert-rename"],
                "ignore": ["**/Legacy/**"]
            }"#,
        );
        write(
            dir.path(),
            CONFIG_FILENAME,
            r#"{
                "extends": "./base",
                "skipReason": "Child reason",
                "disabledPasses": ["usings"]
            }"#,
        );

        let config = load_config(dir.path(), None).unwrap();

        // Child value overrides base
        assert_eq!(config.skip_reason.as_deref(), Some("Child reason"));
        // Base values are inherited
        assert_eq!(config.target_namespace.as_deref(), Some("Xunit"));
        assert_eq!(config.conditional_namespaces, ["My.Testing"]);
        assert!(config.ignore.contains(&"**/Legacy/**".to_string()));
        // Disabled passes accumulate
        assert!(config.disabled_passes.contains(&PassId::Usings));
        assert!(config.disabled_passes.contains(&PassId::AssertRename));
    }

    #[test]
    fn circular_extends_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{ "extends": "./b.json" }"#);
        write(dir.path(), "b.json", r#"{ "extends": "./a.json" }"#);

        let err = load_config(dir.path(), Some(Path::new("a.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("Circular extends"));
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILENAME, r#"{ "disabledPasses": ["bogus"] }"#);
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON in config"));
    }

    #[test]
    fn test_config_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "skipReason": "Default",
                "ignore": ["**/Generated/**"],
                "overrides": [
                    {
                        "files": ["**/Legacy/**"],
                        "skipReason": "Legacy",
                        "disabledPasses": ["expected-exception"]
                    },
                    {
                        "files": ["**/Generated/Keep*.cs"],
                        "ignore": false
                    }
                ]
            }"#,
        )
        .unwrap();

        let effective = config.effective_for_file(Path::new("tests/MathTests.cs"));
        assert_eq!(effective.skip_reason.as_deref(), Some("Default"));
        assert!(effective.is_enabled(PassId::ExpectedException));
        assert!(!effective.ignored);

        let effective = config.effective_for_file(Path::new("tests/Legacy/OldTests.cs"));
        assert_eq!(effective.skip_reason.as_deref(), Some("Legacy"));
        assert!(!effective.is_enabled(PassId::ExpectedException));

        assert!(config.effective_for_file(Path::new("tests/Generated/Auto.cs")).ignored);
        assert!(!config.effective_for_file(Path::new("tests/Generated/KeepMe.cs")).ignored);
    }

    #[test]
    fn rule_set_reflects_settings() {
        let config: Config = serde_json::from_str(
            r#"{ "skipReason": "Not ported", "conditionalNamespaces": ["My.Testing"] }"#,
        )
        .unwrap();
        let rules = config.rule_set();
        assert_eq!(rules.attributes.skip_reason, "Not ported");
        assert!(rules.imports.is_framework("My.Testing"));
        assert_eq!(rules.imports.target, "Xunit");
    }

    #[test]
    fn glob_sets_match_nested_paths() {
        let set = build_glob_set(&["**/*.Designer.cs".to_string()]).unwrap();
        assert!(set.is_match(Path::new("src/Forms/Main.Designer.cs")));
        assert!(!set.is_match(Path::new("src/Forms/Main.cs")));
        assert!(build_glob_set(&["[".to_string()]).is_err());
    }
}
