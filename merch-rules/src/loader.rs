use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::RuleError;
use crate::rule::Rule;

/// Loads every rule found at `path`, a single file or a directory of
/// `.json`, `.yaml` and `.yml` files. Rule ids must be unique across files.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let mut rules = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    ensure_unique(&rules)?;
    rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    Ok(rules)
}

fn load_from_directory(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let file_path = entry.path();
        if let Some(ext) = file_path.extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                files.push(file_path);
            }
        }
    }

    // read_dir order is platform dependent
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        let mut file_rules = load_from_file(&file)?;
        rules.append(&mut file_rules);
    }
    Ok(rules)
}

fn load_from_file(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_rules(&raw, path)
}

fn parse_rules(raw: &str, path: &Path) -> Result<Vec<Rule>, RuleError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|err| RuleError::parse_error(path, err.to_string()))?;

    let parsed = if value.is_sequence() {
        serde_yaml::from_value::<Vec<Rule>>(value)
    } else if value.get("rules").is_some() {
        serde_yaml::from_value::<RuleDocument>(value).map(|doc| doc.rules)
    } else {
        serde_yaml::from_value::<Rule>(value).map(|rule| vec![rule])
    };

    parsed.map_err(|err| RuleError::parse_error(path, err.to_string()))
}

fn ensure_unique(rules: &[Rule]) -> Result<(), RuleError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(RuleError::DuplicateRule {
                id: rule.id.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    rules: Vec<Rule>,
}
