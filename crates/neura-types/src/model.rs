//! Model catalog entries.

use serde::{Deserialize, Serialize};

/// A selectable model: a display name and the identifier sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelChoice {
    pub name: String,
    pub value: String,
}

impl ModelChoice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether an installed tag satisfies this entry.
    ///
    /// The server reports untagged pulls as `name:latest`, so a catalog entry
    /// without a tag matches its `:latest` variant as well.
    pub fn is_installed_as(&self, installed: &str) -> bool {
        if installed == self.value {
            return true;
        }
        !self.value.contains(':')
            && installed
                .strip_suffix(":latest")
                .is_some_and(|base| base == self.value)
    }
}

/// The models offered when no catalog is configured.
pub fn default_catalog() -> Vec<ModelChoice> {
    vec![
        ModelChoice::new("DeepSeek R1 (Latest)", "deepseek-r1:latest"),
        ModelChoice::new("DeepSeek R1 (1.5B)", "deepseek-r1:1.5b"),
        ModelChoice::new("CodeLlama", "codellama"),
        ModelChoice::new("Mistral", "mistral"),
        ModelChoice::new("Llama2", "llama2"),
        ModelChoice::new("Neural Chat", "neural-chat"),
        ModelChoice::new("StarCoder", "starcoder"),
    ]
}

/// Keep the catalog entries that appear among the installed tags, in catalog order.
pub fn filter_installed(catalog: &[ModelChoice], installed: &[String]) -> Vec<ModelChoice> {
    catalog
        .iter()
        .filter(|choice| installed.iter().any(|tag| choice.is_installed_as(tag)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_entry_matches_latest() {
        let choice = ModelChoice::new("Mistral", "mistral");
        assert!(choice.is_installed_as("mistral"));
        assert!(choice.is_installed_as("mistral:latest"));
        assert!(!choice.is_installed_as("mistral:7b"));
    }

    #[test]
    fn test_tagged_entry_requires_exact_tag() {
        let choice = ModelChoice::new("DeepSeek R1 (1.5B)", "deepseek-r1:1.5b");
        assert!(choice.is_installed_as("deepseek-r1:1.5b"));
        assert!(!choice.is_installed_as("deepseek-r1:latest"));
    }

    #[test]
    fn test_filter_installed_keeps_catalog_order() {
        let installed = vec!["mistral:latest".to_string(), "codellama:latest".to_string()];
        let available = filter_installed(&default_catalog(), &installed);
        let values: Vec<_> = available.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["codellama", "mistral"]);
    }
}
