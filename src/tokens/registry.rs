//! Prefix-keyed lookup table of token providers

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::error::{ConfigError, ProviderError};
use crate::tokens::chars::CharRatioProvider;
use crate::tokens::estimate::{EstimateProvider, ESTIMATE_MODEL};
use crate::tokens::tiktoken::TiktokenProvider;
use crate::tokens::TokenProvider;

/// Maps model-name prefixes to providers.
///
/// The longest registered prefix matching a model name wins; among equal
/// prefixes the most recently registered one wins.
#[derive(Clone, Default)]
pub struct TokenRegistry {
    entries: Vec<(String, Arc<dyn TokenProvider>)>,
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(p, provider)| (p, provider.name())))
            .finish()
    }
}

impl TokenRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the local providers shipped in this crate
    pub fn with_builtin() -> Self {
        let tiktoken: Arc<dyn TokenProvider> = Arc::new(TiktokenProvider::new());
        let mut registry = Self::new();
        for prefix in ["gpt-", "o1", "o3", "o4", "cl100k", "o200k"] {
            registry.register_shared(prefix, Arc::clone(&tiktoken));
        }
        registry.register("chars-", CharRatioProvider::new());
        registry.register(ESTIMATE_MODEL, EstimateProvider::new());
        registry
    }

    /// Add a provider for every model name starting with `prefix`
    pub fn register<P>(&mut self, prefix: impl Into<String>, provider: P) -> &mut Self
    where
        P: TokenProvider + 'static,
    {
        self.register_shared(prefix, Arc::new(provider))
    }

    /// Same as `register`, for a provider already behind an `Arc`
    pub fn register_shared(
        &mut self,
        prefix: impl Into<String>,
        provider: Arc<dyn TokenProvider>,
    ) -> &mut Self {
        self.entries.push((prefix.into(), provider));
        self
    }

    /// Registered prefixes, in registration order
    pub fn prefixes(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Provider responsible for `model`, validated against it
    pub fn resolve(&self, model: &str) -> Result<Arc<dyn TokenProvider>, ConfigError> {
        let provider = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (prefix, _))| model.starts_with(prefix.as_str()))
            .max_by_key(|(idx, (prefix, _))| (prefix.len(), *idx))
            .map(|(_, (_, provider))| Arc::clone(provider))
            .ok_or_else(|| ConfigError::UnknownModel {
                model: model.to_string(),
                hint: Some(format!("known prefixes: {}", self.prefixes().join(", "))),
            })?;

        provider
            .validate(model)
            .map_err(|reason| ConfigError::UnknownModel {
                model: model.to_string(),
                hint: Some(reason),
            })?;
        Ok(provider)
    }

    /// Resolve every model up front; the first unknown one is an error
    pub fn resolve_all<S: AsRef<str>>(&self, models: &[S]) -> Result<ModelSet, ConfigError> {
        let mut entries = Vec::with_capacity(models.len());
        for model in models {
            let model = model.as_ref();
            if entries.iter().any(|(name, _)| name == model) {
                continue;
            }
            entries.push((model.to_string(), self.resolve(model)?));
        }
        Ok(ModelSet { entries })
    }
}

/// Validated models with their providers, ready for counting
#[derive(Clone, Default)]
pub struct ModelSet {
    entries: Vec<(String, Arc<dyn TokenProvider>)>,
}

impl ModelSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Count `text` for every model.
    ///
    /// Failed models are left out of the map and returned separately.
    pub fn count_all(&self, text: &str) -> (BTreeMap<String, u64>, Vec<ProviderError>) {
        let mut counts = BTreeMap::new();
        let mut failures = Vec::new();
        for (model, provider) in &self.entries {
            match provider.count(model, text) {
                Ok(n) => {
                    counts.insert(model.clone(), n);
                }
                Err(e) => failures.push(e),
            }
        }
        (counts, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u64);

    impl TokenProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn validate(&self, _model: &str) -> Result<(), String> {
            Ok(())
        }
        fn count(&self, _model: &str, _text: &str) -> Result<u64, ProviderError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl TokenProvider for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn validate(&self, _model: &str) -> Result<(), String> {
            Ok(())
        }
        fn count(&self, model: &str, _text: &str) -> Result<u64, ProviderError> {
            Err(ProviderError::new(model, "backend offline"))
        }
    }

    #[test]
    fn test_builtin_resolution() {
        let registry = TokenRegistry::with_builtin();
        assert_eq!(registry.resolve("gpt-4o").unwrap().name(), "tiktoken");
        assert_eq!(registry.resolve("o3-mini").unwrap().name(), "tiktoken");
        assert_eq!(registry.resolve("chars-4").unwrap().name(), "chars");
        assert_eq!(registry.resolve("estimate").unwrap().name(), "estimate");
    }

    #[test]
    fn test_unknown_model_is_config_error() {
        let registry = TokenRegistry::with_builtin();
        let err = registry.resolve("foo-bar").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownModel { ref model, .. } if model == "foo-bar"));

        // Prefix matches but the provider rejects the name
        let err = registry.resolve("chars-zero").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownModel { .. }));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut registry = TokenRegistry::new();
        registry.register("claude", Fixed(1));
        registry.register("claude-3", Fixed(3));
        let set = registry.resolve_all(&["claude-3-haiku", "claude-2"]).unwrap();
        let (counts, failures) = set.count_all("text");
        assert!(failures.is_empty());
        assert_eq!(counts["claude-3-haiku"], 3);
        assert_eq!(counts["claude-2"], 1);
    }

    #[test]
    fn test_later_registration_overrides_same_prefix() {
        let mut registry = TokenRegistry::with_builtin();
        registry.register("chars-", Fixed(42));
        let set = registry.resolve_all(&["chars-4"]).unwrap();
        assert_eq!(set.count_all("abc").0["chars-4"], 42);
    }

    #[test]
    fn test_count_all_reports_failures_per_model() {
        let mut registry = TokenRegistry::with_builtin();
        registry.register("remote-", Broken);
        let set = registry.resolve_all(&["chars-1", "remote-x"]).unwrap();
        let (counts, failures) = set.count_all("abc");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["chars-1"], 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].model, "remote-x");
    }

    #[test]
    fn test_resolve_all_dedups_and_fails_fast() {
        let registry = TokenRegistry::with_builtin();
        let set = registry.resolve_all(&["chars-4", "chars-4"]).unwrap();
        assert_eq!(set.names().count(), 1);
        assert!(registry.resolve_all(&["chars-4", "nope"]).is_err());
    }
}
