//! End-to-end generation: metadata, model, deduplication, emission.

use crate::codegen::{emitter_for, Emitter, GenerationOutput};
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};
use crate::metadata::cache::MetadataCache;
use crate::metadata::service::MetadataService;
use crate::model::{build_action, deduplicate, ActionData, EntityData};
use indexmap::IndexSet;
use std::sync::Arc;

/// Entities and actions to generate in one run
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub entities: Vec<String>,
    pub actions: Vec<String>,
}

/// Generation front-end over a metadata service and a (possibly shared) cache
pub struct Generator {
    service: Arc<dyn MetadataService>,
    cache: Arc<MetadataCache>,
    config: GeneratorConfig,
    emitter: Box<dyn Emitter>,
}

impl Generator {
    /// Generator with its own cache
    pub fn new(service: Arc<dyn MetadataService>, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(MetadataCache::new(config.filter_cap()?));
        Self::with_cache(service, cache, config)
    }

    /// Generator over a cache shared with other generators
    ///
    /// The cache sizes related-entity requests, so `config.filter_cap` must
    /// match the cap the cache was created with.
    pub fn with_cache(
        service: Arc<dyn MetadataService>,
        cache: Arc<MetadataCache>,
        config: GeneratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.filter_cap()? != cache.filter_cap() {
            return Err(GenerationError::Config(format!(
                "filter_cap {} does not match the shared cache's cap {}",
                config.filter_cap,
                cache.filter_cap()
            )));
        }
        let emitter = emitter_for(config.dialect, config.emit_options());
        Ok(Self {
            service,
            cache,
            config,
            emitter,
        })
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Deduplicated entity models for `keys`
    pub fn build_entities(&self, keys: &[String]) -> Result<Vec<EntityData>> {
        let keys = unique(keys);
        let entities = self.cache.get_entities(self.service.as_ref(), &keys)?;
        Ok(entities.into_iter().map(deduplicate).collect())
    }

    /// Emit every generated entity of `keys` into `output`; returns the entity count
    pub fn generate_entities(
        &self,
        keys: &[String],
        output: &mut GenerationOutput,
    ) -> Result<usize> {
        let mut count = 0;
        for entity in self.build_entities(keys)? {
            if !entity.generate {
                tracing::info!("Skipping entity '{}' (not generated)", entity.logical_name);
                continue;
            }
            output.add_entity(self.emitter.emit_entity(&entity)?)?;
            count += 1;
        }
        Ok(count)
    }

    /// Action models for `names`; actions whose definition cannot be parsed are skipped
    pub fn build_actions(&self, names: &[String]) -> Result<Vec<ActionData>> {
        let names = unique(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.service.fetch_action_definitions(&names)?;
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !records.iter().any(|r| &r.unique_name == *n))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GenerationError::ActionNotFound { actions: missing });
        }

        Ok(records.iter().filter_map(build_action).collect())
    }

    /// Emit the actions of `names` into `output`; returns the action count
    pub fn generate_actions(
        &self,
        names: &[String],
        output: &mut GenerationOutput,
    ) -> Result<usize> {
        let actions = self.build_actions(names)?;
        for action in &actions {
            output.add(self.emitter.emit_action(action)?);
        }
        Ok(actions.len())
    }

    /// Run one generation request
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        tracing::info!(
            "Generating {} entities and {} actions ({})",
            request.entities.len(),
            request.actions.len(),
            self.emitter.dialect()
        );

        let mut output = GenerationOutput::new();
        let entities = if request.entities.is_empty() {
            0
        } else {
            self.generate_entities(&request.entities, &mut output)?
        };
        let actions = self.generate_actions(&request.actions, &mut output)?;

        tracing::info!(
            "Generated {} entities, {} actions, {} units",
            entities,
            actions,
            output.len()
        );
        Ok(output)
    }
}

fn unique(keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Dialect;
    use crate::metadata::snapshot::fixture_service;

    fn generator(config: GeneratorConfig) -> Generator {
        Generator::new(Arc::new(fixture_service()), config).unwrap()
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_generate_entities_and_actions() {
        let generator = generator(GeneratorConfig::default());
        let output = generator
            .generate(&GenerationRequest {
                entities: keys(&["account", "contact"]),
                actions: keys(&["new_ApproveAccount", "new_Broken"]),
            })
            .unwrap();

        assert!(output.get("Account.cs").is_some());
        assert!(output.get("Contact.cs").is_some());
        assert!(output.get("OptionSets/Category.cs").is_some());
        assert!(output.get("ApproveAccount.cs").is_some());
        assert!(output.get("Broken.cs").is_none());
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn test_unknown_action_is_not_found() {
        let generator = generator(GeneratorConfig::default());
        let err = generator.build_actions(&keys(&["new_Missing"])).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ActionNotFound { actions } if actions == vec!["new_Missing"]
        ));
    }

    #[test]
    fn test_intersect_entity_is_skipped() {
        let generator = generator(GeneratorConfig::default());
        let mut output = GenerationOutput::new();
        let count = generator
            .generate_entities(&keys(&["accountleads"]), &mut output)
            .unwrap();
        assert_eq!(count, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_duplicate_keys_are_collapsed() {
        let generator = generator(GeneratorConfig::default());
        let entities = generator
            .build_entities(&keys(&["account", " account", "account"]))
            .unwrap();
        assert_eq!(entities.len(), 1);
        assert!(entities[0].attribute("Status2").is_some());
    }

    #[test]
    fn test_typescript_dialect() {
        let generator = generator(GeneratorConfig {
            dialect: Dialect::TypeScript,
            ..GeneratorConfig::default()
        });
        let output = generator
            .generate(&GenerationRequest {
                entities: keys(&["email"]),
                actions: keys(&["new_Ping"]),
            })
            .unwrap();
        assert!(output.get("email.ts").is_some());
        assert!(output.get("ping.ts").is_some());
    }

    #[test]
    fn test_shared_cache_between_generators() {
        let service: Arc<dyn MetadataService> = Arc::new(fixture_service());
        let cache = Arc::new(MetadataCache::new(std::num::NonZeroUsize::new(200).unwrap()));
        let config = GeneratorConfig::default();
        let first = Generator::with_cache(service.clone(), cache.clone(), config.clone()).unwrap();
        let second = Generator::with_cache(service, cache.clone(), config).unwrap();

        first.build_entities(&keys(&["account"])).unwrap();
        let related = cache.related_count();
        second.build_entities(&keys(&["account"])).unwrap();
        assert_eq!(cache.related_count(), related);
    }

    #[test]
    fn test_shared_cache_cap_must_match_config() {
        let service: Arc<dyn MetadataService> = Arc::new(fixture_service());
        let cache = Arc::new(MetadataCache::new(std::num::NonZeroUsize::new(200).unwrap()));
        let config = GeneratorConfig {
            filter_cap: 50,
            ..GeneratorConfig::default()
        };

        let err = Generator::with_cache(service, cache, config).err().unwrap();
        assert!(matches!(err, GenerationError::Config(message) if message.contains("50")));
    }
}
