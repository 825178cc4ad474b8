//! Category to provider lookup

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ServiceError};
use crate::models::Category;
use crate::providers::{
    BungeeCordProvider, FillProject, FillProvider, Provider, PurpurProvider, UpstreamClient,
    VanillaProvider,
};

/// Providers keyed by category, in registration order.
///
/// Filled once at startup and read-only afterwards, so lookups need no lock.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<Category, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Registry with every built-in provider pointing at its public upstream
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = UpstreamClient::new(config)?;

        let fill = |project: FillProject| -> Arc<dyn Provider> {
            Arc::new(FillProvider::with_default_url(project, client.clone()))
        };

        Ok(Self::with_providers([
            Arc::new(VanillaProvider::with_default_url(client.clone())) as Arc<dyn Provider>,
            fill(FillProject::PAPER),
            fill(FillProject::FOLIA),
            Arc::new(PurpurProvider::with_default_url(client.clone())),
            fill(FillProject::VELOCITY),
            fill(FillProject::WATERFALL),
            Arc::new(BungeeCordProvider::with_default_url(client.clone())),
        ]))
    }

    /// Registry over the given providers; a later provider replaces an
    /// earlier one for the same category
    pub fn with_providers(providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        let mut registry = Self::default();
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    fn register(&mut self, provider: Arc<dyn Provider>) {
        debug!("Registering provider {}", provider.id());
        self.providers.insert(provider.category(), provider);
    }

    /// Look up the provider for a category id (case-insensitive)
    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>, ServiceError> {
        id.parse::<Category>()
            .ok()
            .and_then(|category| self.providers.get(&category))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("category {}", id)))
    }

    /// All providers in registration order
    pub fn list(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.values()
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.providers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionType;
    use crate::providers::MockProvider;
    use rstest::rstest;

    fn mock(category: Category) -> Arc<dyn Provider> {
        let mut provider = MockProvider::new();
        provider.expect_category().return_const(category);
        provider.expect_id().return_const(category.as_str());
        Arc::new(provider)
    }

    #[test]
    fn new_registers_every_category_in_order() {
        let registry = ProviderRegistry::new(&ProviderConfig::default()).unwrap();

        let categories: Vec<Category> = registry.categories().collect();

        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[rstest]
    #[case(Category::Vanilla, &[VersionType::Release, VersionType::Snapshot, VersionType::Beta, VersionType::Alpha], false, false, true)]
    #[case(Category::Paper, &[VersionType::Release, VersionType::Snapshot], true, true, true)]
    #[case(Category::Folia, &[VersionType::Release, VersionType::Snapshot], true, true, true)]
    #[case(Category::Purpur, &[VersionType::Release], true, false, true)]
    #[case(Category::Velocity, &[VersionType::Snapshot], true, true, true)]
    #[case(Category::Waterfall, &[VersionType::Release, VersionType::Snapshot], true, true, true)]
    #[case(Category::BungeeCord, &[VersionType::Release], true, false, false)]
    fn filters_per_category(
        #[case] category: Category,
        #[case] types: &[VersionType],
        #[case] has_channels: bool,
        #[case] supported: bool,
        #[case] year: bool,
    ) {
        let registry = ProviderRegistry::new(&ProviderConfig::default()).unwrap();

        let filters = registry.get(category.as_str()).unwrap().filters();

        assert_eq!(filters.types, types.to_vec());
        assert_eq!(!filters.channels.is_empty(), has_channels);
        assert_eq!(filters.supported, supported);
        assert_eq!(filters.year, year);
        assert!(filters.stable);
        assert!(filters.java);
    }

    #[test]
    fn fill_channels_cover_stable_vocabulary() {
        let registry = ProviderRegistry::new(&ProviderConfig::default()).unwrap();

        let channels = registry.get("paper").unwrap().filters().channels;

        assert_eq!(channels, vec!["ALPHA", "BETA", "STABLE", "RECOMMENDED"]);
    }

    #[rstest]
    #[case("paper")]
    #[case("PAPER")]
    #[case("Velocity")]
    fn get_is_case_insensitive(#[case] id: &str) {
        let registry =
            ProviderRegistry::with_providers([mock(Category::Paper), mock(Category::Velocity)]);

        assert!(registry.get(id).is_ok());
    }

    #[rstest]
    #[case("spigot")]
    #[case("folia")]
    fn get_unknown_or_unregistered_category_is_not_found(#[case] id: &str) {
        let registry = ProviderRegistry::with_providers([mock(Category::Paper)]);

        assert!(matches!(registry.get(id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn list_keeps_registration_order() {
        let registry = ProviderRegistry::with_providers([
            mock(Category::Velocity),
            mock(Category::Vanilla),
            mock(Category::Paper),
        ]);

        let order: Vec<Category> = registry.list().map(|p| p.category()).collect();

        assert_eq!(
            order,
            vec![Category::Velocity, Category::Vanilla, Category::Paper]
        );
    }
}
