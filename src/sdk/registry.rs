use async_trait::async_trait;

use super::ApiResult;

/// Container registry, created and updated synchronously
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    pub id: String,
    pub name: String,
    pub public: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryCreate {
    pub name: String,
    pub public: bool,
}

#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn get_registry(&self, id: &str) -> ApiResult<Registry>;
    async fn create_registry(&self, request: RegistryCreate) -> ApiResult<Registry>;
    async fn update_registry(&self, id: &str, public: bool) -> ApiResult<Registry>;
    async fn delete_registry(&self, id: &str) -> ApiResult<()>;
}
