//! Template storage behind the enforcement point.
//!
//! The store is the protected operation: handlers only reach it with an
//! [`AuthorizedRegistration`](crate::pipeline::AuthorizedRegistration) in hand.
use async_trait::async_trait;
use thiserror::Error;
use tollgate_policy::Template;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Insert a new template keyed by its id.
    ///
    /// # Errors
    /// - [`StoreError::Conflict`] if a template with the same id exists.
    async fn register(&self, template: Template) -> StoreResult<Template>;
    async fn get(&self, id: &str) -> StoreResult<Option<Template>>;
    async fn len(&self) -> StoreResult<usize>;
    fn backend_name(&self) -> &'static str;
}
