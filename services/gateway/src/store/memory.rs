//! In-memory template store.
//!
//! Not durable; state is lost on restart. Reads share a `tokio::sync::RwLock`,
//! registrations take the write lock so the conflict check and insert are atomic.
use super::{StoreError, StoreResult, TemplateStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tollgate_policy::Template;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    templates: RwLock<HashMap<String, Template>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn register(&self, template: Template) -> StoreResult<Template> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            return Err(StoreError::Conflict(format!(
                "template {} exists",
                template.id
            )));
        }
        templates.insert(template.id.clone(), template.clone());
        metrics::gauge!("tollgate_templates_total").set(templates.len() as f64);
        Ok(template)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Template>> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.templates.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
