//! Catalog collaborator
//!
//! The item catalog is owned by an external service; the core only needs the
//! category mapping. The in-memory implementation backs tests and the demo
//! service shell.

use dashmap::DashMap;

pub trait Catalog: Send + Sync {
    /// Item ids belonging to a category, in a stable (ascending) order.
    fn items_by_category(&self, category: &str) -> Vec<String>;

    /// Category of an item, if the catalog knows it.
    fn category_of(&self, item_id: &str) -> Option<String>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    categories: DashMap<String, String>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, item_id: impl Into<String>, category: impl Into<String>) {
        self.categories.insert(item_id.into(), category.into());
    }
}

impl Catalog for InMemoryCatalog {
    fn items_by_category(&self, category: &str) -> Vec<String> {
        let mut items: Vec<String> = self
            .categories
            .iter()
            .filter(|entry| entry.value() == category)
            .map(|entry| entry.key().clone())
            .collect();
        items.sort();
        items
    }

    fn category_of(&self, item_id: &str) -> Option<String> {
        self.categories.get(item_id).map(|c| c.value().clone())
    }
}
