use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::pickup::{PickupItem, check_item, items_total};

/// What a partner types in before an item gets an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub category: Option<String>,
    pub quantity: f64,
    pub price: f64,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            category: None,
            quantity,
            price,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partner-side scratch list of weighed materials, handed to the ledger in
/// one piece once the partner submits it.
#[derive(Debug, Clone, Default)]
pub struct ScrapCart {
    items: Vec<PickupItem>,
}

impl ScrapCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, draft: ItemDraft) -> Result<&PickupItem, LedgerError> {
        let name = draft.name.trim();
        check_item(name, draft.quantity, draft.price)?;

        let category = draft
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        self.items.push(PickupItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category,
            quantity: draft.quantity,
            price: draft.price,
        });

        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, item_id: &str) -> Option<PickupItem> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[PickupItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        items_total(&self.items)
    }

    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn into_items(self) -> Vec<PickupItem> {
        self.items
    }
}
