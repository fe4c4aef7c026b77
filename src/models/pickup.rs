use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PickupStatus {
    Pending,
    Accepted,
    InProcess,
    PendingApproval,
    Completed,
}

impl PickupStatus {
    pub const ALL: [PickupStatus; 5] = [
        PickupStatus::Pending,
        PickupStatus::Accepted,
        PickupStatus::InProcess,
        PickupStatus::PendingApproval,
        PickupStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Accepted => "accepted",
            PickupStatus::InProcess => "in-process",
            PickupStatus::PendingApproval => "pending-approval",
            PickupStatus::Completed => "completed",
        }
    }

    /// The only status this one may move to. `Completed` is terminal.
    pub fn successor(&self) -> Option<PickupStatus> {
        match self {
            PickupStatus::Pending => Some(PickupStatus::Accepted),
            PickupStatus::Accepted => Some(PickupStatus::InProcess),
            PickupStatus::InProcess => Some(PickupStatus::PendingApproval),
            PickupStatus::PendingApproval => Some(PickupStatus::Completed),
            PickupStatus::Completed => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PickupStatus::Accepted | PickupStatus::InProcess)
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PickupItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Kilograms.
    pub quantity: f64,
    /// Currency per kilogram.
    pub price: f64,
}

impl PickupItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.price
    }
}

/// Checks a weighed item before it is stored. Non-finite numbers would be
/// written as `null` and make the stored ledger unreadable.
pub fn check_item(name: &str, quantity: f64, price: f64) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidItem("item name is empty".to_string()));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(LedgerError::InvalidItem(format!(
            "quantity for {name} must be positive"
        )));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(LedgerError::InvalidItem(format!(
            "price for {name} must not be negative"
        )));
    }
    Ok(())
}

pub fn items_total(items: &[PickupItem]) -> f64 {
    items.iter().map(PickupItem::amount).sum()
}

/// Fields a customer supplies when scheduling a pickup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPickupRequest {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub pickup_date: String,
    pub time_slot: String,
    pub address: String,
    #[serde(default)]
    pub map_link: Option<String>,
}

/// Contact snapshot corrections. Lifecycle fields are only reachable
/// through the ledger's transition operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickupPatch {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub partner_name: Option<String>,
    pub partner_phone: Option<String>,
}

impl PickupPatch {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.customer_phone.is_none()
            && self.partner_name.is_none()
            && self.partner_phone.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_phone: Option<String>,
    pub pickup_date: String,
    pub time_slot: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_link: Option<String>,
    pub status: PickupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PickupItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PickupRequest {
    pub fn has_partner(&self) -> bool {
        self.partner_id.is_some()
    }

    /// The code is shown to the customer only while the partner is on the way
    /// or collecting.
    pub fn visible_pickup_code(&self) -> Option<&str> {
        if self.status.is_active() {
            self.pickup_code.as_deref()
        } else {
            None
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.items
            .as_deref()
            .map(|items| items.iter().map(|item| item.quantity).sum())
            .unwrap_or(0.0)
    }
}
