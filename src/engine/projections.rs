//! Read-only views over a ledger snapshot. All of them keep ledger
//! (insertion) order unless stated otherwise.

use serde::Serialize;

use crate::models::pickup::{PickupRequest, PickupStatus};

pub fn by_customer(requests: &[PickupRequest], customer_id: &str) -> Vec<PickupRequest> {
    requests
        .iter()
        .filter(|request| request.customer_id == customer_id)
        .cloned()
        .collect()
}

pub fn by_partner(requests: &[PickupRequest], partner_id: &str) -> Vec<PickupRequest> {
    requests
        .iter()
        .filter(|request| request.partner_id.as_deref() == Some(partner_id))
        .cloned()
        .collect()
}

pub fn available(requests: &[PickupRequest]) -> Vec<PickupRequest> {
    requests
        .iter()
        .filter(|request| request.status == PickupStatus::Pending)
        .cloned()
        .collect()
}

/// Newest first by creation time.
pub fn customer_history(requests: &[PickupRequest], customer_id: &str) -> Vec<PickupRequest> {
    let mut history = by_customer(requests, customer_id);
    // stable: equal timestamps keep ledger order
    history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    history
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerStats {
    pub total: usize,
    pub active: usize,
    pub awaiting_approval: usize,
    pub completed: usize,
}

pub fn customer_stats(requests: &[PickupRequest], customer_id: &str) -> CustomerStats {
    requests
        .iter()
        .filter(|request| request.customer_id == customer_id)
        .fold(CustomerStats::default(), |mut stats, request| {
            stats.total += 1;
            match request.status {
                PickupStatus::Accepted | PickupStatus::InProcess => stats.active += 1,
                PickupStatus::PendingApproval => stats.awaiting_approval += 1,
                PickupStatus::Completed => stats.completed += 1,
                PickupStatus::Pending => {}
            }
            stats
        })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartnerStats {
    pub available: usize,
    pub active: usize,
    pub completed: usize,
    pub collected_amount: f64,
}

pub fn partner_stats(requests: &[PickupRequest], partner_id: &str) -> PartnerStats {
    let mut stats = PartnerStats {
        available: requests
            .iter()
            .filter(|request| request.status == PickupStatus::Pending)
            .count(),
        ..PartnerStats::default()
    };

    for request in requests
        .iter()
        .filter(|request| request.partner_id.as_deref() == Some(partner_id))
    {
        if request.status == PickupStatus::Completed {
            stats.completed += 1;
            stats.collected_amount += request.total_amount.unwrap_or(0.0);
        } else {
            stats.active += 1;
        }
    }

    stats
}
