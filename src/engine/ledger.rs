//! The pickup ledger: every pickup request, its lifecycle transitions and the
//! projections the dashboards read.
//!
//! Requests move strictly along
//! `pending -> accepted -> in-process -> pending-approval -> completed`.
//! Each mutation is applied to the in-memory snapshot first and then written
//! to the store as one JSON list under [`PICKUP_REQUESTS_KEY`]; whether the
//! write landed is reported as a [`Durability`] on the result. Mutations are
//! serialised through a write gate held across the store write, so two
//! concurrent calls never build on the same stale snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, warn};

use crate::engine::LoadingGuard;
use crate::engine::code::{codes_match, generate_pickup_code};
use crate::engine::projections::{self, CustomerStats, PartnerStats};
use crate::error::LedgerError;
use crate::models::pickup::{
    NewPickupRequest, PickupItem, PickupPatch, PickupRequest, PickupStatus, check_item,
    items_total,
};
use crate::observability::metrics::Metrics;
use crate::store::{Durability, KeyValueStore, PICKUP_REQUESTS_KEY, get_json, set_json};

/// Largest tolerated gap between a submitted total and Σ quantity×price.
const TOTAL_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Created {
        request_id: String,
    },
    Transitioned {
        request_id: String,
        from: PickupStatus,
        to: PickupStatus,
    },
    Updated {
        request_id: String,
    },
    Reloaded {
        count: usize,
    },
}

/// A mutation that took effect in memory, with the store outcome attached.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub durability: Durability,
}

impl<T> Applied<T> {
    pub fn is_persisted(&self) -> bool {
        self.durability.is_persisted()
    }
}

pub struct PickupLedger {
    store: Arc<dyn KeyValueStore>,
    snapshot: ArcSwap<Vec<PickupRequest>>,
    write_gate: Mutex<()>,
    loading: AtomicBool,
    error: ArcSwapOption<String>,
    events_tx: broadcast::Sender<LedgerEvent>,
    metrics: Metrics,
}

impl PickupLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Metrics, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            store,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            write_gate: Mutex::new(()),
            loading: AtomicBool::new(false),
            error: ArcSwapOption::empty(),
            events_tx,
            metrics,
        }
    }

    /// Replaces the in-memory ledger with what the store holds. Returns the
    /// number of requests loaded, or `None` if the store could not be read,
    /// in which case the previous snapshot stays and the error slot is set.
    pub async fn refresh(&self) -> Option<usize> {
        let _gate = self.write_gate.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        match get_json::<Vec<PickupRequest>>(self.store.as_ref(), PICKUP_REQUESTS_KEY).await {
            Ok(stored) => {
                let requests = stored.unwrap_or_default();
                let count = requests.len();
                self.metrics.observe_ledger(&requests);
                self.snapshot.store(Arc::new(requests));
                self.error.store(None);

                info!(count, backend = self.store.backend_tag(), "pickup ledger loaded");
                let _ = self.events_tx.send(LedgerEvent::Reloaded { count });
                Some(count)
            }
            Err(err) => {
                error!(error = %err, "failed to load pickup requests");
                self.metrics
                    .store_failures_total
                    .with_label_values(&["load"])
                    .inc();
                self.error
                    .store(Some(Arc::new(format!("Failed to load data: {err}"))));
                None
            }
        }
    }

    pub async fn create(
        &self,
        new_request: NewPickupRequest,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        let NewPickupRequest {
            customer_id,
            customer_name,
            customer_phone,
            pickup_date,
            time_slot,
            address,
            map_link,
        } = new_request;

        let customer_id = required(customer_id, "customerId").inspect_err(|err| self.refuse(err))?;
        let pickup_date = required(pickup_date, "pickupDate").inspect_err(|err| self.refuse(err))?;
        let time_slot = required(time_slot, "timeSlot").inspect_err(|err| self.refuse(err))?;
        let address = required(address, "address").inspect_err(|err| self.refuse(err))?;
        let map_link = map_link
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty());

        let _gate = self.write_gate.lock().await;
        let current = self.snapshot.load_full();

        let now = Utc::now();
        let request = PickupRequest {
            id: next_request_id(&current, now.timestamp_millis()),
            customer_id,
            customer_name,
            customer_phone,
            partner_id: None,
            partner_name: None,
            partner_phone: None,
            pickup_date,
            time_slot,
            address,
            map_link,
            status: PickupStatus::Pending,
            pickup_code: None,
            items: None,
            total_amount: None,
            created_at: now,
            updated_at: now,
        };

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(request.clone());

        let durability = self.apply(next, "create").await;

        self.metrics
            .pickup_transitions_total
            .with_label_values(&[PickupStatus::Pending.as_str()])
            .inc();
        info!(
            request_id = %request.id,
            customer_id = %request.customer_id,
            time_slot = %request.time_slot,
            "pickup request created"
        );
        let _ = self.events_tx.send(LedgerEvent::Created {
            request_id: request.id.clone(),
        });

        Ok(Applied {
            value: request,
            durability,
        })
    }

    /// Corrects contact details on a request. Partner details can only be
    /// patched once a partner is attached. An empty patch changes nothing and
    /// writes nothing.
    pub async fn update(
        &self,
        id: &str,
        patch: PickupPatch,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        if patch.is_empty() {
            let Some(request) = self.get(id) else {
                let err = LedgerError::NotFound(id.to_string());
                self.refuse(&err);
                return Err(err);
            };
            return Ok(Applied {
                value: request,
                durability: Durability::Persisted,
            });
        }

        self.mutate(id, "update", move |request| {
            let touches_partner = patch.partner_name.is_some() || patch.partner_phone.is_some();
            if touches_partner && !request.has_partner() {
                return Err(LedgerError::MissingField("partnerId"));
            }

            if let Some(name) = patch.customer_name {
                request.customer_name = name;
            }
            if let Some(phone) = patch.customer_phone {
                request.customer_phone = phone;
            }
            if let Some(name) = patch.partner_name {
                request.partner_name = Some(name);
            }
            if let Some(phone) = patch.partner_phone {
                request.partner_phone = Some(phone);
            }
            Ok(())
        })
        .await
    }

    /// Moves a request to `status` when that needs no extra data. Only
    /// `completed` qualifies; the other statuses are reached through
    /// [`accept`](Self::accept), [`start_pickup`](Self::start_pickup) and
    /// [`add_items`](Self::add_items), and nothing returns to `pending`.
    pub async fn set_status(
        &self,
        id: &str,
        status: PickupStatus,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        if status == PickupStatus::Completed {
            return self.approve_pickup(id).await;
        }

        self.mutate(id, "set_status", move |request| {
            Err(LedgerError::InvalidTransition {
                id: request.id.clone(),
                from: request.status,
                to: status,
            })
        })
        .await
    }

    pub async fn accept(
        &self,
        id: &str,
        partner_id: &str,
        partner_name: &str,
        partner_phone: &str,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        if partner_id.trim().is_empty() {
            let err = LedgerError::MissingField("partnerId");
            self.refuse(&err);
            return Err(err);
        }

        self.mutate(id, "accept", |request| {
            ensure_transition(request, PickupStatus::Accepted)?;
            request.status = PickupStatus::Accepted;
            request.partner_id = Some(partner_id.to_string());
            request.partner_name = Some(partner_name.to_string());
            request.partner_phone = Some(partner_phone.to_string());
            request.pickup_code = Some(generate_pickup_code());
            Ok(())
        })
        .await
    }

    /// Starts the pickup when `entered_code` matches the request's code,
    /// ignoring case. Anything else leaves the request untouched.
    pub async fn start_pickup(
        &self,
        id: &str,
        entered_code: &str,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        self.mutate(id, "start_pickup", |request| {
            let expected = request
                .pickup_code
                .as_deref()
                .ok_or_else(|| LedgerError::MissingPickupCode(request.id.clone()))?;
            ensure_transition(request, PickupStatus::InProcess)?;
            if !codes_match(entered_code, expected) {
                return Err(LedgerError::CodeMismatch);
            }
            request.status = PickupStatus::InProcess;
            Ok(())
        })
        .await
    }

    /// Attaches the weighed items. `total_amount` is stored as given; a total
    /// that disagrees with the items is only logged.
    pub async fn add_items(
        &self,
        id: &str,
        items: Vec<PickupItem>,
        total_amount: f64,
    ) -> Result<Applied<PickupRequest>, LedgerError> {
        if items.is_empty() {
            self.refuse(&LedgerError::NoItems);
            return Err(LedgerError::NoItems);
        }
        let checked = items
            .iter()
            .try_for_each(|item| check_item(&item.name, item.quantity, item.price))
            .and_then(|()| {
                if total_amount.is_finite() && total_amount >= 0.0 {
                    Ok(())
                } else {
                    Err(LedgerError::InvalidItem(format!(
                        "total amount {total_amount} is not a valid amount"
                    )))
                }
            });
        if let Err(err) = checked {
            self.refuse(&err);
            return Err(err);
        }

        let computed = items_total(&items);
        if (computed - total_amount).abs() > TOTAL_TOLERANCE {
            warn!(
                request_id = %id,
                submitted = total_amount,
                computed,
                "submitted total differs from item sum"
            );
        }

        self.mutate(id, "add_items", move |request| {
            ensure_transition(request, PickupStatus::PendingApproval)?;
            request.status = PickupStatus::PendingApproval;
            request.items = Some(items);
            request.total_amount = Some(total_amount);
            Ok(())
        })
        .await
    }

    pub async fn approve_pickup(&self, id: &str) -> Result<Applied<PickupRequest>, LedgerError> {
        self.mutate(id, "approve_pickup", |request| {
            ensure_transition(request, PickupStatus::Completed)?;
            request.status = PickupStatus::Completed;
            Ok(())
        })
        .await
    }

    pub fn snapshot(&self) -> Arc<Vec<PickupRequest>> {
        self.snapshot.load_full()
    }

    pub fn get(&self, id: &str) -> Option<PickupRequest> {
        self.snapshot
            .load()
            .iter()
            .find(|request| request.id == id)
            .cloned()
    }

    pub fn get_by_customer(&self, customer_id: &str) -> Vec<PickupRequest> {
        projections::by_customer(&self.snapshot.load(), customer_id)
    }

    pub fn get_by_partner(&self, partner_id: &str) -> Vec<PickupRequest> {
        projections::by_partner(&self.snapshot.load(), partner_id)
    }

    pub fn get_available(&self) -> Vec<PickupRequest> {
        projections::available(&self.snapshot.load())
    }

    pub fn history_for_customer(&self, customer_id: &str) -> Vec<PickupRequest> {
        projections::customer_history(&self.snapshot.load(), customer_id)
    }

    pub fn customer_stats(&self, customer_id: &str) -> CustomerStats {
        projections::customer_stats(&self.snapshot.load(), customer_id)
    }

    pub fn partner_stats(&self, partner_id: &str) -> PartnerStats {
        projections::partner_stats(&self.snapshot.load(), partner_id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Message of the last failed store operation, cleared by the next
    /// successful one.
    pub fn error(&self) -> Option<String> {
        self.error.load_full().map(|message| message.as_ref().clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<LedgerEvent> {
        BroadcastStream::new(self.subscribe())
    }

    async fn mutate<F>(
        &self,
        id: &str,
        operation: &'static str,
        change: F,
    ) -> Result<Applied<PickupRequest>, LedgerError>
    where
        F: FnOnce(&mut PickupRequest) -> Result<(), LedgerError>,
    {
        let _gate = self.write_gate.lock().await;
        let current = self.snapshot.load_full();

        let Some(index) = current.iter().position(|request| request.id == id) else {
            let err = LedgerError::NotFound(id.to_string());
            self.refuse(&err);
            return Err(err);
        };

        let mut request = current[index].clone();
        let from = request.status;
        if let Err(err) = change(&mut request) {
            self.refuse(&err);
            return Err(err);
        }
        request.updated_at = Utc::now();

        let mut next = current.as_ref().clone();
        next[index] = request.clone();
        let durability = self.apply(next, operation).await;

        let event = if request.status != from {
            self.metrics
                .pickup_transitions_total
                .with_label_values(&[request.status.as_str()])
                .inc();
            info!(
                request_id = %request.id,
                from = %from,
                to = %request.status,
                "pickup request transitioned"
            );
            LedgerEvent::Transitioned {
                request_id: request.id.clone(),
                from,
                to: request.status,
            }
        } else {
            info!(request_id = %request.id, operation, "pickup request updated");
            LedgerEvent::Updated {
                request_id: request.id.clone(),
            }
        };
        let _ = self.events_tx.send(event);

        Ok(Applied {
            value: request,
            durability,
        })
    }

    /// Publishes `next` as the current ledger, then writes it to the store.
    async fn apply(&self, next: Vec<PickupRequest>, operation: &'static str) -> Durability {
        let next = Arc::new(next);
        self.metrics.observe_ledger(&next);
        self.snapshot.store(next.clone());

        match set_json(self.store.as_ref(), PICKUP_REQUESTS_KEY, next.as_slice()).await {
            Ok(()) => {
                self.error.store(None);
                Durability::Persisted
            }
            Err(err) => {
                error!(operation, error = %err, "failed to persist pickup requests");
                self.metrics
                    .store_failures_total
                    .with_label_values(&[operation])
                    .inc();
                let reason = err.to_string();
                self.error.store(Some(Arc::new(format!(
                    "Failed to {} pickup request: {reason}",
                    operation.replace('_', " ")
                ))));
                Durability::Unpersisted { reason }
            }
        }
    }

    fn refuse(&self, err: &LedgerError) {
        warn!(reason = err.reason(), error = %err, "pickup operation refused");
        self.metrics
            .pickup_rejections_total
            .with_label_values(&[err.reason()])
            .inc();
    }
}

fn required(value: String, field: &'static str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn ensure_transition(request: &PickupRequest, to: PickupStatus) -> Result<(), LedgerError> {
    if request.status.successor() == Some(to) {
        Ok(())
    } else {
        Err(LedgerError::InvalidTransition {
            id: request.id.clone(),
            from: request.status,
            to,
        })
    }
}

/// Creation time in epoch milliseconds, bumped past the largest numeric id
/// when two requests land in the same millisecond.
fn next_request_id(existing: &[PickupRequest], now_millis: i64) -> String {
    let candidate = now_millis.to_string();
    if existing.iter().all(|request| request.id != candidate) {
        return candidate;
    }

    let highest = existing
        .iter()
        .filter_map(|request| request.id.parse::<i64>().ok())
        .max()
        .unwrap_or(now_millis);
    (highest.max(now_millis) + 1).to_string()
}
