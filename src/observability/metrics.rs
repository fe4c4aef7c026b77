use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::models::pickup::{PickupRequest, PickupStatus};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub pickup_transitions_total: IntCounterVec,
    pub pickup_rejections_total: IntCounterVec,
    pub store_failures_total: IntCounterVec,
    pub login_attempts_total: IntCounterVec,
    pub pickups_by_status: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let pickup_transitions_total = IntCounterVec::new(
            Opts::new(
                "pickup_transitions_total",
                "Pickup requests entering each status",
            ),
            &["status"],
        )
        .expect("valid pickup_transitions_total metric");

        let pickup_rejections_total = IntCounterVec::new(
            Opts::new(
                "pickup_rejections_total",
                "Ledger operations refused by reason",
            ),
            &["reason"],
        )
        .expect("valid pickup_rejections_total metric");

        let store_failures_total = IntCounterVec::new(
            Opts::new("store_failures_total", "Failed store reads and writes"),
            &["operation"],
        )
        .expect("valid store_failures_total metric");

        let login_attempts_total = IntCounterVec::new(
            Opts::new("login_attempts_total", "Login attempts by outcome"),
            &["outcome"],
        )
        .expect("valid login_attempts_total metric");

        let pickups_by_status = IntGaugeVec::new(
            Opts::new("pickups_by_status", "Pickup requests currently in each status"),
            &["status"],
        )
        .expect("valid pickups_by_status metric");

        registry
            .register(Box::new(pickup_transitions_total.clone()))
            .expect("register pickup_transitions_total");
        registry
            .register(Box::new(pickup_rejections_total.clone()))
            .expect("register pickup_rejections_total");
        registry
            .register(Box::new(store_failures_total.clone()))
            .expect("register store_failures_total");
        registry
            .register(Box::new(login_attempts_total.clone()))
            .expect("register login_attempts_total");
        registry
            .register(Box::new(pickups_by_status.clone()))
            .expect("register pickups_by_status");

        Self {
            registry,
            pickup_transitions_total,
            pickup_rejections_total,
            store_failures_total,
            login_attempts_total,
            pickups_by_status,
        }
    }

    pub fn observe_ledger(&self, requests: &[PickupRequest]) {
        for status in PickupStatus::ALL {
            let count = requests.iter().filter(|r| r.status == status).count();
            self.pickups_by_status
                .with_label_values(&[status.as_str()])
                .set(count as i64);
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
