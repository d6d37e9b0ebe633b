// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The distributed-tracing facade used by the rest of the agent.
//!
//! Accepts inbound headers into a [`TracingState`] and renders outbound
//! headers for a unit of work. No fault here ever escapes to the monitored
//! application: collaborator panics are caught, logged, and reported.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use nr_trace::{
    distributed_tracing::{IngestErrorType, TransportType},
    health::HealthReporter,
    nr_debug, nr_error, Config,
};
use nr_trace_sampling::{AdaptiveSampler, SamplingCell};

use crate::{
    carrier::{Extractor, Injector},
    newrelic::{DistributedTracePayload, NEWRELIC_KEY},
    traceparent::{build_traceparent, TRACEPARENT_KEY},
    tracestate::{build_nr_entry, TRACESTATE_KEY},
    tracing_state::TracingState,
};

const DISTRIBUTED_TRACE_TYPE_DEFAULT: &str = "App";

/// The unit-of-work collaborator: identity of the current transaction plus
/// its set-once sampled/priority cell.
pub trait TransactionContext {
    fn trace_id(&self) -> &str;

    /// The transaction guid, used as the outbound transaction id.
    fn guid(&self) -> &str;

    /// Span id of the currently executing segment, if spans are being
    /// collected.
    fn current_span_id(&self) -> Option<String>;

    fn sampling(&self) -> &SamplingCell;

    /// The inbound tracing state, when this transaction was started by a
    /// traced caller. Supplies the vendor passthrough list.
    fn tracing_state(&self) -> Option<&TracingState>;
}

pub struct DistributedTracePropagator {
    config: Arc<Config>,
    health: Arc<dyn HealthReporter>,
    sampler: Arc<AdaptiveSampler>,
}

impl DistributedTracePropagator {
    pub fn new(
        config: Arc<Config>,
        health: Arc<dyn HealthReporter>,
        sampler: Arc<AdaptiveSampler>,
    ) -> Self {
        DistributedTracePropagator {
            config,
            health,
            sampler,
        }
    }

    /// Resolves the inbound trace headers of one unit of work, reporting
    /// supportability counters along the way. Never panics outward; an
    /// unexpected fault yields `None`.
    pub fn accept_distributed_trace_headers(
        &self,
        carrier: &dyn Extractor,
        transport_type: TransportType,
        transaction_start_time: SystemTime,
    ) -> Option<TracingState> {
        if !self.config.distributed_tracing_enabled() {
            nr_debug!("Distributed tracing is disabled, ignoring inbound trace headers.");
            return None;
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            TracingState::accept_distributed_trace_headers(
                &self.config,
                carrier,
                transport_type,
                transaction_start_time,
            )
        }));

        match result {
            Ok(tracing_state) => {
                for error in tracing_state.ingest_errors() {
                    self.health.report_ingest_error(*error);
                }

                if self.config.payload_success_metrics_enabled() {
                    if tracing_state.newrelic_payload_was_accepted() {
                        self.health.report_accept_payload_success();
                    }
                    if tracing_state.trace_context_was_accepted() {
                        self.health.report_trace_context_accept_success();
                    }
                }

                Some(tracing_state)
            }
            Err(_) => {
                nr_error!("accept_distributed_trace_headers() failed");
                self.health
                    .report_ingest_error(IngestErrorType::TraceContextAcceptException);
                None
            }
        }
    }

    /// Renders outbound trace headers for a unit of work.
    ///
    /// The sampling decision is obtained exactly once per unit of work and
    /// is stable from then on. A failure in one header format never
    /// prevents the other from being attempted.
    pub fn insert_distributed_trace_headers(
        &self,
        transaction: &dyn TransactionContext,
        carrier: &mut dyn Injector,
    ) {
        if !self.config.distributed_tracing_enabled() {
            nr_debug!("Distributed tracing is disabled, not inserting trace headers.");
            return;
        }

        let timestamp = now_unix_millis();
        let sampled = transaction.sampling().ensure_sampled(&self.sampler);
        let priority = transaction.sampling().priority();

        let span_id = if self.config.span_events_enabled() {
            transaction
                .current_span_id()
                .unwrap_or_else(generate_span_id)
        } else {
            generate_span_id()
        };

        if !self.config.exclude_newrelic_header() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.insert_newrelic_header(transaction, carrier, &span_id, sampled, priority, timestamp)
            }));

            if result.is_err() {
                nr_error!("insert_distributed_trace_headers() failed to set the newrelic header");
            }
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.insert_trace_context_headers(
                transaction,
                carrier,
                &span_id,
                sampled,
                priority,
                timestamp,
            )
        }));

        match result {
            Ok(true) => {
                if self.config.payload_success_metrics_enabled() {
                    self.health.report_trace_context_create_success();
                }
            }
            Ok(false) => {}
            Err(_) => {
                nr_error!("insert_distributed_trace_headers() failed to set trace context headers");
                self.health
                    .report_ingest_error(IngestErrorType::TraceContextCreateException);
            }
        }
    }

    fn insert_newrelic_header(
        &self,
        transaction: &dyn TransactionContext,
        carrier: &mut dyn Injector,
        span_id: &str,
        sampled: bool,
        priority: f32,
        timestamp: i64,
    ) {
        let guid = self
            .config
            .span_events_enabled()
            .then(|| span_id.to_string());
        let transaction_id = self
            .config
            .transaction_events_enabled()
            .then(|| transaction.guid().to_string());

        let Some(payload) = DistributedTracePayload::try_build_outgoing_payload(
            DISTRIBUTED_TRACE_TYPE_DEFAULT,
            self.config.account_id(),
            self.config.primary_application_id(),
            guid,
            transaction.trace_id(),
            self.config.trusted_account_key(),
            Some(priority),
            Some(sampled),
            timestamp,
            transaction_id,
        ) else {
            return;
        };

        match payload.serialize_and_encode() {
            Ok(encoded) => {
                carrier.set(NEWRELIC_KEY, encoded);
                if self.config.payload_success_metrics_enabled() {
                    self.health.report_create_payload_success();
                }
            }
            Err(e) => {
                nr_error!("Failed to encode distributed trace payload for outbound request: {e}");
            }
        }
    }

    /// Returns true when both W3C headers were written.
    fn insert_trace_context_headers(
        &self,
        transaction: &dyn TransactionContext,
        carrier: &mut dyn Injector,
        span_id: &str,
        sampled: bool,
        priority: f32,
        timestamp: i64,
    ) -> bool {
        let tracestate = self.build_tracestate(transaction, span_id, sampled, priority, timestamp);
        if tracestate.is_empty() {
            nr_debug!("Could not build a tracestate entry, skipping trace context headers.");
            return false;
        }

        let traceparent = build_traceparent(transaction.trace_id(), span_id, sampled);

        carrier.set(TRACEPARENT_KEY, traceparent);
        carrier.set(TRACESTATE_KEY, tracestate);
        true
    }

    fn build_tracestate(
        &self,
        transaction: &dyn TransactionContext,
        span_id: &str,
        sampled: bool,
        priority: f32,
        timestamp: i64,
    ) -> String {
        let trusted_account_key = self.config.trusted_account_key();
        let account_id = self.config.account_id();
        let app_id = self.config.primary_application_id();

        if trusted_account_key.is_empty() || account_id.is_empty() || app_id.is_empty() {
            return String::new();
        }

        let span_field = if self.config.span_events_enabled() {
            span_id
        } else {
            ""
        };
        let transaction_field = if self.config.transaction_events_enabled() {
            transaction.guid()
        } else {
            ""
        };

        let nr_entry = build_nr_entry(
            trusted_account_key,
            account_id,
            app_id,
            span_field,
            transaction_field,
            sampled,
            priority,
            timestamp,
        );

        let vendor_entries = transaction
            .tracing_state()
            .map(TracingState::vendor_state_entries)
            .unwrap_or_default();

        if vendor_entries.is_empty() {
            nr_entry
        } else {
            format!("{nr_entry},{}", vendor_entries.join(","))
        }
    }
}

fn now_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_millis() as i64)
        .unwrap_or(0)
}

/// A fresh 16-hex-char span id for transactions with no current span.
fn generate_span_id() -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: u64 = rng.gen();
        // an all-zero parent id is invalid on the wire
        if id != 0 {
            return format!("{id:016x}");
        }
    }
}
