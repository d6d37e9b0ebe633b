// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Inbound trace-context resolution.
//!
//! One accept call walks `traceparent` → `tracestate` → legacy "newrelic"
//! header under a strict precedence rule: a present `traceparent` claims the
//! request for W3C trace context whether or not it parses, and the legacy
//! header is then never consulted. Every error along the way is accumulated
//! rather than aborting the resolution.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nr_trace::{
    distributed_tracing::{
        DistributedTracingParentType, IngestErrorType, RemoteParentSampledBehavior, TransportType,
    },
    nr_debug, Config,
};

use crate::{
    carrier::{get_single_value_from_extractor, Extractor},
    newrelic::{
        DistributedTracePayload, PayloadError, NEWRELIC_KEY, NEWRELIC_KEY_ALL_UPPER,
        NEWRELIC_KEY_TITLE_CASE,
    },
    traceparent::{W3CTraceparent, TRACEPARENT_KEY},
    tracestate::{W3CTracestate, TRACESTATE_KEY},
};

// priorities forced by the configured remote-parent behaviors
const ALWAYS_ON_PRIORITY: f32 = 2.0;
const ALWAYS_OFF_PRIORITY: f32 = 0.0;

/// The read-only result of accepting inbound trace headers for one unit of
/// work. Constructed once per accept call, never mutated afterwards.
#[derive(Debug, Default)]
pub struct TracingState {
    parent_type: DistributedTracingParentType,
    account_id: Option<String>,
    app_id: Option<String>,
    guid: Option<String>,
    parent_id: Option<String>,
    trace_id: Option<String>,
    transaction_id: Option<String>,
    sampled: Option<bool>,
    priority: Option<f32>,
    timestamp: Option<i64>,
    transport_type: TransportType,
    transport_duration: Duration,
    newrelic_payload_was_accepted: bool,
    trace_context_was_accepted: bool,
    vendor_state_entries: Vec<String>,
    ingest_errors: Vec<IngestErrorType>,
}

impl TracingState {
    pub fn parent_type(&self) -> DistributedTracingParentType {
        self.parent_type
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Span id of the upstream caller.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Parent id carried by a W3C `traceparent`.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn sampled(&self) -> Option<bool> {
        self.sampled
    }

    pub fn priority(&self) -> Option<f32> {
        self.priority
    }

    /// Remote send timestamp, unix millis.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    pub fn transport_duration(&self) -> Duration {
        self.transport_duration
    }

    pub fn newrelic_payload_was_accepted(&self) -> bool {
        self.newrelic_payload_was_accepted
    }

    pub fn trace_context_was_accepted(&self) -> bool {
        self.trace_context_was_accepted
    }

    /// Gates downstream attribute generation: a traceparent was present, or
    /// a legacy payload was accepted, independent of validity.
    pub fn has_data_for_attributes(&self) -> bool {
        self.trace_context_was_accepted || self.newrelic_payload_was_accepted
    }

    pub fn vendor_state_entries(&self) -> &[String] {
        &self.vendor_state_entries
    }

    pub fn ingest_errors(&self) -> &[IngestErrorType] {
        &self.ingest_errors
    }

    /// Resolves the inbound headers of one unit of work.
    pub fn accept_distributed_trace_headers(
        config: &Config,
        carrier: &dyn Extractor,
        transport_type: TransportType,
        transaction_start_time: SystemTime,
    ) -> TracingState {
        let mut state = TracingState {
            transport_type,
            ..TracingState::default()
        };

        // more than one traceparent value makes the header unusable, which
        // counts as absent rather than invalid
        let traceparent_value =
            get_single_value_from_extractor(carrier, TRACEPARENT_KEY).unwrap_or(None);

        match traceparent_value {
            Some(value) => {
                state.accept_trace_context(config, carrier, value, transaction_start_time);
            }
            None => {
                state.accept_newrelic_payload(config, carrier, transaction_start_time);
            }
        }

        state
    }

    fn accept_trace_context(
        &mut self,
        config: &Config,
        carrier: &dyn Extractor,
        traceparent_value: &str,
        transaction_start_time: SystemTime,
    ) {
        let traceparent = match W3CTraceparent::parse(traceparent_value) {
            Ok(traceparent) => traceparent,
            Err(e) => {
                nr_debug!("{e}");
                self.ingest_errors
                    .push(IngestErrorType::TraceParentParseException);
                return;
            }
        };

        self.trace_context_was_accepted = true;
        self.trace_id = Some(traceparent.trace_id().to_string());
        self.parent_id = Some(traceparent.parent_id().to_string());

        let tracestate_values = carrier.get_all(TRACESTATE_KEY).unwrap_or_default();
        let tracestate =
            W3CTracestate::from_headers(&tracestate_values, config.trusted_account_key());

        if tracestate.error() != IngestErrorType::None {
            self.ingest_errors.push(tracestate.error());
        }

        self.vendor_state_entries = tracestate.vendor_state_entries().to_vec();

        if let Some(fields) = tracestate.fields() {
            self.parent_type = fields.parent_type;
            self.account_id = Some(fields.account_id.clone());
            self.app_id = Some(fields.app_id.clone());
            self.guid = fields.span_id.clone();
            self.transaction_id = fields.transaction_id.clone();
            self.timestamp = Some(fields.timestamp);
            self.transport_duration =
                transport_duration(fields.timestamp, transaction_start_time);

            match fields.sampled {
                Some(inbound_sampled) => {
                    let behavior = if inbound_sampled {
                        config.remote_parent_sampled()
                    } else {
                        config.remote_parent_not_sampled()
                    };
                    self.apply_remote_parent_behavior(behavior, inbound_sampled, fields.priority);
                }
                None => self.priority = fields.priority,
            }
        }
    }

    fn apply_remote_parent_behavior(
        &mut self,
        behavior: RemoteParentSampledBehavior,
        inbound_sampled: bool,
        inbound_priority: Option<f32>,
    ) {
        match behavior {
            RemoteParentSampledBehavior::Default => {
                self.sampled = Some(inbound_sampled);
                self.priority = inbound_priority;
            }
            RemoteParentSampledBehavior::AlwaysOn => {
                self.sampled = Some(true);
                self.priority = Some(ALWAYS_ON_PRIORITY);
            }
            RemoteParentSampledBehavior::AlwaysOff => {
                self.sampled = Some(false);
                self.priority = Some(ALWAYS_OFF_PRIORITY);
            }
        }
    }

    fn accept_newrelic_payload(
        &mut self,
        config: &Config,
        carrier: &dyn Extractor,
        transaction_start_time: SystemTime,
    ) {
        // the header key is case insensitive on the wire, three casings
        // cover every producing agent
        let mut header_value = None;
        for key in [NEWRELIC_KEY, NEWRELIC_KEY_ALL_UPPER, NEWRELIC_KEY_TITLE_CASE] {
            if let Some(value) = carrier.get(key) {
                header_value = Some(value);
                break;
            }
        }

        let Some(header_value) = header_value else {
            // no legacy header either, the unit of work is simply untraced
            return;
        };

        let payload = match DistributedTracePayload::try_decode_and_deserialize(header_value) {
            Ok(payload) => payload,
            Err(e) => {
                nr_debug!("{e}");
                self.ingest_errors.push(match e {
                    PayloadError::NullPayload => IngestErrorType::NullPayload,
                    PayloadError::ParseException(_) => IngestErrorType::ParseException,
                    PayloadError::UnsupportedVersion(_) => IngestErrorType::Version,
                });
                return;
            }
        };

        if payload.data.guid.is_none() && payload.data.transaction_id.is_none() {
            nr_debug!(
                "Incoming guid and transactionId were both absent, which is invalid for a distributed trace payload."
            );
            self.ingest_errors.push(IngestErrorType::NotTraceable);
            return;
        }

        let incoming_trust_key = payload
            .data
            .trust_key
            .as_deref()
            .or(payload.data.account_id.as_deref());
        if incoming_trust_key != Some(config.trusted_account_key()) {
            nr_debug!("Incoming trustKey or accountId not trusted, distributed trace payload will be ignored.");
            self.ingest_errors.push(IngestErrorType::NotTrusted);
            return;
        }

        self.newrelic_payload_was_accepted = true;
        self.parent_type = payload
            .data
            .payload_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();
        self.account_id = payload.data.account_id;
        self.app_id = payload.data.app_id;
        self.guid = payload.data.guid;
        self.trace_id = payload.data.trace_id;
        self.transaction_id = payload.data.transaction_id;
        self.sampled = payload.data.sampled;
        self.priority = payload.data.priority;
        self.timestamp = Some(payload.data.timestamp);
        self.transport_duration =
            transport_duration(payload.data.timestamp, transaction_start_time);
    }
}

/// Elapsed wire time, clamped to zero when the remote clock runs ahead of
/// the local one.
fn transport_duration(remote_timestamp_millis: i64, local_start: SystemTime) -> Duration {
    let local_start_millis = local_start
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_millis() as i64)
        .unwrap_or(0);

    let elapsed = (local_start_millis - remote_timestamp_millis).max(0);
    Duration::from_millis(elapsed as u64)
}
