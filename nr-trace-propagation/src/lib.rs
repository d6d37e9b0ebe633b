// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Distributed-trace header propagation.
//!
//! Parses inbound trace identity from either the W3C trace context pair
//! (`traceparent`/`tracestate`) or the legacy base64-JSON "newrelic" header,
//! and renders outbound headers carrying the sampling decision downstream.

pub mod carrier;
pub mod error;
pub mod handler;
pub mod newrelic;
pub mod traceparent;
pub mod tracestate;
pub mod tracing_state;

pub use carrier::{Extractor, Injector};
pub use handler::{DistributedTracePropagator, TransactionContext};
pub use newrelic::DistributedTracePayload;
pub use traceparent::W3CTraceparent;
pub use tracestate::W3CTracestate;
pub use tracing_state::TracingState;
