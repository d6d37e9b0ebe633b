// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Supportability reporting boundary.
//!
//! The propagation core emits one event per distinct [`IngestErrorType`]
//! plus accept/create success counters; the hosting agent decides where
//! they go (metrics pipeline, logs, nowhere).

use crate::distributed_tracing::IngestErrorType;

pub trait HealthReporter: Send + Sync {
    /// One event per distinct ingest error encountered on an accept call.
    fn report_ingest_error(&self, error: IngestErrorType);

    /// A legacy "newrelic" payload was accepted from an inbound request.
    fn report_accept_payload_success(&self);

    /// A W3C trace context was accepted from an inbound request.
    fn report_trace_context_accept_success(&self);

    /// A legacy "newrelic" payload was created for an outbound request.
    fn report_create_payload_success(&self);

    /// W3C trace context headers were created for an outbound request.
    fn report_trace_context_create_success(&self);
}

/// Reporter for hosts that do not collect supportability metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHealthReporter;

impl HealthReporter for NoopHealthReporter {
    fn report_ingest_error(&self, _error: IngestErrorType) {}

    fn report_accept_payload_success(&self) {}

    fn report_trace_context_accept_success(&self) {}

    fn report_create_payload_success(&self) {}

    fn report_trace_context_create_success(&self) {}
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_reporter {
    //! In-memory reporter for asserting on supportability events in tests.

    use std::sync::Mutex;

    use super::HealthReporter;
    use crate::distributed_tracing::IngestErrorType;

    #[derive(Debug, Default)]
    pub struct RecordingHealthReporter {
        pub ingest_errors: Mutex<Vec<IngestErrorType>>,
        pub accept_payload_successes: Mutex<usize>,
        pub trace_context_accept_successes: Mutex<usize>,
        pub create_payload_successes: Mutex<usize>,
        pub trace_context_create_successes: Mutex<usize>,
    }

    impl RecordingHealthReporter {
        pub fn ingest_errors(&self) -> Vec<IngestErrorType> {
            self.ingest_errors.lock().unwrap().clone()
        }

        pub fn trace_context_accept_successes(&self) -> usize {
            *self.trace_context_accept_successes.lock().unwrap()
        }

        pub fn accept_payload_successes(&self) -> usize {
            *self.accept_payload_successes.lock().unwrap()
        }

        pub fn trace_context_create_successes(&self) -> usize {
            *self.trace_context_create_successes.lock().unwrap()
        }

        pub fn create_payload_successes(&self) -> usize {
            *self.create_payload_successes.lock().unwrap()
        }
    }

    impl HealthReporter for RecordingHealthReporter {
        fn report_ingest_error(&self, error: IngestErrorType) {
            self.ingest_errors.lock().unwrap().push(error);
        }

        fn report_accept_payload_success(&self) {
            *self.accept_payload_successes.lock().unwrap() += 1;
        }

        fn report_trace_context_accept_success(&self) {
            *self.trace_context_accept_successes.lock().unwrap() += 1;
        }

        fn report_create_payload_success(&self) {
            *self.create_payload_successes.lock().unwrap() += 1;
        }

        fn report_trace_context_create_success(&self) {
            *self.trace_context_create_successes.lock().unwrap() += 1;
        }
    }
}
