// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Codec for the proprietary base64-JSON "newrelic" header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nr_trace::nr_debug;

pub const NEWRELIC_KEY: &str = "newrelic";
pub const NEWRELIC_KEY_ALL_UPPER: &str = "NEWRELIC";
pub const NEWRELIC_KEY_TITLE_CASE: &str = "Newrelic";

const SUPPORTED_MAJOR_VERSION: u32 = 0;
const PAYLOAD_VERSION: [u32; 2] = [0, 1];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is null or empty")]
    NullPayload,
    #[error("failed to decode or deserialize payload: {0}")]
    ParseException(&'static str),
    #[error("unsupported payload major version {0}")]
    UnsupportedVersion(u32),
}

/// The legacy distributed-trace payload.
///
/// Outbound payloads come from [`DistributedTracePayload::try_build_outgoing_payload`],
/// which enforces the required-identity invariants. Inbound payloads come
/// from deserialization and tolerate partial data; trust and traceability
/// are validated by the resolver, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedTracePayload {
    /// `[major, minor]`
    #[serde(rename = "v")]
    pub version: [u32; 2],
    #[serde(rename = "d")]
    pub data: DistributedTracePayloadData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributedTracePayloadData {
    #[serde(rename = "ty", default, skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
    #[serde(rename = "ac", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "ap", default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(rename = "tr", default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(rename = "tk", default, skip_serializing_if = "Option::is_none")]
    pub trust_key: Option<String>,
    #[serde(rename = "pr", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
    #[serde(rename = "sa", default, skip_serializing_if = "Option::is_none")]
    pub sampled: Option<bool>,
    #[serde(rename = "ti", default)]
    pub timestamp: i64,
    #[serde(rename = "tx", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl DistributedTracePayload {
    /// Builds an outbound payload, refusing when the carried identity is
    /// insufficient for a traceable payload: account and application ids
    /// are required, so are the type and trace id, and at least one of
    /// guid/transaction id must be present.
    #[allow(clippy::too_many_arguments)]
    pub fn try_build_outgoing_payload(
        payload_type: &str,
        account_id: &str,
        app_id: &str,
        guid: Option<String>,
        trace_id: &str,
        trust_key: &str,
        priority: Option<f32>,
        sampled: Option<bool>,
        timestamp_millis: i64,
        transaction_id: Option<String>,
    ) -> Option<DistributedTracePayload> {
        if account_id.is_empty() || app_id.is_empty() {
            nr_debug!(
                "Did not generate payload because AccountId or PrimaryApplicationId were not populated. This is normal for requests occurring before round trip configuration."
            );
            return None;
        }

        if payload_type.is_empty() || trace_id.is_empty() {
            nr_debug!("Did not generate payload because Type or TraceId were not populated.");
            return None;
        }

        if guid.is_none() && transaction_id.is_none() {
            nr_debug!(
                "Did not generate payload because neither guid nor transactionId were populated, preventing a traceable payload."
            );
            return None;
        }

        // self-trust is implicit, the key is omitted when it matches
        let trust_key = if trust_key == account_id || trust_key.is_empty() {
            None
        } else {
            Some(trust_key.to_string())
        };

        Some(DistributedTracePayload {
            version: PAYLOAD_VERSION,
            data: DistributedTracePayloadData {
                payload_type: Some(payload_type.to_string()),
                account_id: Some(account_id.to_string()),
                app_id: Some(app_id.to_string()),
                guid,
                trace_id: Some(trace_id.to_string()),
                trust_key,
                priority,
                sampled,
                timestamp: timestamp_millis,
                transaction_id,
            },
        })
    }

    /// Serializes the payload and wraps it in the base64 envelope used on
    /// the wire.
    pub fn serialize_and_encode(&self) -> Result<String, PayloadError> {
        let json = serde_json::to_string(self)
            .map_err(|_| PayloadError::ParseException("failed to serialize payload"))?;
        Ok(STANDARD.encode(json))
    }

    /// Decodes an inbound header value.
    ///
    /// The base64 envelope is optional; a value already starting with `{`
    /// or `[` is deserialized directly.
    pub fn try_decode_and_deserialize(
        serialized: &str,
    ) -> Result<DistributedTracePayload, PayloadError> {
        let trimmed = serialized.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::NullPayload);
        }

        let json = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            trimmed.to_string()
        } else {
            let decoded = STANDARD
                .decode(trimmed)
                .map_err(|_| PayloadError::ParseException("invalid base64 envelope"))?;
            String::from_utf8(decoded)
                .map_err(|_| PayloadError::ParseException("payload is not valid utf-8"))?
        };

        let payload: DistributedTracePayload = serde_json::from_str(&json)
            .map_err(|_| PayloadError::ParseException("invalid payload json"))?;

        if payload.version[0] > SUPPORTED_MAJOR_VERSION {
            return Err(PayloadError::UnsupportedVersion(payload.version[0]));
        }

        if payload.data.timestamp == 0 {
            return Err(PayloadError::ParseException("missing or invalid timestamp"));
        }

        Ok(payload)
    }
}
