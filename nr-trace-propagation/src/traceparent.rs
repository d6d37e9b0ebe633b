// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

pub const TRACEPARENT_KEY: &str = "traceparent";

const TRACEPARENT_VERSION: &str = "00";
// "00-{32 hex}-{16 hex}-{2 hex}"
const TRACEPARENT_MIN_LENGTH: usize = 55;
const TRACE_ID_MAX_LENGTH: usize = 32;
const SAMPLED_FLAG: u8 = 0x1;

lazy_static! {
    static ref TRACEPARENT_REGEX: Regex =
        Regex::new(r"^([a-f0-9]{2})-([a-f0-9]{32})-([a-f0-9]{16})-([a-f0-9]{2})(-.*)?$")
            .expect("failed creating regex");
    pub static ref INVALID_SEGMENT_REGEX: Regex =
        Regex::new(r"^0+$").expect("failed creating regex");
}

/// A parsed W3C `traceparent` header. Constructed only by [`W3CTraceparent::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct W3CTraceparent {
    version: u8,
    trace_id: String,
    parent_id: String,
    trace_flags: u8,
}

impl W3CTraceparent {
    /// Parses a `traceparent` header value.
    ///
    /// Only version `00` is fully understood; it must carry exactly 4
    /// dash-separated fields. Higher versions are tolerated with extra
    /// trailing fields, never with fewer. `ff` is reserved invalid.
    pub fn parse(header: &str) -> Result<W3CTraceparent, Error> {
        let header = header.trim();

        if header.is_empty() {
            return Err(Error::extract("traceparent header is empty", TRACEPARENT_KEY));
        }

        if header.len() < TRACEPARENT_MIN_LENGTH {
            return Err(Error::extract(
                "traceparent is shorter than the minimum valid length",
                TRACEPARENT_KEY,
            ));
        }

        let captures = TRACEPARENT_REGEX
            .captures(header)
            .ok_or_else(|| Error::extract("invalid traceparent", TRACEPARENT_KEY))?;

        let version_field = &captures[1];
        let trace_id = &captures[2];
        let parent_id = &captures[3];
        let flags = &captures[4];
        let tail = captures.get(5).map_or("", |m| m.as_str());

        let version = parse_version(version_field, tail)?;

        if INVALID_SEGMENT_REGEX.is_match(trace_id) {
            return Err(Error::extract(
                "`0` value for trace_id is invalid",
                TRACEPARENT_KEY,
            ));
        }

        if INVALID_SEGMENT_REGEX.is_match(parent_id) {
            return Err(Error::extract(
                "`0` value for parent_id is invalid",
                TRACEPARENT_KEY,
            ));
        }

        let trace_flags = u8::from_str_radix(flags, 16)
            .map_err(|_| Error::extract("Failed to decode trace_flags", TRACEPARENT_KEY))?;

        Ok(W3CTraceparent {
            version,
            trace_id: trace_id.to_string(),
            parent_id: parent_id.to_string(),
            trace_flags,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn trace_flags(&self) -> u8 {
        self.trace_flags
    }

    /// Bit 0 of the decoded flags byte.
    pub fn sampled(&self) -> bool {
        self.trace_flags & SAMPLED_FLAG == SAMPLED_FLAG
    }

    pub fn to_header_value(&self) -> String {
        format!(
            "{:02x}-{}-{}-{:02x}",
            self.version, self.trace_id, self.parent_id, self.trace_flags
        )
    }
}

fn parse_version(version: &str, tail: &str) -> Result<u8, Error> {
    if version == "ff" {
        return Err(Error::extract(
            "`ff` is an invalid traceparent version",
            TRACEPARENT_KEY,
        ));
    }

    let parsed = u8::from_str_radix(version, 16)
        .map_err(|_| Error::extract("Failed to decode version", TRACEPARENT_KEY))?;

    if parsed == 0 && !tail.is_empty() {
        return Err(Error::extract(
            "Traceparent with version `00` should contain only 4 values delimited by `-`",
            TRACEPARENT_KEY,
        ));
    }

    Ok(parsed)
}

/// Renders an outbound version-00 header for the given identity.
pub fn build_traceparent(trace_id: &str, parent_id: &str, sampled: bool) -> String {
    let trace_id = format_trace_id(trace_id);
    let flags = if sampled { "01" } else { "00" };
    format!("{TRACEPARENT_VERSION}-{trace_id}-{parent_id}-{flags}")
}

/// Lowercases a trace id and left-pads it with `0` to 32 characters.
pub fn format_trace_id(trace_id: &str) -> String {
    let trace_id = trace_id.to_lowercase();
    if trace_id.len() >= TRACE_ID_MAX_LENGTH {
        trace_id
    } else {
        format!("{trace_id:0>width$}", width = TRACE_ID_MAX_LENGTH)
    }
}
