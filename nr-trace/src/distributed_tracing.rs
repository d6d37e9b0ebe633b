// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared distributed-tracing vocabulary used by the propagation and
//! sampling crates.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Classification of everything that can go wrong while ingesting inbound
/// trace headers. Errors are accumulated on the resolved tracing state and
/// reported once each through the health reporter, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestErrorType {
    /// Legacy payload carried an unsupported major version
    Version,
    /// Legacy header was present but empty
    NullPayload,
    /// Legacy payload could not be decoded or deserialized
    ParseException,
    /// Unexpected fault while handling the legacy payload
    OtherException,
    /// Legacy payload carried neither a guid nor a transaction id
    NotTraceable,
    /// Legacy payload trust key did not match the configured trusted key
    NotTrusted,
    TraceParentParseException,
    TraceStateParseException,
    TraceStateInvalidNrEntry,
    TraceStateNoNrEntry,
    TraceContextAcceptException,
    TraceContextCreateException,
    None,
}

impl fmt::Display for IngestErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestErrorType::Version => "Version",
            IngestErrorType::NullPayload => "NullPayload",
            IngestErrorType::ParseException => "ParseException",
            IngestErrorType::OtherException => "OtherException",
            IngestErrorType::NotTraceable => "NotTraceable",
            IngestErrorType::NotTrusted => "NotTrusted",
            IngestErrorType::TraceParentParseException => "TraceParentParseException",
            IngestErrorType::TraceStateParseException => "TraceStateParseException",
            IngestErrorType::TraceStateInvalidNrEntry => "TraceStateInvalidNrEntry",
            IngestErrorType::TraceStateNoNrEntry => "TraceStateNoNrEntry",
            IngestErrorType::TraceContextAcceptException => "TraceContextAcceptException",
            IngestErrorType::TraceContextCreateException => "TraceContextCreateException",
            IngestErrorType::None => "None",
        };

        write!(f, "{name}")
    }
}

/// Transport the inbound request arrived over, as declared by the
/// instrumentation that captured the headers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportType {
    #[default]
    Unknown,
    Http,
    Https,
    Kafka,
    Jms,
    IronMq,
    Amqp,
    Queue,
    Other,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = match self {
            TransportType::Unknown => "Unknown",
            TransportType::Http => "HTTP",
            TransportType::Https => "HTTPS",
            TransportType::Kafka => "Kafka",
            TransportType::Jms => "JMS",
            TransportType::IronMq => "IronMQ",
            TransportType::Amqp => "AMQP",
            TransportType::Queue => "Queue",
            TransportType::Other => "Other",
        };

        write!(f, "{transport}")
    }
}

/// Kind of caller that produced the inbound trace data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DistributedTracingParentType {
    #[default]
    Unknown = -1,
    App = 0,
    Browser = 1,
    Mobile = 2,
}

impl DistributedTracingParentType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(DistributedTracingParentType::App),
            1 => Some(DistributedTracingParentType::Browser),
            2 => Some(DistributedTracingParentType::Mobile),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for DistributedTracingParentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent_type = match self {
            DistributedTracingParentType::Unknown => "Unknown",
            DistributedTracingParentType::App => "App",
            DistributedTracingParentType::Browser => "Browser",
            DistributedTracingParentType::Mobile => "Mobile",
        };

        write!(f, "{parent_type}")
    }
}

impl FromStr for DistributedTracingParentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "App" => Ok(DistributedTracingParentType::App),
            "Browser" => Ok(DistributedTracingParentType::Browser),
            "Mobile" => Ok(DistributedTracingParentType::Mobile),
            _ => Err(()),
        }
    }
}

/// How an inbound sampled flag from a remote parent is honored.
///
/// `AlwaysOn` guarantees retention (priority forced to 2.0), `AlwaysOff`
/// guarantees the work is not recorded (priority forced to 0.0), `Default`
/// keeps whatever the caller sent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RemoteParentSampledBehavior {
    #[default]
    Default,
    AlwaysOn,
    AlwaysOff,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported remote parent sampled behavior: {0}")]
pub struct InvalidRemoteParentSampledBehavior(pub String);

impl FromStr for RemoteParentSampledBehavior {
    type Err = InvalidRemoteParentSampledBehavior;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("default") {
            Ok(RemoteParentSampledBehavior::Default)
        } else if s.eq_ignore_ascii_case("alwayson") || s.eq_ignore_ascii_case("always_on") {
            Ok(RemoteParentSampledBehavior::AlwaysOn)
        } else if s.eq_ignore_ascii_case("alwaysoff") || s.eq_ignore_ascii_case("always_off") {
            Ok(RemoteParentSampledBehavior::AlwaysOff)
        } else {
            Err(InvalidRemoteParentSampledBehavior(s.to_string()))
        }
    }
}
