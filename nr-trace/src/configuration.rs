// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{fmt::Display, str::FromStr};

use crate::{
    distributed_tracing::RemoteParentSampledBehavior,
    log::{set_max_level, LevelFilter},
    nr_warn,
};

pub const AGENT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone)]
#[non_exhaustive]
/// Configuration for the distributed-tracing core
///
/// This represents the finalized configuration. Values come from
/// `NEW_RELIC_*` environment variables and can be overridden in code
/// through the builder.
///
/// # Usage
/// ```
/// use nr_trace::Config;
///
/// // This pulls configuration from the environment
/// let mut builder = Config::builder();
///
/// // Manual overrides
/// builder
///     .set_trusted_account_key("33".to_string())
///     .set_account_id("55".to_string());
///
/// // Finalize the configuration
/// let config = builder.build();
/// ```
pub struct Config {
    // # Identity
    /// The tenant whose inbound trace data this agent trusts
    trusted_account_key: String,
    account_id: String,
    primary_application_id: String,

    // # Distributed tracing
    /// Disables header acceptance and creation entirely if false
    distributed_tracing_enabled: bool,
    span_events_enabled: bool,
    transaction_events_enabled: bool,
    /// Suppresses the legacy "newrelic" header on outbound requests
    exclude_newrelic_header: bool,
    payload_success_metrics_enabled: bool,

    // # Sampling
    /// Target number of sampled units of work per interval
    sampling_target: u32,
    sampling_target_period_seconds: u64,

    // # Remote parent handling
    remote_parent_sampled: RemoteParentSampledBehavior,
    remote_parent_not_sampled: RemoteParentSampledBehavior,

    /// The log level for the agent core
    log_level: LevelFilter,
}

pub const DEFAULT_SAMPLING_TARGET: u32 = 10;
pub const DEFAULT_SAMPLING_TARGET_PERIOD_SECONDS: u64 = 60;

impl Config {
    /// Creates a new builder seeded from the environment
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Config::from_env(),
        }
    }

    fn from_env() -> Self {
        let default = Config::default();

        Self {
            trusted_account_key: env_or("NEW_RELIC_TRUSTED_ACCOUNT_KEY", default.trusted_account_key),
            account_id: env_or("NEW_RELIC_ACCOUNT_ID", default.account_id),
            primary_application_id: env_or(
                "NEW_RELIC_PRIMARY_APPLICATION_ID",
                default.primary_application_id,
            ),
            distributed_tracing_enabled: env_parse_or(
                "NEW_RELIC_DISTRIBUTED_TRACING_ENABLED",
                default.distributed_tracing_enabled,
            ),
            span_events_enabled: env_parse_or(
                "NEW_RELIC_SPAN_EVENTS_ENABLED",
                default.span_events_enabled,
            ),
            transaction_events_enabled: env_parse_or(
                "NEW_RELIC_TRANSACTION_EVENTS_ENABLED",
                default.transaction_events_enabled,
            ),
            exclude_newrelic_header: env_parse_or(
                "NEW_RELIC_EXCLUDE_NEWRELIC_HEADER",
                default.exclude_newrelic_header,
            ),
            payload_success_metrics_enabled: env_parse_or(
                "NEW_RELIC_PAYLOAD_SUCCESS_METRICS_ENABLED",
                default.payload_success_metrics_enabled,
            ),
            sampling_target: env_parse_or("NEW_RELIC_SAMPLING_TARGET", default.sampling_target),
            sampling_target_period_seconds: env_parse_or(
                "NEW_RELIC_SAMPLING_TARGET_PERIOD",
                default.sampling_target_period_seconds,
            ),
            remote_parent_sampled: env_parse_or(
                "NEW_RELIC_REMOTE_PARENT_SAMPLED",
                default.remote_parent_sampled,
            ),
            remote_parent_not_sampled: env_parse_or(
                "NEW_RELIC_REMOTE_PARENT_NOT_SAMPLED",
                default.remote_parent_not_sampled,
            ),
            log_level: env_parse_or("NEW_RELIC_LOG_LEVEL", default.log_level),
        }
    }

    pub fn trusted_account_key(&self) -> &str {
        &self.trusted_account_key
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn primary_application_id(&self) -> &str {
        &self.primary_application_id
    }

    pub fn distributed_tracing_enabled(&self) -> bool {
        self.distributed_tracing_enabled
    }

    pub fn span_events_enabled(&self) -> bool {
        self.span_events_enabled
    }

    pub fn transaction_events_enabled(&self) -> bool {
        self.transaction_events_enabled
    }

    pub fn exclude_newrelic_header(&self) -> bool {
        self.exclude_newrelic_header
    }

    pub fn payload_success_metrics_enabled(&self) -> bool {
        self.payload_success_metrics_enabled
    }

    pub fn sampling_target(&self) -> u32 {
        self.sampling_target
    }

    pub fn sampling_target_period_seconds(&self) -> u64 {
        self.sampling_target_period_seconds
    }

    pub fn remote_parent_sampled(&self) -> RemoteParentSampledBehavior {
        self.remote_parent_sampled
    }

    pub fn remote_parent_not_sampled(&self) -> RemoteParentSampledBehavior {
        self.remote_parent_not_sampled
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trusted_account_key: String::new(),
            account_id: String::new(),
            primary_application_id: String::new(),
            distributed_tracing_enabled: true,
            span_events_enabled: true,
            transaction_events_enabled: true,
            exclude_newrelic_header: false,
            payload_success_metrics_enabled: true,
            sampling_target: DEFAULT_SAMPLING_TARGET,
            sampling_target_period_seconds: DEFAULT_SAMPLING_TARGET_PERIOD_SECONDS,
            remote_parent_sampled: RemoteParentSampledBehavior::default(),
            remote_parent_not_sampled: RemoteParentSampledBehavior::default(),
            log_level: LevelFilter::default(),
        }
    }
}

fn env_or(key: &'static str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Falls back to the default on a missing variable; a present but
/// unparsable value is a configuration error and is logged.
fn env_parse_or<T: FromStr>(key: &'static str, default: T) -> T
where
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(e) => {
                nr_warn!("invalid value {value:?} for {key}: {e}");
                default
            }
        },
        Err(_) => default,
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Finalizes the builder and returns the configuration
    pub fn build(self) -> Config {
        set_max_level(self.config.log_level);
        self.config
    }

    pub fn set_trusted_account_key(&mut self, key: String) -> &mut Self {
        self.config.trusted_account_key = key;
        self
    }

    pub fn set_account_id(&mut self, account_id: String) -> &mut Self {
        self.config.account_id = account_id;
        self
    }

    pub fn set_primary_application_id(&mut self, app_id: String) -> &mut Self {
        self.config.primary_application_id = app_id;
        self
    }

    pub fn set_distributed_tracing_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.distributed_tracing_enabled = enabled;
        self
    }

    pub fn set_span_events_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.span_events_enabled = enabled;
        self
    }

    pub fn set_transaction_events_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.transaction_events_enabled = enabled;
        self
    }

    pub fn set_exclude_newrelic_header(&mut self, exclude: bool) -> &mut Self {
        self.config.exclude_newrelic_header = exclude;
        self
    }

    pub fn set_payload_success_metrics_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.payload_success_metrics_enabled = enabled;
        self
    }

    pub fn set_sampling_target(&mut self, target: u32) -> &mut Self {
        self.config.sampling_target = target;
        self
    }

    pub fn set_sampling_target_period_seconds(&mut self, period: u64) -> &mut Self {
        self.config.sampling_target_period_seconds = period;
        self
    }

    pub fn set_remote_parent_sampled(
        &mut self,
        behavior: RemoteParentSampledBehavior,
    ) -> &mut Self {
        self.config.remote_parent_sampled = behavior;
        self
    }

    pub fn set_remote_parent_not_sampled(
        &mut self,
        behavior: RemoteParentSampledBehavior,
    ) -> &mut Self {
        self.config.remote_parent_not_sampled = behavior;
        self
    }

    pub fn set_log_level(&mut self, log_level: LevelFilter) -> &mut Self {
        self.config.log_level = log_level;
        self
    }
}
