// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod configuration;
pub use configuration::Config;

pub mod distributed_tracing;
pub mod health;
pub mod log;
