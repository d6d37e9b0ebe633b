// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod adaptive_sampler;
mod priority;

pub use adaptive_sampler::{
    AdaptiveSampler, SamplingCell, DEFAULT_TARGET_SAMPLES_PER_INTERVAL,
    DEFAULT_TARGET_SAMPLING_INTERVAL_SECONDS,
};
pub use priority::{adjust, sanitize, AtomicPriority, PriorityGenerator};
