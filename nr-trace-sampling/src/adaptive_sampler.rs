// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Interval-based adaptive sampling.
//!
//! The sampler converges on a fixed number of sampled units of work per
//! wall-clock interval regardless of arrival rate. The first interval seeds
//! the statistics by sampling unconditionally up to the target; afterwards
//! candidates are admitted with probability `target / seen_last_interval`,
//! degrading through a precomputed backoff-ceiling table once the target is
//! reached within the interval.

use std::sync::{
    atomic::{AtomicI64, AtomicU64, Ordering},
    Arc, Mutex, OnceLock, RwLock,
};
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};

use nr_trace::nr_warn;

use crate::priority::AtomicPriority;

const DONE_WITH_FIRST_INTERVAL_SENTINEL: i64 = -1;
const BACKOFF_EXPONENT: f64 = 0.5;
const MIN_TARGET_SAMPLES_PER_INTERVAL: u32 = 1;
const PRIORITY_BOOST: f32 = 1.0;

pub const DEFAULT_TARGET_SAMPLES_PER_INTERVAL: u32 = 10;
pub const DEFAULT_TARGET_SAMPLING_INTERVAL_SECONDS: u64 = 60;

/// Per-configuration-generation sampler state. Replaced wholesale on a
/// configuration push, never mutated field by field, so in-flight readers
/// always observe a consistent target/interval/table triple.
struct SamplerState {
    target: i64,
    interval: Duration,

    // ceiling values are used for the target+1, target+2, ... sampled
    // candidates in an interval
    ceiling_values_for_backoff: Vec<i64>,

    // down counter for the first interval, set to the sentinel once the
    // first interval ends
    first_interval_remaining: AtomicI64,
    candidates_seen_current_interval: AtomicI64,
    candidates_seen_last_interval: AtomicI64,
    candidates_sampled_current_interval: AtomicI64,

    // interval bookkeeping: millis relative to `epoch`, 0 = clock not armed
    epoch: Instant,
    next_interval_start: AtomicU64,
    interval_lock: Mutex<()>,

    rng: Mutex<StdRng>,
    manual_interval_check: bool,
}

impl SamplerState {
    fn new(target: i64, interval: Duration, rng: StdRng, manual_interval_check: bool) -> Self {
        SamplerState {
            target,
            interval,
            ceiling_values_for_backoff: compute_ceiling_values(target),
            first_interval_remaining: AtomicI64::new(target),
            candidates_seen_current_interval: AtomicI64::new(0),
            candidates_seen_last_interval: AtomicI64::new(0),
            candidates_sampled_current_interval: AtomicI64::new(0),
            epoch: Instant::now(),
            next_interval_start: AtomicU64::new(0),
            interval_lock: Mutex::new(()),
            rng: Mutex::new(rng),
            manual_interval_check,
        }
    }

    /// Replacement state for a configuration push. Carries the previous
    /// interval counters forward as a continuity hint and arms the interval
    /// clock immediately.
    fn with_previous(target: i64, interval: Duration, previous: &SamplerState) -> Self {
        let rng = previous.rng.lock().unwrap().clone();
        let state = SamplerState::new(target, interval, rng, previous.manual_interval_check);

        state.candidates_seen_current_interval.store(
            previous.candidates_seen_current_interval.load(Ordering::Acquire),
            Ordering::Release,
        );
        state.candidates_seen_last_interval.store(
            previous.candidates_seen_last_interval.load(Ordering::Acquire),
            Ordering::Release,
        );
        state.candidates_sampled_current_interval.store(
            previous
                .candidates_sampled_current_interval
                .load(Ordering::Acquire),
            Ordering::Release,
        );
        state
            .next_interval_start
            .store(state.interval_millis(), Ordering::Release);

        state
    }

    fn interval_millis(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn random_below(&self, max: i64) -> i64 {
        if max <= 0 {
            return 0;
        }
        self.rng.lock().unwrap().gen_range(0..max)
    }

    fn ceiling_from_samples_in_current_interval(&self, candidates_sampled: i64) -> i64 {
        let ceiling_index = (candidates_sampled - self.target) as usize;
        self.ceiling_values_for_backoff
            .get(ceiling_index)
            .copied()
            .unwrap_or(0)
    }

    fn end_of_sampling_interval(&self, new_next_interval_start: u64) {
        self.next_interval_start
            .store(new_next_interval_start, Ordering::Release);
        let seen = self
            .candidates_seen_current_interval
            .swap(0, Ordering::AcqRel);
        self.candidates_seen_last_interval
            .store(seen, Ordering::Release);
        self.candidates_sampled_current_interval
            .store(0, Ordering::Release);
        self.first_interval_remaining
            .store(DONE_WITH_FIRST_INTERVAL_SENTINEL, Ordering::Release);
    }

    /// Atomically reads the first-interval countdown and, if positive,
    /// decrements it. Returns the value prior to any decrement.
    fn get_then_decrement_first_interval(&self) -> i64 {
        let mut remaining = self.first_interval_remaining.load(Ordering::Acquire);
        while remaining > 0 {
            match self.first_interval_remaining.compare_exchange_weak(
                remaining,
                remaining - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => {
                    remaining = observed;
                    std::hint::spin_loop();
                }
            }
        }

        remaining
    }

    fn check_and_update_interval_if_necessary(&self) {
        let now = self.now_millis();

        let next = self.next_interval_start.load(Ordering::Acquire);
        if next == 0 {
            // first decision arms the clock; losing this race is harmless
            let _ = self.next_interval_start.compare_exchange(
                0,
                now + self.interval_millis(),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return;
        }

        if now >= next {
            let _guard = self.interval_lock.lock().unwrap();
            let next = self.next_interval_start.load(Ordering::Acquire);
            if next != 0 && now >= next {
                self.end_of_sampling_interval(now + self.interval_millis());
            }
        }
    }

    fn should_sample(&self) -> bool {
        if !self.manual_interval_check {
            self.check_and_update_interval_if_necessary();
        }

        // account for seeing this candidate; the decision math below
        // subtracts it back out to get the count prior to this candidate
        self.candidates_seen_current_interval
            .fetch_add(1, Ordering::AcqRel);

        let first_interval_remaining = self.get_then_decrement_first_interval();
        if first_interval_remaining > 0 {
            return true;
        }

        loop {
            let candidates_sampled = self
                .candidates_sampled_current_interval
                .load(Ordering::Acquire);
            let seen_last = self.candidates_seen_last_interval.load(Ordering::Acquire);
            let seen_current = self
                .candidates_seen_current_interval
                .load(Ordering::Acquire)
                - 1;

            let sampled = if candidates_sampled < self.target {
                // an idle last interval yields no admissions on this branch
                seen_last > 0 && self.random_below(seen_last) < self.target
            } else {
                let ceiling = self.ceiling_from_samples_in_current_interval(candidates_sampled);
                ceiling > 0 && self.random_below(seen_current.max(0)) < ceiling
            };

            if !sampled {
                return false;
            }

            // a peer that wins the increment forces a re-evaluation against
            // the fresh count, otherwise concurrent decisions over-sample
            if self
                .candidates_sampled_current_interval
                .compare_exchange(
                    candidates_sampled,
                    candidates_sampled + 1,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }

            std::hint::spin_loop();
        }
    }
}

fn compute_ceiling_values(sampling_target: i64) -> Vec<i64> {
    let mut ceiling_values = Vec::new();
    let mut candidate_ordinal = sampling_target;
    loop {
        let ratio = sampling_target as f64 / candidate_ordinal as f64;
        let ceiling_value = ((sampling_target as f64).powf(ratio)
            - (sampling_target as f64).powf(BACKOFF_EXPONENT))
        .round() as i64;
        if ceiling_value <= 0 {
            break;
        }

        ceiling_values.push(ceiling_value);
        candidate_ordinal += 1;
    }
    ceiling_values
}

fn validated_target(target: u32) -> i64 {
    if target < MIN_TARGET_SAMPLES_PER_INTERVAL {
        nr_warn!(
            "invalid sampling target {target}; it must be at least {MIN_TARGET_SAMPLES_PER_INTERVAL} (defaulting to {DEFAULT_TARGET_SAMPLES_PER_INTERVAL})"
        );
        return i64::from(DEFAULT_TARGET_SAMPLES_PER_INTERVAL);
    }
    i64::from(target)
}

fn validated_interval(period_seconds: u64) -> Duration {
    if period_seconds == 0 {
        nr_warn!(
            "invalid sampling target period 0s (defaulting to {DEFAULT_TARGET_SAMPLING_INTERVAL_SECONDS}s)"
        );
        return Duration::from_secs(DEFAULT_TARGET_SAMPLING_INTERVAL_SECONDS);
    }
    Duration::from_secs(period_seconds)
}

/// The process-wide sampling decision engine.
///
/// Decisions are lock free apart from the narrow interval-rollover critical
/// section; configuration pushes replace the whole state behind an atomic
/// reference swap.
pub struct AdaptiveSampler {
    state: RwLock<Arc<SamplerState>>,
}

impl AdaptiveSampler {
    /// `manual_interval_check` is for hosts with no steady flow of decisions
    /// (the interval is then only rolled from [`AdaptiveSampler::start_transaction`]).
    pub fn new(target: u32, period_seconds: u64, manual_interval_check: bool) -> Self {
        Self::from_rng(
            target,
            period_seconds,
            StdRng::from_entropy(),
            manual_interval_check,
        )
    }

    /// Deterministic sampler for tests.
    pub fn with_seed(
        target: u32,
        period_seconds: u64,
        manual_interval_check: bool,
        seed: u64,
    ) -> Self {
        Self::from_rng(
            target,
            period_seconds,
            StdRng::seed_from_u64(seed),
            manual_interval_check,
        )
    }

    fn from_rng(target: u32, period_seconds: u64, rng: StdRng, manual_interval_check: bool) -> Self {
        AdaptiveSampler {
            state: RwLock::new(Arc::new(SamplerState::new(
                validated_target(target),
                validated_interval(period_seconds),
                rng,
                manual_interval_check,
            ))),
        }
    }

    fn state(&self) -> Arc<SamplerState> {
        self.state.read().unwrap().clone()
    }

    pub fn target_samples_per_interval(&self) -> u32 {
        self.state().target as u32
    }

    /// Explicit interval check for hosts running with
    /// `manual_interval_check`; a no-op otherwise.
    pub fn start_transaction(&self) {
        let state = self.state();
        if state.manual_interval_check {
            state.check_and_update_interval_if_necessary();
        }
    }

    /// Decides whether the unit of work owning `priority` is sampled,
    /// boosting the priority on a yes.
    pub fn compute_sampled(&self, priority: &AtomicPriority) -> bool {
        let sampled = self.state().should_sample();
        if sampled {
            priority.adjust(PRIORITY_BOOST);
        }
        sampled
    }

    /// Applies a server-pushed sampling configuration. The whole state is
    /// replaced; the previous interval counters carry over as a continuity
    /// hint. A push without a target is ignored.
    pub fn update_configuration(&self, target: Option<u32>, period_seconds: Option<u64>) {
        let Some(target) = target else {
            return;
        };

        let target = validated_target(target);
        let interval =
            validated_interval(period_seconds.unwrap_or(DEFAULT_TARGET_SAMPLING_INTERVAL_SECONDS));

        let mut state = self.state.write().unwrap();
        let replacement = Arc::new(SamplerState::with_previous(target, interval, &state));
        *state = replacement;
    }

    #[cfg(test)]
    fn roll_interval_now(&self) {
        let state = self.state();
        let _guard = state.interval_lock.lock().unwrap();
        state.end_of_sampling_interval(state.now_millis() + state.interval_millis());
    }

    #[cfg(test)]
    fn candidates_seen_last_interval(&self) -> i64 {
        self.state()
            .candidates_seen_last_interval
            .load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn candidates_seen_current_interval(&self) -> i64 {
        self.state()
            .candidates_seen_current_interval
            .load(Ordering::Acquire)
    }
}

/// The sampled/priority cell of one unit of work.
///
/// The decision is set exactly once, either inherited from the inbound
/// trace context or computed by the adaptive sampler the first time it is
/// needed, and is never recomputed afterwards.
pub struct SamplingCell {
    sampled: OnceLock<bool>,
    priority: AtomicPriority,
}

impl SamplingCell {
    pub fn new(priority: f32) -> Self {
        SamplingCell {
            sampled: OnceLock::new(),
            priority: AtomicPriority::new(priority),
        }
    }

    /// Cell pre-seeded with a decision the upstream caller already made.
    pub fn inherited(sampled: Option<bool>, priority: f32) -> Self {
        let cell = SamplingCell::new(priority);
        if let Some(sampled) = sampled {
            let _ = cell.sampled.set(sampled);
        }
        cell
    }

    pub fn sampled(&self) -> Option<bool> {
        self.sampled.get().copied()
    }

    pub fn priority(&self) -> f32 {
        self.priority.get()
    }

    /// Returns the stable decision for this unit of work, consulting the
    /// sampler at most once over the cell's lifetime.
    pub fn ensure_sampled(&self, sampler: &AdaptiveSampler) -> bool {
        *self
            .sampled
            .get_or_init(|| sampler.compute_sampled(&self.priority))
    }
}
