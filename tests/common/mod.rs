// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Deterministic data generators and small statistics helpers shared by
//! the integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;

use resketch::common::RandomSource;
use resketch::common::XorShift64;

/// Uniform keys over `[0, universe)`.
pub struct UniformKeys {
    rng: XorShift64,
    universe: u64,
}

impl UniformKeys {
    pub fn new(universe: u64, seed: u64) -> Self {
        Self {
            rng: XorShift64::seeded(seed),
            universe,
        }
    }

    pub fn next(&mut self) -> u64 {
        self.rng.next_bounded(self.universe)
    }
}

/// Zipf(s)-distributed keys over `{0..num_keys-1}` (key 0 heaviest), drawn
/// by inverse CDF over the precomputed rank weights.
pub struct ZipfKeys {
    rng: XorShift64,
    cdf: Vec<f64>,
}

impl ZipfKeys {
    pub fn new(num_keys: usize, s: f64, seed: u64) -> Self {
        let mut cdf = Vec::with_capacity(num_keys);
        let mut total = 0.0;
        for rank in 1..=num_keys {
            total += 1.0 / (rank as f64).powf(s);
            cdf.push(total);
        }
        for value in &mut cdf {
            *value /= total;
        }
        Self {
            rng: XorShift64::seeded(seed),
            cdf,
        }
    }

    pub fn next(&mut self) -> u64 {
        let unit = (self.rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        self.cdf.partition_point(|&p| p < unit) as u64
    }
}

/// Exact frequency table of a replayed stream.
pub fn true_counts(stream: &[u64]) -> HashMap<u64, u64> {
    let mut counts = HashMap::new();
    for &key in stream {
        *counts.entry(key).or_insert(0u64) += 1;
    }
    counts
}

/// Keys ordered by true count, heaviest first.
pub fn keys_by_count(counts: &HashMap<u64, u64>) -> Vec<u64> {
    let mut keys: Vec<u64> = counts.keys().copied().collect();
    keys.sort_unstable_by_key(|key| (std::cmp::Reverse(counts[key]), *key));
    keys
}

/// The value at quantile `q` of the given samples.
pub fn percentile(samples: &[f64], q: f64) -> f64 {
    assert!(!samples.is_empty());
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((sorted.len() as f64 * q).ceil() as usize).clamp(1, sorted.len()) - 1;
    sorted[idx]
}

/// Mean of the samples.
pub fn mean(samples: &[f64]) -> f64 {
    assert!(!samples.is_empty());
    samples.iter().sum::<f64>() / samples.len() as f64
}
