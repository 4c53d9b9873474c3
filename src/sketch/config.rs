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

/// Parameter bundle for constructing a
/// [`ResizableSketch`](super::ResizableSketch).
///
/// `depth`, `width` and `k` are required; the seeds are optional and are
/// sampled fresh when absent. Two sketches can only merge or stay
/// split-compatible when they were built from the same seeds, so
/// coordinated deployments pass them explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchConfig {
    /// Number of independent rows.
    pub depth: u32,
    /// Initial number of buckets per row.
    pub width: u32,
    /// Precision parameter of the per-bucket KLL compactors.
    pub k: u32,
    /// Seed of the keyspace partition hash.
    pub partition_seed: Option<u64>,
    /// One placement seed per row; length must equal `depth` when present.
    pub row_seeds: Option<Vec<u64>>,
}

impl SketchConfig {
    /// Creates a config with fresh seeds to be sampled at construction.
    pub fn new(depth: u32, width: u32, k: u32) -> Self {
        Self {
            depth,
            width,
            k,
            partition_seed: None,
            row_seeds: None,
        }
    }

    /// Pins the partition seed.
    pub fn with_partition_seed(mut self, seed: u64) -> Self {
        self.partition_seed = Some(seed);
        self
    }

    /// Pins the per-row placement seeds.
    pub fn with_row_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.row_seeds = Some(seeds);
        self
    }
}

/// Worst-case bytes attributable to a single bucket: the KLL's retained
/// items (bounded by `k / (1 - 2/3) = 3k` eight-byte values) plus that
/// bucket's ring entry (one point and one id).
pub fn per_bucket_bytes(k: u32) -> u64 {
    3 * (k as u64) * 8 + 8 + 4
}
