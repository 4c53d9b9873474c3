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

use super::MIN_K;
use super::helper::in_arc;
use super::helper::level_capacity;
use super::helper::retained_weight;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;
use crate::hash::hash_u64;

/// Weighted KLL compactor over `u64` hash values.
///
/// See the [kll module level documentation](crate::kll) for more.
#[derive(Debug, Clone)]
pub struct KllSketch {
    k: u32,
    n: u64,
    levels: Vec<Vec<u64>>,
    rng: XorShift64,
}

impl KllSketch {
    /// Creates a new sketch with the given value of k and a fresh
    /// compaction seed.
    ///
    /// # Panics
    ///
    /// Panics if k is below [MIN_K].
    pub fn new(k: u32) -> Self {
        let mut entropy = XorShift64::default();
        Self::with_seed(k, entropy.next_u64())
    }

    /// Creates a new sketch with the given value of k and an explicit seed
    /// for the compaction coin flips.
    ///
    /// # Panics
    ///
    /// Panics if k is below [MIN_K].
    pub fn with_seed(k: u32, seed: u64) -> Self {
        assert!(k >= MIN_K, "k must be >= {MIN_K}, got {k}");
        Self {
            k,
            n: 0,
            levels: vec![Vec::new()],
            rng: XorShift64::seeded(seed),
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Returns total absorbed weight.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of levels currently allocated.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.levels.iter().map(|level| level.len()).sum()
    }

    /// Absorbs one occurrence of `value` with weight 1.
    pub fn update(&mut self, value: u64) {
        self.n += 1;
        self.levels[0].push(value);
        self.compact_level(0);
    }

    /// Absorbs `value` with the given weight.
    ///
    /// Equivalent to `weight` unit updates, delivered in `O(log weight)` by
    /// decomposing the weight into powers of two and placing one copy at
    /// each set bit's level. A zero weight is a no-op.
    pub fn update_weighted(&mut self, value: u64, weight: u64) {
        if weight == 0 {
            return;
        }
        self.n += weight;
        let mut w = weight;
        let mut level = 0;
        while w > 0 {
            if w & 1 == 1 {
                if level >= self.levels.len() {
                    self.levels.resize_with(level + 1, Vec::new);
                }
                self.levels[level].push(value);
            }
            w >>= 1;
            level += 1;
        }
        // The low level may still be fine while a higher bit landed on a
        // full one, so every level gets checked.
        self.compact_pending();
        debug_assert_eq!(retained_weight(&self.levels), self.n);
    }

    /// Merges another sketch into this one.
    ///
    /// Fails with `ConfigMismatch` if the sketches were configured with
    /// different values of k.
    pub fn merge(&mut self, other: &KllSketch) -> Result<(), Error> {
        if self.k != other.k {
            return Err(Error::config_mismatch("merging requires equal k")
                .with_context("self_k", self.k)
                .with_context("other_k", other.k));
        }
        if other.is_empty() {
            return Ok(());
        }

        self.n += other.n;
        if self.levels.len() < other.levels.len() {
            self.levels.resize_with(other.levels.len(), Vec::new);
        }
        for (level, items) in other.levels.iter().enumerate() {
            self.levels[level].extend_from_slice(items);
        }
        self.compact_pending();

        debug_assert_eq!(retained_weight(&self.levels), self.n);
        Ok(())
    }

    /// Returns the estimated multiplicity of `value`.
    pub fn estimate(&self, value: u64) -> f64 {
        let mut total = 0.0;
        for (level, items) in self.levels.iter().enumerate() {
            let matches = items.iter().filter(|&&item| item == value).count();
            if matches > 0 {
                total += (matches as f64) * ((1u64 << level) as f64);
            }
        }
        total
    }

    /// Returns the estimated total weight of values on the arc `(lo, hi]`.
    ///
    /// `lo >= hi` denotes the arc wrapping through zero; `lo == hi` covers
    /// the whole circle.
    pub fn count_in_range(&self, lo: u64, hi: u64) -> f64 {
        let mut total = 0.0;
        for (level, items) in self.levels.iter().enumerate() {
            let matches = items.iter().filter(|&&item| in_arc(lo, hi, item)).count();
            if matches > 0 {
                total += (matches as f64) * ((1u64 << level) as f64);
            }
        }
        total
    }

    /// Builds a new sketch of the same k holding only the retained items on
    /// the arc `(lo, hi]`, each at its original level.
    ///
    /// The result's `n` is the retained weight of the extracted range, so
    /// summing rebuilds over arcs that tile the circle reproduces this
    /// sketch's `n` exactly.
    pub fn rebuild(&self, lo: u64, hi: u64) -> KllSketch {
        let mut levels = Vec::with_capacity(self.levels.len());
        let mut n = 0u64;
        for (level, items) in self.levels.iter().enumerate() {
            let kept: Vec<u64> = items
                .iter()
                .copied()
                .filter(|&item| in_arc(lo, hi, item))
                .collect();
            n += (kept.len() as u64) << level;
            levels.push(kept);
        }
        while levels.len() > 1 && levels.last().is_some_and(|level| level.is_empty()) {
            levels.pop();
        }
        KllSketch {
            k: self.k,
            n,
            levels,
            rng: XorShift64::seeded(hash_u64(lo, hi)),
        }
    }

    /// Appends `value` at an explicit level, deferring compaction.
    ///
    /// Callers must invoke [`compact_pending`](Self::compact_pending) once
    /// they are done appending.
    pub(crate) fn push_at_level(&mut self, value: u64, level: usize) {
        if level >= self.levels.len() {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(value);
        self.n += 1u64 << level;
    }

    /// Compacts every level that is at or over capacity.
    pub(crate) fn compact_pending(&mut self) {
        let mut level = 0;
        while level < self.levels.len() {
            self.compact_level(level);
            level += 1;
        }
    }

    pub(crate) fn levels(&self) -> &[Vec<u64>] {
        &self.levels
    }

    fn capacity_of(&self, level: usize) -> usize {
        level_capacity(self.k, self.levels.len(), level)
    }

    fn compact_level(&mut self, level: usize) {
        if self.levels[level].len() < self.capacity_of(level) {
            return;
        }
        if level + 1 == self.levels.len() {
            // Growing the level count reshapes every capacity below.
            self.levels.push(Vec::new());
        }

        let mut items = std::mem::take(&mut self.levels[level]);
        // An odd element stays behind at its own weight; promoting half of
        // an even count at double weight keeps the retained total exact.
        let leftover = if items.len() % 2 == 1 { items.pop() } else { None };
        items.sort_unstable();

        let offset = usize::from(self.rng.next_bool());
        let promoted: Vec<u64> = items.iter().skip(offset).step_by(2).copied().collect();
        self.levels[level + 1].extend_from_slice(&promoted);
        self.levels[level] = leftover.into_iter().collect();

        self.compact_level(level + 1);
    }
}
