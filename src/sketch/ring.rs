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

use crate::common::RandomSource;
use crate::common::XorShift64;

/// One boundary on the consistent-hashing circle: the bucket with this id
/// owns the arc ending at `point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEntry {
    point: u64,
    bucket: u32,
}

impl RingEntry {
    pub(crate) fn new(point: u64, bucket: u32) -> Self {
        Self { point, bucket }
    }

    /// Returns the entry's position on the hash circle.
    pub fn point(&self) -> u64 {
        self.point
    }

    /// Returns the id of the bucket anchored at this point.
    pub fn bucket_id(&self) -> u32 {
        self.bucket
    }
}

/// A consistent-hashing circle of `width` random points.
///
/// Entries are kept sorted by point; bucket ids are always a permutation of
/// `0..width`. Lookup finds the first entry at or after a hash, wrapping to
/// the front of the circle, so growing the ring can only move keys onto
/// newly added buckets.
#[derive(Debug, Clone)]
pub struct Ring {
    entries: Vec<RingEntry>,
}

impl Ring {
    /// Draws `width` fresh points from `rng`, assigning bucket ids in
    /// creation order.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    pub fn generate(width: u32, rng: &mut XorShift64) -> Self {
        assert!(width > 0, "ring width must be positive");
        let entries = (0..width)
            .map(|bucket| RingEntry::new(rng.next_u64(), bucket))
            .collect();
        Self::from_entries(entries)
    }

    pub(crate) fn from_entries(mut entries: Vec<RingEntry>) -> Self {
        entries.sort_unstable_by_key(|entry| (entry.point, entry.bucket));
        Self { entries }
    }

    /// Returns the number of entries (the ring's width).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the ring holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in point order.
    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    pub(crate) fn points(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.point)
    }

    /// Returns the bucket owning `hash`: the first entry with
    /// `point >= hash`, wrapping to the first entry of the circle.
    pub fn find_bucket(&self, hash: u64) -> u32 {
        debug_assert!(!self.entries.is_empty());
        let idx = self.entries.partition_point(|entry| entry.point < hash);
        let idx = if idx == self.entries.len() { 0 } else { idx };
        self.entries[idx].bucket
    }

    /// Returns a ring widened to `new_width`: existing entries are kept
    /// untouched and fresh points take the new bucket ids, so no key moves
    /// between surviving buckets.
    ///
    /// # Panics
    ///
    /// Panics if `new_width` does not exceed the current width.
    pub fn expanded(&self, new_width: u32, rng: &mut XorShift64) -> Ring {
        assert!(
            (new_width as usize) > self.len(),
            "expanded width must exceed current width"
        );
        let mut entries = self.entries.clone();
        for bucket in (self.len() as u32)..new_width {
            entries.push(RingEntry::new(rng.next_u64(), bucket));
        }
        Self::from_entries(entries)
    }

    /// Returns a ring narrowed to `new_width` by sampling surviving points
    /// without replacement. Surviving entries are renumbered densely in the
    /// order of their original bucket ids.
    ///
    /// # Panics
    ///
    /// Panics if `new_width` is zero or not below the current width.
    pub fn shrunk(&self, new_width: u32, rng: &mut XorShift64) -> Ring {
        let target = new_width as usize;
        assert!(
            target > 0 && target < self.len(),
            "shrunk width must be in (0, width)"
        );
        let mut sampled = self.entries.clone();
        for i in 0..target {
            let j = i + rng.next_bounded((sampled.len() - i) as u64) as usize;
            sampled.swap(i, j);
        }
        sampled.truncate(target);

        // Renumber densely, stable in the original id order.
        sampled.sort_unstable_by_key(|entry| entry.bucket);
        for (bucket, entry) in sampled.iter_mut().enumerate() {
            entry.bucket = bucket as u32;
        }
        Self::from_entries(sampled)
    }
}
