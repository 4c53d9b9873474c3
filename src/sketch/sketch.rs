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

use super::config::SketchConfig;
use super::config::per_bucket_bytes;
use super::partition;
use super::partition::PartitionRange;
use super::remap::remap_row;
use super::ring::Ring;
use super::ring::RingEntry;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;
use crate::hash::hash_u64;
use crate::hash::mul_inverse_u64;
use crate::kll::KllSketch;
use crate::kll::MIN_K;

// Salts separating the derived hash streams of one row seed.
const RING_STREAM_SALT: u64 = 0x5851F42D4C957F2D;
const COEF_A_SALT: u64 = 0x14057B7EF767814F;
const COEF_B_SALT: u64 = 0xB5026F5AA96619E9;
const MERGED_ROW_SALT: u64 = 0x27BB2EE687B0B0FD;
const SPLIT_LEFT_SALT: u64 = 0x369DEA0F31A53F85;
const SPLIT_RIGHT_SALT: u64 = 0xDB4F0B9175AE2165;

/// One of the sketch's independent planes: a ring, its bucket compactors,
/// the generator feeding ring growth and compactor seeds, and the odd
/// affine map carrying the partition hash into this row's placement
/// domain.
#[derive(Debug, Clone)]
struct Row {
    ring: Ring,
    buckets: Vec<KllSketch>,
    rng: XorShift64,
    coef_a: u64,
    coef_a_inv: u64,
    coef_b: u64,
}

impl Row {
    fn new(row_seed: u64, width: u32, k: u32) -> Self {
        let mut rng = XorShift64::seeded(hash_u64(row_seed, RING_STREAM_SALT));
        let ring = Ring::generate(width, &mut rng);
        let buckets = (0..width)
            .map(|_| KllSketch::with_seed(k, rng.next_u64()))
            .collect();
        Self::assemble(row_seed, ring, buckets, rng)
    }

    fn assemble(row_seed: u64, ring: Ring, buckets: Vec<KllSketch>, rng: XorShift64) -> Self {
        let coef_a = hash_u64(row_seed, COEF_A_SALT) | 1;
        let coef_b = hash_u64(row_seed, COEF_B_SALT);
        Self {
            ring,
            buckets,
            rng,
            coef_a,
            coef_a_inv: mul_inverse_u64(coef_a),
            coef_b,
        }
    }

    /// Maps a partition hash into this row's placement domain.
    fn place(&self, partition_hash: u64) -> u64 {
        self.coef_a
            .wrapping_mul(partition_hash)
            .wrapping_add(self.coef_b)
    }

    /// Recovers the partition hash a retained placement came from. Exact
    /// because `coef_a` is odd and therefore invertible on the word ring.
    fn unplace(&self, placement: u64) -> u64 {
        self.coef_a_inv
            .wrapping_mul(placement.wrapping_sub(self.coef_b))
    }

    fn total_weight(&self) -> u64 {
        self.buckets.iter().map(KllSketch::n).sum()
    }

    fn num_retained(&self) -> usize {
        self.buckets.iter().map(KllSketch::num_retained).sum()
    }
}

/// Resizable frequency sketch over `u64` keys.
///
/// See the [sketch module level documentation](crate::sketch) for more.
#[derive(Debug, Clone)]
pub struct ResizableSketch {
    depth: u32,
    width: u32,
    k: u32,
    partition_seed: u64,
    row_seeds: Vec<u64>,
    rows: Vec<Row>,
    coverage: Vec<PartitionRange>,
}

impl ResizableSketch {
    /// Creates an empty sketch with freshly sampled seeds.
    ///
    /// Sketches built this way cannot merge with each other; use
    /// [`with_seeds`](Self::with_seeds) or [`from_config`](Self::from_config)
    /// with pinned seeds when several sketches must stay compatible.
    ///
    /// # Panics
    ///
    /// Panics if `depth` or `width` is zero, or `k` is below
    /// [`MIN_K`](crate::kll::MIN_K).
    pub fn new(depth: u32, width: u32, k: u32) -> Self {
        let mut entropy = XorShift64::default();
        let partition_seed = entropy.next_u64();
        let row_seeds = (0..depth).map(|_| entropy.next_u64()).collect();
        Self::with_seeds(depth, width, k, partition_seed, row_seeds)
    }

    /// Creates an empty sketch with explicit seeds.
    ///
    /// Two sketches with equal `depth`, `k`, `partition_seed`, `row_seeds`
    /// and `width` route every key identically, which is what makes merge
    /// and split well-defined across independently fed instances.
    ///
    /// # Panics
    ///
    /// Panics if `depth` or `width` is zero, `k` is below
    /// [`MIN_K`](crate::kll::MIN_K), or `row_seeds.len() != depth`.
    pub fn with_seeds(
        depth: u32,
        width: u32,
        k: u32,
        partition_seed: u64,
        row_seeds: Vec<u64>,
    ) -> Self {
        assert!(depth > 0, "depth must be positive");
        assert!(width > 0, "width must be positive");
        assert!(k >= MIN_K, "k must be >= {MIN_K}, got {k}");
        assert_eq!(
            row_seeds.len(),
            depth as usize,
            "row_seeds length must equal depth"
        );

        let rows = row_seeds
            .iter()
            .map(|&seed| Row::new(seed, width, k))
            .collect();
        Self {
            depth,
            width,
            k,
            partition_seed,
            row_seeds,
            rows,
            coverage: partition::full_coverage(),
        }
    }

    /// Creates an empty sketch from a [`SketchConfig`], sampling any seeds
    /// the config leaves unset.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`with_seeds`](Self::with_seeds).
    pub fn from_config(config: &SketchConfig) -> Self {
        let mut entropy = XorShift64::default();
        let partition_seed = config
            .partition_seed
            .unwrap_or_else(|| entropy.next_u64());
        let row_seeds = match &config.row_seeds {
            Some(seeds) => seeds.clone(),
            None => (0..config.depth).map(|_| entropy.next_u64()).collect(),
        };
        Self::with_seeds(config.depth, config.width, config.k, partition_seed, row_seeds)
    }

    /// Returns the number of rows.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns the current number of buckets per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the KLL precision parameter.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Returns the keyspace partition seed.
    pub fn partition_seed(&self) -> u64 {
        self.partition_seed
    }

    /// Returns the per-row placement seeds.
    pub fn row_seeds(&self) -> &[u64] {
        &self.row_seeds
    }

    /// Returns true if the sketch has absorbed no updates.
    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0
    }

    /// Returns the summed weight held by all compactors across all rows:
    /// `depth` times the number of updates absorbed. Structural operations
    /// conserve this quantity exactly.
    pub fn total_weight(&self) -> u64 {
        self.rows.iter().map(Row::total_weight).sum()
    }

    /// Returns the number of items currently retained across all rows.
    pub fn num_retained(&self) -> usize {
        self.rows.iter().map(Row::num_retained).sum()
    }

    /// The keyspace partition hash shared by every row of compatible
    /// sketches.
    pub fn partition_hash(key: u64, partition_seed: u64) -> u64 {
        hash_u64(key, partition_seed)
    }

    /// Absorbs one occurrence of `key`.
    pub fn update(&mut self, key: u64) {
        let partition_hash = hash_u64(key, self.partition_seed);
        for row in &mut self.rows {
            let placement = row.place(partition_hash);
            let bucket = row.ring.find_bucket(placement) as usize;
            row.buckets[bucket].update(placement);
        }
    }

    /// Returns the estimated frequency of `key`: the mean over rows of each
    /// owning compactor's multiplicity estimate for the key's placement.
    pub fn estimate(&self, key: u64) -> f64 {
        let partition_hash = hash_u64(key, self.partition_seed);
        let mut total = 0.0;
        for row in &self.rows {
            let placement = row.place(partition_hash);
            let bucket = row.ring.find_bucket(placement) as usize;
            total += row.buckets[bucket].estimate(placement);
        }
        total / self.depth as f64
    }

    /// Grows every row to `new_width` buckets, remapping absorbed mass onto
    /// the widened rings.
    ///
    /// Fails with `InvalidWidth` if `new_width` does not exceed the current
    /// width; the sketch is untouched on failure.
    pub fn expand(&mut self, new_width: u32) -> Result<(), Error> {
        if new_width <= self.width {
            return Err(Error::invalid_width("expand target must exceed current width")
                .with_context("width", self.width)
                .with_context("new_width", new_width));
        }
        for row in &mut self.rows {
            let new_ring = row.ring.expanded(new_width, &mut row.rng);
            let new_buckets = remap_row(&row.ring, &row.buckets, &new_ring, self.k, &mut row.rng)?;
            row.ring = new_ring;
            row.buckets = new_buckets;
        }
        self.width = new_width;
        Ok(())
    }

    /// Shrinks every row to `new_width` buckets, remapping absorbed mass
    /// onto the pruned rings.
    ///
    /// Fails with `InvalidWidth` unless `0 < new_width < width`; the sketch
    /// is untouched on failure.
    pub fn shrink(&mut self, new_width: u32) -> Result<(), Error> {
        if new_width == 0 || new_width >= self.width {
            return Err(Error::invalid_width("shrink target must be in (0, width)")
                .with_context("width", self.width)
                .with_context("new_width", new_width));
        }
        for row in &mut self.rows {
            let new_ring = row.ring.shrunk(new_width, &mut row.rng);
            let new_buckets = remap_row(&row.ring, &row.buckets, &new_ring, self.k, &mut row.rng)?;
            row.ring = new_ring;
            row.buckets = new_buckets;
        }
        self.width = new_width;
        Ok(())
    }

    /// Builds a sketch of width `a.width + b.width` carrying the combined
    /// mass of both inputs. Per row, the two rings are concatenated (the
    /// second input's bucket ids shifted up) and both bucket arrays are
    /// remapped onto the unified ring.
    ///
    /// The inputs are left untouched and should be discarded by the caller;
    /// fails with `ConfigMismatch` unless `depth`, `k`, `partition_seed`
    /// and `row_seeds` all agree, and with `Overflow` if the summed width
    /// does not fit a `u32`.
    pub fn merge(a: &ResizableSketch, b: &ResizableSketch) -> Result<ResizableSketch, Error> {
        Self::check_merge_compatible(a, b)?;
        let new_width = a.width.checked_add(b.width).ok_or_else(|| {
            Error::overflow("merged width exceeds u32")
                .with_context("a_width", a.width)
                .with_context("b_width", b.width)
        })?;

        let mut rows = Vec::with_capacity(a.rows.len());
        for ((row_a, row_b), &row_seed) in a.rows.iter().zip(&b.rows).zip(&a.row_seeds) {
            let mut entries: Vec<RingEntry> = row_a.ring.entries().to_vec();
            entries.extend(
                row_b
                    .ring
                    .entries()
                    .iter()
                    .map(|entry| RingEntry::new(entry.point(), entry.bucket_id() + a.width)),
            );
            let ring = Ring::from_entries(entries);

            let mut rng = XorShift64::seeded(hash_u64(
                row_seed,
                MERGED_ROW_SALT ^ new_width as u64,
            ));
            let mut buckets = remap_row(&row_a.ring, &row_a.buckets, &ring, a.k, &mut rng)?;
            let from_b = remap_row(&row_b.ring, &row_b.buckets, &ring, a.k, &mut rng)?;
            for (bucket, other) in buckets.iter_mut().zip(&from_b) {
                bucket.merge(other)?;
            }

            rows.push(Row::assemble(row_seed, ring, buckets, rng));
        }

        Ok(ResizableSketch {
            depth: a.depth,
            width: new_width,
            k: a.k,
            partition_seed: a.partition_seed,
            row_seeds: a.row_seeds.clone(),
            rows,
            coverage: partition::merge_coverage(&a.coverage, &b.coverage),
        })
    }

    /// Splits the sketch into two children whose widths sum to the current
    /// width and whose key-space responsibilities partition this sketch's.
    ///
    /// Ring entries with bucket id below `width_1` seed the first child's
    /// ring (ids kept); the rest seed the second child's (ids rebased).
    /// Every retained item is classified by the partition hash it came
    /// from and rebuilt into the owning child, so the two children's mass
    /// sums exactly to the parent's.
    ///
    /// The source is left untouched and should be discarded by the caller;
    /// fails with `InvalidWidth` unless both widths are positive and sum to
    /// the sketch's width.
    pub fn split(
        &self,
        width_1: u32,
        width_2: u32,
    ) -> Result<(ResizableSketch, ResizableSketch), Error> {
        match width_1.checked_add(width_2) {
            Some(total) if total == self.width && width_1 > 0 && width_2 > 0 => {}
            _ => {
                return Err(Error::invalid_width(
                    "split widths must be positive and sum to the sketch width",
                )
                .with_context("width", self.width)
                .with_context("width_1", width_1)
                .with_context("width_2", width_2));
            }
        }

        let (coverage_1, coverage_2) = partition::split_coverage(&self.coverage, width_1, width_2);

        let mut rows_1 = Vec::with_capacity(self.rows.len());
        let mut rows_2 = Vec::with_capacity(self.rows.len());
        for (row, &row_seed) in self.rows.iter().zip(&self.row_seeds) {
            let mut entries_1 = Vec::with_capacity(width_1 as usize);
            let mut entries_2 = Vec::with_capacity(width_2 as usize);
            for entry in row.ring.entries() {
                if entry.bucket_id() < width_1 {
                    entries_1.push(*entry);
                } else {
                    entries_2.push(RingEntry::new(entry.point(), entry.bucket_id() - width_1));
                }
            }
            let ring_1 = Ring::from_entries(entries_1);
            let ring_2 = Ring::from_entries(entries_2);

            let mut rng_1 =
                XorShift64::seeded(hash_u64(row_seed, SPLIT_LEFT_SALT ^ width_1 as u64));
            let mut rng_2 =
                XorShift64::seeded(hash_u64(row_seed, SPLIT_RIGHT_SALT ^ width_2 as u64));
            let mut buckets_1: Vec<KllSketch> = (0..width_1)
                .map(|_| KllSketch::with_seed(self.k, rng_1.next_u64()))
                .collect();
            let mut buckets_2: Vec<KllSketch> = (0..width_2)
                .map(|_| KllSketch::with_seed(self.k, rng_2.next_u64()))
                .collect();

            // Reassign every retained item to the child owning its
            // partition hash, at its original level. Anything outside the
            // first child's share (including mass this sketch absorbed for
            // keys it was not responsible for) falls to the second, so the
            // children sum exactly to the parent.
            for bucket in &row.buckets {
                for (level, items) in bucket.levels().iter().enumerate() {
                    for &placement in items {
                        let partition_hash = row.unplace(placement);
                        if partition::covers(&coverage_1, partition_hash) {
                            let id = ring_1.find_bucket(placement) as usize;
                            buckets_1[id].push_at_level(placement, level);
                        } else {
                            let id = ring_2.find_bucket(placement) as usize;
                            buckets_2[id].push_at_level(placement, level);
                        }
                    }
                }
            }
            for bucket in buckets_1.iter_mut().chain(buckets_2.iter_mut()) {
                bucket.compact_pending();
            }

            rows_1.push(Row::assemble(row_seed, ring_1, buckets_1, rng_1));
            rows_2.push(Row::assemble(row_seed, ring_2, buckets_2, rng_2));
        }

        let child = |width, rows, coverage| ResizableSketch {
            depth: self.depth,
            width,
            k: self.k,
            partition_seed: self.partition_seed,
            row_seeds: self.row_seeds.clone(),
            rows,
            coverage,
        };
        Ok((
            child(width_1, rows_1, coverage_1),
            child(width_2, rows_2, coverage_2),
        ))
    }

    /// Returns true if this sketch owns `key`'s slice of the partition-hash
    /// domain. A sketch that was never split owns the whole domain; the
    /// children of a split partition their parent's share, so exactly one
    /// of them claims any key the parent owned.
    pub fn is_responsible_for(&self, key: u64) -> bool {
        partition::covers(&self.coverage, hash_u64(key, self.partition_seed))
    }

    /// Returns the partition-hash ranges this sketch is responsible for.
    pub fn partition_ranges(&self) -> &[PartitionRange] {
        &self.coverage
    }

    /// Returns an upper bound on steady-state memory: every bucket at its
    /// retained-item cap plus its ring entry, across all rows. Saturates at
    /// `u64::MAX`.
    pub fn max_memory_usage(&self) -> u64 {
        let total = (self.depth as u128) * (self.width as u128) * (per_bucket_bytes(self.k) as u128);
        u64::try_from(total).unwrap_or(u64::MAX)
    }

    /// Returns the largest width whose [`max_memory_usage`](Self::max_memory_usage)
    /// fits in `budget_bytes` for the given `depth` and `k`.
    ///
    /// Fails with `Overflow` when the computation exceeds the machine word.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is zero or `k` is below [`MIN_K`](crate::kll::MIN_K).
    pub fn width_for_memory(budget_bytes: u64, depth: u32, k: u32) -> Result<u32, Error> {
        assert!(depth > 0, "depth must be positive");
        assert!(k >= MIN_K, "k must be >= {MIN_K}, got {k}");
        let per_row = (depth as u64)
            .checked_mul(per_bucket_bytes(k))
            .ok_or_else(|| {
                Error::overflow("per-row bytes exceed u64")
                    .with_context("depth", depth)
                    .with_context("k", k)
            })?;
        let width = budget_bytes / per_row;
        u32::try_from(width).map_err(|_| {
            Error::overflow("admissible width exceeds u32").with_context("width", width)
        })
    }

    fn check_merge_compatible(a: &ResizableSketch, b: &ResizableSketch) -> Result<(), Error> {
        if a.depth != b.depth {
            return Err(Error::config_mismatch("merging requires equal depth")
                .with_context("a_depth", a.depth)
                .with_context("b_depth", b.depth));
        }
        if a.k != b.k {
            return Err(Error::config_mismatch("merging requires equal k")
                .with_context("a_k", a.k)
                .with_context("b_k", b.k));
        }
        if a.partition_seed != b.partition_seed {
            return Err(Error::config_mismatch(
                "merging requires a shared partition seed",
            ));
        }
        if a.row_seeds != b.row_seeds {
            return Err(Error::config_mismatch("merging requires shared row seeds"));
        }
        Ok(())
    }
}
