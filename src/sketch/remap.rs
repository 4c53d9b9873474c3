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
use crate::error::Error;
use crate::kll::KllSketch;
use crate::sketch::Ring;

/// Transfers one row's bucket contents onto a new ring, conserving total
/// weight exactly.
///
/// The circle is cut at every point of either ring; on each resulting arc
/// the routing of both rings is constant, so the arc's mass can be
/// extracted from its single owning source bucket
/// ([`rebuild`](KllSketch::rebuild)) and merged into its single owning
/// destination bucket. The sweep starts with the arc wrapping from the
/// highest point back to the lowest.
///
/// `rng` seeds the fresh destination compactors.
pub fn remap_row(
    in_ring: &Ring,
    in_buckets: &[KllSketch],
    out_ring: &Ring,
    k: u32,
    rng: &mut XorShift64,
) -> Result<Vec<KllSketch>, Error> {
    debug_assert_eq!(in_ring.len(), in_buckets.len());

    let mut out_buckets: Vec<KllSketch> = (0..out_ring.len())
        .map(|_| KllSketch::with_seed(k, rng.next_u64()))
        .collect();

    let mut points: Vec<u64> = in_ring.points().chain(out_ring.points()).collect();
    points.sort_unstable();
    points.dedup();

    let mut start = points[points.len() - 1];
    for &end in &points {
        // The owner of arc (start, end] is the bucket whose point closes
        // the arc; under the point >= hash lookup that is find_bucket(end).
        let in_id = in_ring.find_bucket(end) as usize;
        let out_id = out_ring.find_bucket(end) as usize;

        let source = &in_buckets[in_id];
        if source.count_in_range(start, end) > 0.0 {
            let sub = source.rebuild(start, end);
            out_buckets[out_id].merge(&sub)?;
        }
        start = end;
    }

    Ok(out_buckets)
}
