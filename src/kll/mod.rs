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

//! Weighted KLL compactor over 64-bit hash values.
//!
//! Each level of the compactor stores values carrying an implicit weight of
//! `2^level`. Level capacities shrink geometrically below the top with
//! ratio 2/3, and an overflowing level is compacted by promoting every
//! other element (random start offset) to the level above. Compaction here
//! is lossless in total weight: an odd element is left behind rather than
//! rounded away, so the retained weighted total always equals the absorbed
//! weight `n`. That exact bookkeeping is what lets the surrounding sketch
//! conserve mass across restructuring.
//!
//! Beyond the usual update/merge surface, the compactor answers
//! multiplicity queries — [`estimate`](KllSketch::estimate) for a single
//! value, [`count_in_range`](KllSketch::count_in_range) over a hash-circle
//! arc — and can [`rebuild`](KllSketch::rebuild) itself restricted to an
//! arc, which is the primitive the ring remap is built from.
//!
//! # Usage
//!
//! ```rust
//! use resketch::kll::KllSketch;
//!
//! let mut sketch = KllSketch::with_seed(200, 1);
//! for _ in 0..1000 {
//!     sketch.update(77);
//! }
//! assert_eq!(sketch.n(), 1000);
//! assert!((sketch.estimate(77) - 1000.0).abs() < 1e-9);
//! assert_eq!(sketch.estimate(78), 0.0);
//! ```

mod helper;
mod sketch;

pub use self::sketch::KllSketch;

/// Minimum value of parameter k.
pub const MIN_K: u32 = 8;

/// Geometric ratio of level capacities below the top level.
pub(crate) const LEVEL_CAPACITY_RATIO: f64 = 2.0 / 3.0;

/// Floor on any level's capacity, so compaction always has a pair to work
/// with.
pub(crate) const MIN_LEVEL_CAPACITY: usize = 2;
