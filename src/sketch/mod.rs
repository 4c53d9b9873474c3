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

//! Resizable frequency sketch over consistent-hashing rings.
//!
//! A [`ResizableSketch`] holds `depth` independent rows. Each row owns a
//! [`Ring`] of `width` random points on the 64-bit hash circle and one KLL
//! compactor per bucket; an update routes the key's placement hash to the
//! arc owner in every row. Because routing is consistent hashing, the
//! sketch can be restructured under load: [`expand`](ResizableSketch::expand)
//! and [`shrink`](ResizableSketch::shrink) change the bucket count,
//! [`merge`](ResizableSketch::merge) combines two compatibly configured
//! sketches, and [`split`](ResizableSketch::split) partitions one sketch's
//! key space between two children. All four conserve the absorbed mass by
//! remapping bucket contents between rings ([`remap_row`]) rather than
//! discarding them.
//!
//! # Usage
//!
//! ```rust
//! use resketch::sketch::ResizableSketch;
//!
//! let mut sketch = ResizableSketch::with_seeds(4, 64, 30, 99, vec![1, 2, 3, 4]);
//! for key in 0u64..1000 {
//!     sketch.update(key % 10);
//! }
//! let estimate = sketch.estimate(3);
//! assert!(estimate > 0.0);
//!
//! // Double the capacity without losing what was absorbed.
//! let before = sketch.total_weight();
//! sketch.expand(128).unwrap();
//! assert_eq!(sketch.total_weight(), before);
//! ```

mod config;
mod partition;
mod remap;
mod ring;
#[allow(clippy::module_inception)]
mod sketch;

pub use self::config::SketchConfig;
pub use self::config::per_bucket_bytes;
pub use self::partition::PartitionRange;
pub use self::remap::remap_row;
pub use self::ring::Ring;
pub use self::ring::RingEntry;
pub use self::sketch::ResizableSketch;
