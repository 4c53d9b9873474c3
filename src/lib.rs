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

//! Resizable probabilistic frequency sketches for high-volume streams.
//!
//! The central type is [`sketch::ResizableSketch`]: a bounded-memory
//! frequency summary over `u64` keys that can be restructured while it is
//! carrying data. A sketch may be expanded (more buckets, better accuracy),
//! shrunk (memory handed back), merged with an independently populated
//! sketch of compatible configuration, or split into two sketches that
//! partition the key space — each operation conserving the absorbed mass
//! rather than discarding it.
//!
//! Internally a sketch is `depth` independent rows. Each row routes hashed
//! keys through a consistent-hashing ring ([`sketch::Ring`]) into an array
//! of weighted KLL compactors ([`kll::KllSketch`]), and structural changes
//! move mass between rings with a conservative remap
//! ([`sketch::remap_row`]).
//!
//! # Usage
//!
//! ```rust
//! use resketch::sketch::ResizableSketch;
//!
//! let mut sketch = ResizableSketch::with_seeds(2, 8, 30, 7, vec![11, 12]);
//! for _ in 0..100 {
//!     sketch.update(42);
//! }
//! assert_eq!(sketch.total_weight(), 200); // 100 updates in each of 2 rows
//!
//! sketch.expand(16).unwrap();
//! assert_eq!(sketch.total_weight(), 200); // restructuring conserves mass
//! assert!((sketch.estimate(42) - 100.0).abs() < 1e-9);
//! ```

pub mod common;
pub mod error;
pub mod hash;
pub mod kll;
pub mod sketch;
