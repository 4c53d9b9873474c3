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

//! Randomness owned by the sketches.
//!
//! Nothing in the crate draws from a global source: every sketch carries
//! its own generator state, so any sequence of operations replays
//! identically from the configured seeds. The two consumers are the
//! compaction coin flip and the without-replacement sampling of surviving
//! ring points, and both read the *low* end of the word, which is why the
//! generator scrambles its output (see [`XorShift64`]).

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Random number source for sketches.
pub trait RandomSource {
    /// Returns the next random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Returns a random boolean; drives the compaction offset coin.
    fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) != 0
    }

    /// Returns a random value in `[0, bound)`.
    ///
    /// Reduction is by multiply-shift: the word is scaled into the bound
    /// so the result comes from the high bits, and the bias against any
    /// particular value is below `bound / 2^64` — invisible at ring
    /// widths. This is what the shrink sampling swaps on.
    ///
    /// `bound` must be non-zero.
    fn next_bounded(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0, "bound must be non-zero");
        (((self.next_u64() as u128) * (bound as u128)) >> 64) as u64
    }
}

/// Output scrambler of the xorshift* generator.
const SCRAMBLE: u64 = 0x2545F4914F6CDD1D;

/// Xorshift*-based random generator for sketch operations.
///
/// The raw xorshift word has weak low bits, and both consumers in this
/// crate read exactly those, so the output is passed through the odd
/// multiplicative scramble of the * variant while the state stays a plain
/// xorshift walk.
#[derive(Debug, Clone, Copy)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new generator using the provided seed.
    pub fn seeded(seed: u64) -> Self {
        // The all-zero word is the one fixed point of the xorshift walk.
        let state = if seed == 0 { SCRAMBLE } else { seed };
        Self { state }
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        let pid = std::process::id() as u64;
        Self::seeded(nanos.rotate_left(17) ^ pid.wrapping_mul(SCRAMBLE))
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(SCRAMBLE)
    }
}
