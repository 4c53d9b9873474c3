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

use super::LEVEL_CAPACITY_RATIO;
use super::MIN_LEVEL_CAPACITY;

pub fn level_capacity(k: u32, num_levels: usize, level: usize) -> usize {
    assert!(level < num_levels, "level must be < num_levels");
    let height = (num_levels - level - 1) as i32;
    let cap = ((k as f64) * LEVEL_CAPACITY_RATIO.powi(height)).ceil() as usize;
    cap.max(MIN_LEVEL_CAPACITY)
}

/// True if `value` lies on the half-open arc `(lo, hi]` of the hash circle.
///
/// `lo >= hi` denotes the arc that wraps through zero; `lo == hi` is the
/// full circle.
pub fn in_arc(lo: u64, hi: u64, value: u64) -> bool {
    if lo < hi {
        value > lo && value <= hi
    } else {
        value > lo || value <= hi
    }
}

pub fn retained_weight(levels: &[Vec<u64>]) -> u64 {
    levels
        .iter()
        .enumerate()
        .map(|(level, items)| (items.len() as u64) << level)
        .sum()
}
