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

use resketch::common::RandomSource;
use resketch::common::XorShift64;
use resketch::error::ErrorKind;
use resketch::kll::KllSketch;
use resketch::kll::MIN_K;

// Large enough that nothing compacts in these streams, so answers are exact.
const EXACT_K: u32 = 4096;

#[test]
fn test_empty() {
    let sketch = KllSketch::with_seed(200, 1);
    assert!(sketch.is_empty());
    assert_eq!(sketch.n(), 0);
    assert_eq!(sketch.num_retained(), 0);
    assert_eq!(sketch.num_levels(), 1);
    assert_eq!(sketch.estimate(42), 0.0);
    assert_eq!(sketch.count_in_range(0, u64::MAX), 0.0);
}

#[test]
#[should_panic(expected = "k must be >=")]
fn test_k_too_small_panics() {
    KllSketch::with_seed(MIN_K - 1, 1);
}

#[test]
fn test_exact_mode_estimates() {
    let mut sketch = KllSketch::with_seed(EXACT_K, 2);
    for _ in 0..300 {
        sketch.update(10);
    }
    for _ in 0..200 {
        sketch.update(20);
    }
    assert_eq!(sketch.n(), 500);
    assert_eq!(sketch.num_retained(), 500);
    assert_eq!(sketch.estimate(10), 300.0);
    assert_eq!(sketch.estimate(20), 200.0);
    assert_eq!(sketch.estimate(30), 0.0);
}

#[test]
fn test_update_weighted_matches_weight() {
    let mut sketch = KllSketch::with_seed(EXACT_K, 3);
    sketch.update_weighted(7, 1000);
    assert_eq!(sketch.n(), 1000);
    // 1000 = 0b1111101000: one copy per set bit.
    assert_eq!(sketch.num_retained(), 6);
    assert_eq!(sketch.estimate(7), 1000.0);
}

#[test]
fn test_update_weighted_zero_is_noop() {
    let mut sketch = KllSketch::with_seed(200, 4);
    sketch.update_weighted(7, 0);
    assert!(sketch.is_empty());
}

#[test]
fn test_merge_sums_weight() {
    let mut a = KllSketch::with_seed(EXACT_K, 5);
    let mut b = KllSketch::with_seed(EXACT_K, 6);
    for _ in 0..100 {
        a.update(1);
        b.update(1);
        b.update(2);
    }
    a.merge(&b).unwrap();
    assert_eq!(a.n(), 300);
    assert_eq!(a.estimate(1), 200.0);
    assert_eq!(a.estimate(2), 100.0);
}

#[test]
fn test_merge_empty_is_noop() {
    let mut a = KllSketch::with_seed(200, 7);
    a.update(5);
    let b = KllSketch::with_seed(200, 8);
    a.merge(&b).unwrap();
    assert_eq!(a.n(), 1);
}

#[test]
fn test_merge_requires_equal_k() {
    let mut a = KllSketch::with_seed(64, 9);
    let b = KllSketch::with_seed(128, 10);
    let err = a.merge(&b).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);
}

#[test]
fn test_compaction_conserves_total_weight() {
    let mut sketch = KllSketch::with_seed(30, 11);
    let mut values = XorShift64::seeded(12);
    for i in 0..100_000u64 {
        if i % 3 == 0 {
            sketch.update_weighted(values.next_u64(), 1 + (i % 7));
        } else {
            sketch.update(values.next_u64());
        }
    }
    // The retained weighted total matching n is the lossless-compaction
    // invariant; the degenerate range covers the whole circle.
    assert_eq!(sketch.count_in_range(0, 0), sketch.n() as f64);
}

#[test]
fn test_memory_stays_bounded() {
    let k = 30;
    let mut sketch = KllSketch::with_seed(k, 13);
    let mut values = XorShift64::seeded(14);
    for _ in 0..200_000 {
        sketch.update(values.next_u64());
    }
    assert!(sketch.num_retained() <= 5 * k as usize);
    assert!(sketch.num_levels() < 40);
}

#[test]
fn test_estimate_under_compaction_stays_close() {
    let mut sketch = KllSketch::with_seed(200, 15);
    let values = [111u64, 222, 333, 444, 555];
    for _ in 0..2000 {
        for &value in &values {
            sketch.update(value);
        }
    }
    let expected = 2000.0;
    for &value in &values {
        let estimate = sketch.estimate(value);
        let relative = (estimate - expected).abs() / expected;
        assert!(relative < 0.5, "estimate {estimate} too far from {expected}");
    }
}

#[test]
fn test_smallest_k_still_conserves_weight() {
    let mut sketch = KllSketch::with_seed(MIN_K, 25);
    let mut values = XorShift64::seeded(26);
    for _ in 0..50_000 {
        sketch.update(values.next_u64());
    }
    assert_eq!(sketch.n(), 50_000);
    assert_eq!(sketch.count_in_range(0, 0), 50_000.0);
    assert!(sketch.num_retained() <= 5 * MIN_K as usize + 2 * sketch.num_levels());
}

#[test]
fn test_count_in_range_half_open_bounds() {
    let mut sketch = KllSketch::with_seed(EXACT_K, 16);
    for _ in 0..10 {
        sketch.update(100);
        sketch.update(200);
        sketch.update(300);
    }
    assert_eq!(sketch.count_in_range(100, 300), 20.0); // (100, 300]
    assert_eq!(sketch.count_in_range(99, 300), 30.0);
    assert_eq!(sketch.count_in_range(100, 299), 10.0);
    assert_eq!(sketch.count_in_range(300, 100), 10.0); // wraps, picks up 100
    assert_eq!(sketch.count_in_range(50, 50), 30.0); // degenerate = everything
}

#[test]
fn test_rebuild_extracts_range_only() {
    let mut sketch = KllSketch::with_seed(EXACT_K, 17);
    for _ in 0..10 {
        sketch.update(100);
        sketch.update(200);
        sketch.update(300);
    }
    let sub = sketch.rebuild(100, 250);
    assert_eq!(sub.k(), sketch.k());
    assert_eq!(sub.n(), 10);
    assert_eq!(sub.estimate(200), 10.0);
    assert_eq!(sub.estimate(100), 0.0);
    assert_eq!(sub.estimate(300), 0.0);
}

#[test]
fn test_rebuild_n_matches_count_in_range() {
    let mut sketch = KllSketch::with_seed(30, 18);
    let mut values = XorShift64::seeded(19);
    for _ in 0..50_000 {
        sketch.update(values.next_u64());
    }
    for (lo, hi) in [(0u64, u64::MAX / 2), (u64::MAX / 2, 0), (3, 3)] {
        let sub = sketch.rebuild(lo, hi);
        assert_eq!(sub.n() as f64, sketch.count_in_range(lo, hi));
    }
}

#[test]
fn test_rebuilds_over_tiling_arcs_conserve_n() {
    let mut sketch = KllSketch::with_seed(30, 20);
    let mut values = XorShift64::seeded(21);
    for _ in 0..50_000 {
        sketch.update(values.next_u64());
    }
    // (cut_a, cut_b] and (cut_b, cut_a] tile the circle.
    let cut_a = u64::MAX / 3;
    let cut_b = 2 * (u64::MAX / 3);
    let first = sketch.rebuild(cut_a, cut_b);
    let second = sketch.rebuild(cut_b, cut_a);
    assert_eq!(first.n() + second.n(), sketch.n());
}

#[test]
fn test_rebuilt_sketch_accepts_further_updates() {
    let mut sketch = KllSketch::with_seed(30, 22);
    let mut values = XorShift64::seeded(23);
    for _ in 0..10_000 {
        sketch.update(values.next_u64());
    }
    let mut sub = sketch.rebuild(0, u64::MAX / 2);
    let before = sub.n();
    sub.update(1);
    sub.update_weighted(2, 10);
    assert_eq!(sub.n(), before + 11);

    let mut other = KllSketch::with_seed(30, 24);
    other.update(9);
    sub.merge(&other).unwrap();
    assert_eq!(sub.n(), before + 12);
}
