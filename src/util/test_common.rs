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

//! Randomized test-data helpers shared across `#[cfg(test)]` modules,
//! mirroring the teacher's `util::test_common::RandGen`.

use rand::distributions::uniform::{SampleUniform};
use rand::Rng;

/// Appends `n` random values in `[min, max)` to `out`.
pub fn random_numbers_range<T>(n: usize, min: T, max: T, out: &mut Vec<T>)
where
  T: PartialOrd + SampleUniform + Copy
{
  let mut rng = rand::thread_rng();
  for _ in 0..n {
    out.push(rng.gen_range(min..max));
  }
}

/// Generates `n` random `i16` level values in `[0, max_level]`.
pub fn random_levels(n: usize, max_level: i16) -> Vec<i16> {
  let mut rng = rand::thread_rng();
  (0..n).map(|_| rng.gen_range(0..=max_level)).collect()
}

pub trait RandGen<T> {
  fn gen(idx: i32) -> T;

  fn gen_vec(_null_percent: i32, n: usize) -> Vec<T>
  where
    T: Default + Copy
  {
    (0..n as i32).map(Self::gen).collect()
  }
}

impl RandGen<bool> for crate::data_type::BoolType {
  fn gen(idx: i32) -> bool {
    idx % 2 == 0
  }
}

impl RandGen<i32> for crate::data_type::Int32Type {
  fn gen(idx: i32) -> i32 {
    idx
  }
}

impl RandGen<i64> for crate::data_type::Int64Type {
  fn gen(idx: i32) -> i64 {
    idx as i64
  }
}
