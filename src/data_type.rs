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

//! Concrete value representations for each physical type, and the marker
//! types that let decoders/encoders be generic over `T: DataType` without
//! nightly specialization (a stable per-physical-type `FixedLenPlainType`
//! marker trait stands in for the teacher's `default fn` trick).

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::basic::Type;
use crate::util::memory::ByteBufferPtr;

/// 12 opaque bytes: the legacy INT96 physical type. Never interpreted
/// temporally by this core (spec.md §9 open question).
#[derive(Clone, Debug, Default)]
pub struct Int96 {
  value: [u32; 3]
}

impl Int96 {
  pub fn new() -> Self {
    Int96 { value: [0; 3] }
  }

  pub fn data(&self) -> &[u32] {
    &self.value
  }

  pub fn set_data(&mut self, v: [u32; 3]) {
    self.value = v;
  }
}

impl PartialEq for Int96 {
  fn eq(&self, other: &Int96) -> bool {
    self.value == other.value
  }
}

/// A variable- or fixed-length byte array, backed by a reference-counted
/// byte buffer so cloning a `ByteArray` is cheap.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteArray {
  data: Option<ByteBufferPtr>
}

impl ByteArray {
  pub fn new() -> Self {
    ByteArray { data: None }
  }

  pub fn data(&self) -> &[u8] {
    self.data.as_ref().map(|b| b.as_ref()).unwrap_or(&[])
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.data = Some(data);
  }

  pub fn len(&self) -> usize {
    self.data().len()
  }
}

impl From<Vec<u8>> for ByteArray {
  fn from(v: Vec<u8>) -> ByteArray {
    let mut b = ByteArray::new();
    b.set_data(ByteBufferPtr::new(v));
    b
  }
}

impl From<&str> for ByteArray {
  fn from(v: &str) -> ByteArray {
    ByteArray::from(v.as_bytes().to_vec())
  }
}

impl fmt::Display for ByteArray {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self.data())
  }
}

/// A trait every supported in-memory value type implements, so decoders
/// know its physical type tag and default value without a match on `Type`.
pub trait ParquetValueType: PartialEq + Clone + Default + fmt::Debug + Send {
  const PHYSICAL_TYPE: Type;

  /// A canonical byte representation used to intern values during
  /// dictionary encoding (spec.md §4.D). Distinct values must produce
  /// distinct keys; equal values must produce equal keys.
  fn as_bytes_key(&self) -> Vec<u8>;

  /// Total order used to fold min/max statistics (spec.md §4.C). Need not
  /// agree with any encoding byte order except where the format mandates
  /// it (unsigned byte order for `ByteArray`).
  fn is_less_than(&self, other: &Self) -> bool;
}

impl ParquetValueType for bool {
  const PHYSICAL_TYPE: Type = Type::BOOLEAN;

  fn as_bytes_key(&self) -> Vec<u8> {
    vec![*self as u8]
  }

  fn is_less_than(&self, other: &Self) -> bool {
    !*self && *other
  }
}
impl ParquetValueType for i32 {
  const PHYSICAL_TYPE: Type = Type::INT32;

  fn as_bytes_key(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }

  fn is_less_than(&self, other: &Self) -> bool {
    self < other
  }
}
impl ParquetValueType for i64 {
  const PHYSICAL_TYPE: Type = Type::INT64;

  fn as_bytes_key(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }

  fn is_less_than(&self, other: &Self) -> bool {
    self < other
  }
}
impl ParquetValueType for Int96 {
  const PHYSICAL_TYPE: Type = Type::INT96;

  fn as_bytes_key(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(12);
    for word in self.data() {
      out.extend_from_slice(&word.to_le_bytes());
    }
    out
  }

  // INT96 is deliberately opaque (spec.md §9); byte-key order is arbitrary
  // but at least deterministic, so min/max remain well-defined.
  fn is_less_than(&self, other: &Self) -> bool {
    self.as_bytes_key() < other.as_bytes_key()
  }
}
impl ParquetValueType for f32 {
  const PHYSICAL_TYPE: Type = Type::FLOAT;

  fn as_bytes_key(&self) -> Vec<u8> {
    self.to_bits().to_le_bytes().to_vec()
  }

  fn is_less_than(&self, other: &Self) -> bool {
    self < other
  }
}
impl ParquetValueType for f64 {
  const PHYSICAL_TYPE: Type = Type::DOUBLE;

  fn as_bytes_key(&self) -> Vec<u8> {
    self.to_bits().to_le_bytes().to_vec()
  }

  fn is_less_than(&self, other: &Self) -> bool {
    self < other
  }
}
impl ParquetValueType for ByteArray {
  const PHYSICAL_TYPE: Type = Type::BYTE_ARRAY;

  fn as_bytes_key(&self) -> Vec<u8> {
    self.data().to_vec()
  }

  fn is_less_than(&self, other: &Self) -> bool {
    compare_byte_arrays(self.data(), other.data()) == Ordering::Less
  }
}

/// Binds a zero-sized marker type (`Int32Type`, `BoolType`, ...) to the
/// Rust value type it decodes/encodes into. Generic code is written over
/// `T: DataType` and reaches the concrete value type via `T::T`.
pub trait DataType: 'static + Send {
  type T: ParquetValueType;

  fn get_physical_type() -> Type {
    <Self::T as ParquetValueType>::PHYSICAL_TYPE
  }
}

macro_rules! make_type {
  ($name:ident, $native_ty:ty) => {
    #[derive(Clone)]
    pub struct $name {}

    impl DataType for $name {
      type T = $native_ty;
    }
  };
}

make_type!(BoolType, bool);
make_type!(Int32Type, i32);
make_type!(Int64Type, i64);
make_type!(Int96Type, Int96);
make_type!(FloatType, f32);
make_type!(DoubleType, f64);
make_type!(ByteArrayType, ByteArray);
make_type!(FixedLenByteArrayType, ByteArray);

/// Marker for physical types whose PLAIN encoding is a fixed number of
/// little-endian bytes per value (`i32`, `i64`, `f32`, `f64`). Used to
/// give `PlainDecoder`/`PlainEncoder` a single blanket implementation on
/// stable Rust, standing in for the teacher's nightly specialization of
/// `default fn` across all of `Decoder<T>`.
pub trait FixedLenPlainType: DataType {
  const BYTE_WIDTH: usize = mem::size_of::<<Self as DataType>::T>();
}

impl FixedLenPlainType for Int32Type {}
impl FixedLenPlainType for Int64Type {}
impl FixedLenPlainType for FloatType {}
impl FixedLenPlainType for DoubleType {}

/// Unsigned byte-order comparison, used for min/max statistics tracking
/// over byte arrays (spec.md §4.C: "comparisons are unsigned byte order").
pub fn compare_byte_arrays(a: &[u8], b: &[u8]) -> Ordering {
  a.cmp(b)
}
