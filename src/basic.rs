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

//! Basic enum types mirrored from the Parquet format: physical type,
//! repetition, encoding, compression, and the legacy/structured logical
//! type annotations.

use std::fmt;

use crate::errors::ParquetError;

/// On-disk physical representation of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  BOOLEAN,
  INT32,
  INT64,
  INT96,
  FLOAT,
  DOUBLE,
  BYTE_ARRAY,
  FIXED_LEN_BYTE_ARRAY
}

/// Per-field repetition as specified in the schema tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
  REQUIRED,
  OPTIONAL,
  REPEATED
}

/// Page/value encodings. Only `PLAIN`, `RLE`, `RLE_DICTIONARY` and the
/// legacy `PLAIN_DICTIONARY` alias are implemented; the delta family is
/// admitted in the enum (so schemas/footers referencing them still parse)
/// but decoding/encoding them is out of scope (spec Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
  PLAIN,
  PLAIN_DICTIONARY,
  RLE,
  BIT_PACKED,
  DELTA_BINARY_PACKED,
  DELTA_LENGTH_BYTE_ARRAY,
  DELTA_BYTE_ARRAY,
  RLE_DICTIONARY
}

/// Compression codec applied to a page's payload before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
  UNCOMPRESSED,
  SNAPPY,
  GZIP,
  LZO,
  BROTLI,
  LZ4_RAW,
  ZSTD
}

/// Legacy logical-type annotation. Superseded by [`LogicalType`] but still
/// read (and, when derivable, emitted alongside it for older readers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertedType {
  UTF8,
  MAP,
  MAP_KEY_VALUE,
  LIST,
  ENUM,
  DECIMAL,
  DATE,
  TIME_MILLIS,
  TIME_MICROS,
  TIMESTAMP_MILLIS,
  TIMESTAMP_MICROS,
  UINT_8,
  UINT_16,
  UINT_32,
  UINT_64,
  INT_8,
  INT_16,
  INT_32,
  INT_64,
  JSON,
  BSON,
  INTERVAL
}

/// Time/timestamp unit, shared by [`LogicalType::Time`] and
/// [`LogicalType::Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
  MILLIS,
  MICROS,
  NANOS
}

/// Structured logical-type union. Readers prefer this over
/// [`ConvertedType`] whenever both are present (spec.md open question
/// resolution; see SPEC_FULL.md DATA MODEL section).
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
  String,
  Map,
  List,
  Enum,
  Decimal { scale: i32, precision: i32 },
  Date,
  Time { is_adjusted_to_utc: bool, unit: TimeUnit },
  Timestamp { is_adjusted_to_utc: bool, unit: TimeUnit },
  Integer { bit_width: i8, is_signed: bool },
  Unknown,
  Json,
  Bson,
  Uuid,
  Float16
}

impl LogicalType {
  /// Best-effort mapping back to the legacy annotation, used only so the
  /// writer can emit a redundant `ConvertedType` for older readers.
  /// `LogicalType` remains the semantic source of truth.
  pub fn to_converted_type(&self) -> Option<ConvertedType> {
    match self {
      LogicalType::String => Some(ConvertedType::UTF8),
      LogicalType::Map => Some(ConvertedType::MAP),
      LogicalType::List => Some(ConvertedType::LIST),
      LogicalType::Enum => Some(ConvertedType::ENUM),
      LogicalType::Decimal { .. } => Some(ConvertedType::DECIMAL),
      LogicalType::Date => Some(ConvertedType::DATE),
      LogicalType::Time { unit: TimeUnit::MILLIS, .. } => Some(ConvertedType::TIME_MILLIS),
      LogicalType::Time { unit: TimeUnit::MICROS, .. } => Some(ConvertedType::TIME_MICROS),
      LogicalType::Time { .. } => None,
      LogicalType::Timestamp { unit: TimeUnit::MILLIS, .. } => Some(ConvertedType::TIMESTAMP_MILLIS),
      LogicalType::Timestamp { unit: TimeUnit::MICROS, .. } => Some(ConvertedType::TIMESTAMP_MICROS),
      LogicalType::Timestamp { .. } => None,
      LogicalType::Integer { bit_width: 8, is_signed: true } => Some(ConvertedType::INT_8),
      LogicalType::Integer { bit_width: 16, is_signed: true } => Some(ConvertedType::INT_16),
      LogicalType::Integer { bit_width: 32, is_signed: true } => Some(ConvertedType::INT_32),
      LogicalType::Integer { bit_width: 64, is_signed: true } => Some(ConvertedType::INT_64),
      LogicalType::Integer { bit_width: 8, is_signed: false } => Some(ConvertedType::UINT_8),
      LogicalType::Integer { bit_width: 16, is_signed: false } => Some(ConvertedType::UINT_16),
      LogicalType::Integer { bit_width: 32, is_signed: false } => Some(ConvertedType::UINT_32),
      LogicalType::Integer { bit_width: 64, is_signed: false } => Some(ConvertedType::UINT_64),
      LogicalType::Integer { .. } => None,
      LogicalType::Json => Some(ConvertedType::JSON),
      LogicalType::Bson => Some(ConvertedType::BSON),
      LogicalType::Unknown | LogicalType::Uuid | LogicalType::Float16 => None
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Repetition {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Compression {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for ConvertedType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl ::std::str::FromStr for Repetition {
  type Err = ParquetError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "REQUIRED" => Ok(Repetition::REQUIRED),
      "OPTIONAL" => Ok(Repetition::OPTIONAL),
      "REPEATED" => Ok(Repetition::REPEATED),
      other => Err(general_err!("unknown repetition {}", other))
    }
  }
}
