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

//! The footer structs (spec.md §4.D): `FileMetaData` down to `Statistics`
//! and `PageHeader`, each with a `read_from`/`write_to` pair over
//! [`super::protocol`]. Field ids and wire enum codes follow the Parquet
//! format definition; this module hand-maintains that mapping rather than
//! deriving it, since our in-memory enums (`crate::basic`) were not laid
//! out to match the wire codes positionally.

use crate::basic::{Compression, ConvertedType, Encoding, LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use crate::errors::Result;
use crate::thrift::protocol::{CompactProtocolReader, CompactProtocolWriter, FieldType};

// ----------------------------------------------------------------------
// Wire-code mappings. Every one of these is a full, explicit match in both
// directions: relying on an `as i32` cast against the `crate::basic` enum
// discriminant would silently break the moment someone reorders a variant
// for readability.

fn physical_type_to_thrift(t: PhysicalType) -> i32 {
  match t {
    PhysicalType::BOOLEAN => 0,
    PhysicalType::INT32 => 1,
    PhysicalType::INT64 => 2,
    PhysicalType::INT96 => 3,
    PhysicalType::FLOAT => 4,
    PhysicalType::DOUBLE => 5,
    PhysicalType::BYTE_ARRAY => 6,
    PhysicalType::FIXED_LEN_BYTE_ARRAY => 7
  }
}

fn physical_type_from_thrift(code: i32) -> Result<PhysicalType> {
  match code {
    0 => Ok(PhysicalType::BOOLEAN),
    1 => Ok(PhysicalType::INT32),
    2 => Ok(PhysicalType::INT64),
    3 => Ok(PhysicalType::INT96),
    4 => Ok(PhysicalType::FLOAT),
    5 => Ok(PhysicalType::DOUBLE),
    6 => Ok(PhysicalType::BYTE_ARRAY),
    7 => Ok(PhysicalType::FIXED_LEN_BYTE_ARRAY),
    other => Err(general_err!("unknown physical type code {}", other))
  }
}

fn repetition_to_thrift(r: Repetition) -> i32 {
  match r {
    Repetition::REQUIRED => 0,
    Repetition::OPTIONAL => 1,
    Repetition::REPEATED => 2
  }
}

fn repetition_from_thrift(code: i32) -> Result<Repetition> {
  match code {
    0 => Ok(Repetition::REQUIRED),
    1 => Ok(Repetition::OPTIONAL),
    2 => Ok(Repetition::REPEATED),
    other => Err(general_err!("unknown repetition type code {}", other))
  }
}

fn encoding_to_thrift(e: Encoding) -> i32 {
  match e {
    Encoding::PLAIN => 0,
    Encoding::PLAIN_DICTIONARY => 2,
    Encoding::RLE => 3,
    Encoding::BIT_PACKED => 4,
    Encoding::DELTA_BINARY_PACKED => 5,
    Encoding::DELTA_LENGTH_BYTE_ARRAY => 6,
    Encoding::DELTA_BYTE_ARRAY => 7,
    Encoding::RLE_DICTIONARY => 8
  }
}

fn encoding_from_thrift(code: i32) -> Result<Encoding> {
  match code {
    0 => Ok(Encoding::PLAIN),
    2 => Ok(Encoding::PLAIN_DICTIONARY),
    3 => Ok(Encoding::RLE),
    4 => Ok(Encoding::BIT_PACKED),
    5 => Ok(Encoding::DELTA_BINARY_PACKED),
    6 => Ok(Encoding::DELTA_LENGTH_BYTE_ARRAY),
    7 => Ok(Encoding::DELTA_BYTE_ARRAY),
    8 => Ok(Encoding::RLE_DICTIONARY),
    other => Err(general_err!("unknown encoding code {}", other))
  }
}

fn compression_to_thrift(c: Compression) -> i32 {
  match c {
    Compression::UNCOMPRESSED => 0,
    Compression::SNAPPY => 1,
    Compression::GZIP => 2,
    Compression::LZO => 3,
    Compression::BROTLI => 4,
    Compression::ZSTD => 6,
    Compression::LZ4_RAW => 7
  }
}

fn compression_from_thrift(code: i32) -> Result<Compression> {
  match code {
    0 => Ok(Compression::UNCOMPRESSED),
    1 => Ok(Compression::SNAPPY),
    2 => Ok(Compression::GZIP),
    3 => Ok(Compression::LZO),
    4 => Ok(Compression::BROTLI),
    6 => Ok(Compression::ZSTD),
    7 => Ok(Compression::LZ4_RAW),
    other => Err(general_err!("unknown or unsupported compression codec code {}", other))
  }
}

fn converted_type_to_thrift(c: ConvertedType) -> i32 {
  match c {
    ConvertedType::UTF8 => 0,
    ConvertedType::MAP => 1,
    ConvertedType::MAP_KEY_VALUE => 2,
    ConvertedType::LIST => 3,
    ConvertedType::ENUM => 4,
    ConvertedType::DECIMAL => 5,
    ConvertedType::DATE => 6,
    ConvertedType::TIME_MILLIS => 7,
    ConvertedType::TIME_MICROS => 8,
    ConvertedType::TIMESTAMP_MILLIS => 9,
    ConvertedType::TIMESTAMP_MICROS => 10,
    ConvertedType::UINT_8 => 11,
    ConvertedType::UINT_16 => 12,
    ConvertedType::UINT_32 => 13,
    ConvertedType::UINT_64 => 14,
    ConvertedType::INT_8 => 15,
    ConvertedType::INT_16 => 16,
    ConvertedType::INT_32 => 17,
    ConvertedType::INT_64 => 18,
    ConvertedType::JSON => 19,
    ConvertedType::BSON => 20,
    ConvertedType::INTERVAL => 21
  }
}

fn converted_type_from_thrift(code: i32) -> Result<ConvertedType> {
  match code {
    0 => Ok(ConvertedType::UTF8),
    1 => Ok(ConvertedType::MAP),
    2 => Ok(ConvertedType::MAP_KEY_VALUE),
    3 => Ok(ConvertedType::LIST),
    4 => Ok(ConvertedType::ENUM),
    5 => Ok(ConvertedType::DECIMAL),
    6 => Ok(ConvertedType::DATE),
    7 => Ok(ConvertedType::TIME_MILLIS),
    8 => Ok(ConvertedType::TIME_MICROS),
    9 => Ok(ConvertedType::TIMESTAMP_MILLIS),
    10 => Ok(ConvertedType::TIMESTAMP_MICROS),
    11 => Ok(ConvertedType::UINT_8),
    12 => Ok(ConvertedType::UINT_16),
    13 => Ok(ConvertedType::UINT_32),
    14 => Ok(ConvertedType::UINT_64),
    15 => Ok(ConvertedType::INT_8),
    16 => Ok(ConvertedType::INT_16),
    17 => Ok(ConvertedType::INT_32),
    18 => Ok(ConvertedType::INT_64),
    19 => Ok(ConvertedType::JSON),
    20 => Ok(ConvertedType::BSON),
    21 => Ok(ConvertedType::INTERVAL),
    other => Err(general_err!("unknown converted type code {}", other))
  }
}

// ----------------------------------------------------------------------
// LogicalType / TimeUnit (structured unions)

fn read_empty_struct(r: &mut CompactProtocolReader) -> Result<()> {
  r.read_struct_begin()?;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    r.skip(field.field_type)?;
  }
  r.read_struct_end()
}

fn write_empty_struct(w: &mut CompactProtocolWriter) {
  w.write_struct_begin();
  w.write_field_stop();
  w.write_struct_end();
}

fn read_time_unit(r: &mut CompactProtocolReader) -> Result<TimeUnit> {
  r.read_struct_begin()?;
  let mut result = None;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    match field.id {
      1 => {
        read_empty_struct(r)?;
        result = Some(TimeUnit::MILLIS);
      },
      2 => {
        read_empty_struct(r)?;
        result = Some(TimeUnit::MICROS);
      },
      3 => {
        read_empty_struct(r)?;
        result = Some(TimeUnit::NANOS);
      },
      _ => r.skip(field.field_type)?
    }
  }
  r.read_struct_end()?;
  result.ok_or_else(|| general_err!("TimeUnit union had no recognized variant set"))
}

fn write_time_unit(w: &mut CompactProtocolWriter, unit: TimeUnit) {
  w.write_struct_begin();
  match unit {
    TimeUnit::MILLIS => w.write_field(FieldType::Struct, 1, |w| write_empty_struct(w)),
    TimeUnit::MICROS => w.write_field(FieldType::Struct, 2, |w| write_empty_struct(w)),
    TimeUnit::NANOS => w.write_field(FieldType::Struct, 3, |w| write_empty_struct(w))
  }
  w.write_field_stop();
  w.write_struct_end();
}

fn read_decimal_variant(r: &mut CompactProtocolReader) -> Result<LogicalType> {
  r.read_struct_begin()?;
  let mut scale = None;
  let mut precision = None;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    match field.id {
      1 => scale = Some(r.read_i32()?),
      2 => precision = Some(r.read_i32()?),
      _ => r.skip(field.field_type)?
    }
  }
  r.read_struct_end()?;
  Ok(LogicalType::Decimal {
    scale: scale.ok_or_else(|| general_err!("DecimalType missing scale"))?,
    precision: precision.ok_or_else(|| general_err!("DecimalType missing precision"))?
  })
}

fn read_time_variant(r: &mut CompactProtocolReader, is_timestamp: bool) -> Result<LogicalType> {
  r.read_struct_begin()?;
  let mut is_adjusted_to_utc = None;
  let mut unit = None;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    match field.id {
      1 => is_adjusted_to_utc = Some(r.read_bool()?),
      2 => unit = Some(read_time_unit(r)?),
      _ => r.skip(field.field_type)?
    }
  }
  r.read_struct_end()?;
  let is_adjusted_to_utc = is_adjusted_to_utc.ok_or_else(|| general_err!("TimeType/TimestampType missing isAdjustedToUTC"))?;
  let unit = unit.ok_or_else(|| general_err!("TimeType/TimestampType missing unit"))?;
  Ok(if is_timestamp {
    LogicalType::Timestamp { is_adjusted_to_utc, unit }
  } else {
    LogicalType::Time { is_adjusted_to_utc, unit }
  })
}

fn write_time_variant(w: &mut CompactProtocolWriter, is_adjusted_to_utc: bool, unit: TimeUnit) {
  w.write_struct_begin();
  w.write_bool_field(1, is_adjusted_to_utc);
  w.write_field(FieldType::Struct, 2, |w| write_time_unit(w, unit));
  w.write_field_stop();
  w.write_struct_end();
}

fn read_integer_variant(r: &mut CompactProtocolReader) -> Result<LogicalType> {
  r.read_struct_begin()?;
  let mut bit_width = None;
  let mut is_signed = None;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    match field.id {
      1 => bit_width = Some(r.read_byte_value()?),
      2 => is_signed = Some(r.read_bool()?),
      _ => r.skip(field.field_type)?
    }
  }
  r.read_struct_end()?;
  Ok(LogicalType::Integer {
    bit_width: bit_width.ok_or_else(|| general_err!("IntType missing bitWidth"))?,
    is_signed: is_signed.ok_or_else(|| general_err!("IntType missing isSigned"))?
  })
}

pub fn read_logical_type(r: &mut CompactProtocolReader) -> Result<LogicalType> {
  r.read_struct_begin()?;
  let mut result = None;
  loop {
    let field = r.read_field_begin()?;
    if field.field_type == FieldType::Stop {
      break;
    }
    match field.id {
      1 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::String);
      },
      2 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Map);
      },
      3 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::List);
      },
      4 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Enum);
      },
      5 => result = Some(read_decimal_variant(r)?),
      6 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Date);
      },
      7 => result = Some(read_time_variant(r, false)?),
      8 => result = Some(read_time_variant(r, true)?),
      10 => result = Some(read_integer_variant(r)?),
      11 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Unknown);
      },
      12 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Json);
      },
      13 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Bson);
      },
      14 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Uuid);
      },
      15 => {
        read_empty_struct(r)?;
        result = Some(LogicalType::Float16);
      },
      _ => r.skip(field.field_type)?
    }
  }
  r.read_struct_end()?;
  result.ok_or_else(|| general_err!("LogicalType union had no recognized variant set"))
}

pub fn write_logical_type(w: &mut CompactProtocolWriter, lt: &LogicalType) {
  w.write_struct_begin();
  match lt {
    LogicalType::String => w.write_field(FieldType::Struct, 1, |w| write_empty_struct(w)),
    LogicalType::Map => w.write_field(FieldType::Struct, 2, |w| write_empty_struct(w)),
    LogicalType::List => w.write_field(FieldType::Struct, 3, |w| write_empty_struct(w)),
    LogicalType::Enum => w.write_field(FieldType::Struct, 4, |w| write_empty_struct(w)),
    LogicalType::Decimal { scale, precision } => w.write_field(FieldType::Struct, 5, |w| {
      w.write_struct_begin();
      w.write_field(FieldType::I32, 1, |w| w.write_i32(*scale));
      w.write_field(FieldType::I32, 2, |w| w.write_i32(*precision));
      w.write_field_stop();
      w.write_struct_end();
    }),
    LogicalType::Date => w.write_field(FieldType::Struct, 6, |w| write_empty_struct(w)),
    LogicalType::Time { is_adjusted_to_utc, unit } => {
      w.write_field(FieldType::Struct, 7, |w| write_time_variant(w, *is_adjusted_to_utc, *unit))
    },
    LogicalType::Timestamp { is_adjusted_to_utc, unit } => {
      w.write_field(FieldType::Struct, 8, |w| write_time_variant(w, *is_adjusted_to_utc, *unit))
    },
    LogicalType::Integer { bit_width, is_signed } => w.write_field(FieldType::Struct, 10, |w| {
      w.write_struct_begin();
      w.write_field(FieldType::Byte, 1, |w| w.write_byte(*bit_width));
      w.write_bool_field(2, *is_signed);
      w.write_field_stop();
      w.write_struct_end();
    }),
    LogicalType::Unknown => w.write_field(FieldType::Struct, 11, |w| write_empty_struct(w)),
    LogicalType::Json => w.write_field(FieldType::Struct, 12, |w| write_empty_struct(w)),
    LogicalType::Bson => w.write_field(FieldType::Struct, 13, |w| write_empty_struct(w)),
    LogicalType::Uuid => w.write_field(FieldType::Struct, 14, |w| write_empty_struct(w)),
    LogicalType::Float16 => w.write_field(FieldType::Struct, 15, |w| write_empty_struct(w))
  }
  w.write_field_stop();
  w.write_struct_end();
}

// ----------------------------------------------------------------------
// Plain data structs

#[derive(Debug, Clone)]
pub struct KeyValue {
  pub key: String,
  pub value: Option<String>
}

impl KeyValue {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut key = None;
    let mut value = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => key = Some(r.read_string()?),
        2 => value = Some(r.read_string()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(KeyValue { key: key.ok_or_else(|| general_err!("KeyValue missing key"))?, value })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::Binary, 1, |w| w.write_string(&self.key));
    if let Some(ref v) = self.value {
      w.write_field(FieldType::Binary, 2, |w| w.write_string(v));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

fn read_key_value_list(r: &mut CompactProtocolReader) -> Result<Vec<KeyValue>> {
  let (_, size) = r.read_list_begin()?;
  let mut out = Vec::with_capacity(size);
  for _ in 0..size {
    out.push(KeyValue::read_from(r)?);
  }
  Ok(out)
}

fn write_key_value_list(w: &mut CompactProtocolWriter, values: &[KeyValue]) {
  w.write_list_begin(FieldType::Struct, values.len());
  for kv in values {
    kv.write_to(w);
  }
}

/// Schema node as it appears in the flat, depth-first `schema` list
/// (spec.md §4.E); `crate::schema::types` turns this list into a tree.
#[derive(Debug, Clone)]
pub struct SchemaElement {
  pub physical_type: Option<PhysicalType>,
  pub type_length: Option<i32>,
  pub repetition_type: Option<Repetition>,
  pub name: String,
  pub num_children: Option<i32>,
  pub converted_type: Option<ConvertedType>,
  pub scale: Option<i32>,
  pub precision: Option<i32>,
  pub field_id: Option<i32>,
  pub logical_type: Option<LogicalType>
}

impl SchemaElement {
  pub fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut physical_type = None;
    let mut type_length = None;
    let mut repetition_type = None;
    let mut name = None;
    let mut num_children = None;
    let mut converted_type = None;
    let mut scale = None;
    let mut precision = None;
    let mut field_id = None;
    let mut logical_type = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => physical_type = Some(physical_type_from_thrift(r.read_i32()?)?),
        2 => type_length = Some(r.read_i32()?),
        3 => repetition_type = Some(repetition_from_thrift(r.read_i32()?)?),
        4 => name = Some(r.read_string()?),
        5 => num_children = Some(r.read_i32()?),
        6 => converted_type = Some(converted_type_from_thrift(r.read_i32()?)?),
        7 => scale = Some(r.read_i32()?),
        8 => precision = Some(r.read_i32()?),
        9 => field_id = Some(r.read_i32()?),
        10 => logical_type = Some(read_logical_type(r)?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(SchemaElement {
      physical_type,
      type_length,
      repetition_type,
      name: name.ok_or_else(|| general_err!("SchemaElement missing name"))?,
      num_children,
      converted_type,
      scale,
      precision,
      field_id,
      logical_type
    })
  }

  pub fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    if let Some(t) = self.physical_type {
      w.write_field(FieldType::I32, 1, |w| w.write_i32(physical_type_to_thrift(t)));
    }
    if let Some(len) = self.type_length {
      w.write_field(FieldType::I32, 2, |w| w.write_i32(len));
    }
    if let Some(rep) = self.repetition_type {
      w.write_field(FieldType::I32, 3, |w| w.write_i32(repetition_to_thrift(rep)));
    }
    w.write_field(FieldType::Binary, 4, |w| w.write_string(&self.name));
    if let Some(n) = self.num_children {
      w.write_field(FieldType::I32, 5, |w| w.write_i32(n));
    }
    if let Some(ct) = self.converted_type {
      w.write_field(FieldType::I32, 6, |w| w.write_i32(converted_type_to_thrift(ct)));
    }
    if let Some(s) = self.scale {
      w.write_field(FieldType::I32, 7, |w| w.write_i32(s));
    }
    if let Some(p) = self.precision {
      w.write_field(FieldType::I32, 8, |w| w.write_i32(p));
    }
    if let Some(id) = self.field_id {
      w.write_field(FieldType::I32, 9, |w| w.write_i32(id));
    }
    if let Some(ref lt) = self.logical_type {
      w.write_field(FieldType::Struct, 10, |w| write_logical_type(w, lt));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct SortingColumn {
  pub column_idx: i32,
  pub descending: bool,
  pub nulls_first: bool
}

impl SortingColumn {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut column_idx = None;
    let mut descending = None;
    let mut nulls_first = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => column_idx = Some(r.read_i32()?),
        2 => descending = Some(r.read_bool()?),
        3 => nulls_first = Some(r.read_bool()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(SortingColumn {
      column_idx: column_idx.ok_or_else(|| general_err!("SortingColumn missing column_idx"))?,
      descending: descending.ok_or_else(|| general_err!("SortingColumn missing descending"))?,
      nulls_first: nulls_first.ok_or_else(|| general_err!("SortingColumn missing nulls_first"))?
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(self.column_idx));
    w.write_bool_field(2, self.descending);
    w.write_bool_field(3, self.nulls_first);
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone, Default)]
pub struct Statistics {
  pub max: Option<Vec<u8>>,
  pub min: Option<Vec<u8>>,
  pub null_count: Option<i64>,
  pub distinct_count: Option<i64>,
  pub max_value: Option<Vec<u8>>,
  pub min_value: Option<Vec<u8>>,
  pub is_max_value_exact: Option<bool>,
  pub is_min_value_exact: Option<bool>
}

impl Statistics {
  pub fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut stats = Statistics::default();
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => stats.max = Some(r.read_binary()?),
        2 => stats.min = Some(r.read_binary()?),
        3 => stats.null_count = Some(r.read_i64()?),
        4 => stats.distinct_count = Some(r.read_i64()?),
        5 => stats.max_value = Some(r.read_binary()?),
        6 => stats.min_value = Some(r.read_binary()?),
        7 => stats.is_max_value_exact = Some(r.read_bool()?),
        8 => stats.is_min_value_exact = Some(r.read_bool()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(stats)
  }

  pub fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    if let Some(ref v) = self.max {
      w.write_field(FieldType::Binary, 1, |w| w.write_binary(v));
    }
    if let Some(ref v) = self.min {
      w.write_field(FieldType::Binary, 2, |w| w.write_binary(v));
    }
    if let Some(v) = self.null_count {
      w.write_field(FieldType::I64, 3, |w| w.write_i64(v));
    }
    if let Some(v) = self.distinct_count {
      w.write_field(FieldType::I64, 4, |w| w.write_i64(v));
    }
    if let Some(ref v) = self.max_value {
      w.write_field(FieldType::Binary, 5, |w| w.write_binary(v));
    }
    if let Some(ref v) = self.min_value {
      w.write_field(FieldType::Binary, 6, |w| w.write_binary(v));
    }
    if let Some(v) = self.is_max_value_exact {
      w.write_bool_field(7, v);
    }
    if let Some(v) = self.is_min_value_exact {
      w.write_bool_field(8, v);
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
  DataPage,
  IndexPage,
  DictionaryPage,
  DataPageV2
}

fn page_type_to_thrift(t: PageType) -> i32 {
  match t {
    PageType::DataPage => 0,
    PageType::IndexPage => 1,
    PageType::DictionaryPage => 2,
    PageType::DataPageV2 => 3
  }
}

fn page_type_from_thrift(code: i32) -> Result<PageType> {
  match code {
    0 => Ok(PageType::DataPage),
    1 => Ok(PageType::IndexPage),
    2 => Ok(PageType::DictionaryPage),
    3 => Ok(PageType::DataPageV2),
    other => Err(general_err!("unknown page type code {}", other))
  }
}

#[derive(Debug, Clone)]
pub struct DataPageHeader {
  pub num_values: i32,
  pub encoding: Encoding,
  pub definition_level_encoding: Encoding,
  pub repetition_level_encoding: Encoding,
  pub statistics: Option<Statistics>
}

impl DataPageHeader {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut num_values = None;
    let mut encoding = None;
    let mut def_enc = None;
    let mut rep_enc = None;
    let mut statistics = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => num_values = Some(r.read_i32()?),
        2 => encoding = Some(encoding_from_thrift(r.read_i32()?)?),
        3 => def_enc = Some(encoding_from_thrift(r.read_i32()?)?),
        4 => rep_enc = Some(encoding_from_thrift(r.read_i32()?)?),
        5 => statistics = Some(Statistics::read_from(r)?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(DataPageHeader {
      num_values: num_values.ok_or_else(|| general_err!("DataPageHeader missing num_values"))?,
      encoding: encoding.ok_or_else(|| general_err!("DataPageHeader missing encoding"))?,
      definition_level_encoding: def_enc.ok_or_else(|| general_err!("DataPageHeader missing definition_level_encoding"))?,
      repetition_level_encoding: rep_enc.ok_or_else(|| general_err!("DataPageHeader missing repetition_level_encoding"))?,
      statistics
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(self.num_values));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(encoding_to_thrift(self.encoding)));
    w.write_field(FieldType::I32, 3, |w| w.write_i32(encoding_to_thrift(self.definition_level_encoding)));
    w.write_field(FieldType::I32, 4, |w| w.write_i32(encoding_to_thrift(self.repetition_level_encoding)));
    if let Some(ref s) = self.statistics {
      w.write_field(FieldType::Struct, 5, |w| s.write_to(w));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct DictionaryPageHeader {
  pub num_values: i32,
  pub encoding: Encoding,
  pub is_sorted: Option<bool>
}

impl DictionaryPageHeader {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut num_values = None;
    let mut encoding = None;
    let mut is_sorted = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => num_values = Some(r.read_i32()?),
        2 => encoding = Some(encoding_from_thrift(r.read_i32()?)?),
        3 => is_sorted = Some(r.read_bool()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(DictionaryPageHeader {
      num_values: num_values.ok_or_else(|| general_err!("DictionaryPageHeader missing num_values"))?,
      encoding: encoding.ok_or_else(|| general_err!("DictionaryPageHeader missing encoding"))?,
      is_sorted
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(self.num_values));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(encoding_to_thrift(self.encoding)));
    if let Some(v) = self.is_sorted {
      w.write_bool_field(3, v);
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct DataPageHeaderV2 {
  pub num_values: i32,
  pub num_nulls: i32,
  pub num_rows: i32,
  pub encoding: Encoding,
  pub definition_levels_byte_length: i32,
  pub repetition_levels_byte_length: i32,
  pub is_compressed: bool,
  pub statistics: Option<Statistics>
}

impl DataPageHeaderV2 {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut num_values = None;
    let mut num_nulls = None;
    let mut num_rows = None;
    let mut encoding = None;
    let mut def_len = None;
    let mut rep_len = None;
    let mut is_compressed = true; // default per Parquet format spec
    let mut statistics = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => num_values = Some(r.read_i32()?),
        2 => num_nulls = Some(r.read_i32()?),
        3 => num_rows = Some(r.read_i32()?),
        4 => encoding = Some(encoding_from_thrift(r.read_i32()?)?),
        5 => def_len = Some(r.read_i32()?),
        6 => rep_len = Some(r.read_i32()?),
        7 => is_compressed = r.read_bool()?,
        8 => statistics = Some(Statistics::read_from(r)?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(DataPageHeaderV2 {
      num_values: num_values.ok_or_else(|| general_err!("DataPageHeaderV2 missing num_values"))?,
      num_nulls: num_nulls.ok_or_else(|| general_err!("DataPageHeaderV2 missing num_nulls"))?,
      num_rows: num_rows.ok_or_else(|| general_err!("DataPageHeaderV2 missing num_rows"))?,
      encoding: encoding.ok_or_else(|| general_err!("DataPageHeaderV2 missing encoding"))?,
      definition_levels_byte_length: def_len.ok_or_else(|| general_err!("DataPageHeaderV2 missing definition_levels_byte_length"))?,
      repetition_levels_byte_length: rep_len.ok_or_else(|| general_err!("DataPageHeaderV2 missing repetition_levels_byte_length"))?,
      is_compressed,
      statistics
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(self.num_values));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(self.num_nulls));
    w.write_field(FieldType::I32, 3, |w| w.write_i32(self.num_rows));
    w.write_field(FieldType::I32, 4, |w| w.write_i32(encoding_to_thrift(self.encoding)));
    w.write_field(FieldType::I32, 5, |w| w.write_i32(self.definition_levels_byte_length));
    w.write_field(FieldType::I32, 6, |w| w.write_i32(self.repetition_levels_byte_length));
    w.write_bool_field(7, self.is_compressed);
    if let Some(ref s) = self.statistics {
      w.write_field(FieldType::Struct, 8, |w| s.write_to(w));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct PageHeader {
  pub page_type: PageType,
  pub uncompressed_page_size: i32,
  pub compressed_page_size: i32,
  pub crc: Option<i32>,
  pub data_page_header: Option<DataPageHeader>,
  pub dictionary_page_header: Option<DictionaryPageHeader>,
  pub data_page_header_v2: Option<DataPageHeaderV2>
}

impl PageHeader {
  pub fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut page_type = None;
    let mut uncompressed_page_size = None;
    let mut compressed_page_size = None;
    let mut crc = None;
    let mut data_page_header = None;
    let mut dictionary_page_header = None;
    let mut data_page_header_v2 = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => page_type = Some(page_type_from_thrift(r.read_i32()?)?),
        2 => uncompressed_page_size = Some(r.read_i32()?),
        3 => compressed_page_size = Some(r.read_i32()?),
        4 => crc = Some(r.read_i32()?),
        5 => data_page_header = Some(DataPageHeader::read_from(r)?),
        7 => dictionary_page_header = Some(DictionaryPageHeader::read_from(r)?),
        8 => data_page_header_v2 = Some(DataPageHeaderV2::read_from(r)?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(PageHeader {
      page_type: page_type.ok_or_else(|| general_err!("PageHeader missing type"))?,
      uncompressed_page_size: uncompressed_page_size.ok_or_else(|| general_err!("PageHeader missing uncompressed_page_size"))?,
      compressed_page_size: compressed_page_size.ok_or_else(|| general_err!("PageHeader missing compressed_page_size"))?,
      crc,
      data_page_header,
      dictionary_page_header,
      data_page_header_v2
    })
  }

  pub fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(page_type_to_thrift(self.page_type)));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(self.uncompressed_page_size));
    w.write_field(FieldType::I32, 3, |w| w.write_i32(self.compressed_page_size));
    if let Some(v) = self.crc {
      w.write_field(FieldType::I32, 4, |w| w.write_i32(v));
    }
    if let Some(ref h) = self.data_page_header {
      w.write_field(FieldType::Struct, 5, |w| h.write_to(w));
    }
    if let Some(ref h) = self.dictionary_page_header {
      w.write_field(FieldType::Struct, 7, |w| h.write_to(w));
    }
    if let Some(ref h) = self.data_page_header_v2 {
      w.write_field(FieldType::Struct, 8, |w| h.write_to(w));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct PageEncodingStats {
  pub page_type: PageType,
  pub encoding: Encoding,
  pub count: i32
}

impl PageEncodingStats {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut page_type = None;
    let mut encoding = None;
    let mut count = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => page_type = Some(page_type_from_thrift(r.read_i32()?)?),
        2 => encoding = Some(encoding_from_thrift(r.read_i32()?)?),
        3 => count = Some(r.read_i32()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(PageEncodingStats {
      page_type: page_type.ok_or_else(|| general_err!("PageEncodingStats missing page_type"))?,
      encoding: encoding.ok_or_else(|| general_err!("PageEncodingStats missing encoding"))?,
      count: count.ok_or_else(|| general_err!("PageEncodingStats missing count"))?
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(page_type_to_thrift(self.page_type)));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(encoding_to_thrift(self.encoding)));
    w.write_field(FieldType::I32, 3, |w| w.write_i32(self.count));
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct ColumnMetaData {
  pub physical_type: PhysicalType,
  pub encodings: Vec<Encoding>,
  pub path_in_schema: Vec<String>,
  pub codec: Compression,
  pub num_values: i64,
  pub total_uncompressed_size: i64,
  pub total_compressed_size: i64,
  pub key_value_metadata: Option<Vec<KeyValue>>,
  pub data_page_offset: i64,
  pub index_page_offset: Option<i64>,
  pub dictionary_page_offset: Option<i64>,
  pub statistics: Option<Statistics>,
  pub encoding_stats: Option<Vec<PageEncodingStats>>,
  pub bloom_filter_offset: Option<i64>,
  pub bloom_filter_length: Option<i32>
}

impl ColumnMetaData {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut physical_type = None;
    let mut encodings = None;
    let mut path_in_schema = None;
    let mut codec = None;
    let mut num_values = None;
    let mut total_uncompressed_size = None;
    let mut total_compressed_size = None;
    let mut key_value_metadata = None;
    let mut data_page_offset = None;
    let mut index_page_offset = None;
    let mut dictionary_page_offset = None;
    let mut statistics = None;
    let mut encoding_stats = None;
    let mut bloom_filter_offset = None;
    let mut bloom_filter_length = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => physical_type = Some(physical_type_from_thrift(r.read_i32()?)?),
        2 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(encoding_from_thrift(r.read_i32()?)?);
          }
          encodings = Some(v);
        },
        3 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(r.read_string()?);
          }
          path_in_schema = Some(v);
        },
        4 => codec = Some(compression_from_thrift(r.read_i32()?)?),
        5 => num_values = Some(r.read_i64()?),
        6 => total_uncompressed_size = Some(r.read_i64()?),
        7 => total_compressed_size = Some(r.read_i64()?),
        8 => key_value_metadata = Some(read_key_value_list(r)?),
        9 => data_page_offset = Some(r.read_i64()?),
        10 => index_page_offset = Some(r.read_i64()?),
        11 => dictionary_page_offset = Some(r.read_i64()?),
        12 => statistics = Some(Statistics::read_from(r)?),
        13 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(PageEncodingStats::read_from(r)?);
          }
          encoding_stats = Some(v);
        },
        14 => bloom_filter_offset = Some(r.read_i64()?),
        15 => bloom_filter_length = Some(r.read_i32()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(ColumnMetaData {
      physical_type: physical_type.ok_or_else(|| general_err!("ColumnMetaData missing type"))?,
      encodings: encodings.ok_or_else(|| general_err!("ColumnMetaData missing encodings"))?,
      path_in_schema: path_in_schema.ok_or_else(|| general_err!("ColumnMetaData missing path_in_schema"))?,
      codec: codec.ok_or_else(|| general_err!("ColumnMetaData missing codec"))?,
      num_values: num_values.ok_or_else(|| general_err!("ColumnMetaData missing num_values"))?,
      total_uncompressed_size: total_uncompressed_size
        .ok_or_else(|| general_err!("ColumnMetaData missing total_uncompressed_size"))?,
      total_compressed_size: total_compressed_size
        .ok_or_else(|| general_err!("ColumnMetaData missing total_compressed_size"))?,
      key_value_metadata,
      data_page_offset: data_page_offset.ok_or_else(|| general_err!("ColumnMetaData missing data_page_offset"))?,
      index_page_offset,
      dictionary_page_offset,
      statistics,
      encoding_stats,
      bloom_filter_offset,
      bloom_filter_length
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(physical_type_to_thrift(self.physical_type)));
    w.write_field(FieldType::List, 2, |w| {
      w.write_list_begin(FieldType::I32, self.encodings.len());
      for e in &self.encodings {
        w.write_i32(encoding_to_thrift(*e));
      }
    });
    w.write_field(FieldType::List, 3, |w| {
      w.write_list_begin(FieldType::Binary, self.path_in_schema.len());
      for p in &self.path_in_schema {
        w.write_string(p);
      }
    });
    w.write_field(FieldType::I32, 4, |w| w.write_i32(compression_to_thrift(self.codec)));
    w.write_field(FieldType::I64, 5, |w| w.write_i64(self.num_values));
    w.write_field(FieldType::I64, 6, |w| w.write_i64(self.total_uncompressed_size));
    w.write_field(FieldType::I64, 7, |w| w.write_i64(self.total_compressed_size));
    if let Some(ref kv) = self.key_value_metadata {
      w.write_field(FieldType::List, 8, |w| write_key_value_list(w, kv));
    }
    w.write_field(FieldType::I64, 9, |w| w.write_i64(self.data_page_offset));
    if let Some(v) = self.index_page_offset {
      w.write_field(FieldType::I64, 10, |w| w.write_i64(v));
    }
    if let Some(v) = self.dictionary_page_offset {
      w.write_field(FieldType::I64, 11, |w| w.write_i64(v));
    }
    if let Some(ref s) = self.statistics {
      w.write_field(FieldType::Struct, 12, |w| s.write_to(w));
    }
    if let Some(ref stats) = self.encoding_stats {
      w.write_field(FieldType::List, 13, |w| {
        w.write_list_begin(FieldType::Struct, stats.len());
        for s in stats {
          s.write_to(w);
        }
      });
    }
    if let Some(v) = self.bloom_filter_offset {
      w.write_field(FieldType::I64, 14, |w| w.write_i64(v));
    }
    if let Some(v) = self.bloom_filter_length {
      w.write_field(FieldType::I32, 15, |w| w.write_i32(v));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct ColumnChunk {
  pub file_path: Option<String>,
  pub file_offset: i64,
  pub meta_data: Option<ColumnMetaData>,
  pub offset_index_offset: Option<i64>,
  pub offset_index_length: Option<i32>,
  pub column_index_offset: Option<i64>,
  pub column_index_length: Option<i32>
}

impl ColumnChunk {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut file_path = None;
    let mut file_offset = None;
    let mut meta_data = None;
    let mut offset_index_offset = None;
    let mut offset_index_length = None;
    let mut column_index_offset = None;
    let mut column_index_length = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => file_path = Some(r.read_string()?),
        2 => file_offset = Some(r.read_i64()?),
        3 => meta_data = Some(ColumnMetaData::read_from(r)?),
        4 => offset_index_offset = Some(r.read_i64()?),
        5 => offset_index_length = Some(r.read_i32()?),
        6 => column_index_offset = Some(r.read_i64()?),
        7 => column_index_length = Some(r.read_i32()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(ColumnChunk {
      file_path,
      file_offset: file_offset.ok_or_else(|| general_err!("ColumnChunk missing file_offset"))?,
      meta_data,
      offset_index_offset,
      offset_index_length,
      column_index_offset,
      column_index_length
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    if let Some(ref p) = self.file_path {
      w.write_field(FieldType::Binary, 1, |w| w.write_string(p));
    }
    w.write_field(FieldType::I64, 2, |w| w.write_i64(self.file_offset));
    if let Some(ref m) = self.meta_data {
      w.write_field(FieldType::Struct, 3, |w| m.write_to(w));
    }
    if let Some(v) = self.offset_index_offset {
      w.write_field(FieldType::I64, 4, |w| w.write_i64(v));
    }
    if let Some(v) = self.offset_index_length {
      w.write_field(FieldType::I32, 5, |w| w.write_i32(v));
    }
    if let Some(v) = self.column_index_offset {
      w.write_field(FieldType::I64, 6, |w| w.write_i64(v));
    }
    if let Some(v) = self.column_index_length {
      w.write_field(FieldType::I32, 7, |w| w.write_i32(v));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[derive(Debug, Clone)]
pub struct RowGroup {
  pub columns: Vec<ColumnChunk>,
  pub total_byte_size: i64,
  pub num_rows: i64,
  pub sorting_columns: Option<Vec<SortingColumn>>,
  pub file_offset: Option<i64>,
  pub total_compressed_size: Option<i64>,
  pub ordinal: Option<i16>
}

impl RowGroup {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut columns = None;
    let mut total_byte_size = None;
    let mut num_rows = None;
    let mut sorting_columns = None;
    let mut file_offset = None;
    let mut total_compressed_size = None;
    let mut ordinal = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(ColumnChunk::read_from(r)?);
          }
          columns = Some(v);
        },
        2 => total_byte_size = Some(r.read_i64()?),
        3 => num_rows = Some(r.read_i64()?),
        4 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(SortingColumn::read_from(r)?);
          }
          sorting_columns = Some(v);
        },
        5 => file_offset = Some(r.read_i64()?),
        6 => total_compressed_size = Some(r.read_i64()?),
        7 => ordinal = Some(r.read_i16()?),
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(RowGroup {
      columns: columns.ok_or_else(|| general_err!("RowGroup missing columns"))?,
      total_byte_size: total_byte_size.ok_or_else(|| general_err!("RowGroup missing total_byte_size"))?,
      num_rows: num_rows.ok_or_else(|| general_err!("RowGroup missing num_rows"))?,
      sorting_columns,
      file_offset,
      total_compressed_size,
      ordinal
    })
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::List, 1, |w| {
      w.write_list_begin(FieldType::Struct, self.columns.len());
      for c in &self.columns {
        c.write_to(w);
      }
    });
    w.write_field(FieldType::I64, 2, |w| w.write_i64(self.total_byte_size));
    w.write_field(FieldType::I64, 3, |w| w.write_i64(self.num_rows));
    if let Some(ref sc) = self.sorting_columns {
      w.write_field(FieldType::List, 4, |w| {
        w.write_list_begin(FieldType::Struct, sc.len());
        for s in sc {
          s.write_to(w);
        }
      });
    }
    if let Some(v) = self.file_offset {
      w.write_field(FieldType::I64, 5, |w| w.write_i64(v));
    }
    if let Some(v) = self.total_compressed_size {
      w.write_field(FieldType::I64, 6, |w| w.write_i64(v));
    }
    if let Some(v) = self.ordinal {
      w.write_field(FieldType::I16, 7, |w| w.write_i16(v));
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

/// `union ColumnOrder { 1: TypeDefinedOrder TYPE_ORDER }`. Only the
/// type-defined variant exists on the wire today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
  TypeDefinedOrder
}

impl ColumnOrder {
  fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut result = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => {
          read_empty_struct(r)?;
          result = Some(ColumnOrder::TypeDefinedOrder);
        },
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    result.ok_or_else(|| general_err!("ColumnOrder union had no recognized variant set"))
  }

  fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    match self {
      ColumnOrder::TypeDefinedOrder => w.write_field(FieldType::Struct, 1, |w| write_empty_struct(w))
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

/// The Thrift-Compact-serialized footer struct (spec.md §4.D).
#[derive(Debug, Clone)]
pub struct FileMetaData {
  pub version: i32,
  pub schema: Vec<SchemaElement>,
  pub num_rows: i64,
  pub row_groups: Vec<RowGroup>,
  pub key_value_metadata: Option<Vec<KeyValue>>,
  pub created_by: Option<String>,
  pub column_orders: Option<Vec<ColumnOrder>>
}

impl FileMetaData {
  pub fn read_from(r: &mut CompactProtocolReader) -> Result<Self> {
    r.read_struct_begin()?;
    let mut version = None;
    let mut schema = None;
    let mut num_rows = None;
    let mut row_groups = None;
    let mut key_value_metadata = None;
    let mut created_by = None;
    let mut column_orders = None;
    loop {
      let field = r.read_field_begin()?;
      if field.field_type == FieldType::Stop {
        break;
      }
      match field.id {
        1 => version = Some(r.read_i32()?),
        2 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(SchemaElement::read_from(r)?);
          }
          schema = Some(v);
        },
        3 => num_rows = Some(r.read_i64()?),
        4 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(RowGroup::read_from(r)?);
          }
          row_groups = Some(v);
        },
        5 => key_value_metadata = Some(read_key_value_list(r)?),
        6 => created_by = Some(r.read_string()?),
        7 => {
          let (_, size) = r.read_list_begin()?;
          let mut v = Vec::with_capacity(size);
          for _ in 0..size {
            v.push(ColumnOrder::read_from(r)?);
          }
          column_orders = Some(v);
        },
        _ => r.skip(field.field_type)?
      }
    }
    r.read_struct_end()?;
    Ok(FileMetaData {
      version: version.ok_or_else(|| general_err!("FileMetaData missing version"))?,
      schema: {
        let schema = schema.ok_or_else(|| general_err!("FileMetaData missing schema"))?;
        if schema.is_empty() {
          return Err(schema_err!("flat schema list is empty"));
        }
        schema
      },
      num_rows: num_rows.ok_or_else(|| general_err!("FileMetaData missing num_rows"))?,
      row_groups: row_groups.ok_or_else(|| general_err!("FileMetaData missing row_groups"))?,
      key_value_metadata,
      created_by,
      column_orders
    })
  }

  pub fn write_to(&self, w: &mut CompactProtocolWriter) {
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(self.version));
    w.write_field(FieldType::List, 2, |w| {
      w.write_list_begin(FieldType::Struct, self.schema.len());
      for s in &self.schema {
        s.write_to(w);
      }
    });
    w.write_field(FieldType::I64, 3, |w| w.write_i64(self.num_rows));
    w.write_field(FieldType::List, 4, |w| {
      w.write_list_begin(FieldType::Struct, self.row_groups.len());
      for rg in &self.row_groups {
        rg.write_to(w);
      }
    });
    if let Some(ref kv) = self.key_value_metadata {
      w.write_field(FieldType::List, 5, |w| write_key_value_list(w, kv));
    }
    if let Some(ref cb) = self.created_by {
      w.write_field(FieldType::Binary, 6, |w| w.write_string(cb));
    }
    if let Some(ref orders) = self.column_orders {
      w.write_field(FieldType::List, 7, |w| {
        w.write_list_begin(FieldType::Struct, orders.len());
        for o in orders {
          o.write_to(w);
        }
      });
    }
    w.write_field_stop();
    w.write_struct_end();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::Type as BasicType;

  #[test]
  fn test_logical_type_decimal_roundtrip() {
    let lt = LogicalType::Decimal { scale: 2, precision: 9 };
    let mut w = CompactProtocolWriter::new();
    write_logical_type(&mut w, &lt);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    assert_eq!(read_logical_type(&mut r).unwrap(), lt);
  }

  #[test]
  fn test_logical_type_timestamp_roundtrip() {
    let lt = LogicalType::Timestamp { is_adjusted_to_utc: true, unit: TimeUnit::MICROS };
    let mut w = CompactProtocolWriter::new();
    write_logical_type(&mut w, &lt);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    assert_eq!(read_logical_type(&mut r).unwrap(), lt);
  }

  #[test]
  fn test_schema_element_roundtrip() {
    let elem = SchemaElement {
      physical_type: Some(BasicType::INT32),
      type_length: None,
      repetition_type: Some(Repetition::REQUIRED),
      name: "a".to_string(),
      num_children: None,
      converted_type: Some(ConvertedType::INT_32),
      scale: None,
      precision: None,
      field_id: Some(5),
      logical_type: Some(LogicalType::Integer { bit_width: 32, is_signed: true })
    };
    let mut w = CompactProtocolWriter::new();
    elem.write_to(&mut w);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let decoded = SchemaElement::read_from(&mut r).unwrap();
    assert_eq!(decoded.name, "a");
    assert_eq!(decoded.physical_type, Some(BasicType::INT32));
    assert_eq!(decoded.repetition_type, Some(Repetition::REQUIRED));
    assert_eq!(decoded.field_id, Some(5));
    assert_eq!(decoded.logical_type, Some(LogicalType::Integer { bit_width: 32, is_signed: true }));
  }

  #[test]
  fn test_statistics_roundtrip() {
    let stats = Statistics {
      max: None,
      min: None,
      null_count: Some(3),
      distinct_count: Some(10),
      max_value: Some(vec![9, 9]),
      min_value: Some(vec![0, 0]),
      is_max_value_exact: Some(true),
      is_min_value_exact: None
    };
    let mut w = CompactProtocolWriter::new();
    stats.write_to(&mut w);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let decoded = Statistics::read_from(&mut r).unwrap();
    assert_eq!(decoded.null_count, Some(3));
    assert_eq!(decoded.max_value, Some(vec![9, 9]));
    assert_eq!(decoded.is_max_value_exact, Some(true));
    assert_eq!(decoded.is_min_value_exact, None);
  }

  #[test]
  fn test_page_header_data_page_roundtrip() {
    let header = PageHeader {
      page_type: PageType::DataPage,
      uncompressed_page_size: 128,
      compressed_page_size: 64,
      crc: None,
      data_page_header: Some(DataPageHeader {
        num_values: 10,
        encoding: Encoding::PLAIN,
        definition_level_encoding: Encoding::RLE,
        repetition_level_encoding: Encoding::RLE,
        statistics: None
      }),
      dictionary_page_header: None,
      data_page_header_v2: None
    };
    let mut w = CompactProtocolWriter::new();
    header.write_to(&mut w);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let decoded = PageHeader::read_from(&mut r).unwrap();
    assert_eq!(decoded.page_type, PageType::DataPage);
    assert_eq!(decoded.uncompressed_page_size, 128);
    assert_eq!(decoded.compressed_page_size, 64);
    let dph = decoded.data_page_header.unwrap();
    assert_eq!(dph.num_values, 10);
    assert_eq!(dph.encoding, Encoding::PLAIN);
  }

  #[test]
  fn test_file_metadata_roundtrip() {
    let schema = vec![
      SchemaElement {
        physical_type: None,
        type_length: None,
        repetition_type: None,
        name: "schema".to_string(),
        num_children: Some(1),
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None
      },
      SchemaElement {
        physical_type: Some(BasicType::INT64),
        type_length: None,
        repetition_type: Some(Repetition::REQUIRED),
        name: "id".to_string(),
        num_children: None,
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None
      },
    ];
    let row_group = RowGroup {
      columns: vec![],
      total_byte_size: 0,
      num_rows: 0,
      sorting_columns: None,
      file_offset: None,
      total_compressed_size: None,
      ordinal: Some(0)
    };
    let meta = FileMetaData {
      version: 1,
      schema,
      num_rows: 42,
      row_groups: vec![row_group],
      key_value_metadata: Some(vec![KeyValue { key: "k".to_string(), value: Some("v".to_string()) }]),
      created_by: Some("test-writer".to_string()),
      column_orders: None
    };
    let mut w = CompactProtocolWriter::new();
    meta.write_to(&mut w);
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let decoded = FileMetaData::read_from(&mut r).unwrap();
    assert_eq!(decoded.version, 1);
    assert_eq!(decoded.num_rows, 42);
    assert_eq!(decoded.schema.len(), 2);
    assert_eq!(decoded.schema[1].name, "id");
    assert_eq!(decoded.created_by, Some("test-writer".to_string()));
    assert_eq!(decoded.row_groups.len(), 1);
  }

  #[test]
  fn test_unknown_field_id_is_skipped() {
    // Hand-build a struct with an unknown field id 50 before a known one.
    let mut w = CompactProtocolWriter::new();
    w.write_struct_begin();
    w.write_field(FieldType::Binary, 50, |w| w.write_binary(b"future extension"));
    w.write_field(FieldType::Binary, 4, |w| w.write_string("name-survives"));
    w.write_field_stop();
    w.write_struct_end();
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let decoded = SchemaElement::read_from(&mut r).unwrap();
    assert_eq!(decoded.name, "name-survives");
  }
}
