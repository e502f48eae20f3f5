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

//! The reconstructed, nested value model: [`Row`] at the top and [`Field`]
//! for everything under it. A `Field` is a sum type with one arm per
//! schema shape (primitive, list, map, group) rather than a flat enum of
//! converted-type variants, so a caller matches on structure instead of on
//! annotation.

use std::fmt;

use crate::basic::{ConvertedType, LogicalType};
use crate::data_type::{ByteArray, Int96};

/// A reconstructed top-level record: an ordered list of named fields,
/// mirroring the root group's children in schema order.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
  fields: Vec<(String, Field)>
}

impl Row {
  pub fn new(fields: Vec<(String, Field)>) -> Self {
    Row { fields }
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn get(&self, name: &str) -> Option<&Field> {
    self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
  }

  /// Fields in schema order, as `(name, value)` pairs.
  pub fn fields(&self) -> impl Iterator<Item = &(String, Field)> {
    self.fields.iter()
  }
}

impl fmt::Display for Row {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (name, value)) in self.fields.iter().enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{}: {}", name, value)?;
    }
    write!(f, "}}")
  }
}

/// A reconstructed value. `List`/`Map`/`Group` carry `None` for a null
/// collection/struct and `Some(vec![])` for a present-but-empty one — the
/// same null/empty distinction the level model preserves on the wire
/// (spec.md §4.F).
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
  Null,
  Bool(bool),
  Byte(i8),
  Short(i16),
  Int(i32),
  Long(i64),
  UByte(u8),
  UShort(u16),
  UInt(u32),
  ULong(u64),
  Float(f32),
  Double(f64),
  Str(String),
  Bytes(ByteArray),
  Decimal { unscaled: ByteArray, scale: i32, precision: i32 },
  TimestampMillis(i64),
  TimestampMicros(i64),
  Date(i32),
  Group(Row),
  List(Option<Vec<Field>>),
  Map(Option<Vec<(Field, Field)>>)
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Field::Null => write!(f, "null"),
      Field::Bool(v) => write!(f, "{}", v),
      Field::Byte(v) => write!(f, "{}", v),
      Field::Short(v) => write!(f, "{}", v),
      Field::Int(v) => write!(f, "{}", v),
      Field::Long(v) => write!(f, "{}", v),
      Field::UByte(v) => write!(f, "{}", v),
      Field::UShort(v) => write!(f, "{}", v),
      Field::UInt(v) => write!(f, "{}", v),
      Field::ULong(v) => write!(f, "{}", v),
      Field::Float(v) => write!(f, "{}", v),
      Field::Double(v) => write!(f, "{}", v),
      Field::Str(v) => write!(f, "\"{}\"", v),
      Field::Bytes(v) => write!(f, "{}", v),
      Field::Decimal { unscaled, scale, .. } => write!(f, "{}e-{}", unscaled, scale),
      Field::TimestampMillis(v) | Field::TimestampMicros(v) => write!(f, "{}", v),
      Field::Date(v) => write!(f, "{}", v),
      Field::Group(row) => write!(f, "{}", row),
      Field::List(None) | Field::Map(None) => write!(f, "null"),
      Field::List(Some(values)) => {
        write!(f, "[")?;
        for (i, v) in values.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", v)?;
        }
        write!(f, "]")
      }
      Field::Map(Some(entries)) => {
        write!(f, "{{")?;
        for (i, (k, v)) in entries.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
      }
    }
  }
}

/// Resolves a leaf's converted/logical type annotation, preferring
/// [`LogicalType`] when both are present (spec.md §9 open question).
fn effective_converted_type(
  converted_type: Option<ConvertedType>,
  logical_type: &Option<LogicalType>
) -> Option<ConvertedType> {
  match logical_type {
    Some(lt) => lt.to_converted_type().or(converted_type),
    None => converted_type
  }
}

/// Converts a decoded `bool` leaf value into a `Field`. `bool` has no
/// converted-type annotations, so the physical value passes straight
/// through.
pub fn convert_bool(value: bool) -> Field {
  Field::Bool(value)
}

/// Converts a decoded `i32` leaf value, applying `INT_8`/`INT_16`/`UINT_*`/
/// `DATE` narrowing when a converted type says to.
pub fn convert_int32(
  converted_type: Option<ConvertedType>,
  logical_type: &Option<LogicalType>,
  value: i32
) -> Field {
  match effective_converted_type(converted_type, logical_type) {
    Some(ConvertedType::INT_8) => Field::Byte(value as i8),
    Some(ConvertedType::INT_16) => Field::Short(value as i16),
    Some(ConvertedType::UINT_8) => Field::UByte(value as u8),
    Some(ConvertedType::UINT_16) => Field::UShort(value as u16),
    Some(ConvertedType::UINT_32) => Field::UInt(value as u32),
    Some(ConvertedType::DATE) => Field::Date(value),
    _ => Field::Int(value)
  }
}

/// Converts a decoded `i64` leaf value, applying `UINT_64`/`TIMESTAMP_*`
/// narrowing when a converted type says to.
pub fn convert_int64(
  converted_type: Option<ConvertedType>,
  logical_type: &Option<LogicalType>,
  value: i64
) -> Field {
  match effective_converted_type(converted_type, logical_type) {
    Some(ConvertedType::UINT_64) => Field::ULong(value as u64),
    Some(ConvertedType::TIMESTAMP_MILLIS) => Field::TimestampMillis(value),
    Some(ConvertedType::TIMESTAMP_MICROS) => Field::TimestampMicros(value),
    _ => Field::Long(value)
  }
}

/// `INT96` carries no converted-type annotation this core interprets
/// (spec.md §9 open question: left as opaque bytes rather than a Julian
/// timestamp decode).
pub fn convert_int96(value: Int96) -> Field {
  Field::Bytes(ByteArray::from(
    value.data().iter().flat_map(|w| w.to_le_bytes().to_vec()).collect::<Vec<u8>>()
  ))
}

pub fn convert_float(value: f32) -> Field {
  Field::Float(value)
}

pub fn convert_double(value: f64) -> Field {
  Field::Double(value)
}

/// Converts a decoded byte-array leaf value. `STRING`/`ENUM`/`JSON` read
/// as UTF-8 (lossily — malformed bytes are replaced rather than rejected,
/// since UTF-8 validation is explicitly out of scope beyond the `STRING`
/// logical type, per spec.md §8); `DECIMAL` keeps the unscaled bytes
/// alongside scale/precision; everything else stays raw bytes.
pub fn convert_byte_array(
  converted_type: Option<ConvertedType>,
  logical_type: &Option<LogicalType>,
  value: ByteArray
) -> Field {
  match (effective_converted_type(converted_type, logical_type), logical_type) {
    (Some(ConvertedType::UTF8), _) | (Some(ConvertedType::ENUM), _) | (Some(ConvertedType::JSON), _) => {
      Field::Str(String::from_utf8_lossy(value.data()).into_owned())
    }
    (Some(ConvertedType::DECIMAL), _) | (_, Some(LogicalType::Decimal { .. })) => {
      let (scale, precision) = match logical_type {
        Some(LogicalType::Decimal { scale, precision }) => (*scale, *precision),
        _ => (0, 0)
      };
      Field::Decimal { unscaled: value, scale, precision }
    }
    _ => Field::Bytes(value)
  }
}

/// `FIXED_LEN_BYTE_ARRAY` shares the byte-array leaf's converted-type
/// handling (`UUID`/plain fixed binary have no narrowing beyond what
/// [`convert_byte_array`] already applies).
pub fn convert_fixed_len_byte_array(
  converted_type: Option<ConvertedType>,
  logical_type: &Option<LogicalType>,
  value: ByteArray
) -> Field {
  convert_byte_array(converted_type, logical_type, value)
}

/// Narrows a reconstructed [`Field`] back down to the `bool` physical
/// value a writer's column buffer stores, the inverse of
/// [`convert_bool`].
pub fn field_to_bool(field: &Field) -> crate::errors::Result<bool> {
  match field {
    Field::Bool(v) => Ok(*v),
    _ => Err(general_err!("expected a bool value, found {}", field))
  }
}

/// Widens any of the `i32`-physical-type `Field` arms (`Byte`, `Short`,
/// `UByte`, `UShort`, `UInt`, `Date`, plain `Int`) back to the raw `i32`
/// a writer's column buffer stores, the inverse of [`convert_int32`].
pub fn field_to_i32(field: &Field) -> crate::errors::Result<i32> {
  match field {
    Field::Int(v) => Ok(*v),
    Field::Byte(v) => Ok(*v as i32),
    Field::Short(v) => Ok(*v as i32),
    Field::UByte(v) => Ok(*v as i32),
    Field::UShort(v) => Ok(*v as i32),
    Field::UInt(v) => Ok(*v as i32),
    Field::Date(v) => Ok(*v),
    _ => Err(general_err!("expected an int32-backed value, found {}", field))
  }
}

/// Widens any of the `i64`-physical-type `Field` arms (`Long`, `ULong`,
/// `TimestampMillis`, `TimestampMicros`) back to the raw `i64` a writer's
/// column buffer stores, the inverse of [`convert_int64`].
pub fn field_to_i64(field: &Field) -> crate::errors::Result<i64> {
  match field {
    Field::Long(v) => Ok(*v),
    Field::ULong(v) => Ok(*v as i64),
    Field::TimestampMillis(v) | Field::TimestampMicros(v) => Ok(*v),
    _ => Err(general_err!("expected an int64-backed value, found {}", field))
  }
}

/// Rebuilds the opaque `Int96` this core reads `INT96` leaves into, the
/// inverse of [`convert_int96`] (spec.md §9 open question: treated as
/// twelve opaque bytes, not a Julian-day timestamp).
pub fn field_to_int96(field: &Field) -> crate::errors::Result<Int96> {
  match field {
    Field::Bytes(v) if v.len() == 12 => {
      let bytes = v.data();
      let mut words = [0u32; 3];
      for (i, word) in words.iter_mut().enumerate() {
        *word = u32::from_le_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]]);
      }
      let mut result = Int96::new();
      result.set_data(words);
      Ok(result)
    },
    _ => Err(general_err!("expected a 12-byte int96-backed value, found {}", field))
  }
}

pub fn field_to_f32(field: &Field) -> crate::errors::Result<f32> {
  match field {
    Field::Float(v) => Ok(*v),
    _ => Err(general_err!("expected a float value, found {}", field))
  }
}

pub fn field_to_f64(field: &Field) -> crate::errors::Result<f64> {
  match field {
    Field::Double(v) => Ok(*v),
    _ => Err(general_err!("expected a double value, found {}", field))
  }
}

/// Narrows `Str`/`Bytes`/`Decimal` back to the raw byte array a writer's
/// column buffer stores, the inverse of [`convert_byte_array`]/
/// [`convert_fixed_len_byte_array`].
pub fn field_to_byte_array(field: &Field) -> crate::errors::Result<ByteArray> {
  match field {
    Field::Bytes(v) => Ok(v.clone()),
    Field::Str(v) => Ok(ByteArray::from(v.as_str())),
    Field::Decimal { unscaled, .. } => Ok(unscaled.clone()),
    _ => Err(general_err!("expected a byte-array-backed value, found {}", field))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_convert_bool() {
    assert_eq!(convert_bool(true), Field::Bool(true));
  }

  #[test]
  fn test_convert_int32_plain() {
    assert_eq!(convert_int32(None, &None, 7), Field::Int(7));
  }

  #[test]
  fn test_convert_int32_int8_narrows() {
    assert_eq!(convert_int32(Some(ConvertedType::INT_8), &None, -1), Field::Byte(-1));
  }

  #[test]
  fn test_convert_int32_logical_type_wins_over_converted_type() {
    let logical = Some(LogicalType::Integer { bit_width: 16, is_signed: true });
    assert_eq!(convert_int32(Some(ConvertedType::INT_8), &logical, 300), Field::Short(300));
  }

  #[test]
  fn test_convert_int32_date() {
    assert_eq!(convert_int32(Some(ConvertedType::DATE), &None, 18990), Field::Date(18990));
  }

  #[test]
  fn test_convert_int64_timestamp_millis() {
    let logical = Some(LogicalType::Timestamp { is_adjusted_to_utc: true, unit: crate::basic::TimeUnit::MILLIS });
    assert_eq!(convert_int64(None, &logical, 1_600_000_000_000), Field::TimestampMillis(1_600_000_000_000));
  }

  #[test]
  fn test_convert_int96_is_opaque_bytes() {
    let mut v = Int96::new();
    v.set_data([1, 2, 3]);
    match convert_int96(v) {
      Field::Bytes(b) => assert_eq!(b.len(), 12),
      other => panic!("expected Bytes, got {:?}", other)
    }
  }

  #[test]
  fn test_convert_byte_array_utf8() {
    let value = ByteArray::from("hello");
    assert_eq!(
      convert_byte_array(Some(ConvertedType::UTF8), &None, value),
      Field::Str("hello".to_string())
    );
  }

  #[test]
  fn test_convert_byte_array_plain_stays_bytes() {
    let value = ByteArray::from(vec![1u8, 2, 3]);
    assert_eq!(convert_byte_array(None, &None, value.clone()), Field::Bytes(value));
  }

  #[test]
  fn test_convert_byte_array_decimal_keeps_scale_and_precision() {
    let value = ByteArray::from(vec![0x01, 0x00]);
    let logical = Some(LogicalType::Decimal { scale: 2, precision: 5 });
    match convert_byte_array(None, &logical, value) {
      Field::Decimal { scale, precision, .. } => {
        assert_eq!(scale, 2);
        assert_eq!(precision, 5);
      }
      other => panic!("expected Decimal, got {:?}", other)
    }
  }

  #[test]
  fn test_row_get_by_name() {
    let row = Row::new(vec![("a".to_string(), Field::Int(1)), ("b".to_string(), Field::Null)]);
    assert_eq!(row.get("a"), Some(&Field::Int(1)));
    assert_eq!(row.get("missing"), None);
  }

  #[test]
  fn test_display_list_and_map() {
    let list = Field::List(Some(vec![Field::Int(1), Field::Int(2)]));
    assert_eq!(format!("{}", list), "[1, 2]");
    let map = Field::Map(Some(vec![(Field::Str("k".to_string()), Field::Int(1))]));
    assert_eq!(format!("{}", map), "{\"k\": 1}");
    assert_eq!(format!("{}", Field::List(None)), "null");
  }

  #[test]
  fn test_field_to_i32_widens_narrowed_arms() {
    assert_eq!(field_to_i32(&Field::Byte(-1)).unwrap(), -1);
    assert_eq!(field_to_i32(&Field::UShort(40000)).unwrap(), 40000);
    assert_eq!(field_to_i32(&Field::Date(18990)).unwrap(), 18990);
  }

  #[test]
  fn test_field_to_i32_rejects_mismatched_arm() {
    assert!(field_to_i32(&Field::Long(1)).is_err());
  }

  #[test]
  fn test_field_to_i64_widens_narrowed_arms() {
    assert_eq!(field_to_i64(&Field::ULong(1)).unwrap(), 1);
    assert_eq!(field_to_i64(&Field::TimestampMicros(99)).unwrap(), 99);
  }

  #[test]
  fn test_field_to_int96_round_trips_through_convert_int96() {
    let mut v = Int96::new();
    v.set_data([1, 2, 3]);
    let field = convert_int96(v.clone());
    assert_eq!(field_to_int96(&field).unwrap(), v);
  }

  #[test]
  fn test_field_to_byte_array_accepts_str_and_decimal() {
    assert_eq!(field_to_byte_array(&Field::Str("hi".to_string())).unwrap(), ByteArray::from("hi"));
    let decimal = Field::Decimal { unscaled: ByteArray::from(vec![1, 2]), scale: 2, precision: 5 };
    assert_eq!(field_to_byte_array(&decimal).unwrap(), ByteArray::from(vec![1, 2]));
  }
}
