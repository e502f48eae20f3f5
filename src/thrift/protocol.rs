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

//! Component D: a hand-rolled Thrift Compact Binary Protocol codec
//! (spec.md §4.D), just the wire primitives [`format`] builds
//! `FileMetaData` and friends out of. There is no general-purpose `TType`
//! dispatch or IDL here, only what the footer structs need: struct field
//! framing, zigzag-varint integers, length-prefixed binary, and compact
//! list/set/map headers.

use crate::errors::Result;
use crate::util::bit_util::{read_uvarint, read_varint_zigzag, write_uvarint, write_varint_zigzag};

/// One of the twelve Thrift compact-protocol type codes (spec.md §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  Stop,
  BoolTrue,
  BoolFalse,
  Byte,
  I16,
  I32,
  I64,
  Double,
  Binary,
  List,
  Set,
  Map,
  Struct
}

impl FieldType {
  fn to_code(self) -> u8 {
    match self {
      FieldType::Stop => 0,
      FieldType::BoolTrue => 1,
      FieldType::BoolFalse => 2,
      FieldType::Byte => 3,
      FieldType::I16 => 4,
      FieldType::I32 => 5,
      FieldType::I64 => 6,
      FieldType::Double => 7,
      FieldType::Binary => 8,
      FieldType::List => 9,
      FieldType::Set => 10,
      FieldType::Map => 11,
      FieldType::Struct => 12
    }
  }

  fn from_code(code: u8) -> Result<FieldType> {
    match code {
      0 => Ok(FieldType::Stop),
      1 => Ok(FieldType::BoolTrue),
      2 => Ok(FieldType::BoolFalse),
      3 => Ok(FieldType::Byte),
      4 => Ok(FieldType::I16),
      5 => Ok(FieldType::I32),
      6 => Ok(FieldType::I64),
      7 => Ok(FieldType::Double),
      8 => Ok(FieldType::Binary),
      9 => Ok(FieldType::List),
      10 => Ok(FieldType::Set),
      11 => Ok(FieldType::Map),
      12 => Ok(FieldType::Struct),
      other => Err(general_err!("unknown thrift compact protocol type code {}", other))
    }
  }

  /// `true` for the binary-boolean codes a list/set/map element uses (one
  /// byte, 0/1), as opposed to the struct-field codes which fold the
  /// value into the field header itself.
  fn is_bool(self) -> bool {
    matches!(self, FieldType::BoolTrue | FieldType::BoolFalse)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
  pub id: i16,
  pub field_type: FieldType
}

/// Reads a Thrift-Compact-encoded struct out of an in-memory byte slice.
/// The footer is always read whole before decoding (spec.md §4.D), so
/// there is no streaming/partial-read concern here.
pub struct CompactProtocolReader<'a> {
  buf: &'a [u8],
  pos: usize,
  last_field_id: i16,
  field_id_stack: Vec<i16>,
  pending_bool: Option<bool>
}

impl<'a> CompactProtocolReader<'a> {
  pub fn new(buf: &'a [u8]) -> Self {
    CompactProtocolReader { buf, pos: 0, last_field_id: 0, field_id_stack: Vec::new(), pending_bool: None }
  }

  pub fn bytes_consumed(&self) -> usize {
    self.pos
  }

  fn read_byte(&mut self) -> Result<u8> {
    if self.pos >= self.buf.len() {
      return Err(eof_err!("thrift buffer ended while reading a byte"));
    }
    let b = self.buf[self.pos];
    self.pos += 1;
    Ok(b)
  }

  fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
    if self.pos + n > self.buf.len() {
      return Err(eof_err!("thrift buffer ended while reading {} bytes", n));
    }
    let out = &self.buf[self.pos..self.pos + n];
    self.pos += n;
    Ok(out)
  }

  pub fn read_struct_begin(&mut self) -> Result<()> {
    self.field_id_stack.push(self.last_field_id);
    self.last_field_id = 0;
    Ok(())
  }

  pub fn read_struct_end(&mut self) -> Result<()> {
    self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    Ok(())
  }

  /// Reads the next field header. A `Stop` type code (field id 0)
  /// terminates the enclosing struct.
  pub fn read_field_begin(&mut self) -> Result<FieldHeader> {
    let header_byte = self.read_byte()?;
    if header_byte == 0 {
      return Ok(FieldHeader { id: 0, field_type: FieldType::Stop });
    }
    let field_type = FieldType::from_code(header_byte & 0x0F)?;
    let delta = (header_byte & 0xF0) >> 4;
    let id = if delta != 0 {
      self.last_field_id + delta as i16
    } else {
      self.read_i16()?
    };
    self.last_field_id = id;
    self.pending_bool = match field_type {
      FieldType::BoolTrue => Some(true),
      FieldType::BoolFalse => Some(false),
      _ => None
    };
    Ok(FieldHeader { id, field_type })
  }

  pub fn read_bool(&mut self) -> Result<bool> {
    if let Some(b) = self.pending_bool.take() {
      return Ok(b);
    }
    // list/set/map element: one byte, per spec.md §4.D "boolean list
    // elements use 1 byte each (0/1)".
    Ok(self.read_byte()? != 0)
  }

  pub fn read_byte_value(&mut self) -> Result<i8> {
    Ok(self.read_byte()? as i8)
  }

  pub fn read_i16(&mut self) -> Result<i16> {
    Ok(self.read_zigzag_varint()? as i16)
  }

  pub fn read_i32(&mut self) -> Result<i32> {
    Ok(self.read_zigzag_varint()? as i32)
  }

  pub fn read_i64(&mut self) -> Result<i64> {
    self.read_zigzag_varint()
  }

  fn read_zigzag_varint(&mut self) -> Result<i64> {
    let (v, n) = read_varint_zigzag(&self.buf[self.pos..])?;
    self.pos += n;
    Ok(v)
  }

  fn read_uvarint(&mut self) -> Result<u64> {
    let (v, n) = read_uvarint(&self.buf[self.pos..])?;
    self.pos += n;
    Ok(v)
  }

  pub fn read_double(&mut self) -> Result<f64> {
    let bytes = self.read_bytes(8)?;
    Ok(f64::from_le_bytes([
      bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]
    ]))
  }

  pub fn read_binary(&mut self) -> Result<Vec<u8>> {
    let len = self.read_uvarint()? as usize;
    Ok(self.read_bytes(len)?.to_vec())
  }

  pub fn read_string(&mut self) -> Result<String> {
    let bytes = self.read_binary()?;
    String::from_utf8(bytes).map_err(|e| general_err!("thrift binary field is not valid UTF-8: {}", e))
  }

  /// Returns the element type and count for a list or set.
  pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
    let header = self.read_byte()?;
    let elem_type = FieldType::from_code(header & 0x0F)?;
    let size_nibble = (header & 0xF0) >> 4;
    let size = if size_nibble == 15 { self.read_uvarint()? as usize } else { size_nibble as usize };
    Ok((elem_type, size))
  }

  pub fn read_set_begin(&mut self) -> Result<(FieldType, usize)> {
    self.read_list_begin()
  }

  /// Returns the key type, value type, and entry count for a map. A
  /// zero-entry map has no type byte (spec.md §4.D).
  pub fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, usize)> {
    let size = self.read_uvarint()? as usize;
    if size == 0 {
      return Ok((FieldType::Stop, FieldType::Stop, 0));
    }
    let types = self.read_byte()?;
    let key_type = FieldType::from_code((types & 0xF0) >> 4)?;
    let val_type = FieldType::from_code(types & 0x0F)?;
    Ok((key_type, val_type, size))
  }

  /// Skips a value of `field_type`, used to tolerate unknown field ids
  /// (spec.md §4.D: "the reader must tolerate unknown field ids by
  /// skipping their payload according to type").
  pub fn skip(&mut self, field_type: FieldType) -> Result<()> {
    match field_type {
      FieldType::Stop => Ok(()),
      FieldType::BoolTrue | FieldType::BoolFalse => {
        if field_type.is_bool() && self.pending_bool.is_some() {
          self.pending_bool.take();
        }
        Ok(())
      },
      FieldType::Byte => {
        self.read_byte()?;
        Ok(())
      },
      FieldType::I16 | FieldType::I32 | FieldType::I64 => {
        self.read_zigzag_varint()?;
        Ok(())
      },
      FieldType::Double => {
        self.read_double()?;
        Ok(())
      },
      FieldType::Binary => {
        self.read_binary()?;
        Ok(())
      },
      FieldType::Struct => {
        self.read_struct_begin()?;
        loop {
          let field = self.read_field_begin()?;
          if field.field_type == FieldType::Stop {
            break;
          }
          self.skip(field.field_type)?;
        }
        self.read_struct_end()
      },
      FieldType::List | FieldType::Set => {
        let (elem_type, size) = self.read_list_begin()?;
        for _ in 0..size {
          self.skip(elem_type)?;
        }
        Ok(())
      },
      FieldType::Map => {
        let (key_type, val_type, size) = self.read_map_begin()?;
        for _ in 0..size {
          self.skip(key_type)?;
          self.skip(val_type)?;
        }
        Ok(())
      }
    }
  }
}

/// Writes a Thrift-Compact-encoded struct into an owned byte buffer.
/// Writers must emit struct fields in ascending id order (spec.md §4.D),
/// which is the caller's responsibility; this type just tracks the delta.
pub struct CompactProtocolWriter {
  buf: Vec<u8>,
  last_field_id: i16,
  field_id_stack: Vec<i16>
}

impl CompactProtocolWriter {
  pub fn new() -> Self {
    CompactProtocolWriter { buf: Vec::new(), last_field_id: 0, field_id_stack: Vec::new() }
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.buf
  }

  pub fn write_struct_begin(&mut self) {
    self.field_id_stack.push(self.last_field_id);
    self.last_field_id = 0;
  }

  pub fn write_struct_end(&mut self) {
    self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
  }

  pub fn write_field_stop(&mut self) {
    self.buf.push(0);
  }

  fn write_field_header(&mut self, field_type: FieldType, id: i16) {
    let delta = id.wrapping_sub(self.last_field_id);
    if delta > 0 && delta <= 15 {
      self.buf.push(((delta as u8) << 4) | field_type.to_code());
    } else {
      self.buf.push(field_type.to_code());
      self.write_i16(id);
    }
    self.last_field_id = id;
  }

  /// Non-boolean struct field: writes the header then delegates the value
  /// to `write_value`.
  pub fn write_field<F: FnOnce(&mut Self)>(&mut self, field_type: FieldType, id: i16, write_value: F) {
    self.write_field_header(field_type, id);
    write_value(self);
  }

  /// Boolean struct field: the value is folded into the header's type
  /// code, so there is nothing further to write (spec.md §4.D).
  pub fn write_bool_field(&mut self, id: i16, value: bool) {
    let field_type = if value { FieldType::BoolTrue } else { FieldType::BoolFalse };
    self.write_field_header(field_type, id);
  }

  pub fn write_bool(&mut self, value: bool) {
    self.buf.push(if value { 1 } else { 0 });
  }

  pub fn write_byte(&mut self, value: i8) {
    self.buf.push(value as u8);
  }

  pub fn write_i16(&mut self, value: i16) {
    write_varint_zigzag(value as i64, &mut self.buf);
  }

  pub fn write_i32(&mut self, value: i32) {
    write_varint_zigzag(value as i64, &mut self.buf);
  }

  pub fn write_i64(&mut self, value: i64) {
    write_varint_zigzag(value, &mut self.buf);
  }

  pub fn write_double(&mut self, value: f64) {
    self.buf.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_binary(&mut self, value: &[u8]) {
    write_uvarint(value.len() as u64, &mut self.buf);
    self.buf.extend_from_slice(value);
  }

  pub fn write_string(&mut self, value: &str) {
    self.write_binary(value.as_bytes());
  }

  pub fn write_list_begin(&mut self, elem_type: FieldType, size: usize) {
    if size < 15 {
      self.buf.push(((size as u8) << 4) | elem_type.to_code());
    } else {
      self.buf.push(0xF0 | elem_type.to_code());
      write_uvarint(size as u64, &mut self.buf);
    }
  }

  pub fn write_set_begin(&mut self, elem_type: FieldType, size: usize) {
    self.write_list_begin(elem_type, size);
  }

  pub fn write_map_begin(&mut self, key_type: FieldType, val_type: FieldType, size: usize) {
    write_uvarint(size as u64, &mut self.buf);
    if size > 0 {
      self.buf.push((key_type.to_code() << 4) | val_type.to_code());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_field_header_small_delta_roundtrip() {
    let mut w = CompactProtocolWriter::new();
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(42));
    w.write_field(FieldType::I32, 3, |w| w.write_i32(-7));
    w.write_field_stop();
    w.write_struct_end();
    let bytes = w.into_bytes();

    let mut r = CompactProtocolReader::new(&bytes);
    r.read_struct_begin().unwrap();
    let f1 = r.read_field_begin().unwrap();
    assert_eq!(f1, FieldHeader { id: 1, field_type: FieldType::I32 });
    assert_eq!(r.read_i32().unwrap(), 42);
    let f2 = r.read_field_begin().unwrap();
    assert_eq!(f2, FieldHeader { id: 3, field_type: FieldType::I32 });
    assert_eq!(r.read_i32().unwrap(), -7);
    let stop = r.read_field_begin().unwrap();
    assert_eq!(stop.field_type, FieldType::Stop);
    r.read_struct_end().unwrap();
  }

  #[test]
  fn test_field_header_large_delta_uses_zigzag_id() {
    let mut w = CompactProtocolWriter::new();
    w.write_struct_begin();
    w.write_field(FieldType::Byte, 1, |w| w.write_byte(9));
    w.write_field(FieldType::Byte, 40, |w| w.write_byte(10));
    w.write_field_stop();
    let bytes = w.into_bytes();

    let mut r = CompactProtocolReader::new(&bytes);
    r.read_struct_begin().unwrap();
    assert_eq!(r.read_field_begin().unwrap().id, 1);
    r.read_byte_value().unwrap();
    let second = r.read_field_begin().unwrap();
    assert_eq!(second.id, 40);
    r.read_byte_value().unwrap();
  }

  #[test]
  fn test_bool_fields_fold_into_header() {
    let mut w = CompactProtocolWriter::new();
    w.write_struct_begin();
    w.write_bool_field(1, true);
    w.write_bool_field(2, false);
    w.write_field_stop();
    let bytes = w.into_bytes();
    assert_eq!(bytes.len(), 3); // two 1-byte headers + stop byte

    let mut r = CompactProtocolReader::new(&bytes);
    r.read_struct_begin().unwrap();
    let f1 = r.read_field_begin().unwrap();
    assert_eq!(f1.field_type, FieldType::BoolTrue);
    assert!(r.read_bool().unwrap());
    let f2 = r.read_field_begin().unwrap();
    assert_eq!(f2.field_type, FieldType::BoolFalse);
    assert!(!r.read_bool().unwrap());
  }

  #[test]
  fn test_binary_and_string_roundtrip() {
    let mut w = CompactProtocolWriter::new();
    w.write_binary(b"hello parquet");
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    assert_eq!(r.read_string().unwrap(), "hello parquet");
  }

  #[test]
  fn test_list_roundtrip_small_and_large() {
    let mut w = CompactProtocolWriter::new();
    w.write_list_begin(FieldType::I32, 3);
    for v in [1, 2, 3] {
      w.write_i32(v);
    }
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let (elem_type, size) = r.read_list_begin().unwrap();
    assert_eq!(elem_type, FieldType::I32);
    assert_eq!(size, 3);
    let values: Vec<i32> = (0..size).map(|_| r.read_i32().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3]);

    // 20 elements forces the "size >= 15" varint-count form.
    let mut w2 = CompactProtocolWriter::new();
    w2.write_list_begin(FieldType::I16, 20);
    for v in 0..20i16 {
      w2.write_i16(v);
    }
    let bytes2 = w2.into_bytes();
    let mut r2 = CompactProtocolReader::new(&bytes2);
    let (elem_type2, size2) = r2.read_list_begin().unwrap();
    assert_eq!(elem_type2, FieldType::I16);
    assert_eq!(size2, 20);
  }

  #[test]
  fn test_map_roundtrip_including_empty() {
    let mut w = CompactProtocolWriter::new();
    w.write_map_begin(FieldType::I32, FieldType::Binary, 2);
    w.write_i32(1);
    w.write_string("one");
    w.write_i32(2);
    w.write_string("two");
    let bytes = w.into_bytes();
    let mut r = CompactProtocolReader::new(&bytes);
    let (kt, vt, size) = r.read_map_begin().unwrap();
    assert_eq!(kt, FieldType::I32);
    assert_eq!(vt, FieldType::Binary);
    assert_eq!(size, 2);
    assert_eq!(r.read_i32().unwrap(), 1);
    assert_eq!(r.read_string().unwrap(), "one");
    assert_eq!(r.read_i32().unwrap(), 2);
    assert_eq!(r.read_string().unwrap(), "two");

    let mut empty = CompactProtocolWriter::new();
    empty.write_map_begin(FieldType::I32, FieldType::I32, 0);
    let empty_bytes = empty.into_bytes();
    assert_eq!(empty_bytes.len(), 1); // just the zero-count varint, no type byte
  }

  #[test]
  fn test_skip_tolerates_unknown_struct_field() {
    // struct { 1: i32 kept, 99: binary unknown, 2: i32 kept }
    let mut w = CompactProtocolWriter::new();
    w.write_struct_begin();
    w.write_field(FieldType::I32, 1, |w| w.write_i32(10));
    w.write_field(FieldType::Binary, 99, |w| w.write_binary(b"ignore me"));
    w.write_field(FieldType::I32, 2, |w| w.write_i32(20));
    w.write_field_stop();
    let bytes = w.into_bytes();

    let mut r = CompactProtocolReader::new(&bytes);
    r.read_struct_begin().unwrap();
    let mut seen = Vec::new();
    loop {
      let field = r.read_field_begin().unwrap();
      if field.field_type == FieldType::Stop {
        break;
      }
      if field.id == 99 {
        r.skip(field.field_type).unwrap();
      } else {
        seen.push((field.id, r.read_i32().unwrap()));
      }
    }
    assert_eq!(seen, vec![(1, 10), (2, 20)]);
  }

  #[test]
  fn test_skip_nested_struct() {
    let mut inner = CompactProtocolWriter::new();
    inner.write_struct_begin();
    inner.write_field(FieldType::I32, 1, |w| w.write_i32(5));
    inner.write_field_stop();

    let mut outer = CompactProtocolWriter::new();
    outer.write_struct_begin();
    outer.write_field(FieldType::Struct, 1, |_w| {});
    outer.buf.extend_from_slice(&inner.buf);
    outer.write_field(FieldType::I32, 2, |w| w.write_i32(77));
    outer.write_field_stop();
    let bytes = outer.into_bytes();

    let mut r = CompactProtocolReader::new(&bytes);
    r.read_struct_begin().unwrap();
    let f1 = r.read_field_begin().unwrap();
    assert_eq!(f1.field_type, FieldType::Struct);
    r.skip(FieldType::Struct).unwrap();
    let f2 = r.read_field_begin().unwrap();
    assert_eq!(f2.id, 2);
    assert_eq!(r.read_i32().unwrap(), 77);
  }
}
