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

//! Component C/D: value decoders. `PLAIN` is supported for every physical
//! type, `RLE_DICTIONARY`/`PLAIN_DICTIONARY` via [`DictDecoder`], and `RLE`
//! for booleans in data page v2. The delta family is admitted by
//! [`crate::basic::Encoding`] so schemas referencing it still parse, but
//! decoding it is out of scope; [`get_decoder`] returns `Unsupported`.

use std::cmp;
use std::marker::PhantomData;
use std::mem;
use std::slice::from_raw_parts_mut;

use super::rle::RleDecoder;
use crate::basic::*;
use crate::data_type::*;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::BitReader;
use crate::util::memory::ByteBufferPtr;

/// A Parquet decoder for the data type `T`.
pub trait Decoder<T: DataType> {
  /// Sets the data to decode, which holds `num_values` encoded values.
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()>;

  /// Decodes into `buffer`, returning the number of values produced
  /// (equal to `buffer.len()` unless fewer values remain).
  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize>;

  /// Number of values left in this decoder's stream.
  fn values_left(&self) -> usize;

  fn encoding(&self) -> Encoding;
}

/// Builds a decoder for `encoding` over the physical type of `descr`.
///
/// `RLE_DICTIONARY`/`PLAIN_DICTIONARY` are not constructed here: the
/// column reader builds a [`DictDecoder`] directly and feeds it the
/// dictionary page via [`DictDecoder::set_dict`].
pub fn get_decoder<T: DataType>(descr: ColumnDescPtr, encoding: Encoding) -> Result<Box<dyn Decoder<T>>>
where
  T: 'static
{
  let decoder: Box<dyn Decoder<T>> = match encoding {
    Encoding::PLAIN => Box::new(PlainDecoder::new(descr.type_length())),
    Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
      return Err(general_err!("dictionary decoders are constructed via DictDecoder::set_dict, not get_decoder"));
    },
    Encoding::RLE => {
      if T::get_physical_type() != Type::BOOLEAN {
        return Err(nyi_err!("RLE value decoding is only supported for BOOLEAN columns"));
      }
      // `Decoder<BoolType>` is the only concrete impl of `RleValueDecoder`;
      // `T::T == bool` was just confirmed above, and `BoolType` is the
      // only `DataType` whose associated `T` is `bool`, so this transmute
      // carries a `Box<dyn Decoder<BoolType>>` to the `Box<dyn Decoder<T>>`
      // the caller actually asked for. Mirrors the typed-dispatch transmute
      // column readers use to go from an untyped page reader to `T`.
      let concrete: Box<dyn Decoder<BoolType>> = Box::new(RleValueDecoder::<BoolType>::new());
      unsafe { mem::transmute(concrete) }
    },
    e => return Err(nyi_err!("encoding {} is not supported", e))
  };
  Ok(decoder)
}

// ----------------------------------------------------------------------
// PLAIN decoding

/// Back-to-back values with no framing. Numeric types are little-endian;
/// booleans are LSB-first bit-packed; byte arrays are length-prefixed
/// (fixed-length byte arrays are not, their length is carried by the
/// schema instead). See [`super::encoding::PlainEncoder`].
pub struct PlainDecoder<T: DataType> {
  num_values: usize,
  start: usize,
  type_length: i32,
  data: Option<ByteBufferPtr>,
  bit_reader: Option<BitReader>,
  _phantom: PhantomData<T>
}

impl<T: DataType> PlainDecoder<T> {
  pub fn new(type_length: i32) -> Self {
    PlainDecoder {
      data: None,
      bit_reader: None,
      type_length,
      num_values: 0,
      start: 0,
      _phantom: PhantomData
    }
  }
}

/// Shared PLAIN decoding for the fixed-width numeric physical types. This
/// blanket impl and the four concrete impls below it never overlap: the
/// concrete impls are for types that do not (and must not) implement
/// [`FixedLenPlainType`]. Stands in for the nightly trait specialization
/// the original decoder used to share this code across all of `T`.
impl<T: FixedLenPlainType> Decoder<T> for PlainDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.num_values = num_values;
    self.start = 0;
    self.data = Some(data);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let data = self.data.as_ref().expect("set_data must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    let bytes_to_decode = mem::size_of::<T::T>() * num_values;
    if data.len() - self.start < bytes_to_decode {
      return Err(eof_err!("not enough bytes to decode {} values", num_values));
    }
    let raw_buffer: &mut [u8] = unsafe { from_raw_parts_mut(buffer.as_mut_ptr() as *mut u8, bytes_to_decode) };
    raw_buffer.copy_from_slice(data.range(self.start, bytes_to_decode).as_ref());
    self.start += bytes_to_decode;
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

impl Decoder<Int96Type> for PlainDecoder<Int96Type> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.num_values = num_values;
    self.start = 0;
    self.data = Some(data);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [Int96]) -> Result<usize> {
    let data = self.data.as_ref().expect("set_data must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    if data.len() - self.start < 12 * num_values {
      return Err(eof_err!("not enough bytes to decode {} Int96 values", num_values));
    }
    for value in buffer.iter_mut().take(num_values) {
      let bytes = data.range(self.start, 12);
      let raw = bytes.as_ref();
      let words = [
        u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]])
      ];
      value.set_data(words);
      self.start += 12;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

impl Decoder<BoolType> for PlainDecoder<BoolType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.num_values = num_values;
    self.bit_reader = Some(BitReader::new(data));
    Ok(())
  }

  fn get(&mut self, buffer: &mut [bool]) -> Result<usize> {
    let bit_reader = self.bit_reader.as_mut().expect("set_data must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    let values_read = bit_reader.get_batch::<bool>(&mut buffer[..num_values], 1);
    self.num_values -= values_read;
    Ok(values_read)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

impl Decoder<ByteArrayType> for PlainDecoder<ByteArrayType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.num_values = num_values;
    self.start = 0;
    self.data = Some(data);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [ByteArray]) -> Result<usize> {
    let data = self.data.as_ref().expect("set_data must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    for value in buffer.iter_mut().take(num_values) {
      if data.len() < self.start + 4 {
        return Err(eof_err!("not enough bytes for byte array length prefix"));
      }
      let len_bytes = data.range(self.start, 4);
      let len = u32::from_le_bytes([
        len_bytes.as_ref()[0],
        len_bytes.as_ref()[1],
        len_bytes.as_ref()[2],
        len_bytes.as_ref()[3]
      ]) as usize;
      self.start += 4;
      if data.len() < self.start + len {
        return Err(eof_err!("not enough bytes to decode a {}-byte array", len));
      }
      value.set_data(data.range(self.start, len));
      self.start += len;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

impl Decoder<FixedLenByteArrayType> for PlainDecoder<FixedLenByteArrayType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.num_values = num_values;
    self.start = 0;
    self.data = Some(data);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [ByteArray]) -> Result<usize> {
    assert!(self.type_length > 0);
    let data = self.data.as_ref().expect("set_data must be called first");
    let type_length = self.type_length as usize;
    let num_values = cmp::min(buffer.len(), self.num_values);
    for value in buffer.iter_mut().take(num_values) {
      if data.len() < self.start + type_length {
        return Err(eof_err!("not enough bytes to decode a {}-byte fixed array", type_length));
      }
      value.set_data(data.range(self.start, type_length));
      self.start += type_length;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

// ----------------------------------------------------------------------
// RLE_DICTIONARY / PLAIN_DICTIONARY decoding

/// Decodes dictionary-index runs, resolving each index against a
/// dictionary loaded once per column chunk from the dictionary page.
pub struct DictDecoder<T: DataType> {
  dictionary: Vec<T::T>,
  has_dictionary: bool,
  rle_decoder: Option<RleDecoder>,
  num_values: usize
}

impl<T: DataType> DictDecoder<T> {
  pub fn new() -> Self {
    Self { dictionary: vec![], has_dictionary: false, rle_decoder: None, num_values: 0 }
  }

  /// Loads the dictionary by fully draining `decoder`.
  pub fn set_dict(&mut self, mut decoder: Box<dyn Decoder<T>>) -> Result<()> {
    let num_values = decoder.values_left();
    self.dictionary.resize(num_values, T::T::default());
    let _ = decoder.get(&mut self.dictionary)?;
    self.has_dictionary = true;
    Ok(())
  }
}

impl<T: DataType> Decoder<T> for DictDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    if data.is_empty() {
      return Err(eof_err!("dictionary index stream is missing its bit-width prefix byte"));
    }
    // Framing: first byte is the bit width, per spec.md §4.B
    // "bit-width-prefix framing".
    let bit_width = data.as_ref()[0];
    let mut rle_decoder = RleDecoder::new(bit_width);
    rle_decoder.set_data(data.start_from(1));
    self.num_values = num_values;
    self.rle_decoder = Some(rle_decoder);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    assert!(self.has_dictionary, "set_dict must be called before get");
    let rle = self.rle_decoder.as_mut().expect("set_data must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    let values_read = rle.get_batch_with_dict(&self.dictionary[..], buffer, num_values)?;
    self.num_values -= values_read;
    Ok(values_read)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE_DICTIONARY
  }
}

// ----------------------------------------------------------------------
// RLE decoding (data page v2 boolean values only)

/// RLE/bit-packed hybrid decoding of values directly (as opposed to level
/// streams or dictionary indices). Only meaningful for `BOOLEAN` columns
/// in data page v2; [`get_decoder`] is the only place one is built, and it
/// checks the physical type before constructing one.
pub struct RleValueDecoder<T: DataType> {
  values_left: usize,
  decoder: Option<RleDecoder>,
  _phantom: PhantomData<T>
}

impl<T: DataType> RleValueDecoder<T> {
  pub fn new() -> Self {
    Self { values_left: 0, decoder: None, _phantom: PhantomData }
  }
}

impl Decoder<BoolType> for RleValueDecoder<BoolType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    let i32_size = mem::size_of::<i32>();
    if data.len() < i32_size {
      return Err(eof_err!("not enough bytes for RLE value stream length prefix"));
    }
    let len_bytes = data.range(0, i32_size);
    let raw = len_bytes.as_ref();
    let data_size = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    let mut rle_decoder = RleDecoder::new(1);
    rle_decoder.set_data(data.range(i32_size, data_size));
    self.decoder = Some(rle_decoder);
    self.values_left = num_values;
    Ok(())
  }

  fn get(&mut self, buffer: &mut [bool]) -> Result<usize> {
    let rle_decoder = self.decoder.as_mut().expect("RLE decoder is not initialized");
    let values_read = rle_decoder.get_batch(buffer)?;
    self.values_left -= values_read;
    Ok(values_read)
  }

  fn values_left(&self) -> usize {
    self.values_left
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
  use std::sync::Arc;

  fn int32_descr() -> ColumnDescPtr {
    let ty = SchemaType::new_primitive("i", Repetition::REQUIRED, Type::INT32, None, None, 0, 0, 0).unwrap();
    Arc::new(ColumnDescriptor::new(Arc::new(ty), 0, 0, ColumnPath::new(vec!["i".to_string()])))
  }

  #[test]
  fn test_plain_int32_roundtrip() {
    let values: Vec<i32> = vec![1, -2, 3, i32::max_value(), i32::min_value()];
    let mut bytes = Vec::new();
    for v in &values {
      bytes.extend_from_slice(&v.to_le_bytes());
    }
    let mut decoder: PlainDecoder<Int32Type> = PlainDecoder::new(0);
    decoder.set_data(ByteBufferPtr::new(bytes), values.len()).unwrap();
    let mut out = vec![0i32; values.len()];
    let n = decoder.get(&mut out).unwrap();
    assert_eq!(n, values.len());
    assert_eq!(out, values);
    assert_eq!(decoder.values_left(), 0);
  }

  #[test]
  fn test_plain_bool_roundtrip() {
    let values = vec![true, false, true, true, false, false, false, true, true];
    let mut bytes = vec![0u8; 2];
    for (i, &v) in values.iter().enumerate() {
      if v {
        crate::util::bit_util::set_array_bit(&mut bytes, i);
      }
    }
    let mut decoder: PlainDecoder<BoolType> = PlainDecoder::new(0);
    decoder.set_data(ByteBufferPtr::new(bytes), values.len()).unwrap();
    let mut out = vec![false; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_plain_byte_array_roundtrip() {
    let values: Vec<ByteArray> = vec!["hello".into(), "".into(), "parquet".into()];
    let mut bytes = Vec::new();
    for v in &values {
      bytes.extend_from_slice(&(v.len() as u32).to_le_bytes());
      bytes.extend_from_slice(v.data());
    }
    let mut decoder: PlainDecoder<ByteArrayType> = PlainDecoder::new(0);
    decoder.set_data(ByteBufferPtr::new(bytes), values.len()).unwrap();
    let mut out = vec![ByteArray::new(); values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_plain_truncated_is_eof() {
    let mut decoder: PlainDecoder<Int32Type> = PlainDecoder::new(0);
    decoder.set_data(ByteBufferPtr::new(vec![1, 2, 3]), 1).unwrap();
    let mut out = vec![0i32; 1];
    let err = decoder.get(&mut out).unwrap_err();
    match err {
      ParquetError::TruncatedInput(_) => {},
      other => panic!("expected TruncatedInput, got {:?}", other)
    }
  }

  #[test]
  fn test_dict_decoder_roundtrip() {
    let dict_values = vec![100i32, 200, 300];
    let mut dict_decoder: PlainDecoder<Int32Type> = PlainDecoder::new(0);
    let mut dict_bytes = Vec::new();
    for v in &dict_values {
      dict_bytes.extend_from_slice(&v.to_le_bytes());
    }
    dict_decoder.set_data(ByteBufferPtr::new(dict_bytes), dict_values.len()).unwrap();

    let mut decoder: DictDecoder<Int32Type> = DictDecoder::new();
    decoder.set_dict(Box::new(dict_decoder)).unwrap();

    let mut rle_encoder = super::super::rle::RleEncoder::new(2, 16);
    let indices = [0u64, 1, 2, 2, 1, 0];
    for &i in &indices {
      rle_encoder.put(i);
    }
    let payload = rle_encoder.consume();
    let mut data = vec![2u8]; // bit width prefix
    data.extend_from_slice(&payload);

    decoder.set_data(ByteBufferPtr::new(data), indices.len()).unwrap();
    let mut out = vec![0i32; indices.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, vec![100, 200, 300, 300, 200, 100]);
  }

  #[test]
  fn test_get_decoder_rejects_rle_for_non_bool() {
    let descr = int32_descr();
    let err = get_decoder::<Int32Type>(descr, Encoding::RLE).unwrap_err();
    match err {
      ParquetError::Unsupported(_) => {},
      other => panic!("expected Unsupported, got {:?}", other)
    }
  }

  #[test]
  fn test_get_decoder_rejects_dictionary_encodings() {
    let descr = int32_descr();
    let err = get_decoder::<Int32Type>(descr, Encoding::RLE_DICTIONARY).unwrap_err();
    match err {
      ParquetError::InvalidMetadata(_) => {},
      other => panic!("expected InvalidMetadata, got {:?}", other)
    }
  }

  #[test]
  fn test_get_decoder_rejects_delta_encodings() {
    let descr = int32_descr();
    let err = get_decoder::<Int32Type>(descr, Encoding::DELTA_BINARY_PACKED).unwrap_err();
    match err {
      ParquetError::Unsupported(_) => {},
      other => panic!("expected Unsupported, got {:?}", other)
    }
  }
}
