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

//! Value encoders, mirroring [`super::decoding`]: `PLAIN` for every
//! physical type and `RLE_DICTIONARY` via [`DictEncoder`].

use std::collections::HashMap;
use std::mem;

use super::rle::RleEncoder;
use crate::basic::*;
use crate::data_type::*;
use crate::errors::Result;
use crate::util::memory::{ByteBuffer, ByteBufferPtr};

/// A Parquet encoder for the data type `T`.
pub trait Encoder<T: DataType> {
  /// Appends `values` to this encoder's buffered output.
  fn put(&mut self, values: &[T::T]) -> Result<()>;

  /// Number of values buffered so far.
  fn num_values(&self) -> usize;

  fn encoding(&self) -> Encoding;

  /// Finalizes and returns the encoded bytes, consuming any buffered
  /// dictionary/run state.
  fn flush_buffer(&mut self) -> Result<ByteBufferPtr>;
}

/// Builds an encoder for `encoding` over the physical type `T`.
/// `RLE_DICTIONARY`/`PLAIN_DICTIONARY` are built directly via
/// [`DictEncoder::new`], not through this function, since the caller
/// needs the encoder to also produce the dictionary page.
pub fn get_encoder<T: DataType>(encoding: Encoding) -> Result<Box<dyn Encoder<T>>>
where
  T: 'static
{
  let encoder: Box<dyn Encoder<T>> = match encoding {
    Encoding::PLAIN => Box::new(PlainEncoder::new()),
    Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
      return Err(general_err!("dictionary encoders are constructed via DictEncoder::new, not get_encoder"));
    },
    e => return Err(nyi_err!("encoding {} is not supported", e))
  };
  Ok(encoder)
}

// ----------------------------------------------------------------------
// PLAIN encoding

/// Back-to-back values with no framing; see [`super::decoding::PlainDecoder`]
/// for the exact byte layout per physical type.
pub struct PlainEncoder<T: DataType> {
  buffer: ByteBuffer,
  bool_bits: Vec<bool>,
  num_values: usize,
  _phantom: std::marker::PhantomData<T>
}

impl<T: DataType> PlainEncoder<T> {
  pub fn new() -> Self {
    PlainEncoder { buffer: ByteBuffer::new(), bool_bits: Vec::new(), num_values: 0, _phantom: std::marker::PhantomData }
  }
}

impl<T: FixedLenPlainType> Encoder<T> for PlainEncoder<T> {
  fn put(&mut self, values: &[T::T]) -> Result<()> {
    for v in values {
      self.buffer.extend_from_slice(&v.as_bytes_key());
    }
    self.num_values += values.len();
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }
}

impl Encoder<Int96Type> for PlainEncoder<Int96Type> {
  fn put(&mut self, values: &[Int96]) -> Result<()> {
    for v in values {
      for word in v.data() {
        self.buffer.extend_from_slice(&word.to_le_bytes());
      }
    }
    self.num_values += values.len();
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }
}

impl Encoder<BoolType> for PlainEncoder<BoolType> {
  fn put(&mut self, values: &[bool]) -> Result<()> {
    self.bool_bits.extend_from_slice(values);
    self.num_values += values.len();
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    let num_bytes = (self.bool_bits.len() + 7) / 8;
    let mut bytes = vec![0u8; num_bytes];
    for (i, &b) in self.bool_bits.iter().enumerate() {
      if b {
        crate::util::bit_util::set_array_bit(&mut bytes, i);
      }
    }
    self.bool_bits.clear();
    self.num_values = 0;
    Ok(ByteBufferPtr::new(bytes))
  }
}

impl Encoder<ByteArrayType> for PlainEncoder<ByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    for v in values {
      self.buffer.extend_from_slice(&(v.len() as u32).to_le_bytes());
      self.buffer.extend_from_slice(v.data());
    }
    self.num_values += values.len();
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }
}

impl Encoder<FixedLenByteArrayType> for PlainEncoder<FixedLenByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    for v in values {
      self.buffer.extend_from_slice(v.data());
    }
    self.num_values += values.len();
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }
}

// ----------------------------------------------------------------------
// RLE_DICTIONARY / PLAIN_DICTIONARY encoding

/// Builds a dictionary of distinct values as they arrive and emits a
/// bit-width-prefixed run-length-encoded stream of dictionary indices.
/// [`DictEncoder::write_dict`] returns the dictionary itself, in
/// insertion order, for the caller to write out as a dictionary page.
pub struct DictEncoder<T: DataType> {
  interner: HashMap<ByteArrayKey, usize>,
  uniques: Vec<T::T>,
  indices: Vec<u64>
}

/// Hashing/equality key for the interner. `T::T` is only `PartialEq`, not
/// `Hash` (floats aren't totally ordered), so values are interned by their
/// PLAIN-encoded byte representation instead, which is well-defined for
/// every physical type this encoder supports.
#[derive(PartialEq, Eq, Hash)]
struct ByteArrayKey(Vec<u8>);

impl<T: DataType> DictEncoder<T>
where
  PlainEncoder<T>: Encoder<T>
{
  pub fn new() -> Self {
    DictEncoder { interner: HashMap::new(), uniques: Vec::new(), indices: Vec::new() }
  }

  fn key_for(value: &T::T) -> ByteArrayKey {
    ByteArrayKey(value.as_bytes_key())
  }

  /// Number of distinct values interned so far.
  pub fn num_entries(&self) -> usize {
    self.uniques.len()
  }

  /// Size, in bytes, the dictionary page's PLAIN-encoded values would need.
  pub fn dict_encoded_size(&self) -> usize {
    self.write_dict().map(|b| b.len()).unwrap_or(0)
  }

  /// Returns the dictionary in insertion order, PLAIN-encoded exactly as
  /// [`super::decoding::PlainDecoder`] expects it, for writing the
  /// dictionary page.
  pub fn write_dict(&self) -> Result<ByteBufferPtr> {
    let mut encoder = PlainEncoder::<T>::new();
    encoder.put(&self.uniques)?;
    encoder.flush_buffer()
  }
}

impl<T: DataType> Encoder<T> for DictEncoder<T> {
  fn put(&mut self, values: &[T::T]) -> Result<()> {
    for v in values {
      let key = Self::key_for(v);
      let idx = match self.interner.get(&key) {
        Some(&idx) => idx,
        None => {
          let idx = self.uniques.len();
          self.uniques.push(v.clone());
          self.interner.insert(key, idx);
          idx
        }
      };
      self.indices.push(idx as u64);
    }
    Ok(())
  }

  fn num_values(&self) -> usize {
    self.indices.len()
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE_DICTIONARY
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    let bit_width = crate::encodings::rle::level_bit_width(
      if self.uniques.is_empty() { 0 } else { (self.uniques.len() - 1).max(1) as i16 }
    )
    .max(1);
    let mut encoder = RleEncoder::new(bit_width, 1024);
    for &idx in &self.indices {
      encoder.put(idx);
    }
    let payload = encoder.consume();
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(bit_width);
    out.extend_from_slice(&payload);
    self.indices.clear();
    Ok(ByteBufferPtr::new(out))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::decoding::{DictDecoder, Decoder, PlainDecoder};

  #[test]
  fn test_plain_int32_roundtrip() {
    let values: Vec<i32> = vec![1, -2, 3, 4, 5];
    let mut encoder: PlainEncoder<Int32Type> = PlainEncoder::new();
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_values(), values.len());
    let bytes = encoder.flush_buffer().unwrap();

    let mut decoder: PlainDecoder<Int32Type> = PlainDecoder::new(0);
    decoder.set_data(bytes, values.len()).unwrap();
    let mut out = vec![0i32; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_plain_bool_roundtrip() {
    let values = vec![true, false, true, true, false];
    let mut encoder: PlainEncoder<BoolType> = PlainEncoder::new();
    encoder.put(&values).unwrap();
    let bytes = encoder.flush_buffer().unwrap();

    let mut decoder: PlainDecoder<BoolType> = PlainDecoder::new(0);
    decoder.set_data(bytes, values.len()).unwrap();
    let mut out = vec![false; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_dict_encoder_roundtrip() {
    let values: Vec<i32> = vec![7, 7, 9, 7, 11, 9, 11, 11];
    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new();
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 3);

    let dict_bytes = encoder.write_dict().unwrap();
    let mut dict_decoder: PlainDecoder<Int32Type> = PlainDecoder::new(0);
    dict_decoder.set_data(dict_bytes, encoder.num_entries()).unwrap();

    let index_bytes = encoder.flush_buffer().unwrap();
    let mut decoder: DictDecoder<Int32Type> = DictDecoder::new();
    decoder.set_dict(Box::new(dict_decoder)).unwrap();
    decoder.set_data(index_bytes, values.len()).unwrap();
    let mut out = vec![0i32; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }
}
