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

//! Level-stream framing over the RLE/bit-packed hybrid codec (spec.md
//! §4.B "Level-stream framing"): a 4-byte little-endian length prefix
//! bounds the run sequence, and `bit_width` is derived from `max_level`
//! rather than carried on the wire.

use byteorder::{ByteOrder, LittleEndian};

use crate::basic::Encoding;
use crate::encodings::rle::{level_bit_width, max_rle_buffer_size, RleDecoder, RleEncoder};
use crate::errors::{ParquetError, Result};
use crate::util::memory::ByteBufferPtr;

/// Decodes a definition- or repetition-level stream for one data page.
pub struct LevelDecoder {
  encoding: Encoding,
  bit_width: u8,
  rle_decoder: Option<RleDecoder>,
  declared_len: usize
}

impl LevelDecoder {
  pub fn new(encoding: Encoding, max_level: i16) -> Self {
    LevelDecoder {
      encoding,
      bit_width: level_bit_width(max_level),
      rle_decoder: None,
      declared_len: 0
    }
  }

  /// Consumes the length prefix and sets up the inner RLE decoder.
  /// Returns the total number of bytes this level stream occupies
  /// (length prefix included), so the caller can advance past it to the
  /// next stream.
  pub fn set_data(&mut self, data: ByteBufferPtr) -> Result<usize> {
    match self.encoding {
      Encoding::RLE => {
        if data.len() < 4 {
          return Err(eof_err!("not enough bytes for level stream length prefix"));
        }
        let len = LittleEndian::read_u32(&data.as_ref()[0..4]) as usize;
        if data.len() < 4 + len {
          return Err(eof_err!("level stream declares {} bytes but only {} remain", len, data.len() - 4));
        }
        let mut decoder = RleDecoder::new(self.bit_width);
        decoder.set_data(data.range(4, len));
        self.rle_decoder = Some(decoder);
        self.declared_len = len;
        Ok(4 + len)
      },
      Encoding::BIT_PACKED => Err(nyi_err!("legacy BIT_PACKED level encoding is not supported")),
      other => Err(nyi_err!("unsupported level encoding {}", other))
    }
  }

  /// Sets up the decoder over exactly `len` bytes with no length prefix,
  /// for data page v2's level streams: `DataPageHeaderV2` carries the byte
  /// length directly, unlike v1's self-framed streams (spec.md §4.F).
  pub fn set_data_range(&mut self, data: ByteBufferPtr, len: usize) -> Result<()> {
    match self.encoding {
      Encoding::RLE => {
        let mut decoder = RleDecoder::new(self.bit_width);
        decoder.set_data(data.range(0, len));
        self.rle_decoder = Some(decoder);
        self.declared_len = len;
        Ok(())
      },
      Encoding::BIT_PACKED => Err(nyi_err!("legacy BIT_PACKED level encoding is not supported")),
      other => Err(nyi_err!("unsupported level encoding {}", other))
    }
  }

  /// Fills `buffer` with decoded levels, returning the number produced.
  pub fn get(&mut self, buffer: &mut [i16]) -> Result<usize> {
    let decoder = self.rle_decoder.as_mut().expect("set_data must be called first");
    decoder.get_batch(buffer)
  }

  /// Checks that exactly the declared number of bytes were consumed, per
  /// spec.md §4.B: "any mismatch between declared length and bytes
  /// consumed is a Malformed error." Call once the page's levels have
  /// been fully read.
  pub fn verify_full_consumption(&self) -> Result<()> {
    let consumed = self.rle_decoder.as_ref().map(|d| d.bytes_consumed()).unwrap_or(0);
    if consumed != self.declared_len {
      return Err(malformed_err!(
        "level stream declared {} bytes but {} were consumed",
        self.declared_len,
        consumed
      ));
    }
    Ok(())
  }
}

/// Encodes a definition- or repetition-level stream for one data page.
pub struct LevelEncoder {
  encoding: Encoding,
  bit_width: u8,
  encoder: RleEncoder
}

impl LevelEncoder {
  pub fn new(encoding: Encoding, max_level: i16, buffer: Vec<u8>) -> Self {
    let bit_width = level_bit_width(max_level);
    LevelEncoder {
      encoding,
      bit_width,
      encoder: RleEncoder::new(bit_width, buffer.capacity())
    }
  }

  /// Upper bound, in bytes, on the length-prefixed encoding of
  /// `num_values` levels bounded by `max_level`.
  pub fn max_buffer_size(_encoding: Encoding, max_level: i16, num_values: usize) -> usize {
    4 + max_rle_buffer_size(level_bit_width(max_level), num_values)
  }

  pub fn put(&mut self, levels: &[i16]) -> Result<usize> {
    if self.encoding != Encoding::RLE {
      return Err(nyi_err!("unsupported level encoding {}", self.encoding));
    }
    for &l in levels {
      self.encoder.put(l as u64);
    }
    Ok(levels.len())
  }

  /// Finalizes the stream, prefixing the 4-byte little-endian length.
  pub fn consume(self) -> Result<ByteBufferPtr> {
    let payload = self.encoder.consume();
    let mut out = Vec::with_capacity(4 + payload.len());
    let mut len_bytes = [0u8; 4];
    LittleEndian::write_u32(&mut len_bytes, payload.len() as u32);
    out.extend_from_slice(&len_bytes);
    out.extend_from_slice(&payload);
    Ok(ByteBufferPtr::new(out))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_level_roundtrip() {
    let levels: Vec<i16> = vec![0, 1, 2, 3, 3, 3, 2, 1, 0, 3, 3, 3, 3, 3, 3, 3, 3, 3];
    let max_level = 3;
    let max_size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; max_size]);
    encoder.put(&levels).unwrap();
    let encoded = encoder.consume().unwrap();

    let mut decoder = LevelDecoder::new(Encoding::RLE, max_level);
    let consumed = decoder.set_data(encoded).unwrap();
    let mut out = vec![0i16; levels.len()];
    let n = decoder.get(&mut out).unwrap();
    assert_eq!(n, levels.len());
    assert_eq!(out, levels);
    decoder.verify_full_consumption().unwrap();
    assert!(consumed > 0);
  }

  #[test]
  fn test_level_max_level_zero() {
    // max_level == 0 implies bit_width == 0; every level must be 0.
    let levels: Vec<i16> = vec![0; 10];
    let max_size = LevelEncoder::max_buffer_size(Encoding::RLE, 0, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, 0, vec![0; max_size]);
    encoder.put(&levels).unwrap();
    let encoded = encoder.consume().unwrap();

    let mut decoder = LevelDecoder::new(Encoding::RLE, 0);
    decoder.set_data(encoded).unwrap();
    let mut out = vec![1i16; 10];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, levels);
  }

  #[test]
  fn test_level_declared_length_mismatch() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&5u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8, 0u8]); // only 2 of the declared 5 bytes present
    let mut decoder = LevelDecoder::new(Encoding::RLE, 3);
    let err = decoder.set_data(ByteBufferPtr::new(bytes)).unwrap_err();
    match err {
      ParquetError::TruncatedInput(_) => {},
      other => panic!("expected TruncatedInput, got {:?}", other)
    }
  }
}
