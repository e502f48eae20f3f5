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

//! Component B: the RLE / bit-packed hybrid codec, used both for
//! definition/repetition level streams (length-prefixed framing) and for
//! RLE_DICTIONARY value-index streams (bit-width-prefixed framing). This
//! module decodes/encodes the raw run sequence; [`super::levels`] layers
//! the level-stream framing on top, and [`super::decoding`]'s
//! [`super::decoding::DictDecoder`] layers the dictionary-index framing.

use std::cmp::min;
use std::mem;

use crate::data_type::ParquetValueType;
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::{num_required_bits, BitReader, BitWriter, FromBits};
use crate::util::memory::ByteBufferPtr;

const MAX_VLQ_BYTE_LEN: usize = 10;

/// Decodes a raw RLE/bit-packed run sequence with a known, fixed
/// `bit_width`. Produces values until the caller stops asking or the
/// source is exhausted; a run declaring more values than are ultimately
/// consumed leaves the remainder of its last bit-packed group unread,
/// which is the "excess values are padding" rule in spec.md §4.B.
pub struct RleDecoder {
  bit_width: u8,
  bit_reader: Option<BitReader>,
  // Remaining repetitions of `rle_value` in the current RLE run.
  rle_left: usize,
  // Remaining values in the current bit-packed run.
  bit_packed_left: usize,
  rle_value: u64
}

impl RleDecoder {
  pub fn new(bit_width: u8) -> Self {
    RleDecoder {
      bit_width,
      bit_reader: None,
      rle_left: 0,
      bit_packed_left: 0,
      rle_value: 0
    }
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.bit_reader = Some(BitReader::new(data));
    self.rle_left = 0;
    self.bit_packed_left = 0;
  }

  fn value_byte_width(&self) -> usize {
    (self.bit_width as usize + 7) / 8
  }

  /// Reads the next run header, setting up either `rle_left`+`rle_value`
  /// or `bit_packed_left`. Returns `Ok(false)` when there is no more data
  /// (a legitimate end of stream, not an error).
  fn reload(&mut self) -> Result<bool> {
    let reader = self.bit_reader.as_mut().expect("set_data must be called first");
    let header = match reader.get_vlq_int() {
      Some(h) => h,
      None => return Ok(false)
    };
    if header < 0 {
      return Err(ParquetError::InvalidRunHeader("run header varint overflowed".to_string()));
    }
    let count = (header >> 1) as i64;
    let is_bit_packed = header & 1 == 1;

    if is_bit_packed {
      // `count` is the number of groups of 8 values.
      let num_groups = count as usize;
      let num_values = num_groups
        .checked_mul(8)
        .ok_or_else(|| ParquetError::InvalidRunHeader("bit-packed group count overflowed".to_string()))?;
      let _payload_bytes = num_groups
        .checked_mul(self.bit_width as usize)
        .ok_or_else(|| ParquetError::InvalidRunHeader("bit-packed payload size overflowed".to_string()))?;
      self.bit_packed_left = num_values;
    } else {
      let byte_width = self.value_byte_width();
      let value = reader
        .get_aligned::<u64>(byte_width)
        .ok_or_else(|| eof_err!("not enough bytes for RLE run value"))?;
      self.rle_value = value;
      self.rle_left = count as usize;
    }
    Ok(true)
  }

  /// Fills `buffer` with up to `buffer.len()` values, returning the
  /// number actually produced (fewer only when the source is exhausted).
  pub fn get_batch<T: FromBits>(&mut self, buffer: &mut [T]) -> Result<usize> {
    let mut values_read = 0;
    while values_read < buffer.len() {
      if self.rle_left == 0 && self.bit_packed_left == 0 {
        if !self.reload()? {
          break;
        }
      }
      if self.rle_left > 0 {
        let n = min(buffer.len() - values_read, self.rle_left);
        let v = T::from_u64(self.rle_value);
        for slot in &mut buffer[values_read..values_read + n] {
          *slot = v;
        }
        self.rle_left -= n;
        values_read += n;
      } else if self.bit_packed_left > 0 {
        let n = min(buffer.len() - values_read, self.bit_packed_left);
        let reader = self.bit_reader.as_mut().unwrap();
        for i in 0..n {
          buffer[values_read + i] = reader
            .get_value::<T>(self.bit_width as usize)
            .ok_or_else(|| eof_err!("not enough bytes for bit-packed value"))?;
        }
        self.bit_packed_left -= n;
        values_read += n;
      }
    }
    Ok(values_read)
  }

  /// Like [`get_batch`](Self::get_batch) but looks each decoded index up
  /// in `dict`, failing with `Malformed` when an index is out of range
  /// (spec.md §4.F: "dictionary index >= dictionary size => Malformed").
  pub fn get_batch_with_dict<T: ParquetValueType>(
    &mut self,
    dict: &[T],
    buffer: &mut [T],
    num_values: usize
  ) -> Result<usize> {
    let mut indices = vec![0u32; num_values];
    let n = self.get_batch::<u32>(&mut indices[..num_values])?;
    for i in 0..n {
      let idx = indices[i] as usize;
      if idx >= dict.len() {
        return Err(malformed_err!("dictionary index {} out of range (dict size {})", idx, dict.len()));
      }
      buffer[i] = dict[idx].clone();
    }
    Ok(n)
  }

  /// Number of bytes the underlying bit reader has consumed so far.
  pub fn bytes_consumed(&self) -> usize {
    self.bit_reader.as_ref().map(|r| r.get_byte_offset()).unwrap_or(0)
  }
}

/// Encodes a sequence of unsigned integers (each fitting in `bit_width`
/// bits) as a run sequence: a run of >= 8 consecutive identical values
/// becomes an RLE run, and every other stretch becomes bit-packed groups
/// of 8. Values are buffered raw as they arrive via [`Self::put`]; the
/// run/group split is computed once, over the whole buffer, in
/// [`Self::consume`] — simpler to get right than tracking partial run
/// state incrementally, and `put` is never interleaved with reading the
/// output (see [`super::levels::LevelEncoder`], [`super::encoding::
/// DictEncoder::flush_buffer`]).
pub struct RleEncoder {
  bit_width: u8,
  buffer: Vec<u8>,
  values: Vec<u64>
}

impl RleEncoder {
  pub fn new(bit_width: u8, initial_capacity: usize) -> Self {
    RleEncoder { bit_width, buffer: Vec::with_capacity(initial_capacity), values: Vec::new() }
  }

  /// Appends one value to the encoder.
  pub fn put(&mut self, value: u64) {
    self.values.push(value);
  }

  fn emit_bit_packed_group(&mut self, group: &[u64]) {
    let header = 1u64 << 1 | 1;
    let mut header_bytes = Vec::new();
    crate::util::bit_util::write_uvarint(header, &mut header_bytes);
    self.buffer.extend_from_slice(&header_bytes);

    let mut writer = BitWriter::new(group.len() * self.bit_width as usize);
    for &v in group {
      writer.put_value(v, self.bit_width as usize);
    }
    self.buffer.extend_from_slice(&writer.consume());
  }

  fn emit_rle_run(&mut self, value: u64, repeat_count: usize) {
    let header = (repeat_count as u64) << 1;
    crate::util::bit_util::write_uvarint(header, &mut self.buffer);
    let byte_width = (self.bit_width as usize + 7) / 8;
    let mut writer = BitWriter::new(byte_width.max(1));
    writer.put_aligned(value, byte_width);
    self.buffer.extend_from_slice(&writer.consume());
  }

  /// Splits the whole buffered value sequence into runs of >= 8 equal
  /// values (emitted as RLE) and groups of exactly 8 otherwise-packed
  /// values (emitted bit-packed). Each step consumes either a whole run
  /// or the next up-to-8 raw values outright — never deferring a partial
  /// group across iterations — so the only group that can come up short
  /// is the very last one, when fewer than 8 values remain at the true
  /// end of the buffer. Zero-padding a group anywhere else would shift
  /// every later value out of position once the decoder replays it.
  pub fn consume(mut self) -> Vec<u8> {
    let n = self.values.len();
    let mut i = 0;

    while i < n {
      let value = self.values[i];
      let mut run_end = i + 1;
      while run_end < n && self.values[run_end] == value {
        run_end += 1;
      }
      let run_len = run_end - i;

      if run_len >= 8 {
        self.emit_rle_run(value, run_len);
        i = run_end;
      } else {
        let end = min(i + 8, n);
        let mut group: Vec<u64> = self.values[i..end].to_vec();
        i = end;
        if group.len() < 8 {
          // Only reachable on the last group: the decoder is told the
          // true value count separately via num_values (spec.md §4.B),
          // so the padding is never read back as real data.
          group.resize(8, 0);
        }
        self.emit_bit_packed_group(&group);
      }
    }

    self.buffer
  }
}

/// Computes the bit width implied by a maximum level (spec.md §4.B).
pub fn level_bit_width(max_level: i16) -> u8 {
  num_required_bits(max_level as i64) as u8
}

/// Upper bound on the number of bytes a worst-case bit-packed-only
/// encoding of `num_values` values at `bit_width` bits could need, plus
/// room for run headers. Used to size encoder buffers up front.
pub fn max_rle_buffer_size(bit_width: u8, num_values: usize) -> usize {
  let num_groups = (num_values + 7) / 8;
  num_groups * (bit_width as usize) + MAX_VLQ_BYTE_LEN * (num_groups + 1) + mem::size_of::<u64>()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(values: &[u32], bit_width: u8) -> Vec<u32> {
    let mut encoder = RleEncoder::new(bit_width, 64);
    for &v in values {
      encoder.put(v as u64);
    }
    let bytes = encoder.consume();

    let mut decoder = RleDecoder::new(bit_width);
    decoder.set_data(ByteBufferPtr::new(bytes));
    let mut out = vec![0u32; values.len()];
    let mut read = 0;
    while read < out.len() {
      let n = decoder.get_batch(&mut out[read..]).unwrap();
      if n == 0 {
        break;
      }
      read += n;
    }
    out.truncate(read);
    out
  }

  #[test]
  fn test_all_same_value_rle_run() {
    let values = vec![5u32; 100];
    assert_eq!(roundtrip(&values, 3), values);
  }

  #[test]
  fn test_all_distinct_bit_packed() {
    let values: Vec<u32> = (0..40).map(|i| i % 8).collect();
    assert_eq!(roundtrip(&values, 3), values);
  }

  #[test]
  fn test_mixed_runs() {
    let mut values = vec![1u32; 20];
    values.extend((0..16).map(|i| i % 4));
    values.extend(vec![9u32; 9]);
    assert_eq!(roundtrip(&values, 4), values);
  }

  #[test]
  fn test_zero_bit_width() {
    let values = vec![0u32; 17];
    assert_eq!(roundtrip(&values, 0), values);
  }

  #[test]
  fn test_bit_width_32() {
    let values: Vec<u32> = vec![0, u32::max_value(), 123456789, 1];
    assert_eq!(roundtrip(&values, 32), values);
  }

  #[test]
  fn test_dictionary_index_out_of_range() {
    let mut encoder = RleEncoder::new(2, 16);
    for v in [0u64, 1, 2, 3] {
      encoder.put(v);
    }
    let bytes = encoder.consume();
    let mut decoder = RleDecoder::new(2);
    decoder.set_data(ByteBufferPtr::new(bytes));
    let dict: Vec<i32> = vec![10, 20, 30];
    let mut buffer = vec![0i32; 4];
    let err = decoder.get_batch_with_dict(&dict, &mut buffer, 4).unwrap_err();
    match err {
      ParquetError::Malformed(_) => {},
      other => panic!("expected Malformed, got {:?}", other)
    }
  }
}
