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

//! Page assembly (spec.md §4.F): turns a column chunk's byte range into a
//! sequence of [`Page`]s, decompressing each payload against the chunk's
//! codec and checking it against the header's declared uncompressed size.

use std::sync::Mutex;

use crate::basic::{Compression, Encoding};
use crate::compression::create_codec;
use crate::errors::{ParquetError, Result};
use crate::thrift::format::{PageHeader, PageType};
use crate::thrift::protocol::{CompactProtocolReader, CompactProtocolWriter};
use crate::util::io::ChunkReader;
use crate::util::memory::ByteBufferPtr;

/// One decompressed page, its framing already stripped of the Thrift
/// header but not of level streams (the column reader does that).
pub enum Page {
  DataPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    def_level_encoding: Encoding,
    rep_level_encoding: Encoding
  },
  DataPageV2 {
    buf: ByteBufferPtr,
    num_values: u32,
    num_nulls: u32,
    num_rows: u32,
    encoding: Encoding,
    def_levels_byte_len: u32,
    rep_levels_byte_len: u32
  },
  DictionaryPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    is_sorted: bool
  }
}

impl Page {
  pub fn num_values(&self) -> u32 {
    match self {
      Page::DataPage { num_values, .. } => *num_values,
      Page::DataPageV2 { num_values, .. } => *num_values,
      Page::DictionaryPage { num_values, .. } => *num_values
    }
  }

  pub fn encoding(&self) -> Encoding {
    match self {
      Page::DataPage { encoding, .. } => *encoding,
      Page::DataPageV2 { encoding, .. } => *encoding,
      Page::DictionaryPage { encoding, .. } => *encoding
    }
  }

  pub fn buffer(&self) -> &ByteBufferPtr {
    match self {
      Page::DataPage { buf, .. } => buf,
      Page::DataPageV2 { buf, .. } => buf,
      Page::DictionaryPage { buf, .. } => buf
    }
  }
}

/// Produces the pages of one column chunk, in file order.
pub trait PageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>>;
}

/// Reads pages directly from a [`ChunkReader`] byte range, decompressing
/// each against `compression` and verifying the result against the
/// header's `uncompressed_page_size` (spec.md §4.F: a mismatch is
/// `CorruptPage`).
pub struct SerializedPageReader<'a> {
  reader: &'a dyn ChunkReader,
  offset: u64,
  remaining_bytes: u64,
  compression: Compression,
  // `create_codec` is cheap but the codec itself may hold reusable
  // scratch state (spec.md §4.G); built once and reused across pages.
  codec: Mutex<Option<Box<dyn crate::compression::Codec>>>
}

impl<'a> SerializedPageReader<'a> {
  pub fn new(reader: &'a dyn ChunkReader, offset: u64, total_bytes: u64, compression: Compression) -> Result<Self> {
    let codec = create_codec(compression)?;
    Ok(SerializedPageReader { reader, offset, remaining_bytes: total_bytes, compression, codec: Mutex::new(codec) })
  }

  fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<ByteBufferPtr> {
    let mut guard = self.codec.lock().unwrap();
    match guard.as_mut() {
      None => Ok(ByteBufferPtr::new(input.to_vec())),
      Some(codec) => {
        let mut out = vec![0u8; uncompressed_size];
        let n = codec.decompress(input, &mut out)?;
        if n != uncompressed_size {
          return Err(ParquetError::CorruptPage(format!(
            "page declared {} uncompressed bytes but decompressed to {}",
            uncompressed_size, n
          )));
        }
        Ok(ByteBufferPtr::new(out))
      }
    }
  }
}

impl<'a> PageReader for SerializedPageReader<'a> {
  fn get_next_page(&mut self) -> Result<Option<Page>> {
    if self.remaining_bytes == 0 {
      return Ok(None);
    }

    // PageHeader has no declared length; it is a self-delimiting Thrift
    // struct, so read a generous prefix and let the protocol reader stop
    // wherever the struct ends.
    let probe_len = self.remaining_bytes.min(16 * 1024) as usize;
    let probe = self.reader.read_at(self.offset, probe_len)?;
    let mut protocol_reader = CompactProtocolReader::new(&probe);
    let header = PageHeader::read_from(&mut protocol_reader)?;
    let header_len = protocol_reader.bytes_consumed();
    let payload_offset = self.offset + header_len as u64;
    let compressed_size = header.compressed_page_size as usize;
    let payload = self.reader.read_at(payload_offset, compressed_size)?;

    let consumed = header_len as u64 + compressed_size as u64;
    self.offset += consumed;
    self.remaining_bytes = self.remaining_bytes.saturating_sub(consumed);

    match header.page_type {
      PageType::DictionaryPage => {
        let dict_header = header
          .dictionary_page_header
          .ok_or_else(|| malformed_err!("DICTIONARY_PAGE header is missing dictionary_page_header"))?;
        let buf = self.decompress(&payload, header.uncompressed_page_size as usize)?;
        Ok(Some(Page::DictionaryPage {
          buf,
          num_values: dict_header.num_values as u32,
          encoding: dict_header.encoding,
          is_sorted: dict_header.is_sorted.unwrap_or(false)
        }))
      },
      PageType::DataPage => {
        let data_header =
          header.data_page_header.ok_or_else(|| malformed_err!("DATA_PAGE header is missing data_page_header"))?;
        let buf = self.decompress(&payload, header.uncompressed_page_size as usize)?;
        Ok(Some(Page::DataPage {
          buf,
          num_values: data_header.num_values as u32,
          encoding: data_header.encoding,
          def_level_encoding: data_header.definition_level_encoding,
          rep_level_encoding: data_header.repetition_level_encoding
        }))
      },
      PageType::DataPageV2 => {
        let data_header = header
          .data_page_header_v2
          .ok_or_else(|| malformed_err!("DATA_PAGE_V2 header is missing data_page_header_v2"))?;
        // In V2, only the value bytes are compressed; level streams
        // precede them uncompressed in the payload (spec.md §4.F).
        let levels_len = (data_header.definition_levels_byte_length + data_header.repetition_levels_byte_length) as usize;
        let is_compressed = data_header.is_compressed;
        let buf = if is_compressed && levels_len < payload.len() {
          let mut out = Vec::with_capacity(header.uncompressed_page_size as usize);
          out.extend_from_slice(&payload[..levels_len]);
          let uncompressed_values_size = header.uncompressed_page_size as usize - levels_len;
          let decompressed = self.decompress(&payload[levels_len..], uncompressed_values_size)?;
          out.extend_from_slice(decompressed.as_ref());
          ByteBufferPtr::new(out)
        } else {
          ByteBufferPtr::new(payload)
        };
        Ok(Some(Page::DataPageV2 {
          buf,
          num_values: data_header.num_values as u32,
          num_nulls: data_header.num_nulls as u32,
          num_rows: data_header.num_rows as u32,
          encoding: data_header.encoding,
          def_levels_byte_len: data_header.definition_levels_byte_length as u32,
          rep_levels_byte_len: data_header.repetition_levels_byte_length as u32
        }))
      },
      PageType::IndexPage => {
        // Benign to skip (spec.md §4.F: "unknown page type ... skip if
        // benign, e.g. index pages"); recurse to the next page.
        self.get_next_page()
      }
    }
  }
}

/// Accepts already-compressed page payloads and records them to the
/// underlying sink, returning each page's on-disk byte size so the
/// caller can track offsets for `ColumnChunk`/`ColumnMetaData`.
pub trait PageWriter {
  fn write_page(&mut self, header: PageHeader, compressed_payload: &[u8]) -> Result<usize>;

  /// Flushes any buffered state; called once per column chunk.
  fn close(&mut self) -> Result<()>;

  /// Total bytes written so far through `write_page`, relative to this
  /// writer's own start. Lets a column writer compute page offsets
  /// relative to its own chunk without knowing the file's absolute
  /// position (spec.md §4.F "Column-chunk finalization").
  fn bytes_written(&self) -> u64;
}

/// Writes a column chunk's pages sequentially to an in-memory buffer,
/// which the column-chunk finalizer then copies into the file's data
/// section (spec.md §4.F "Page writer").
pub struct SerializedPageWriter<W: std::io::Write> {
  sink: W,
  bytes_written: u64
}

impl<W: std::io::Write> SerializedPageWriter<W> {
  pub fn new(sink: W) -> Self {
    SerializedPageWriter { sink, bytes_written: 0 }
  }
}

impl<W: std::io::Write> PageWriter for SerializedPageWriter<W> {
  fn write_page(&mut self, header: PageHeader, compressed_payload: &[u8]) -> Result<usize> {
    let mut protocol_writer = CompactProtocolWriter::new();
    header.write_to(&mut protocol_writer);
    let header_bytes = protocol_writer.into_bytes();
    self.sink.write_all(&header_bytes)?;
    self.sink.write_all(compressed_payload)?;
    let total = header_bytes.len() + compressed_payload.len();
    self.bytes_written += total as u64;
    Ok(total)
  }

  fn close(&mut self) -> Result<()> {
    self.sink.flush()?;
    Ok(())
  }

  fn bytes_written(&self) -> u64 {
    self.bytes_written
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::thrift::format::{DataPageHeader, DictionaryPageHeader};

  fn page_header_bytes(uncompressed: i32, compressed: i32, data_header: DataPageHeader) -> Vec<u8> {
    let header = PageHeader {
      page_type: PageType::DataPage,
      uncompressed_page_size: uncompressed,
      compressed_page_size: compressed,
      crc: None,
      data_page_header: Some(data_header),
      dictionary_page_header: None,
      data_page_header_v2: None
    };
    let mut w = CompactProtocolWriter::new();
    header.write_to(&mut w);
    w.into_bytes()
  }

  #[test]
  fn test_read_one_uncompressed_data_page() {
    let data_header = DataPageHeader {
      num_values: 3,
      encoding: Encoding::PLAIN,
      definition_level_encoding: Encoding::RLE,
      repetition_level_encoding: Encoding::RLE,
      statistics: None
    };
    let payload = vec![1u8, 2, 3, 4];
    let mut file = page_header_bytes(payload.len() as i32, payload.len() as i32, data_header);
    file.extend_from_slice(&payload);
    let total_len = file.len() as u64;

    let mut reader = SerializedPageReader::new(&file, 0, total_len, Compression::UNCOMPRESSED).unwrap();
    let page = reader.get_next_page().unwrap().unwrap();
    match page {
      Page::DataPage { buf, num_values, encoding, .. } => {
        assert_eq!(num_values, 3);
        assert_eq!(encoding, Encoding::PLAIN);
        assert_eq!(buf.as_ref(), &payload[..]);
      },
      _ => panic!("expected DataPage")
    }
    assert!(reader.get_next_page().unwrap().is_none());
  }

  #[test]
  fn test_dictionary_page_header_is_required() {
    let header = PageHeader {
      page_type: PageType::DictionaryPage,
      uncompressed_page_size: 0,
      compressed_page_size: 0,
      crc: None,
      data_page_header: None,
      dictionary_page_header: None,
      data_page_header_v2: None
    };
    let mut w = CompactProtocolWriter::new();
    header.write_to(&mut w);
    let file = w.into_bytes();
    let total_len = file.len() as u64;
    let mut reader = SerializedPageReader::new(&file, 0, total_len, Compression::UNCOMPRESSED).unwrap();
    let err = reader.get_next_page().unwrap_err();
    match err {
      ParquetError::Malformed(_) => {},
      other => panic!("expected Malformed, got {:?}", other)
    }
  }

  #[test]
  fn test_dictionary_page_roundtrip() {
    let dict_header = DictionaryPageHeader { num_values: 2, encoding: Encoding::PLAIN, is_sorted: Some(false) };
    let header = PageHeader {
      page_type: PageType::DictionaryPage,
      uncompressed_page_size: 8,
      compressed_page_size: 8,
      crc: None,
      data_page_header: None,
      dictionary_page_header: Some(dict_header),
      data_page_header_v2: None
    };
    let mut w = CompactProtocolWriter::new();
    header.write_to(&mut w);
    let mut file = w.into_bytes();
    let payload = vec![9u8; 8];
    file.extend_from_slice(&payload);
    let total_len = file.len() as u64;

    let mut reader = SerializedPageReader::new(&file, 0, total_len, Compression::UNCOMPRESSED).unwrap();
    let page = reader.get_next_page().unwrap().unwrap();
    match page {
      Page::DictionaryPage { num_values, buf, .. } => {
        assert_eq!(num_values, 2);
        assert_eq!(buf.as_ref(), &payload[..]);
      },
      _ => panic!("expected DictionaryPage")
    }
  }
}
