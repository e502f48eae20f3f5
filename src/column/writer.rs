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

//! The typed, flat value/level writer for one column chunk: the inverse of
//! [`super::reader::ColumnReaderImpl`]. Buffers values and levels into data
//! pages, deferring every data page's bytes until `close()` so the
//! dictionary page (if any) can be written first (spec.md §4.F
//! "Column-chunk finalization": "the dictionary page, if present, precedes
//! every data page in a column chunk").

use std::mem;

use crate::basic::*;
use crate::compression::{create_codec, Codec};
use crate::data_type::*;
use crate::encodings::encoding::{DictEncoder, Encoder, PlainEncoder};
use crate::encodings::levels::LevelEncoder;
use crate::errors::Result;
use crate::file::properties::WriterPropertiesPtr;
use crate::schema::types::ColumnDescPtr;
use crate::thrift::format::{DataPageHeader, DictionaryPageHeader, PageHeader, PageType, Statistics};

use super::page::PageWriter;

pub enum ColumnWriter<'a> {
  BoolColumnWriter(ColumnWriterImpl<'a, BoolType>),
  Int32ColumnWriter(ColumnWriterImpl<'a, Int32Type>),
  Int64ColumnWriter(ColumnWriterImpl<'a, Int64Type>),
  Int96ColumnWriter(ColumnWriterImpl<'a, Int96Type>),
  FloatColumnWriter(ColumnWriterImpl<'a, FloatType>),
  DoubleColumnWriter(ColumnWriterImpl<'a, DoubleType>),
  ByteArrayColumnWriter(ColumnWriterImpl<'a, ByteArrayType>),
  FixedLenByteArrayColumnWriter(ColumnWriterImpl<'a, FixedLenByteArrayType>)
}

/// Builds the column writer matching `col_descr`'s physical type.
pub fn get_column_writer<'a>(
  col_descr: ColumnDescPtr,
  props: WriterPropertiesPtr,
  page_writer: Box<dyn PageWriter + 'a>
) -> ColumnWriter<'a> {
  match col_descr.physical_type() {
    Type::BOOLEAN => ColumnWriter::BoolColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::INT32 => ColumnWriter::Int32ColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::INT64 => ColumnWriter::Int64ColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::INT96 => ColumnWriter::Int96ColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::FLOAT => ColumnWriter::FloatColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::DOUBLE => ColumnWriter::DoubleColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::BYTE_ARRAY => ColumnWriter::ByteArrayColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer)),
    Type::FIXED_LEN_BYTE_ARRAY => {
      ColumnWriter::FixedLenByteArrayColumnWriter(ColumnWriterImpl::new(col_descr, props, page_writer))
    }
  }
}

/// Narrows a `ColumnWriter` to its concrete `ColumnWriterImpl<T>`. The
/// caller must know `T` matches the variant actually held, mirroring
/// [`super::reader::get_typed_column_reader`]'s contract.
pub fn get_typed_column_writer<'a, T: DataType>(col_writer: ColumnWriter<'a>) -> ColumnWriterImpl<'a, T> {
  match col_writer {
    ColumnWriter::BoolColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::Int32ColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::Int64ColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::Int96ColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::FloatColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::DoubleColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::ByteArrayColumnWriter(w) => unsafe { mem::transmute(w) },
    ColumnWriter::FixedLenByteArrayColumnWriter(w) => unsafe { mem::transmute(w) }
  }
}

/// Everything the row-group finalizer needs out of one finished column
/// chunk to build its `ColumnMetaData` (spec.md §4.F "Row-group
/// finalization"). Offsets are relative to this column's own page-writer
/// lifetime; translating them into absolute file offsets is the file
/// writer's job, since only it knows where this chunk's bytes landed.
pub struct ColumnCloseResult {
  pub bytes_written: u64,
  pub rows_written: i64,
  pub total_num_values: i64,
  pub total_uncompressed_size: i64,
  pub total_compressed_size: i64,
  pub dictionary_page_offset: Option<i64>,
  pub data_page_offset: i64,
  pub encodings: Vec<Encoding>,
  pub compression: Compression,
  pub statistics: Statistics
}

/// A value writer for a particular primitive column. Buffers every value
/// and level it is given; pages are cut either when buffered bytes cross
/// `WriterProperties::page_size_limit` or when the caller calls
/// [`Self::close`].
pub struct ColumnWriterImpl<'a, T: DataType> {
  descr: ColumnDescPtr,
  props: WriterPropertiesPtr,
  page_writer: Box<dyn PageWriter + 'a>,
  codec: Box<dyn Codec>,

  def_levels_sink: Vec<i16>,
  rep_levels_sink: Vec<i16>,
  values_encoder: Box<dyn Encoder<T>>,
  dict_encoder: Option<DictEncoder<T>>,

  // Values/levels buffered since the last page cut.
  num_buffered_values: usize,
  buffered_encoded_bytes: usize,

  // Pages already built, awaiting `close()` so any dictionary page can be
  // written ahead of them.
  buffered_pages: Vec<(PageHeader, Vec<u8>)>,

  total_num_values: i64,
  total_uncompressed_size: i64,
  total_compressed_size: i64,
  rows_written: i64,
  null_count: i64,
  min_value: Option<T::T>,
  max_value: Option<T::T>,
  encodings_used: Vec<Encoding>
}

impl<'a, T: DataType> ColumnWriterImpl<'a, T>
where
  T: 'static,
  PlainEncoder<T>: Encoder<T>
{
  pub fn new(descr: ColumnDescPtr, props: WriterPropertiesPtr, page_writer: Box<dyn PageWriter + 'a>) -> Self {
    let dict_encoder = if props.dictionary_enabled() { Some(DictEncoder::<T>::new()) } else { None };
    let values_encoder: Box<dyn Encoder<T>> = Box::new(PlainEncoder::<T>::new());
    let codec = create_codec(props.compression())
      .expect("compression codec construction does not fail for a supported Compression value")
      .unwrap_or_else(|| Box::new(NoopCodec) as Box<dyn Codec>);
    ColumnWriterImpl {
      descr,
      props,
      page_writer,
      codec,
      def_levels_sink: Vec::new(),
      rep_levels_sink: Vec::new(),
      values_encoder,
      dict_encoder,
      num_buffered_values: 0,
      buffered_encoded_bytes: 0,
      buffered_pages: Vec::new(),
      total_num_values: 0,
      total_uncompressed_size: 0,
      total_compressed_size: 0,
      rows_written: 0,
      null_count: 0,
      min_value: None,
      max_value: None,
      encodings_used: Vec::new()
    }
  }

  fn note_encoding(&mut self, encoding: Encoding) {
    if !self.encodings_used.contains(&encoding) {
      self.encodings_used.push(encoding);
    }
  }

  /// Buffers one batch of values alongside their definition/repetition
  /// levels (the inverse of `ColumnReaderImpl::read_batch`'s output:
  /// `values.len()` equals the number of levels equal to
  /// `max_def_level`, i.e. the non-null values in this batch). Pass
  /// `None` for a level stream the column does not carry (required,
  /// non-repeated). Returns the number of levels buffered.
  pub fn write_batch(&mut self, values: &[T::T], def_levels: Option<&[i16]>, rep_levels: Option<&[i16]>) -> Result<usize> {
    let num_levels = match (def_levels, rep_levels) {
      (Some(d), _) => d.len(),
      (None, Some(r)) => r.len(),
      (None, None) => values.len()
    };

    if let Some(levels) = def_levels {
      self.def_levels_sink.extend_from_slice(levels);
    }
    match rep_levels {
      Some(levels) => {
        self.rep_levels_sink.extend_from_slice(levels);
        self.rows_written += levels.iter().filter(|&&l| l == 0).count() as i64;
      },
      None => self.rows_written += num_levels as i64
    }

    match self.dict_encoder.as_mut() {
      Some(encoder) => encoder.put(values)?,
      None => self.values_encoder.put(values)?
    }
    for v in values {
      self.update_stats(v);
    }
    self.buffered_encoded_bytes += values.iter().map(|v| v.as_bytes_key().len()).sum::<usize>();
    self.num_buffered_values += num_levels;
    self.total_num_values += num_levels as i64;
    self.null_count += (num_levels - values.len()) as i64;

    if self.buffered_encoded_bytes >= self.props.page_size_limit() {
      self.add_data_page()?;
    }

    Ok(num_levels)
  }

  fn update_stats(&mut self, v: &T::T) {
    if self.min_value.as_ref().map(|m| v.is_less_than(m)).unwrap_or(true) {
      self.min_value = Some(v.clone());
    }
    if self.max_value.as_ref().map(|m| m.is_less_than(v)).unwrap_or(true) {
      self.max_value = Some(v.clone());
    }
  }

  fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    self.codec.compress(input, &mut out)?;
    Ok(out)
  }

  /// Cuts a data page out of everything buffered since the last one.
  /// Does nothing if nothing is buffered, so a trailing `close()` call on
  /// an already-flushed writer is a no-op.
  fn add_data_page(&mut self) -> Result<()> {
    if self.num_buffered_values == 0 {
      return Ok(());
    }

    let max_def_level = self.descr.max_def_level();
    let max_rep_level = self.descr.max_rep_level();
    let mut buffer = Vec::new();

    if max_rep_level > 0 {
      buffer.extend_from_slice(self.encode_levels(max_rep_level, &self.rep_levels_sink)?.as_ref());
      self.note_encoding(Encoding::RLE);
    }
    if max_def_level > 0 {
      buffer.extend_from_slice(self.encode_levels(max_def_level, &self.def_levels_sink)?.as_ref());
      self.note_encoding(Encoding::RLE);
    }

    let (encoding, values_buf) = match self.dict_encoder.as_mut() {
      Some(encoder) => (Encoding::RLE_DICTIONARY, encoder.flush_buffer()?),
      None => (self.values_encoder.encoding(), self.values_encoder.flush_buffer()?)
    };
    self.note_encoding(encoding);
    buffer.extend_from_slice(values_buf.as_ref());

    let uncompressed_size = buffer.len();
    let compressed = self.compress(&buffer)?;
    let compressed_size = compressed.len();

    let header = PageHeader {
      page_type: PageType::DataPage,
      uncompressed_page_size: uncompressed_size as i32,
      compressed_page_size: compressed_size as i32,
      crc: None,
      data_page_header: Some(DataPageHeader {
        num_values: self.num_buffered_values as i32,
        encoding,
        definition_level_encoding: Encoding::RLE,
        repetition_level_encoding: Encoding::RLE,
        statistics: None
      }),
      dictionary_page_header: None,
      data_page_header_v2: None
    };

    self.total_uncompressed_size += uncompressed_size as i64;
    self.total_compressed_size += compressed_size as i64;
    self.buffered_pages.push((header, compressed));

    self.def_levels_sink.clear();
    self.rep_levels_sink.clear();
    self.num_buffered_values = 0;
    self.buffered_encoded_bytes = 0;
    Ok(())
  }

  fn encode_levels(&self, max_level: i16, levels: &[i16]) -> Result<crate::util::memory::ByteBufferPtr> {
    let max_size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; max_size]);
    encoder.put(levels)?;
    encoder.consume()
  }

  /// Flushes any remaining buffered values, writes the dictionary page (if
  /// dictionary encoding was used) ahead of every data page, then drains
  /// the data pages in order (spec.md §4.F "Column-chunk finalization").
  pub fn close(mut self) -> Result<ColumnCloseResult> {
    self.add_data_page()?;

    let distinct_count = self.dict_encoder.as_ref().map(|e| e.num_entries() as i64);

    let dictionary_page_offset = match self.dict_encoder.take() {
      Some(dict_encoder) => {
        let dict_bytes = dict_encoder.write_dict()?;
        let uncompressed_size = dict_bytes.len();
        let compressed = self.compress(dict_bytes.as_ref())?;
        let header = PageHeader {
          page_type: PageType::DictionaryPage,
          uncompressed_page_size: uncompressed_size as i32,
          compressed_page_size: compressed.len() as i32,
          crc: None,
          data_page_header: None,
          dictionary_page_header: Some(DictionaryPageHeader {
            num_values: dict_encoder.num_entries() as i32,
            encoding: Encoding::PLAIN,
            is_sorted: Some(false)
          }),
          data_page_header_v2: None
        };
        let offset = self.page_writer.bytes_written() as i64;
        self.total_uncompressed_size += uncompressed_size as i64;
        self.total_compressed_size += compressed.len() as i64;
        self.page_writer.write_page(header, &compressed)?;
        self.note_encoding(Encoding::PLAIN);
        Some(offset)
      },
      None => None
    };

    let data_page_offset = self.page_writer.bytes_written() as i64;
    for (header, payload) in self.buffered_pages.drain(..) {
      self.page_writer.write_page(header, &payload)?;
    }
    self.page_writer.close()?;

    let statistics = Statistics {
      max: None,
      min: None,
      null_count: Some(self.null_count),
      distinct_count,
      max_value: self.max_value.as_ref().map(|v| v.as_bytes_key()),
      min_value: self.min_value.as_ref().map(|v| v.as_bytes_key()),
      is_max_value_exact: Some(true),
      is_min_value_exact: Some(true)
    };

    Ok(ColumnCloseResult {
      bytes_written: self.page_writer.bytes_written(),
      rows_written: self.rows_written,
      total_num_values: self.total_num_values,
      total_uncompressed_size: self.total_uncompressed_size,
      total_compressed_size: self.total_compressed_size,
      dictionary_page_offset,
      data_page_offset,
      encodings: self.encodings_used,
      compression: self.props.compression(),
      statistics
    })
  }
}

/// Stand-in codec for `Compression::UNCOMPRESSED`, whose `create_codec`
/// returns `None` (no adapter needed). The column writer always wants a
/// `Box<dyn Codec>` in hand so `compress` has one call site regardless of
/// the configured compression.
struct NoopCodec;

impl Codec for NoopCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    output.extend_from_slice(input);
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let n = input.len().min(output.len());
    output[..n].copy_from_slice(&input[..n]);
    Ok(input.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::Type as PhysicalType;
  use crate::file::properties::WriterProperties;
  use crate::schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
  use std::sync::Arc;

  struct VecPageWriter {
    buf: Vec<u8>
  }

  impl VecPageWriter {
    fn new() -> Self {
      VecPageWriter { buf: Vec::new() }
    }
  }

  impl PageWriter for VecPageWriter {
    fn write_page(&mut self, header: PageHeader, compressed_payload: &[u8]) -> Result<usize> {
      let mut w = crate::thrift::protocol::CompactProtocolWriter::new();
      header.write_to(&mut w);
      let header_bytes = w.into_bytes();
      self.buf.extend_from_slice(&header_bytes);
      self.buf.extend_from_slice(compressed_payload);
      Ok(header_bytes.len() + compressed_payload.len())
    }

    fn close(&mut self) -> Result<()> {
      Ok(())
    }

    fn bytes_written(&self) -> u64 {
      self.buf.len() as u64
    }
  }

  fn required_int32_descr() -> ColumnDescPtr {
    let t = SchemaType::new_primitive("a", Repetition::REQUIRED, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    Arc::new(ColumnDescriptor::new(Arc::new(t), 0, 0, ColumnPath::new(vec!["a".to_string()])))
  }

  #[test]
  fn test_write_and_read_back_plain() {
    let descr = required_int32_descr();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let page_writer = Box::new(VecPageWriter::new());
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer);

    let values = vec![1, 2, 3, 4, 5];
    writer.write_batch(&values, None, None).unwrap();
    let result = writer.close().unwrap();

    assert_eq!(result.total_num_values, 5);
    assert_eq!(result.rows_written, 5);
    assert!(result.dictionary_page_offset.is_none());
    assert_eq!(result.statistics.min_value, Some(1i32.to_le_bytes().to_vec()));
    assert_eq!(result.statistics.max_value, Some(5i32.to_le_bytes().to_vec()));
  }

  #[test]
  fn test_write_with_dictionary_orders_dict_page_first() {
    let descr = required_int32_descr();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(true).build());
    let page_writer = Box::new(crate::column::page::SerializedPageWriter::new(Vec::<u8>::new()));
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer);
    let values = vec![7, 7, 9, 11, 9];
    writer.write_batch(&values, None, None).unwrap();
    let result = writer.close().unwrap();

    assert!(result.dictionary_page_offset.is_some());
    assert_eq!(result.dictionary_page_offset.unwrap(), 0);
    assert!(result.data_page_offset > result.dictionary_page_offset.unwrap());
    assert_eq!(result.statistics.distinct_count, Some(3));
  }

  #[test]
  fn test_write_batch_with_nulls_tracks_null_count() {
    let t = SchemaType::new_primitive("a", Repetition::OPTIONAL, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let descr = Arc::new(ColumnDescriptor::new(Arc::new(t), 1, 0, ColumnPath::new(vec!["a".to_string()])));
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let page_writer = Box::new(VecPageWriter::new());
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer);

    let values = vec![10, 20];
    let def_levels = vec![1, 0, 1]; // middle row is null
    writer.write_batch(&values, Some(&def_levels), None).unwrap();
    let result = writer.close().unwrap();

    assert_eq!(result.total_num_values, 3);
    assert_eq!(result.statistics.null_count, Some(1));
  }
}
