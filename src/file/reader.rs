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

//! Opens a Parquet file: verifies both `PAR1` magics, locates and decodes
//! the footer, and hands out lazy row-group/column-chunk readers (spec.md
//! §4.D "File layout", §5 "Lifecycle").

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::column::page::{PageReader, SerializedPageReader};
use crate::column::reader::{get_column_reader, ColumnReader};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{parse_file_metadata, ParquetMetaData, RowGroupMetaData};
use crate::file::properties::{ReaderProperties, ReaderPropertiesPtr};
use crate::thrift::format;
use crate::thrift::protocol::CompactProtocolReader;
use crate::util::io::{BufferedReader, ChunkReader};

/// Magic bytes expected at offset 0 and at `file_size - 4` (spec.md §4.D).
pub const PARQUET_MAGIC: [u8; 4] = *b"PAR1";

/// Fixed-size trailer: a 4-byte LE footer length followed by the magic.
const FOOTER_SIZE: u64 = 8;

/// A fully opened Parquet file: its decoded metadata plus a handle it can
/// use to hand out lazy per-row-group readers.
pub trait FileReader {
  fn metadata(&self) -> &ParquetMetaData;

  fn num_row_groups(&self) -> usize {
    self.metadata().num_row_groups()
  }

  fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>>;
}

/// One row group's worth of column chunks, opened lazily per column.
pub trait RowGroupReader {
  fn metadata(&self) -> &RowGroupMetaData;

  fn num_columns(&self) -> usize {
    self.metadata().num_columns()
  }

  fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader + '_>>;

  fn get_column_reader(&self, i: usize) -> Result<ColumnReader<'_>>;
}

/// Reads the trailing magic + footer length, decodes the Thrift-Compact
/// `FileMetaData`, and returns the parsed [`ParquetMetaData`] alongside the
/// byte offset where row-group data starts (always `PARQUET_MAGIC.len()`).
fn read_metadata<R: ChunkReader + ?Sized>(reader: &R, props: &ReaderProperties) -> Result<ParquetMetaData> {
  let file_size = reader.len()?;
  if file_size < FOOTER_SIZE + PARQUET_MAGIC.len() as u64 {
    return Err(ParquetError::InvalidMagic(format!(
      "file of {} bytes is smaller than the minimum valid size of 12",
      file_size
    )));
  }

  // Magic checks and the footer-length probe are small, short-lived reads;
  // route them through the buffered window (spec.md §5) instead of hitting
  // the underlying reader for each one individually.
  let buffered = BufferedReader::new(reader, props.buffer_size());

  let head = buffered.read_at(0, PARQUET_MAGIC.len())?;
  if head != PARQUET_MAGIC {
    return Err(ParquetError::InvalidMagic("header magic mismatch".to_string()));
  }

  let tail = buffered.read_at(file_size - FOOTER_SIZE, FOOTER_SIZE as usize)?;
  if tail[4..8] != PARQUET_MAGIC {
    return Err(ParquetError::InvalidMagic("trailing magic mismatch".to_string()));
  }
  let footer_len = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]) as u64;

  if footer_len + FOOTER_SIZE > file_size {
    return Err(general_err!(
      "footer length {} runs past the start of the file (file is {} bytes)",
      footer_len,
      file_size
    ));
  }

  let metadata_start = file_size - FOOTER_SIZE - footer_len;
  let metadata_bytes = reader.read_at(metadata_start, footer_len as usize)?;
  let mut protocol_reader = CompactProtocolReader::new(&metadata_bytes);
  let t_file_metadata = format::FileMetaData::read_from(&mut protocol_reader)?;
  parse_file_metadata(t_file_metadata)
}

/// A Parquet file opened over any [`ChunkReader`] (a `File` in production,
/// an in-memory `Vec<u8>` in tests).
pub struct SerializedFileReader<R> {
  chunk_reader: Arc<R>,
  metadata: ParquetMetaData,
  props: ReaderPropertiesPtr
}

impl SerializedFileReader<File> {
  pub fn try_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
    let file = File::open(path)?;
    Self::new(file)
  }
}

impl<R: ChunkReader> SerializedFileReader<R> {
  pub fn new(chunk_reader: R) -> Result<Self> {
    Self::new_with_properties(chunk_reader, Arc::new(ReaderProperties::default()))
  }

  pub fn new_with_properties(chunk_reader: R, props: ReaderPropertiesPtr) -> Result<Self> {
    let metadata = read_metadata(&chunk_reader, &props)?;
    Ok(SerializedFileReader { chunk_reader: Arc::new(chunk_reader), metadata, props })
  }
}

impl<R: ChunkReader> FileReader for SerializedFileReader<R> {
  fn metadata(&self) -> &ParquetMetaData {
    &self.metadata
  }

  fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>> {
    if i >= self.metadata.num_row_groups() {
      return Err(general_err!(
        "row group index {} out of range, file has {} row groups",
        i,
        self.metadata.num_row_groups()
      ));
    }
    Ok(Box::new(SerializedRowGroupReader {
      chunk_reader: self.chunk_reader.as_ref(),
      row_group_metadata: self.metadata.row_group(i).clone(),
      props: self.props.clone()
    }))
  }
}

/// One row group's columns, each opened on demand against the same
/// underlying [`ChunkReader`] used to open the file.
pub struct SerializedRowGroupReader<'a, R: ChunkReader> {
  chunk_reader: &'a R,
  row_group_metadata: RowGroupMetaData,
  props: ReaderPropertiesPtr
}

impl<'a, R: ChunkReader> RowGroupReader for SerializedRowGroupReader<'a, R> {
  fn metadata(&self) -> &RowGroupMetaData {
    &self.row_group_metadata
  }

  fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader + '_>> {
    let col = self.row_group_metadata.column(i);
    let start = col.starting_page_offset() as u64;
    Ok(Box::new(SerializedPageReader::new(
      self.chunk_reader,
      start,
      col.compressed_size() as u64,
      col.compression()
    )?))
  }

  fn get_column_reader(&self, i: usize) -> Result<ColumnReader<'_>> {
    let col_descr = self.row_group_metadata.schema_descr().column(i);
    let page_reader = self.get_column_page_reader(i)?;
    Ok(get_column_reader(col_descr, page_reader))
  }
}

/// Used internally when a caller wants a buffered window over the file
/// instead of going straight to the raw [`ChunkReader`] (spec.md §5).
pub fn buffered_reader<R: ChunkReader>(reader: &R, buffer_size: usize) -> BufferedReader<'_> {
  BufferedReader::new(reader, buffer_size)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Encoding, Repetition, Type as PhysicalType};
  use crate::column::page::{Page, SerializedPageWriter};
  use crate::column::writer::{get_column_writer, get_typed_column_writer, ColumnWriterImpl};
  use crate::data_type::Int32Type;
  use crate::file::metadata::{
    file_metadata_to_thrift, ColumnChunkMetaData, FileMetaData as CoreFileMetaData, ParquetMetaData, RowGroupMetaDataBuilder
  };
  use crate::file::properties::WriterProperties;
  use crate::schema::types::{SchemaDescriptor, Type};
  use crate::thrift::protocol::CompactProtocolWriter;

  fn build_int32_schema() -> Arc<SchemaDescriptor> {
    let leaf = Type::new_primitive("value", Repetition::REQUIRED, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(leaf)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  fn write_one_column_file(values: &[i32]) -> Vec<u8> {
    let schema_descr = build_int32_schema();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());

    let mut page_bytes: Vec<u8> = Vec::new();
    let close_result = {
      let page_writer = SerializedPageWriter::new(&mut page_bytes);
      let col_writer = get_column_writer(schema_descr.column(0), props, Box::new(page_writer));
      let mut typed: ColumnWriterImpl<Int32Type> = get_typed_column_writer(col_writer);
      typed.write_batch(values, None, None).unwrap();
      typed.close().unwrap()
    };

    let mut file = Vec::new();
    file.extend_from_slice(&PARQUET_MAGIC);
    let data_start = file.len() as i64;
    file.extend_from_slice(&page_bytes);

    let column_descr = schema_descr.column(0);
    let num_rows = close_result.rows_written;
    let mut rg_builder = RowGroupMetaDataBuilder::new(schema_descr.clone());
    rg_builder.set_num_rows(num_rows);
    rg_builder.push_column(ColumnChunkMetaData::from_close_result(column_descr, close_result, data_start));
    let row_group_metadata = rg_builder.build();

    let file_metadata = CoreFileMetaData::new(1, num_rows, None, schema_descr.clone(), None);
    let metadata = ParquetMetaData::new(file_metadata, vec![row_group_metadata]);
    let t_file_metadata = file_metadata_to_thrift(&metadata);

    let mut protocol_writer = CompactProtocolWriter::new();
    t_file_metadata.write_to(&mut protocol_writer);
    let footer_bytes = protocol_writer.into_bytes();
    let footer_len = footer_bytes.len() as u32;
    file.extend_from_slice(&footer_bytes);
    file.extend_from_slice(&footer_len.to_le_bytes());
    file.extend_from_slice(&PARQUET_MAGIC);
    file
  }

  #[test]
  fn test_rejects_bad_header_magic() {
    let mut file = write_one_column_file(&[1, 2, 3]);
    file[0] = 0;
    let err = SerializedFileReader::new(file).unwrap_err();
    match err {
      ParquetError::InvalidMagic(_) => {},
      other => panic!("expected InvalidMagic, got {:?}", other)
    }
  }

  #[test]
  fn test_rejects_bad_trailing_magic() {
    let mut file = write_one_column_file(&[1, 2, 3]);
    let n = file.len();
    file[n - 1] = 0;
    let err = SerializedFileReader::new(file).unwrap_err();
    match err {
      ParquetError::InvalidMagic(_) => {},
      other => panic!("expected InvalidMagic, got {:?}", other)
    }
  }

  #[test]
  fn test_rejects_file_too_small() {
    let err = SerializedFileReader::new(vec![0u8; 4]).unwrap_err();
    match err {
      ParquetError::InvalidMagic(_) => {},
      other => panic!("expected InvalidMagic, got {:?}", other)
    }
  }

  #[test]
  fn test_reads_back_written_values() {
    let file = write_one_column_file(&[10, 20, 30]);
    let reader = SerializedFileReader::new(file).unwrap();
    assert_eq!(reader.num_row_groups(), 1);
    let row_group = reader.get_row_group(0).unwrap();
    assert_eq!(row_group.metadata().num_rows(), 3);

    let mut page_reader = row_group.get_column_page_reader(0).unwrap();
    let page = page_reader.get_next_page().unwrap().unwrap();
    match page {
      Page::DataPage { num_values, encoding, .. } => {
        assert_eq!(num_values, 3);
        assert_eq!(encoding, Encoding::PLAIN);
      },
      _ => panic!("expected a DataPage")
    }
  }
}
