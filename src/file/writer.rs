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

//! Assembles row groups and column chunks into a complete Parquet file
//! (spec.md §4.F "Column-chunk finalization" / "Row-group finalization" /
//! "File finalization"). Tracks the running byte offset itself, since column
//! writers only know offsets relative to their own page-writer lifetime.

use std::io::Write;

use crate::column::page::SerializedPageWriter;
use crate::column::writer::{get_column_writer, get_typed_column_writer};
use crate::data_type::DataType;
use crate::errors::Result;
use crate::file::metadata::{
  file_metadata_to_thrift, ColumnChunkMetaData, FileMetaData, ParquetMetaData, RowGroupMetaData, RowGroupMetaDataBuilder
};
use crate::file::properties::{WriterProperties, WriterPropertiesPtr};
use crate::file::reader::PARQUET_MAGIC;
use crate::schema::types::SchemaDescPtr;
use crate::thrift::protocol::CompactProtocolWriter;

/// Wraps any `Write` sink with a running byte counter, so column chunks and
/// the footer can be placed at known absolute offsets without seeking.
struct TrackedWrite<W: Write> {
  sink: W,
  bytes_written: u64
}

impl<W: Write> TrackedWrite<W> {
  fn new(sink: W) -> Self {
    TrackedWrite { sink, bytes_written: 0 }
  }
}

impl<W: Write> Write for TrackedWrite<W> {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    let n = self.sink.write(buf)?;
    self.bytes_written += n as u64;
    Ok(n)
  }

  fn flush(&mut self) -> std::io::Result<()> {
    self.sink.flush()
  }
}

/// Writes one Parquet file: the leading magic, every row group's column
/// chunks in turn, then the Thrift-Compact footer and trailer.
pub struct SerializedFileWriter<W: Write> {
  sink: TrackedWrite<W>,
  schema_descr: SchemaDescPtr,
  props: WriterPropertiesPtr,
  row_groups: Vec<RowGroupMetaData>,
  num_rows: i64,
  finished: bool
}

impl<W: Write> SerializedFileWriter<W> {
  pub fn new(mut sink: W, schema_descr: SchemaDescPtr, props: WriterPropertiesPtr) -> Result<Self> {
    sink.write_all(&PARQUET_MAGIC)?;
    Ok(SerializedFileWriter {
      sink: TrackedWrite { sink, bytes_written: PARQUET_MAGIC.len() as u64 },
      schema_descr,
      props,
      row_groups: Vec::new(),
      num_rows: 0,
      finished: false
    })
  }

  /// Opens the next row group. Every column must be written, in schema
  /// order, before the returned writer is closed.
  pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<'_, W>> {
    Ok(SerializedRowGroupWriter {
      file_writer: self,
      builder: None,
      next_column: 0
    })
  }

  fn append_row_group(&mut self, row_group: RowGroupMetaData) {
    self.num_rows += row_group.num_rows();
    self.row_groups.push(row_group);
  }

  /// Writes the footer and trailing magic, consuming the writer. No more
  /// row groups may be written afterward (spec.md §4.F "File
  /// finalization").
  pub fn close(mut self) -> Result<ParquetMetaData> {
    self.finish()
  }

  fn finish(&mut self) -> Result<ParquetMetaData> {
    if self.finished {
      return Err(general_err!("file writer already closed"));
    }
    self.finished = true;

    let file_metadata = FileMetaData::new(
      1,
      self.num_rows,
      Some(self.props.created_by().to_string()),
      self.schema_descr.clone(),
      None
    );
    let metadata = ParquetMetaData::new(file_metadata, std::mem::take(&mut self.row_groups));
    let t_file_metadata = file_metadata_to_thrift(&metadata);

    let mut protocol_writer = CompactProtocolWriter::new();
    t_file_metadata.write_to(&mut protocol_writer);
    let footer_bytes = protocol_writer.into_bytes();
    let footer_len = footer_bytes.len() as u32;

    self.sink.write_all(&footer_bytes)?;
    self.sink.write_all(&footer_len.to_le_bytes())?;
    self.sink.write_all(&PARQUET_MAGIC)?;
    self.sink.flush()?;

    Ok(metadata)
  }
}

impl<W: Write> Drop for SerializedFileWriter<W> {
  fn drop(&mut self) {
    if !self.finished {
      let _ = self.finish();
    }
  }
}

/// Writes one row group's columns, in schema order, into the file's
/// shared byte stream.
pub struct SerializedRowGroupWriter<'a, W: Write> {
  file_writer: &'a mut SerializedFileWriter<W>,
  builder: Option<RowGroupMetaDataBuilder>,
  next_column: usize
}

impl<'a, W: Write> SerializedRowGroupWriter<'a, W> {
  /// Writes one column's entire contents, in schema order, and records its
  /// closed metadata. Columns must be written in schema order (spec.md
  /// §4.F: "the dictionary page, if present, precedes every data page in
  /// a column chunk" applies per column; column order across the chunk
  /// follows the schema's leaf order).
  pub fn write_column<T: DataType>(
    &mut self,
    values: &[T::T],
    def_levels: Option<&[i16]>,
    rep_levels: Option<&[i16]>
  ) -> Result<()>
  where
    crate::encodings::encoding::PlainEncoder<T>: crate::encodings::encoding::Encoder<T>
  {
    let col_descr = self.file_writer.schema_descr.column(self.next_column);
    let base_offset = self.file_writer.sink.bytes_written as i64;
    let page_writer = Box::new(SerializedPageWriter::new(ColumnSink { base: &mut self.file_writer.sink }));
    let col_writer = get_column_writer(col_descr.clone(), self.file_writer.props.clone(), page_writer);
    let mut typed = get_typed_column_writer::<T>(col_writer);
    typed.write_batch(values, def_levels, rep_levels)?;
    let close_result = typed.close()?;

    if self.builder.is_none() {
      self.builder = Some(RowGroupMetaDataBuilder::new(self.file_writer.schema_descr.clone()));
    }
    let builder = self.builder.as_mut().unwrap();
    builder.push_column(ColumnChunkMetaData::from_close_result(col_descr, close_result, base_offset));
    self.next_column += 1;
    Ok(())
  }

  /// Finalizes the row group: rolls every column chunk's row count into
  /// the group's `num_rows` and hands the group to the file writer
  /// (spec.md §4.F "Row-group finalization").
  pub fn close(mut self) -> Result<()> {
    let builder = self
      .builder
      .take()
      .ok_or_else(|| general_err!("row group closed with no columns written"))?;
    let row_group = builder.build();
    self.file_writer.append_row_group(row_group);
    Ok(())
  }
}

/// Adapter presenting one column's slice of the shared file stream as an
/// independent `Write`, so `SerializedPageWriter` can track a column's own
/// byte count while every byte still lands in the same underlying sink.
struct ColumnSink<'a, W: Write> {
  base: &'a mut TrackedWrite<W>
}

impl<'a, W: Write> Write for ColumnSink<'a, W> {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.base.write(buf)
  }

  fn flush(&mut self) -> std::io::Result<()> {
    self.base.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Repetition, Type as PhysicalType};
  use crate::data_type::Int32Type;
  use crate::file::reader::{FileReader, SerializedFileReader};
  use crate::schema::types::{SchemaDescriptor, Type};
  use std::sync::Arc;

  fn one_column_schema() -> SchemaDescPtr {
    let leaf = Type::new_primitive("value", Repetition::REQUIRED, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(leaf)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  #[test]
  fn test_write_one_row_group_round_trips() {
    let schema_descr = one_column_schema();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let buf: Vec<u8> = Vec::new();
    let mut writer = SerializedFileWriter::new(buf, schema_descr, props).unwrap();

    {
      let mut rg_writer = writer.next_row_group().unwrap();
      rg_writer.write_column::<Int32Type>(&[1, 2, 3, 4], None, None).unwrap();
      rg_writer.close().unwrap();
    }

    let metadata = writer.close().unwrap();
    assert_eq!(metadata.num_row_groups(), 1);
    assert_eq!(metadata.row_group(0).num_rows(), 4);
  }

  #[test]
  fn test_round_trips_through_file_reader() {
    let schema_descr = one_column_schema();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      rg_writer.write_column::<Int32Type>(&[10, 20, 30], None, None).unwrap();
      rg_writer.close().unwrap();
      writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(file_bytes).unwrap();
    assert_eq!(reader.num_row_groups(), 1);
    let row_group = reader.get_row_group(0).unwrap();
    assert_eq!(row_group.metadata().num_rows(), 3);
  }
}
