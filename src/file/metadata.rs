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

//! Ergonomic wrappers around the raw Thrift footer structs (spec.md §4.D).
//! `thrift::format` mirrors the wire layout field-for-field; the types here
//! add the schema tree, `Arc` sharing, and lookup-by-index methods that the
//! rest of the crate (and its callers) actually want to hold onto.

use std::sync::Arc;

use crate::basic::{Compression, Encoding};
use crate::errors::Result;
use crate::schema::types::{self, ColumnDescPtr, SchemaDescPtr, SchemaDescriptor};
use crate::thrift::format;

/// Per-column-chunk statistics, decoded from the raw Thrift `Statistics`
/// struct into the two fields this core actually tracks (spec.md §4.C):
/// `min_value`/`max_value` are canonical-encoded value bytes, not the
/// legacy sort-order-ambiguous `min`/`max` fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
  null_count: Option<i64>,
  distinct_count: Option<i64>,
  min_value: Option<Vec<u8>>,
  max_value: Option<Vec<u8>>
}

impl Statistics {
  pub fn null_count(&self) -> Option<i64> {
    self.null_count
  }

  pub fn distinct_count(&self) -> Option<i64> {
    self.distinct_count
  }

  pub fn min_value(&self) -> Option<&[u8]> {
    self.min_value.as_deref()
  }

  pub fn max_value(&self) -> Option<&[u8]> {
    self.max_value.as_deref()
  }

  pub fn has_min_max_set(&self) -> bool {
    self.min_value.is_some() && self.max_value.is_some()
  }

  pub(crate) fn from_thrift(stats: format::Statistics) -> Self {
    Statistics {
      null_count: stats.null_count,
      distinct_count: stats.distinct_count,
      min_value: stats.min_value.or(stats.min),
      max_value: stats.max_value.or(stats.max)
    }
  }

  pub(crate) fn to_thrift(&self) -> format::Statistics {
    format::Statistics {
      max: None,
      min: None,
      null_count: self.null_count,
      distinct_count: self.distinct_count,
      max_value: self.max_value.clone(),
      min_value: self.min_value.clone(),
      is_max_value_exact: Some(self.max_value.is_some()),
      is_min_value_exact: Some(self.min_value.is_some())
    }
  }
}

/// One column chunk's metadata: where its pages live, how they're encoded,
/// and its rolled-up statistics.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
  column_descr: ColumnDescPtr,
  encodings: Vec<Encoding>,
  compression: Compression,
  num_values: i64,
  total_uncompressed_size: i64,
  total_compressed_size: i64,
  data_page_offset: i64,
  dictionary_page_offset: Option<i64>,
  statistics: Option<Statistics>
}

impl ColumnChunkMetaData {
  pub fn column_descr(&self) -> &ColumnDescPtr {
    &self.column_descr
  }

  pub fn compression(&self) -> Compression {
    self.compression
  }

  pub fn encodings(&self) -> &[Encoding] {
    &self.encodings
  }

  pub fn num_values(&self) -> i64 {
    self.num_values
  }

  pub fn total_uncompressed_size(&self) -> i64 {
    self.total_uncompressed_size
  }

  pub fn compressed_size(&self) -> i64 {
    self.total_compressed_size
  }

  pub fn data_page_offset(&self) -> i64 {
    self.data_page_offset
  }

  pub fn dictionary_page_offset(&self) -> Option<i64> {
    self.dictionary_page_offset
  }

  pub fn has_dictionary_page(&self) -> bool {
    self.dictionary_page_offset.is_some()
  }

  pub fn statistics(&self) -> Option<&Statistics> {
    self.statistics.as_ref()
  }

  /// The byte offset of whichever page (dictionary, if present, else the
  /// first data page) comes first on the wire for this column chunk.
  pub fn starting_page_offset(&self) -> i64 {
    self.dictionary_page_offset.unwrap_or(self.data_page_offset)
  }

  pub(crate) fn from_thrift(column_descr: ColumnDescPtr, cc: format::ColumnChunk) -> Result<Self> {
    let col_meta = cc
      .meta_data
      .ok_or_else(|| general_err!("Column chunk metadata is missing"))?;
    Ok(ColumnChunkMetaData {
      column_descr,
      encodings: col_meta.encodings,
      compression: col_meta.codec,
      num_values: col_meta.num_values,
      total_uncompressed_size: col_meta.total_uncompressed_size,
      total_compressed_size: col_meta.total_compressed_size,
      data_page_offset: col_meta.data_page_offset,
      dictionary_page_offset: col_meta.dictionary_page_offset,
      statistics: col_meta.statistics.map(Statistics::from_thrift)
    })
  }

  /// Builds a `ColumnChunkMetaData` from a just-closed column writer's
  /// [`crate::column::writer::ColumnCloseResult`], translating its
  /// page-writer-relative offsets into absolute file offsets by adding
  /// `base_offset` (the byte position where this chunk's pages started).
  pub fn from_close_result(
    column_descr: ColumnDescPtr,
    result: crate::column::writer::ColumnCloseResult,
    base_offset: i64
  ) -> Self {
    ColumnChunkMetaData {
      column_descr,
      encodings: result.encodings,
      compression: result.compression,
      num_values: result.total_num_values,
      total_uncompressed_size: result.total_uncompressed_size,
      total_compressed_size: result.total_compressed_size,
      data_page_offset: base_offset + result.data_page_offset,
      dictionary_page_offset: result.dictionary_page_offset.map(|o| base_offset + o),
      statistics: Some(Statistics::from_thrift(result.statistics))
    }
  }

  pub(crate) fn to_thrift(&self) -> format::ColumnChunk {
    let col_meta = format::ColumnMetaData {
      physical_type: self.column_descr.physical_type(),
      encodings: self.encodings.clone(),
      path_in_schema: self.column_descr.path().parts().to_vec(),
      codec: self.compression,
      num_values: self.num_values,
      total_uncompressed_size: self.total_uncompressed_size,
      total_compressed_size: self.total_compressed_size,
      key_value_metadata: None,
      data_page_offset: self.data_page_offset,
      index_page_offset: None,
      dictionary_page_offset: self.dictionary_page_offset,
      statistics: self.statistics.as_ref().map(Statistics::to_thrift),
      encoding_stats: None,
      bloom_filter_offset: None,
      bloom_filter_length: None
    };
    format::ColumnChunk {
      file_path: None,
      file_offset: self.starting_page_offset(),
      meta_data: Some(col_meta),
      offset_index_offset: None,
      offset_index_length: None,
      column_index_offset: None,
      column_index_length: None
    }
  }
}

/// A single row group's worth of column chunks.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64,
  total_byte_size: i64,
  schema_descr: SchemaDescPtr
}

impl RowGroupMetaData {
  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
    &self.columns[i]
  }

  pub fn columns(&self) -> &[ColumnChunkMetaData] {
    &self.columns
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn total_byte_size(&self) -> i64 {
    self.total_byte_size
  }

  pub fn schema_descr(&self) -> &SchemaDescPtr {
    &self.schema_descr
  }

  pub(crate) fn from_thrift(schema_descr: SchemaDescPtr, rg: format::RowGroup) -> Result<Self> {
    if rg.columns.len() != schema_descr.num_columns() {
      return Err(general_err!(
        "Column count mismatch between row group ({}) and schema ({})",
        rg.columns.len(),
        schema_descr.num_columns()
      ));
    }
    let mut columns = Vec::with_capacity(rg.columns.len());
    for (i, cc) in rg.columns.into_iter().enumerate() {
      columns.push(ColumnChunkMetaData::from_thrift(schema_descr.column(i), cc)?);
    }
    Ok(RowGroupMetaData {
      columns,
      num_rows: rg.num_rows,
      total_byte_size: rg.total_byte_size,
      schema_descr
    })
  }

  pub(crate) fn to_thrift(&self) -> format::RowGroup {
    format::RowGroup {
      columns: self.columns.iter().map(ColumnChunkMetaData::to_thrift).collect(),
      total_byte_size: self.total_byte_size,
      num_rows: self.num_rows,
      sorting_columns: None,
      file_offset: None,
      total_compressed_size: None,
      ordinal: None
    }
  }
}

/// Builder for [`RowGroupMetaData`], used by the writer as it accumulates
/// closed column chunks for the row group currently being written.
pub struct RowGroupMetaDataBuilder {
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64,
  schema_descr: SchemaDescPtr
}

impl RowGroupMetaDataBuilder {
  pub fn new(schema_descr: SchemaDescPtr) -> Self {
    RowGroupMetaDataBuilder { columns: Vec::new(), num_rows: 0, schema_descr }
  }

  pub fn set_num_rows(&mut self, num_rows: i64) {
    self.num_rows = num_rows;
  }

  pub fn push_column(&mut self, column: ColumnChunkMetaData) {
    self.columns.push(column);
  }

  pub fn build(self) -> RowGroupMetaData {
    let total_byte_size = self.columns.iter().map(|c| c.total_compressed_size).sum();
    RowGroupMetaData {
      columns: self.columns,
      num_rows: self.num_rows,
      total_byte_size,
      schema_descr: self.schema_descr
    }
  }
}

/// Everything in `FileMetaData` except the per-row-group column chunks
/// (those live in [`RowGroupMetaData`], one per entry in `ParquetMetaData`).
#[derive(Debug, Clone)]
pub struct FileMetaData {
  version: i32,
  num_rows: i64,
  created_by: Option<String>,
  schema_descr: SchemaDescPtr,
  key_value_metadata: Option<Vec<(String, Option<String>)>>
}

impl FileMetaData {
  pub fn new(
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    schema_descr: SchemaDescPtr,
    key_value_metadata: Option<Vec<(String, Option<String>)>>
  ) -> Self {
    FileMetaData { version, num_rows, created_by, schema_descr, key_value_metadata }
  }

  pub fn version(&self) -> i32 {
    self.version
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn created_by(&self) -> Option<&str> {
    self.created_by.as_deref()
  }

  pub fn schema_descr(&self) -> &SchemaDescPtr {
    &self.schema_descr
  }

  pub fn key_value_metadata(&self) -> Option<&[(String, Option<String>)]> {
    self.key_value_metadata.as_deref()
  }
}

/// The fully parsed footer: file-level metadata plus every row group.
#[derive(Debug, Clone)]
pub struct ParquetMetaData {
  file_metadata: FileMetaData,
  row_groups: Vec<RowGroupMetaData>
}

impl ParquetMetaData {
  pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
    ParquetMetaData { file_metadata, row_groups }
  }

  pub fn file_metadata(&self) -> &FileMetaData {
    &self.file_metadata
  }

  pub fn num_row_groups(&self) -> usize {
    self.row_groups.len()
  }

  pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
    &self.row_groups[i]
  }

  pub fn row_groups(&self) -> &[RowGroupMetaData] {
    &self.row_groups
  }
}

/// Decodes a `thrift::format::FileMetaData` into [`ParquetMetaData`],
/// rebuilding the schema tree with [`types::from_thrift`] and sharing the
/// resulting [`SchemaDescriptor`] across every row group's column chunks.
pub fn parse_file_metadata(t_file_metadata: format::FileMetaData) -> Result<ParquetMetaData> {
  let schema = types::from_thrift(&t_file_metadata.schema)?;
  let schema_descr = Arc::new(SchemaDescriptor::new(schema));

  let mut row_groups = Vec::with_capacity(t_file_metadata.row_groups.len());
  for rg in t_file_metadata.row_groups {
    row_groups.push(RowGroupMetaData::from_thrift(schema_descr.clone(), rg)?);
  }

  let key_value_metadata = t_file_metadata
    .key_value_metadata
    .map(|kvs| kvs.into_iter().map(|kv| (kv.key, kv.value)).collect());

  let file_metadata = FileMetaData {
    version: t_file_metadata.version,
    num_rows: t_file_metadata.num_rows,
    created_by: t_file_metadata.created_by,
    schema_descr,
    key_value_metadata
  };

  Ok(ParquetMetaData::new(file_metadata, row_groups))
}

/// The inverse of [`parse_file_metadata`], used by the writer when it
/// finalizes a file's footer.
pub fn file_metadata_to_thrift(metadata: &ParquetMetaData) -> format::FileMetaData {
  let file_meta = metadata.file_metadata();
  format::FileMetaData {
    version: file_meta.version(),
    schema: types::to_thrift(file_meta.schema_descr().root_schema()),
    num_rows: file_meta.num_rows(),
    row_groups: metadata.row_groups().iter().map(RowGroupMetaData::to_thrift).collect(),
    key_value_metadata: file_meta.key_value_metadata.as_ref().map(|kvs| {
      kvs.iter()
        .map(|(key, value)| format::KeyValue { key: key.clone(), value: value.clone() })
        .collect()
    }),
    created_by: file_meta.created_by.clone(),
    column_orders: None
  }
}
