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

//! The inverse of [`super::reader`]: given a logical nested [`Row`],
//! split it back into per-leaf `(value, definition level, repetition
//! level)` triples and hand each leaf's buffer to a row group writer
//! (spec.md §4.F "Writing is the inverse").
//!
//! Mirrors the reader's schema-tree walk exactly — same [`bump`] rule,
//! same list/map collapsing — so a [`Writer`] node and the [`super::
//! reader::Reader`] node it corresponds to always agree on definition
//! and repetition levels for a given schema.

use std::io::Write as IoWrite;

use crate::basic::Type as PhysicalType;
use crate::data_type::*;
use crate::errors::Result;
use crate::file::writer::SerializedRowGroupWriter;
use crate::record::api::{field_to_bool, field_to_byte_array, field_to_f32, field_to_f64, field_to_i32, field_to_i64, field_to_int96, Field, Row};
use crate::record::reader::bump;
use crate::schema::types::{ColumnDescPtr, SchemaDescPtr, TypePtr};

/// One leaf column's accumulated write buffer, typed over its physical
/// value. Mirrors [`super::triplet::TypedTripletIter`]'s shape but in
/// reverse: values/levels are appended here instead of drained.
struct TypedLeafBuffer<T: DataType>
where
  T: 'static
{
  descr: ColumnDescPtr,
  values: Vec<T::T>,
  def_levels: Vec<i16>,
  rep_levels: Vec<i16>
}

impl<T: DataType> TypedLeafBuffer<T>
where
  T: 'static
{
  fn new(descr: ColumnDescPtr) -> Self {
    TypedLeafBuffer { descr, values: Vec::new(), def_levels: Vec::new(), rep_levels: Vec::new() }
  }

  /// Records a present value: full definition level, the caller-supplied
  /// repetition level.
  fn push_value(&mut self, value: T::T, rep_level: i16) {
    if self.descr.max_def_level() > 0 {
      self.def_levels.push(self.descr.max_def_level());
    }
    if self.descr.max_rep_level() > 0 {
      self.rep_levels.push(rep_level);
    }
    self.values.push(value);
  }

  /// Records an absence (null/empty ancestor): no value, just the levels
  /// at which the data stopped.
  fn push_null(&mut self, def_level: i16, rep_level: i16) {
    if self.descr.max_def_level() > 0 {
      self.def_levels.push(def_level);
    }
    if self.descr.max_rep_level() > 0 {
      self.rep_levels.push(rep_level);
    }
  }

  fn write_column<W: IoWrite>(&self, rg_writer: &mut SerializedRowGroupWriter<'_, W>) -> Result<()>
  where
    crate::encodings::encoding::PlainEncoder<T>: crate::encodings::encoding::Encoder<T>
  {
    let def_levels = if self.descr.max_def_level() > 0 { Some(self.def_levels.as_slice()) } else { None };
    let rep_levels = if self.descr.max_rep_level() > 0 { Some(self.rep_levels.as_slice()) } else { None };
    rg_writer.write_column::<T>(&self.values, def_levels, rep_levels)
  }
}

/// Type-erased write buffer, one variant per physical type, so the
/// schema-tree [`Writer`] doesn't need to be generic over `T`.
enum LeafBuffer {
  Bool(TypedLeafBuffer<BoolType>),
  Int32(TypedLeafBuffer<Int32Type>),
  Int64(TypedLeafBuffer<Int64Type>),
  Int96(TypedLeafBuffer<Int96Type>),
  Float(TypedLeafBuffer<FloatType>),
  Double(TypedLeafBuffer<DoubleType>),
  ByteArray(TypedLeafBuffer<ByteArrayType>),
  FixedLenByteArray(TypedLeafBuffer<FixedLenByteArrayType>)
}

impl LeafBuffer {
  fn new(descr: ColumnDescPtr) -> Self {
    match descr.physical_type() {
      PhysicalType::BOOLEAN => LeafBuffer::Bool(TypedLeafBuffer::new(descr)),
      PhysicalType::INT32 => LeafBuffer::Int32(TypedLeafBuffer::new(descr)),
      PhysicalType::INT64 => LeafBuffer::Int64(TypedLeafBuffer::new(descr)),
      PhysicalType::INT96 => LeafBuffer::Int96(TypedLeafBuffer::new(descr)),
      PhysicalType::FLOAT => LeafBuffer::Float(TypedLeafBuffer::new(descr)),
      PhysicalType::DOUBLE => LeafBuffer::Double(TypedLeafBuffer::new(descr)),
      PhysicalType::BYTE_ARRAY => LeafBuffer::ByteArray(TypedLeafBuffer::new(descr)),
      PhysicalType::FIXED_LEN_BYTE_ARRAY => LeafBuffer::FixedLenByteArray(TypedLeafBuffer::new(descr))
    }
  }

  /// Converts `field` to this leaf's physical value and records it as
  /// present. Only called once a [`Writer::Option`]/[`Writer::Repeated`]/
  /// [`Writer::KeyValue`] ancestor has already ruled out null/empty, so
  /// `field` is never itself a null shape here.
  fn push_value(&mut self, field: &Field, rep_level: i16) -> Result<()> {
    match self {
      LeafBuffer::Bool(b) => b.push_value(field_to_bool(field)?, rep_level),
      LeafBuffer::Int32(b) => b.push_value(field_to_i32(field)?, rep_level),
      LeafBuffer::Int64(b) => b.push_value(field_to_i64(field)?, rep_level),
      LeafBuffer::Int96(b) => b.push_value(field_to_int96(field)?, rep_level),
      LeafBuffer::Float(b) => b.push_value(field_to_f32(field)?, rep_level),
      LeafBuffer::Double(b) => b.push_value(field_to_f64(field)?, rep_level),
      LeafBuffer::ByteArray(b) => b.push_value(field_to_byte_array(field)?, rep_level),
      LeafBuffer::FixedLenByteArray(b) => b.push_value(field_to_byte_array(field)?, rep_level)
    }
    Ok(())
  }

  fn push_null(&mut self, def_level: i16, rep_level: i16) {
    match self {
      LeafBuffer::Bool(b) => b.push_null(def_level, rep_level),
      LeafBuffer::Int32(b) => b.push_null(def_level, rep_level),
      LeafBuffer::Int64(b) => b.push_null(def_level, rep_level),
      LeafBuffer::Int96(b) => b.push_null(def_level, rep_level),
      LeafBuffer::Float(b) => b.push_null(def_level, rep_level),
      LeafBuffer::Double(b) => b.push_null(def_level, rep_level),
      LeafBuffer::ByteArray(b) => b.push_null(def_level, rep_level),
      LeafBuffer::FixedLenByteArray(b) => b.push_null(def_level, rep_level)
    }
  }

  fn flush<W: IoWrite>(&self, rg_writer: &mut SerializedRowGroupWriter<'_, W>) -> Result<()> {
    match self {
      LeafBuffer::Bool(b) => b.write_column(rg_writer),
      LeafBuffer::Int32(b) => b.write_column(rg_writer),
      LeafBuffer::Int64(b) => b.write_column(rg_writer),
      LeafBuffer::Int96(b) => b.write_column(rg_writer),
      LeafBuffer::Float(b) => b.write_column(rg_writer),
      LeafBuffer::Double(b) => b.write_column(rg_writer),
      LeafBuffer::ByteArray(b) => b.write_column(rg_writer),
      LeafBuffer::FixedLenByteArray(b) => b.write_column(rg_writer)
    }
  }
}

struct BuildContext {
  leaves: Vec<ColumnDescPtr>,
  column_idx: usize
}

/// One schema node's write-side counterpart to [`super::reader::Reader`].
/// `leaf` indexes into the flat [`RowWriter`] buffer list rather than
/// owning a typed buffer directly, since every leaf's buffer needs to be
/// reachable by schema-column order at flush time regardless of nesting
/// depth.
enum Writer {
  Primitive {
    leaf: usize
  },
  Option {
    def_level: i16,
    writer: Box<Writer>
  },
  Group {
    writers: Vec<Writer>,
    field_names: Vec<String>
  },
  Repeated {
    def_level: i16,
    rep_level: i16,
    writer: Box<Writer>
  },
  KeyValue {
    def_level: i16,
    rep_level: i16,
    key_writer: Box<Writer>,
    value_writer: Box<Writer>
  }
}

fn build_writer(node: &TypePtr, ctx: &mut BuildContext, parent_def: i16, parent_rep: i16, buffers: &mut Vec<LeafBuffer>) -> Result<Writer> {
  let repetition = node.basic_info().repetition();
  let (def_level, rep_level) = bump(repetition, parent_def, parent_rep);

  let core = if node.is_primitive() {
    build_primitive(ctx, buffers)
  } else {
    build_group_core(node, ctx, def_level, rep_level, buffers)?
  };

  Ok(match repetition {
    Some(crate::basic::Repetition::REPEATED) => Writer::Repeated { def_level, rep_level, writer: Box::new(core) },
    Some(crate::basic::Repetition::OPTIONAL) => Writer::Option { def_level, writer: Box::new(core) },
    Some(crate::basic::Repetition::REQUIRED) | None => core
  })
}

fn build_primitive(ctx: &mut BuildContext, buffers: &mut Vec<LeafBuffer>) -> Writer {
  let descr = ctx.leaves[ctx.column_idx].clone();
  ctx.column_idx += 1;
  buffers.push(LeafBuffer::new(descr));
  Writer::Primitive { leaf: buffers.len() - 1 }
}

/// Mirrors `super::reader::build_group_core`'s list/map collapsing
/// exactly: a group whose one field is `REPEATED` is a list, collapsed
/// without an intervening struct layer; if that field is itself a
/// 2-field group, it's a map's `key_value` group instead.
fn build_group_core(
  node: &TypePtr,
  ctx: &mut BuildContext,
  def_level: i16,
  rep_level: i16,
  buffers: &mut Vec<LeafBuffer>
) -> Result<Writer> {
  let fields = node.fields();

  if fields.len() == 1 && fields[0].basic_info().repetition() == Some(crate::basic::Repetition::REPEATED) {
    let inner = &fields[0];
    if inner.is_group() && inner.fields().len() == 2 {
      let (kv_def, kv_rep) = bump(Some(crate::basic::Repetition::REPEATED), def_level, rep_level);
      let kv_fields = inner.fields();
      let key_writer = build_writer(&kv_fields[0], ctx, kv_def, kv_rep, buffers)?;
      let value_writer = build_writer(&kv_fields[1], ctx, kv_def, kv_rep, buffers)?;
      return Ok(Writer::KeyValue {
        def_level: kv_def,
        rep_level: kv_rep,
        key_writer: Box::new(key_writer),
        value_writer: Box::new(value_writer)
      });
    }
    return build_writer(inner, ctx, def_level, rep_level, buffers);
  }

  let mut writers = Vec::with_capacity(fields.len());
  let mut field_names = Vec::with_capacity(fields.len());
  for field in fields {
    field_names.push(field.name().to_string());
    writers.push(build_writer(field, ctx, def_level, rep_level, buffers)?);
  }
  Ok(Writer::Group { writers, field_names })
}

fn is_null_field(field: &Field) -> bool {
  matches!(field, Field::Null | Field::List(None) | Field::Map(None))
}

/// Writes one null/empty marker into every leaf under `writer`, at the
/// definition/repetition level where the data stopped. Used whenever an
/// ancestor ([`Writer::Option`] absent, [`Writer::Repeated`]/
/// [`Writer::KeyValue`] empty) decides a subtree contributes no further
/// structure this row.
fn write_null(writer: &Writer, buffers: &mut [LeafBuffer], def_level: i16, rep_level: i16) {
  match writer {
    Writer::Primitive { leaf } => buffers[*leaf].push_null(def_level, rep_level),
    Writer::Option { writer, .. } => write_null(writer, buffers, def_level, rep_level),
    Writer::Group { writers, .. } => {
      for w in writers {
        write_null(w, buffers, def_level, rep_level);
      }
    },
    Writer::Repeated { writer, .. } => write_null(writer, buffers, def_level, rep_level),
    Writer::KeyValue { key_writer, value_writer, .. } => {
      write_null(key_writer, buffers, def_level, rep_level);
      write_null(value_writer, buffers, def_level, rep_level);
    }
  }
}

/// Writes one `field` into every leaf under `writer`, at repetition
/// level `rep_level` (the ambient level this slot sits at — the level a
/// bare leaf would use directly, or the level the first element of a
/// list inherits before subsequent elements switch to the list's own).
fn write_value(writer: &mut Writer, field: &Field, buffers: &mut [LeafBuffer], rep_level: i16) -> Result<()> {
  match writer {
    Writer::Primitive { leaf } => buffers[*leaf].push_value(field, rep_level),
    Writer::Option { def_level, writer } => {
      if is_null_field(field) {
        write_null(writer, buffers, *def_level - 1, rep_level);
        Ok(())
      } else {
        write_value(writer, field, buffers, rep_level)
      }
    },
    Writer::Group { writers, field_names } => {
      let row = match field {
        Field::Group(row) => row,
        _ => return Err(general_err!("expected a group value, found {}", field))
      };
      for (name, w) in field_names.iter().zip(writers.iter_mut()) {
        let sub_field = row.get(name).ok_or_else(|| general_err!("row is missing field '{}'", name))?;
        write_value(w, sub_field, buffers, rep_level)?;
      }
      Ok(())
    },
    Writer::Repeated { def_level, rep_level: own_rep_level, writer } => {
      let elements = match field {
        Field::List(Some(v)) => v,
        _ => return Err(general_err!("expected a present list value, found {}", field))
      };
      if elements.is_empty() {
        write_null(writer, buffers, *def_level - 1, rep_level);
      } else {
        for (idx, elem) in elements.iter().enumerate() {
          let r = if idx == 0 { rep_level } else { *own_rep_level };
          write_value(writer, elem, buffers, r)?;
        }
      }
      Ok(())
    },
    Writer::KeyValue { def_level, rep_level: own_rep_level, key_writer, value_writer } => {
      let entries = match field {
        Field::Map(Some(v)) => v,
        _ => return Err(general_err!("expected a present map value, found {}", field))
      };
      if entries.is_empty() {
        write_null(key_writer, buffers, *def_level - 1, rep_level);
        write_null(value_writer, buffers, *def_level - 1, rep_level);
      } else {
        for (idx, (key, value)) in entries.iter().enumerate() {
          let r = if idx == 0 { rep_level } else { *own_rep_level };
          write_value(key_writer, key, buffers, r)?;
          write_value(value_writer, value, buffers, r)?;
        }
      }
      Ok(())
    }
  }
}

/// Splits logical [`Row`] values back into the leaf column buffers a row
/// group writer expects (spec.md §4.F "Writing is the inverse"), walking
/// the same schema tree [`super::reader::RowIter`] reconstructs from.
pub struct RowWriter {
  writers: Vec<Writer>,
  field_names: Vec<String>,
  buffers: Vec<LeafBuffer>
}

impl RowWriter {
  pub fn new(schema_descr: &SchemaDescPtr) -> Result<Self> {
    let root = schema_descr.root_schema().clone();
    if !root.is_group() {
      return Err(general_err!("root schema element must be a group"));
    }
    let leaves = schema_descr.columns().to_vec();
    let mut ctx = BuildContext { leaves, column_idx: 0 };
    let mut buffers = Vec::new();
    let fields = root.fields();

    let mut writers = Vec::with_capacity(fields.len());
    let mut field_names = Vec::with_capacity(fields.len());
    for field in fields {
      field_names.push(field.name().to_string());
      writers.push(build_writer(field, &mut ctx, 0, 0, &mut buffers)?);
    }

    Ok(RowWriter { writers, field_names, buffers })
  }

  /// Appends one row, writing exactly one slot into every leaf column.
  pub fn write_row(&mut self, row: &Row) -> Result<()> {
    for (name, writer) in self.field_names.iter().zip(self.writers.iter_mut()) {
      let field = row.get(name).ok_or_else(|| general_err!("row is missing field '{}'", name))?;
      write_value(writer, field, &mut self.buffers, 0)?;
    }
    Ok(())
  }

  /// Flushes every leaf's buffered column into the row group, in schema
  /// (column) order.
  pub fn flush<W: IoWrite>(&self, rg_writer: &mut SerializedRowGroupWriter<'_, W>) -> Result<()> {
    for buffer in &self.buffers {
      buffer.flush(rg_writer)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Repetition, Type as PhysicalType};
  use crate::file::properties::WriterProperties;
  use crate::file::reader::{FileReader, SerializedFileReader};
  use crate::file::writer::SerializedFileWriter;
  use crate::record::reader::RowIter;
  use crate::schema::types::{SchemaDescriptor, Type};
  use std::sync::Arc;

  fn one_optional_int32_column() -> SchemaDescPtr {
    let leaf = Type::new_primitive("value", Repetition::OPTIONAL, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(leaf)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  fn one_nullable_list_of_optional_int32() -> SchemaDescPtr {
    let element = Type::new_primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let list = Type::new_group("list", Some(Repetition::REPEATED), vec![Arc::new(element)], None, None).unwrap();
    let values = Type::new_group("values", Some(Repetition::OPTIONAL), vec![Arc::new(list)], None, None).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(values)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  #[test]
  fn test_round_trips_flat_optional_rows() {
    let schema_descr = one_optional_int32_column();
    let mut row_writer = RowWriter::new(&schema_descr).unwrap();
    row_writer.write_row(&Row::new(vec![("value".to_string(), Field::Null)])).unwrap();
    row_writer.write_row(&Row::new(vec![("value".to_string(), Field::Int(7))])).unwrap();

    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      row_writer.flush(&mut rg_writer).unwrap();
      rg_writer.close().unwrap();
      writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(file_bytes).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let rows: Vec<Row> = RowIter::new(row_group.as_ref()).unwrap().collect::<Result<Vec<_>>>().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("value"), Some(&Field::Null));
    assert_eq!(rows[1].get("value"), Some(&Field::Int(7)));
  }

  #[test]
  fn test_round_trips_nullable_list_of_optional_elements() {
    let schema_descr = one_nullable_list_of_optional_int32();
    let mut row_writer = RowWriter::new(&schema_descr).unwrap();
    row_writer.write_row(&Row::new(vec![("values".to_string(), Field::List(None))])).unwrap();
    row_writer
      .write_row(&Row::new(vec![("values".to_string(), Field::List(Some(Vec::new())))]))
      .unwrap();
    row_writer
      .write_row(&Row::new(vec![("values".to_string(), Field::List(Some(vec![Field::Null])))]))
      .unwrap();
    row_writer
      .write_row(&Row::new(vec![(
        "values".to_string(),
        Field::List(Some(vec![Field::Int(5), Field::Int(6)]))
      )]))
      .unwrap();

    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      row_writer.flush(&mut rg_writer).unwrap();
      rg_writer.close().unwrap();
      writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(file_bytes).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let rows: Vec<Row> = RowIter::new(row_group.as_ref()).unwrap().collect::<Result<Vec<_>>>().unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].get("values"), Some(&Field::List(None)));
    assert_eq!(rows[1].get("values"), Some(&Field::List(Some(Vec::new()))));
    assert_eq!(rows[2].get("values"), Some(&Field::List(Some(vec![Field::Null]))));
    assert_eq!(
      rows[3].get("values"),
      Some(&Field::List(Some(vec![Field::Int(5), Field::Int(6)])))
    );
  }
}
