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

//! Nested reconstruction (spec.md §4.F): walks the schema tree once per row
//! group, building one [`Reader`] node per schema node, then drives every
//! leaf's [`TripletIter`] in lock-step to assemble [`Row`] values.
//!
//! A node's own definition/repetition level is carried by its *parent*'s
//! accumulator, computed the same way [`crate::schema::types`] computes
//! `ColumnDescriptor::max_def_level`/`max_rep_level`: `OPTIONAL` adds one
//! definition level, `REPEATED` adds one of each. A group whose only field
//! is itself `REPEATED` is a list (or, when that field has exactly two
//! children, a map) and is reconstructed without an intervening struct
//! layer.

use crate::basic::Repetition;
use crate::errors::Result;
use crate::file::reader::RowGroupReader;
use crate::record::api::{Field, Row};
use crate::record::triplet::TripletIter;
use crate::schema::types::{ColumnDescPtr, TypePtr};

struct BuildContext<'a> {
  leaves: Vec<ColumnDescPtr>,
  column_idx: usize,
  row_group: &'a dyn RowGroupReader
}

/// One schema node's reconstruction state. Composing these mirrors the
/// schema tree; reading the root drives every leaf exactly once per row.
enum Reader<'a> {
  Primitive {
    triplet: TripletIter<'a>,
    descr: ColumnDescPtr
  },
  /// An `OPTIONAL` node (struct, list, or map) whose presence is decided
  /// by comparing a representative leaf's definition level against
  /// `def_level`, the level this node itself contributes.
  Option {
    def_level: i16,
    reader: Box<Reader<'a>>
  },
  Group {
    readers: Vec<Reader<'a>>,
    field_names: Vec<String>
  },
  /// A list: `def_level`/`rep_level` are the levels the repeated node
  /// itself contributes (`ColumnDescriptor::repeated_ancestor_def_level`
  /// at this depth). An absent list is represented by an enclosing
  /// [`Reader::Option`], so by the time a `Repeated` node sees a triplet
  /// its only two cases are "empty" (`D < def_level`: every ancestor up
  /// to this repetition is satisfied, but this field itself fired zero
  /// times) and "has elements" (`D >= def_level`, loop while
  /// `current_rep_level() >= rep_level`).
  Repeated {
    def_level: i16,
    rep_level: i16,
    reader: Box<Reader<'a>>
  },
  /// A map's `key_value` repeated group, decoded as paired key/value
  /// readers advancing in lock-step rather than one combined element
  /// reader (spec.md §4.F point 6).
  KeyValue {
    def_level: i16,
    rep_level: i16,
    key_reader: Box<Reader<'a>>,
    value_reader: Box<Reader<'a>>
  }
}

impl<'a> Reader<'a> {
  fn current_def_level(&self) -> i16 {
    match self {
      Reader::Primitive { triplet, .. } => triplet.current_def_level(),
      Reader::Option { reader, .. } => reader.current_def_level(),
      Reader::Group { readers, .. } => readers[0].current_def_level(),
      Reader::Repeated { reader, .. } => reader.current_def_level(),
      Reader::KeyValue { key_reader, .. } => key_reader.current_def_level()
    }
  }

  fn current_rep_level(&self) -> i16 {
    match self {
      Reader::Primitive { triplet, .. } => triplet.current_rep_level(),
      Reader::Option { reader, .. } => reader.current_rep_level(),
      Reader::Group { readers, .. } => readers[0].current_rep_level(),
      Reader::Repeated { reader, .. } => reader.current_rep_level(),
      Reader::KeyValue { key_reader, .. } => key_reader.current_rep_level()
    }
  }

  fn is_empty(&self) -> bool {
    match self {
      Reader::Primitive { triplet, .. } => triplet.is_empty(),
      Reader::Option { reader, .. } => reader.is_empty(),
      Reader::Group { readers, .. } => readers[0].is_empty(),
      Reader::Repeated { reader, .. } => reader.is_empty(),
      Reader::KeyValue { key_reader, .. } => key_reader.is_empty()
    }
  }

  /// The shape a null takes when this node sits under an absent
  /// [`Reader::Option`]: `List(None)`/`Map(None)` for collections, so a
  /// null list stays distinguishable from a null struct or scalar even
  /// though both arrive as the same `D < anc` condition on the wire.
  fn null_field(&self) -> Field {
    match self {
      Reader::Repeated { .. } => Field::List(None),
      Reader::KeyValue { .. } => Field::Map(None),
      Reader::Option { reader, .. } => reader.null_field(),
      Reader::Primitive { .. } | Reader::Group { .. } => Field::Null
    }
  }

  /// Builds one [`Field`] from the current position and advances every
  /// leaf under this node by exactly one triplet. Every variant leaves
  /// its subtree positioned at the next slot when this returns, so a
  /// caller never needs a separate "advance" call.
  fn read_field(&mut self) -> Result<Field> {
    match self {
      Reader::Primitive { triplet, descr } => {
        let field = if triplet.current_def_level() == descr.max_def_level() {
          triplet.current_value_as_field(descr)
        } else {
          Field::Null
        };
        triplet.advance_columns()?;
        Ok(field)
      },
      Reader::Option { def_level, reader } => {
        let present = reader.current_def_level() >= *def_level;
        let null_value = reader.null_field();
        let inner = reader.read_field()?;
        Ok(if present { inner } else { null_value })
      },
      Reader::Group { readers, field_names } => {
        let mut fields = Vec::with_capacity(readers.len());
        for (name, reader) in field_names.iter().zip(readers.iter_mut()) {
          fields.push((name.clone(), reader.read_field()?));
        }
        Ok(Field::Group(Row::new(fields)))
      },
      Reader::Repeated { def_level, rep_level, reader } => {
        if reader.current_def_level() < *def_level {
          reader.read_field()?;
          return Ok(Field::List(Some(Vec::new())));
        }
        let mut elements = Vec::new();
        loop {
          elements.push(reader.read_field()?);
          if reader.is_empty() || reader.current_rep_level() < *rep_level {
            break;
          }
        }
        Ok(Field::List(Some(elements)))
      },
      Reader::KeyValue { def_level, rep_level, key_reader, value_reader } => {
        if key_reader.current_def_level() < *def_level {
          key_reader.read_field()?;
          value_reader.read_field()?;
          return Ok(Field::Map(Some(Vec::new())));
        }
        let mut entries = Vec::new();
        loop {
          let key = key_reader.read_field()?;
          let value = value_reader.read_field()?;
          entries.push((key, value));
          if key_reader.is_empty() || key_reader.current_rep_level() < *rep_level {
            break;
          }
        }
        Ok(Field::Map(Some(entries)))
      }
    }
  }
}

/// `OPTIONAL` adds one definition level; `REPEATED` adds one of each
/// (mirrors `schema::types::build_leaves`).
pub(crate) fn bump(repetition: Option<Repetition>, def_level: i16, rep_level: i16) -> (i16, i16) {
  match repetition {
    Some(Repetition::OPTIONAL) => (def_level + 1, rep_level),
    Some(Repetition::REPEATED) => (def_level + 1, rep_level + 1),
    Some(Repetition::REQUIRED) | None => (def_level, rep_level)
  }
}

fn build_reader<'a>(node: &TypePtr, ctx: &mut BuildContext<'a>, parent_def: i16, parent_rep: i16) -> Result<Reader<'a>> {
  let repetition = node.basic_info().repetition();
  let (def_level, rep_level) = bump(repetition, parent_def, parent_rep);

  let core = if node.is_primitive() {
    build_primitive(ctx)?
  } else {
    build_group_core(node, ctx, def_level, rep_level)?
  };

  Ok(match repetition {
    Some(Repetition::REPEATED) => Reader::Repeated { def_level, rep_level, reader: Box::new(core) },
    Some(Repetition::OPTIONAL) => Reader::Option { def_level, reader: Box::new(core) },
    Some(Repetition::REQUIRED) | None => core
  })
}

fn build_primitive<'a>(ctx: &mut BuildContext<'a>) -> Result<Reader<'a>> {
  let descr = ctx.leaves[ctx.column_idx].clone();
  let page_reader = ctx.row_group.get_column_page_reader(ctx.column_idx)?;
  ctx.column_idx += 1;
  let triplet = TripletIter::new(descr.clone(), page_reader)?;
  Ok(Reader::Primitive { triplet, descr })
}

/// Builds the reconstruction for a group node's contents: a struct in the
/// general case, or — when the group's one field is itself `REPEATED` — a
/// list (or, when that field has exactly two children, a map) collapsed
/// in place rather than wrapped in an extra struct layer.
fn build_group_core<'a>(node: &TypePtr, ctx: &mut BuildContext<'a>, def_level: i16, rep_level: i16) -> Result<Reader<'a>> {
  let fields = node.fields();

  if fields.len() == 1 && fields[0].basic_info().repetition() == Some(Repetition::REPEATED) {
    let inner = &fields[0];
    if inner.is_group() && inner.fields().len() == 2 {
      let (kv_def, kv_rep) = bump(Some(Repetition::REPEATED), def_level, rep_level);
      let kv_fields = inner.fields();
      let key_reader = build_reader(&kv_fields[0], ctx, kv_def, kv_rep)?;
      let value_reader = build_reader(&kv_fields[1], ctx, kv_def, kv_rep)?;
      return Ok(Reader::KeyValue {
        def_level: kv_def,
        rep_level: kv_rep,
        key_reader: Box::new(key_reader),
        value_reader: Box::new(value_reader)
      });
    }
    return build_reader(inner, ctx, def_level, rep_level);
  }

  let mut readers = Vec::with_capacity(fields.len());
  let mut field_names = Vec::with_capacity(fields.len());
  for field in fields {
    field_names.push(field.name().to_string());
    readers.push(build_reader(field, ctx, def_level, rep_level)?);
  }
  Ok(Reader::Group { readers, field_names })
}

/// Iterates the rows of one row group, reconstructed from its column
/// chunks per the schema tree (spec.md §4.F).
pub struct RowIter<'a> {
  readers: Vec<Reader<'a>>,
  field_names: Vec<String>,
  num_rows: i64,
  rows_read: i64
}

impl<'a> RowIter<'a> {
  pub fn new(row_group: &'a dyn RowGroupReader) -> Result<Self> {
    let metadata = row_group.metadata();
    let root = metadata.schema_descr().root_schema().clone();
    let leaves = metadata.schema_descr().columns().to_vec();
    let num_rows = metadata.num_rows();

    if !root.is_group() {
      return Err(general_err!("root schema element must be a group"));
    }
    let mut ctx = BuildContext { leaves, column_idx: 0, row_group };
    let fields = root.fields();

    let mut readers = Vec::with_capacity(fields.len());
    let mut field_names = Vec::with_capacity(fields.len());
    for field in fields {
      field_names.push(field.name().to_string());
      readers.push(build_reader(field, &mut ctx, 0, 0)?);
    }

    Ok(RowIter { readers, field_names, num_rows, rows_read: 0 })
  }
}

impl<'a> Iterator for RowIter<'a> {
  type Item = Result<Row>;

  fn next(&mut self) -> Option<Result<Row>> {
    if self.rows_read >= self.num_rows {
      return None;
    }
    let mut fields = Vec::with_capacity(self.readers.len());
    for (name, reader) in self.field_names.iter().zip(self.readers.iter_mut()) {
      match reader.read_field() {
        Ok(f) => fields.push((name.clone(), f)),
        Err(e) => return Some(Err(e))
      }
    }
    self.rows_read += 1;
    Some(Ok(Row::new(fields)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::Type as PhysicalType;
  use crate::data_type::Int32Type;
  use crate::file::properties::WriterProperties;
  use crate::file::reader::{FileReader, SerializedFileReader};
  use crate::file::writer::SerializedFileWriter;
  use crate::schema::types::{SchemaDescriptor, Type};
  use std::sync::Arc;

  fn one_required_int32_column() -> crate::schema::types::SchemaDescPtr {
    let leaf = Type::new_primitive("value", Repetition::REQUIRED, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(leaf)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  fn one_optional_int32_column() -> crate::schema::types::SchemaDescPtr {
    let leaf = Type::new_primitive("value", Repetition::OPTIONAL, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(leaf)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  /// The standard 3-level list encoding, nullable at both the list and
  /// the element: `optional group values (LIST) { repeated group list {
  /// optional int32 element } }`.
  fn one_nullable_list_of_optional_int32() -> crate::schema::types::SchemaDescPtr {
    let element = Type::new_primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, None, None, 0, 0, 0).unwrap();
    let list = Type::new_group("list", Some(Repetition::REPEATED), vec![Arc::new(element)], None, None).unwrap();
    let values = Type::new_group("values", Some(Repetition::OPTIONAL), vec![Arc::new(list)], None, None).unwrap();
    let root = Type::new_group("schema", None, vec![Arc::new(values)], None, None).unwrap();
    Arc::new(SchemaDescriptor::new(Arc::new(root)))
  }

  #[test]
  fn test_reconstructs_required_flat_rows() {
    let schema_descr = one_required_int32_column();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      rg_writer.write_column::<Int32Type>(&[1, 2, 3], None, None).unwrap();
      rg_writer.close().unwrap();
      writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(file_bytes).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let rows: Vec<Row> = RowIter::new(row_group.as_ref()).unwrap().collect::<Result<Vec<_>>>().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("value"), Some(&Field::Int(1)));
    assert_eq!(rows[2].get("value"), Some(&Field::Int(3)));
  }

  #[test]
  fn test_reconstructs_nulls_in_optional_column() {
    let schema_descr = one_optional_int32_column();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      rg_writer.write_column::<Int32Type>(&[10, 20], Some(&[0, 1, 1]), None).unwrap();
      rg_writer.close().unwrap();
      writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(file_bytes).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let rows: Vec<Row> = RowIter::new(row_group.as_ref()).unwrap().collect::<Result<Vec<_>>>().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("value"), Some(&Field::Null));
    assert_eq!(rows[1].get("value"), Some(&Field::Int(10)));
    assert_eq!(rows[2].get("value"), Some(&Field::Int(20)));
  }

  /// Four rows exercising every null/empty/present combination of a
  /// nullable list of nullable elements: list itself null, present but
  /// empty, one null element, two present elements.
  #[test]
  fn test_reconstructs_nullable_list_of_optional_elements() {
    let schema_descr = one_nullable_list_of_optional_int32();
    let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
    let mut file_bytes: Vec<u8> = Vec::new();
    {
      let mut writer = SerializedFileWriter::new(&mut file_bytes, schema_descr, props).unwrap();
      let mut rg_writer = writer.next_row_group().unwrap();
      rg_writer
        .write_column::<Int32Type>(&[5, 6], Some(&[0, 1, 2, 3, 3]), Some(&[0, 0, 0, 0, 1]))
        .unwrap();
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
