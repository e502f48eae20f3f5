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

//! The schema tree (spec.md §4.E) and the per-leaf level bookkeeping that
//! drives nested reconstruction (§4.F). A [`Type`] is either a `Group`
//! (message/struct/list/map wrapper) or a `Primitive` leaf; a
//! [`SchemaDescriptor`] flattens a tree into its leaves in depth-first
//! order and, for each leaf, computes `max_def_level`, `max_rep_level` and
//! `repeated_ancestor_def_levels` in a single root-to-leaf walk.

use std::fmt;
use std::sync::Arc;

use crate::basic::{ConvertedType, LogicalType, Repetition, Type as PhysicalType};
use crate::errors::Result;
use crate::thrift::format::SchemaElement;

pub type TypePtr = Arc<Type>;
pub type ColumnDescPtr = Arc<ColumnDescriptor>;
pub type SchemaDescPtr = Arc<SchemaDescriptor>;

/// Fields common to both primitive and group nodes.
#[derive(Debug, Clone)]
pub struct BasicTypeInfo {
  name: String,
  repetition: Option<Repetition>,
  logical_type: Option<LogicalType>,
  converted_type: Option<ConvertedType>,
  id: Option<i32>
}

impl BasicTypeInfo {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// `None` only for the root of the tree, which carries no repetition.
  pub fn repetition(&self) -> Option<Repetition> {
    self.repetition
  }

  pub fn logical_type(&self) -> Option<LogicalType> {
    self.logical_type.clone()
  }

  pub fn converted_type(&self) -> Option<ConvertedType> {
    self.converted_type
  }

  pub fn id(&self) -> Option<i32> {
    self.id
  }
}

/// A node in the schema tree.
#[derive(Debug)]
pub enum Type {
  Primitive {
    basic_info: BasicTypeInfo,
    physical_type: PhysicalType,
    type_length: i32,
    precision: i32,
    scale: i32
  },
  Group {
    basic_info: BasicTypeInfo,
    fields: Vec<TypePtr>
  }
}

impl Type {
  /// Builds a leaf node. `repetition` is required for every leaf (the root
  /// of a schema tree is always a group). `FIXED_LEN_BYTE_ARRAY` requires
  /// `length > 0` (spec.md §4.E error condition).
  pub fn new_primitive(
    name: &str,
    repetition: Repetition,
    physical_type: PhysicalType,
    logical_type: Option<LogicalType>,
    converted_type: Option<ConvertedType>,
    length: i32,
    precision: i32,
    scale: i32
  ) -> Result<Type> {
    if physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && length <= 0 {
      return Err(schema_err!(
        "FIXED_LEN_BYTE_ARRAY field '{}' is missing a positive type_length",
        name
      ));
    }
    Ok(Type::Primitive {
      basic_info: BasicTypeInfo {
        name: name.to_string(),
        repetition: Some(repetition),
        logical_type,
        converted_type,
        id: None
      },
      physical_type,
      type_length: length,
      precision,
      scale
    })
  }

  /// Builds a group node. `repetition` is `None` only for the schema root.
  pub fn new_group(
    name: &str,
    repetition: Option<Repetition>,
    fields: Vec<TypePtr>,
    logical_type: Option<LogicalType>,
    converted_type: Option<ConvertedType>
  ) -> Result<Type> {
    Ok(Type::Group {
      basic_info: BasicTypeInfo {
        name: name.to_string(),
        repetition,
        logical_type,
        converted_type,
        id: None
      },
      fields
    })
  }

  pub fn basic_info(&self) -> &BasicTypeInfo {
    match self {
      Type::Primitive { basic_info, .. } => basic_info,
      Type::Group { basic_info, .. } => basic_info
    }
  }

  pub fn name(&self) -> &str {
    self.basic_info().name()
  }

  pub fn is_primitive(&self) -> bool {
    matches!(self, Type::Primitive { .. })
  }

  pub fn is_group(&self) -> bool {
    matches!(self, Type::Group { .. })
  }

  /// The physical type of a leaf. Panics on a group node; callers are
  /// expected to check [`Type::is_primitive`] first, following the
  /// invariant that only a reconstructed, validated tree is ever walked.
  pub fn physical_type(&self) -> PhysicalType {
    match self {
      Type::Primitive { physical_type, .. } => *physical_type,
      Type::Group { .. } => panic!("physical_type() called on a group node")
    }
  }

  pub fn type_length(&self) -> i32 {
    match self {
      Type::Primitive { type_length, .. } => *type_length,
      Type::Group { .. } => 0
    }
  }

  pub fn precision(&self) -> i32 {
    match self {
      Type::Primitive { precision, .. } => *precision,
      Type::Group { .. } => 0
    }
  }

  pub fn scale(&self) -> i32 {
    match self {
      Type::Primitive { scale, .. } => *scale,
      Type::Group { .. } => 0
    }
  }

  pub fn fields(&self) -> &[TypePtr] {
    match self {
      Type::Group { fields, .. } => fields,
      Type::Primitive { .. } => &[]
    }
  }
}

/// A `.`-joined path from the schema root to a leaf, excluding the root's
/// own (unnamed, in the flat footer encoding) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ColumnPath {
  parts: Vec<String>
}

impl ColumnPath {
  pub fn new(parts: Vec<String>) -> Self {
    ColumnPath { parts }
  }

  pub fn parts(&self) -> &[String] {
    &self.parts
  }

  pub fn string(&self) -> String {
    self.parts.join(".")
  }
}

impl fmt::Display for ColumnPath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.string())
  }
}

impl From<Vec<String>> for ColumnPath {
  fn from(parts: Vec<String>) -> Self {
    ColumnPath::new(parts)
  }
}

/// Definition/repetition-level triple for one leaf at one row, used by the
/// nested-reconstruction algorithm (spec.md §4.F). Only meaningful for a
/// leaf reached through at least one `REPEATED` ancestor; a flat column
/// has no `LevelInfo` (nulls there are simply `def_level < max_def_level`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
  pub def_level: i16,
  pub rep_level: i16,
  pub repeated_ancestor_def_level: i16
}

/// A leaf column: its primitive type, its position in the tree
/// (`path`), and the level bookkeeping needed to decode/encode its
/// def/rep-level streams.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
  primitive_type: TypePtr,
  max_def_level: i16,
  max_rep_level: i16,
  path: ColumnPath,
  repeated_ancestor_def_levels: Vec<i16>
}

impl ColumnDescriptor {
  pub fn new(primitive_type: TypePtr, max_def_level: i16, max_rep_level: i16, path: ColumnPath) -> Self {
    ColumnDescriptor {
      primitive_type,
      max_def_level,
      max_rep_level,
      path,
      repeated_ancestor_def_levels: Vec::new()
    }
  }

  /// Attaches the per-depth `repeated_ancestor_def_levels`, computed by
  /// [`SchemaDescriptor`]'s root-to-leaf walk. Not part of the public
  /// constructor since most callers building a descriptor by hand (tests,
  /// single-level schemas) have nothing to attach.
  pub(crate) fn with_repeated_ancestor_def_levels(mut self, levels: Vec<i16>) -> Self {
    self.repeated_ancestor_def_levels = levels;
    self
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }

  pub fn path(&self) -> &ColumnPath {
    &self.path
  }

  pub fn name(&self) -> &str {
    self.primitive_type.name()
  }

  pub fn physical_type(&self) -> PhysicalType {
    self.primitive_type.physical_type()
  }

  pub fn type_length(&self) -> i32 {
    self.primitive_type.type_length()
  }

  pub fn converted_type(&self) -> Option<ConvertedType> {
    self.primitive_type.basic_info().converted_type()
  }

  pub fn logical_type(&self) -> Option<LogicalType> {
    self.primitive_type.basic_info().logical_type()
  }

  pub fn self_type(&self) -> &TypePtr {
    &self.primitive_type
  }

  /// `repeated_ancestor_def_levels[max_rep_level - 1]`: the definition
  /// level of the innermost `REPEATED` ancestor, i.e. the def-level
  /// threshold below which the enclosing list itself is null rather than
  /// merely empty. `None` for a flat column.
  pub fn level_info(&self) -> Option<LevelInfo> {
    if self.max_rep_level == 0 {
      return None;
    }
    let idx = (self.max_rep_level - 1) as usize;
    let anc = *self.repeated_ancestor_def_levels.get(idx).unwrap_or(&self.max_def_level);
    Some(LevelInfo {
      def_level: self.max_def_level,
      rep_level: self.max_rep_level,
      repeated_ancestor_def_level: anc
    })
  }

  /// The definition level of the `k`-th (0-indexed) `REPEATED` ancestor,
  /// used by multi-level nesting (spec.md §4.F point 4). `k` must be
  /// `< max_rep_level`.
  pub fn repeated_ancestor_def_level(&self, k: usize) -> i16 {
    self.repeated_ancestor_def_levels[k]
  }
}

/// A flattened view of a schema tree: the root plus every leaf in
/// depth-first order, each paired with its computed level info.
#[derive(Debug)]
pub struct SchemaDescriptor {
  root: TypePtr,
  leaves: Vec<ColumnDescPtr>
}

impl SchemaDescriptor {
  pub fn new(root: TypePtr) -> Self {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    build_leaves(&root, 0, 0, &mut Vec::new(), &mut path, &mut leaves);
    SchemaDescriptor { root, leaves }
  }

  pub fn root_schema(&self) -> &TypePtr {
    &self.root
  }

  pub fn num_columns(&self) -> usize {
    self.leaves.len()
  }

  pub fn column(&self, i: usize) -> ColumnDescPtr {
    self.leaves[i].clone()
  }

  pub fn columns(&self) -> &[ColumnDescPtr] {
    &self.leaves
  }
}

/// Single root-to-leaf walk accumulating `max_def_level`, `max_rep_level`
/// and `repeated_ancestor_def_levels` (spec.md §4.E): each `OPTIONAL` or
/// `REPEATED` node adds one definition level; each `REPEATED` node also
/// adds one repetition level and records the definition level accumulated
/// so far — before this node's own contribution — as that depth's
/// repeated-ancestor threshold.
fn build_leaves(
  node: &TypePtr,
  parent_def_level: i16,
  parent_rep_level: i16,
  repeated_ancestor_def_levels: &mut Vec<i16>,
  path: &mut Vec<String>,
  leaves: &mut Vec<ColumnDescPtr>
) {
  let mut def_level = parent_def_level;
  let mut rep_level = parent_rep_level;
  let mut pushed_ancestor = false;

  match node.basic_info().repetition() {
    Some(Repetition::OPTIONAL) => {
      def_level += 1;
    },
    Some(Repetition::REPEATED) => {
      // Record the accumulated def level *before* this node's own +1
      // (spec.md §3: the threshold is what ancestors up to, but not
      // including, this repetition already guarantee).
      repeated_ancestor_def_levels.push(def_level);
      def_level += 1;
      rep_level += 1;
      pushed_ancestor = true;
    },
    Some(Repetition::REQUIRED) | None => {}
  }

  match node.as_ref() {
    Type::Primitive { .. } => {
      path.push(node.name().to_string());
      let descr = ColumnDescriptor::new(
        node.clone(),
        def_level,
        rep_level,
        ColumnPath::new(path.clone())
      )
      .with_repeated_ancestor_def_levels(repeated_ancestor_def_levels.clone());
      leaves.push(Arc::new(descr));
      path.pop();
    },
    Type::Group { fields, .. } => {
      let is_root = node.basic_info().repetition().is_none();
      if !is_root {
        path.push(node.name().to_string());
      }
      for field in fields {
        build_leaves(field, def_level, rep_level, repeated_ancestor_def_levels, path, leaves);
      }
      if !is_root {
        path.pop();
      }
    }
  }

  if pushed_ancestor {
    repeated_ancestor_def_levels.pop();
  }
}

/// Rebuilds the schema tree from the flat, depth-first `SchemaElement` list
/// stored in the footer (spec.md §4.E). A node is a group iff it carries no
/// physical `type`; `num_children` of a group tells the walk how many of
/// the following elements are its immediate children.
pub fn from_thrift(elements: &[SchemaElement]) -> Result<TypePtr> {
  if elements.is_empty() {
    return Err(schema_err!("flat schema list is empty"));
  }
  let mut index = 0;
  let root = from_thrift_step(elements, &mut index, true)?;
  if index != elements.len() {
    return Err(schema_err!(
      "flat schema list has {} trailing element(s) past the last reachable child",
      elements.len() - index
    ));
  }
  Ok(Arc::new(root))
}

fn from_thrift_step(elements: &[SchemaElement], index: &mut usize, is_root: bool) -> Result<Type> {
  let elem = &elements[*index];
  *index += 1;

  if elem.physical_type.is_none() {
    if is_root {
      // the root carries no repetition; every other group must.
    } else if elem.repetition_type.is_none() {
      return Err(schema_err!("non-root element '{}' is missing a repetition type", elem.name));
    }
    let num_children = elem.num_children.unwrap_or(0) as usize;
    let mut fields = Vec::with_capacity(num_children);
    for _ in 0..num_children {
      if *index >= elements.len() {
        return Err(schema_err!("schema list ended before all children of '{}' were read", elem.name));
      }
      fields.push(Arc::new(from_thrift_step(elements, index, false)?));
    }
    let repetition = if is_root { None } else { elem.repetition_type };
    Type::new_group(&elem.name, repetition, fields, elem.logical_type.clone(), elem.converted_type)
  } else {
    if is_root {
      return Err(schema_err!("root schema element must be a group, found primitive '{}'", elem.name));
    }
    if elem.num_children.unwrap_or(0) > 0 {
      return Err(schema_err!("primitive field '{}' must not declare children", elem.name));
    }
    let repetition = elem
      .repetition_type
      .ok_or_else(|| schema_err!("primitive field '{}' is missing a repetition type", elem.name))?;
    Type::new_primitive(
      &elem.name,
      repetition,
      elem.physical_type.unwrap(),
      elem.logical_type.clone(),
      elem.converted_type,
      elem.type_length.unwrap_or(0),
      elem.precision.unwrap_or(0),
      elem.scale.unwrap_or(0)
    )
  }
}

/// Flattens a schema tree back into the depth-first `SchemaElement` list the
/// footer stores, the inverse of [`from_thrift`].
pub fn to_thrift(root: &Type) -> Vec<SchemaElement> {
  let mut out = Vec::new();
  to_thrift_step(root, true, &mut out);
  out
}

fn to_thrift_step(node: &Type, is_root: bool, out: &mut Vec<SchemaElement>) {
  match node {
    Type::Primitive { basic_info, physical_type, type_length, precision, scale } => {
      out.push(SchemaElement {
        physical_type: Some(*physical_type),
        type_length: if *physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY { Some(*type_length) } else { None },
        repetition_type: basic_info.repetition(),
        name: basic_info.name().to_string(),
        num_children: None,
        converted_type: basic_info.converted_type(),
        scale: if *scale != 0 { Some(*scale) } else { None },
        precision: if *precision != 0 { Some(*precision) } else { None },
        field_id: basic_info.id(),
        logical_type: basic_info.logical_type()
      });
    },
    Type::Group { basic_info, fields } => {
      out.push(SchemaElement {
        physical_type: None,
        type_length: None,
        repetition_type: if is_root { None } else { basic_info.repetition() },
        name: basic_info.name().to_string(),
        num_children: Some(fields.len() as i32),
        converted_type: basic_info.converted_type(),
        scale: None,
        precision: None,
        field_id: basic_info.id(),
        logical_type: basic_info.logical_type()
      });
      for field in fields {
        to_thrift_step(field, false, out);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::Type as PhysicalType;

  fn leaf(name: &str, rep: Repetition, phys: PhysicalType) -> TypePtr {
    Arc::new(Type::new_primitive(name, rep, phys, None, None, 0, 0, 0).unwrap())
  }

  #[test]
  fn test_flat_required_column() {
    let root = Arc::new(
      Type::new_group("schema", None, vec![leaf("a", Repetition::REQUIRED, PhysicalType::INT32)], None, None).unwrap()
    );
    let descr = SchemaDescriptor::new(root);
    assert_eq!(descr.num_columns(), 1);
    let col = descr.column(0);
    assert_eq!(col.max_def_level(), 0);
    assert_eq!(col.max_rep_level(), 0);
    assert!(col.level_info().is_none());
    assert_eq!(col.path().parts(), &["a".to_string()]);
  }

  #[test]
  fn test_optional_column_increments_def_level_only() {
    let root = Arc::new(
      Type::new_group("schema", None, vec![leaf("a", Repetition::OPTIONAL, PhysicalType::INT32)], None, None).unwrap()
    );
    let descr = SchemaDescriptor::new(root);
    let col = descr.column(0);
    assert_eq!(col.max_def_level(), 1);
    assert_eq!(col.max_rep_level(), 0);
  }

  #[test]
  fn test_repeated_leaf_in_optional_list_group() {
    // schema { optional group list (LIST) { repeated int32 element; } }
    let element = leaf("element", Repetition::REPEATED, PhysicalType::INT32);
    let list_group = Arc::new(
      Type::new_group("list", Some(Repetition::OPTIONAL), vec![element], Some(LogicalType::List), None).unwrap()
    );
    let root = Arc::new(Type::new_group("schema", None, vec![list_group], None, None).unwrap());
    let descr = SchemaDescriptor::new(root);
    assert_eq!(descr.num_columns(), 1);
    let col = descr.column(0);
    // optional list (+1) then repeated element (+1 def, +1 rep) => max_def = 2, max_rep = 1
    assert_eq!(col.max_def_level(), 2);
    assert_eq!(col.max_rep_level(), 1);
    let info = col.level_info().unwrap();
    // Threshold is the def level accumulated before `element`'s own +1,
    // i.e. right after `list`'s OPTIONAL +1.
    assert_eq!(info.repeated_ancestor_def_level, 1);
    assert_eq!(col.path().parts(), &["list".to_string(), "element".to_string()]);
  }

  #[test]
  fn test_fixed_len_byte_array_requires_length() {
    let err = Type::new_primitive("f", Repetition::REQUIRED, PhysicalType::FIXED_LEN_BYTE_ARRAY, None, None, 0, 0, 0)
      .unwrap_err();
    match err {
      crate::errors::ParquetError::InvalidSchema(_) => {},
      other => panic!("expected InvalidSchema, got {:?}", other)
    }
  }

  #[test]
  fn test_multi_level_nesting_records_each_ancestor() {
    // schema { repeated group outer { repeated int32 inner; } }
    let inner = leaf("inner", Repetition::REPEATED, PhysicalType::INT32);
    let outer = Arc::new(Type::new_group("outer", Some(Repetition::REPEATED), vec![inner], None, None).unwrap());
    let root = Arc::new(Type::new_group("schema", None, vec![outer], None, None).unwrap());
    let descr = SchemaDescriptor::new(root);
    let col = descr.column(0);
    assert_eq!(col.max_rep_level(), 2);
    assert_eq!(col.max_def_level(), 2);
    // Each threshold is the def level accumulated before that depth's own
    // REPEATED +1: 0 for `outer`, 1 for `inner`.
    assert_eq!(col.repeated_ancestor_def_level(0), 0);
    assert_eq!(col.repeated_ancestor_def_level(1), 1);
  }

  fn schema_elem(name: &str) -> SchemaElement {
    SchemaElement {
      physical_type: None,
      type_length: None,
      repetition_type: None,
      name: name.to_string(),
      num_children: None,
      converted_type: None,
      scale: None,
      precision: None,
      field_id: None,
      logical_type: None
    }
  }

  #[test]
  fn test_from_thrift_empty_list_is_error() {
    let err = from_thrift(&[]).unwrap_err();
    match err {
      crate::errors::ParquetError::InvalidSchema(_) => {},
      other => panic!("expected InvalidSchema, got {:?}", other)
    }
  }

  #[test]
  fn test_from_thrift_first_element_not_a_group_is_error() {
    let mut elem = schema_elem("x");
    elem.physical_type = Some(PhysicalType::INT32);
    elem.repetition_type = Some(Repetition::REQUIRED);
    let err = from_thrift(&[elem]).unwrap_err();
    match err {
      crate::errors::ParquetError::InvalidSchema(_) => {},
      other => panic!("expected InvalidSchema, got {:?}", other)
    }
  }

  #[test]
  fn test_from_thrift_primitive_with_children_is_error() {
    let mut root = schema_elem("schema");
    root.num_children = Some(1);
    let mut bogus = schema_elem("a");
    bogus.physical_type = Some(PhysicalType::INT32);
    bogus.repetition_type = Some(Repetition::REQUIRED);
    bogus.num_children = Some(1);
    let err = from_thrift(&[root, bogus]).unwrap_err();
    match err {
      crate::errors::ParquetError::InvalidSchema(_) => {},
      other => panic!("expected InvalidSchema, got {:?}", other)
    }
  }

  #[test]
  fn test_from_thrift_non_root_missing_repetition_is_error() {
    let mut root = schema_elem("schema");
    root.num_children = Some(1);
    let group_no_rep = schema_elem("g"); // group, num_children defaults to 0, but no repetition_type
    let err = from_thrift(&[root, group_no_rep]).unwrap_err();
    match err {
      crate::errors::ParquetError::InvalidSchema(_) => {},
      other => panic!("expected InvalidSchema, got {:?}", other)
    }
  }

  #[test]
  fn test_from_thrift_and_to_thrift_roundtrip() {
    let mut root = schema_elem("schema");
    root.num_children = Some(2);
    let mut a = schema_elem("a");
    a.physical_type = Some(PhysicalType::INT32);
    a.repetition_type = Some(Repetition::REQUIRED);
    let mut list_group = schema_elem("list");
    list_group.repetition_type = Some(Repetition::OPTIONAL);
    list_group.num_children = Some(1);
    list_group.converted_type = Some(ConvertedType::LIST);
    let mut element = schema_elem("element");
    element.physical_type = Some(PhysicalType::INT64);
    element.repetition_type = Some(Repetition::REPEATED);

    let tree = from_thrift(&[root, a, list_group, element]).unwrap();
    let descr = SchemaDescriptor::new(tree.clone());
    assert_eq!(descr.num_columns(), 2);
    assert_eq!(descr.column(0).name(), "a");
    assert_eq!(descr.column(1).name(), "element");
    assert_eq!(descr.column(1).max_rep_level(), 1);

    let flattened = to_thrift(&tree);
    assert_eq!(flattened.len(), 4);
    assert_eq!(flattened[0].name, "schema");
    assert_eq!(flattened[0].repetition_type, None);
    assert_eq!(flattened[2].converted_type, Some(ConvertedType::LIST));

    // Flattening then rebuilding must reproduce the same leaves.
    let rebuilt = from_thrift(&flattened).unwrap();
    let rebuilt_descr = SchemaDescriptor::new(rebuilt);
    assert_eq!(rebuilt_descr.num_columns(), 2);
    assert_eq!(rebuilt_descr.column(1).max_rep_level(), 1);
  }
}
