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

//! One (value, definition-level, repetition-level) triple at a time, pulled
//! off a [`ColumnReaderImpl`] in small batches and re-exposed one step at a
//! time for the nested-reconstruction walk in [`super::reader`].

use crate::basic::Type as PhysicalType;
use crate::column::reader::ColumnReaderImpl;
use crate::data_type::*;
use crate::errors::Result;
use crate::record::api::{
  convert_bool, convert_byte_array, convert_double, convert_fixed_len_byte_array, convert_float, convert_int32,
  convert_int64, convert_int96, Field
};
use crate::schema::types::ColumnDescPtr;

const BATCH_SIZE: usize = 1024;

/// A single column's typed triple-at-a-time cursor. Buffers `BATCH_SIZE`
/// levels/values at once and serves them out one at a time via
/// [`Self::advance_columns`], matching the step granularity the assembly
/// algorithm needs (spec.md §4.F).
struct TypedTripletIter<'a, T: DataType>
where
  T: 'static
{
  reader: ColumnReaderImpl<'a, T>,
  max_def_level: i16,
  max_rep_level: i16,
  def_levels: Vec<i16>,
  rep_levels: Vec<i16>,
  values: Vec<T::T>,
  levels_buffered: usize,
  levels_consumed: usize,
  values_buffered: usize,
  values_consumed: usize,
  current_value: T::T,
  current_def_level: i16,
  current_rep_level: i16,
  exhausted: bool
}

impl<'a, T: DataType> TypedTripletIter<'a, T>
where
  T: 'static
{
  fn new(descr: ColumnDescPtr, page_reader: Box<dyn crate::column::page::PageReader + 'a>) -> Result<Self> {
    let max_def_level = descr.max_def_level();
    let max_rep_level = descr.max_rep_level();
    let mut iter = TypedTripletIter {
      reader: ColumnReaderImpl::new(descr, page_reader),
      max_def_level,
      max_rep_level,
      def_levels: vec![0; BATCH_SIZE],
      rep_levels: vec![0; BATCH_SIZE],
      values: vec![T::T::default(); BATCH_SIZE],
      levels_buffered: 0,
      levels_consumed: 0,
      values_buffered: 0,
      values_consumed: 0,
      current_value: T::T::default(),
      current_def_level: max_def_level,
      current_rep_level: 0,
      exhausted: false
    };
    iter.advance_columns()?;
    Ok(iter)
  }

  fn is_empty(&self) -> bool {
    self.exhausted
  }

  fn current_def_level(&self) -> i16 {
    self.current_def_level
  }

  fn current_rep_level(&self) -> i16 {
    self.current_rep_level
  }

  fn current_value(&self) -> &T::T {
    &self.current_value
  }

  /// Moves to the next triple, refilling the internal buffer from the
  /// column reader when it runs dry. Sets `is_empty()` once the column
  /// chunk is exhausted.
  fn advance_columns(&mut self) -> Result<()> {
    if self.levels_consumed >= self.levels_buffered && self.values_consumed >= self.values_buffered {
      self.fill_buffer()?;
      if self.levels_buffered == 0 && self.values_buffered == 0 {
        self.exhausted = true;
        return Ok(());
      }
    }

    if self.max_def_level > 0 {
      self.current_def_level = self.def_levels[self.levels_consumed];
      self.current_rep_level = if self.max_rep_level > 0 { self.rep_levels[self.levels_consumed] } else { 0 };
      self.levels_consumed += 1;
      if self.current_def_level == self.max_def_level {
        self.current_value = self.values[self.values_consumed].clone();
        self.values_consumed += 1;
      }
    } else {
      self.current_def_level = 0;
      self.current_rep_level = 0;
      self.current_value = self.values[self.values_consumed].clone();
      self.values_consumed += 1;
    }
    Ok(())
  }

  fn fill_buffer(&mut self) -> Result<()> {
    let (values_read, levels_read) = self.reader.read_batch(
      BATCH_SIZE,
      Some(&mut self.def_levels),
      Some(&mut self.rep_levels),
      &mut self.values
    )?;
    self.values_buffered = values_read;
    self.levels_buffered = if self.max_def_level > 0 { levels_read } else { values_read };
    self.levels_consumed = 0;
    self.values_consumed = 0;
    Ok(())
  }
}

/// Type-erased triplet cursor, one variant per physical type, exposing a
/// [`Field`] conversion of the current value so [`super::reader::Reader`]
/// doesn't need to be generic over `T`.
pub enum TripletIter<'a> {
  Bool(TypedTripletIter<'a, BoolType>),
  Int32(TypedTripletIter<'a, Int32Type>),
  Int64(TypedTripletIter<'a, Int64Type>),
  Int96(TypedTripletIter<'a, Int96Type>),
  Float(TypedTripletIter<'a, FloatType>),
  Double(TypedTripletIter<'a, DoubleType>),
  ByteArray(TypedTripletIter<'a, ByteArrayType>),
  FixedLenByteArray(TypedTripletIter<'a, FixedLenByteArrayType>)
}

impl<'a> TripletIter<'a> {
  pub fn new(descr: ColumnDescPtr, page_reader: Box<dyn crate::column::page::PageReader + 'a>) -> Result<Self> {
    Ok(match descr.physical_type() {
      PhysicalType::BOOLEAN => TripletIter::Bool(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::INT32 => TripletIter::Int32(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::INT64 => TripletIter::Int64(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::INT96 => TripletIter::Int96(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::FLOAT => TripletIter::Float(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::DOUBLE => TripletIter::Double(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::BYTE_ARRAY => TripletIter::ByteArray(TypedTripletIter::new(descr, page_reader)?),
      PhysicalType::FIXED_LEN_BYTE_ARRAY => TripletIter::FixedLenByteArray(TypedTripletIter::new(descr, page_reader)?)
    })
  }

  pub fn is_empty(&self) -> bool {
    match self {
      TripletIter::Bool(i) => i.is_empty(),
      TripletIter::Int32(i) => i.is_empty(),
      TripletIter::Int64(i) => i.is_empty(),
      TripletIter::Int96(i) => i.is_empty(),
      TripletIter::Float(i) => i.is_empty(),
      TripletIter::Double(i) => i.is_empty(),
      TripletIter::ByteArray(i) => i.is_empty(),
      TripletIter::FixedLenByteArray(i) => i.is_empty()
    }
  }

  pub fn current_def_level(&self) -> i16 {
    match self {
      TripletIter::Bool(i) => i.current_def_level(),
      TripletIter::Int32(i) => i.current_def_level(),
      TripletIter::Int64(i) => i.current_def_level(),
      TripletIter::Int96(i) => i.current_def_level(),
      TripletIter::Float(i) => i.current_def_level(),
      TripletIter::Double(i) => i.current_def_level(),
      TripletIter::ByteArray(i) => i.current_def_level(),
      TripletIter::FixedLenByteArray(i) => i.current_def_level()
    }
  }

  pub fn current_rep_level(&self) -> i16 {
    match self {
      TripletIter::Bool(i) => i.current_rep_level(),
      TripletIter::Int32(i) => i.current_rep_level(),
      TripletIter::Int64(i) => i.current_rep_level(),
      TripletIter::Int96(i) => i.current_rep_level(),
      TripletIter::Float(i) => i.current_rep_level(),
      TripletIter::Double(i) => i.current_rep_level(),
      TripletIter::ByteArray(i) => i.current_rep_level(),
      TripletIter::FixedLenByteArray(i) => i.current_rep_level()
    }
  }

  pub fn advance_columns(&mut self) -> Result<()> {
    match self {
      TripletIter::Bool(i) => i.advance_columns(),
      TripletIter::Int32(i) => i.advance_columns(),
      TripletIter::Int64(i) => i.advance_columns(),
      TripletIter::Int96(i) => i.advance_columns(),
      TripletIter::Float(i) => i.advance_columns(),
      TripletIter::Double(i) => i.advance_columns(),
      TripletIter::ByteArray(i) => i.advance_columns(),
      TripletIter::FixedLenByteArray(i) => i.advance_columns()
    }
  }

  /// Converts the current value to a [`Field`] using the descriptor's
  /// converted/logical type annotation. Only meaningful when
  /// `current_def_level() == descr.max_def_level()`; the caller is
  /// responsible for checking that first.
  pub fn current_value_as_field(&self, descr: &ColumnDescPtr) -> Field {
    let converted_type = descr.converted_type();
    let logical_type = descr.logical_type();
    match self {
      TripletIter::Bool(i) => convert_bool(*i.current_value()),
      TripletIter::Int32(i) => convert_int32(converted_type, &logical_type, *i.current_value()),
      TripletIter::Int64(i) => convert_int64(converted_type, &logical_type, *i.current_value()),
      TripletIter::Int96(i) => convert_int96(i.current_value().clone()),
      TripletIter::Float(i) => convert_float(*i.current_value()),
      TripletIter::Double(i) => convert_double(*i.current_value()),
      TripletIter::ByteArray(i) => convert_byte_array(converted_type, &logical_type, i.current_value().clone()),
      TripletIter::FixedLenByteArray(i) => {
        convert_fixed_len_byte_array(converted_type, &logical_type, i.current_value().clone())
      }
    }
  }
}
