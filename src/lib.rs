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

//! Core columnar codec, nested-value reconstruction, and Thrift Compact
//! footer codec for the Apache Parquet file format.
//!
//! This crate reads and writes the on-disk column chunk/page layout and
//! its Thrift Compact `FileMetaData` footer, and reassembles/flattens
//! nested rows from/to flat leaf columns using the standard definition-
//! and repetition-level encoding. It does not implement a query engine,
//! predicate pushdown, or Arrow interop; see the crate-level modules
//! below for what each layer owns.
//!
//! ```no_run
//! use parquet_core::file::reader::{FileReader, SerializedFileReader};
//! use parquet_core::record::RowIter;
//!
//! # fn main() -> parquet_core::errors::Result<()> {
//! let file = std::fs::File::open("data.parquet")?;
//! let reader = SerializedFileReader::new(file)?;
//! for i in 0..reader.num_row_groups() {
//!   let row_group = reader.get_row_group(i)?;
//!   for row in RowIter::new(row_group.as_ref())? {
//!     let _row = row?;
//!   }
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate quick_error;

#[macro_use]
pub mod errors;

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod file;
pub mod record;
pub mod schema;
pub mod thrift;
pub mod util;
