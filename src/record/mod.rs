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

//! Nested value reconstruction and assembly (spec.md §4.F): the logical
//! [`api::Row`]/[`api::Field`] model, the per-leaf [`triplet`] cursor it's
//! built from on read, the schema-tree-shaped [`reader`], and its mirror
//! image [`writer`].

pub mod api;
pub mod reader;
pub mod triplet;
pub mod writer;

pub use api::{Field, Row};
pub use reader::RowIter;
pub use writer::RowWriter;
