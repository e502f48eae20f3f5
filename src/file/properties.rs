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

//! Writer and reader configuration (spec.md §6 "Writer properties
//! (enumerated)" and §5 "Buffering"). `WriterProperties` carries exactly the
//! four knobs the spec allows ("no other knobs affect on-disk bytes");
//! `ReaderProperties` is the read-side counterpart, carrying the buffered
//! reader's window size.

use std::sync::Arc;

use crate::basic::Compression;

/// Default data page size threshold, in bytes, before a page is flushed.
pub const DEFAULT_PAGE_SIZE_LIMIT: usize = 1024 * 1024;

/// Default dictionary toggle: on, matching the common-case writer profile.
pub const DEFAULT_DICTIONARY_ENABLED: bool = true;

/// Default `created_by` string embedded in `FileMetaData`.
pub fn default_created_by() -> String {
  format!("parquet-core version {}", env!("CARGO_PKG_VERSION"))
}

pub type WriterPropertiesPtr = Arc<WriterProperties>;

/// Immutable, shared writer configuration. One instance is typically built
/// once and handed to every row group / column writer in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterProperties {
  compression: Compression,
  page_size_limit: usize,
  dictionary_enabled: bool,
  created_by: String
}

impl WriterProperties {
  pub fn builder() -> WriterPropertiesBuilder {
    WriterPropertiesBuilder::with_defaults()
  }

  pub fn compression(&self) -> Compression {
    self.compression
  }

  pub fn page_size_limit(&self) -> usize {
    self.page_size_limit
  }

  pub fn dictionary_enabled(&self) -> bool {
    self.dictionary_enabled
  }

  pub fn created_by(&self) -> &str {
    &self.created_by
  }
}

impl Default for WriterProperties {
  fn default() -> Self {
    WriterProperties::builder().build()
  }
}

/// Fluent builder for [`WriterProperties`], mirroring the schema tree's
/// constructor-function style with `.set_*` steps and a terminal `.build()`.
pub struct WriterPropertiesBuilder {
  compression: Compression,
  page_size_limit: usize,
  dictionary_enabled: bool,
  created_by: String
}

impl WriterPropertiesBuilder {
  fn with_defaults() -> Self {
    WriterPropertiesBuilder {
      compression: Compression::UNCOMPRESSED,
      page_size_limit: DEFAULT_PAGE_SIZE_LIMIT,
      dictionary_enabled: DEFAULT_DICTIONARY_ENABLED,
      created_by: default_created_by()
    }
  }

  pub fn set_compression(mut self, compression: Compression) -> Self {
    self.compression = compression;
    self
  }

  pub fn set_page_size_limit(mut self, limit: usize) -> Self {
    self.page_size_limit = limit;
    self
  }

  pub fn set_dictionary_enabled(mut self, enabled: bool) -> Self {
    self.dictionary_enabled = enabled;
    self
  }

  pub fn set_created_by(mut self, created_by: String) -> Self {
    self.created_by = created_by;
    self
  }

  pub fn build(self) -> WriterProperties {
    WriterProperties {
      compression: self.compression,
      page_size_limit: self.page_size_limit,
      dictionary_enabled: self.dictionary_enabled,
      created_by: self.created_by
    }
  }
}

pub type ReaderPropertiesPtr = Arc<ReaderProperties>;

/// Read-side configuration: just the buffered reader's window size
/// (spec.md §5 default 8 KiB).
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderProperties {
  buffer_size: usize
}

impl ReaderProperties {
  pub fn builder() -> ReaderPropertiesBuilder {
    ReaderPropertiesBuilder { buffer_size: crate::util::io::DEFAULT_BUFFER_SIZE }
  }

  pub fn buffer_size(&self) -> usize {
    self.buffer_size
  }
}

impl Default for ReaderProperties {
  fn default() -> Self {
    ReaderProperties::builder().build()
  }
}

pub struct ReaderPropertiesBuilder {
  buffer_size: usize
}

impl ReaderPropertiesBuilder {
  pub fn set_buffer_size(mut self, size: usize) -> Self {
    self.buffer_size = size;
    self
  }

  pub fn build(self) -> ReaderProperties {
    ReaderProperties { buffer_size: self.buffer_size }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_writer_properties_defaults() {
    let props = WriterProperties::builder().build();
    assert_eq!(props.compression(), Compression::UNCOMPRESSED);
    assert_eq!(props.page_size_limit(), DEFAULT_PAGE_SIZE_LIMIT);
    assert!(props.dictionary_enabled());
  }

  #[test]
  fn test_writer_properties_builder_overrides() {
    let props = WriterProperties::builder()
      .set_compression(Compression::SNAPPY)
      .set_page_size_limit(4096)
      .set_dictionary_enabled(false)
      .set_created_by("test-writer".to_string())
      .build();
    assert_eq!(props.compression(), Compression::SNAPPY);
    assert_eq!(props.page_size_limit(), 4096);
    assert!(!props.dictionary_enabled());
    assert_eq!(props.created_by(), "test-writer");
  }

  #[test]
  fn test_reader_properties_defaults() {
    let props = ReaderProperties::builder().build();
    assert_eq!(props.buffer_size(), crate::util::io::DEFAULT_BUFFER_SIZE);
  }
}
