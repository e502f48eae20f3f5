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

//! Byte buffer primitives. `ByteBufferPtr` is a cheap-to-clone, reference
//! counted view over a byte range, used everywhere a page/value buffer is
//! passed between the footer, page and value-decoding layers without
//! copying.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A reference-counted, immutable byte buffer with an optional start/end
/// window, so `start_from`/`range` are O(1) and share the same backing
/// allocation.
#[derive(Clone)]
pub struct ByteBufferPtr {
  data: Arc<Vec<u8>>,
  start: usize,
  len: usize
}

impl ByteBufferPtr {
  pub fn new(v: Vec<u8>) -> Self {
    let len = v.len();
    ByteBufferPtr { data: Arc::new(v), start: 0, len }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns the sub-buffer `[start, start+len)` of this buffer.
  pub fn range(&self, start: usize, len: usize) -> ByteBufferPtr {
    assert!(start + len <= self.len, "range out of bounds");
    ByteBufferPtr { data: self.data.clone(), start: self.start + start, len }
  }

  /// Returns the sub-buffer starting at `start` and running to the end.
  pub fn start_from(&self, start: usize) -> ByteBufferPtr {
    assert!(start <= self.len, "start out of bounds");
    ByteBufferPtr { data: self.data.clone(), start: self.start + start, len: self.len - start }
  }

  /// Returns the whole buffer, unchanged. Convenience alias used where a
  /// sub-decoder takes ownership of "the rest of the data".
  pub fn all(&self) -> ByteBufferPtr {
    self.clone()
  }
}

impl AsRef<[u8]> for ByteBufferPtr {
  fn as_ref(&self) -> &[u8] {
    &self.data[self.start..self.start + self.len]
  }
}

impl PartialEq for ByteBufferPtr {
  fn eq(&self, other: &ByteBufferPtr) -> bool {
    self.as_ref() == other.as_ref()
  }
}
impl Eq for ByteBufferPtr {}

impl PartialOrd for ByteBufferPtr {
  fn partial_cmp(&self, other: &ByteBufferPtr) -> Option<::std::cmp::Ordering> {
    Some(self.as_ref().cmp(other.as_ref()))
  }
}
impl Ord for ByteBufferPtr {
  fn cmp(&self, other: &ByteBufferPtr) -> ::std::cmp::Ordering {
    self.as_ref().cmp(other.as_ref())
  }
}

impl ::std::hash::Hash for ByteBufferPtr {
  fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
    self.as_ref().hash(state)
  }
}

impl fmt::Debug for ByteBufferPtr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "ByteBufferPtr {{ len: {} }}", self.len)
  }
}

/// An owned, growable byte buffer used while accumulating encoder output.
#[derive(Clone, Default)]
pub struct ByteBuffer {
  data: Vec<u8>
}

impl ByteBuffer {
  pub fn new() -> Self {
    ByteBuffer { data: Vec::new() }
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn set_data(&mut self, data: Vec<u8>) {
    self.data = data;
  }

  pub fn clear(&mut self) {
    self.data.clear();
  }

  pub fn extend_from_slice(&mut self, other: &[u8]) {
    self.data.extend_from_slice(other);
  }

  pub fn consume(self) -> ByteBufferPtr {
    ByteBufferPtr::new(self.data)
  }
}

/// A half-open byte range within a file, used by the page reader to avoid
/// re-deriving offsets from running totals.
pub type ByteRange = Range<u64>;
