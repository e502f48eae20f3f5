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

//! The random-access I/O interface the core consumes (spec.md §6), plus a
//! small buffered window over it (spec.md §5) that coalesces the short
//! reads the footer probe and page-header parsing perform.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Mutex;

use crate::errors::{ParquetError, Result};

/// Default size of the buffered reader's single contiguous window.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// A random-access byte source: `size` plus position-explicit, stateless
/// `read`. Implemented for `File` and for in-memory buffers in tests.
pub trait ChunkReader: Send + Sync {
  fn len(&self) -> Result<u64>;

  /// Reads exactly `count` bytes starting at `start`, or errors.
  fn read_at(&self, start: u64, count: usize) -> Result<Vec<u8>>;
}

impl ChunkReader for File {
  fn len(&self) -> Result<u64> {
    Ok(self.metadata()?.len())
  }

  fn read_at(&self, start: u64, count: usize) -> Result<Vec<u8>> {
    // `File` does not give us interior mutability for `seek`, so route
    // through a fresh handle-scoped lock to keep `&self` reads stateless
    // from the caller's perspective, matching the "reads are position-
    // explicit and stateless across calls" contract in spec.md §6.
    use std::os::unix::fs::FileExt;
    let mut buf = vec![0u8; count];
    self.read_exact_at(&mut buf, start).map_err(|e| {
      ParquetError::Io(format!("short read at offset {} for {} bytes: {}", start, count, e))
    })?;
    Ok(buf)
  }
}

impl ChunkReader for Vec<u8> {
  fn len(&self) -> Result<u64> {
    Ok(self.as_slice().len() as u64)
  }

  fn read_at(&self, start: u64, count: usize) -> Result<Vec<u8>> {
    let start = start as usize;
    if start + count > self.len() {
      return Err(eof_err!("read past end of buffer"));
    }
    Ok(self[start..start + count].to_vec())
  }
}

/// A small buffered window above a [`ChunkReader`]. Holds one contiguous
/// span; reads that fall inside it are served from memory, reads that
/// don't either refill the window (if they fit) or go straight to the
/// underlying reader (spec.md §5: "Large reads ... bypass the buffer").
pub struct BufferedReader<'a> {
  source: &'a dyn ChunkReader,
  window: Mutex<Option<(u64, Vec<u8>)>>,
  window_size: usize
}

impl<'a> BufferedReader<'a> {
  pub fn new(source: &'a dyn ChunkReader, window_size: usize) -> Self {
    BufferedReader { source, window: Mutex::new(None), window_size }
  }

  pub fn len(&self) -> Result<u64> {
    self.source.len()
  }

  /// Reads `count` bytes starting at `start`, using the buffered window
  /// when the span is small enough to benefit from one.
  pub fn read_at(&self, start: u64, count: usize) -> Result<Vec<u8>> {
    if count > self.window_size {
      return self.source.read_at(start, count);
    }

    let mut guard = self.window.lock().unwrap();
    if let Some((win_start, ref buf)) = *guard {
      let win_end = win_start + buf.len() as u64;
      if start >= win_start && start + count as u64 <= win_end {
        let offset = (start - win_start) as usize;
        return Ok(buf[offset..offset + count].to_vec());
      }
    }

    let file_len = self.source.len()?;
    let refill_len = self.window_size.min((file_len - start.min(file_len)) as usize);
    let refill_len = refill_len.max(count);
    let data = self.source.read_at(start, refill_len)?;
    let result = data[..count].to_vec();
    *guard = Some((start, data));
    Ok(result)
  }
}

/// Adapts a [`ChunkReader`] slice into a `std::io::Read + Seek` for code
/// (page decompression, value decoding) that wants a streaming view of one
/// already-sliced region rather than the random-access interface.
pub struct SliceReader {
  data: Vec<u8>,
  pos: usize
}

impl SliceReader {
  pub fn new(data: Vec<u8>) -> Self {
    SliceReader { data, pos: 0 }
  }
}

impl Read for SliceReader {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let n = (self.data.len() - self.pos).min(buf.len());
    buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
    self.pos += n;
    Ok(n)
  }
}

impl Seek for SliceReader {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    let new_pos = match pos {
      SeekFrom::Start(p) => p as i64,
      SeekFrom::End(p) => self.data.len() as i64 + p,
      SeekFrom::Current(p) => self.pos as i64 + p
    };
    if new_pos < 0 {
      return Err(io::Error::new(io::ErrorKind::InvalidInput, "negative seek"));
    }
    self.pos = new_pos as usize;
    Ok(self.pos as u64)
  }
}
