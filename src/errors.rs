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

//! Common error type shared by every layer of the core.

use std::error::Error;
use std::io;
use std::str;

quick_error! {
  /// A single tagged error type for the whole crate.
  ///
  /// Every decoder and encoder in this crate returns `Result<T>` over this
  /// type rather than panicking on malformed input.
  #[derive(Debug, PartialEq, Clone)]
  pub enum ParquetError {
    /// The injected I/O interface reported a failure.
    Io(message: String) {
      display("I/O error: {}", message)
    }
    /// The source buffer ended before a value/run/struct finished decoding.
    TruncatedInput(message: String) {
      display("Truncated input: {}", message)
    }
    /// A `PAR1` magic check failed at the head or tail of the file.
    InvalidMagic(message: String) {
      display("Invalid magic: {}", message)
    }
    /// The footer failed to parse: a required field was absent, an unknown
    /// enum value appeared in a required slot, or offsets were inconsistent.
    InvalidMetadata(message: String) {
      display("Invalid metadata: {}", message)
    }
    /// The flat schema list failed to reconstruct into a valid tree.
    InvalidSchema(message: String) {
      display("Invalid schema: {}", message)
    }
    /// A feature this implementation deliberately omits was encountered.
    Unsupported(message: String) {
      display("Not yet implemented: {}", message)
    }
    /// A varint exceeded 10 payload bytes or overflowed its target width.
    VarintOverflow(message: String) {
      display("Varint overflow: {}", message)
    }
    /// An RLE/bit-packed run header was semantically invalid.
    InvalidRunHeader(message: String) {
      display("Invalid run header: {}", message)
    }
    /// An internal consistency check failed (byte counts, dictionary index
    /// range, value count mismatches).
    Malformed(message: String) {
      display("Malformed data: {}", message)
    }
    /// A decompressed page did not match its declared size, or a CRC check
    /// failed.
    CorruptPage(message: String) {
      display("Corrupt page: {}", message)
    }
    /// A caller-supplied index or offset was out of bounds.
    OutOfRange(message: String) {
      display("Out of range: {}", message)
    }
    /// The compression codec reported a failure.
    CodecError(message: String) {
      display("Codec error: {}", message)
    }
  }
}

impl From<io::Error> for ParquetError {
  fn from(e: io::Error) -> ParquetError {
    ParquetError::Io(e.to_string())
  }
}

impl From<str::Utf8Error> for ParquetError {
  fn from(e: str::Utf8Error) -> ParquetError {
    ParquetError::InvalidMetadata(format!("invalid UTF-8: {}", e))
  }
}

impl From<ParquetError> for io::Error {
  fn from(e: ParquetError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.description().to_string())
  }
}

/// A convenient result type over [`ParquetError`].
pub type Result<T> = ::std::result::Result<T, ParquetError>;

// ----------------------------------------------------------------------
// Macros for constructing errors tersely at call sites, following the
// teacher's convention of one macro per error kind used on a hot path.

macro_rules! general_err {
  ($fmt:expr) => (ParquetError::InvalidMetadata($fmt.to_string()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::InvalidMetadata(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
  ($fmt:expr) => (ParquetError::TruncatedInput($fmt.to_string()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::TruncatedInput(format!($fmt, $($args),*)));
}

macro_rules! nyi_err {
  ($fmt:expr) => (ParquetError::Unsupported($fmt.to_string()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::Unsupported(format!($fmt, $($args),*)));
}

macro_rules! malformed_err {
  ($fmt:expr) => (ParquetError::Malformed($fmt.to_string()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::Malformed(format!($fmt, $($args),*)));
}

macro_rules! schema_err {
  ($fmt:expr) => (ParquetError::InvalidSchema($fmt.to_string()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::InvalidSchema(format!($fmt, $($args),*)));
}
