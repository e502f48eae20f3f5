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

//! Compression codec adapters (component G). `create_codec` is a pure
//! function over [`Compression`]; the page layer is the only caller and
//! owns the expected-size check against the page header.

use std::io::{Read, Write};

use crate::basic::Compression;
use crate::errors::Result;

/// A page payload compressor/decompressor. No adapter holds state across
/// calls beyond what the underlying library's one-shot API needs.
pub trait Codec {
  /// Appends the compressed form of `input` to `output`.
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

  /// Decompresses `input` into `output`, returning the number of bytes
  /// written. `output` is sized by the caller to the page header's
  /// declared uncompressed size.
  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;
}

struct GzipCodec;

fn codec_err(codec: &str, e: impl std::fmt::Display) -> crate::errors::ParquetError {
  crate::errors::ParquetError::CodecError(format!("{} codec failed: {}", codec, e))
}

/// Copies `decompressed` into the caller's fixed-size `output`, returning
/// its full length the same way every codec's `decompress` does (a
/// too-small `output` is a truncated, not an erroring, copy — the caller
/// checks the returned length against the expected size).
fn copy_into(decompressed: &[u8], output: &mut [u8]) -> usize {
  let n = decompressed.len().min(output.len());
  output[..n].copy_from_slice(&decompressed[..n]);
  decompressed.len()
}

impl Codec for GzipCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    use flate2::write::GzEncoder;
    let mut encoder = GzEncoder::new(output, flate2::Compression::default());
    encoder.write_all(input).map_err(|e| codec_err("gzip", e))?;
    encoder.finish().map_err(|e| codec_err("gzip", e))?;
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
    use flate2::read::GzDecoder;
    let mut decoder = GzDecoder::new(input);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).map_err(|e| codec_err("gzip", e))?;
    Ok(copy_into(&decompressed, output))
  }
}

struct SnappyCodec;

impl Codec for SnappyCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut encoder = snap::raw::Encoder::new();
    let compressed = encoder.compress_vec(input).map_err(|e| codec_err("snappy", e))?;
    output.extend_from_slice(&compressed);
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut decoder = snap::raw::Decoder::new();
    let decompressed = decoder.decompress_vec(input).map_err(|e| codec_err("snappy", e))?;
    Ok(copy_into(&decompressed, output))
  }
}

struct BrotliCodec;

impl Codec for BrotliCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut params = brotli::enc::backward_references::BrotliEncoderParams::default();
    params.quality = 11;
    let mut reader = input;
    brotli::BrotliCompress(&mut reader, output, &params).map_err(|e| codec_err("brotli", e))?;
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut reader = input;
    let mut decompressed = Vec::new();
    brotli::BrotliDecompress(&mut reader, &mut decompressed).map_err(|e| codec_err("brotli", e))?;
    Ok(copy_into(&decompressed, output))
  }
}

struct ZstdCodec;

impl Codec for ZstdCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let compressed = zstd::stream::encode_all(input, 0).map_err(|e| codec_err("zstd", e))?;
    output.extend_from_slice(&compressed);
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let decompressed = zstd::stream::decode_all(input).map_err(|e| codec_err("zstd", e))?;
    Ok(copy_into(&decompressed, output))
  }
}

/// Builds the codec for `compression`, or `None` for `UNCOMPRESSED` (the
/// page layer then copies the payload through unchanged).
pub fn create_codec(compression: Compression) -> Result<Option<Box<dyn Codec>>> {
  match compression {
    Compression::UNCOMPRESSED => Ok(None),
    Compression::GZIP => Ok(Some(Box::new(GzipCodec))),
    Compression::SNAPPY => Ok(Some(Box::new(SnappyCodec))),
    Compression::BROTLI => Ok(Some(Box::new(BrotliCodec))),
    Compression::ZSTD => Ok(Some(Box::new(ZstdCodec))),
    Compression::LZ4_RAW => Err(nyi_err!("LZ4_RAW compression is not implemented")),
    Compression::LZO => Err(nyi_err!("LZO compression is not implemented"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(compression: Compression) {
    let data = b"the quick brown fox jumps over the lazy dog, repeated. the quick brown fox jumps over the lazy dog.".to_vec();
    let mut codec = create_codec(compression).unwrap().unwrap();
    let mut compressed = Vec::new();
    codec.compress(&data, &mut compressed).unwrap();
    let mut decompressed = vec![0u8; data.len()];
    let n = codec.decompress(&compressed, &mut decompressed).unwrap();
    assert_eq!(n, data.len());
    assert_eq!(&decompressed[..n], &data[..]);
  }

  #[test]
  fn test_gzip_roundtrip() {
    roundtrip(Compression::GZIP);
  }

  #[test]
  fn test_snappy_roundtrip() {
    roundtrip(Compression::SNAPPY);
  }

  #[test]
  fn test_brotli_roundtrip() {
    roundtrip(Compression::BROTLI);
  }

  #[test]
  fn test_zstd_roundtrip() {
    roundtrip(Compression::ZSTD);
  }

  #[test]
  fn test_uncompressed_returns_no_codec() {
    assert!(create_codec(Compression::UNCOMPRESSED).unwrap().is_none());
  }

  #[test]
  fn test_lz4_raw_and_lzo_are_unsupported() {
    assert!(create_codec(Compression::LZ4_RAW).is_err());
    assert!(create_codec(Compression::LZO).is_err());
  }
}
