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

//! The typed, flat value/level reader for one column chunk (spec.md §4.F,
//! "Column reader"). This is the layer below nested reconstruction: it
//! hands back parallel `(values, def_levels, rep_levels)` slices one data
//! page at a time, unaware of the schema tree above its own column.

use std::collections::HashMap;
use std::mem;

use crate::basic::*;
use crate::data_type::*;
use crate::encodings::decoding::{get_decoder, DictDecoder, Decoder, PlainDecoder};
use crate::encodings::levels::LevelDecoder;
use crate::errors::Result;
use crate::schema::types::ColumnDescPtr;

use super::page::{Page, PageReader};

pub enum ColumnReader<'a> {
  BoolColumnReader(ColumnReaderImpl<'a, BoolType>),
  Int32ColumnReader(ColumnReaderImpl<'a, Int32Type>),
  Int64ColumnReader(ColumnReaderImpl<'a, Int64Type>),
  Int96ColumnReader(ColumnReaderImpl<'a, Int96Type>),
  FloatColumnReader(ColumnReaderImpl<'a, FloatType>),
  DoubleColumnReader(ColumnReaderImpl<'a, DoubleType>),
  ByteArrayColumnReader(ColumnReaderImpl<'a, ByteArrayType>),
  FixedLenByteArrayColumnReader(ColumnReaderImpl<'a, FixedLenByteArrayType>)
}

/// Builds the column reader matching `col_descr`'s physical type.
pub fn get_column_reader<'a>(col_descr: ColumnDescPtr, col_page_reader: Box<dyn PageReader + 'a>) -> ColumnReader<'a> {
  match col_descr.physical_type() {
    Type::BOOLEAN => ColumnReader::BoolColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::INT32 => ColumnReader::Int32ColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::INT64 => ColumnReader::Int64ColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::INT96 => ColumnReader::Int96ColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::FLOAT => ColumnReader::FloatColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::DOUBLE => ColumnReader::DoubleColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::BYTE_ARRAY => ColumnReader::ByteArrayColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader)),
    Type::FIXED_LEN_BYTE_ARRAY => {
      ColumnReader::FixedLenByteArrayColumnReader(ColumnReaderImpl::new(col_descr, col_page_reader))
    }
  }
}

/// Narrows a `ColumnReader` to its concrete `ColumnReaderImpl<T>`. The
/// caller must know `T` matches the variant actually held (typically
/// because it just built the reader from a `ColumnDescPtr` of known
/// physical type); a mismatch is undefined behavior.
pub fn get_typed_column_reader<'a, T: DataType>(col_reader: ColumnReader<'a>) -> ColumnReaderImpl<'a, T> {
  match col_reader {
    ColumnReader::BoolColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::Int32ColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::Int64ColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::Int96ColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::FloatColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::DoubleColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::ByteArrayColumnReader(r) => unsafe { mem::transmute(r) },
    ColumnReader::FixedLenByteArrayColumnReader(r) => unsafe { mem::transmute(r) }
  }
}

/// A value reader for a particular primitive column. Pulls pages from
/// `page_reader` lazily, one at a time, as `read_batch` drains the
/// previous page's buffered values.
pub struct ColumnReaderImpl<'a, T: DataType> {
  descr: ColumnDescPtr,
  def_level_decoder: Option<LevelDecoder>,
  rep_level_decoder: Option<LevelDecoder>,
  page_reader: Box<dyn PageReader + 'a>,
  current_encoding: Option<Encoding>,

  // Total number of values in the current data page.
  num_buffered_values: u32,

  // Number of values from the current data page decoded so far.
  num_decoded_values: u32,

  // One decoder per encoding seen so far, reused across pages.
  decoders: HashMap<Encoding, Box<dyn Decoder<T>>>
}

impl<'a, T: DataType> ColumnReaderImpl<'a, T>
where
  T: 'static
{
  pub fn new(descr: ColumnDescPtr, page_reader: Box<dyn PageReader + 'a>) -> Self {
    Self {
      descr,
      def_level_decoder: None,
      rep_level_decoder: None,
      page_reader,
      current_encoding: None,
      num_buffered_values: 0,
      num_decoded_values: 0,
      decoders: HashMap::new()
    }
  }

  /// Reads at most `batch_size` values into `values`, filling `def_levels`
  /// and `rep_levels` alongside it when the column carries them (pass
  /// `None` for a required, non-repeated column to skip the allocation).
  /// Returns `(values_read, levels_read)`; `values_read <= levels_read`
  /// whenever the column is optional, since a null contributes a level
  /// but no value.
  pub fn read_batch(
    &mut self,
    batch_size: usize,
    mut def_levels: Option<&mut [i16]>,
    mut rep_levels: Option<&mut [i16]>,
    values: &mut [T::T]
  ) -> Result<(usize, usize)> {
    let mut values_read = 0;
    let mut levels_read = 0;

    while values_read < batch_size {
      if !self.has_next()? {
        break;
      }

      let mut values_to_read = 0;
      let mut num_def_levels = 0;
      let num_rep_levels;

      let next_levels_read =
        levels_read + std::cmp::min(batch_size, (self.num_buffered_values - self.num_decoded_values) as usize);

      if self.descr.max_def_level() > 0 && def_levels.as_ref().is_some() {
        if let Some(ref mut levels) = def_levels {
          num_def_levels = self.read_def_levels(&mut levels[levels_read..next_levels_read])?;
          for i in levels_read..levels_read + num_def_levels {
            if levels[i] == self.descr.max_def_level() {
              values_to_read += 1;
            }
          }
        }
      } else {
        values_to_read = batch_size;
      }

      if self.descr.max_rep_level() > 0 && rep_levels.is_some() {
        if let Some(ref mut levels) = rep_levels {
          num_rep_levels = self.read_rep_levels(&mut levels[levels_read..next_levels_read])?;
          if num_def_levels != num_rep_levels {
            return Err(malformed_err!(
              "decoded {} definition levels but {} repetition levels",
              num_def_levels,
              num_rep_levels
            ));
          }
          levels_read += num_rep_levels;
        }
      } else if num_def_levels > 0 {
        // No repetition levels on this column: the definition-level count
        // decoded this iteration is the row count, since every row
        // contributes exactly one definition level.
        levels_read += num_def_levels;
      }

      let curr_values_read = self.read_values(&mut values[values_read..values_read + values_to_read])?;
      self.num_decoded_values += std::cmp::max(num_def_levels, curr_values_read) as u32;
      values_read += curr_values_read;
    }

    Ok((values_read, levels_read))
  }

  #[inline]
  fn has_next(&mut self) -> Result<bool> {
    if self.num_buffered_values == 0 || self.num_buffered_values == self.num_decoded_values {
      if !self.advance_page()? {
        Ok(false)
      } else {
        Ok(self.num_buffered_values != 0)
      }
    } else {
      Ok(true)
    }
  }

  /// Reads a new page and sets up the level/value decoders for it,
  /// configuring a dictionary along the way if one precedes the data
  /// page. Returns `false` once the column chunk is exhausted.
  fn advance_page(&mut self) -> Result<bool> {
    loop {
      match self.page_reader.get_next_page()? {
        None => return Ok(false),
        Some(page @ Page::DictionaryPage { .. }) => {
          self.configure_dictionary(page)?;
          continue;
        },
        Some(Page::DataPage { buf, num_values, mut encoding, def_level_encoding, rep_level_encoding }) => {
          self.num_buffered_values = num_values;
          self.num_decoded_values = 0;

          let mut buffer_ptr = buf;

          if self.descr.max_rep_level() > 0 {
            let mut rep_decoder = LevelDecoder::new(rep_level_encoding, self.descr.max_rep_level());
            let total_bytes = rep_decoder.set_data(buffer_ptr.all())?;
            buffer_ptr = buffer_ptr.start_from(total_bytes);
            self.rep_level_decoder = Some(rep_decoder);
          }

          if self.descr.max_def_level() > 0 {
            let mut def_decoder = LevelDecoder::new(def_level_encoding, self.descr.max_def_level());
            let total_bytes = def_decoder.set_data(buffer_ptr.all())?;
            buffer_ptr = buffer_ptr.start_from(total_bytes);
            self.def_level_decoder = Some(def_decoder);
          }

          if encoding == Encoding::PLAIN_DICTIONARY {
            encoding = Encoding::RLE_DICTIONARY;
          }

          self.prepare_value_decoder(encoding)?;
          let num_values = self.num_buffered_values;
          self.decoders.get_mut(&encoding).unwrap().set_data(buffer_ptr, num_values as usize)?;
          self.current_encoding = Some(encoding);

          return Ok(true);
        },
        Some(Page::DataPageV2 {
          buf,
          num_values,
          encoding,
          def_levels_byte_len,
          rep_levels_byte_len,
          ..
        }) => {
          self.num_buffered_values = num_values;
          self.num_decoded_values = 0;

          let mut buffer_ptr = buf;

          // v2 level streams are framed by their declared byte length, not
          // a length prefix of their own (spec.md §4.F).
          if self.descr.max_rep_level() > 0 {
            let mut rep_decoder = LevelDecoder::new(Encoding::RLE, self.descr.max_rep_level());
            rep_decoder.set_data_range(buffer_ptr.all(), rep_levels_byte_len as usize)?;
            buffer_ptr = buffer_ptr.start_from(rep_levels_byte_len as usize);
            self.rep_level_decoder = Some(rep_decoder);
          } else {
            buffer_ptr = buffer_ptr.start_from(rep_levels_byte_len as usize);
          }

          if self.descr.max_def_level() > 0 {
            let mut def_decoder = LevelDecoder::new(Encoding::RLE, self.descr.max_def_level());
            def_decoder.set_data_range(buffer_ptr.all(), def_levels_byte_len as usize)?;
            buffer_ptr = buffer_ptr.start_from(def_levels_byte_len as usize);
            self.def_level_decoder = Some(def_decoder);
          } else {
            buffer_ptr = buffer_ptr.start_from(def_levels_byte_len as usize);
          }

          let encoding = if encoding == Encoding::PLAIN_DICTIONARY { Encoding::RLE_DICTIONARY } else { encoding };
          self.prepare_value_decoder(encoding)?;
          let num_values = self.num_buffered_values;
          self.decoders.get_mut(&encoding).unwrap().set_data(buffer_ptr, num_values as usize)?;
          self.current_encoding = Some(encoding);

          return Ok(true);
        }
      }
    }
  }

  /// Ensures `self.decoders` has an entry for `encoding`, building one if
  /// this is the first page to use it. `RLE_DICTIONARY` must already have
  /// been installed by [`Self::configure_dictionary`]; every other
  /// encoding is built on demand via [`get_decoder`].
  fn prepare_value_decoder(&mut self, encoding: Encoding) -> Result<()> {
    if encoding == Encoding::RLE_DICTIONARY {
      if !self.decoders.contains_key(&encoding) {
        return Err(malformed_err!("RLE_DICTIONARY data page with no preceding dictionary page"));
      }
      return Ok(());
    }
    if !self.decoders.contains_key(&encoding) {
      let data_decoder = get_decoder::<T>(self.descr.clone(), encoding)?;
      self.decoders.insert(encoding, data_decoder);
    }
    Ok(())
  }

  #[inline]
  fn read_rep_levels(&mut self, buffer: &mut [i16]) -> Result<usize> {
    let level_decoder = self.rep_level_decoder.as_mut().expect("rep_level_decoder must be set");
    level_decoder.get(buffer)
  }

  #[inline]
  fn read_def_levels(&mut self, buffer: &mut [i16]) -> Result<usize> {
    let level_decoder = self.def_level_decoder.as_mut().expect("def_level_decoder must be set");
    level_decoder.get(buffer)
  }

  #[inline]
  fn read_values(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let encoding = self.current_encoding.expect("current_encoding must be set");
    let current_decoder = self.decoders.get_mut(&encoding).expect("decoder for current_encoding must be set");
    current_decoder.get(buffer)
  }

  #[inline]
  fn configure_dictionary(&mut self, page: Page) -> Result<()> {
    let mut encoding = page.encoding();
    if encoding == Encoding::PLAIN || encoding == Encoding::PLAIN_DICTIONARY {
      encoding = Encoding::RLE_DICTIONARY;
    }

    if self.decoders.contains_key(&encoding) {
      return Err(general_err!("a column chunk cannot have more than one dictionary page"));
    }

    if encoding != Encoding::RLE_DICTIONARY {
      return Err(nyi_err!("unsupported dictionary page encoding {}", encoding));
    }

    let mut dictionary = PlainDecoder::<T>::new(self.descr.type_length());
    let num_values = page.num_values();
    dictionary.set_data(page.buffer().clone(), num_values as usize)?;

    let mut decoder = DictDecoder::new();
    decoder.set_dict(Box::new(dictionary))?;
    self.decoders.insert(encoding, Box::new(decoder));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::Arc;
  use std::vec::IntoIter;

  use crate::basic::Type as PhysicalType;
  use crate::encodings::encoding::{get_encoder, DictEncoder, Encoder};
  use crate::encodings::levels::LevelEncoder;
  use crate::schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
  use crate::util::memory::ByteBufferPtr;
  use crate::util::test_common::{random_levels, random_numbers_range};

  const NUM_LEVELS: usize = 128;
  const NUM_PAGES: usize = 2;
  const MAX_DEF_LEVEL: i16 = 5;
  const MAX_REP_LEVEL: i16 = 5;

  fn get_test_int32_type() -> SchemaType {
    SchemaType::new_primitive("a", Repetition::REQUIRED, PhysicalType::INT32, None, None, 0, 0, 0)
      .expect("new_primitive should be OK")
  }

  fn get_test_int64_type() -> SchemaType {
    SchemaType::new_primitive("a", Repetition::REQUIRED, PhysicalType::INT64, None, None, 0, 0, 0)
      .expect("new_primitive should be OK")
  }

  #[test]
  fn test_read_plain_int32() {
    let mut tester = ColumnReaderTester::<Int32Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int32_type()), MAX_DEF_LEVEL, MAX_REP_LEVEL, ColumnPath::new(vec![]));
    tester.test_plain(Arc::new(descr), NUM_PAGES, NUM_LEVELS, 16, i32::min_value(), i32::max_value());
  }

  #[test]
  fn test_read_plain_int32_uneven_batch() {
    let mut tester = ColumnReaderTester::<Int32Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int32_type()), MAX_DEF_LEVEL, MAX_REP_LEVEL, ColumnPath::new(vec![]));
    tester.test_plain(Arc::new(descr), NUM_PAGES, NUM_LEVELS, 17, i32::min_value(), i32::max_value());
  }

  #[test]
  fn test_read_plain_int32_required_non_repeated() {
    let mut tester = ColumnReaderTester::<Int32Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int32_type()), 0, 0, ColumnPath::new(vec![]));
    tester.test_plain(Arc::new(descr), NUM_PAGES, NUM_LEVELS, 16, i32::min_value(), i32::max_value());
  }

  #[test]
  fn test_read_plain_int64() {
    let mut tester = ColumnReaderTester::<Int64Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int64_type()), 1, 1, ColumnPath::new(vec![]));
    tester.test_plain(Arc::new(descr), NUM_PAGES, NUM_LEVELS, 16, i64::min_value(), i64::max_value());
  }

  #[test]
  fn test_read_dict_int32_small() {
    let mut tester = ColumnReaderTester::<Int32Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int32_type()), MAX_DEF_LEVEL, MAX_REP_LEVEL, ColumnPath::new(vec![]));
    tester.test_dict(Arc::new(descr), 2, 2, 16, 0, 3);
  }

  #[test]
  fn test_read_dict_int32_multi_page() {
    let mut tester = ColumnReaderTester::<Int32Type>::new();
    let descr = ColumnDescriptor::new(Arc::new(get_test_int32_type()), MAX_DEF_LEVEL, MAX_REP_LEVEL, ColumnPath::new(vec![]));
    tester.test_dict(Arc::new(descr), NUM_PAGES, NUM_LEVELS, 512, 0, 3);
  }

  struct ColumnReaderTester<T: DataType>
  where
    T: 'static
  {
    rep_levels: Vec<i16>,
    def_levels: Vec<i16>,
    values: Vec<T::T>
  }

  impl<T: DataType> ColumnReaderTester<T>
  where
    T: 'static
  {
    pub fn new() -> Self {
      Self { rep_levels: Vec::new(), def_levels: Vec::new(), values: Vec::new() }
    }

    pub fn test_plain(
      &mut self,
      desc: ColumnDescPtr,
      num_pages: usize,
      num_levels: usize,
      batch_size: usize,
      min: T::T,
      max: T::T
    ) where
      T::T: PartialOrd + Copy + rand::distributions::uniform::SampleUniform
    {
      let mut pages = VecDeque::new();
      make_pages::<T>(
        desc.clone(),
        Encoding::PLAIN,
        num_pages,
        num_levels,
        min,
        max,
        &mut self.def_levels,
        &mut self.rep_levels,
        &mut self.values,
        &mut pages
      );
      self.drive(desc, num_pages, num_levels, batch_size, pages);
    }

    pub fn test_dict(
      &mut self,
      desc: ColumnDescPtr,
      num_pages: usize,
      num_levels: usize,
      batch_size: usize,
      min: T::T,
      max: T::T
    ) where
      T::T: PartialOrd + Copy + rand::distributions::uniform::SampleUniform
    {
      let mut pages = VecDeque::new();
      make_pages::<T>(
        desc.clone(),
        Encoding::RLE_DICTIONARY,
        num_pages,
        num_levels,
        min,
        max,
        &mut self.def_levels,
        &mut self.rep_levels,
        &mut self.values,
        &mut pages
      );
      self.drive(desc, num_pages, num_levels, batch_size, pages);
    }

    fn drive(&self, desc: ColumnDescPtr, num_pages: usize, num_levels: usize, batch_size: usize, pages: VecDeque<Page>) {
      let page_reader = TestPageReader::new(Vec::from(pages));
      let column_reader: ColumnReader = get_column_reader(desc, Box::new(page_reader));
      let mut typed_column_reader = get_typed_column_reader::<T>(column_reader);
      let mut actual_rep_levels = vec![0; num_levels * num_pages];
      let mut actual_def_levels = vec![0; num_levels * num_pages];
      let mut actual_values = vec![T::T::default(); num_levels * num_pages];

      let mut curr_values_read = 0;
      let mut curr_levels_read = 0;
      loop {
        let (values_read, levels_read) = typed_column_reader
          .read_batch(
            batch_size,
            Some(&mut actual_def_levels[curr_levels_read..]),
            Some(&mut actual_rep_levels[curr_levels_read..]),
            &mut actual_values[curr_values_read..]
          )
          .expect("read_batch() should be OK");

        curr_values_read += values_read;
        curr_levels_read += levels_read;
        if values_read == 0 {
          break;
        }
      }

      assert_eq!(&actual_rep_levels[..curr_levels_read], &self.rep_levels[..]);
      assert_eq!(&actual_def_levels[..curr_levels_read], &self.def_levels[..]);
      assert_eq!(&actual_values[..curr_values_read], &self.values[..]);
    }
  }

  struct TestPageReader {
    pages: IntoIter<Page>
  }

  impl TestPageReader {
    pub fn new(pages: Vec<Page>) -> Self {
      Self { pages: pages.into_iter() }
    }
  }

  impl PageReader for TestPageReader {
    fn get_next_page(&mut self) -> Result<Option<Page>> {
      Ok(self.pages.next())
    }
  }

  fn random_values<T>(n: usize, min: T, max: T) -> Vec<T>
  where
    T: PartialOrd + rand::distributions::uniform::SampleUniform + Copy
  {
    let mut out = Vec::with_capacity(n);
    random_numbers_range(n, min, max, &mut out);
    out
  }

  fn add_levels(buffer: &mut Vec<u8>, max_level: i16, levels: &[i16]) {
    let max_buffer_size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
    let mut level_encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; max_buffer_size]);
    level_encoder.put(levels).expect("put() should be OK");
    let encoded_levels = level_encoder.consume().expect("consume() should be OK");
    buffer.extend_from_slice(encoded_levels.as_ref());
  }

  fn make_pages<T: DataType>(
    desc: ColumnDescPtr,
    encoding: Encoding,
    num_pages: usize,
    levels_per_page: usize,
    min: T::T,
    max: T::T,
    def_levels: &mut Vec<i16>,
    rep_levels: &mut Vec<i16>,
    values: &mut Vec<T::T>,
    pages: &mut VecDeque<Page>
  ) where
    T::T: PartialOrd + Copy + rand::distributions::uniform::SampleUniform,
    T: 'static
  {
    let max_def_level = desc.max_def_level();
    let max_rep_level = desc.max_rep_level();
    let mut num_values = 0;

    let mut dict_encoder = DictEncoder::<T>::new();

    for i in 0..num_pages {
      let mut num_values_cur_page = 0;
      let level_range = i * levels_per_page..(i + 1) * levels_per_page;

      if max_def_level > 0 {
        let page_def_levels = random_levels(levels_per_page, max_def_level);
        for &dl in &page_def_levels {
          if dl == max_def_level {
            num_values_cur_page += 1;
          }
        }
        def_levels.extend(page_def_levels);
      } else {
        num_values_cur_page = levels_per_page;
      }
      if max_rep_level > 0 {
        rep_levels.extend(random_levels(levels_per_page, max_rep_level));
      }
      values.extend(random_values::<T::T>(num_values_cur_page, min, max));

      let mut buffer = Vec::new();
      if max_rep_level > 0 {
        add_levels(&mut buffer, max_rep_level, &rep_levels[level_range.clone()]);
      }
      if max_def_level > 0 {
        add_levels(&mut buffer, max_def_level, &def_levels[level_range]);
      }

      let value_range = num_values..num_values + num_values_cur_page;
      let page_encoding = match encoding {
        Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
          dict_encoder.put(&values[value_range]).expect("put() should be OK");
          let indices = dict_encoder.flush_buffer().expect("flush_buffer() should be OK");
          buffer.extend_from_slice(indices.as_ref());
          Encoding::RLE_DICTIONARY
        },
        Encoding::PLAIN => {
          let mut encoder: Box<dyn Encoder<T>> = get_encoder::<T>(encoding).expect("get_encoder() should be OK");
          encoder.put(&values[value_range]).expect("put() should be OK");
          let encoded_values = encoder.flush_buffer().expect("flush_buffer() should be OK");
          buffer.extend_from_slice(encoded_values.as_ref());
          Encoding::PLAIN
        },
        other => panic!("unexpected encoding {}", other)
      };

      pages.push_back(Page::DataPage {
        buf: ByteBufferPtr::new(buffer),
        num_values: levels_per_page as u32,
        encoding: page_encoding,
        def_level_encoding: Encoding::RLE,
        rep_level_encoding: Encoding::RLE
      });
      num_values += num_values_cur_page;
    }

    if encoding == Encoding::RLE_DICTIONARY || encoding == Encoding::PLAIN_DICTIONARY {
      let dict = dict_encoder.write_dict().expect("write_dict() should be OK");
      pages.push_front(Page::DictionaryPage {
        buf: dict,
        num_values: dict_encoder.num_entries() as u32,
        encoding: Encoding::RLE_DICTIONARY,
        is_sorted: false
      });
    }
  }
}
