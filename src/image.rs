/*!
  The executable image format.

  An image is a 20-byte little-endian header followed by the text bytes and
  then the data bytes:

  ```text
  magic      u32   0xC9F7A115
  text_size  u32   bytes of text
  data_size  u32   bytes of initialized data
  text_base  u32   load address of the text segment
  data_base  u32   load address of the data segment
  ```
*/

use std::fs;
use std::path::Path;

use crate::errors::VmError;
use crate::{Addr, BINARY_MAGIC};

pub const HEADER_SIZE: usize = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BinaryHeader {
  pub magic: u32,
  pub text_size: Addr,
  pub data_size: Addr,
  pub text_base: Addr,
  pub data_base: Addr,
}

impl BinaryHeader {
  pub fn encode(&self) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    for (slot, field) in bytes.chunks_exact_mut(4).zip([
      self.magic,
      self.text_size,
      self.data_size,
      self.text_base,
      self.data_base,
    ]) {
      slot.copy_from_slice(&field.to_le_bytes());
    }
    bytes
  }

  pub fn decode(bytes: &[u8]) -> Result<BinaryHeader, VmError> {
    if bytes.len() < HEADER_SIZE {
      return Err(VmError::BadExecFormat);
    }
    let field = |index: usize| {
      let mut word = [0u8; 4];
      word.copy_from_slice(&bytes[index * 4..index * 4 + 4]);
      u32::from_le_bytes(word)
    };
    let header = BinaryHeader {
      magic: field(0),
      text_size: field(1),
      data_size: field(2),
      text_base: field(3),
      data_base: field(4),
    };
    if header.magic != BINARY_MAGIC {
      return Err(VmError::BadExecFormat);
    }
    Ok(header)
  }
}

/// A decoded image: the two segments plus their load addresses.
pub struct Image {
  pub text_base: Addr,
  pub data_base: Addr,
  pub text: Vec<u8>,
  pub data: Vec<u8>,
}

impl Image {
  pub fn header(&self) -> BinaryHeader {
    BinaryHeader {
      magic: BINARY_MAGIC,
      text_size: self.text.len() as Addr,
      data_size: self.data.len() as Addr,
      text_base: self.text_base,
      data_base: self.data_base,
    }
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + self.text.len() + self.data.len());
    bytes.extend_from_slice(&self.header().encode());
    bytes.extend_from_slice(&self.text);
    bytes.extend_from_slice(&self.data);
    bytes
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Image, VmError> {
    let header = BinaryHeader::decode(bytes)?;
    let text_end = HEADER_SIZE + header.text_size as usize;
    let data_end = text_end + header.data_size as usize;
    if bytes.len() < data_end {
      return Err(VmError::BadExecFormat);
    }
    Ok(Image {
      text_base: header.text_base,
      data_base: header.data_base,
      text: bytes[HEADER_SIZE..text_end].to_vec(),
      data: bytes[text_end..data_end].to_vec(),
    })
  }

  pub fn read_file(path: &Path) -> Result<Image, VmError> {
    let bytes = fs::read(path)?;
    Image::from_bytes(&bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{DATA_SEGMENT, TEXT_SEGMENT};

  #[test]
  fn header_round_trip() {
    let image = Image {
      text_base: TEXT_SEGMENT,
      data_base: DATA_SEGMENT,
      text: vec![1, 2, 3],
      data: vec![9],
    };
    let bytes = image.to_bytes();
    assert_eq!(bytes.len(), HEADER_SIZE + 4);
    let decoded = Image::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.text, vec![1, 2, 3]);
    assert_eq!(decoded.data, vec![9]);
    assert_eq!(decoded.text_base, TEXT_SEGMENT);
    assert_eq!(decoded.data_base, DATA_SEGMENT);
  }

  #[test]
  fn magic_mismatch_is_rejected() {
    let image = Image {
      text_base: TEXT_SEGMENT,
      data_base: DATA_SEGMENT,
      text: vec![],
      data: vec![],
    };
    let mut bytes = image.to_bytes();
    bytes[0] ^= 0xFF;
    assert!(matches!(
      Image::from_bytes(&bytes),
      Err(VmError::BadExecFormat)
    ));
  }

  #[test]
  fn truncated_image_is_rejected() {
    let image = Image {
      text_base: TEXT_SEGMENT,
      data_base: DATA_SEGMENT,
      text: vec![1, 2, 3, 4],
      data: vec![],
    };
    let bytes = image.to_bytes();
    assert!(matches!(
      Image::from_bytes(&bytes[..bytes.len() - 1]),
      Err(VmError::BadExecFormat)
    ));
    assert!(matches!(
      Image::from_bytes(&bytes[..10]),
      Err(VmError::BadExecFormat)
    ));
  }
}
