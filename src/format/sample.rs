use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Byte order of multi-byte samples on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

/// Numeric type of a stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl SampleType {
    pub(crate) const fn size(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 8,
        }
    }
}

/// Decode `count` samples from `bytes` into `f32`.
pub(crate) fn decode(
    bytes: &[u8],
    sample: SampleType,
    endian: Endian,
    count: usize,
    format: &'static str,
) -> Result<Vec<f32>> {
    let needed = count * sample.size();
    if bytes.len() < needed {
        return Err(Error::invalid_header(
            format,
            format!("expected {needed} bytes of voxel data, found {}", bytes.len()),
        ));
    }
    let bytes = &bytes[..needed];
    Ok(match endian {
        Endian::Little => decode_with::<LittleEndian>(bytes, sample),
        Endian::Big => decode_with::<BigEndian>(bytes, sample),
    })
}

fn decode_with<B: ByteOrder>(bytes: &[u8], sample: SampleType) -> Vec<f32> {
    let chunks = bytes.chunks_exact(sample.size());
    match sample {
        SampleType::U8 => bytes.iter().map(|&v| f32::from(v)).collect(),
        SampleType::I8 => bytes.iter().map(|&v| f32::from(v as i8)).collect(),
        SampleType::U16 => chunks.map(|c| f32::from(B::read_u16(c))).collect(),
        SampleType::I16 => chunks.map(|c| f32::from(B::read_i16(c))).collect(),
        SampleType::U32 => chunks.map(|c| B::read_u32(c) as f32).collect(),
        SampleType::I32 => chunks.map(|c| B::read_i32(c) as f32).collect(),
        SampleType::U64 => chunks.map(|c| B::read_u64(c) as f32).collect(),
        SampleType::I64 => chunks.map(|c| B::read_i64(c) as f32).collect(),
        SampleType::F32 => chunks.map(B::read_f32).collect(),
        SampleType::F64 => chunks.map(|c| B::read_f64(c) as f32).collect(),
    }
}

/// Parse whitespace separated ASCII samples.
pub(crate) fn decode_ascii(text: &str, count: usize, format: &'static str) -> Result<Vec<f32>> {
    let values = text
        .split_ascii_whitespace()
        .take(count)
        .map(|token| {
            token.parse::<f32>().map_err(|_| {
                Error::invalid_header(format, format!("invalid ASCII sample {token:?}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() < count {
        return Err(Error::invalid_header(
            format,
            format!("expected {count} ASCII samples, found {}", values.len()),
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_big_endian_i16() {
        let bytes = [0xFF, 0xFE, 0x01, 0x00];
        let values = decode(&bytes, SampleType::I16, Endian::Big, 2, "test").unwrap();
        assert_eq!(values, vec![-2.0, 256.0]);
    }

    #[test]
    fn test_decode_little_endian_f32() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5_f32.to_le_bytes());
        bytes.extend_from_slice(&(-4.0_f32).to_le_bytes());
        let values = decode(&bytes, SampleType::F32, Endian::Little, 2, "test").unwrap();
        assert_eq!(values, vec![1.5, -4.0]);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let result = decode(&[0u8; 3], SampleType::U16, Endian::Little, 2, "test");
        assert!(matches!(result, Err(Error::InvalidHeader { .. })));
    }

    #[test]
    fn test_decode_ascii() {
        let values = decode_ascii("1 2.5\n-3\t4", 4, "test").unwrap();
        assert_eq!(values, vec![1.0, 2.5, -3.0, 4.0]);
        assert!(decode_ascii("1 x", 2, "test").is_err());
    }
}
