//! GIPL (Guy's Image Processing Lab) volumes.
//!
//! A GIPL file is a fixed 256-byte big-endian header followed by the voxels,
//! first axis fastest. Volumes are always written back as `float` voxels;
//! dimensions, type and min/max are refreshed from the array and every other
//! header field is kept.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{ArrayD, ArrayViewD, IxDyn, ShapeBuilder};

use super::sample::{self, Endian, SampleType};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::intensity::IntensityRange;

const FORMAT: &str = "GIPL";

pub const HEADER_SIZE: usize = 256;
pub const MAGIC: u32 = 0xEFFF_E9B0;
pub const MAGIC_ALT: u32 = 0x2AE3_89B8;
const DESCRIPTION_LEN: usize = 80;

pub const TYPE_BINARY: u16 = 1;
pub const TYPE_CHAR: u16 = 7;
pub const TYPE_U_CHAR: u16 = 8;
pub const TYPE_SHORT: u16 = 15;
pub const TYPE_U_SHORT: u16 = 16;
pub const TYPE_U_INT: u16 = 31;
pub const TYPE_INT: u16 = 32;
pub const TYPE_FLOAT: u16 = 64;
pub const TYPE_DOUBLE: u16 = 65;

/// Decoded GIPL header.
#[derive(Debug, Clone, PartialEq)]
pub struct GiplHeader {
    pub dims: [u16; 4],
    pub image_type: u16,
    pub pixdim: [f32; 4],
    pub description: [u8; DESCRIPTION_LEN],
    pub matrix: [f32; 20],
    pub flag1: u8,
    pub flag2: u8,
    pub min: f64,
    pub max: f64,
    pub origin: [f64; 4],
    pub pixval_offset: f32,
    pub pixval_cal: f32,
    pub interslice_gap: f32,
    pub user_def2: f32,
    pub magic: u32,
}

impl Default for GiplHeader {
    fn default() -> Self {
        Self {
            dims: [1; 4],
            image_type: TYPE_FLOAT,
            pixdim: [1.0, 1.0, 1.0, 0.0],
            description: [0; DESCRIPTION_LEN],
            matrix: [0.0; 20],
            flag1: 0,
            flag2: 0,
            min: 0.0,
            max: 0.0,
            origin: [0.0; 4],
            pixval_offset: 0.0,
            pixval_cal: 0.0,
            interslice_gap: 0.0,
            user_def2: 0.0,
            magic: MAGIC,
        }
    }
}

impl GiplHeader {
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = GiplHeader::default();
        reader.read_u16_into::<BigEndian>(&mut header.dims)?;
        header.image_type = reader.read_u16::<BigEndian>()?;
        reader.read_f32_into::<BigEndian>(&mut header.pixdim)?;
        reader.read_exact(&mut header.description)?;
        reader.read_f32_into::<BigEndian>(&mut header.matrix)?;
        header.flag1 = reader.read_u8()?;
        header.flag2 = reader.read_u8()?;
        header.min = reader.read_f64::<BigEndian>()?;
        header.max = reader.read_f64::<BigEndian>()?;
        reader.read_f64_into::<BigEndian>(&mut header.origin)?;
        header.pixval_offset = reader.read_f32::<BigEndian>()?;
        header.pixval_cal = reader.read_f32::<BigEndian>()?;
        header.interslice_gap = reader.read_f32::<BigEndian>()?;
        header.user_def2 = reader.read_f32::<BigEndian>()?;
        header.magic = reader.read_u32::<BigEndian>()?;

        if header.magic != MAGIC && header.magic != MAGIC_ALT {
            return Err(Error::invalid_header(
                FORMAT,
                format!("bad magic number 0x{:08X}", header.magic),
            ));
        }
        Ok(header)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for dim in self.dims {
            writer.write_u16::<BigEndian>(dim)?;
        }
        writer.write_u16::<BigEndian>(self.image_type)?;
        for value in self.pixdim {
            writer.write_f32::<BigEndian>(value)?;
        }
        writer.write_all(&self.description)?;
        for value in self.matrix {
            writer.write_f32::<BigEndian>(value)?;
        }
        writer.write_u8(self.flag1)?;
        writer.write_u8(self.flag2)?;
        writer.write_f64::<BigEndian>(self.min)?;
        writer.write_f64::<BigEndian>(self.max)?;
        for value in self.origin {
            writer.write_f64::<BigEndian>(value)?;
        }
        writer.write_f32::<BigEndian>(self.pixval_offset)?;
        writer.write_f32::<BigEndian>(self.pixval_cal)?;
        writer.write_f32::<BigEndian>(self.interslice_gap)?;
        writer.write_f32::<BigEndian>(self.user_def2)?;
        writer.write_u32::<BigEndian>(MAGIC)?;
        Ok(())
    }

    /// Array shape described by `dims`, without trailing singleton axes
    /// beyond the second.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape: Vec<usize> = self.dims.iter().map(|&d| usize::from(d.max(1))).collect();
        while shape.len() > 2 && shape.last() == Some(&1) {
            shape.pop();
        }
        shape
    }

    fn sample_type(&self) -> Result<SampleType> {
        Ok(match self.image_type {
            TYPE_BINARY | TYPE_U_CHAR => SampleType::U8,
            TYPE_CHAR => SampleType::I8,
            TYPE_SHORT => SampleType::I16,
            TYPE_U_SHORT => SampleType::U16,
            TYPE_INT => SampleType::I32,
            TYPE_U_INT => SampleType::U32,
            TYPE_FLOAT => SampleType::F32,
            TYPE_DOUBLE => SampleType::F64,
            other => {
                return Err(Error::invalid_header(
                    FORMAT,
                    format!("unsupported image type {other}"),
                ));
            }
        })
    }
}

pub(crate) fn read(path: &Path) -> Result<(ArrayD<f32>, Header)> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = GiplHeader::parse(&mut reader)?;
    let shape = header.shape();
    let count: usize = shape.iter().product();

    let sample_type = header.sample_type()?;
    let mut bytes = Vec::with_capacity(count * sample_type.size());
    reader.read_to_end(&mut bytes)?;
    let values = sample::decode(&bytes, sample_type, Endian::Big, count, FORMAT)?;

    let data = ArrayD::from_shape_vec(IxDyn(&shape).f(), values)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
    Ok((data, Header::Gipl(Box::new(header))))
}

pub(crate) fn write(path: &Path, data: &ArrayViewD<f32>, header: &Header) -> Result<()> {
    if data.ndim() > 4 {
        return Err(Error::ShapeMismatch(format!(
            "GIPL holds at most 4 dimensions, got {}",
            data.ndim()
        )));
    }

    let mut gipl = match header {
        Header::Gipl(gipl) => (**gipl).clone(),
        _ => GiplHeader::default(),
    };
    gipl.dims = [1; 4];
    for (slot, &len) in gipl.dims.iter_mut().zip(data.shape()) {
        *slot = u16::try_from(len).map_err(|_| {
            Error::ShapeMismatch(format!("axis length {len} does not fit a GIPL header"))
        })?;
    }
    gipl.image_type = TYPE_FLOAT;
    let range = IntensityRange::of(data).unwrap_or(IntensityRange::new(0.0, 0.0));
    gipl.min = f64::from(range.min);
    gipl.max = f64::from(range.max);

    let mut writer = BufWriter::new(File::create(path)?);
    gipl.write_to(&mut writer)?;
    // reversed axes iterate the first axis fastest
    for &value in data.t().iter() {
        writer.write_f32::<BigEndian>(value)?;
    }
    writer.flush()?;
    Ok(())
}
