//! NRRD (Nearly Raw Raster Data) volumes with attached data.
//!
//! Reads `raw`, `gzip` and `ascii` encodings in either byte order. Writes
//! little-endian raw `float` data. Fields describing the stored samples
//! (`type`, `dimension`, `sizes`, `encoding`, `endian`) are regenerated on
//! write; every other field and key/value pair is preserved in order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::read::MultiGzDecoder;
use ndarray::{ArrayD, ArrayViewD, IxDyn, ShapeBuilder};

use super::sample::{self, Endian, SampleType};
use crate::error::{Error, Result};
use crate::header::Header;

const FORMAT: &str = "NRRD";
const DEFAULT_MAGIC: &str = "NRRD0004";

/// Fields regenerated from the array on every write.
const GENERATED_FIELDS: [&str; 8] = [
    "type",
    "dimension",
    "sizes",
    "encoding",
    "endian",
    "data file",
    "byte skip",
    "line skip",
];

/// Parsed NRRD header: magic line, `field: value` pairs and `key:=value`
/// pairs, each in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NrrdHeader {
    pub magic: String,
    pub fields: Vec<(String, String)>,
    pub key_values: Vec<(String, String)>,
}

impl Default for NrrdHeader {
    fn default() -> Self {
        Self {
            magic: DEFAULT_MAGIC.to_string(),
            fields: Vec::new(),
            key_values: Vec::new(),
        }
    }
}

impl NrrdHeader {
    /// Value of a field, matched case-insensitively
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.key_values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    /// Read header lines up to the blank separator line.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let magic = line.trim_end().to_string();
        if !magic.starts_with("NRRD") {
            return Err(Error::invalid_header(FORMAT, "missing NRRD magic line"));
        }

        let mut header = NrrdHeader {
            magic,
            ..NrrdHeader::default()
        };
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let entry = line.trim_end_matches(['\n', '\r']);
            if entry.is_empty() {
                break;
            }
            if entry.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = entry.split_once(":=") {
                header.key_values.push((key.to_string(), value.to_string()));
            } else if let Some((field, value)) = entry.split_once(": ") {
                header
                    .fields
                    .push((field.trim().to_string(), value.trim().to_string()));
            } else {
                return Err(Error::invalid_header(
                    FORMAT,
                    format!("unrecognized header line {entry:?}"),
                ));
            }
        }
        Ok(header)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, shape: &[usize]) -> Result<()> {
        let sizes: Vec<String> = shape.iter().map(usize::to_string).collect();
        writeln!(writer, "{}", self.magic)?;
        writeln!(writer, "type: float")?;
        writeln!(writer, "dimension: {}", shape.len())?;
        writeln!(writer, "sizes: {}", sizes.join(" "))?;
        for (field, value) in &self.fields {
            let generated = GENERATED_FIELDS
                .iter()
                .any(|name| field.eq_ignore_ascii_case(name));
            if !generated {
                writeln!(writer, "{field}: {value}")?;
            }
        }
        writeln!(writer, "encoding: raw")?;
        writeln!(writer, "endian: little")?;
        for (key, value) in &self.key_values {
            writeln!(writer, "{key}:={value}")?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn shape(&self) -> Result<Vec<usize>> {
        let dimension: usize = self.required("dimension")?.parse().map_err(|_| {
            Error::invalid_header(FORMAT, "dimension is not an integer")
        })?;
        let sizes = self
            .required("sizes")?
            .split_ascii_whitespace()
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|_| Error::invalid_header(FORMAT, format!("bad size {s:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        if sizes.len() != dimension {
            return Err(Error::invalid_header(
                FORMAT,
                format!("{} sizes for dimension {dimension}", sizes.len()),
            ));
        }
        Ok(sizes)
    }

    fn sample_type(&self) -> Result<SampleType> {
        let name = self.required("type")?.to_ascii_lowercase();
        Ok(match name.as_str() {
            "signed char" | "int8" | "int8_t" => SampleType::I8,
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => SampleType::U8,
            "short" | "short int" | "signed short" | "signed short int" | "int16"
            | "int16_t" => SampleType::I16,
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
                SampleType::U16
            }
            "int" | "signed int" | "int32" | "int32_t" => SampleType::I32,
            "uint" | "unsigned int" | "uint32" | "uint32_t" => SampleType::U32,
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" => SampleType::I64,
            "ulonglong" | "unsigned long long" | "unsigned long long int" | "uint64"
            | "uint64_t" => SampleType::U64,
            "float" => SampleType::F32,
            "double" => SampleType::F64,
            other => {
                return Err(Error::invalid_header(
                    FORMAT,
                    format!("unsupported type {other:?}"),
                ));
            }
        })
    }

    fn endian(&self) -> Result<Endian> {
        match self.field("endian").map(str::to_ascii_lowercase).as_deref() {
            None | Some("little") => Ok(Endian::Little),
            Some("big") => Ok(Endian::Big),
            Some(other) => Err(Error::invalid_header(
                FORMAT,
                format!("unknown endian {other:?}"),
            )),
        }
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.field(name)
            .ok_or_else(|| Error::invalid_header(FORMAT, format!("missing field {name:?}")))
    }
}

pub(crate) fn read(path: &Path) -> Result<(ArrayD<f32>, Header)> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = NrrdHeader::parse(&mut reader)?;

    if header.field("data file").is_some() {
        return Err(Error::invalid_header(FORMAT, "detached data files are not supported"));
    }
    for skip in ["byte skip", "line skip"] {
        if header.field(skip).is_some_and(|v| v != "0") {
            return Err(Error::invalid_header(FORMAT, format!("{skip} is not supported")));
        }
    }

    let shape = header.shape()?;
    let count: usize = shape.iter().product();
    let sample_type = header.sample_type()?;

    let encoding = header.required("encoding")?.to_ascii_lowercase();
    let values = match encoding.as_str() {
        "raw" => {
            let mut bytes = Vec::with_capacity(count * sample_type.size());
            reader.read_to_end(&mut bytes)?;
            sample::decode(&bytes, sample_type, header.endian()?, count, FORMAT)?
        }
        "gzip" | "gz" => {
            let mut bytes = Vec::with_capacity(count * sample_type.size());
            MultiGzDecoder::new(reader).read_to_end(&mut bytes)?;
            sample::decode(&bytes, sample_type, header.endian()?, count, FORMAT)?
        }
        "ascii" | "text" | "txt" => {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            sample::decode_ascii(&text, count, FORMAT)?
        }
        other => {
            return Err(Error::invalid_header(
                FORMAT,
                format!("unsupported encoding {other:?}"),
            ));
        }
    };

    // the first axis is the fastest one on disk
    let data = ArrayD::from_shape_vec(IxDyn(&shape).f(), values)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
    Ok((data, Header::Nrrd(header)))
}

pub(crate) fn write(path: &Path, data: &ArrayViewD<f32>, header: &Header) -> Result<()> {
    let nrrd = match header {
        Header::Nrrd(nrrd) => nrrd.clone(),
        _ => NrrdHeader::default(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    nrrd.write_to(&mut writer, data.shape())?;
    for &value in data.t().iter() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    writer.flush()?;
    Ok(())
}
