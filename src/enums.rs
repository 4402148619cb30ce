use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Nifti,
    Gipl,
    Nrrd,
    Png,
}

impl FormatKind {
    /// Suffix of the base format, including the leading dot
    pub const fn suffix(&self) -> &'static str {
        match self {
            FormatKind::Nifti => ".nii",
            FormatKind::Gipl => ".gipl",
            FormatKind::Nrrd => ".nrrd",
            FormatKind::Png => ".png",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            FormatKind::Nifti => "NIfTI",
            FormatKind::Gipl => "GIPL",
            FormatKind::Nrrd => "NRRD",
            FormatKind::Png => "PNG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceRole {
    #[default]
    Image,
    Label,
}
