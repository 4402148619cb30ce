use nifti::NiftiHeader;

use crate::enums::FormatKind;
use crate::format::gipl::GiplHeader;
use crate::format::nrrd::NrrdHeader;

/// Format-specific metadata carried alongside voxel data.
///
/// Only the format adapter looks inside a header. Everything else threads it
/// through unchanged so that a volume written back keeps its geometry.
#[derive(Debug, Clone, Default)]
pub enum Header {
    Nifti(Box<NiftiHeader>),
    Gipl(Box<GiplHeader>),
    Nrrd(NrrdHeader),
    /// 2D formats and freshly built arrays carry no metadata
    #[default]
    None,
}

impl Header {
    /// Format the header was read from, if any
    pub fn kind(&self) -> Option<FormatKind> {
        match self {
            Header::Nifti(_) => Some(FormatKind::Nifti),
            Header::Gipl(_) => Some(FormatKind::Gipl),
            Header::Nrrd(_) => Some(FormatKind::Nrrd),
            Header::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Header::None)
    }
}
