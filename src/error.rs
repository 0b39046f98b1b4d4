use thiserror::Error;

/// Errors that can occur while building segment, envelope and patch data.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CurveError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("segment {index}: {source}")]
    Segment {
        index: usize,
        #[source]
        source: Box<CurveError>,
    },

    #[error("no contours found in mask")]
    NoContours,

    #[error("failed to load image: {0}")]
    ImageLoad(String),
}

impl CurveError {
    /// Attach the index of the segment that failed.
    pub fn at_segment(self, index: usize) -> Self {
        match self {
            CurveError::Segment { .. } => self,
            other => CurveError::Segment {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Index of the offending segment, if the failure was segment-local.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            CurveError::Segment { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        match self {
            CurveError::DegenerateGeometry(_) => true,
            CurveError::Segment { source, .. } => source.is_degenerate(),
            _ => false,
        }
    }

    pub fn is_invalid_configuration(&self) -> bool {
        match self {
            CurveError::InvalidConfiguration(_) => true,
            CurveError::Segment { source, .. } => source.is_invalid_configuration(),
            _ => false,
        }
    }
}
