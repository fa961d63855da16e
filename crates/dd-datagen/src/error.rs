use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

use crate::sampler::SampleError;

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum GenReason {
    #[error("invalid distribution")]
    InvalidDistribution,
    #[error("invalid latency parameters")]
    InvalidLatency,
    #[error("invalid category model")]
    InvalidModel,
    #[error("archive io error")]
    Io,
    #[error("record encode error")]
    Encode,
    #[error("task join error")]
    Join,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for GenReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::InvalidDistribution => 2101,
            Self::InvalidModel => 2102,
            Self::Io => 2103,
            Self::Encode => 2104,
            Self::Join => 2105,
            Self::InvalidLatency => 2106,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type GenError = StructError<GenReason>;
pub type GenResult<T> = Result<T, GenError>;

impl From<&SampleError> for GenReason {
    fn from(err: &SampleError) -> Self {
        match err {
            SampleError::InvalidDistribution { .. } => Self::InvalidDistribution,
            SampleError::InvalidLatency { .. } => Self::InvalidLatency,
        }
    }
}
