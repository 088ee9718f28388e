// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::hash::{Hash, Hasher};
use std::io;

pub type Error = DiskError;
pub type Result<T> = core::result::Result<T, Error>;

/// Storage-domain errors produced by the filesystem primitives.
///
/// Raw OS errors that have no storage meaning travel unchanged in
/// [`DiskError::Io`].
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("invalid argument")]
    InvalidArgument,

    #[error("file name too long")]
    FileNameTooLong,

    #[error("file not found")]
    FileNotFound,

    #[error("volume not found")]
    VolumeNotFound,

    #[error("volume already exists")]
    VolumeExists,

    #[error("file access denied")]
    FileAccessDenied,

    #[error("volume access denied")]
    VolumeAccessDenied,

    #[error("drive access denied")]
    DiskAccessDenied,

    #[error("volume is not empty")]
    VolumeNotEmpty,

    #[error("drive path full")]
    DiskFull,

    #[error("drive is faulty")]
    FaultyDisk,

    #[error("drive does not support the requested operation")]
    UnsupportedDisk,

    #[error("not of regular file type")]
    IsNotRegular,

    #[error("unexpected error")]
    Unexpected,

    #[error("too many open files, please increase 'ulimit -n'")]
    TooManyOpenFiles,

    #[error("Rename across devices not allowed, please fix your backend configuration")]
    CrossDeviceLink,

    #[error("fast path operation is unsupported on the current filesystem")]
    FastPathUnsupported,

    #[error("io error {0}")]
    Io(io::Error),
}

impl DiskError {
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DiskError::Io(io::Error::other(error))
    }

    /// Any flavour of "does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiskError::FileNotFound | DiskError::VolumeNotFound)
    }

    /// Permission problems and structurally unreachable parents share this class.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            DiskError::FileAccessDenied | DiskError::VolumeAccessDenied | DiskError::DiskAccessDenied
        )
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            DiskError::InvalidArgument => 0x01,
            DiskError::FileNameTooLong => 0x02,
            DiskError::FileNotFound => 0x03,
            DiskError::VolumeNotFound => 0x04,
            DiskError::VolumeExists => 0x05,
            DiskError::FileAccessDenied => 0x06,
            DiskError::VolumeAccessDenied => 0x07,
            DiskError::DiskAccessDenied => 0x08,
            DiskError::VolumeNotEmpty => 0x09,
            DiskError::DiskFull => 0x0A,
            DiskError::FaultyDisk => 0x0B,
            DiskError::UnsupportedDisk => 0x0C,
            DiskError::IsNotRegular => 0x0D,
            DiskError::Unexpected => 0x0E,
            DiskError::TooManyOpenFiles => 0x0F,
            DiskError::CrossDeviceLink => 0x10,
            DiskError::FastPathUnsupported => 0x11,
            DiskError::Io(_) => 0x12,
        }
    }

    pub fn from_u32(error: u32) -> Option<Self> {
        match error {
            0x01 => Some(DiskError::InvalidArgument),
            0x02 => Some(DiskError::FileNameTooLong),
            0x03 => Some(DiskError::FileNotFound),
            0x04 => Some(DiskError::VolumeNotFound),
            0x05 => Some(DiskError::VolumeExists),
            0x06 => Some(DiskError::FileAccessDenied),
            0x07 => Some(DiskError::VolumeAccessDenied),
            0x08 => Some(DiskError::DiskAccessDenied),
            0x09 => Some(DiskError::VolumeNotEmpty),
            0x0A => Some(DiskError::DiskFull),
            0x0B => Some(DiskError::FaultyDisk),
            0x0C => Some(DiskError::UnsupportedDisk),
            0x0D => Some(DiskError::IsNotRegular),
            0x0E => Some(DiskError::Unexpected),
            0x0F => Some(DiskError::TooManyOpenFiles),
            0x10 => Some(DiskError::CrossDeviceLink),
            0x11 => Some(DiskError::FastPathUnsupported),
            0x12 => Some(DiskError::Io(io::Error::other(String::new()))),
            _ => None,
        }
    }
}

impl From<io::Error> for DiskError {
    fn from(e: io::Error) -> Self {
        e.downcast::<DiskError>().unwrap_or_else(DiskError::Io)
    }
}

impl From<DiskError> for io::Error {
    fn from(e: DiskError) -> Self {
        match e {
            DiskError::Io(io_error) => io_error,
            e => io::Error::other(e),
        }
    }
}

impl From<tokio::task::JoinError> for DiskError {
    fn from(e: tokio::task::JoinError) -> Self {
        DiskError::other(e)
    }
}

impl Clone for DiskError {
    fn clone(&self) -> Self {
        match self {
            DiskError::Io(io_error) => match io_error.raw_os_error() {
                Some(code) => DiskError::Io(io::Error::from_raw_os_error(code)),
                None => DiskError::Io(io::Error::new(io_error.kind(), io_error.to_string())),
            },
            e => DiskError::from_u32(e.to_u32()).unwrap_or(DiskError::Unexpected),
        }
    }
}

impl PartialEq for DiskError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DiskError::Io(e1), DiskError::Io(e2)) => e1.kind() == e2.kind() && e1.to_string() == e2.to_string(),
            _ => self.to_u32() == other.to_u32(),
        }
    }
}

impl Eq for DiskError {}

impl Hash for DiskError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u32().hash(state);
    }
}
