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

#[cfg(target_os = "linux")]
mod linux;
#[cfg(all(unix, not(target_os = "linux")))]
mod unix;

#[cfg(target_os = "linux")]
pub use linux::get_info;
#[cfg(all(unix, not(target_os = "linux")))]
pub use unix::get_info;

/// Capacity of the filesystem holding a path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// Raw size of the filesystem in bytes, reserved blocks included.
    pub size: u64,
    /// Bytes usable by non-privileged writers.
    pub total: u64,
    /// Bytes still available to non-privileged writers.
    pub free: u64,
    pub used: u64,
}

#[cfg(not(unix))]
pub fn get_info(_p: impl AsRef<std::path::Path>) -> std::io::Result<DiskInfo> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

/// Splits raw block counts into a [`DiskInfo`], rejecting counters that
/// can only come from a corrupted filesystem.
pub(crate) fn disk_info_from_blocks(
    path_display: std::path::Display<'_>,
    bsize: u64,
    blocks: u64,
    bfree: u64,
    bavail: u64,
) -> std::io::Result<DiskInfo> {
    use std::io::Error;

    let reserved = bfree.checked_sub(bavail).ok_or_else(|| {
        Error::other(format!(
            "detected f_bavail space ({bavail}) > f_bfree space ({bfree}), fs corruption at ({path_display}). please run 'fsck'"
        ))
    })?;

    let total = blocks.checked_sub(reserved).map(|b| b * bsize).ok_or_else(|| {
        Error::other(format!(
            "detected reserved space ({reserved}) > blocks space ({blocks}), fs corruption at ({path_display}). please run 'fsck'"
        ))
    })?;

    let free = bavail * bsize;
    let used = total.checked_sub(free).ok_or_else(|| {
        Error::other(format!(
            "detected free space ({free}) > total drive space ({total}), fs corruption at ({path_display}). please run 'fsck'"
        ))
    })?;

    Ok(DiskInfo {
        size: blocks * bsize,
        total,
        free,
        used,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_get_info_valid_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let info = get_info(temp_dir.path()).unwrap();

        assert!(info.size > 0);
        assert!(info.size >= info.total);
        assert!(info.total >= info.free);
        assert_eq!(info.used, info.total - info.free);
    }

    #[test]
    fn test_get_info_invalid_path() {
        let invalid_path = PathBuf::from("/invalid/path/for/rustfs/utils");
        assert!(get_info(&invalid_path).is_err());
    }

    #[test]
    fn test_disk_info_from_blocks_rejects_corruption() {
        let p = Path::new("/data");
        assert!(disk_info_from_blocks(p.display(), 4096, 100, 10, 20).is_err());
        assert!(disk_info_from_blocks(p.display(), 4096, 5, 50, 10).is_err());

        let info = disk_info_from_blocks(p.display(), 4096, 100, 30, 20).unwrap();
        assert_eq!(info.size, 100 * 4096);
        assert_eq!(info.total, 90 * 4096);
        assert_eq!(info.free, 20 * 4096);
        assert_eq!(info.used, 70 * 4096);
    }
}
