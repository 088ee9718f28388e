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

use rustfs_fsio::{DiskError, FsConfig, LocalFs};
use std::io::Read;
use tempfile::TempDir;

const STAGING: usize = 4096;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 253) as u8).collect()
}

fn read_back(fs: &LocalFs, path: &std::path::Path) -> anyhow::Result<Vec<u8>> {
    let (mut file, size) = fs.open_file(path, 0)?;
    let mut out = Vec::with_capacity(size as usize);
    file.read_to_end(&mut out)?;
    assert_eq!(out.len() as u64, size);
    Ok(out)
}

#[test]
fn test_create_then_open_reproduces_source() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());

    let sizes = [0, 1, STAGING - 1, STAGING, STAGING + 1, 3 * STAGING + 17];
    for (i, size) in sizes.into_iter().enumerate() {
        let data = payload(size);

        let with_buf = temp_dir.path().join(format!("bucket/with-buf/{i}"));
        let mut buf = vec![0u8; STAGING];
        let n = fs.create_file(&with_buf, &mut data.as_slice(), Some(&mut buf), 0)?;
        assert_eq!(n, size as u64);
        assert_eq!(read_back(&fs, &with_buf)?, data, "size {size} with staging buffer");

        let without_buf = temp_dir.path().join(format!("bucket/default/{i}"));
        let n = fs.create_file(&without_buf, &mut data.as_slice(), None, size as u64)?;
        assert_eq!(n, size as u64);
        assert_eq!(read_back(&fs, &without_buf)?, data, "size {size} with default buffer");
    }
    Ok(())
}

#[test]
fn test_open_at_offset_after_create() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());
    let path = temp_dir.path().join("object");
    let data = payload(2 * STAGING);

    fs.create_file(&path, &mut data.as_slice(), None, 0)?;

    let (mut file, size) = fs.open_file(&path, STAGING as u64 + 5)?;
    assert_eq!(size, data.len() as u64);
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    assert_eq!(tail, &data[STAGING + 5..]);
    Ok(())
}

#[test]
fn test_create_with_osync() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig {
        osync: true,
        ..Default::default()
    });
    let path = temp_dir.path().join("synced");
    let data = payload(STAGING + 3);

    fs.create_file(&path, &mut data.as_slice(), None, 0)?;
    assert_eq!(read_back(&fs, &path)?, data);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_preallocation_beyond_capacity_is_disk_full() -> anyhow::Result<()> {
    use rustfs_utils::os::get_info;

    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());

    // Filesystems without fallocate cannot report the condition.
    let scratch = std::fs::File::create(temp_dir.path().join("scratch"))?;
    if let Err(e) = rustfs_fsio::os::fallocate(&scratch, 0, 4096)
        && rustfs_fsio::error_conv::to_falloc_error(e).is_none()
    {
        return Ok(());
    }
    drop(scratch);

    let info = get_info(temp_dir.path())?;
    let request = info.size + (1 << 30);
    let path = temp_dir.path().join("bucket/huge");

    for _ in 0..2 {
        let err = fs.create_file(&path, &mut &b"small"[..], None, request).unwrap_err();
        assert_eq!(err, DiskError::DiskFull);
        assert!(!path.exists());
    }
    Ok(())
}

#[test]
fn test_create_over_directory_fails() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());
    let dir = temp_dir.path().join("dir");
    std::fs::create_dir(&dir)?;
    std::fs::write(dir.join("child"), b"x")?;

    let err = fs.create_file(&dir, &mut &b"x"[..], None, 0).unwrap_err();
    assert_eq!(err, DiskError::IsNotRegular);
    assert!(dir.join("child").exists());
    Ok(())
}
