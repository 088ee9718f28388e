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

use rustfs_fsio::{DeleteStrategy, DirectDelete, DiskError, FsConfig, HostOs, LocalFs, RenameThenDelete};
use std::fs::{self, File};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_remove_locked_on_open_file() -> anyhow::Result<()> {
    let strategies: [Arc<dyn DeleteStrategy>; 2] = [Arc::new(DirectDelete), Arc::new(RenameThenDelete)];

    for strategy in strategies {
        let temp_dir = TempDir::new()?;
        let fs = LocalFs::new(FsConfig::default()).with_delete_strategy(strategy);
        let base = temp_dir.path().join(".rustfs.sys/multipart");
        let scratch = temp_dir.path().join(".rustfs.sys/tmp");
        let meta = base.join("bucket/object/upload-id/fs.json");
        fs::create_dir_all(&scratch)?;

        fs.create_file(&meta, &mut &b"{\"version\":\"1\"}"[..], None, 0)?;

        // Another reader still holds the file.
        let mut held = File::open(&meta)?;

        fs.remove_locked(&base, &meta, &scratch)?;
        assert_eq!(fs.stat(&meta).unwrap_err(), DiskError::FileNotFound);
        assert!(!base.join("bucket").exists());
        assert!(base.exists());

        let mut contents = String::new();
        held.read_to_string(&mut contents)?;
        assert_eq!(contents, "{\"version\":\"1\"}");
    }
    Ok(())
}

#[test]
fn test_strategy_follows_host_os() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path().join("base");
    let scratch = temp_dir.path().join("scratch");
    fs::create_dir_all(&scratch)?;

    for host_os in [HostOs::Linux, HostOs::Windows, HostOs::Macos] {
        let fs = LocalFs::new(FsConfig {
            host_os,
            ..Default::default()
        });
        let target = base.join("dir/file");
        fs.create_file(&target, &mut &b"x"[..], None, 0)?;
        fs.remove_locked(&base, &target, &scratch)?;

        assert!(!target.exists(), "{host_os:?}");
        assert_eq!(fs::read_dir(&scratch)?.count(), 0, "{host_os:?}");
    }
    Ok(())
}

#[test]
fn test_delete_is_idempotent() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());
    let base = temp_dir.path();
    let target = base.join("bucket/object/part.1");

    fs.create_file(&target, &mut &b"part"[..], None, 0)?;
    fs.delete_file(base, &target)?;
    fs.delete_file(base, &target)?;
    fs.delete_file(base, &base.join("never-existed"))?;

    assert!(!base.join("bucket").exists());
    Ok(())
}

#[test]
fn test_directory_removal_errors() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());

    let missing = temp_dir.path().join("missing");
    assert_eq!(fs.remove_dir(&missing).unwrap_err(), DiskError::VolumeNotFound);

    let full = temp_dir.path().join("full");
    fs.mkdir(&full)?;
    fs.create_file(&full.join("obj"), &mut &b"x"[..], None, 0)?;
    assert_eq!(fs.remove_dir(&full).unwrap_err(), DiskError::VolumeNotEmpty);

    fs.remove_file(&full.join("obj"))?;
    assert_eq!(fs.remove_file(&full.join("obj")).unwrap_err(), DiskError::FileNotFound);
    fs.remove_dir(&full)?;
    assert_eq!(fs.stat_volume(&full).unwrap_err(), DiskError::VolumeNotFound);
    Ok(())
}

#[test]
fn test_mkdir_without_parent_is_access_denied() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fs = LocalFs::new(FsConfig::default());

    let err = fs.mkdir(&temp_dir.path().join("no/such/parent")).unwrap_err();
    assert!(err.is_access_denied(), "{err:?}");
    assert_ne!(err, DiskError::VolumeExists);

    let vol = temp_dir.path().join("vol");
    fs.mkdir(&vol)?;
    assert_eq!(fs.mkdir(&vol).unwrap_err(), DiskError::VolumeExists);
    Ok(())
}
