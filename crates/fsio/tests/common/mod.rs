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

#![allow(dead_code)]

use rustfs_fsio::{DiskError, FastPath, LinkDir, RawFs, Result, StdFs};
use std::ffi::OsStr;
use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `RawFs` that counts every call before handing it to `std::fs`.
#[derive(Debug, Default)]
pub struct CountingFs {
    calls: AtomicUsize,
}

impl CountingFs {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl RawFs for CountingFs {
    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        self.hit();
        StdFs.metadata(path)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        self.hit();
        StdFs.symlink_metadata(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.hit();
        StdFs.create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.hit();
        StdFs.create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.hit();
        StdFs.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.hit();
        StdFs.remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.hit();
        StdFs.remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.hit();
        StdFs.rename(from, to)
    }

    fn open(&self, path: &Path, opts: &OpenOptions) -> io::Result<File> {
        self.hit();
        StdFs.open(path, opts)
    }

    fn link_at(&self, old_dir: LinkDir<'_>, old_path: &Path, new_dir: LinkDir<'_>, new_path: &Path, flags: i32) -> io::Result<()> {
        self.hit();
        StdFs.link_at(old_dir, old_path, new_dir, new_path, flags)
    }
}

/// Fast path that performs its directory mutations with plain `std::fs`
/// calls, standing in for the vendor filesystem.
#[derive(Debug, Default)]
pub struct FakeFastPath {
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl FakeFastPath {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl FastPath for FakeFastPath {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, dir: &Path, name: &OsStr, _mode: u32) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        OpenOptions::new().write(true).create(true).truncate(false).open(dir.join(name))?;
        Ok(())
    }

    fn delete(&self, dir: &Path, name: &OsStr) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        std::fs::remove_file(dir.join(name))?;
        Ok(())
    }

    fn link(&self, _path: &Path, _file: &File) -> Result<()> {
        Err(DiskError::FastPathUnsupported)
    }
}

/// Relative paths and kinds of every entry below `root`, sorted.
pub fn snapshot(root: &Path) -> Vec<(String, bool, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, bool, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            if path.is_dir() {
                out.push((rel, true, Vec::new()));
                walk(root, &path, out);
            } else {
                out.push((rel, false, std::fs::read(&path).unwrap()));
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
