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

//! Async entry points. Each runs the blocking primitive on tokio's blocking
//! pool so request handlers never stall a runtime worker on disk I/O.

use crate::error::Result;
use crate::fs::LocalFs;
use bytes::{Buf, Bytes};
use std::fs::Metadata;
use std::path::Path;
use tokio::task::spawn_blocking;

impl LocalFs {
    pub async fn create_file_async(&self, path: impl AsRef<Path>, data: Bytes, falloc_size: u64) -> Result<u64> {
        let fs = self.clone();
        let path = path.as_ref().to_path_buf();
        spawn_blocking(move || fs.create_file(&path, &mut data.reader(), None, falloc_size)).await?
    }

    pub async fn delete_file_async(&self, base: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<()> {
        let fs = self.clone();
        let base = base.as_ref().to_path_buf();
        let path = path.as_ref().to_path_buf();
        spawn_blocking(move || fs.delete_file(&base, &path)).await?
    }

    pub async fn rename_file_async(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
        let fs = self.clone();
        let src = src.as_ref().to_path_buf();
        let dst = dst.as_ref().to_path_buf();
        spawn_blocking(move || fs.rename_file(&src, &dst)).await?
    }

    pub async fn stat_file_async(&self, path: impl AsRef<Path>) -> Result<Metadata> {
        let fs = self.clone();
        let path = path.as_ref().to_path_buf();
        spawn_blocking(move || fs.stat_file(&path)).await?
    }

    pub async fn remove_locked_async(
        &self,
        base: impl AsRef<Path>,
        path: impl AsRef<Path>,
        scratch: impl AsRef<Path>,
    ) -> Result<()> {
        let fs = self.clone();
        let base = base.as_ref().to_path_buf();
        let path = path.as_ref().to_path_buf();
        let scratch = scratch.as_ref().to_path_buf();
        spawn_blocking(move || fs.remove_locked(&base, &path, &scratch)).await?
    }
}
