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

use nix::sys::statfs::statfs;
use std::path::Path;

use super::{DiskInfo, disk_info_from_blocks};

/// Returns size and free bytes of the filesystem holding `p`, e.g. `/`.
pub fn get_info(p: impl AsRef<Path>) -> std::io::Result<DiskInfo> {
    let stat_fs = statfs(p.as_ref())?;

    disk_info_from_blocks(
        p.as_ref().display(),
        stat_fs.block_size() as u64,
        stat_fs.blocks() as u64,
        stat_fs.blocks_free() as u64,
        stat_fs.blocks_available() as u64,
    )
}
