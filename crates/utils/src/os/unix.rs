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

use rustix::fs::statvfs;
use std::path::Path;

use super::{DiskInfo, disk_info_from_blocks};

/// Returns size and free bytes of the filesystem holding `p`, e.g. `/`.
pub fn get_info(p: impl AsRef<Path>) -> std::io::Result<DiskInfo> {
    let stat = statvfs(p.as_ref())?;

    // f_blocks is counted in f_frsize units; fall back to f_bsize on
    // platforms that leave f_frsize at zero.
    let bsize = if stat.f_frsize > 0 {
        stat.f_frsize as u64
    } else {
        stat.f_bsize as u64
    };

    disk_info_from_blocks(
        p.as_ref().display(),
        bsize,
        stat.f_blocks as u64,
        stat.f_bfree as u64,
        stat.f_bavail as u64,
    )
}
