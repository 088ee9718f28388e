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

use rustfs_utils::envs::{get_env_bool, get_env_usize};
use serde::{Deserialize, Serialize};

pub const ENV_FS_OSYNC: &str = "RUSTFS_FS_OSYNC";
pub const ENV_FS_ODIRECT: &str = "RUSTFS_FS_ODIRECT";
pub const ENV_FS_OTMPFILE: &str = "RUSTFS_FS_OTMPFILE";
pub const ENV_FS_FAST_PATH: &str = "RUSTFS_FS_FAST_PATH";
pub const ENV_FS_COPY_BUFFER_SIZE: &str = "RUSTFS_FS_COPY_BUFFER_SIZE";

pub const DEFAULT_FS_OSYNC: bool = false;
pub const DEFAULT_FS_ODIRECT: bool = false;
pub const DEFAULT_FS_OTMPFILE: bool = false;
pub const DEFAULT_FS_FAST_PATH: bool = false;
/// Same size `io::copy` uses for its stack buffer.
pub const DEFAULT_FS_COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Operating system family, as far as file semantics are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Linux,
    Macos,
    Windows,
    Unix,
}

impl HostOs {
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    pub fn from_os_name(name: &str) -> Self {
        match name {
            "linux" | "android" => HostOs::Linux,
            "macos" | "ios" => HostOs::Macos,
            "windows" => HostOs::Windows,
            _ => HostOs::Unix,
        }
    }

    /// Whether an open file can be unlinked while other handles still
    /// reference it, without the name lingering in its directory.
    pub fn can_delete_open_files(&self) -> bool {
        !matches!(self, HostOs::Windows)
    }
}

impl Default for HostOs {
    fn default() -> Self {
        Self::current()
    }
}

/// Behaviour switches of the filesystem layer, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Open destination files with `O_SYNC`.
    pub osync: bool,
    /// Open destination files with `O_DIRECT`.
    pub odirect: bool,
    /// Write files that are handed back to the caller as unnamed inodes
    /// (`O_TMPFILE`), named later by [`crate::LocalFs::link_staged`].
    pub otmpfile: bool,
    /// The filesystem answers the vendor fast-path ioctls.
    pub fast_path: bool,
    /// Size of the staging buffer used when the caller does not supply one.
    pub copy_buffer_size: usize,
    pub host_os: HostOs,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            osync: DEFAULT_FS_OSYNC,
            odirect: DEFAULT_FS_ODIRECT,
            otmpfile: DEFAULT_FS_OTMPFILE,
            fast_path: DEFAULT_FS_FAST_PATH,
            copy_buffer_size: DEFAULT_FS_COPY_BUFFER_SIZE,
            host_os: HostOs::current(),
        }
    }
}

impl FsConfig {
    pub fn from_env() -> Self {
        let copy_buffer_size = match get_env_usize(ENV_FS_COPY_BUFFER_SIZE, DEFAULT_FS_COPY_BUFFER_SIZE) {
            0 => DEFAULT_FS_COPY_BUFFER_SIZE,
            n => n,
        };

        Self {
            osync: get_env_bool(ENV_FS_OSYNC, DEFAULT_FS_OSYNC),
            odirect: get_env_bool(ENV_FS_ODIRECT, DEFAULT_FS_ODIRECT),
            otmpfile: get_env_bool(ENV_FS_OTMPFILE, DEFAULT_FS_OTMPFILE),
            fast_path: get_env_bool(ENV_FS_FAST_PATH, DEFAULT_FS_FAST_PATH),
            copy_buffer_size,
            host_os: HostOs::current(),
        }
    }
}
