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

//! Filesystem storage primitives for a single local tree.
//!
//! [`LocalFs`] exposes validated stat/open/mkdir/remove/rename operations,
//! a streaming create pipeline with optional preallocation and unnamed
//! temporary files, and deletion that prunes empty parents. Raw OS errors
//! are translated into [`DiskError`] at the point they occur.

pub mod config;
pub mod delete;
pub mod error;
pub mod error_conv;
pub mod fast_path;
pub mod fs;
pub mod os;
pub mod raw;
mod task;
pub mod writer;

pub use config::{FsConfig, HostOs};
pub use delete::{DeleteStrategy, DirectDelete, RenameThenDelete, strategy_for};
pub use error::{DiskError, Error, Result};
pub use fast_path::{FastPath, FastPathParam, NoFastPath, probe_fast_path, select_fast_path};
#[cfg(target_os = "linux")]
pub use fast_path::IoctlFastPath;
pub use fs::LocalFs;
pub use os::{check_path_length, validate_path};
pub use raw::{AT_SYMLINK_FOLLOW, LinkDir, RawFs, StdFs};
pub use writer::StagedFile;
