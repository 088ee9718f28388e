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

use std::path::{Component, Path, PathBuf};

#[cfg(target_os = "windows")]
const SLASH_SEPARATOR: char = '\\';
#[cfg(not(target_os = "windows"))]
const SLASH_SEPARATOR: char = '/';

/// clean returns the shortest path equivalent to `path` by purely lexical
/// processing: repeated separators and `.` elements are dropped, and each
/// inner `..` removes the element before it. A `..` directly after the root
/// is dropped; a leading `..` of a relative path is kept.
///
/// An empty result is returned as `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }

    out.iter().collect()
}

/// Whether `path` was written with a trailing separator, which marks a
/// directory object. `Path` itself forgets this once parsed.
pub fn has_trailing_separator(path: &Path) -> bool {
    let s = path.as_os_str().as_encoded_bytes();
    s.len() > 1 && (s.ends_with(&[SLASH_SEPARATOR as u8]) || s.ends_with(b"/"))
}

/// Whether `path` lies strictly below `base` once both are cleaned.
pub fn is_strictly_within(base: &Path, path: &Path) -> bool {
    let base = clean(base);
    let path = clean(path);
    path != base && path.starts_with(&base)
}
