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

//! Streaming file creation.
//!
//! A write opens its destination (named, or as an unnamed inode in the
//! destination directory), reserves the final size when it is known, then
//! copies the source through a staging buffer. A failed write never leaves
//! a file at the destination path.

use crate::error::{DiskError, Result};
use crate::error_conv::{is_sys_err_invalid_arg, to_falloc_error, to_file_error};
use crate::fast_path::split_path;
use crate::fs::{LocalFs, log_unexpected};
use crate::os::{fallocate, set_direct_io, validate_path};
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mode handed to the fast-path create, before umask.
const DEFAULT_FILE_MODE: u32 = 0o666;

/// A freshly written file whose handle was kept open for the caller.
///
/// When the write went through an unnamed inode the file is not visible at
/// [`StagedFile::path`] until [`LocalFs::link_staged`] succeeds; dropping it
/// before then discards the data.
#[derive(Debug)]
pub struct StagedFile {
    file: File,
    path: PathBuf,
    linked: bool,
}

impl StagedFile {
    /// Destination the file was written for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn into_file(self) -> File {
        self.file
    }
}

impl LocalFs {
    /// Writes everything `reader` yields to `path` and returns the byte
    /// count. `buf` is used as the staging buffer when given; a positive
    /// `falloc_size` reserves that many bytes before the copy starts.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn create_file<R>(&self, path: &Path, reader: &mut R, buf: Option<&mut [u8]>, falloc_size: u64) -> Result<u64>
    where
        R: Read + ?Sized,
    {
        let (written, _staged) = self.create_file_inner(path, reader, buf, falloc_size, false)?;
        Ok(written)
    }

    /// Like [`LocalFs::create_file`] but hands the still-open file back.
    /// With unnamed temporary files enabled the data only becomes visible
    /// once the caller links it with [`LocalFs::link_staged`].
    pub fn create_and_get_file<R>(
        &self,
        path: &Path,
        reader: &mut R,
        buf: Option<&mut [u8]>,
        falloc_size: u64,
    ) -> Result<(u64, StagedFile)>
    where
        R: Read + ?Sized,
    {
        self.create_file_inner(path, reader, buf, falloc_size, true)
    }

    fn create_file_inner<R>(
        &self,
        path: &Path,
        reader: &mut R,
        buf: Option<&mut [u8]>,
        falloc_size: u64,
        want_file: bool,
    ) -> Result<(u64, StagedFile)>
    where
        R: Read + ?Sized,
    {
        validate_path(path)?;
        self.make_parent_dirs(path)?;

        let mut staged = self.open_destination(path, want_file)?;

        match self.fill(&mut staged.file, reader, buf, falloc_size) {
            Ok(written) => Ok((written, staged)),
            Err(err) => {
                let linked = staged.linked;
                drop(staged);
                if linked {
                    self.discard(path);
                }
                Err(err)
            }
        }
    }

    fn open_destination(&self, path: &Path, want_file: bool) -> Result<StagedFile> {
        #[cfg(target_os = "linux")]
        {
            if want_file
                && self.config().otmpfile
                && let Some(file) = self.open_unnamed(path)?
            {
                return Ok(StagedFile {
                    file,
                    path: path.to_path_buf(),
                    linked: false,
                });
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = want_file;
        }

        let file = self.open_named(path)?;
        Ok(StagedFile {
            file,
            path: path.to_path_buf(),
            linked: true,
        })
    }

    /// Opens an unnamed inode in the directory of `path`. `None` means the
    /// filesystem has no `O_TMPFILE` and a named file must be used.
    #[cfg(target_os = "linux")]
    fn open_unnamed(&self, path: &Path) -> Result<Option<File>> {
        use crate::error_conv::{is_sys_err_is_dir, is_sys_err_not_supported};
        use crate::os::tmpfile_custom_flags;
        use std::os::unix::fs::OpenOptionsExt;

        let (dir, _) = split_path(path)?;

        let mut opts = OpenOptions::new();
        opts.read(true)
            .write(true)
            .custom_flags(tmpfile_custom_flags(self.config().odirect));

        match self.raw().open(dir, &opts) {
            Ok(file) => Ok(Some(file)),
            Err(e) if is_sys_err_not_supported(&e) || is_sys_err_is_dir(&e) || is_sys_err_invalid_arg(&e) => {
                debug!("O_TMPFILE unavailable, dir: {:?}, err: {:?}", dir, e);
                Ok(None)
            }
            Err(e) => {
                let err = to_file_error(e);
                log_unexpected("open_unnamed", dir, &err);
                Err(err)
            }
        }
    }

    fn open_named(&self, path: &Path) -> Result<File> {
        // O_DIRECT is rejected before O_TRUNC runs, so an existing object
        // survives a refused open and must not be removed afterwards.
        let existed = self.config().odirect && self.raw().symlink_metadata(path).is_ok();

        // A node created here is picked up by the O_CREAT open below.
        if self.fast_path().is_supported()
            && let Ok((dir, name)) = split_path(path)
            && let Err(err) = self.fast_path().create(dir, name, DEFAULT_FILE_MODE)
        {
            debug!("fast path create failed, path: {:?}, err: {:?}", path, err);
        }

        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use crate::os::write_custom_flags;
            use std::os::unix::fs::OpenOptionsExt;

            opts.custom_flags(write_custom_flags(self.config().osync, self.config().odirect));
        }

        self.raw().open(path, &opts).map_err(|e| {
            if self.config().odirect && is_sys_err_invalid_arg(&e) {
                warn!("direct I/O rejected by filesystem, path: {:?}", path);
                if !existed {
                    self.discard(path);
                }
                return DiskError::UnsupportedDisk;
            }
            let err = to_file_error(e);
            log_unexpected("create_file", path, &err);
            err
        })
    }

    fn fill<R>(&self, file: &mut File, reader: &mut R, buf: Option<&mut [u8]>, falloc_size: u64) -> Result<u64>
    where
        R: Read + ?Sized,
    {
        if falloc_size > 0
            && let Err(e) = fallocate(file, 0, falloc_size)
            && let Some(err) = to_falloc_error(e)
        {
            warn!("preallocation of {} bytes failed, err: {:?}", falloc_size, err);
            return Err(err);
        }

        let mut owned;
        let buf: &mut [u8] = match buf {
            Some(buf) if !buf.is_empty() => buf,
            _ => {
                owned = vec![0u8; self.config().copy_buffer_size.max(1)];
                &mut owned
            }
        };

        let mut direct = cfg!(target_os = "linux") && self.config().odirect;
        let mut written = 0u64;
        loop {
            let n = match reader.read(buf) {
                Ok(0) => return Ok(written),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // A short source is the caller's business.
                    if e.kind() != ErrorKind::UnexpectedEof {
                        warn!("create_file read failed after {} bytes, err: {:?}", written, e);
                    }
                    return Err(DiskError::from(e));
                }
            };

            write_chunk(file, &buf[..n], &mut direct).map_err(|e| {
                let err = to_file_error(e);
                warn!("create_file write failed after {} bytes, err: {:?}", written, err);
                err
            })?;
            written += n as u64;
        }
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = self.raw().remove_file(path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!("remove of failed write left behind, path: {:?}, err: {:?}", path, e);
        }
    }

    /// Gives the file written by [`LocalFs::create_and_get_file`] its name.
    /// An existing file at the destination is replaced atomically.
    pub fn link_staged(&self, staged: &mut StagedFile) -> Result<()> {
        if staged.linked {
            return Ok(());
        }

        validate_path(&staged.path)?;
        self.make_parent_dirs(&staged.path)?;

        if self.fast_path().is_supported() {
            match self.fast_path().link(&staged.path, &staged.file) {
                Ok(()) => {
                    staged.linked = true;
                    return Ok(());
                }
                Err(err) => debug!("fast path link failed, path: {:?}, err: {:?}", staged.path, err),
            }
        }

        self.link_unnamed(staged)?;
        staged.linked = true;
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn link_unnamed(&self, staged: &StagedFile) -> Result<()> {
        use crate::os::proc_fd_path;
        use crate::raw::{AT_SYMLINK_FOLLOW, LinkDir};

        let proc_path = proc_fd_path(&staged.file);
        match self.link_at(LinkDir::Cwd, &proc_path, LinkDir::Cwd, &staged.path, AT_SYMLINK_FOLLOW) {
            Err(DiskError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {}
            res => return res,
        }

        // linkat never replaces; go through a sibling and rename over.
        // Fixed length, so any valid destination name yields a valid sibling.
        let sibling = staged
            .path
            .with_file_name(format!(".{}", uuid::Uuid::new_v4().simple()));
        self.link_at(LinkDir::Cwd, &proc_path, LinkDir::Cwd, &sibling, AT_SYMLINK_FOLLOW)?;
        self.simple_rename_file(&sibling, &staged.path).inspect_err(|_| self.discard(&sibling))
    }

    #[cfg(not(target_os = "linux"))]
    fn link_unnamed(&self, _staged: &StagedFile) -> Result<()> {
        Err(DiskError::UnsupportedDisk)
    }
}

/// Writes all of `chunk`. A direct-I/O handle that rejects the chunk
/// (unaligned tail) is switched to buffered I/O once.
fn write_chunk(file: &mut File, mut chunk: &[u8], direct: &mut bool) -> io::Result<()> {
    while !chunk.is_empty() {
        match file.write(chunk) {
            Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => chunk = &chunk[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if *direct && is_sys_err_invalid_arg(&e) => {
                debug!("direct write rejected, falling back to buffered I/O");
                set_direct_io(file, false)?;
                *direct = false;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
