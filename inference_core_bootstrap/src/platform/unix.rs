// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation backed by `libc` and `/proc/meminfo`. Covers Linux
//! and macOS; `/proc` reads fail gracefully on macOS, falling back to
//! `sysconf`.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Unix platform implementation using POSIX APIs.
pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }

    fn sysconf(name: i32) -> Option<i64> {
        let value = unsafe { libc::sysconf(name) };
        if value < 0 {
            None
        } else {
            Some(value)
        }
    }

    /// Reads total and available memory from `/proc/meminfo`, falling back
    /// to `sysconf(_SC_PHYS_PAGES)` for total memory when the file is
    /// unavailable (e.g. macOS has no `/proc`).
    fn read_memory_info() -> Result<(u64, u64), PlatformError> {
        if let Ok(contents) = fs::read_to_string("/proc/meminfo") {
            let mut total_kb = None;
            let mut available_kb = None;
            for line in contents.lines() {
                if let Some(rest) = line.strip_prefix("MemTotal:") {
                    total_kb = parse_kb(rest);
                } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                    available_kb = parse_kb(rest);
                }
                if total_kb.is_some() && available_kb.is_some() {
                    break;
                }
            }
            if let (Some(total), Some(available)) = (total_kb, available_kb) {
                return Ok((total * 1024, available * 1024));
            }
        }

        let page_size = Self::sysconf(libc::_SC_PAGE_SIZE).unwrap_or(4096) as u64;
        let total_pages = Self::sysconf(libc::_SC_PHYS_PAGES).unwrap_or(0) as u64;
        let available_pages = Self::sysconf(libc::_SC_AVPHYS_PAGES).unwrap_or(0) as u64;
        Ok((total_pages * page_size, available_pages * page_size))
    }
}

fn parse_kb(field: &str) -> Option<u64> {
    field.trim().strip_suffix(" kB").and_then(|n| n.trim().parse().ok())
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        Self::sysconf(libc::_SC_PAGE_SIZE).unwrap_or(4096) as usize
    }

    fn cpu_count(&self) -> usize {
        Self::sysconf(libc::_SC_NPROCESSORS_ONLN).unwrap_or(1).max(1) as usize
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::read_memory_info().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::read_memory_info().map(|(_, available)| available)
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_basics_are_sane() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
        let page_size = platform.page_size();
        assert!(page_size >= 512 && page_size <= 65536);
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }

    #[test]
    fn temp_dir_is_non_empty() {
        let platform = UnixPlatform::new();
        assert!(!platform.temp_dir().as_os_str().is_empty());
    }
}
