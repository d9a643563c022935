/*
 * Windows directory enumeration over FindFirstFileW/FindNextFileW/FindClose.
 * The search handle is created by `open`, which also yields the first entry;
 * it is buffered until the first `next_entry` call.
 */
use super::{DirectoryOperations, is_dot_name};
use std::ffi::OsString;
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES, HANDLE};
use windows::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, FindNextFileW, WIN32_FIND_DATAW,
};
use windows::core::PCWSTR;

pub struct Directory {
    abs_path: PathBuf,
    last_error: i32,
    handle: Option<HANDLE>,
    find_data: WIN32_FIND_DATAW,
    first_pending: bool,
}

impl Directory {
    pub fn new(path: &Path) -> Self {
        Directory {
            abs_path: path.to_path_buf(),
            last_error: 0,
            handle: None,
            find_data: WIN32_FIND_DATAW::default(),
            first_pending: false,
        }
    }

    fn current_name(&self) -> OsString {
        let name = &self.find_data.cFileName;
        let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        OsString::from_wide(&name[..len])
    }
}

// Recovers the Win32 error code wrapped in an HRESULT_FROM_WIN32 value.
fn win32_code(err: &windows::core::Error) -> i32 {
    let hresult = err.code().0 as u32;
    if hresult & 0xFFFF_0000 == 0x8007_0000 {
        (hresult & 0xFFFF) as i32
    } else {
        hresult as i32
    }
}

impl DirectoryOperations for Directory {
    fn path(&self) -> &Path {
        &self.abs_path
    }

    fn open(&mut self) -> bool {
        if self.handle.is_some() {
            return true;
        }
        let wildcard: Vec<u16> = self
            .abs_path
            .join("*")
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        // SAFETY: `wildcard` is NUL-terminated and outlives the call.
        match unsafe { FindFirstFileW(PCWSTR(wildcard.as_ptr()), &mut self.find_data) } {
            Ok(handle) => {
                self.handle = Some(handle);
                self.first_pending = true;
                true
            }
            Err(e) => {
                let code = win32_code(&e);
                if code == ERROR_FILE_NOT_FOUND.0 as i32 {
                    // A directory with no entries at all.
                    return true;
                }
                log::trace!("Directory: FindFirstFileW {:?} failed: {e}", self.abs_path);
                self.last_error = code;
                false
            }
        }
    }

    fn close(&mut self) -> bool {
        if let Some(handle) = self.handle.take() {
            // SAFETY: `handle` came from FindFirstFileW and is closed only once.
            if let Err(e) = unsafe { FindClose(handle) } {
                self.last_error = win32_code(&e);
                return false;
            }
        }
        true
    }

    fn next_entry(&mut self) -> OsString {
        let Some(handle) = self.handle else {
            return OsString::new();
        };
        loop {
            if self.first_pending {
                self.first_pending = false;
            } else {
                // SAFETY: `handle` is a live search handle owned by `self`.
                if let Err(e) = unsafe { FindNextFileW(handle, &mut self.find_data) } {
                    let code = win32_code(&e);
                    if code != ERROR_NO_MORE_FILES.0 as i32 {
                        log::trace!("Directory: FindNextFileW {:?} failed: {e}", self.abs_path);
                        self.last_error = code;
                    }
                    return OsString::new();
                }
            }
            let name = self.current_name();
            if !is_dot_name(&name) {
                return name;
            }
        }
    }

    fn last_error(&self) -> i32 {
        self.last_error
    }

    fn clear_error(&mut self) {
        self.last_error = 0;
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        self.close();
    }
}
