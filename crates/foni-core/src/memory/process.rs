//! Handle to the target process.
//!
//! Only Windows targets are supported; on other platforms opening a process
//! returns [`Error::Unsupported`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::reader::{ReadMemory, WriteMemory};
use crate::error::{Error, Result};

/// 100ns intervals between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_EPOCH: u64 = 116_444_736_000_000_000;
const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Identifies one run of a process.
///
/// Two processes with the same name (or a restarted process that reused a
/// pid) never share both the id and the start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub id: u32,
    /// Creation time in FILETIME ticks (100ns since 1601-01-01 UTC)
    #[serde(rename = "timeofstart")]
    pub time_of_start: u64,
}

impl ProcessIdentity {
    pub fn new(id: u32, time_of_start: u64) -> Self {
        Self { id, time_of_start }
    }

    /// Creation time as a calendar timestamp, for display.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let since_unix = self.time_of_start.checked_sub(FILETIME_UNIX_EPOCH)?;
        let secs = i64::try_from(since_unix / FILETIME_TICKS_PER_SEC).ok()?;
        let nanos = (since_unix % FILETIME_TICKS_PER_SEC) as u32 * 100;
        DateTime::from_timestamp(secs, nanos)
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.started_at() {
            Some(at) => write!(f, "pid {} started {}", self.id, at.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "pid {} started at tick {}", self.id, self.time_of_start),
        }
    }
}

/// Open handle with read/write access to another process.
///
/// The handle is released by [`ProcessHandle::close`] or on drop, exactly once.
pub struct ProcessHandle {
    pub pid: u32,
    identity: ProcessIdentity,
    raw: Option<sys::RawHandle>,
}

impl ProcessHandle {
    /// Find a running process by executable name and open it.
    ///
    /// The comparison ignores ASCII case and an optional `.exe` suffix.
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = sys::find_process_id(name)?;
        Self::open(pid)
    }

    pub fn open(pid: u32) -> Result<Self> {
        let (raw, time_of_start) = sys::open(pid)?;
        let identity = ProcessIdentity::new(pid, time_of_start);
        debug!("Opened process {}", identity);
        Ok(Self {
            pid,
            identity,
            raw: Some(raw),
        })
    }

    pub fn identity(&self) -> ProcessIdentity {
        self.identity
    }

    pub fn is_valid(&self) -> bool {
        self.raw.is_some()
    }

    /// Release the handle. Further reads and writes fail with
    /// [`Error::ProcessClosed`].
    pub fn close(&mut self) {
        if let Some(raw) = self.raw.take() {
            sys::close(raw);
            debug!("Closed process handle (pid {})", self.pid);
        }
    }

    fn raw(&self) -> Result<&sys::RawHandle> {
        self.raw.as_ref().ok_or(Error::ProcessClosed)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        sys::read(self.raw()?, address, &mut buffer)?;
        Ok(buffer)
    }
}

impl WriteMemory for ProcessHandle {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        sys::write(self.raw()?, address, bytes)
    }
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn normalize_exe_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

#[cfg(target_os = "windows")]
mod sys {
    use std::ffi::c_void;

    use windows::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
    use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{
        GetProcessTimes, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
        PROCESS_VM_READ, PROCESS_VM_WRITE,
    };

    use super::normalize_exe_name;
    use crate::error::{Error, Result};

    pub struct RawHandle(HANDLE);

    pub fn find_process_id(name: &str) -> Result<u32> {
        let wanted = normalize_exe_name(name);

        // SAFETY: snapshot of all processes; the handle is closed below.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot failed: {e}")))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: entry.dwSize is initialized as the API requires.
        let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while has_entry {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            let exe = String::from_utf16_lossy(&entry.szExeFile[..len]);
            if normalize_exe_name(&exe) == wanted {
                found = Some(entry.th32ProcessID);
                break;
            }
            // SAFETY: same snapshot and entry as above.
            has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: snapshot was returned by CreateToolhelp32Snapshot.
        unsafe {
            let _ = CloseHandle(snapshot);
        }

        found.ok_or_else(|| Error::ProcessNotFound(name.to_string()))
    }

    pub fn open(pid: u32) -> Result<(RawHandle, u64)> {
        let access =
            PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION;

        // SAFETY: plain handle acquisition; ownership moves into RawHandle.
        let handle = unsafe { OpenProcess(access, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {pid}: {e}")))?;
        let raw = RawHandle(handle);

        let mut creation = FILETIME::default();
        let mut exit = FILETIME::default();
        let mut kernel = FILETIME::default();
        let mut user = FILETIME::default();
        // SAFETY: all out-pointers reference live locals.
        unsafe { GetProcessTimes(raw.0, &mut creation, &mut exit, &mut kernel, &mut user) }
            .map_err(|e| {
                close(RawHandle(raw.0));
                Error::ProcessOpenFailed(format!("pid {pid}: cannot query start time: {e}"))
            })?;

        let ticks = ((creation.dwHighDateTime as u64) << 32) | creation.dwLowDateTime as u64;
        Ok((raw, ticks))
    }

    pub fn read(raw: &RawHandle, address: u64, buffer: &mut [u8]) -> Result<()> {
        let mut read = 0usize;
        // SAFETY: buffer is valid for buffer.len() bytes.
        unsafe {
            ReadProcessMemory(
                raw.0,
                address as *const c_void,
                buffer.as_mut_ptr().cast(),
                buffer.len(),
                Some(&mut read as *mut usize),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        if read != buffer.len() {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("partial read ({} of {} bytes)", read, buffer.len()),
            });
        }
        Ok(())
    }

    pub fn write(raw: &RawHandle, address: u64, bytes: &[u8]) -> Result<()> {
        let mut written = 0usize;
        // SAFETY: bytes is valid for bytes.len() bytes.
        unsafe {
            WriteProcessMemory(
                raw.0,
                address as *const c_void,
                bytes.as_ptr().cast(),
                bytes.len(),
                Some(&mut written as *mut usize),
            )
        }
        .map_err(|e| Error::MemoryWriteFailed {
            address,
            message: e.to_string(),
        })?;

        if written != bytes.len() {
            return Err(Error::MemoryWriteFailed {
                address,
                message: format!("partial write ({} of {} bytes)", written, bytes.len()),
            });
        }
        Ok(())
    }

    pub fn close(raw: RawHandle) {
        // SAFETY: handle came from OpenProcess and is closed once.
        unsafe {
            let _ = CloseHandle(raw.0);
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod sys {
    use crate::error::{Error, Result};

    /// No process handles exist off Windows.
    pub enum RawHandle {}

    pub fn find_process_id(name: &str) -> Result<u32> {
        Err(Error::Unsupported(format!(
            "process lookup for '{}' is only supported on Windows",
            name
        )))
    }

    pub fn open(pid: u32) -> Result<(RawHandle, u64)> {
        Err(Error::Unsupported(format!(
            "opening pid {} is only supported on Windows",
            pid
        )))
    }

    pub fn read(raw: &RawHandle, _address: u64, _buffer: &mut [u8]) -> Result<()> {
        match *raw {}
    }

    pub fn write(raw: &RawHandle, _address: u64, _bytes: &[u8]) -> Result<()> {
        match *raw {}
    }

    pub fn close(raw: RawHandle) {
        match raw {}
    }
}
