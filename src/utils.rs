use serde::Serialize;
use std::time::Duration;
use sysinfo::System;

#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetStdHandle, GetConsoleMode, SetConsoleMode, SetConsoleOutputCP,
        STD_OUTPUT_HANDLE, ENABLE_VIRTUAL_TERMINAL_PROCESSING,
    };
    unsafe {
        SetConsoleOutputCP(65001);
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(handle, &mut mode) != 0 {
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}

/// `"<m> minutes, <s> seconds"`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{} minutes, {} seconds", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss: String,
    pub heap_total: String,
    pub heap_used: String,
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Samples this process's memory. There is no separate managed heap, so
/// `heapTotal` reports the virtual size and `heapUsed` the resident set.
pub fn memory_usage() -> MemoryUsage {
    let mut sys = System::new();
    let (rss, virt) = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| {
            sys.refresh_process(pid);
            sys.process(pid).map(|p| (p.memory(), p.virtual_memory()))
        })
        .unwrap_or((0, 0));

    MemoryUsage {
        rss: megabytes(rss),
        heap_total: megabytes(virt),
        heap_used: megabytes(rss),
    }
}
