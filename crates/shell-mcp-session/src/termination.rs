//! Signal plumbing for graceful-then-forceful process termination.
//!
//! The manager drives the protocol (terminate, grace window, kill, remove);
//! this module only knows how to talk to the OS about one pid.

use tracing::debug;

/// Send the graceful termination signal.
#[cfg(unix)]
pub fn send_terminate(pid: u32) {
    debug!("Sending SIGTERM to pid={}", pid);
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }
}

/// Send the forceful kill signal.
#[cfg(unix)]
pub fn send_kill(pid: u32) {
    debug!("Sending SIGKILL to pid={}", pid);
    unsafe {
        libc::kill(pid as i32, libc::SIGKILL);
    }
}

/// Probe whether a process still exists (signal 0).
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

/// Send the graceful termination signal (Windows implementation).
#[cfg(windows)]
pub fn send_terminate(pid: u32) {
    use std::process::Command;
    debug!("Requesting taskkill for pid={}", pid);
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .output();
}

/// Send the forceful kill signal (Windows implementation).
#[cfg(windows)]
pub fn send_kill(pid: u32) {
    use std::process::Command;
    debug!("Requesting forced taskkill for pid={}", pid);
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .output();
}

/// Probe whether a process still exists (Windows implementation).
#[cfg(windows)]
pub fn is_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

/// Opportunistic lookup of a human-readable process name for audit reports.
///
/// Unavailability never fails the caller's operation; it only omits the
/// enrichment.
#[cfg(target_os = "linux")]
pub fn process_name(pid: u32) -> Option<String> {
    let comm = std::fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    let name = comm.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Opportunistic lookup of a human-readable process name for audit reports.
#[cfg(all(unix, not(target_os = "linux")))]
pub fn process_name(pid: u32) -> Option<String> {
    use std::process::Command;
    let out = Command::new("ps")
        .args(["-o", "comm=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    let name = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Opportunistic lookup of a human-readable process name (Windows: omitted).
#[cfg(windows)]
pub fn process_name(_pid: u32) -> Option<String> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_is_alive_for_own_process() {
        assert!(is_alive(std::process::id()));
    }

    #[test]
    fn test_is_alive_for_bogus_pid() {
        // Just below the typical pid_max, vanishingly unlikely to exist
        assert!(!is_alive(4_000_000));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_name_for_own_process() {
        let name = process_name(std::process::id());
        assert!(name.is_some());
        assert!(!name.unwrap().is_empty());
    }

    #[test]
    fn test_process_name_for_bogus_pid() {
        assert_eq!(process_name(4_000_000), None);
    }
}
