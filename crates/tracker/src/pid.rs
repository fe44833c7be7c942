// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID liveness and PID-recycling defenses (spec §4.4.3, §4.4.5), grounded
//! in `petekp-claude-hud`'s lock-file PID verification: a signal-0 check
//! for liveness, and a single-PID `sysinfo` refresh (O(1), not a full
//! process-table scan) for the process start time used to detect recycling.

use nix::sys::signal;
use std::cell::RefCell;
use std::time::Instant;
use sysinfo::{Pid, ProcessRefreshKind, System};

/// Tolerance for comparing a recorded process start time against the
/// current one, named in spec §4.4.5.
pub const START_TIME_TOLERANCE_SECS: u64 = 5;

thread_local! {
    static SYSTEM_CACHE: RefCell<Option<(System, Instant)>> = const { RefCell::new(None) };
}

/// Signal-0 liveness check. `kill(pid, None)` sends no signal but still
/// performs the permission/existence check, so `Ok` means the pid exists.
pub fn is_pid_alive(pid: u32) -> bool {
    signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

/// `None` means the process doesn't exist or can't be queried, which the
/// caller treats as "stopped" (a fail-safe rather than fail-open default).
pub fn get_process_start_time(pid: u32) -> Option<u64> {
    SYSTEM_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let (sys, _) = cache.get_or_insert_with(|| (System::new(), Instant::now()));

        let sysinfo_pid = Pid::from(pid as usize);
        sys.refresh_process_specifics(sysinfo_pid, ProcessRefreshKind::new());
        sys.process(sysinfo_pid).map(|process| process.start_time())
    })
}

/// A pid is alive *and* matches a previously-recorded start time within
/// tolerance. `recorded_start` of `None` (no prior observation) skips the
/// comparison — there is nothing to recycle against yet.
pub fn is_pid_alive_verified(pid: u32, recorded_start: Option<u64>) -> bool {
    if !is_pid_alive(pid) {
        return false;
    }
    let Some(recorded_start) = recorded_start else {
        return true;
    };
    match get_process_start_time(pid) {
        Some(actual_start) => actual_start.abs_diff(recorded_start) <= START_TIME_TOLERANCE_SECS,
        // Absence of a start time means treat as stopped, even though the
        // signal-0 check above passed: the process table entry may be a
        // zombie or otherwise unqueryable, and a stale lock is worse than
        // a missed live one.
        None => false,
    }
}
