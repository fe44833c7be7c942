// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::{Duration, UNIX_EPOCH};

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::at_ms(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance(Duration::from_millis(500));
    assert_eq!(clock.now_ms(), 1_500);
}

#[test]
fn fake_clock_set_is_absolute() {
    let clock = FakeClock::at_ms(1_000);
    clock.set(UNIX_EPOCH + Duration::from_millis(42));
    assert_eq!(clock.now_ms(), 42);
}

#[test]
fn system_clock_now_ms_is_recent() {
    let clock = SystemClock;
    let ms = clock.now_ms();
    // Sometime after this module was written; guards against a unit mixup
    // (e.g. returning seconds instead of milliseconds).
    assert!(ms > 1_700_000_000_000);
}
