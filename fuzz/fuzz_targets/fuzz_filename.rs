// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use chrono::{Local, TimeZone};
use libfuzzer_sys::fuzz_target;
use std::ffi::OsStr;

use kiro::archive::collision_name;
use kiro::classifier::classify;

#[derive(Arbitrary, Debug)]
struct Input {
    filename: String,
    seconds: u32,
    attempt: u16,
}

fuzz_target!(|input: Input| {
    // Total over any string
    let _ = classify(&input.filename);

    if input.filename.is_empty() || input.filename.contains('/') {
        return;
    }

    let Some(stamp) = Local.timestamp_opt(i64::from(input.seconds), 0).single() else {
        return;
    };
    let name = OsStr::new(&input.filename);
    let attempt = u32::from(input.attempt);
    if attempt > 0 {
        assert_ne!(collision_name(name, stamp, attempt), collision_name(name, stamp, attempt - 1));
    }
});
