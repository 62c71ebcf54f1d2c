//
// Copyright 2022 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::io::Write;

use env_logger::fmt::Formatter;
use log::Record;

/// Line format shared by the binaries, for use with `env_logger::Builder::format`.
///
/// `<timestamp> <LEVEL> <target>:<line> <message>`
pub fn format_log_line(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    writeln!(
        buf,
        "{} {:<5} {}:{} {}",
        buf.timestamp_millis(),
        record.level(),
        record.target(),
        record.line().unwrap_or(0),
        record.args()
    )
}
