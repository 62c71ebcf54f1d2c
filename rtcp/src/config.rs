//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Configuration options for rtcp_dump.

use std::path::PathBuf;

use clap;

/// Command line options for decoding captured RTCP.
#[derive(Default, clap::Parser, Debug, Clone)]
#[clap(name = "rtcp_dump")]
pub struct Config {
    /// File holding one hex-encoded compound RTCP packet per line. Blank lines
    /// and lines starting with '#' are skipped. Reads stdin when not given.
    #[clap(long)]
    pub input: Option<PathBuf>,

    /// Serialize each decoded compound packet again and print it as hex.
    #[clap(long)]
    pub reserialize: bool,
}
