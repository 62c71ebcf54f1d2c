//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

#[macro_use]
extern crate log;

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use media_rtcp::{config::Config, CompoundPacket};

// Skips blank lines and '#' comments; whitespace inside a line is ignored.
fn decode_line(line: &str) -> Option<Result<Vec<u8>>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let digits: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    Some(hex::decode(&digits).with_context(|| format!("invalid hex: {}", trimmed)))
}

fn dump(line_number: usize, bytes: &[u8], config: &Config) -> Result<()> {
    let compound = CompoundPacket::parse(bytes);
    println!(
        "#{} {} bytes, {} packets",
        line_number,
        bytes.len(),
        compound.len()
    );
    for packet in &compound {
        println!("{}", packet);
    }
    if config.reserialize {
        let serialized = compound
            .to_vec()
            .with_context(|| format!("failed to serialize line {}", line_number))?;
        println!("{}", hex::encode(&serialized));
        if serialized.len() != bytes.len() {
            debug!(
                "line {}: reserialized to {} bytes from {}",
                line_number,
                serialized.len(),
                bytes.len()
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging.
    env_logger::Builder::from_env(
        Env::default()
            .default_filter_or("media_rtcp=info,rtcp_dump=info")
            .default_write_style_or("never"),
    )
    .format(media_common::format_log_line)
    .init();

    let config = Config::parse();
    debug!("config: {:?}", config);

    let reader: Box<dyn BufRead> = match &config.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut decoded = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line_number = index + 1;
        match decode_line(&line) {
            None => continue,
            Some(Err(err)) => warn!("line {}: {:#}", line_number, err),
            Some(Ok(bytes)) => {
                dump(line_number, &bytes, &config)?;
                decoded += 1;
            }
        }
    }
    info!("decoded {} compound packets", decoded);
    Ok(())
}
