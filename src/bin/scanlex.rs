// This file is part of cfgscan, a libconfig-family lexical scanner.
// Copyright 2022 Jeffrey Sharp
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// cfgscan is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// cfgscan is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with cfgscan.  If not, see <http://www.gnu.org/licenses/>.

//! `scanlex`: prints the token stream of one or more configuration files,
//! one line per token, for eyeballing what the scanner sees.

use std::env::args;
use std::io::{self, stderr, stdout, Write};
use std::process::ExitCode;

use colored::Colorize;

use cfgscan::{Scanner, TokenKind};

/// The name of the program, for diagnostic prefixes.
pub const PROGRAM_NAME: &str = "scanlex";

fn main() -> ExitCode {
    let paths: Vec<String> = args().skip(1).collect();

    if paths.is_empty() {
        let _ = writeln!(stderr(), "{PROGRAM_NAME}: usage: scanlex FILE...");
        return ExitCode::FAILURE;
    }

    let mut saw_error = false;

    for path in paths {
        if let Err(e) = scan_file(&path) {
            let _ = writeln!(
                stderr(),
                "{}: {}: {}",
                PROGRAM_NAME.red().bold(),
                path,
                e
            );
            saw_error = true;
        }
    }

    if saw_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn scan_file(path: &str) -> io::Result<()> {
    let _ = writeln!(stderr(), "reading {path}");

    let mut scanner = Scanner::from_path(path)?;
    let out = stdout();
    let mut out = out.lock();

    loop {
        let token = scanner.next_token();
        let kind = &token.kind;

        match kind {
            TokenKind::Error => {
                let text = scanner
                    .last_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                writeln!(out, "{} {}", format!("{}", token.loc).dimmed(), text.red())?;
            }
            TokenKind::Eof => {
                writeln!(out, "{} <eof>", format!("{}", token.loc).dimmed())?;
                break;
            }
            _ => {
                writeln!(out, "{} {}", format!("{}", token.loc).dimmed(), kind)?;
            }
        }
    }

    Ok(())
}
