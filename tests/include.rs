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

//! Multi-file behavior: `@include`, `@include_dir`, and cycle detection.
//! These live outside `src/` because they exercise real temporary
//! directories, not just in-memory byte buffers.

use std::fs;

use cfgscan::{Scanner, TokenKind};

fn debug_kinds(scanner: &mut Scanner) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        let tok = scanner.next_token();
        let is_eof = matches!(tok.kind, TokenKind::Eof);
        out.push(format!("{:?}", tok.kind));
        if is_eof {
            break;
        }
    }
    out
}

#[test]
fn scenario_7_include_substitution() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.cfg");
    let b = dir.path().join("b.cfg");
    fs::write(&a, "@include \"b.cfg\"\nq=1;").unwrap();
    fs::write(&b, "p=2;").unwrap();

    let mut scanner = Scanner::from_path(&a).unwrap();
    assert_eq!(
        debug_kinds(&mut scanner),
        vec![
            "Name(\"p\")",
            "Equals",
            "Integer(2)",
            "Semicolon",
            "Name(\"q\")",
            "Equals",
            "Integer(1)",
            "Semicolon",
            "Eof",
        ]
    );
}

#[test]
fn include_substitution_is_equivalent_to_inlining() {
    // The quantified invariant: tokenizing F1 with `@include "F2"` matches
    // tokenizing the concatenation of F1's surrounding text with F2's
    // contents spliced in, modulo location metadata.
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root.cfg");
    let child = dir.path().join("child.cfg");
    fs::write(&child, "b = 2;").unwrap();
    fs::write(&root, "a = 1;\n@include \"child.cfg\"\nc = 3;").unwrap();

    let mut via_include = Scanner::from_path(&root).unwrap();
    let mut inlined = Scanner::from_bytes(
        b"a = 1;\nb = 2;\nc = 3;".to_vec(),
        dir.path().join("inlined.cfg"),
    );

    assert_eq!(debug_kinds(&mut via_include), debug_kinds(&mut inlined));
}

#[test]
fn relative_includes_resolve_against_the_including_file() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("root.cfg"), "@include \"sub/child.cfg\"").unwrap();
    fs::write(sub.join("child.cfg"), "@include \"grandchild.cfg\"").unwrap();
    fs::write(sub.join("grandchild.cfg"), "n = 1;").unwrap();

    let mut scanner = Scanner::from_path(dir.path().join("root.cfg")).unwrap();
    assert_eq!(
        debug_kinds(&mut scanner),
        vec!["Name(\"n\")", "Equals", "Integer(1)", "Semicolon", "Eof"]
    );
}

#[test]
fn cycle_is_reported_as_error_then_terminates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.cfg");
    let b = dir.path().join("b.cfg");
    fs::write(&a, "@include \"b.cfg\"").unwrap();
    fs::write(&b, "@include \"a.cfg\"").unwrap();

    let mut scanner = Scanner::from_path(&a).unwrap();
    let tok = scanner.next_token();
    assert!(matches!(tok.kind, TokenKind::Error));
    assert!(scanner.last_error().is_some());

    let tok = scanner.next_token();
    assert!(matches!(tok.kind, TokenKind::Eof));
}

#[test]
fn missing_include_file_is_error_then_terminates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root.cfg");
    fs::write(&root, "@include \"nope.cfg\"").unwrap();

    let mut scanner = Scanner::from_path(&root).unwrap();
    assert!(matches!(scanner.next_token().kind, TokenKind::Error));
    assert!(matches!(scanner.next_token().kind, TokenKind::Eof));
}

#[test]
fn include_dir_expands_entries_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();
    fs::write(dir.path().join("root.cfg"), "@include_dir \"conf.d\"").unwrap();
    fs::write(conf_d.join("20-b.cfg"), "b = 2;").unwrap();
    fs::write(conf_d.join("10-a.cfg"), "a = 1;").unwrap();

    let mut scanner = Scanner::from_path(dir.path().join("root.cfg")).unwrap();
    assert_eq!(
        debug_kinds(&mut scanner),
        vec![
            "Name(\"a\")",
            "Equals",
            "Integer(1)",
            "Semicolon",
            "Name(\"b\")",
            "Equals",
            "Integer(2)",
            "Semicolon",
            "Eof",
        ]
    );
}

#[test]
fn include_dir_skips_dotfiles() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();
    fs::write(dir.path().join("root.cfg"), "@include_dir \"conf.d\"").unwrap();
    fs::write(conf_d.join(".hidden.cfg"), "h = 1;").unwrap();
    fs::write(conf_d.join("visible.cfg"), "v = 2;").unwrap();

    let mut scanner = Scanner::from_path(dir.path().join("root.cfg")).unwrap();
    assert_eq!(
        debug_kinds(&mut scanner),
        vec!["Name(\"v\")", "Equals", "Integer(2)", "Semicolon", "Eof"]
    );
}

#[test]
fn include_dir_on_empty_directory_produces_no_tokens_from_it() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();
    fs::write(dir.path().join("root.cfg"), "@include_dir \"conf.d\"\nx = 1;").unwrap();

    let mut scanner = Scanner::from_path(dir.path().join("root.cfg")).unwrap();
    assert_eq!(
        debug_kinds(&mut scanner),
        vec!["Name(\"x\")", "Equals", "Integer(1)", "Semicolon", "Eof"]
    );
}

#[test]
#[cfg(unix)]
fn include_dir_skips_a_broken_first_entry_and_still_scans_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();
    fs::write(dir.path().join("root.cfg"), "@include_dir \"conf.d\"\ny = 2;").unwrap();
    // Sorts before "visible.cfg" but resolves to nothing, so opening it
    // fails; the directive should skip it and still pick up the rest.
    std::os::unix::fs::symlink(conf_d.join("missing"), conf_d.join("a.broken")).unwrap();
    fs::write(conf_d.join("visible.cfg"), "v = 1;").unwrap();

    let mut scanner = Scanner::from_path(dir.path().join("root.cfg")).unwrap();
    assert!(matches!(scanner.next_token().kind, TokenKind::Error));
    assert!(scanner.last_error().is_some());
    assert_eq!(
        debug_kinds(&mut scanner),
        vec![
            "Name(\"v\")",
            "Equals",
            "Integer(1)",
            "Semicolon",
            "Name(\"y\")",
            "Equals",
            "Integer(2)",
            "Semicolon",
            "Eof",
        ]
    );
}

#[test]
fn token_stream_is_independent_of_file_path_when_no_includes() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let path_a = dir_a.path().join("one.cfg");
    let path_b = dir_b.path().join("very_different_name.cfg");
    let body = "k = 1; s = \"hi\"; g = true;";
    fs::write(&path_a, body).unwrap();
    fs::write(&path_b, body).unwrap();

    let mut scanner_a = Scanner::from_path(&path_a).unwrap();
    let mut scanner_b = Scanner::from_path(&path_b).unwrap();
    assert_eq!(debug_kinds(&mut scanner_a), debug_kinds(&mut scanner_b));
}
