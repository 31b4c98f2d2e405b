//! Whole-document renders compared against stored snapshots.
//!
//! Fixtures live in `tests/fixtures/*.textile`; review changes with
//! `cargo insta review`.

use std::fs;

use textile_engine::Textile;

fn assert_fixture(name: &str) {
    let path = format!("{}/tests/fixtures/{name}.textile", env!("CARGO_MANIFEST_DIR"));
    let input = fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"));
    let html = Textile::new().unwrap().render_unrestricted(&input);
    insta::assert_snapshot!(name, html);
}

#[test]
fn fixture_shopping() {
    assert_fixture("shopping")
}

#[test]
fn fixture_quotes() {
    assert_fixture("quotes")
}
