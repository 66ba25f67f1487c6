//! Morph cases driven by datatest-stable.
//!
//! Each case is a file in `tests/morph-cases/` with format:
//! ```
//! <old body HTML>
//! ===
//! <new body HTML>
//! ```
//!
//! The test verifies that morphing the old body to the new content
//! serializes exactly like the new content, and that morphing to the same
//! content again changes nothing.

use morsel::Dom;
use std::path::Path;

fn wrap(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}

fn run_morph_case(path: &Path) -> datatest_stable::Result<()> {
    facet_testhelpers::setup();

    let content = std::fs::read_to_string(path)?;
    let parts: Vec<&str> = content.split("\n===\n").collect();

    if parts.len() != 2 {
        return Err(format!(
            "Test file must have exactly one '===' separator, found {} parts",
            parts.len()
        )
        .into());
    }

    let old = parts[0].trim();
    let new = parts[1].trim();

    let expected = Dom::parse_document(&wrap(new)).to_html();

    let mut dom = Dom::parse_document(&wrap(old));
    let body = dom.body().ok_or("old document has no body")?;

    let next = dom.parse_fragment(new);
    dom.morph(body, next)
        .map_err(|e| format!("morph failed: {e:?}"))?;
    let result = dom.to_html();

    if result != expected {
        return Err(format!(
            "Morph failed!\nOld: {old}\nNew: {new}\nResult: {result}\nExpected: {expected}"
        )
        .into());
    }

    let again = dom.parse_fragment(new);
    dom.observe();
    dom.morph(body, again)
        .map_err(|e| format!("second morph failed: {e:?}"))?;
    let records = dom.take_records();
    if !records.is_empty() {
        return Err(format!("Second morph was not a no-op:\nNew: {new}\nMutations: {records:#?}").into());
    }

    Ok(())
}

datatest_stable::harness! {
    { test = run_morph_case, root = "tests/morph-cases", pattern = r".*\.html$" },
}
