// src/render/substitute.rs

use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};

use crate::errors::{ReloaderError, Result};
use crate::render::Environment;

/// `${NAME}` or `$NAME`, NAME being a shell-style identifier.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("static regex is valid")
});

/// Replace every `${NAME}` / `$NAME` reference in `input` with its value
/// from `env`.
///
/// Substitution is single-pass: values are inserted verbatim and never
/// scanned again. Text that does not match the reference syntax (a lone `$`,
/// `$1`, `${}`, `$(NAME)`) is copied through untouched. The first reference
/// without a value fails the whole render with
/// [`ReloaderError::MissingVariable`].
pub fn render(input: &[u8], env: &Environment) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut last = 0;

    for caps in REFERENCE.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), reference_name(&caps)) else {
            continue;
        };

        let value = env.get(name).ok_or_else(|| ReloaderError::MissingVariable {
            name: name.to_string(),
        })?;

        out.extend_from_slice(&input[last..whole.start()]);
        out.extend_from_slice(value.as_bytes());
        last = whole.end();
    }

    out.extend_from_slice(&input[last..]);
    Ok(out)
}

/// Name from whichever alternative matched. Both only match ASCII, so the
/// UTF-8 conversion cannot fail.
fn reference_name<'a>(caps: &Captures<'a>) -> Option<&'a str> {
    let m = caps.get(1).or_else(|| caps.get(2))?;
    std::str::from_utf8(m.as_bytes()).ok()
}
