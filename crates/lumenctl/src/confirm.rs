//! Consent prompt - asks before any external data is fetched.

use lumen_common::ConfirmationRequest;
use std::io::{self, BufRead, Write};

/// Show the pending request and read a y/N answer. Anything but yes declines.
pub fn ask_consent<R: BufRead, W: Write>(
    request: &ConfirmationRequest,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    writeln!(output)?;
    writeln!(output, "{}", request.prompt())?;
    if request.subtype == lumen_common::SearchSubtype::WebSearch {
        writeln!(output, "  This uses one search from your monthly allowance.")?;
    }
    write!(output, "Allow? [y/N]: ")?;
    output.flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;

    Ok(matches!(
        response.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
