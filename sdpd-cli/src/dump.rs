//! Per-file processing
//!
//!     Every path is handled on its own: a file that cannot be read or has no usable
//!     metadata is reported on stderr and counted, and the remaining files are still
//!     processed. Command lines go to the given writer so the loop can be exercised
//!     without a terminal.

use sdpd_parser::{FieldRegistry, Metadata, RenderOptions};
use std::io::{self, Write};
use tracing::debug;

/// Print the command line for each file. Returns the number of files that failed.
pub fn dump_files<W, P>(
    out: &mut W,
    paths: &[P],
    registry: &FieldRegistry,
    options: &RenderOptions,
) -> io::Result<usize>
where
    W: Write,
    P: AsRef<str>,
{
    let mut failures = 0;

    for path in paths {
        let path = path.as_ref();
        match Metadata::from_path(path) {
            Ok(metadata) => {
                debug!(path, tokens = metadata.tokens().len(), "extracted metadata");
                let line = metadata.render(registry, options);
                write!(out, "\n{path}:\n\n{line}\n")?;
            }
            Err(e) => {
                eprintln!("{path}: {e}");
                failures += 1;
            }
        }
    }

    out.flush()?;
    Ok(failures)
}

/// Failures become the process status, saturating at what an exit code can hold.
pub fn exit_code(failures: usize) -> i32 {
    failures.min(u8::MAX as usize) as i32
}
