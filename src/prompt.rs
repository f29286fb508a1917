//! Line input for the interactive `dormicast-ctl` mode.

use std::future::Future;

use tokio::io::{AsyncBufRead, Lines};

use crate::Result;

/// Read the next trimmed line, or `None` on end of input or once
/// `interrupt` resolves.
///
/// # Errors
///
/// Returns `AppError::Io` if reading the input fails.
pub async fn next_line_or_interrupt<R, I>(
    lines: &mut Lines<R>,
    interrupt: I,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future,
{
    tokio::select! {
        biased;
        _ = interrupt => Ok(None),
        line = lines.next_line() => Ok(line?.map(|line| line.trim().to_owned())),
    }
}
