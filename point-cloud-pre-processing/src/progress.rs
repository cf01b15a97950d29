/// Shared progress bar styling for long preprocessing loops
use indicatif::{ProgressBar, ProgressStyle};

use crate::constants::{PROGRESS_CHARS, PROGRESS_TEMPLATE};

/// Progress bar with the pipeline's common layout. Draws to stderr and stays
/// silent when stderr is not a terminal.
pub fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_message(message);
    pb
}
