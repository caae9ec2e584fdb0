mod presenter;
mod render;
mod sink;

pub use presenter::{ChatMessageType, style_chat_text};
pub use render::{RenderMode, ResponseRenderer};
pub use sink::{OutputSink, TerminalSink};

use console::style;

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
