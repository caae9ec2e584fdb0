use console::{Style, StyledObject};

/// Kind of text shown to the user, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    /// Status lines such as the welcome banner.
    Info,
    /// Recoverable problems, e.g. a transcript that could not be written.
    Warning,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().cyan().bold(),
        ChatMessageType::Info => Style::new().green(),
        ChatMessageType::Warning => Style::new().yellow(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}
