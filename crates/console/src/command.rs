/// Commands typed on the console's stdin, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pause a running feed or resume a paused one.
    Toggle,
    /// Print the whole window.
    Status,
    Help,
    Quit,
    /// Anything we don't understand; carries the trimmed input.
    Unknown(String),
}

/// Parse one input line. An empty line toggles, so pressing Enter pauses.
pub fn parse_command(line: &str) -> Command {
    let word = line.trim();
    match word.to_ascii_lowercase().as_str() {
        "" | "p" | "pause" | "resume" | "toggle" => Command::Toggle,
        "s" | "status" => Command::Status,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(word.to_string()),
    }
}

pub const HELP: &str = "commands: [Enter]/p toggle pause, s status, h help, q quit";
