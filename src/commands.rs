pub const COMMAND_PREFIX: char = '/';

pub const HELP_TEXT: &str = "Available commands:
  /help          - Show this help message
  /clear         - Clear conversation history
  /save [file]   - Save conversation to file (optional filename)
  /load <file>   - Load conversation from file
  /history       - Show the conversation so far
  /model         - Show current model information
  /quit or /exit - Exit the chatbot

Just type your message to chat with the NLP assistant!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Save(Option<String>),
    Load(Option<String>),
    History,
    Model,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Command(Command),
    Chat(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if !line.starts_with(COMMAND_PREFIX) {
        return Input::Chat(line.to_string());
    }

    let (token, rest) = line.split_once(' ').unwrap_or((line, ""));
    let argument = Some(rest.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let command = match token.to_ascii_lowercase().as_str() {
        "/help" => Command::Help,
        "/clear" => Command::Clear,
        "/save" => Command::Save(argument),
        "/load" => Command::Load(argument),
        "/history" => Command::History,
        "/model" => Command::Model,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(token.to_string()),
    };
    Input::Command(command)
}
