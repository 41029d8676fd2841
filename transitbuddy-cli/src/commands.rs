#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Nearby,
    Home,
    Arrivals(String),
    /// 1-based index into the most recent stop list.
    Select(usize),
    Prompts,
    /// 1-based index into the suggested prompts.
    Prompt(usize),
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type a question, or one of:
  /nearby           bus stops around your position
  /home             route home
  /arrivals <code>  live arrivals at a stop
  /select <n>       pick stop [n] from the last list
  /prompts          list suggested questions
  /prompt <n>       ask suggested question [n]
  /help             this text
  /quit             exit";

/// `None` for a blank line.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((n, a)) => (n, a.trim()),
        None => (rest, ""),
    };

    let cmd = match (name, arg) {
        ("nearby", "") => Command::Nearby,
        ("home", "") => Command::Home,
        ("help", "") => Command::Help,
        ("prompts", "") => Command::Prompts,
        ("quit" | "exit", "") => Command::Quit,
        ("arrivals", code) if !code.is_empty() => Command::Arrivals(code.to_string()),
        ("select", n) => index(n).map_or_else(|| invalid(line), Command::Select),
        ("prompt", n) => index(n).map_or_else(|| invalid(line), Command::Prompt),
        _ => invalid(line),
    };
    Some(cmd)
}

fn index(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().filter(|n| *n > 0)
}

fn invalid(line: &str) -> Command {
    Command::Invalid(line.to_string())
}
