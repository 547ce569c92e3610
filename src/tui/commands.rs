//! Slash commands typed into the input box.

/// A parsed `/command`. Anything not starting with `/` is a normal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Attach(Vec<String>),
    /// 1-based chip index as shown in the chips row
    Remove(usize),
    New,
    Copy,
    Save,
    Unknown(String),
}

/// Parse a line of input. Returns `None` when it is not a command.
///
/// A leading word that looks like a path (`/api/v1/login`, `/etc/hosts`)
/// is prompt text, not a command.
pub fn parse(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix('/')?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    if name.is_empty() || name.contains('/') {
        return None;
    }

    let command = match name {
        "attach" => Command::Attach(split_args(args)),
        "remove" => match args.parse::<usize>() {
            Ok(n) if n > 0 => Command::Remove(n),
            _ => Command::Unknown(format!("/remove {}", args).trim_end().to_string()),
        },
        "new" => Command::New,
        "copy" => Command::Copy,
        "save" => Command::Save,
        other => Command::Unknown(format!("/{}", other)),
    };
    Some(command)
}

/// Whitespace-separated arguments; single or double quotes group paths with spaces.
fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in args.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
