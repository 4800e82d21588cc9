//! Console commands.

use uuid::Uuid;

/// Commands that can be sent from the input thread
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Add {
        world: String,
        x: i32,
        z: i32,
        radius: u32,
    },
    Resize {
        id: Uuid,
        radius: u32,
    },
    Remove {
        id: Uuid,
    },
    List,
    Stores,
    Reload,
    Help,
    Quit,
    /// Recognised command with bad arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

const ADD_USAGE: &str = "add <world> <x> <z> <radius>";
const RESIZE_USAGE: &str = "resize <id> <radius>";
const REMOVE_USAGE: &str = "remove <id>";

pub const HELP: [&str; 8] = [
    "  add <world> <x> <z> <radius>  - Keep a square of chunks loaded",
    "  resize <id> <radius>          - Change a loader's radius",
    "  remove <id>                   - Stop and forget a loader",
    "  l, list                       - List active loaders",
    "  stores                        - List available data stores",
    "  r, reload                     - Reload the data store and re-issue tickets",
    "  help                          - Show this help",
    "  q, quit                       - Release all tickets and exit",
];

pub fn parse_command(input: &str) -> Command {
    let mut parts = input.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Unknown(String::new());
    };
    let args: Vec<&str> = parts.collect();

    match head.to_lowercase().as_str() {
        "add" => parse_add(&args).unwrap_or(Command::Usage(ADD_USAGE)),
        "resize" => parse_resize(&args).unwrap_or(Command::Usage(RESIZE_USAGE)),
        "remove" | "rm" => match args.as_slice() {
            [id] => id
                .parse()
                .map_or(Command::Usage(REMOVE_USAGE), |id| Command::Remove { id }),
            _ => Command::Usage(REMOVE_USAGE),
        },
        "l" | "list" => Command::List,
        "stores" => Command::Stores,
        "r" | "reload" => Command::Reload,
        "help" | "h" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn parse_add(args: &[&str]) -> Option<Command> {
    let [world, x, z, radius] = args else {
        return None;
    };
    Some(Command::Add {
        world: (*world).to_owned(),
        x: x.parse().ok()?,
        z: z.parse().ok()?,
        radius: radius.parse().ok()?,
    })
}

fn parse_resize(args: &[&str]) -> Option<Command> {
    let [id, radius] = args else {
        return None;
    };
    Some(Command::Resize {
        id: id.parse().ok()?,
        radius: radius.parse().ok()?,
    })
}
