use std::env;
use std::io;

use ansi_term::Color;
use linefeed::{Interface, ReadResult, Terminal};
use log::{info, warn};

use crate::evaluator;
use crate::printer;

static DEFAULT_HISTORY_FILE: &str = "reckon.history";
static HISTORY_FILE_VAR: &str = "RECKON_HISTORY";
static PROMPT: &str = "reckon=> ";

/// Config carries the REPL's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub history_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: PROMPT.into(),
            history_file: DEFAULT_HISTORY_FILE.into(),
        }
    }
}

impl Config {
    /// from_env starts from the defaults and takes the history file from `RECKON_HISTORY` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var(HISTORY_FILE_VAR) {
            if !path.is_empty() {
                config.history_file = path;
            }
        }
        config
    }
}

fn configure_reader<T: Terminal>(reader: &Interface<T>, config: &Config) -> io::Result<()> {
    let mut reader = reader.lock_reader();
    reader.set_blink_matching_paren(true);

    let style = Color::Purple.bold();

    reader.set_prompt(&format!(
        "\x01{prefix}\x02{text}\x01{suffix}\x02",
        prefix = style.prefix(),
        text = config.prompt,
        suffix = style.suffix()
    ))
}

pub fn run(config: &Config) -> io::Result<()> {
    let reader = Interface::new("reckon")?;
    configure_reader(&reader, config)?;

    if let Err(e) = reader.load_history(&config.history_file) {
        if e.kind() == io::ErrorKind::NotFound {
            info!(
                "History file {} doesn't exist, not loading history.",
                config.history_file
            );
        } else {
            warn!(
                "Could not load history file {}: {}",
                config.history_file, e
            );
        }
    }

    loop {
        match reader.read_line()? {
            ReadResult::Input(input) => {
                if input.trim().is_empty() {
                    continue;
                }
                reader.add_history_unique(input.clone());
                rep(&input)?
            }
            ReadResult::Eof => {
                print!("^D");
                break;
            }
            ReadResult::Signal(signal) => {
                println!("signal: {:?}", signal);
                break;
            }
        }
    }

    if let Err(e) = reader.save_history(&config.history_file) {
        warn!(
            "Could not save history file {}: {}",
            config.history_file, e
        );
    }

    Ok(())
}

/// rep evaluates one line as its own invocation; nothing carries over to the next line.
fn rep(input: &str) -> io::Result<()> {
    match evaluator::eval(input) {
        Ok(outputs) => printer::println_to(io::stdout(), outputs.as_slice()),
        Err(e) => {
            let message = printer::describe(&e);
            println!("{}", Color::Red.paint(message));
            Ok(())
        }
    }
}
