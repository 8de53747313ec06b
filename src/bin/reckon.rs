use std::env;
use std::io;
use std::process;

use itertools::Itertools;

use reckon::printer;
use reckon::repl::{self, Config};

fn main() -> io::Result<()> {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return repl::run(&Config::from_env());
    }

    let input = args.iter().join(" ");
    match reckon::eval(&input) {
        Ok(outputs) => printer::println_to(io::stdout(), &outputs),
        Err(e) => {
            printer::print_error_to(io::stderr(), &e)?;
            process::exit(1);
        }
    }
}
