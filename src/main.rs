//! Spritelink - command-line scene replay for the sprite connection core

use std::process::ExitCode;

use spritelink::cli;

fn main() -> ExitCode {
    cli::run()
}
