use std::path::PathBuf;

use clap::Parser;

use luo::driver::{self, Settings};
use luo::LuoError;

#[derive(Debug, Parser)]
#[command(version, about = "Front end for the Luo language")]
struct CmdOpts {
    /// Luo source file
    script: PathBuf,

    /// Print every token with its position.
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree.
    #[arg(long)]
    dump_ast: bool,

    /// Print the resolved objects and type annotations.
    #[arg(long)]
    dump_objects: bool,

    /// Render errors with a source snippet.
    #[arg(long)]
    fancy: bool,
}

fn main() {
    let opts = CmdOpts::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    driver::set_settings(Settings {
        dump_tokens: opts.dump_tokens,
        dump_ast: opts.dump_ast,
        dump_objects: opts.dump_objects,
        fancy_errors: opts.fancy,
    });

    if let Err(e) = driver::run_file(&opts.script) {
        let exit_code = e.kind().exit_code();
        match e {
            LuoError::Compile(diagnostic) if opts.fancy => {
                eprintln!("{:?}", miette::Report::new(diagnostic))
            }
            e => eprintln!("{e:#}"),
        }
        std::process::exit(exit_code);
    }
}
