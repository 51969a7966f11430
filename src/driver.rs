//! Runs the front end over one source file and prints the requested dumps.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use tracing::debug;

use crate::ast::{self, Chunk};
use crate::lexer::Lexer;
use crate::resolver::Resolver;
use crate::{LuoError, SourceDiagnostic};

#[derive(Copy, Clone, Debug, Default)]
pub struct Settings {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_objects: bool,
    pub fancy_errors: bool,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn set_settings(settings: Settings) {
    SETTINGS
        .set(settings)
        .expect("Can't set settings more than once.");
}

pub fn get_settings() -> Settings {
    SETTINGS.get().copied().unwrap_or_default()
}

pub fn run_file(path: impl AsRef<Path>) -> Result<(), LuoError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file '{}'.", path.display()))?;
    let output = compile(&path.display().to_string(), &source, get_settings())?;
    std::io::stdout()
        .lock()
        .write_all(output.as_bytes())
        .context("Failed to write output.")?;
    Ok(())
}

/// Runs every phase over `source` and returns the dumps `settings` asks for.
pub fn compile(name: &str, source: &str, settings: Settings) -> Result<String, LuoError> {
    let located = |diagnostic: SourceDiagnostic| {
        if settings.fancy_errors {
            diagnostic.with_source(name, source)
        } else {
            diagnostic
        }
    };

    let mut output = String::new();
    let lexer = Lexer::tokenize(source).map_err(|e| located(SourceDiagnostic::lex(&e)))?;
    if settings.dump_tokens {
        dump_tokens(&lexer, &mut output);
    }

    let chunk = ast::parse(&lexer).map_err(|e| located(SourceDiagnostic::parse(&lexer, &e)))?;
    if settings.dump_ast {
        dump_ast(&chunk, &mut output);
    }

    let chunks = [chunk];
    let resolver =
        Resolver::resolve(&chunks).map_err(|e| located(SourceDiagnostic::resolve(&lexer, &e)))?;
    if settings.dump_objects {
        dump_objects(&lexer, &resolver, &mut output);
    }
    debug!(
        tokens = lexer.len(),
        objects = resolver.objects().count(),
        "compiled {name}"
    );
    Ok(output)
}

fn dump_tokens(lexer: &Lexer, output: &mut String) {
    for (index, token) in lexer {
        let _ = writeln!(output, "{} {}", lexer.position(index), token);
    }
}

fn dump_ast(chunk: &Chunk, output: &mut String) {
    let _ = writeln!(output, "{chunk:#?}");
}

fn dump_objects(lexer: &Lexer, resolver: &Resolver, output: &mut String) {
    for (id, _) in resolver.objects() {
        let _ = writeln!(output, "{}", resolver.summary(id));
    }
    for (at, ty) in resolver.annotations(0) {
        let _ = writeln!(output, "{} {}", lexer.position(at), ty.display(resolver));
    }
}
