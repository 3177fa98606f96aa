//! Rovar Compiler Front End
//!
//! Turns Rovar source text into a validated syntax tree: lexical analysis,
//! recursive-descent parsing, and semantic analysis. Code generation is a
//! downstream consumer of the validated tree and is not part of this
//! binary.

mod feedback;
mod frontend;
mod utils;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;

use feedback::DiagnosticReport;
use frontend::ast::{Node, NodeKind};
use frontend::parser::Parser as RovarParser;
use frontend::semantic::SemanticAnalyzer;
use utils::Diagnostic;

/// Rovar Compiler Front End
#[derive(Parser, Debug)]
#[command(name = "rovarc")]
#[command(author = "Dogwalker-kryt")]
#[command(version = "0.1.0")]
#[command(about = "Rovar compiler - lexer, parser, and semantic analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.rov)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the syntax tree after parsing
    #[arg(long, global = true)]
    dump_ast: bool,

    /// Report the failing diagnostic as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the front end without requiring an entry point
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Check { input }) => run_front_end(input, &cli, false),
        Some(Commands::Version) => {
            println!("rovarc 0.1.0");
            println!("Rovar Compiler Front End");
            println!("License: MIT");
            return;
        }
        None => match &cli.input {
            Some(input) => run_front_end(input, &cli, true),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: rovarc <FILE> or rovarc check <FILE>");
                process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Run lexer, parser, and semantic analyzer over one source file,
/// reporting the first diagnostic and stopping there.
fn run_front_end(input: &Path, cli: &Cli, require_entry: bool) -> anyhow::Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;
    debug!("compiling {}", input.display());

    let mut parser = RovarParser::new(&source);
    let root = match parser.parse_program() {
        Ok(root) => root,
        Err(diagnostic) => {
            report(&diagnostic, cli);
            process::exit(1);
        }
    };

    if cli.dump_ast {
        print!("{}", root.dump());
    }

    let mut analyzer = SemanticAnalyzer::new();
    if let Err(diagnostic) = analyzer.analyze(&root) {
        report(&diagnostic, cli);
        process::exit(1);
    }

    // Entry-point lookup is layered after analysis; it reads the tree but
    // is not a language rule.
    if require_entry && !has_entry_point(&root) {
        eprintln!("Error: No 'main' function found");
        process::exit(1);
    }

    // The validated tree is what a code generator would now consume.
    println!("Compile OK");
    Ok(())
}

/// Render a diagnostic for humans, or as JSON when requested.
fn report(diagnostic: &Diagnostic, cli: &Cli) {
    if cli.json {
        println!("{}", DiagnosticReport::from(diagnostic).to_json());
    } else {
        eprintln!("Error: {}", diagnostic.render());
    }
}

/// Whether the tree contains a node named `main`, as an identifier
/// reference or a declaration.
fn has_entry_point(root: &Node) -> bool {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if matches!(node.kind, NodeKind::Identifier | NodeKind::VarDecl)
            && node.text.as_deref() == Some("main")
        {
            return true;
        }
        if let Some(left) = node.left.as_deref() {
            stack.push(left);
        }
        if let Some(right) = node.right.as_deref() {
            stack.push(right);
        }
    }
    false
}
