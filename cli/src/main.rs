mod pets;
mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use decoder::{DecodeError, EvaluationContext};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];
const GLOBAL_FLAGS: &[&str] = &["--no-color", "-v", "--verbose"];
const DEFAULT_FILE: &str = "pets.hcl";

#[derive(Parser)]
#[command(name = "pet-sounds", version, about = "Reads a pet configuration and lets every pet speak and act")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log decoding steps to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a pet configuration and perform every pet
    Run(RunArgs),

    /// Run .test.hcl fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// The file to read pet configuration from
    #[arg(short, long, default_value = DEFAULT_FILE)]
    file: String,

    /// Seed for the random functions, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Parse and decode only, don't perform (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed AST
    #[arg(long)]
    ast: bool,

    /// List decoded pets and their types
    #[arg(long)]
    list: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.hcl file or directory containing them
    path: String,
}

fn main() {
    // `pet-sounds -f pets.hcl` works like `pet-sounds run -f pets.hcl`
    let mut args: Vec<String> = std::env::args().collect();
    let first = args
        .iter()
        .skip(1)
        .position(|a| !GLOBAL_FLAGS.contains(&a.as_str()))
        .map(|i| i + 1);
    let implied_run = match first.map(|i| args[i].as_str()) {
        None => true,
        Some("-h" | "--help" | "-V" | "--version") => false,
        Some(first) => !SUBCOMMANDS.contains(&first),
    };
    if implied_run {
        args.insert(first.unwrap_or(args.len()), "run".to_string());
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let exit_code = test_runner::run_tests(Path::new(&test_args.path), cli.no_color);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("pet-sounds error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = hclite::parser::Parser::new(source, file_id);
    let document = match parser.parse() {
        Ok(d) => d,
        Err(errors) => {
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    if args.ast {
        println!("{:#?}", document);
        return;
    }

    let mut builder = EvaluationContext::builder().environment(std::env::vars());
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let context = builder.build();

    let pets = match decoder::decode(&document, &context) {
        Ok(pets) => pets,
        Err(error) => {
            emit_decode_error(&writer, &config, &files, file_id, &error);
            process::exit(1);
        }
    };
    debug!(file = %args.file, pets = pets.len(), "configuration decoded");

    if args.check {
        eprintln!("ok: {} decoded {} pet(s)", args.file, pets.len());
        return;
    }

    if args.list {
        for pet in &pets {
            println!("{} ({})", pet.label(), pet.kind());
        }
        return;
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = pets::perform(&pets, &mut stdout) {
        eprintln!("pet-sounds error: {}", e);
        process::exit(1);
    }
}

fn emit_decode_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    file_id: usize,
    error: &DecodeError,
) {
    let mut diagnostic = Diagnostic::error()
        .with_message(error.to_string())
        .with_labels(vec![Label::primary(file_id, error.span().clone())]);
    if let DecodeError::UnknownVariant { .. } = error {
        let known = decoder::SchemaRegistry::builtin().discriminators().join(", ");
        diagnostic = diagnostic.with_notes(vec![format!("known types: {}", known)]);
    }
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
}
