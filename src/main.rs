use clap::{Parser as ClapParser, Subcommand};
use expression_language::{
    ExpressionLanguage,
    cli::{self, CliError, CompileOptions, EvaluateOptions},
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "expr")]
#[command(about = "Evaluate expressions or compile them to PHP source")]
#[command(version)]
struct Cli {
    /// Log parsing and cache activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression, printing the result as JSON
    Evaluate {
        /// The expression to evaluate
        expression: String,

        /// JSON object of variables (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Bind JSON objects as objects (`user.name`) rather than arrays (`user["name"]`)
        #[arg(long)]
        objects: bool,
    },

    /// Compile an expression to PHP source
    Compile {
        /// The expression to compile
        expression: String,

        /// Permitted variable, `name` or `alias=name` (repeatable)
        #[arg(short, long = "name")]
        names: Vec<String>,
    },

    /// Check an expression without evaluating it
    Lint {
        /// The expression to check
        expression: String,

        /// Permitted variable, `name` or `alias=name`; any variable is accepted when omitted
        #[arg(short, long = "name")]
        names: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let language = ExpressionLanguage::new();
    let result = match cli.command {
        Commands::Evaluate {
            expression,
            input,
            pretty,
            objects,
        } => run_evaluate(&language, expression, input, pretty, objects),
        Commands::Compile { expression, names } => {
            cli::execute_compile(&language, &CompileOptions { expression, names }).map(|source| {
                println!("{}", source);
            })
        }
        Commands::Lint { expression, names } => {
            cli::execute_lint(&language, &CompileOptions { expression, names }).map(|()| {
                println!("Syntax is valid");
            })
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run_evaluate(
    language: &ExpressionLanguage,
    expression: String,
    input: Option<String>,
    pretty: bool,
    objects: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvaluateOptions {
        expression,
        input,
        objects,
    };

    let output = cli::execute_evaluate(language, &options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
