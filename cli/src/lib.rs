use anyhow::{Error, Result};
use clap::{Parser, Subcommand};
use log::info;
use solidoc::{Config, Ontology, Operation, Page};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "solidoc")]
#[command(about = "Inspect solidoc pages and preview their update statements")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Ontology table (JSON) to use instead of the built-in solidoc vocabulary
    #[clap(long, global = true)]
    ontology: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the version of the solidoc binary
    Version,
    /// Loads a page from an RDF file and prints its tree as JSON
    Show {
        /// The IRI of the page, i.e. its root node and named graph
        id: String,
        /// The file holding the triples of the page
        file: PathBuf,
    },
    /// Applies a JSON list of operations to a page and prints the resulting update statement
    Apply {
        /// The IRI of the page, i.e. its root node and named graph
        id: String,
        /// The file holding the triples of the page
        file: PathBuf,
        /// The file holding the JSON array of operations
        operations: PathBuf,
        /// Commit after applying and print the tree as it is then persisted
        #[clap(long, action, default_value = "false")]
        commit: bool,
    },
    /// Prints the ontology table, or writes it to a file
    Ontology {
        /// The file to write the ontology table to
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    solidoc::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    solidoc::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading ontology table from {}", path.display());
            Config::from_file(path)
        }
        None => Ok(Config::default()),
    }
}

fn load_page(id: &str, file: &Path, ontology: Arc<Ontology>) -> Result<Page> {
    let triples = solidoc::util::read_file(file, Some(id))?;
    info!("Read {} triples from {}", triples.len(), file.display());
    Ok(Page::from_triples(id, ontology, &triples)?)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if SOLIDOC_LOG is present.
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        // Default to warn if nothing is set
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let config = load_config(cmd.ontology.as_deref())?;
    if cmd.debug {
        config.print();
    }

    match cmd.command {
        Commands::Version => {
            println!("solidoc {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Show { id, file } => {
            let ontology = Arc::new(Ontology::from_config(&config)?);
            let page = load_page(&id, &file, ontology)?;
            println!("{}", serde_json::to_string_pretty(&page.to_representation()?)?);
        }
        Commands::Apply {
            id,
            file,
            operations,
            commit,
        } => {
            let ontology = Arc::new(Ontology::from_config(&config)?);
            let mut page = load_page(&id, &file, ontology)?;
            let content = std::fs::read_to_string(&operations)?;
            let ops: Vec<Operation> = serde_json::from_str(&content)?;
            info!("Applying {} operations to {}", ops.len(), id);
            page.apply_all(&ops)?;
            print!("{}", page.update_statement()?);
            if commit {
                page.commit()?;
                println!("{}", serde_json::to_string_pretty(&page.to_representation()?)?);
            }
        }
        Commands::Ontology { output } => match output {
            Some(path) => {
                config.save_to_file(&path)?;
                println!("Wrote ontology table to {}", path.display());
            }
            None => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}
