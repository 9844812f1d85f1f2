//! Document tree and triple store diffing for solidoc pages.
//!
//! A [`Page`] is hydrated from the triples of one named graph, edited through
//! [`Operation`]s, and turned back into a SPARQL update holding only what changed.

pub mod config;
pub mod consts;
pub mod errors;
pub mod graph;
pub mod node;
pub mod ontology;
pub mod operation;
pub mod page;
pub mod predicate;
pub mod subject;
pub mod util;

pub use crate::config::{Config, PredicateConfig};
pub use crate::errors::{Error, Result};
pub use crate::graph::Graph;
pub use crate::node::{NodeClass, NodeKind};
pub use crate::ontology::Ontology;
pub use crate::operation::{Operation, Path};
pub use crate::page::Page;
pub use crate::predicate::{JsonMap, Predicate, Value, ValueKind};
pub use crate::subject::Subject;

/// Initializes logging for the solidoc library.
///
/// This function checks for the `SOLIDOC_LOG` environment variable. If it is set,
/// `RUST_LOG` is set to its value. `SOLIDOC_LOG` takes precedence over `RUST_LOG`.
/// The logger initialization (e.g., `env_logger::init()`) must be called after
/// this function for the log level to take effect.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("SOLIDOC_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
