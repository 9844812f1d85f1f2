use crate::errors::{Error, Result};

use std::io::{BufReader, Read};
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::Triple;

use log::debug;

fn format_for(file: &Path) -> RdfFormat {
    let content_type = file.extension().and_then(|ext| ext.to_str());
    let content_type = content_type.and_then(|ext| match ext {
        "ttl" => Some(RdfFormat::Turtle),
        "xml" => Some(RdfFormat::RdfXml),
        "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        _ => None,
    });
    content_type.unwrap_or(RdfFormat::Turtle)
}

fn parse<R: Read>(format: RdfFormat, content: R, base: Option<&str>) -> Result<Vec<Triple>> {
    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base {
        parser = parser
            .with_base_iri(base)
            .map_err(|e| Error::Parse(format!("invalid base IRI {}: {}", base, e)))?;
    }
    let mut triples = vec![];
    for quad in parser.for_reader(content) {
        let quad = quad.map_err(|e| Error::Parse(e.to_string()))?;
        triples.push(Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(triples)
}

/// Parses a Turtle document. Relative IRIs resolve against `base` when given.
pub fn parse_turtle(content: &str, base: Option<&str>) -> Result<Vec<Triple>> {
    parse(RdfFormat::Turtle, content.as_bytes(), base)
}

/// Reads the triples of a file, picking the syntax from its extension and falling
/// back to Turtle.
pub fn read_file(file: &Path, base: Option<&str>) -> Result<Vec<Triple>> {
    debug!("Reading file: {}", file.display());
    let format = format_for(file);
    let content = BufReader::new(std::fs::File::open(file)?);
    parse(format, content, base)
}
