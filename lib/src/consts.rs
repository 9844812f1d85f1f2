//! Defines constant NamedNodeRefs for the RDF terms a solidoc page is built from,
//! primarily from RDF, DCTERMS and the solidoc (sdoc) vocabulary.

use oxigraph::model::NamedNodeRef;

pub const TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
// dcterms
pub const TITLE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title");

// sdoc properties
pub const FIRST_CHILD: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#firstChild");
pub const NEXT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#nextNode");
pub const TEXT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#text");
pub const OPTIONS: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#options");

// sdoc node types
pub const ROOT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#Root");
pub const LEAF: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#Leaf");
pub const BRANCH: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#Branch");
pub const PARAGRAPH: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#Paragraph");
pub const NUMBERED_LIST: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.solidoc.net/ontologies#NumberedList");

/// Predicates that encode tree structure. They never appear in a node's
/// representation and cannot be written through `set_node`.
pub const STRUCTURAL_PREDICATES: [NamedNodeRef<'_>; 2] = [FIRST_CHILD, NEXT];

// keys of a node representation that are not predicate aliases
pub const ID_KEY: &str = "id";
pub const CHILDREN_KEY: &str = "children";
