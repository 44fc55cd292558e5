//! This module allows to load and save LandXML-1.2 surface definitions, as
//! published at <http://www.landxml.org/>.
//!
//! Only the triangulated surface data is understood: `P` (point) and `F`
//! (face) elements bound to the LandXML-1.2 namespace, wherever the document
//! tree puts them.  Everything else is skipped on read and written back as
//! the fixed skeleton required by the schema.

pub use parser::parse;
pub use parser::Error as ParseError;
pub use serializer::write;

mod parser;
mod serializer;

/// XML namespace the elements of interest are bound to.
pub const NAMESPACE: &str = "http://www.landxml.org/schema/LandXML-1.2";
