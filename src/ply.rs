//! PLY codec, built on the `ply-rs` crate.
//!
//! The wire format is the library's business: ASCII and both binary
//! encodings are accepted on read, ASCII is produced on write.  What this
//! module owns is the identity scheme.  PLY has no per-vertex identifiers,
//! so identity is positional: on read every vertex gets an identifier equal
//! to its 0-based position in the file, and on write face references are
//! rewritten through an identifier-to-position map built from the points
//! sequence.

use crate::Mesh;
use crate::Point;
use ply_rs::parser::Parser;
use ply_rs::ply::Addable;
use ply_rs::ply::DefaultElement;
use ply_rs::ply::ElementDef;
use ply_rs::ply::Encoding;
use ply_rs::ply::Ply;
use ply_rs::ply::Property;
use ply_rs::ply::PropertyDef;
use ply_rs::ply::PropertyType;
use ply_rs::ply::ScalarType;
use ply_rs::writer::Writer;
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// A vertex or face element lacks a required property.
    MissingProperty {
        element: &'static str,
        property: &'static str,
    },
    /// A face lists fewer than three vertices.
    BadFaceArity(usize),
    /// A face references a point identifier absent from the points sequence.
    UnmappedFaceId(i64),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingProperty { element, property } => {
                write!(f, "{} element without usable {:?} property", element, property)
            }
            Error::BadFaceArity(found) => {
                write!(f, "face lists {} vertices, expected at least 3", found)
            }
            Error::UnmappedFaceId(id) => {
                write!(f, "face references unknown point id {}", id)
            }
            Error::Io(_) => write!(f, "read/write error"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Reads a PLY mesh.
///
/// Point identifiers are synthetic: each vertex is numbered by its 0-based
/// position in the file, which is also what the face lists reference.
/// Polygons with more than three vertices are fan-triangulated.
pub fn parse<R: io::BufRead>(mut input: R) -> Result<Mesh, Error> {
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(&mut input)?;
    let payload = parser.read_payload(&mut input, &header)?;

    let mut points = Vec::new();
    if let Some(vertices) = payload.get("vertex") {
        points.reserve(vertices.len());
        for (position, vertex) in vertices.iter().enumerate() {
            points.push(Point {
                id: position as i64,
                x: float_property(vertex, "x")?,
                y: float_property(vertex, "y")?,
                z: float_property(vertex, "z")?,
            });
        }
    }

    let mut faces = Vec::new();
    if let Some(polygons) = payload.get("face") {
        faces.reserve(polygons.len());
        for polygon in polygons {
            let indices = index_list(polygon)?;
            if indices.len() < 3 {
                return Err(Error::BadFaceArity(indices.len()));
            }
            for i in 1..indices.len() - 1 {
                faces.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    Ok(Mesh::from_raw_parts(points, faces))
}

fn float_property(element: &DefaultElement, property: &'static str) -> Result<f64, Error> {
    match element.get(property) {
        Some(Property::Float(value)) => Ok(f64::from(*value)),
        Some(Property::Double(value)) => Ok(*value),
        _ => Err(Error::MissingProperty {
            element: "vertex",
            property,
        }),
    }
}

fn index_list(element: &DefaultElement) -> Result<Vec<i64>, Error> {
    for property in ["vertex_indices", "vertex_index"] {
        let list = match element.get(property) {
            Some(Property::ListChar(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            Some(Property::ListUChar(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            Some(Property::ListShort(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            Some(Property::ListUShort(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            Some(Property::ListInt(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            Some(Property::ListUInt(values)) => values.iter().map(|i| i64::from(*i)).collect(),
            _ => continue,
        };
        return Ok(list);
    }
    Err(Error::MissingProperty {
        element: "face",
        property: "vertex_indices",
    })
}

/// Writes `mesh` in ASCII PLY.
///
/// Vertices go out in sequence order, coordinates as doubles so they survive
/// unchanged.  Face references are rewritten to 0-based vertex positions; an
/// identifier that maps to no point fails the write instead of producing a
/// mis-associated face.
pub fn write<W: io::Write>(mesh: &Mesh, w: &mut W) -> Result<(), Error> {
    let position_of: HashMap<i64, i32> = mesh
        .points()
        .iter()
        .enumerate()
        .map(|(position, point)| (point.id, position as i32))
        .collect();

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for property in ["x", "y", "z"] {
        vertex_def.properties.add(PropertyDef::new(
            property.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    vertex_def.count = mesh.point_count();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.face_count();
    ply.header.elements.add(face_def);

    let mut vertices = Vec::with_capacity(mesh.point_count());
    for point in mesh.points() {
        let mut element = DefaultElement::new();
        element.insert("x".to_string(), Property::Double(point.x));
        element.insert("y".to_string(), Property::Double(point.y));
        element.insert("z".to_string(), Property::Double(point.z));
        vertices.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertices);

    let mut polygons = Vec::with_capacity(mesh.face_count());
    for face in mesh.faces() {
        let mut indices = Vec::with_capacity(3);
        for id in face {
            let position = *position_of.get(id).ok_or(Error::UnmappedFaceId(*id))?;
            indices.push(position);
        }
        let mut element = DefaultElement::new();
        element.insert("vertex_indices".to_string(), Property::ListInt(indices));
        polygons.push(element);
    }
    ply.payload.insert("face".to_string(), polygons);

    Writer::new().write_ply(w, &mut ply)?;
    Ok(())
}
