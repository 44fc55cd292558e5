use crate::landxml::NAMESPACE;
use crate::Face;
use crate::Mesh;
use crate::Point;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::Namespace;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::error;
use std::fmt;
use std::io;
use std::num;

#[derive(Debug)]
pub enum ErrorKind {
    Xml(quick_xml::Error),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    BadInteger {
        text: String,
        source: num::ParseIntError,
    },
    BadFloat {
        text: String,
        source: num::ParseFloatError,
    },
    WrongValueCount {
        element: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    position: usize,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Xml(err) => write!(f, "malformed document: {}", err),
            ErrorKind::MissingAttribute { element, attribute } => {
                write!(f, "<{}> element without {:?} attribute", element, attribute)
            }
            ErrorKind::BadInteger { text, source } => {
                write!(f, "when parsing integer {:?}: {}", text, source)
            }
            ErrorKind::BadFloat { text, source } => {
                write!(f, "when parsing float {:?}: {}", text, source)
            }
            ErrorKind::WrongValueCount {
                element,
                expected,
                found,
            } => {
                write!(
                    f,
                    "<{}> element holds {} values, expected {}",
                    element, found, expected,
                )
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at byte {}: {}", self.position, self.kind)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Xml(err) => Some(err),
            ErrorKind::BadInteger { source, .. } => Some(source),
            ErrorKind::BadFloat { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error {
            kind: ErrorKind::Xml(err),
            position: 0,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind, position: 0 }
    }
}

fn at<E>(position: usize) -> impl Fn(E) -> Error
where
    E: Into<Error>,
{
    move |err: E| {
        let mut err = err.into();
        err.position = position;
        err
    }
}

fn in_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == NAMESPACE.as_bytes())
}

/// The element whose text content is pending.
enum Context {
    Point { id: i64 },
    Face,
}

impl Context {
    fn element(&self) -> &'static str {
        match self {
            Context::Point { .. } => "P",
            Context::Face => "F",
        }
    }
}

/// Collects every `P` and `F` element of the LandXML-1.2 namespace, whatever
/// their parent is, in document order.
pub fn parse<R: io::BufRead>(input: R) -> Result<Mesh, Error> {
    let mut xml = NsReader::from_reader(input);
    xml.config_mut().trim_text(true);

    let mut points = Vec::new();
    let mut faces = Vec::new();
    let mut context = None;
    let mut buf = Vec::new();

    loop {
        let position = xml.buffer_position() as usize;
        match xml.read_resolved_event_into(&mut buf).map_err(at(position))? {
            (ns, Event::Start(e)) if in_namespace(&ns) => match e.local_name().as_ref() {
                b"P" => {
                    let id = point_id(&e).map_err(at(position))?;
                    context = Some(Context::Point { id });
                }
                b"F" => context = Some(Context::Face),
                _ => {}
            },
            (ns, Event::Empty(e)) if in_namespace(&ns) => {
                let element = match e.local_name().as_ref() {
                    b"P" => Some("P"),
                    b"F" => Some("F"),
                    _ => None,
                };
                if let Some(element) = element {
                    return Err(at(position)(ErrorKind::WrongValueCount {
                        element,
                        expected: 3,
                        found: 0,
                    }));
                }
            }
            (_, Event::Text(text)) => {
                if let Some(context) = context.take() {
                    let text = text.unescape().map_err(at(position))?;
                    match context {
                        Context::Point { id } => {
                            points.push(parse_point(id, &text).map_err(at(position))?);
                        }
                        Context::Face => faces.push(parse_face(&text).map_err(at(position))?),
                    }
                }
            }
            (_, Event::End(_)) => {
                // A `P` or `F` that ends with its text still pending had none.
                if let Some(context) = context.take() {
                    return Err(at(position)(ErrorKind::WrongValueCount {
                        element: context.element(),
                        expected: 3,
                        found: 0,
                    }));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Mesh::from_raw_parts(points, faces))
}

fn point_id(element: &BytesStart<'_>) -> Result<i64, ErrorKind> {
    let id = element
        .try_get_attribute("id")
        .map_err(|err| ErrorKind::Xml(err.into()))?
        .ok_or(ErrorKind::MissingAttribute {
            element: "P",
            attribute: "id",
        })?;
    let text = id.unescape_value().map_err(ErrorKind::Xml)?;
    text.parse().map_err(|source| ErrorKind::BadInteger {
        text: text.clone().into_owned(),
        source,
    })
}

fn parse_point(id: i64, text: &str) -> Result<Point, ErrorKind> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() != 3 {
        return Err(ErrorKind::WrongValueCount {
            element: "P",
            expected: 3,
            found: words.len(),
        });
    }
    let mut coordinates = [0.0; 3];
    for (coordinate, word) in coordinates.iter_mut().zip(&words) {
        *coordinate = word.parse().map_err(|source| ErrorKind::BadFloat {
            text: (*word).to_owned(),
            source,
        })?;
    }
    Ok(Point {
        id,
        x: coordinates[0],
        y: coordinates[1],
        z: coordinates[2],
    })
}

fn parse_face(text: &str) -> Result<Face, ErrorKind> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() != 3 {
        return Err(ErrorKind::WrongValueCount {
            element: "F",
            expected: 3,
            found: words.len(),
        });
    }
    let mut face = [0; 3];
    for (vertex, word) in face.iter_mut().zip(&words) {
        *vertex = word.parse().map_err(|source| ErrorKind::BadInteger {
            text: (*word).to_owned(),
            source,
        })?;
    }
    Ok(face)
}
