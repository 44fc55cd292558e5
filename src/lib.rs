//! (De)serializing library for triangulated surface meshes.
//!
//! Two formats are supported:
//!
//! - LandXML-1.2 surface definitions (`.xml`), read and written by the
//!   [`landxml`] module,
//! - PLY (`.ply`), delegated to the `ply-rs` crate and available behind the
//!   `ply` feature (enabled by default).
//!
//! A [`Mesh`] is an ordered sequence of identified points plus an ordered
//! sequence of triangles referencing those identifiers.  Both codecs preserve
//! file order, so loading and writing through the same format keeps points
//! and faces where they were.
//!
//! ```no_run
//! use tin_io::Format;
//! use tin_io::Mesh;
//!
//! # fn main() -> Result<(), tin_io::Error> {
//! let mesh = Mesh::from_file("surface.xml")?;
//! Format::Ply.write_file(&mesh, "surface.ply", tin_io::DEFAULT_PRECISION)?;
//! # Ok(())
//! # }
//! ```

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

pub mod landxml;
#[cfg(feature = "ply")]
pub mod ply;

pub use landxml::ParseError;

/// Number of decimal places written for textual coordinates unless the
/// caller asks otherwise.
pub const DEFAULT_PRECISION: usize = 4;

#[derive(Debug)]
pub enum Error {
    /// The source path does not exist.
    NotFound(PathBuf),
    /// The path does not carry the extension the codec expects.
    FormatMismatch {
        path: PathBuf,
        expected: &'static str,
    },
    /// The path's extension matches no supported format.
    UnknownFormat(PathBuf),
    LandXml(landxml::ParseError),
    #[cfg(feature = "ply")]
    Ply(ply::Error),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Error::FormatMismatch { path, expected } => {
                write!(f, "{}: expected a .{} file", path.display(), expected)
            }
            Error::UnknownFormat(path) => {
                write!(f, "{}: unrecognized file extension", path.display())
            }
            Error::LandXml(err) => write!(f, "invalid LandXML: {}", err),
            #[cfg(feature = "ply")]
            Error::Ply(err) => write!(f, "invalid PLY: {}", err),
            Error::Io(_) => write!(f, "read/write error"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LandXml(err) => Some(err),
            #[cfg(feature = "ply")]
            Error::Ply(err) => Some(err),
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

impl From<landxml::ParseError> for Error {
    fn from(err: landxml::ParseError) -> Error {
        Error::LandXml(err)
    }
}

#[cfg(feature = "ply")]
impl From<ply::Error> for Error {
    fn from(err: ply::Error) -> Error {
        Error::Ply(err)
    }
}

/// A surface point.
///
/// The identifier comes from the source file and is not required to be
/// contiguous nor zero-based.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A triangle: three point identifiers, in the winding order of the source.
pub type Face = [i64; 3];

/// Triangulated surface data structure.
///
/// It stores the points and the triangles of a single surface, in file
/// order.  Face references are not checked against the points sequence;
/// only the PLY encoder, which must dereference them, reports unknown
/// identifiers.
#[derive(Default, Debug)]
pub struct Mesh {
    points: Vec<Point>,
    faces: Vec<Face>,
}

impl Mesh {
    /// An empty mesh.  Every call allocates its own containers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw_parts(points: Vec<Point>, faces: Vec<Face>) -> Self {
        Self { points, faces }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Returns the number of points of the mesh.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of triangles of the mesh.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Reads a mesh from `path`, inferring the format from the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Mesh, Error> {
        let path = path.as_ref();
        let format =
            Format::from_path(path).ok_or_else(|| Error::UnknownFormat(path.to_path_buf()))?;
        format.read_file(path)
    }
}

/// A supported file format.
///
/// Each variant is a codec: it can check a path's extension, decode a file
/// into a [`Mesh`] and encode a [`Mesh`] back out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// LandXML-1.2 surface definition.
    LandXml,
    /// Polygon File Format.
    #[cfg(feature = "ply")]
    Ply,
}

impl Format {
    /// Detects the format from a path's extension, case-insensitively.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let extension = path.as_ref().extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("xml") {
            return Some(Format::LandXml);
        }
        #[cfg(feature = "ply")]
        if extension.eq_ignore_ascii_case("ply") {
            return Some(Format::Ply);
        }
        None
    }

    /// The extension expected of source files, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::LandXml => "xml",
            #[cfg(feature = "ply")]
            Format::Ply => "ply",
        }
    }

    /// Fails with [`Error::FormatMismatch`] unless `path` carries this
    /// format's extension.
    pub fn check_extension(self, path: &Path) -> Result<(), Error> {
        match Format::from_path(path) {
            Some(format) if format == self => Ok(()),
            _ => Err(Error::FormatMismatch {
                path: path.to_path_buf(),
                expected: self.extension(),
            }),
        }
    }

    /// Reads a mesh from `path`.
    ///
    /// The path must exist and carry this format's extension; either gate
    /// fails before anything is read.
    pub fn read_file<P: AsRef<Path>>(self, path: P) -> Result<Mesh, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        self.check_extension(path)?;

        let file = fs::File::open(path)?;
        let reader = io::BufReader::new(file);
        let mesh = match self {
            Format::LandXml => landxml::parse(reader)?,
            #[cfg(feature = "ply")]
            Format::Ply => ply::parse(reader)?,
        };
        tracing::debug!(
            points = mesh.point_count(),
            faces = mesh.face_count(),
            "loaded {}",
            path.display(),
        );
        Ok(mesh)
    }

    /// Writes `mesh` to `path`.
    ///
    /// `precision` is the number of decimal places used for textual
    /// coordinate output; formats without textual coordinates ignore it.
    /// The LandXML writer appends `.xml` to `path` unconditionally, even
    /// when the path already ends in it.
    pub fn write_file<P: AsRef<Path>>(
        self,
        mesh: &Mesh,
        path: P,
        precision: usize,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        match self {
            Format::LandXml => {
                let project = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
                let mut contents = Vec::new();
                landxml::write(mesh, &mut contents, precision, project)?;

                let mut destination = path.as_os_str().to_owned();
                destination.push(".xml");
                let destination = PathBuf::from(destination);
                // One write for the whole document.
                fs::write(&destination, contents)?;
                tracing::debug!(
                    points = mesh.point_count(),
                    faces = mesh.face_count(),
                    "wrote {}",
                    destination.display(),
                );
            }
            #[cfg(feature = "ply")]
            Format::Ply => {
                let file = fs::File::create(path)?;
                let mut writer = io::BufWriter::new(file);
                ply::write(mesh, &mut writer)?;
                writer.into_inner().map_err(io::IntoInnerError::into_error)?;
                tracing::debug!(
                    points = mesh.point_count(),
                    faces = mesh.face_count(),
                    "wrote {}",
                    path.display(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path() {
        assert_eq!(Format::from_path("surface.xml"), Some(Format::LandXml));
        assert_eq!(Format::from_path("surface.XML"), Some(Format::LandXml));
        #[cfg(feature = "ply")]
        assert_eq!(Format::from_path("surface.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("surface.obj"), None);
        assert_eq!(Format::from_path("surface"), None);
    }

    #[test]
    fn extension_gate() {
        let err = Format::LandXml
            .check_extension(Path::new("surface.ply"))
            .unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { expected: "xml", .. }));
    }

    #[test]
    fn missing_file_gate() {
        let dir = tempfile::tempdir().unwrap();
        let err = Format::LandXml
            .read_file(dir.path().join("missing.xml"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn extension_gate_precedes_parsing() {
        // A file that exists under the wrong extension trips the extension
        // gate, not the parser.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.txt");
        fs::write(&path, "not a mesh").unwrap();
        let err = Format::LandXml.read_file(&path).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { .. }));
    }

    #[test]
    fn unknown_format() {
        let err = Mesh::from_file("surface.stl").unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(_)));
    }

    #[test]
    fn point_count_is_derived() {
        let mesh = Mesh::from_raw_parts(
            vec![Point { id: 7, x: 0.0, y: 0.0, z: 0.0 }],
            Vec::new(),
        );
        assert_eq!(mesh.point_count(), 1);
        assert_eq!(Mesh::new().point_count(), 0);
    }

    #[test]
    fn landxml_write_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = Mesh::from_raw_parts(
            vec![
                Point { id: 1, x: 0.5, y: 1.0, z: 2.0 },
                Point { id: 2, x: 3.0, y: 4.0, z: 5.0 },
                Point { id: 3, x: 6.0, y: 7.0, z: 8.0 },
            ],
            vec![[1, 2, 3]],
        );

        let destination = dir.path().join("surface");
        Format::LandXml
            .write_file(&mesh, &destination, DEFAULT_PRECISION)
            .unwrap();

        let written = dir.path().join("surface.xml");
        assert!(written.is_file());
        let reloaded = Mesh::from_file(&written).unwrap();
        assert_eq!(reloaded.points(), mesh.points());
        assert_eq!(reloaded.faces(), mesh.faces());
    }

    #[test]
    fn landxml_write_duplicates_existing_suffix() {
        // The suffix is appended even when the path already carries it.
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("surface.xml");
        Format::LandXml
            .write_file(&Mesh::new(), &destination, DEFAULT_PRECISION)
            .unwrap();
        assert!(dir.path().join("surface.xml.xml").is_file());
    }

    #[cfg(feature = "ply")]
    #[test]
    fn ply_write_uses_exact_path() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = Mesh::from_raw_parts(
            vec![
                Point { id: 0, x: 0.0, y: 0.0, z: 0.0 },
                Point { id: 1, x: 1.0, y: 0.0, z: 0.0 },
                Point { id: 2, x: 0.0, y: 1.0, z: 0.0 },
            ],
            vec![[0, 1, 2]],
        );

        let path = dir.path().join("surface.ply");
        Format::Ply.write_file(&mesh, &path, DEFAULT_PRECISION).unwrap();
        assert!(path.is_file());

        let reloaded = Mesh::from_file(&path).unwrap();
        assert_eq!(reloaded.points(), mesh.points());
        assert_eq!(reloaded.faces(), mesh.faces());
    }
}
