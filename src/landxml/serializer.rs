use crate::landxml::NAMESPACE;
use crate::Mesh;
use itertools::Itertools as _;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io;

const SCHEMA_LOCATION: &str =
    "http://www.landxml.org/schema/LandXML-1.2 http://www.landxml.org/schema/LandXML-1.2/LandXML-1.2.xsd";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Serializes `mesh` as a LandXML-1.2 surface definition.
///
/// The document is emitted to `w` in one pass; callers that care about write
/// amplification hand in an in-memory buffer and flush it whole.  Every
/// coordinate is written with exactly `precision` decimal places; `project`
/// names the `Project` element.
pub fn write<W: io::Write>(mesh: &Mesh, w: W, precision: usize, project: &str) -> io::Result<()> {
    let now = chrono::Local::now();
    let mut xml = Writer::new(w);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("LandXML");
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    root.push_attribute(("xmlns", NAMESPACE));
    root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    root.push_attribute(("version", "1.2"));
    root.push_attribute(("date", now.format("%Y-%m-%d").to_string().as_str()));
    root.push_attribute(("time", now.format("%H:%M:%S").to_string().as_str()));
    xml.write_event(Event::Start(root))?;

    xml.write_event(Event::Start(BytesStart::new("Units")))?;
    let mut metric = BytesStart::new("Metric");
    metric.push_attribute(("areaUnit", "squareMeter"));
    metric.push_attribute(("linearUnit", "meter"));
    metric.push_attribute(("volumeUnit", "cubicMeter"));
    metric.push_attribute(("temperatureUnit", "celsius"));
    metric.push_attribute(("pressureUnit", "HPA"));
    xml.write_event(Event::Empty(metric))?;
    xml.write_event(Event::End(BytesEnd::new("Units")))?;

    let mut project_element = BytesStart::new("Project");
    project_element.push_attribute(("name", project));
    xml.write_event(Event::Empty(project_element))?;

    let mut application = BytesStart::new("Application");
    application.push_attribute(("name", "tin-io"));
    application.push_attribute(("version", env!("CARGO_PKG_VERSION")));
    application.push_attribute(("manufacturer", "tin-io"));
    xml.write_event(Event::Empty(application))?;

    xml.write_event(Event::Start(BytesStart::new("Surfaces")))?;
    let mut surface = BytesStart::new("Surface");
    surface.push_attribute(("name", "Surface"));
    xml.write_event(Event::Start(surface))?;
    let mut definition = BytesStart::new("Definition");
    definition.push_attribute(("surfType", "TIN"));
    xml.write_event(Event::Start(definition))?;

    xml.write_event(Event::Start(BytesStart::new("Pnts")))?;
    for point in mesh.points() {
        let mut p = BytesStart::new("P");
        p.push_attribute(("id", point.id.to_string().as_str()));
        xml.write_event(Event::Start(p))?;
        let coordinates = format!(
            "{:.precision$} {:.precision$} {:.precision$}",
            point.x, point.y, point.z,
        );
        xml.write_event(Event::Text(BytesText::new(&coordinates)))?;
        xml.write_event(Event::End(BytesEnd::new("P")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("Pnts")))?;

    xml.write_event(Event::Start(BytesStart::new("Faces")))?;
    for face in mesh.faces() {
        let vertices = face.iter().format(" ").to_string();
        xml.write_event(Event::Start(BytesStart::new("F")))?;
        xml.write_event(Event::Text(BytesText::new(&vertices)))?;
        xml.write_event(Event::End(BytesEnd::new("F")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("Faces")))?;

    xml.write_event(Event::End(BytesEnd::new("Definition")))?;
    xml.write_event(Event::End(BytesEnd::new("Surface")))?;
    xml.write_event(Event::End(BytesEnd::new("Surfaces")))?;
    xml.write_event(Event::End(BytesEnd::new("LandXML")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use crate::Point;
    use proptest::prelude::*;

    #[test]
    fn fixed_point_blocks() {
        let mesh = Mesh::from_raw_parts(
            vec![
                Point { id: 1, x: 0.12345, y: 1.0, z: 2.0 },
                Point { id: 2, x: 3.0, y: 4.0, z: 5.0 },
            ],
            vec![[1, 2, 1]],
        );
        let mut buffer = Vec::new();
        write(&mesh, &mut buffer, 2, "surface").unwrap();
        let document = String::from_utf8(buffer).unwrap();
        assert!(document.contains(r#"<P id="1">0.12 1.00 2.00</P><P id="2">3.00 4.00 5.00</P>"#));
        assert!(document.contains("<F>1 2 1</F>"));
    }

    #[test]
    fn skeleton() {
        let mut buffer = Vec::new();
        write(&Mesh::new(), &mut buffer, 4, "empty").unwrap();
        let document = String::from_utf8(buffer).unwrap();
        assert!(document.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(document.contains(r#"xmlns="http://www.landxml.org/schema/LandXML-1.2""#));
        assert!(document.contains(r#"version="1.2""#));
        assert!(document.contains(
            r#"<Metric areaUnit="squareMeter" linearUnit="meter" volumeUnit="cubicMeter" temperatureUnit="celsius" pressureUnit="HPA"/>"#
        ));
        assert!(document.contains(r#"<Project name="empty"/>"#));
        assert!(document
            .contains(r#"<Definition surfType="TIN"><Pnts></Pnts><Faces></Faces></Definition>"#));
    }

    #[test]
    fn precision_pads_integral_values() {
        let mesh = Mesh::from_raw_parts(
            vec![Point { id: 1, x: 3.0, y: 4.0, z: 5.0 }],
            Vec::new(),
        );
        let mut buffer = Vec::new();
        write(&mesh, &mut buffer, 6, "surface").unwrap();
        let document = String::from_utf8(buffer).unwrap();
        assert!(document.contains(r#"<P id="1">3.000000 4.000000 5.000000</P>"#));
    }

    #[test]
    fn roundtrip_preserves_ids_and_order() {
        let mesh = Mesh::from_raw_parts(
            vec![
                Point { id: 42, x: 1.5, y: -2.25, z: 1000.0 },
                Point { id: 7, x: 0.0, y: 0.5, z: -0.125 },
            ],
            vec![[42, 7, 42], [7, 42, 7]],
        );
        let mut buffer = Vec::new();
        write(&mesh, &mut buffer, 4, "surface").unwrap();
        let reloaded = parse(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.points(), mesh.points());
        assert_eq!(reloaded.faces(), mesh.faces());
    }

    #[test]
    fn empty_mesh_roundtrip() {
        let mut buffer = Vec::new();
        write(&Mesh::new(), &mut buffer, 4, "surface").unwrap();
        let reloaded = parse(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.point_count(), 0);
        assert_eq!(reloaded.face_count(), 0);
    }

    proptest! {
        #[test]
        fn roundtrip_within_precision(
            raw in prop::collection::vec(
                (any::<i64>(), -1.0e6..1.0e6f64, -1.0e6..1.0e6f64, -1.0e6..1.0e6f64),
                0..40,
            ),
        ) {
            let points: Vec<Point> = raw
                .into_iter()
                .map(|(id, x, y, z)| Point { id, x, y, z })
                .collect();
            let faces: Vec<_> = points
                .windows(3)
                .map(|w| [w[0].id, w[1].id, w[2].id])
                .collect();
            let mesh = Mesh::from_raw_parts(points, faces);

            let mut buffer = Vec::new();
            write(&mesh, &mut buffer, 4, "surface").unwrap();
            let reloaded = parse(buffer.as_slice()).unwrap();

            prop_assert_eq!(reloaded.faces(), mesh.faces());
            prop_assert_eq!(reloaded.point_count(), mesh.point_count());
            for (before, after) in mesh.points().iter().zip(reloaded.points()) {
                prop_assert_eq!(before.id, after.id);
                prop_assert!((before.x - after.x).abs() <= 1.0e-4);
                prop_assert!((before.y - after.y).abs() <= 1.0e-4);
                prop_assert!((before.z - after.z).abs() <= 1.0e-4);
            }
        }
    }
}
