//! XFDF-like markup codec.
//!
//! Wire format (a subset of Adobe XFDF):
//!
//! ```xml
//! <xfdf xmlns="http://ns.adobe.com/xfdf/">
//!   <fields />
//!   <add>
//!     <square page="0" color="#E44234" width="2" rect="10,10,50,50" />
//!     <highlight page="0" color="#FFFF00" width="1" rect="..." />
//!     <polygon page="0" color="..." width="..."><vertices>x,y; x,y; x,y</vertices></polygon>
//!     <ink page="0" color="..." width="..."><vertices>x,y; x,y</vertices></ink>
//!     <text page="0" color="..." x="..." y="..." contents="..." />
//!   </add>
//!   <modify />
//!   <delete />
//! </xfdf>
//! ```
//!
//! Pages are 0-based on the wire and 1-based in the model. The format carries
//! no identity, so IDs are synthesized from element order on every parse.

use crate::annotation::{
    Annotation, AnnotationError, AnnotationSet, InkStroke, Note, Polygon, RectAnnotation, RectKind,
    is_xml_char,
};
use crate::color::{DEFAULT_COLOR, color_or};
use kurbo::Point;
use roxmltree::Node;
use std::fmt::Write;
use thiserror::Error;

/// Namespace written on the root element.
pub const XFDF_NAMESPACE: &str = "http://ns.adobe.com/xfdf/";

/// Stroke width assumed when an element does not carry one.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// The markup as a whole could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkupError {
    #[error("Malformed XML: {0}")]
    Xml(String),
    #[error("Unexpected root element <{0}>, expected <xfdf>")]
    UnexpectedRoot(String),
}

/// Why a single element was left out of the parsed set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("missing attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("attribute `{attribute}` is not a number list: {value:?}")]
    InvalidNumber { attribute: &'static str, value: String },
    #[error("invalid page {0:?}")]
    InvalidPage(String),
    #[error("no vertex list")]
    MissingVertices,
    #[error(transparent)]
    Rejected(#[from] AnnotationError),
}

/// An element that was skipped during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    /// Local tag name of the element.
    pub tag: String,
    /// Position among the annotation elements of the document.
    pub ordinal: usize,
    pub reason: SkipReason,
}

/// Result of a successful parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub set: AnnotationSet,
    pub skipped: Vec<SkippedElement>,
}

/// Defaults applied to elements that omit style attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeDefaults {
    pub color: String,
    pub stroke_width: f64,
}

impl Default for DecodeDefaults {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// Parse markup with the default style fallbacks.
pub fn parse(markup: &str) -> Result<ParseReport, MarkupError> {
    parse_with(markup, &DecodeDefaults::default())
}

/// Parse markup, never failing: malformed input yields an empty set plus the error.
pub fn parse_or_empty(markup: &str) -> (AnnotationSet, Option<MarkupError>) {
    match parse(markup) {
        Ok(report) => (report.set, None),
        Err(e) => {
            log::warn!("Discarding unreadable markup: {}", e);
            (AnnotationSet::new(), Some(e))
        }
    }
}

/// Parse markup with explicit style fallbacks.
pub fn parse_with(markup: &str, defaults: &DecodeDefaults) -> Result<ParseReport, MarkupError> {
    let doc = roxmltree::Document::parse(markup).map_err(|e| MarkupError::Xml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "xfdf" {
        return Err(MarkupError::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let mut report = ParseReport::default();
    let mut ordinal = 0;

    for node in root.descendants().filter(|n| n.is_element()) {
        let tag = node.tag_name().name();
        if !matches!(tag, "square" | "highlight" | "polygon" | "ink" | "text" | "note") {
            continue;
        }
        if inside_delete(node) {
            continue;
        }

        let set = &mut report.set;
        let result = match tag {
            "square" => decode_rect(node, RectKind::Rectangle, set.rectangles.len(), defaults)
                .and_then(|r| set.append(Annotation::Rect(r)).map_err(SkipReason::from)),
            "highlight" => decode_rect(node, RectKind::Highlight, set.rectangles.len(), defaults)
                .and_then(|r| set.append(Annotation::Rect(r)).map_err(SkipReason::from)),
            "polygon" => decode_polygon(node, set.polygons.len(), defaults)
                .and_then(|p| set.append(Annotation::Polygon(p)).map_err(SkipReason::from)),
            "ink" => decode_ink(node, set.ink.len(), defaults).and_then(|strokes| {
                set.append_all(strokes.into_iter().map(Annotation::Ink).collect())
                    .map_err(SkipReason::from)
            }),
            _ => decode_note(node, set.notes.len(), defaults)
                .and_then(|n| set.append(Annotation::Note(n)).map_err(SkipReason::from)),
        };

        if let Err(reason) = result {
            log::debug!("Skipping <{}> #{}: {}", tag, ordinal, reason);
            report.skipped.push(SkippedElement {
                tag: tag.to_string(),
                ordinal,
                reason,
            });
        }
        ordinal += 1;
    }

    log::info!(
        "Parsed {} annotations from markup ({} skipped)",
        report.set.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn inside_delete(node: Node) -> bool {
    node.ancestors()
        .skip(1)
        .any(|a| a.is_element() && a.tag_name().name() == "delete")
}

/// Page attribute, converted from 0-based wire numbering. Missing means page 0.
fn decode_page(node: Node) -> Result<u32, SkipReason> {
    match node.attribute("page") {
        None => Ok(1),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|p| p.checked_add(1))
            .ok_or_else(|| SkipReason::InvalidPage(raw.to_string())),
    }
}

fn decode_color(node: Node, defaults: &DecodeDefaults) -> String {
    color_or(node.attribute("color"), &defaults.color)
}

fn decode_width(node: Node, defaults: &DecodeDefaults) -> f64 {
    node.attribute("width")
        .and_then(|w| w.trim().parse::<f64>().ok())
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(defaults.stroke_width)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn number_attribute(node: Node, attribute: &'static str) -> Result<f64, SkipReason> {
    let raw = node
        .attribute(attribute)
        .ok_or(SkipReason::MissingAttribute(attribute))?;
    parse_number(raw).ok_or_else(|| SkipReason::InvalidNumber {
        attribute,
        value: raw.to_string(),
    })
}

/// Parse `rect="x1,y1,x2,y2"`.
fn rect_attribute(node: Node) -> Result<[f64; 4], SkipReason> {
    let raw = node.attribute("rect").ok_or(SkipReason::MissingAttribute("rect"))?;
    let invalid = || SkipReason::InvalidNumber {
        attribute: "rect",
        value: raw.to_string(),
    };
    let values = raw
        .split(',')
        .map(parse_number)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(invalid)?;
    match values.as_slice() {
        [x1, y1, x2, y2] => Ok([*x1, *y1, *x2, *y2]),
        _ => Err(invalid()),
    }
}

/// Parse a point list. Accepts `x,y; x,y` and the plain XFDF `x,y,x,y` form.
pub fn parse_point_list(raw: &str) -> Option<Vec<Point>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }
    if raw.contains(';') {
        raw.split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let mut parts = pair.split(',');
                let x = parse_number(parts.next()?)?;
                let y = parse_number(parts.next()?)?;
                if parts.next().is_some() {
                    return None;
                }
                Some(Point::new(x, y))
            })
            .collect()
    } else {
        let values = raw.split(',').map(parse_number).collect::<Option<Vec<f64>>>()?;
        if values.len() % 2 != 0 {
            return None;
        }
        Some(values.chunks(2).map(|xy| Point::new(xy[0], xy[1])).collect())
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn element_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn point_list(node: Node, attribute: &'static str) -> Result<Vec<Point>, SkipReason> {
    let raw = element_text(node);
    parse_point_list(&raw).ok_or(SkipReason::InvalidNumber { attribute, value: raw })
}

fn decode_rect(
    node: Node,
    kind: RectKind,
    index: usize,
    defaults: &DecodeDefaults,
) -> Result<RectAnnotation, SkipReason> {
    let page = decode_page(node)?;
    let [x1, y1, x2, y2] = rect_attribute(node)?;
    Ok(RectAnnotation::from_corners(
        format!("rect-{index}"),
        page,
        Point::new(x1, y1),
        Point::new(x2, y2),
        decode_color(node, defaults),
        decode_width(node, defaults),
        kind,
    ))
}

fn decode_polygon(node: Node, index: usize, defaults: &DecodeDefaults) -> Result<Polygon, SkipReason> {
    let page = decode_page(node)?;
    let vertices = child_element(node, "vertices").ok_or(SkipReason::MissingVertices)?;
    Ok(Polygon {
        id: format!("poly-{index}"),
        page,
        vertices: point_list(vertices, "vertices")?,
        color: decode_color(node, defaults),
        stroke_width: decode_width(node, defaults),
    })
}

/// An `<ink>` element holds either one `<vertices>` list or an
/// `<inklist>` with one `<gesture>` per stroke.
fn decode_ink(node: Node, index: usize, defaults: &DecodeDefaults) -> Result<Vec<InkStroke>, SkipReason> {
    let page = decode_page(node)?;
    let color = decode_color(node, defaults);
    let stroke_width = decode_width(node, defaults);

    let lists = if let Some(vertices) = child_element(node, "vertices") {
        vec![point_list(vertices, "vertices")?]
    } else if let Some(inklist) = child_element(node, "inklist") {
        inklist
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == "gesture")
            .map(|g| point_list(g, "gesture"))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        return Err(SkipReason::MissingVertices);
    };
    if lists.is_empty() {
        return Err(SkipReason::MissingVertices);
    }

    Ok(lists
        .into_iter()
        .enumerate()
        .map(|(i, points)| InkStroke {
            id: format!("ink-{}", index + i),
            page,
            points,
            color: color.clone(),
            stroke_width,
        })
        .collect())
}

fn decode_note(node: Node, index: usize, defaults: &DecodeDefaults) -> Result<Note, SkipReason> {
    let page = decode_page(node)?;
    let (x, y) = match (node.attribute("x"), node.attribute("y"), node.attribute("rect")) {
        (None, None, Some(_)) => {
            let [x1, y1, _, _] = rect_attribute(node)?;
            (x1, y1)
        }
        _ => (number_attribute(node, "x")?, number_attribute(node, "y")?),
    };
    let text = match node.attribute("contents") {
        Some(contents) => contents.to_string(),
        None => child_element(node, "contents").map(element_text).unwrap_or_default(),
    };
    Ok(Note {
        id: format!("note-{index}"),
        page,
        x,
        y,
        color: decode_color(node, defaults),
        text,
    })
}

/// Escape text for use inside a double-quoted attribute value. Characters
/// XML cannot carry at all are dropped.
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            // Attribute normalization would turn raw whitespace into spaces.
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join("; ")
}

fn wire_page(page: u32) -> u32 {
    page.saturating_sub(1)
}

/// Serialize a set to markup. Every annotation goes into the `<add>` section.
pub fn serialize(set: &AnnotationSet) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_markup(&mut out, set);
    out
}

fn write_markup(out: &mut String, set: &AnnotationSet) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<xfdf xmlns="{}">"#, XFDF_NAMESPACE)?;
    writeln!(out, "  <fields />")?;
    writeln!(out, "  <add>")?;

    for rect in &set.rectangles {
        let tag = match rect.kind {
            RectKind::Rectangle => "square",
            RectKind::Highlight => "highlight",
        };
        writeln!(
            out,
            r#"    <{tag} page="{}" color="{}" width="{}" rect="{},{},{},{}" />"#,
            wire_page(rect.page),
            escape_attribute(&rect.color),
            rect.stroke_width,
            rect.x1,
            rect.y1,
            rect.x2,
            rect.y2,
        )?;
    }
    for polygon in &set.polygons {
        writeln!(
            out,
            r#"    <polygon page="{}" color="{}" width="{}"><vertices>{}</vertices></polygon>"#,
            wire_page(polygon.page),
            escape_attribute(&polygon.color),
            polygon.stroke_width,
            format_points(&polygon.vertices),
        )?;
    }
    for stroke in &set.ink {
        writeln!(
            out,
            r#"    <ink page="{}" color="{}" width="{}"><vertices>{}</vertices></ink>"#,
            wire_page(stroke.page),
            escape_attribute(&stroke.color),
            stroke.stroke_width,
            format_points(&stroke.points),
        )?;
    }
    for note in &set.notes {
        writeln!(
            out,
            r#"    <text page="{}" color="{}" x="{}" y="{}" contents="{}" />"#,
            wire_page(note.page),
            escape_attribute(&note.color),
            note.x,
            note.y,
            escape_attribute(&note.text),
        )?;
    }

    writeln!(out, "  </add>")?;
    writeln!(out, "  <modify />")?;
    writeln!(out, "  <delete />")?;
    writeln!(out, "</xfdf>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::generate_id;

    fn sample_set() -> AnnotationSet {
        let mut set = AnnotationSet::new();
        set.append(Annotation::Rect(RectAnnotation::from_corners(
            generate_id("rect"),
            1,
            Point::new(10.0, 10.0),
            Point::new(50.0, 50.0),
            "#E44234".into(),
            2.0,
            RectKind::Rectangle,
        )))
        .unwrap();
        set.append(Annotation::Rect(RectAnnotation::from_corners(
            generate_id("rect"),
            2,
            Point::new(0.5, 1.25),
            Point::new(100.125, 20.0),
            "#FFFF00".into(),
            1.5,
            RectKind::Highlight,
        )))
        .unwrap();
        set.append(Annotation::Polygon(Polygon {
            id: generate_id("poly"),
            page: 1,
            vertices: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.66)],
            color: "#00FF00".into(),
            stroke_width: 3.0,
        }))
        .unwrap();
        set.append(Annotation::Ink(InkStroke {
            id: generate_id("ink"),
            page: 3,
            points: vec![Point::new(1.0, 2.0), Point::new(3.5, 4.25), Point::new(-1.0, 0.1)],
            color: "#0000FF".into(),
            stroke_width: 0.75,
        }))
        .unwrap();
        set.append(Annotation::Note(Note {
            id: generate_id("note"),
            page: 1,
            x: 72.0,
            y: 700.0,
            color: "#FFA500".into(),
            text: "Check \"setback\" & <height>\nsecond line".into(),
        }))
        .unwrap();
        set
    }

    /// Compare everything except IDs, which the wire format does not carry.
    fn assert_same_content(a: &AnnotationSet, b: &AnnotationSet) {
        let mut a = a.clone();
        let mut b = b.clone();
        for set in [&mut a, &mut b] {
            set.rectangles.iter_mut().for_each(|r| r.id.clear());
            set.polygons.iter_mut().for_each(|p| p.id.clear());
            set.ink.iter_mut().for_each(|i| i.id.clear());
            set.notes.iter_mut().for_each(|n| n.id.clear());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let set = sample_set();
        let report = parse(&serialize(&set)).unwrap();
        assert!(report.skipped.is_empty());
        assert_same_content(&report.set, &set);
    }

    fn note(text: &str) -> Annotation {
        Annotation::Note(Note {
            id: generate_id("note"),
            page: 1,
            x: 10.0,
            y: 20.0,
            color: "#FFA500".into(),
            text: text.into(),
        })
    }

    fn stroke(page: u32, points: &[(f64, f64)], color: &str, stroke_width: f64) -> Annotation {
        Annotation::Ink(InkStroke {
            id: generate_id("ink"),
            page,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            color: color.into(),
            stroke_width,
        })
    }

    #[test]
    fn test_roundtrip_edge_cases() {
        let cases: Vec<(&str, Vec<Annotation>)> = vec![
            (
                "control characters in note text",
                vec![
                    note("pasted\u{b}text\u{0}\u{1f}\u{FFFE}"),
                    Annotation::Rect(RectAnnotation::from_corners(
                        generate_id("rect"),
                        1,
                        Point::new(0.0, 0.0),
                        Point::new(5.0, 5.0),
                        "#000000".into(),
                        1.0,
                        RectKind::Rectangle,
                    )),
                ],
            ),
            (
                "whitespace, markup and non-ASCII in note text",
                vec![note(" tab\there\r\nCRLF & 'quotes' </text> \u{e9}\u{4e2d}\u{1F4CC} "), note("")],
            ),
            (
                "non-canonical colors",
                vec![
                    stroke(1, &[(0.0, 0.0), (1.0, 1.0)], "#abc", 1.0),
                    stroke(1, &[(0.0, 0.0), (1.0, 1.0)], "e44234", 1.0),
                    stroke(1, &[(0.0, 0.0), (1.0, 1.0)], "not a color", 1.0),
                ],
            ),
            (
                "several ink strokes on one page",
                vec![
                    stroke(4, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)], "#0000FF", 1.0),
                    stroke(4, &[(1.0, 1.0), (2.0, 2.0)], "#0000FF", 1.0),
                    stroke(4, &[(3.0, 3.0), (4.0, 8.0)], "#00FF00", 4.5),
                ],
            ),
            (
                "extreme and negative coordinates",
                vec![
                    stroke(1, &[(-1e300, 1e-300), (1.7976931348623157e308, -0.1)], "#010203", 1e-9),
                    Annotation::Rect(RectAnnotation::from_corners(
                        generate_id("rect"),
                        u32::MAX,
                        Point::new(-72.5, -0.000001),
                        Point::new(-1.0 / 3.0, 1e6),
                        "#FFFF00".into(),
                        123456.789,
                        RectKind::Highlight,
                    )),
                    Annotation::Polygon(Polygon {
                        id: generate_id("poly"),
                        page: 2,
                        vertices: vec![
                            Point::new(0.1, 0.2),
                            Point::new(-0.30000000000000004, 5e-324),
                            Point::new(9007199254740993.0, -2.5),
                        ],
                        color: "#FFFFFF".into(),
                        stroke_width: 0.1,
                    }),
                ],
            ),
        ];

        for (name, annotations) in cases {
            let mut set = AnnotationSet::new();
            for annotation in annotations {
                set.append(annotation).unwrap();
            }
            let markup = serialize(&set);
            let report = parse(&markup).unwrap_or_else(|e| panic!("{name}: {e}\n{markup}"));
            assert!(report.skipped.is_empty(), "{name}: {:?}", report.skipped);
            assert_same_content(&report.set, &set);
        }
    }

    #[test]
    fn test_serialize_drops_non_xml_chars_from_raw_fields() {
        let mut set = AnnotationSet::new();
        set.notes.push(Note {
            id: "n".into(),
            page: 1,
            x: 0.0,
            y: 0.0,
            color: "#FFA500".into(),
            text: "a\u{8}b".into(),
        });
        let report = parse(&serialize(&set)).unwrap();
        assert_eq!(report.set.notes[0].text, "ab");
    }

    #[test]
    fn test_inklist_with_bad_gesture_is_skipped_whole() {
        let markup = r#"<xfdf><add>
            <ink page="0"><inklist><gesture>0,0;5,5</gesture><gesture>9,9</gesture></inklist></ink>
            <ink page="1"><inklist><gesture>1,1;2,2</gesture></inklist></ink>
        </add></xfdf>"#;
        let report = parse(markup).unwrap();
        assert_eq!(report.set.ink.len(), 1);
        assert_eq!(report.set.ink[0].page, 2);
        assert_eq!(report.set.ink[0].id, "ink-0");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].tag, "ink");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Rejected(AnnotationError::TooFewPoints(1))
        );
    }

    #[test]
    fn test_single_square_scenario() {
        let markup = r##"<?xml version="1.0"?>
<xfdf xmlns="http://ns.adobe.com/xfdf/">
  <fields/>
  <add><square page="0" color="#E44234" rect="10,10,50,50"/></add>
  <modify/><delete/>
</xfdf>"##;
        let report = parse(markup).unwrap();
        assert_eq!(report.set.rectangles.len(), 1);
        let rect = &report.set.rectangles[0];
        assert_eq!(rect.page, 1);
        assert_eq!(rect.as_rect(), kurbo::Rect::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(rect.color, "#E44234");
        assert_eq!(rect.id, "rect-0");
        assert!((rect.stroke_width - DEFAULT_STROKE_WIDTH).abs() < f64::EPSILON);

        let out = serialize(&report.set);
        assert!(out.contains(r#"<square page="0""#), "{out}");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(parse("<xfdf><add>"), Err(MarkupError::Xml(_))));
        let (set, error) = parse_or_empty("not xml at all");
        assert!(set.is_empty());
        assert!(error.is_some());
    }

    #[test]
    fn test_wrong_root_is_error() {
        let result = parse("<annotations><square page=\"0\" rect=\"0,0,1,1\"/></annotations>");
        assert_eq!(result, Err(MarkupError::UnexpectedRoot("annotations".into())));
    }

    #[test]
    fn test_bad_element_skipped_not_fatal() {
        let markup = r##"<xfdf><add>
            <square page="0" rect="10,abc,50,50"/>
            <square page="1" rect="1,2,3,4"/>
            <polygon page="0"><vertices>1,1; 2,2</vertices></polygon>
            <ink page="0"><vertices>1,1; nope</vertices></ink>
            <text page="0" x="5"/>
        </add></xfdf>"##;
        let report = parse(markup).unwrap();
        assert_eq!(report.set.rectangles.len(), 1);
        assert_eq!(report.set.rectangles[0].page, 2);
        assert_eq!(report.skipped.len(), 4);
        assert!(matches!(report.skipped[0].reason, SkipReason::InvalidNumber { attribute: "rect", .. }));
        assert_eq!(
            report.skipped[1].reason,
            SkipReason::Rejected(AnnotationError::TooFewVertices(2))
        );
        assert_eq!(report.skipped[3].reason, SkipReason::MissingAttribute("y"));
        assert_eq!(report.skipped[3].tag, "text");
    }

    #[test]
    fn test_color_and_width_fallbacks() {
        let markup = r#"<xfdf><add><square rect="0,0,5,5" color="blue" width="-3"/></add></xfdf>"#;
        let report = parse(markup).unwrap();
        let rect = &report.set.rectangles[0];
        assert_eq!(rect.page, 1);
        assert_eq!(rect.color, DEFAULT_COLOR);
        assert!((rect.stroke_width - DEFAULT_STROKE_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_page_skipped() {
        let report = parse(r#"<xfdf><add><square page="-1" rect="0,0,5,5"/></add></xfdf>"#).unwrap();
        assert!(report.set.is_empty());
        assert!(matches!(report.skipped[0].reason, SkipReason::InvalidPage(_)));
    }

    #[test]
    fn test_delete_section_ignored() {
        let markup = r#"<xfdf><add/><delete><square page="0" rect="0,0,5,5"/></delete></xfdf>"#;
        assert!(parse(markup).unwrap().set.is_empty());
    }

    #[test]
    fn test_ink_gesture_list() {
        let markup = r#"<xfdf><add><ink page="2" width="1">
            <inklist><gesture>0,0;5,5;10,0</gesture><gesture>1,1;2,2</gesture></inklist>
        </ink></add></xfdf>"#;
        let report = parse(markup).unwrap();
        assert_eq!(report.set.ink.len(), 2);
        assert_eq!(report.set.ink[0].page, 3);
        assert_eq!(report.set.ink[0].points.len(), 3);
        assert_eq!(report.set.ink[1].id, "ink-1");
    }

    #[test]
    fn test_note_contents_child_and_rect_position() {
        let markup = r#"<xfdf><add><text page="0" rect="20,30,40,50"><contents>hello</contents></text></add></xfdf>"#;
        let report = parse(markup).unwrap();
        let note = &report.set.notes[0];
        assert!((note.x - 20.0).abs() < f64::EPSILON);
        assert!((note.y - 30.0).abs() < f64::EPSILON);
        assert_eq!(note.text, "hello");
    }

    #[test]
    fn test_point_list_forms() {
        assert_eq!(
            parse_point_list("1,2; 3,4;"),
            Some(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)])
        );
        assert_eq!(
            parse_point_list("1,2,3,4"),
            Some(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)])
        );
        assert_eq!(parse_point_list("1,2,3"), None);
        assert_eq!(parse_point_list("1,2,3; 4,5"), None);
        assert_eq!(parse_point_list("NaN,1; 2,3"), None);
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute(r#"a & "b" <c>"#), "a &amp; &quot;b&quot; &lt;c&gt;");
    }

    #[test]
    fn test_empty_set_serializes_envelope() {
        let out = serialize(&AnnotationSet::new());
        assert!(out.contains("<fields />"));
        assert!(out.contains("<add>"));
        assert!(out.contains("<modify />"));
        assert!(out.contains("<delete />"));
        assert!(parse(&out).unwrap().set.is_empty());
    }
}
