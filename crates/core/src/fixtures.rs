//! Minimal xlsx packages for tests.
//!
//! Builds real OOXML zip containers (workbook, relationships, one worksheet
//! part per sheet, inline strings) so tests exercise the same reader that
//! production uploads go through. Compiled for this crate's tests and, via
//! the `fixtures` feature, for other crates' tests.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::workbook::{column_index, column_letters};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

#[derive(Debug, Clone)]
enum FixtureCell {
    Text(String),
    Number(f64),
    Bool(bool),
    Formula(String),
}

/// One worksheet of a fixture workbook.
#[derive(Debug, Clone)]
pub struct SheetFixture {
    name: String,
    cells: BTreeMap<(u32, u32), FixtureCell>,
}

impl SheetFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn text(self, coord: &str, text: &str) -> Self {
        self.put(coord, FixtureCell::Text(text.to_string()))
    }

    pub fn number(self, coord: &str, value: f64) -> Self {
        self.put(coord, FixtureCell::Number(value))
    }

    pub fn boolean(self, coord: &str, value: bool) -> Self {
        self.put(coord, FixtureCell::Bool(value))
    }

    /// Formula text without the leading `=`, as stored in the package.
    pub fn formula(self, coord: &str, formula: &str) -> Self {
        self.put(coord, FixtureCell::Formula(formula.to_string()))
    }

    /// Header cells `A1`, `B1`, ... from `names`.
    pub fn header(mut self, names: &[&str]) -> Self {
        for (col, name) in names.iter().enumerate() {
            let coord = format!("{}1", column_letters(col as u32));
            self = self.text(&coord, name);
        }
        self
    }

    fn put(mut self, coord: &str, cell: FixtureCell) -> Self {
        self.cells.insert(parse_coord(coord), cell);
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}"><sheetData>"#
        );
        let mut current_row = None;
        for (&(row, col), cell) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    xml.push_str("</row>");
                }
                xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
                current_row = Some(row);
            }
            let r = format!("{}{}", column_letters(col), row + 1);
            let c = match cell {
                FixtureCell::Text(s) => format!(
                    r#"<c r="{r}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(s)
                ),
                FixtureCell::Number(n) => format!(r#"<c r="{r}"><v>{n}</v></c>"#),
                FixtureCell::Bool(b) => format!(r#"<c r="{r}" t="b"><v>{}</v></c>"#, u8::from(*b)),
                FixtureCell::Formula(f) => format!(r#"<c r="{r}"><f>{}</f></c>"#, escape(f)),
            };
            xml.push_str(&c);
        }
        if current_row.is_some() {
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// A workbook assembled from [`SheetFixture`]s in declaration order.
#[derive(Debug, Clone, Default)]
pub struct WorkbookFixture {
    sheets: Vec<SheetFixture>,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, sheet: SheetFixture) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Serialize to xlsx bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), self.content_types()),
            ("_rels/.rels".into(), root_rels()),
            ("xl/workbook.xml".into(), self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels".into(), self.workbook_rels()),
        ];
        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet.to_xml()));
        }

        for (name, body) in parts {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(name, options).expect("start zip entry");
            zip.write_all(body.as_bytes()).expect("write zip entry");
        }
        zip.finish().expect("finish zip").into_inner()
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}">"#
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn root_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

/// `"B12"` -> `(11, 1)`. Fixture coordinates are trusted input.
fn parse_coord(coord: &str) -> (u32, u32) {
    let split = coord
        .find(|c: char| c.is_ascii_digit())
        .expect("coordinate has a row number");
    let col = column_index(&coord[..split]).expect("coordinate has column letters");
    let row: u32 = coord[split..].parse().expect("numeric row");
    (row - 1, col)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
