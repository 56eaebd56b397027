//! Minimal Office Open XML workbook writer.
//!
//! One worksheet with a header row and one row per record. Positions and
//! quantities are numeric cells; codes go through the shared string table
//! so that leading zeros survive.

use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};

use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::models::config::ExportConfig;
use crate::models::Record;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";

/// Characters Excel rejects in sheet names.
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Writes records to an `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    sheet_name: String,
    headers: [String; 3],
}

impl XlsxExporter {
    /// Create an exporter with the default sheet name and headers.
    pub fn new() -> Self {
        Self::from_config(&ExportConfig::default())
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            sheet_name: sanitize_sheet_name(&config.sheet_name),
            headers: [
                config.position_header.clone(),
                config.code_header.clone(),
                config.quantity_header.clone(),
            ],
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Serialize records into workbook bytes.
    pub fn export(&self, records: &[Record]) -> Result<Vec<u8>, ExportError> {
        let cursor = self.write_to(records, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Write the workbook into any seekable writer and hand it back.
    pub fn write_to<W: Write + Seek>(&self, records: &[Record], writer: W) -> Result<W, ExportError> {
        let mut strings = SharedStrings::default();
        let sheet = self.worksheet(records, &mut strings)?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);

        let parts: [(&str, Vec<u8>); 7] = [
            ("[Content_Types].xml", content_types()?),
            ("_rels/.rels", package_rels()?),
            ("docProps/core.xml", core_properties()?),
            ("xl/workbook.xml", self.workbook()?),
            ("xl/_rels/workbook.xml.rels", workbook_rels()?),
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/sharedStrings.xml", strings.to_xml()?),
        ];

        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&content)?;
        }

        let writer = zip.finish()?;
        debug!("Exported {} records to sheet {:?}", records.len(), self.sheet_name);
        Ok(writer)
    }

    fn workbook(&self) -> Result<Vec<u8>, ExportError> {
        let mut xml = XmlPart::new()?;
        xml.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_DOC_RELS)])?;
        xml.start("sheets", &[])?;
        xml.empty(
            "sheet",
            &[("name", self.sheet_name.as_str()), ("sheetId", "1"), ("r:id", "rId1")],
        )?;
        xml.end("sheets")?;
        xml.end("workbook")?;
        Ok(xml.finish())
    }

    fn worksheet(&self, records: &[Record], strings: &mut SharedStrings) -> Result<Vec<u8>, ExportError> {
        let mut xml = XmlPart::new()?;
        xml.start("worksheet", &[("xmlns", NS_MAIN)])?;
        xml.start("sheetData", &[])?;

        xml.start("row", &[("r", "1")])?;
        for (column, header) in self.headers.iter().enumerate() {
            xml.string_cell(column, 1, strings.index(header))?;
        }
        xml.end("row")?;

        for (i, record) in records.iter().enumerate() {
            let row = i + 2;
            let row_ref = row.to_string();
            xml.start("row", &[("r", row_ref.as_str())])?;
            xml.number_cell(0, row, record.position)?;
            xml.string_cell(1, row, strings.index(&record.code))?;
            xml.number_cell(2, row, record.quantity)?;
            xml.end("row")?;
        }

        xml.end("sheetData")?;
        xml.end("worksheet")?;
        Ok(xml.finish())
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared string table in insertion order.
#[derive(Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn index(&mut self, value: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    fn to_xml(&self) -> Result<Vec<u8>, ExportError> {
        let count = self.references.to_string();
        let unique = self.strings.len().to_string();

        let mut xml = XmlPart::new()?;
        xml.start(
            "sst",
            &[("xmlns", NS_MAIN), ("count", count.as_str()), ("uniqueCount", unique.as_str())],
        )?;
        for value in &self.strings {
            xml.start("si", &[])?;
            xml.text_element("t", value)?;
            xml.end("si")?;
        }
        xml.end("sst")?;
        Ok(xml.finish())
    }
}

fn content_types() -> Result<Vec<u8>, ExportError> {
    let mut xml = XmlPart::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (part, content_type) in [
        ("/xl/workbook.xml", CT_WORKBOOK),
        ("/xl/worksheets/sheet1.xml", CT_WORKSHEET),
        ("/xl/sharedStrings.xml", CT_SHARED_STRINGS),
        ("/docProps/core.xml", CT_CORE),
    ] {
        xml.empty("Override", &[("PartName", part), ("ContentType", content_type)])?;
    }
    xml.end("Types")?;
    Ok(xml.finish())
}

fn package_rels() -> Result<Vec<u8>, ExportError> {
    let office_document = format!("{}/officeDocument", NS_DOC_RELS);
    let core_properties = format!("{}/metadata/core-properties", NS_PKG_RELS);

    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    xml.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", office_document.as_str()), ("Target", "xl/workbook.xml")],
    )?;
    xml.empty(
        "Relationship",
        &[("Id", "rId2"), ("Type", core_properties.as_str()), ("Target", "docProps/core.xml")],
    )?;
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn workbook_rels() -> Result<Vec<u8>, ExportError> {
    let worksheet = format!("{}/worksheet", NS_DOC_RELS);
    let shared_strings = format!("{}/sharedStrings", NS_DOC_RELS);

    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    xml.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", worksheet.as_str()), ("Target", "worksheets/sheet1.xml")],
    )?;
    xml.empty(
        "Relationship",
        &[("Id", "rId2"), ("Type", shared_strings.as_str()), ("Target", "sharedStrings.xml")],
    )?;
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn core_properties() -> Result<Vec<u8>, ExportError> {
    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut xml = XmlPart::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", NS_CORE),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.text_element("dc:creator", "ordex")?;
    xml.start("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")])?;
    xml.text(&created)?;
    xml.end("dcterms:created")?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

/// Excel column letters for a 0-based index ("A", ..., "Z", "AA", ...).
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(31)
        .collect();
    let cleaned = cleaned.trim().to_string();

    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn xml_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}

/// One XML part being written.
struct XmlPart {
    writer: Writer<Vec<u8>>,
}

impl XmlPart {
    fn new() -> Result<Self, ExportError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn element<'a>(name: &'a str, attributes: &[(&'a str, &'a str)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for &attribute in attributes {
            element.push_attribute(attribute);
        }
        element
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Start(Self::element(name, attributes)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Empty(Self::element(name, attributes)))
            .map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn text(&mut self, text: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    fn string_cell(&mut self, column: usize, row: usize, index: usize) -> Result<(), ExportError> {
        let reference = format!("{}{}", column_name(column), row);
        self.start("c", &[("r", reference.as_str()), ("t", "s")])?;
        self.text_element("v", &index.to_string())?;
        self.end("c")
    }

    fn number_cell(&mut self, column: usize, row: usize, value: u32) -> Result<(), ExportError> {
        let reference = format!("{}{}", column_name(column), row);
        self.start("c", &[("r", reference.as_str())])?;
        self.text_element("v", &value.to_string())?;
        self.end("c")
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;

    fn cell_u32(cell: &Data) -> u32 {
        match cell {
            Data::Int(i) => *i as u32,
            Data::Float(f) => *f as u32,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    fn cell_string(cell: &Data) -> String {
        match cell {
            Data::String(s) => s.clone(),
            other => panic!("expected a string, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_with_calamine() {
        let records = vec![
            Record::new(1, "5029040012366", 96),
            Record::new(2, "0012345678905", 12),
            Record::new(3, "5029040012366", 1200),
        ];

        let bytes = XlsxExporter::new().export(&records).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Pozycje".to_string()]);

        let range = workbook.worksheet_range("Pozycje").unwrap();
        let mut rows = range.rows();

        let header: Vec<String> = rows.next().unwrap().iter().map(cell_string).collect();
        assert_eq!(header, vec!["Lp", "Kod", "Ilość"]);

        let read: Vec<Record> = rows
            .map(|row| Record::new(cell_u32(&row[0]), cell_string(&row[1]), cell_u32(&row[2])))
            .collect();
        assert_eq!(read, records);
    }

    #[test]
    fn test_empty_record_set_has_header_only() {
        let bytes = XlsxExporter::new().export(&[]).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Pozycje").unwrap();
        assert_eq!(range.rows().count(), 1);
    }

    #[test]
    fn test_configured_labels() {
        let config = ExportConfig {
            sheet_name: "Order [2024/15]".to_string(),
            position_header: "Pos".to_string(),
            code_header: "EAN".to_string(),
            quantity_header: "Qty".to_string(),
        };
        let exporter = XlsxExporter::from_config(&config);
        assert_eq!(exporter.sheet_name(), "Order _2024_15_");

        let bytes = exporter.export(&[Record::new(1, "12345678", 2)]).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Order _2024_15_").unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(cell_string).collect();
        assert_eq!(header, vec!["Pos", "EAN", "Qty"]);
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(2), "C");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("  "), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }
}
