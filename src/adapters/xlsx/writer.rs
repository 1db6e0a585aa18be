use super::{column_name, escape_text, PACKAGE_REL_NS, RELATIONSHIP_NS, SPREADSHEET_NS};
use crate::domain::model::MovieRecord;
use crate::utils::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

pub const HEADER: [&str; 13] = [
    "Source",
    "Title",
    "English Title",
    "Year",
    "Director",
    "Cast",
    "Genre",
    "Rating",
    "Plot",
    "Country",
    "Release Date",
    "Poster/Runtime",
    "IMDB Rating",
];

const SHEET_NAME: &str = "Movies";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

fn record_row(record: &MovieRecord) -> [String; 13] {
    [
        record.source.label().to_string(),
        record.title.clone(),
        record.english_title.clone(),
        record.year.clone(),
        record.director.clone(),
        record.cast_display(),
        record.genre.clone(),
        record.rating.clone(),
        record.plot.clone(),
        record.country.clone(),
        record.release_date.clone(),
        record.poster_or_runtime().to_string(),
        record.imdb_rating.clone().unwrap_or_default(),
    ]
}

/// Serialize records into a single-sheet `.xlsx` workbook: a fixed header
/// row followed by one row per record, in order.
pub fn write_workbook(records: &[MovieRecord]) -> Result<Vec<u8>> {
    let header = HEADER.map(str::to_string);
    let rows: Vec<[String; 13]> = std::iter::once(header)
        .chain(records.iter().map(record_row))
        .collect();

    let sheet = sheet_xml(&rows)?;
    let package_rels = package_rels();
    let workbook = workbook_xml();
    let workbook_rels = workbook_rels();
    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", package_rels.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_slice()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(name, part_options())?;
        zip.write_all(content)?;
    }

    let cursor = zip.finish()?;
    let data = cursor.into_inner();
    tracing::debug!(
        "Wrote workbook with {} record row(s), {} bytes",
        records.len(),
        data.len()
    );
    Ok(data)
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn package_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        PACKAGE_REL_NS, RELATIONSHIP_NS
    )
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SPREADSHEET_NS, RELATIONSHIP_NS, SHEET_NAME
    )
}

fn workbook_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{ns}"><Relationship Id="rId1" Type="{rel}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{rel}/styles" Target="styles.xml"/></Relationships>"#,
        ns = PACKAGE_REL_NS,
        rel = RELATIONSHIP_NS
    )
}

/// 所有儲存格都寫成 inline string，不需要 sharedStrings.xml
fn sheet_xml(rows: &[[String; 13]]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    for (row_index, cells) in rows.iter().enumerate() {
        let row_number = (row_index + 1).to_string();
        writer.write_event(Event::Start(
            BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
        ))?;

        for (column, value) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_name(column), row_number);
            writer.write_event(Event::Start(
                BytesStart::new("c")
                    .with_attributes([("r", reference.as_str()), ("t", "inlineStr")]),
            ))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            writer.write_event(Event::Start(
                BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
            ))?;
            let value = escape_text(value);
            writer.write_event(Event::Text(BytesText::new(&value)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;

    Ok(writer.into_inner().into_inner())
}
