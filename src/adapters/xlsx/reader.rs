use super::{
    column_index, parse_row, row_number, unescape_text, DEFAULT_SHEET_PART, MAX_COLUMNS,
    MAX_ROWS, SHARED_STRINGS_PART, WORKBOOK_PART, WORKBOOK_RELS_PART,
};
use crate::utils::error::{MetaError, Result};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Titles from the first column of the first sheet, in order. Empty cells
/// are skipped and duplicates kept; the first row is only dropped when
/// `skip_header` is set.
pub fn read_titles(bytes: &[u8], skip_header: bool) -> Result<Vec<String>> {
    let rows = read_rows(bytes)?;

    Ok(rows
        .into_iter()
        .skip(usize::from(skip_header))
        .filter_map(|row| row.into_iter().next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect())
}

/// All rows of the first sheet (`.xlsx`) or of a headerless CSV file.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    if bytes.is_empty() {
        return Err(MetaError::spreadsheet("empty spreadsheet file"));
    }

    if bytes.starts_with(ZIP_MAGIC) {
        read_xlsx_rows(bytes)
    } else {
        read_csv_rows(bytes)
    }
}

fn read_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!("Read {} CSV row(s)", rows.len());
    Ok(rows)
}

fn read_xlsx_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let sheet_path = first_sheet_path(&mut archive)?;
    let sheet = read_part(&mut archive, &sheet_path)?.ok_or_else(|| {
        MetaError::spreadsheet(format!("worksheet part {} is missing", sheet_path))
    })?;
    let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let rows = parse_sheet(&sheet, &shared_strings)?;
    tracing::debug!("Read {} row(s) from {}", rows.len(), sheet_path);
    Ok(rows)
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(
                attr.unescape_value()
                    .map_err(quick_xml::Error::from)?
                    .into_owned(),
            ));
        }
    }
    Ok(None)
}

fn text(event: &BytesText) -> Result<String> {
    Ok(event.unescape().map_err(quick_xml::Error::from)?.into_owned())
}

/// 依 workbook.xml 與其關聯檔找出第一個工作表的路徑
fn first_sheet_path(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<String> {
    let Some(workbook) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };
    let Some(relation_id) = first_sheet_relation(&workbook)? else {
        return Err(MetaError::spreadsheet("workbook has no sheets"));
    };
    let Some(rels) = read_part(archive, WORKBOOK_RELS_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };

    Ok(match relation_target(&rels, &relation_id)? {
        Some(target) if target.starts_with('/') => target.trim_start_matches('/').to_string(),
        Some(target) => format!("xl/{}", target),
        None => DEFAULT_SHEET_PART.to_string(),
    })
}

fn first_sheet_relation(workbook: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return attribute(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn relation_target(rels: &[u8], relation_id: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id")?.as_deref() == Some(relation_id) {
                    return attribute(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Shared string table; rich-text runs are concatenated, phonetic hints skipped.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_text && !in_phonetic => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&text(&e)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take().map(|text| unescape_text(&text))),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

#[derive(Default)]
struct CellState {
    column: usize,
    cell_type: Option<String>,
    value: String,
    inline: String,
}

impl CellState {
    fn resolve(self, shared_strings: &[String]) -> Result<String> {
        match self.cell_type.as_deref() {
            Some("s") => {
                let index: usize = self.value.trim().parse().map_err(|_| {
                    MetaError::spreadsheet(format!("invalid shared string index: {}", self.value))
                })?;
                shared_strings.get(index).cloned().ok_or_else(|| {
                    MetaError::spreadsheet(format!("shared string {} out of range", index))
                })
            }
            Some("inlineStr") => Ok(unescape_text(&self.inline)),
            Some("b") => Ok(if self.value.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
            _ => Ok(self.value),
        }
    }
}

fn parse_sheet(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row = 0usize;
    let mut next_column = 0usize;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_attribute(&e, current_row)?;
                    next_column = 0;
                }
                b"c" => {
                    let (column, row) = match attribute(&e, b"r")? {
                        Some(reference) => cell_position(&reference)?,
                        None => (next_column, None),
                    };
                    if let Some(row) = row {
                        current_row = row;
                    }
                    next_column = column + 1;
                    cell = Some(CellState {
                        column,
                        cell_type: attribute(&e, b"t")?,
                        ..CellState::default()
                    });
                }
                b"v" => in_value = true,
                b"t" => in_inline_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_attribute(&e, current_row)?;
                }
                b"c" => {
                    let column = match attribute(&e, b"r")? {
                        Some(reference) => cell_position(&reference)?.0,
                        None => next_column,
                    };
                    next_column = column + 1;
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some(cell) = cell.as_mut() {
                    if in_value {
                        cell.value.push_str(&text(&e)?);
                    } else if in_inline_text && !in_phonetic {
                        cell.inline.push_str(&text(&e)?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(finished) = cell.take() {
                        let column = finished.column;
                        let value = finished.resolve(shared_strings)?;
                        place_cell(&mut rows, current_row, column, value)?;
                    }
                }
                b"row" => {
                    // 保留空白列，讓列號與位置一致
                    if rows.len() < current_row {
                        check_bounds(current_row, 0)?;
                        rows.resize(current_row, Vec::new());
                    }
                }
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// `<row r="..">`; rows without the attribute follow the previous one.
fn row_attribute(element: &BytesStart, previous: usize) -> Result<usize> {
    match attribute(element, b"r")? {
        Some(value) => parse_row(value.trim())
            .ok_or_else(|| MetaError::spreadsheet(format!("invalid row number: {}", value))),
        None => Ok(previous + 1),
    }
}

/// Column and optional row of a cell reference such as `B7`.
fn cell_position(reference: &str) -> Result<(usize, Option<usize>)> {
    let invalid = || MetaError::spreadsheet(format!("invalid cell reference: {}", reference));

    let column = column_index(reference).ok_or_else(invalid)?;
    let has_row = reference.bytes().any(|b| b.is_ascii_digit());
    let row = if has_row {
        Some(row_number(reference).ok_or_else(invalid)?)
    } else {
        None
    };
    Ok((column, row))
}

fn check_bounds(row: usize, column: usize) -> Result<()> {
    if row > MAX_ROWS || column >= MAX_COLUMNS {
        return Err(MetaError::spreadsheet(format!(
            "cell at row {} column {} is outside the sheet",
            row,
            column + 1
        )));
    }
    Ok(())
}

fn place_cell(
    rows: &mut Vec<Vec<String>>,
    row: usize,
    column: usize,
    value: String,
) -> Result<()> {
    check_bounds(row, column)?;
    let row_index = row.max(1) - 1;
    if rows.len() <= row_index {
        rows.resize(row_index + 1, Vec::new());
    }

    let row = &mut rows[row_index];
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    /// 以最少的 part 組出一個使用 shared strings 的活頁簿
    fn build_xlsx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Titles" sheetId="1" r:id="rId3"/><sheet name="Other" sheetId="2" r:id="rId1"/></sheets>
</workbook>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>올드보이</t></si>
  <si><r><t>Memories </t></r><r><t>of Murder</t></r></si>
  <si><t>기생충</t><rPh sb="0" eb="1"><t>phonetic</t></rPh></si>
  <si><t>ignored column</t></si>
</sst>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>3</v></c></row>
    <row r="2"><c r="B2" t="s"><v>3</v></c></row>
    <row r="3"><c r="A3" t="s"><v>1</v></c></row>
    <row r="5"><c r="A5" t="inlineStr"><is><t>Mother</t></is></c></row>
    <row r="6"><c r="A6"><v>1917</v></c></row>
    <row r="7"><c r="A7" t="s"><v>2</v></c><c r="C7" s="1"/></row>
  </sheetData>
</worksheet>"#;

    const OTHER_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>wrong sheet</t></is></c></row></sheetData>
</worksheet>"#;

    fn fixture() -> Vec<u8> {
        build_xlsx(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", OTHER_SHEET),
            ("xl/worksheets/sheet2.xml", SHEET),
        ])
    }

    #[test]
    fn test_read_titles_from_first_sheet() {
        let titles = read_titles(&fixture(), false).unwrap();
        assert_eq!(
            titles,
            vec!["올드보이", "Memories of Murder", "Mother", "1917", "기생충"]
        );
    }

    #[test]
    fn test_read_titles_skip_header() {
        let titles = read_titles(&fixture(), true).unwrap();
        assert_eq!(titles, vec!["Memories of Murder", "Mother", "1917", "기생충"]);
    }

    #[test]
    fn test_read_rows_keeps_row_positions() {
        let rows = read_rows(&fixture()).unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], vec!["올드보이", "ignored column"]);
        assert_eq!(rows[1], vec!["", "ignored column"]);
        assert!(rows[3].is_empty());
    }

    #[test]
    fn test_missing_workbook_falls_back_to_sheet1() {
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", OTHER_SHEET)]);
        assert_eq!(read_titles(&data, false).unwrap(), vec!["wrong sheet"]);
    }

    #[test]
    fn test_cells_without_references_use_position() {
        let sheet = r#"<worksheet><sheetData>
            <row><c t="inlineStr"><is><t>first</t></is></c><c t="inlineStr"><is><t>second</t></is></c></row>
            <row><c t="b"><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", sheet)]);

        let rows = read_rows(&data).unwrap();
        assert_eq!(rows, vec![vec!["first", "second"], vec!["TRUE"]]);
    }

    #[test]
    fn test_read_titles_from_csv() {
        let csv = "\u{FEFF}제목\n올드보이,2003\n\n,empty first\n\"Oldboy, remastered\"\n";
        let titles = read_titles(csv.as_bytes(), true).unwrap();
        assert_eq!(titles, vec!["올드보이", "Oldboy, remastered"]);
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = read_titles(&[], false).unwrap_err();
        assert!(matches!(err, MetaError::Spreadsheet { .. }));
    }

    #[test]
    fn test_corrupt_zip_is_error() {
        let err = read_rows(b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(err, MetaError::ZipError(_)));
    }

    #[test]
    fn test_xlsx_without_worksheet_is_error() {
        let data = build_xlsx(&[("docProps/app.xml", "<Properties/>")]);
        let err = read_rows(&data).unwrap_err();
        assert!(matches!(err, MetaError::Spreadsheet { .. }));
    }

    #[test]
    fn test_binary_non_utf8_is_error() {
        assert!(read_rows(&[0xff, 0xfe, 0x00, 0x81, b'\n', 0xc3]).is_err());
    }

    #[test]
    fn test_row_beyond_sheet_limit_is_error() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1000000000000000000"><c r="A1000000000000000000" t="inlineStr"><is><t>x</t></is></c></row>
        </sheetData></worksheet>"#;
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", sheet)]);

        let err = read_titles(&data, false).unwrap_err();
        assert!(matches!(err, MetaError::Spreadsheet { .. }));
    }

    #[test]
    fn test_row_attribute_beyond_sheet_limit_is_error() {
        let sheet = r#"<worksheet><sheetData><row r="1048577"/></sheetData></worksheet>"#;
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", sheet)]);

        assert!(matches!(
            read_rows(&data).unwrap_err(),
            MetaError::Spreadsheet { .. }
        ));
    }

    #[test]
    fn test_overlong_column_reference_is_error() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="AAAAAAAAAAAAAAAA1" t="inlineStr"><is><t>x</t></is></c></row>
        </sheetData></worksheet>"#;
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", sheet)]);

        let err = read_titles(&data, false).unwrap_err();
        assert!(matches!(err, MetaError::Spreadsheet { .. }));
    }

    #[test]
    fn test_last_valid_cell_is_accepted() {
        let sheet = r#"<worksheet><sheetData>
            <row r="2"><c r="XFD2" t="inlineStr"><is><t>edge</t></is></c></row>
        </sheetData></worksheet>"#;
        let data = build_xlsx(&[("xl/worksheets/sheet1.xml", sheet)]);

        let rows = read_rows(&data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 16_384);
        assert_eq!(rows[1][16_383], "edge");
    }

    #[test]
    fn test_escaped_control_chars_are_decoded() {
        let shared = r#"<sst><si><t>a_x0001_b</t></si></sst>"#;
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c></row>
            <row r="2"><c r="A2" t="inlineStr"><is><t>line_x000B_tab</t></is></c></row>
        </sheetData></worksheet>"#;
        let data = build_xlsx(&[
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/sharedStrings.xml", shared),
        ]);

        let titles = read_titles(&data, false).unwrap();
        assert_eq!(titles, vec!["a\u{0001}b", "line\u{000B}tab"]);
    }
}
