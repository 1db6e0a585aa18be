//! Minimal SpreadsheetML (`.xlsx`) support: the package is a zip archive of
//! XML parts, written with `zip` and parsed with `quick-xml`.

pub mod reader;
pub mod writer;

pub use reader::{read_rows, read_titles};
pub use writer::{write_workbook, HEADER};

use regex::Regex;
use std::sync::LazyLock;

pub(crate) const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const RELATIONSHIP_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const PACKAGE_REL_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub(crate) const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// 0 -> "A", 25 -> "Z", 26 -> "AA"
pub(crate) fn column_name(mut index: usize) -> String {
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

/// 工作表上限：1,048,576 列、16,384 欄 (XFD)
pub(crate) const MAX_ROWS: usize = 1_048_576;
pub(crate) const MAX_COLUMNS: usize = 16_384;

static ESCAPED_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_x([0-9A-Fa-f]{4})_").expect("escaped char pattern"));

/// Zero-based column of a cell reference such as `AB12`; `None` past `XFD`.
pub(crate) fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let number = letters.iter().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })?;
    (number <= MAX_COLUMNS).then(|| number - 1)
}

/// One-based row number of a cell reference such as `AB12`; `None` when the
/// digits are missing or outside the sheet.
pub(crate) fn row_number(reference: &str) -> Option<usize> {
    parse_row(reference.trim_start_matches(|c: char| c.is_ascii_alphabetic()))
}

/// Value of a `<row r="..">` attribute, limited to `1..=MAX_ROWS`.
pub(crate) fn parse_row(value: &str) -> Option<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
}

/// 文字中 XML 1.0 不允許的控制字元改寫成 `_xHHHH_`；原本就長得像跳脫序列的
/// 字串先把底線跳脫成 `_x005F_`
pub(crate) fn escape_text(value: &str) -> String {
    let value = ESCAPED_CHAR.replace_all(value, "_x005F$0");
    value
        .chars()
        .map(|c| {
            if is_xml_char(c) {
                c.to_string()
            } else {
                format!("_x{:04X}_", u32::from(c))
            }
        })
        .collect()
}

/// Reverse of [`escape_text`]: decodes `_xHHHH_` sequences in cell text.
pub(crate) fn unescape_text(value: &str) -> String {
    ESCAPED_CHAR
        .replace_all(value, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
}
