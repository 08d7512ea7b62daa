#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

/// A single-table report for one day, in the layout the facility's daily
/// report uses: label, unit/blank column, value.
pub fn daily_report(date: &str, main_room: &str, pue: &str, hydrogen: &str) -> Vec<u8> {
    let rows: Vec<Vec<&str>> = vec![
        vec!["日期:", date],
        vec!["主机房温度湿度", "℃ / %", main_room],
        vec!["冷通道温度湿度", "℃ / %", "18.5 55"],
        vec!["PUE", "-", pue],
        vec!["电池间氢气传感器", "ppm", hydrogen],
    ];
    docx(&[rows])
}

pub fn docx(tables: &[Vec<Vec<&str>>]) -> Vec<u8> {
    let mut body = String::new();
    for table in tables {
        body.push_str("<w:tbl>");
        for row in table {
            body.push_str("<w:tr>");
            for text in row {
                body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>"
                ));
            }
            body.push_str("</w:tr>");
        }
        body.push_str("</w:tbl>");
    }
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    zip.start_file("word/document.xml", options)
        .expect("start document part");
    zip.write_all(xml.as_bytes()).expect("write document part");
    zip.finish().expect("finish docx").into_inner()
}
