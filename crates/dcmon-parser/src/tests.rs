use std::io::{Cursor, Write};

use ::zip::write::FileOptions;
use ::zip::ZipWriter;
use chrono::NaiveDate;

use crate::errors::ParserError;
use crate::formats::{DelimitedReader, DocxReader};
use crate::model::{Metric, Table, TableDocument, Zone};
use crate::registry::DocumentReader;
use crate::vocabulary::{FieldRule, FieldValue, FieldVocabulary, RuleKind, ScalarField};
use crate::{build_record, build_record_with, clean_cells, extract_cells, read_document};

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn cell_xml(text: &str) -> String {
    format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
}

fn table_xml(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for text in *row {
            xml.push_str(&cell_xml(text));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

fn docx_bytes(body: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    zip.start_file("[Content_Types].xml", options)
        .expect("start content types");
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#)
        .expect("write content types");
    zip.start_file("word/document.xml", options)
        .expect("start document part");
    zip.write_all(document_xml(body).as_bytes())
        .expect("write document part");
    zip.finish().expect("finish docx").into_inner()
}

#[test]
fn collapse_removes_earlier_duplicate() {
    let cleaned = clean_cells(cells(&["A", "A", "B"]));
    assert_eq!(cleaned, cells(&["A", "B"]));

    let cleaned = clean_cells(cells(&["X", "Y", "Y", "Y", "Z", "Y"]));
    assert_eq!(cleaned, cells(&["X", "Y", "Z", "Y"]));
}

#[test]
fn cleaning_drops_empty_cells_but_keeps_whitespace() {
    let cleaned = clean_cells(cells(&["", "日期:", "", "2024-01-01", " ", ""]));
    assert_eq!(cleaned, cells(&["日期:", "2024-01-01", " "]));
}

#[test]
fn cleaning_is_idempotent() {
    let samples = [
        cells(&["A", "A", "B"]),
        cells(&["A", "", "A", "B", "B", ""]),
        cells(&["", "", ""]),
        cells(&["日期:", "日期:", "2024-01-01", "2024-01-01", "PUE", "", "PUE", "1.45"]),
        Vec::new(),
    ];

    for sample in samples {
        let once = clean_cells(sample.clone());
        let twice = clean_cells(once.clone());
        assert_eq!(once, twice, "cleaning {sample:?} twice changed the result");
        assert!(once.windows(2).all(|pair| pair[0] != pair[1]));
        assert!(once.iter().all(|cell| !cell.is_empty()));
    }
}

#[test]
fn dates_follow_their_label() {
    let record = build_record(&cells(&["日期:", "2024-01-01", "日期:", "2024-01-02"]));
    assert_eq!(record.dates, vec![date(2024, 1, 1), date(2024, 1, 2)]);
}

#[test]
fn malformed_date_is_skipped() {
    let record = build_record(&cells(&[
        "日期:",
        "2024/01/01",
        "日期:",
        "yesterday",
        "日期:",
        "2024-02-29",
    ]));
    assert_eq!(record.dates, vec![date(2024, 2, 29)]);
}

#[test]
fn zone_climate_pair_is_split() {
    let record = build_record(&cells(&["主机房温度湿度", "X", "23.5C 45%"]));
    assert_eq!(record.main_room.temperature, vec![23.5]);
    assert_eq!(record.main_room.humidity, vec![45.0]);
    assert!(record.cold_aisle.is_empty());
}

#[test]
fn zone_climate_pair_missing_token_contributes_nothing() {
    let record = build_record(&cells(&["主机房温度湿度", "X", "23.5C"]));
    assert!(record.main_room.temperature.is_empty());
    assert!(record.main_room.humidity.is_empty());

    let record = build_record(&cells(&["配电间温度湿度", "X", "23.5C abc%"]));
    assert!(record.power_room.temperature.is_empty());
    assert!(record.power_room.humidity.is_empty());
}

#[test]
fn zone_climate_accepts_celsius_sign_and_loose_spacing() {
    let record = build_record(&cells(&[
        "冷通道温度湿度",
        "正常",
        "21℃ 40%",
        "电池间温度湿度",
        "正常",
        " 24.1°C   52.5% ",
    ]));
    assert_eq!(record.cold_aisle.temperature, vec![21.0]);
    assert_eq!(record.cold_aisle.humidity, vec![40.0]);
    assert_eq!(record.battery_room.temperature, vec![24.1]);
    assert_eq!(record.battery_room.humidity, vec![52.5]);
}

#[test]
fn hydrogen_strips_ppm_suffix() {
    let record = build_record(&cells(&["电池间氢气传感器", "X", "37PPM"]));
    assert_eq!(record.hydrogen, vec![37.0]);

    let record = build_record(&cells(&["电池间氢气传感器", "X", "none PPM"]));
    assert!(record.hydrogen.is_empty());
}

#[test]
fn hydrogen_without_unit_is_skipped() {
    let record = build_record(&cells(&["电池间氢气传感器", "X", "37"]));
    assert!(record.hydrogen.is_empty());

    let record = build_record(&cells(&["电池间氢气传感器", "X", "37 PPM x"]));
    assert!(record.hydrogen.is_empty());
}

#[test]
fn zone_climate_needs_whitespace_between_readings() {
    let record = build_record(&cells(&["主机房温度湿度", "X", "23.5C45%"]));
    assert!(record.main_room.temperature.is_empty());
    assert!(record.main_room.humidity.is_empty());

    let record = build_record(&cells(&["主机房温度湿度", "X", "23.5 45"]));
    assert_eq!(record.main_room.temperature, vec![23.5]);
    assert_eq!(record.main_room.humidity, vec![45.0]);

    let record = build_record(&cells(&["主机房温度湿度", "X", "23.5% 45C"]));
    assert!(record.main_room.is_empty());
}

#[test]
fn pue_reads_plain_number() {
    let record = build_record(&cells(&["PUE", "正常", "1.42", "PUE", "正常", "n/a"]));
    assert_eq!(record.pue, vec![1.42]);
}

#[test]
fn label_without_room_for_value_is_ignored() {
    let record = build_record(&cells(&["日期:", "2024-01-01", "PUE", "1.4"]));
    assert_eq!(record.dates, vec![date(2024, 1, 1)]);
    assert!(record.pue.is_empty());

    let record = build_record(&cells(&["2024-01-01", "日期:"]));
    assert!(record.is_empty());
}

#[test]
fn value_cell_can_itself_be_a_label() {
    let record = build_record(&cells(&["日期:", "日期:", "2024-01-03"]));
    assert_eq!(record.dates, vec![date(2024, 1, 3)]);
}

#[test]
fn series_grow_independently_and_can_misalign() {
    let stream = cells(&[
        "日期:",
        "2024-01-01",
        "主机房温度湿度",
        "正常",
        "23.5C 45%",
        "PUE",
        "正常",
        "1.5",
        "日期:",
        "2024-01-02",
        "主机房温度湿度",
        "正常",
        "传感器离线",
        "PUE",
        "正常",
        "1.6",
        "日期:",
        "2024-01-03",
        "主机房温度湿度",
        "正常",
        "22.0C 47%",
    ]);
    let record = build_record(&stream);

    assert_eq!(record.dates.len(), 3);
    assert_eq!(record.pue, vec![1.5, 1.6]);
    assert_eq!(record.main_room.temperature, vec![23.5, 22.0]);
    assert!(!record.is_aligned());

    // The reading taken on 01-03 sits at index 1, next to the 01-02 date.
    assert_eq!(record.dates[1], date(2024, 1, 2));
    assert_eq!(record.main_room.temperature[1], 22.0);
}

#[test]
fn consistent_reports_stay_aligned() {
    let stream = cells(&[
        "日期:", "2024-01-01", "PUE", "正常", "1.5", "日期:", "2024-01-02", "PUE", "正常", "1.4",
    ]);
    let record = build_record(&stream);
    assert!(record.is_aligned());
    assert_eq!(record.series(Metric::Pue), &[1.5, 1.4]);
}

#[test]
fn building_is_deterministic() {
    let stream = cells(&[
        "日期:",
        "2024-05-01",
        "运营间温度湿度",
        "正常",
        "25C 50%",
        "电池间氢气传感器",
        "正常",
        "12PPM",
    ]);
    assert_eq!(build_record(&stream), build_record(&stream));
}

#[test]
fn standard_vocabulary_has_eight_rules() {
    let vocabulary = FieldVocabulary::standard();
    assert_eq!(vocabulary.len(), 8);

    let date_rule = vocabulary.lookup("日期:").expect("date rule");
    assert_eq!(date_rule.offset(), 1);
    assert_eq!(date_rule.kind(), &RuleKind::Date);

    for zone in Zone::ALL {
        let label = format!("{}温度湿度", zone.display_name());
        let rule = vocabulary.lookup(&label).expect("zone rule");
        assert_eq!(rule.offset(), 2);
        assert_eq!(rule.kind(), &RuleKind::ZoneClimate(zone));
    }

    assert!(vocabulary.lookup("pue").is_none());
    assert!(vocabulary.lookup("日期").is_none());
}

#[test]
fn rules_parse_independently_of_the_scan() {
    let vocabulary = FieldVocabulary::standard();
    let hydrogen = vocabulary.lookup("电池间氢气传感器").expect("hydrogen rule");
    assert_eq!(
        hydrogen.parse("8.5ppm"),
        Some(FieldValue::Scalar(ScalarField::Hydrogen, 8.5))
    );
    assert_eq!(hydrogen.parse("PPM"), None);

    let zone = vocabulary.lookup("配电间温度湿度").expect("zone rule");
    assert_eq!(
        zone.parse("26.0C 38%"),
        Some(FieldValue::ZoneClimate {
            zone: Zone::PowerRoom,
            temperature: 26.0,
            humidity: 38.0,
        })
    );
    assert_eq!(zone.parse("26.0C 38% 12"), None);
}

#[test]
fn custom_vocabulary_changes_recognition() {
    let vocabulary = FieldVocabulary::new(vec![FieldRule::date("Date", 1)])
        .with_rule(FieldRule::scalar("Hydrogen", 1, ScalarField::Hydrogen, Some("ppm")))
        .with_rule(FieldRule::date("Date", 2));
    assert_eq!(vocabulary.len(), 2);

    let stream = cells(&["Date", "skip", "2024-07-01", "Hydrogen", "3 ppm", "日期:", "2024-07-02"]);
    let record = build_record_with(&stream, &vocabulary);
    assert_eq!(record.dates, vec![date(2024, 7, 1)]);
    assert_eq!(record.hydrogen, vec![3.0]);
}

#[test]
fn docx_tables_flatten_in_document_order() {
    let body = format!(
        "{}<w:p><w:r><w:t>正文</w:t></w:r></w:p>{}",
        table_xml(&[&["日期:", "2024-03-01"], &["PUE", "正常", "1.45"]]),
        table_xml(&[&["电池间氢气传感器", "正常", "20PPM"]]),
    );
    let document = DocxReader.read(&docx_bytes(&body)).expect("docx parse failed");

    assert_eq!(document.tables.len(), 2);
    assert_eq!(document.tables[0].rows[1], cells(&["PUE", "正常", "1.45"]));

    let stream = extract_cells(&[document]);
    assert_eq!(
        stream,
        cells(&["日期:", "2024-03-01", "PUE", "正常", "1.45", "电池间氢气传感器", "正常", "20PPM"])
    );
    let record = build_record(&stream);
    assert_eq!(record.dates, vec![date(2024, 3, 1)]);
    assert_eq!(record.pue, vec![1.45]);
    assert_eq!(record.hydrogen, vec![20.0]);
}

#[test]
fn docx_merged_cells_repeat_text_until_collapsed() {
    let body = concat!(
        "<w:tbl>",
        "<w:tr>",
        "<w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>主机房温度湿度</w:t></w:r></w:p></w:tc>",
        "<w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr><w:p><w:r><w:t>正常</w:t></w:r></w:p></w:tc>",
        "<w:tc><w:p><w:r><w:t>23.5C</w:t></w:r><w:r><w:t xml:space=\"preserve\"> 45%</w:t></w:r></w:p></w:tc>",
        "</w:tr>",
        "<w:tr>",
        "<w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>冷通道温度湿度</w:t></w:r></w:p></w:tc>",
        "<w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>",
        "<w:tc><w:p><w:r><w:t>20C 40%</w:t></w:r></w:p></w:tc>",
        "</w:tr>",
        "</w:tbl>",
    );
    let document = DocxReader.read(&docx_bytes(body)).expect("docx parse failed");

    let rows = &document.tables[0].rows;
    assert_eq!(rows[0], cells(&["主机房温度湿度", "主机房温度湿度", "正常", "23.5C 45%"]));
    assert_eq!(rows[1], cells(&["冷通道温度湿度", "冷通道温度湿度", "正常", "20C 40%"]));

    let record = build_record(&extract_cells(&[document]));
    assert_eq!(record.main_room.temperature, vec![23.5]);
    assert_eq!(record.main_room.humidity, vec![45.0]);
    assert_eq!(record.cold_aisle.temperature, vec![20.0]);
    assert_eq!(record.cold_aisle.humidity, vec![40.0]);
}

#[test]
fn docx_cell_text_joins_paragraphs_and_skips_nested_tables() {
    let body = concat!(
        "<w:tbl><w:tr>",
        "<w:tc><w:p><w:r><w:t>备注</w:t></w:r></w:p><w:p><w:r><w:t>第二行</w:t><w:tab/><w:t>末尾</w:t></w:r></w:p>",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>嵌套</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        "<w:p/></w:tc>",
        "<w:tc><w:p><w:r><w:t>A &amp; B</w:t></w:r></w:p></w:tc>",
        "</w:tr></w:tbl>",
    );
    let document = DocxReader.read(&docx_bytes(body)).expect("docx parse failed");

    assert_eq!(document.tables.len(), 1);
    assert_eq!(
        document.tables[0].rows[0],
        cells(&["备注\n第二行\t末尾\n", "A & B"])
    );
}

#[test]
fn docx_without_tables_yields_no_cells() {
    let body = "<w:p><w:r><w:t>巡检报告</w:t></w:r></w:p>";
    let document = read_document(&docx_bytes(body)).expect("docx parse failed");
    assert!(document.tables.is_empty());
    assert!(extract_cells(&[document]).is_empty());
}

#[test]
fn plain_text_is_not_docx() {
    let err = DocxReader
        .read(b"date,pue\n2024-01-01,1.4\n")
        .expect_err("text should not parse as docx");
    assert!(matches!(err, ParserError::FormatMismatch { .. }));
}

#[test]
fn truncated_docx_is_an_archive_error() {
    let mut bytes = docx_bytes(&table_xml(&[&["PUE", "正常", "1.5"]]));
    bytes.truncate(24);
    let err = read_document(&bytes).expect_err("truncated archive should fail");
    assert!(matches!(err, ParserError::Zip { .. }), "unexpected error {err:?}");
}

#[test]
fn zip_without_document_part_is_reported() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("readme.txt", FileOptions::default())
        .expect("start entry");
    zip.write_all(b"hello").expect("write entry");
    let bytes = zip.finish().expect("finish zip").into_inner();

    let err = read_document(&bytes).expect_err("missing part should fail");
    assert!(matches!(
        err,
        ParserError::MissingPart {
            part: "word/document.xml",
            ..
        }
    ));
}

#[test]
fn binary_garbage_matches_no_reader() {
    let err = read_document(&[0xff, 0xfe, 0x00, 0x81, 0x92]).expect_err("garbage should fail");
    match err {
        ParserError::UnknownFormat(rejections) => {
            assert_eq!(rejections.readers().collect::<Vec<_>>(), vec!["DOCX", "DELIMITED"]);
            let message = rejections.to_string();
            let expected = "DOCX declined (content is not a zip container); DELIMITED declined";
            assert!(message.starts_with(expected), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn delimited_text_reads_as_one_table() {
    let text = "日期:\t2024-04-01\nPUE\t正常\t1.38\n";
    let document = DelimitedReader.read(text.as_bytes()).expect("tsv parse failed");
    assert_eq!(
        document,
        TableDocument::new(vec![Table::new(vec![
            cells(&["日期:", "2024-04-01"]),
            cells(&["PUE", "正常", "1.38"]),
        ])])
    );

    let record = build_record(&extract_cells(&[document]));
    assert_eq!(record.dates, vec![date(2024, 4, 1)]);
    assert_eq!(record.pue, vec![1.38]);
}

#[test]
fn record_serializes_every_series() {
    let record = build_record(&cells(&["日期:", "2024-01-01", "PUE", "正常", "1.5"]));
    let json = serde_json::to_value(&record).expect("serialize record");
    assert_eq!(json["dates"][0], "2024-01-01");
    assert_eq!(json["pue"][0], 1.5);
    assert!(json["main_room"]["temperature"].as_array().expect("array").is_empty());
}
