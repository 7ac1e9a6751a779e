#![allow(dead_code)]

use std::io::{Cursor, Read};

pub const NAMESPACE: &str = "http://www.ritadministratie.org";

/// A trip log with `total` trips. The last `tagged` trips carry `tag` in
/// their driver id so searches for it hit exactly those.
pub fn trip_log(total: usize, tagged: usize, tag: &str) -> String {
    let mut body = String::new();
    for n in 1..=total {
        let driver = if n > total.saturating_sub(tagged) {
            format!("{tag}-{n}")
        } else {
            format!("BST-{n:03}")
        };
        let kind = if n % 2 == 0 { "Zakelijk" } else { "Prive" };
        let price = if n % 2 == 0 {
            format!("<Prijs>{n}.50</Prijs>")
        } else {
            String::new()
        };
        let location = if n % 3 == 0 {
            "<LocBeg><Lat>51.9244</Lat><Lon>4.4777</Lon></LocBeg>"
        } else {
            ""
        };
        body.push_str(&format!(
            "<Rit><Data>\
               <RtVgNr>{n}</RtVgNr>\
               <DatTdReg>2024-06-01T{hour:02}:{minute:02}:00+02:00</DatTdReg>\
               <Type>{kind}</Type>\
               <Bestuurder><ChIdNr>{driver}</ChIdNr></Bestuurder>\
               <KmStdBeg>{start}</KmStdBeg>\
               <KmStdEnd>{end}</KmStdEnd>\
               {price}{location}\
             </Data></Rit>",
            hour = n / 60,
            minute = n % 60,
            start = 50_000 + n * 10,
            end = 50_000 + n * 10 + 7,
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><env:Envelope xmlns:env="urn:envelope" xmlns="{NAMESPACE}"><Ritten>{body}</Ritten></env:Envelope>"#
    )
}

/// Number of data rows (header excluded) in the first sheet of an xlsx file.
pub fn xlsx_data_rows(bytes: &[u8]) -> usize {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("xlsx is a zip archive");
    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .expect("first worksheet present")
        .read_to_string(&mut sheet)
        .expect("worksheet is utf-8");
    sheet.matches("<row ").count().saturating_sub(1)
}

/// Text content of the xlsx shared string table.
pub fn xlsx_shared_strings(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("xlsx is a zip archive");
    let mut strings = String::new();
    if let Ok(mut file) = archive.by_name("xl/sharedStrings.xml") {
        file.read_to_string(&mut strings).expect("shared strings are utf-8");
    }
    strings
}
