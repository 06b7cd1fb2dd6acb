use crate::domain::model::{Header, Record};
use csv::StringRecord;

pub const DEFAULT_DELIMITER: char = ',';

/// Splits a line on every occurrence of `delimiter`. There is no quoting, so
/// empty fields are kept and an empty line yields a single empty field.
pub fn parse_row(line: &str, delimiter: char) -> StringRecord {
    line.split(delimiter).collect()
}

pub fn parse_header(line: &str, delimiter: char) -> Header {
    Header::new(parse_row(line, delimiter))
}

/// Pairs header names with row values up to the shorter of the two. Extra
/// values are dropped and missing trailing columns are left out of the record.
pub fn build_record(header: &Header, row: &StringRecord) -> Record {
    let mut record = Record::new();
    for (name, value) in header.iter().zip(row.iter()) {
        record.insert(name, value);
    }
    record
}
