//! Streaming CSV to JSON conversion.
//!
//! Lines are pulled one at a time from the source and each record is written
//! to the sink as soon as it is built, so memory use is bounded by a single
//! line regardless of object size.

use crate::core::row::{build_record, parse_header, parse_row};
use crate::domain::model::{Header, OutputFormat, Record, TranscodeStats};
use crate::utils::error::{EtlError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

const UTF8_BOM: char = '\u{feff}';

/// Lazy, finite sequence of records read from a CSV source. Not restartable.
pub struct RecordReader<R> {
    lines: Lines<R>,
    header: Header,
    delimiter: char,
    blank_lines: usize,
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    /// Consumes the first line as the header, dropping a leading UTF-8 BOM.
    /// An empty source gets a header with one empty column name and produces
    /// no records.
    pub async fn open(reader: R, delimiter: char) -> Result<Self> {
        let mut lines = reader.lines();
        let header_line = lines
            .next_line()
            .await
            .map_err(EtlError::SourceDecodeError)?
            .unwrap_or_default();
        let header_line = header_line.strip_prefix(UTF8_BOM).unwrap_or(&header_line);

        Ok(Self {
            lines,
            header: parse_header(header_line, delimiter),
            delimiter,
            blank_lines: 0,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn blank_lines(&self) -> usize {
        self.blank_lines
    }

    /// Next record, skipping empty lines. `None` at end of input.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(EtlError::SourceDecodeError)?;

            match line {
                None => return Ok(None),
                Some(line) if line.is_empty() => {
                    self.blank_lines += 1;
                }
                Some(line) => {
                    let row = parse_row(&line, self.delimiter);
                    return Ok(Some(build_record(&self.header, &row)));
                }
            }
        }
    }
}

/// Serializes records into a sink using a single framing for the whole pass.
pub struct JsonWriter<W> {
    sink: W,
    format: OutputFormat,
    written: usize,
    started: bool,
}

impl<W: AsyncWrite + Unpin> JsonWriter<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        Self {
            sink,
            format,
            written: 0,
            started: false,
        }
    }

    async fn begin(&mut self) -> Result<()> {
        if !self.started {
            if self.format == OutputFormat::JsonArray {
                self.sink.write_all(b"[").await?;
            }
            self.started = true;
        }
        Ok(())
    }

    pub async fn write_record(&mut self, record: &Record) -> Result<()> {
        self.begin().await?;
        let json = serde_json::to_vec(record)?;

        match self.format {
            OutputFormat::Ndjson => {
                self.sink.write_all(&json).await?;
                self.sink.write_all(b"\n").await?;
            }
            OutputFormat::JsonArray => {
                if self.written > 0 {
                    self.sink.write_all(b",").await?;
                }
                self.sink.write_all(&json).await?;
            }
        }

        self.written += 1;
        Ok(())
    }

    /// Closes the framing and flushes. Returns the number of records written.
    pub async fn finish(mut self) -> Result<usize> {
        self.begin().await?;
        if self.format == OutputFormat::JsonArray {
            self.sink.write_all(b"]").await?;
        }
        self.sink.flush().await?;
        Ok(self.written)
    }
}

/// Converts one CSV source into JSON records written to `sink`.
pub async fn transcode<R, W>(
    source: R,
    sink: W,
    format: OutputFormat,
    delimiter: char,
) -> Result<TranscodeStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = RecordReader::open(source, delimiter).await?;
    let mut writer = JsonWriter::new(sink, format);

    tracing::debug!("CSV header has {} columns", reader.header().len());

    while let Some(record) = reader.next_record().await? {
        writer.write_record(&record).await?;
    }

    let records = writer.finish().await?;
    Ok(TranscodeStats {
        records,
        blank_lines: reader.blank_lines(),
    })
}
