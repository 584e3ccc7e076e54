use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
  /// A single JSON array, written once all records have been retrieved
  #[default]
  Json,
  /// One JSON document per line, written as each page arrives
  Jsonl,
  /// A single YAML sequence, written once all records have been retrieved
  Yaml,
}

/// Writes records to the wrapped writer in the selected format
pub struct ItemWriter<W: Write, T: Serialize> {
  writer: W,
  format: OutputFormat,
  buffered: Vec<T>,
  written: usize,
}

impl<W: Write, T: Serialize> ItemWriter<W, T> {
  pub fn new(writer: W, format: OutputFormat) -> Self {
    Self {
      writer,
      format,
      buffered: Vec::new(),
      written: 0,
    }
  }

  pub fn write(&mut self, item: T) -> Result<()> {
    match self.format {
      OutputFormat::Jsonl => {
        serde_json::to_writer(&mut self.writer, &item)?;
        writeln!(self.writer)?;
      }
      OutputFormat::Json | OutputFormat::Yaml => self.buffered.push(item),
    }
    self.written += 1;

    Ok(())
  }

  /// Write out any buffered records, returning the total number of records written
  pub fn finish(&mut self) -> Result<usize> {
    match self.format {
      OutputFormat::Json => {
        serde_json::to_writer_pretty(&mut self.writer, &self.buffered)?;
        writeln!(self.writer)?;
      }
      OutputFormat::Yaml => serde_yaml::to_writer(&mut self.writer, &self.buffered)?,
      OutputFormat::Jsonl => {}
    }
    self.buffered.clear();
    self.writer.flush()?;

    Ok(self.written)
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Serialize)]
  #[serde(rename_all = "PascalCase")]
  struct Record {
    name: &'static str,
    size: u32,
  }

  fn render(format: OutputFormat, records: Vec<Record>) -> (String, usize) {
    let mut writer = ItemWriter::new(Vec::new(), format);
    for record in records {
      writer.write(record).unwrap();
    }
    let written = writer.finish().unwrap();

    (String::from_utf8(writer.into_inner()).unwrap(), written)
  }

  #[test]
  fn it_writes_json_lines() {
    let (output, written) = render(
      OutputFormat::Jsonl,
      vec![Record { name: "a", size: 1 }, Record { name: "b", size: 2 }],
    );

    assert_eq!(written, 2);
    assert_eq!(output, "{\"Name\":\"a\",\"Size\":1}\n{\"Name\":\"b\",\"Size\":2}\n");
  }

  #[test]
  fn it_writes_json_array() {
    let (output, written) = render(OutputFormat::Json, vec![Record { name: "a", size: 1 }]);

    assert_eq!(written, 1);
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed, serde_json::json!([{"Name": "a", "Size": 1}]));
  }

  #[test]
  fn it_writes_empty_json_array() {
    let (output, written) = render(OutputFormat::Json, vec![]);

    assert_eq!(written, 0);
    assert_eq!(output, "[]\n");
  }

  #[test]
  fn it_writes_yaml() {
    let (output, _) = render(OutputFormat::Yaml, vec![Record { name: "a", size: 1 }]);

    assert!(output.starts_with("- Name: a\n"));
    assert!(output.contains("Size: 1"));
  }
}
