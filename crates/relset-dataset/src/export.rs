//! Corpus serialization
//!
//! Writes the three output formats:
//! - records file: JSON array of `{text, triple_list}`
//! - SPN file: one `{sentText, relationMentions}` object per line
//! - registry file: `[{id: label}, {label: id}]`
//!
//! Files are truncated on open, so rerunning a build replaces its output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use relset_core::config::OutputConfig;
use relset_core::{Record, RelationRegistry, RelsetError, Result};

/// One line of the SPN file
#[derive(Debug, Serialize)]
struct SpnLine<'a> {
    #[serde(rename = "sentText")]
    sent_text: &'a str,
    #[serde(rename = "relationMentions")]
    relation_mentions: Vec<SpnMention<'a>>,
}

#[derive(Debug, Serialize)]
struct SpnMention<'a> {
    #[serde(rename = "em1Text")]
    em1_text: &'a str,
    #[serde(rename = "em2Text")]
    em2_text: &'a str,
    label: &'a str,
}

impl<'a> From<&'a Record> for SpnLine<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            sent_text: &record.text,
            relation_mentions: record
                .triple_list
                .iter()
                .map(|t| SpnMention {
                    em1_text: &t.subject,
                    em2_text: &t.object,
                    label: &t.predicate,
                })
                .collect(),
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| RelsetError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RelsetError + '_ {
    move |e| RelsetError::Io {
        path: path.to_path_buf(),
        source: e,
    }
}

fn json_err(path: &Path) -> impl FnOnce(serde_json::Error) -> RelsetError + '_ {
    move |e| RelsetError::Json {
        path: path.to_path_buf(),
        source: e,
    }
}

/// Write records as a JSON array
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, records).map_err(json_err(path))?;
    writer.flush().map_err(io_err(path))
}

/// Write records as SPN-style JSON lines
pub fn write_spn(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer = create(path)?;
    for record in records {
        serde_json::to_writer(&mut writer, &SpnLine::from(record)).map_err(json_err(path))?;
        writer.write_all(b"\n").map_err(io_err(path))?;
    }
    writer.flush().map_err(io_err(path))
}

/// Write the forward/reverse relation table
pub fn write_registry(path: &Path, registry: &RelationRegistry) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, registry).map_err(json_err(path))?;
    writer.flush().map_err(io_err(path))
}

// ============================================================================
// Dataset writer
// ============================================================================

/// Writes named splits and the registry into one output directory
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    dir: PathBuf,
    prefix: String,
    registry_file: String,
}

impl DatasetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&OutputConfig {
            dir: dir.into(),
            ..OutputConfig::default()
        })
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            prefix: config.prefix.clone(),
            registry_file: config.registry_file.clone(),
        }
    }

    pub fn records_path(&self, split: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, split))
    }

    pub fn spn_path(&self, split: &str) -> PathBuf {
        self.dir.join(format!("{}_{}_spn.json", self.prefix, split))
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(&self.registry_file)
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))
    }

    /// Write the records and SPN files of one split
    pub fn write_split(&self, split: &str, records: &[Record]) -> Result<()> {
        self.ensure_dir()?;
        let records_path = self.records_path(split);
        let spn_path = self.spn_path(split);

        write_records(&records_path, records)?;
        write_spn(&spn_path, records)?;

        tracing::info!(
            "Wrote {} {} record(s) to {} and {}",
            records.len(),
            split,
            records_path.display(),
            spn_path.display()
        );
        Ok(())
    }

    pub fn write_registry(&self, registry: &RelationRegistry) -> Result<()> {
        self.ensure_dir()?;
        let path = self.registry_path();
        write_registry(&path, registry)?;
        tracing::info!("Wrote {} relation label(s) to {}", registry.len(), path.display());
        Ok(())
    }
}
