//! Layered configuration for the splitter.
//!
//! Values are resolved in three layers: built-in defaults, then the YAML config
//! file, then flags given on the command line. The merged [`SplitConfig`] is the
//! persisted form; [`SplitConfig::validate`] turns it into the immutable
//! [`Settings`] handed to every pipeline stage.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{cli::SplitOptions, error::SplitError, io_utils};

pub const DEFAULT_CONFIG_FILE: &str = "csv-col-splitter.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SplitConfig {
    pub work_dir: PathBuf,
    pub source_pattern: String,
    pub with_headers: bool,
    /// 1-based position of the packed column.
    pub target_col: i64,
    #[serde(with = "separator_char")]
    pub col_separator: u8,
    pub subcol_delimiter: String,
    pub keyvalue_delimiter: String,
    pub key_position: i64,
    pub result_file_sfx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_encoding: Option<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            source_pattern: "*.csv".to_string(),
            with_headers: true,
            target_col: 8,
            col_separator: b';',
            subcol_delimiter: "&".to_string(),
            keyvalue_delimiter: "@".to_string(),
            key_position: 1,
            result_file_sfx: "_splt".to_string(),
            input_encoding: None,
        }
    }
}

/// Which half of a `part0<kv>part1` pair names the sub-column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPosition {
    First,
    Second,
}

impl KeyPosition {
    pub fn from_index(index: i64) -> Result<Self, SplitError> {
        match index {
            0 => Ok(KeyPosition::First),
            1 => Ok(KeyPosition::Second),
            other => Err(SplitError::InvalidKeyPosition(other)),
        }
    }

    pub fn key_index(self) -> usize {
        match self {
            KeyPosition::First => 0,
            KeyPosition::Second => 1,
        }
    }

    pub fn value_index(self) -> usize {
        1 - self.key_index()
    }
}

/// Delimiters and position rules used to decode a packed cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEncoding {
    /// 0-based index of the packed column.
    pub target_column: usize,
    pub subcol_delimiter: String,
    pub keyvalue_delimiter: String,
    pub key_position: KeyPosition,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub work_dir: PathBuf,
    pub source_pattern: String,
    pub has_headers: bool,
    pub delimiter: u8,
    pub cell: CellEncoding,
    pub result_suffix: String,
    pub encoding: &'static Encoding,
}

impl SplitConfig {
    /// Reads a YAML config file. Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = self.to_yaml()?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(serialized.as_bytes())
            .with_context(|| format!("Writing config file {path:?}"))?;
        file.flush()?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing configuration")
    }

    /// Builds the effective configuration for a run.
    ///
    /// An explicitly named config file must exist; the default one is optional.
    pub fn resolve(options: &SplitOptions) -> Result<Self> {
        let base = match &options.config {
            Some(path) => {
                info!("Using config file {path:?} from the command line");
                Self::load(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    info!("Using config file {default_path:?}");
                    Self::load(default_path)?
                } else {
                    info!("No {DEFAULT_CONFIG_FILE} found; using default values");
                    Self::default()
                }
            }
        };
        Ok(base.with_overrides(options))
    }

    /// Like [`SplitConfig::resolve`], but a named config file that does not exist
    /// yet starts from defaults so freezing can create it.
    pub fn resolve_for_freeze(options: &SplitOptions) -> Result<Self> {
        match &options.config {
            Some(path) if !path.exists() => {
                info!("Config file {path:?} does not exist yet; starting from default values");
                Ok(Self::default().with_overrides(options))
            }
            _ => Self::resolve(options),
        }
    }

    pub fn with_overrides(mut self, options: &SplitOptions) -> Self {
        if let Some(work_dir) = &options.work_dir {
            self.work_dir = work_dir.clone();
        }
        if let Some(pattern) = &options.source_pattern {
            self.source_pattern = pattern.clone();
        }
        if let Some(with_headers) = options.with_headers {
            self.with_headers = with_headers;
        }
        if let Some(target_col) = options.target_col {
            self.target_col = target_col;
        }
        if let Some(separator) = options.col_separator {
            self.col_separator = separator;
        }
        if let Some(delimiter) = &options.subcol_delimiter {
            self.subcol_delimiter = delimiter.clone();
        }
        if let Some(delimiter) = &options.keyvalue_delimiter {
            self.keyvalue_delimiter = delimiter.clone();
        }
        if let Some(position) = options.key_position {
            self.key_position = position;
        }
        if let Some(suffix) = &options.result_file_sfx {
            self.result_file_sfx = suffix.clone();
        }
        if let Some(encoding) = &options.input_encoding {
            self.input_encoding = Some(encoding.clone());
        }
        self
    }

    pub fn validate(&self) -> Result<Settings> {
        let key_position = KeyPosition::from_index(self.key_position)?;
        if self.target_col < 1 {
            return Err(SplitError::InvalidTargetColumn(self.target_col).into());
        }
        let target_column = usize::try_from(self.target_col - 1)
            .map_err(|_| SplitError::InvalidTargetColumn(self.target_col))?;

        ensure_setting(
            !self.subcol_delimiter.is_empty(),
            "subcol-delimiter",
            "must not be empty",
        )?;
        ensure_setting(
            !self.keyvalue_delimiter.is_empty(),
            "keyvalue-delimiter",
            "must not be empty",
        )?;
        ensure_setting(
            self.subcol_delimiter != self.keyvalue_delimiter,
            "keyvalue-delimiter",
            "must differ from subcol-delimiter",
        )?;
        ensure_setting(
            !self.result_file_sfx.is_empty(),
            "result-file-sfx",
            "must not be empty",
        )?;
        let separator = self.col_separator as char;
        ensure_setting(
            !self.subcol_delimiter.contains(separator),
            "subcol-delimiter",
            "must not contain the column separator",
        )?;
        ensure_setting(
            !self.keyvalue_delimiter.contains(separator),
            "keyvalue-delimiter",
            "must not contain the column separator",
        )?;
        let encoding = io_utils::resolve_encoding(self.input_encoding.as_deref()).map_err(
            |err| SplitError::InvalidSetting {
                key: "input-encoding",
                reason: err.to_string(),
            },
        )?;

        Ok(Settings {
            work_dir: self.work_dir.clone(),
            source_pattern: self.source_pattern.clone(),
            has_headers: self.with_headers,
            delimiter: self.col_separator,
            cell: CellEncoding {
                target_column,
                subcol_delimiter: self.subcol_delimiter.clone(),
                keyvalue_delimiter: self.keyvalue_delimiter.clone(),
                key_position,
            },
            result_suffix: self.result_file_sfx.clone(),
            encoding,
        })
    }
}

fn ensure_setting(condition: bool, key: &'static str, reason: &str) -> Result<(), SplitError> {
    if condition {
        Ok(())
    } else {
        Err(SplitError::InvalidSetting {
            key,
            reason: reason.to_string(),
        })
    }
}

/// Stores the column separator as a one-character string in YAML.
mod separator_char {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&(*value as char).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::cli::parse_delimiter(&raw).map_err(de::Error::custom)
    }
}
