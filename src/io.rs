//! Document reading and atomic writing
//!
//! Outputs are first written to a temporary file next to the destination and moved into place
//! only once complete, so a failure never leaves a partial file at the destination.

use crate::error::IoError;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> IoError + '_ {
    move |source| IoError::Io {
        path: path_string(path),
        source,
    }
}

pub fn read_json<T, P>(path: P) -> Result<T, IoError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| IoError::Json {
        path: path_string(path),
        source,
    })
}

/// Deserialize every record of a headed CSV file
pub fn read_csv<T, P>(path: P) -> Result<Vec<T>, IoError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let csv_error = |source| IoError::Csv {
        path: path_string(path),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error)
}

/// Serialize `value` as JSON into `path`, replacing it only after the write has succeeded
pub fn write_json_atomic<T, P>(value: &T, path: P) -> Result<(), IoError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(path))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, value).map_err(|source| IoError::Json {
            path: path_string(path),
            source,
        })?;
        writer.flush().map_err(io_error(path))?;
    }
    tmp.persist(path).map_err(|source| IoError::Persist {
        path: path_string(path),
        source,
    })?;
    Ok(())
}
