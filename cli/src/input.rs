//! Loading JSON Lines snapshots

use partsizer_core::Record;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::error::CliError;

/// Read records from `path`, or from stdin when `path` is `-`
pub async fn load_records(path: &Path) -> Result<Vec<Record>, CliError> {
    let read_error = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };

    let records = if path == Path::new("-") {
        parse_records(tokio::io::stdin()).await
    } else {
        let file = tokio::fs::File::open(path).await.map_err(read_error)?;
        parse_records(file).await
    };

    match records {
        Err(CliError::Read { source, .. }) => Err(read_error(source)),
        other => other,
    }
}

/// Parse one JSON object per line; blank lines are ignored
pub async fn parse_records<R>(reader: R) -> Result<Vec<Record>, CliError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut records = Vec::new();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await.map_err(|source| CliError::Read {
        path: "-".into(),
        source,
    })? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line).map_err(|source| CliError::Record {
            line: line_no,
            source,
        })?;
        records.push(record);
    }

    debug!(records = records.len(), "Loaded records");
    Ok(records)
}
