use std::collections::HashMap;

use crate::error::{MarqueeError, Result};
use crate::types::{ClusterLabel, MovieId};

use super::state::ClusterAssignment;

pub const HEADER: [&str; 2] = ["movie_id", "cluster_label"];

/// Two-column CSV with a header row, sorted by movie id.
pub fn to_csv(assignment: &ClusterAssignment) -> Result<Vec<u8>> {
    let mut rows: Vec<(MovieId, ClusterLabel)> =
        assignment.labels.iter().map(|(&id, &label)| (id, label)).collect();
    rows.sort_unstable();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for (id, label) in rows {
        writer.write_record([id.to_string(), label.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|e| MarqueeError::Internal(format!("csv flush failed: {e}")))
}

/// Parse a `(movie_id, cluster_label)` table. A first row that does not parse is taken
/// as a header; any later bad row fails the whole import.
pub fn from_csv(data: &[u8]) -> Result<HashMap<MovieId, ClusterLabel>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut labels = HashMap::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 1);

        match parse_row(&record) {
            Ok((id, label)) => {
                labels.insert(id, label);
            }
            Err(_) if idx == 0 => continue,
            Err(reason) => return Err(MarqueeError::ClusterImport { line, reason }),
        }
    }
    Ok(labels)
}

fn parse_row(record: &csv::StringRecord) -> std::result::Result<(MovieId, ClusterLabel), String> {
    if record.len() < 2 {
        return Err(format!("expected 2 columns, found {}", record.len()));
    }
    let id = record[0]
        .parse::<MovieId>()
        .map_err(|e| format!("invalid movie id {:?}: {e}", &record[0]))?;
    let label = record[1]
        .parse::<ClusterLabel>()
        .map_err(|e| format!("invalid cluster label {:?}: {e}", &record[1]))?;
    Ok((id, label))
}
