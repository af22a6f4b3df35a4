//! CSV backup of episode outcomes.

use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::{error::Result, simulation::EpisodeSummary};

/// One backup row per episode.
#[derive(Debug, Serialize)]
struct BackupRow {
    elapsed_time: f64,
    total_return: f64,
    steps: usize,
    reached_goal: bool,
}

impl From<&EpisodeSummary> for BackupRow {
    fn from(summary: &EpisodeSummary) -> Self {
        Self {
            elapsed_time: summary.elapsed_time,
            total_return: summary.total_return,
            steps: summary.step_count(),
            reached_goal: summary.reached_goal,
        }
    }
}

/// Write episode outcomes to a CSV file, one row per episode, overwriting
/// any previous backup at the path.
pub fn write_backup<P: AsRef<Path>>(
    path: P,
    separator: u8,
    summaries: &[EpisodeSummary],
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(separator)
        .from_path(path.as_ref())?;
    for summary in summaries {
        writer.serialize(BackupRow::from(summary))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::StepRecord;

    fn summary(total_return: f64) -> EpisodeSummary {
        EpisodeSummary {
            steps: vec![StepRecord {
                step: 0,
                time: 0.0,
                location: "A".to_string(),
                action: "B".to_string(),
                reward: total_return,
            }],
            total_return,
            elapsed_time: 4.0,
            reached_goal: true,
        }
    }

    #[test]
    fn backup_file_carries_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.csv");
        write_backup(&path, b';', &[summary(1.0), summary(0.5)]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "elapsed_time;total_return;steps;reached_goal"
        );
        assert_eq!(lines.next().unwrap(), "4.0;1.0;1;true");
        assert_eq!(lines.clone().count(), 1);
    }
}
