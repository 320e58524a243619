use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use evolution::{GenerationStats, Termination};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The amount of samples on each side of the splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSizes {
    pub fit: usize,
    pub validation: usize,
    pub test: usize,
}

/// The accuracy of a set of parameters on every split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub train_accuracy: f32,
    pub validation_accuracy: f32,
    pub test_accuracy: f32,
}

/// The outcome of fitting the classifier alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub sizes: DatasetSizes,
    pub baseline: Scores,
    pub loss_curve: Vec<f32>,
}

/// The outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub sizes: DatasetSizes,
    pub baseline: Scores,
    pub evolved: Scores,
    pub loss_curve: Vec<f32>,
    pub history: Vec<GenerationStats>,
    pub termination: Termination,
    pub evaluations: usize,
    /// Test set counts, rows are the true digit and columns the predicted one.
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl RunReport {
    /// Writes the whole report as pretty printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the fitness history, one row per generation.
    pub fn write_history_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.history_csv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn history_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "generation,best,mean,worst,std_dev")?;

        for stats in &self.history {
            writeln!(
                writer,
                "{},{},{},{},{}",
                stats.generation, stats.best, stats.mean, stats.worst, stats.std_dev
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let stats = |generation, best| GenerationStats {
            generation,
            best,
            mean: 0.5,
            worst: 0.25,
            std_dev: 0.1,
        };
        let scores = Scores {
            train_accuracy: 1.,
            validation_accuracy: 0.9,
            test_accuracy: 0.8,
        };

        RunReport {
            sizes: DatasetSizes {
                fit: 8,
                validation: 2,
                test: 3,
            },
            baseline: scores,
            evolved: scores,
            loss_curve: vec![2., 1.],
            history: vec![stats(0, 0.75), stats(1, 0.875)],
            termination: Termination::MaxGenerations,
            evaluations: 12,
            confusion_matrix: vec![vec![1, 0], vec![0, 2]],
        }
    }

    #[test]
    fn history_csv_has_one_row_per_generation() {
        let mut out = Vec::new();
        report().history_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            [
                "generation,best,mean,worst,std_dev",
                "0,0.75,0.5,0.25,0.1",
                "1,0.875,0.5,0.25,0.1"
            ]
        );
    }

    #[test]
    fn json_report_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report().write_json(&path).unwrap();
        let read: RunReport = serde_json::from_reader(File::open(&path).unwrap()).unwrap();

        assert_eq!(read, report());
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"max_generations\""));
    }
}
