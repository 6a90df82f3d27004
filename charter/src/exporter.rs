use crate::chart::{Chart, ChartEvent, ChartSource, NoteKind};
use crate::difficulty::Difficulty;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChartExport {
    pub title: String,
    pub difficulty: Difficulty,
    pub lanes: usize,
    pub bpm: Option<u32>,
    #[serde(default)]
    pub phase: f32,
    pub seed: u64,
    pub source: ChartSource,
    pub generated_at: i64,
    pub notes: Vec<ChartEvent>,
}

impl ChartExport {
    pub fn new(title: String, difficulty: Difficulty, lanes: usize, seed: u64, chart: &Chart) -> Self {
        let generated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        ChartExport {
            title,
            difficulty,
            lanes,
            bpm: chart.bpm,
            phase: chart.phase,
            seed,
            source: chart.source,
            generated_at,
            notes: chart.events.clone(),
        }
    }

    pub fn hold_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_hold()).count()
    }

    /// Export to JSON format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Export to the text-based .chart format
    pub fn to_chart(&self) -> String {
        let mut output = String::new();

        output.push_str("[SONG]\n");
        let _ = writeln!(output, "  Title = \"{}\"", self.title);
        match self.bpm {
            Some(bpm) => {
                let _ = writeln!(output, "  BPM = {}", bpm);
            }
            None => output.push_str("  BPM = ?\n"),
        }
        let _ = writeln!(output, "  Gap = {:.3}\n", self.phase);

        output.push_str("[NOTES]\n");
        let _ = writeln!(output, "  Difficulty = {}", self.difficulty);
        let _ = writeln!(output, "  Lanes = {}", self.lanes);
        let _ = writeln!(output, "  Seed = {}", self.seed);
        let _ = writeln!(output, "  Notes = {}", self.notes.len());
        output.push_str(":\n");

        for note in &self.notes {
            match note.kind {
                NoteKind::Tap => {
                    let _ = writeln!(output, "  1|{}|{:.3}", note.lane, note.time);
                }
                NoteKind::Hold { end } => {
                    let _ = writeln!(output, "  2|{}|{:.3}|{:.3}", note.lane, note.time, end);
                }
            }
        }

        output.push_str(";\n");
        output
    }

    /// Save chart to file
    pub fn save(&self, path: &Path, format: ChartFormat) -> Result<()> {
        let content = match format {
            ChartFormat::Json => self.to_json()?,
            ChartFormat::Chart => self.to_chart(),
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a JSON chart file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartFormat {
    Json,
    Chart,
}

impl ChartFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ChartFormat::Json),
            "chart" => Some(ChartFormat::Chart),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Json => "json",
            ChartFormat::Chart => "chart",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chart() -> Chart {
        Chart {
            events: vec![ChartEvent::tap(0.5, 2), ChartEvent::hold(1.0, 1.75, 4)],
            bpm: Some(120),
            phase: 0.02,
            source: ChartSource::Onsets,
        }
    }

    #[test]
    fn test_chart_export_json() {
        let chart = ChartExport::new("test_song".into(), Difficulty::Easy, 6, 9, &sample_chart());
        let json = chart.to_json().unwrap();
        assert!(json.contains("\"difficulty\": \"EASY\""));
        assert!(json.contains("\"lane\": 2"));
        assert!(json.contains("\"type\": \"hold\""));

        let back = ChartExport::from_json(&json).unwrap();
        assert_eq!(back.notes, chart.notes);
        assert_eq!(back.hold_count(), 1);
    }

    #[test]
    fn test_chart_export_chart_format() {
        let chart = ChartExport::new("test_song".into(), Difficulty::Hard, 6, 1, &sample_chart());
        let text = chart.to_chart();
        assert!(text.contains("BPM = 120"));
        assert!(text.contains("Difficulty = HARD"));
        assert!(text.contains("Lanes = 6"));
        assert!(text.contains("2|4|1.000|1.750"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_normal.json");
        let chart = ChartExport::new("song".into(), Difficulty::Normal, 6, 3, &sample_chart());
        chart.save(&path, ChartFormat::Json).unwrap();
        let loaded = ChartExport::load(&path).unwrap();
        assert_eq!(loaded.notes, chart.notes);
        assert_eq!(loaded.seed, 3);
    }

    #[test]
    fn test_chart_format_detection() {
        assert_eq!(ChartFormat::parse("json").unwrap().extension(), "json");
        assert_eq!(ChartFormat::parse("CHART").unwrap().extension(), "chart");
        assert!(ChartFormat::parse("invalid").is_none());
    }
}
