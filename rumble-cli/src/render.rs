//! Terminal rendering of API responses

use rumble_common::api::{AnalysisRecord, AnalysisStatus, Combo, EnergySegment, SongDetails};
use rumble_common::time::format_track_position;
use std::fmt::Write;

const BAR_UNIT: &str = "###";

pub fn render_song(song: &SongDetails) -> String {
    format!(
        "{} ({}, {:.1} KiB)\n  id: {}\n  uploaded: {}",
        song.originalname,
        song.mimetype,
        song.size as f64 / 1024.0,
        song.id,
        song.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// One-line status summary
pub fn render_status(analysis: &AnalysisRecord) -> String {
    match analysis.status {
        AnalysisStatus::Completed => {
            let mut line = String::from("Analysis completed");
            if let Some(bpm) = analysis.bpm {
                let _ = write!(line, ": {:.0} BPM", bpm);
                if analysis.variable_bpm == Some(true) {
                    line.push_str(" (variable)");
                }
            }
            if let Some(duration) = analysis.duration {
                let _ = write!(line, ", {}", format_track_position(duration));
            }
            line
        }
        AnalysisStatus::Failed => format!(
            "Analysis failed: {}",
            analysis.error.as_deref().unwrap_or("unknown error")
        ),
        status => {
            let mut line = format!("Analysis {}", status);
            if let Some(bpm) = analysis.bpm {
                let _ = write!(line, " (tempo {:.0} BPM)", bpm);
            }
            line
        }
    }
}

/// One line per segment with a bar proportional to the level
pub fn render_energy_profile(segments: &[EnergySegment]) -> String {
    let mut out = String::from("Energy profile:\n");
    for segment in segments {
        let bar = BAR_UNIT.repeat(segment.level.as_u8() as usize);
        let _ = writeln!(
            out,
            "  {:>5} - {:<5}  {:<9}  {}",
            format_track_position(segment.start_time),
            format_track_position(segment.end_time),
            bar,
            segment.level
        );
    }
    out
}

/// Combos ordered by start time, one per line
pub fn render_combos(combos: &[Combo]) -> String {
    if combos.is_empty() {
        return "No combos\n".to_string();
    }

    let mut sorted: Vec<&Combo> = combos.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let width = sorted.iter().map(|c| c.sequence.len()).max().unwrap_or(0);
    let mut out = format!("Combos ({}):\n", sorted.len());
    for combo in sorted {
        let _ = writeln!(
            out,
            "{:>5}  L{}  {:<width$}  {}",
            format_track_position(combo.time),
            combo.energy_level.as_u8(),
            combo.sequence,
            combo.notation.join(", "),
            width = width
        );
    }
    out
}

/// Combo ids in display order, for picking regeneration targets
pub fn render_combo_ids(combos: &[Combo]) -> String {
    let mut sorted: Vec<&Combo> = combos.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut out = String::new();
    for combo in sorted {
        let _ = writeln!(out, "{:>5}  {}", format_track_position(combo.time), combo.id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumble_common::api::EnergyLevel;
    use rumble_common::time::now;

    fn combo(id: &str, time: f64, level: EnergyLevel, sequence: &str, notation: &[&str]) -> Combo {
        Combo {
            id: id.to_string(),
            sequence: sequence.to_string(),
            notation: notation.iter().map(|s| s.to_string()).collect(),
            energy_level: level,
            bpm: 120.0,
            time,
            duration: 30.0,
            created_at: now(),
        }
    }

    #[test]
    fn test_combos_sorted_by_time() {
        let combos = vec![
            combo("b", 90.0, EnergyLevel::High, "1-2-3-4", &["Jab", "Cross", "Lead hook", "Rear hook"]),
            combo("a", 0.0, EnergyLevel::Low, "1-2", &["Jab", "Cross"]),
        ];

        let out = render_combos(&combos);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Combos (2):");
        assert_eq!(lines[1], " 0:00  L1  1-2      Jab, Cross");
        assert_eq!(lines[2], " 1:30  L3  1-2-3-4  Jab, Cross, Lead hook, Rear hook");
    }

    #[test]
    fn test_empty_combos() {
        assert_eq!(render_combos(&[]), "No combos\n");
    }

    #[test]
    fn test_energy_profile_bars() {
        let segments = vec![
            EnergySegment::new(0.0, 30.0, EnergyLevel::Low),
            EnergySegment::new(30.0, 90.0, EnergyLevel::High),
        ];

        let out = render_energy_profile(&segments);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("0:00 - 0:30"));
        assert!(lines[1].contains("###        low"));
        assert!(lines[2].contains("#########  high"));
    }

    #[test]
    fn test_status_lines() {
        let mut record = AnalysisRecord::pending("song");
        assert_eq!(render_status(&record), "Analysis pending");

        record.status = AnalysisStatus::Processing;
        record.bpm = Some(128.0);
        assert_eq!(render_status(&record), "Analysis processing (tempo 128 BPM)");

        record.status = AnalysisStatus::Completed;
        record.variable_bpm = Some(false);
        record.duration = Some(210.0);
        assert_eq!(render_status(&record), "Analysis completed: 128 BPM, 3:30");

        record.status = AnalysisStatus::Failed;
        record.error = Some("boom".to_string());
        assert_eq!(render_status(&record), "Analysis failed: boom");
    }

    #[test]
    fn test_combo_ids_listed_in_time_order() {
        let combos = vec![
            combo("late", 60.0, EnergyLevel::Medium, "1-2-3", &["Jab", "Cross", "Lead hook"]),
            combo("early", 5.0, EnergyLevel::Low, "1-2", &["Jab", "Cross"]),
        ];
        let out = render_combo_ids(&combos);
        assert_eq!(out, " 0:05  early\n 1:00  late\n");
    }
}
