//! Text rendering of note rows.

use chrono::{DateTime, Utc};
use notekeep_core::{NoteAndSchedule, NoteRow, NoteState, NoteType, ScheduleStatus};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

pub fn render_list(items: &[NoteAndSchedule], now_ms: i64) -> String {
    if items.is_empty() {
        return "  (no notes)".to_string();
    }
    items
        .iter()
        .map(|item| render_row(NoteRow::from(item), now_ms))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_row(row: NoteRow<'_>, now_ms: i64) -> String {
    let note = row.note();
    let head = format!(
        "  #{:<4} [{}] {:<8} {}",
        note.id,
        state_mark(note.state),
        type_label(note.kind),
        note.title
    );
    match (row, row.schedule_status(now_ms)) {
        (NoteRow::Scheduled { schedule, .. }, Some(status)) => format!(
            "{head}  (due {}, {})",
            format_date(schedule.date),
            format_status(status)
        ),
        _ => format!("{head}  (created {})", format_date(note.creation_date)),
    }
}

fn state_mark(state: NoteState) -> char {
    match state {
        NoteState::InProgress => ' ',
        NoteState::Done => 'x',
    }
}

fn type_label(kind: NoteType) -> &'static str {
    match kind {
        NoteType::None => "-",
        NoteType::Todo => "todo",
        NoteType::Shopping => "shopping",
        NoteType::Work => "work",
        NoteType::Family => "family",
    }
}

pub fn format_status(status: ScheduleStatus) -> String {
    match status {
        ScheduleStatus::Late => "LATE".to_string(),
        ScheduleStatus::Relative { delta_ms } if delta_ms >= 0 => {
            format!("in {}", format_span(delta_ms))
        }
        ScheduleStatus::Relative { delta_ms } => format!("{} ago", format_span(-delta_ms)),
    }
}

fn format_span(ms: i64) -> String {
    if ms >= DAY_MS {
        format!("{}d", ms / DAY_MS)
    } else if ms >= HOUR_MS {
        format!("{}h", ms / HOUR_MS)
    } else if ms >= MINUTE_MS {
        format!("{}m", ms / MINUTE_MS)
    } else {
        "<1m".to_string()
    }
}

fn format_date(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("@{ms}"))
}
