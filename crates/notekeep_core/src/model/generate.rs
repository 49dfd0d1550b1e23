//! Random sample notes.
//!
//! # Invariants
//! - A generated schedule date lies within `SCHEDULE_SPREAD_DAYS` of `now`,
//!   past or future.

use crate::model::note::{NoteDraft, NoteState, NoteType};
use rand::seq::SliceRandom;
use rand::Rng;

/// Probability that a generated note also gets a schedule.
pub const SCHEDULE_PROBABILITY: f64 = 0.7;

const SCHEDULE_SPREAD_DAYS: i64 = 20;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const TITLE_WORDS: &[&str] = &[
    "Groceries", "Meeting", "Birthday", "Laundry", "Report", "Dentist", "Garden", "Invoice",
    "Trip", "Recipe", "Call", "Budget",
];

const TEXT_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

/// Note content plus an optional schedule due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNote {
    pub draft: NoteDraft,
    pub schedule_date: Option<i64>,
}

/// Builds one random note created at `now_ms`.
pub fn random_note<R: Rng + ?Sized>(rng: &mut R, now_ms: i64) -> GeneratedNote {
    let kind = *NoteType::ALL.choose(rng).unwrap_or(&NoteType::None);
    let state = *NoteState::ALL.choose(rng).unwrap_or(&NoteState::InProgress);

    let draft = NoteDraft {
        title: random_title(rng),
        text: random_text(rng),
        kind,
        state,
        creation_date: now_ms,
    };

    let schedule_date = rng.gen_bool(SCHEDULE_PROBABILITY).then(|| {
        let spread = SCHEDULE_SPREAD_DAYS * DAY_MS;
        now_ms + rng.gen_range(-spread..=spread)
    });

    GeneratedNote {
        draft,
        schedule_date,
    }
}

fn random_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word = TITLE_WORDS.choose(rng).copied().unwrap_or("Note");
    format!("{word} #{}", rng.gen_range(1..=999))
}

fn random_text<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.gen_range(4..=12);
    let words: Vec<&str> = (0..count)
        .filter_map(|_| TEXT_WORDS.choose(rng).copied())
        .collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::{random_note, DAY_MS, SCHEDULE_SPREAD_DAYS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_note_uses_given_creation_date() {
        let mut rng = StdRng::seed_from_u64(7);
        let generated = random_note(&mut rng, 1_000_000);
        assert_eq!(generated.draft.creation_date, 1_000_000);
        assert!(!generated.draft.title.is_empty());
        assert!(generated.draft.text.ends_with('.'));
    }

    #[test]
    fn schedule_dates_stay_within_spread_and_both_outcomes_occur() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = 10 * SCHEDULE_SPREAD_DAYS * DAY_MS;
        let mut scheduled = 0;
        for _ in 0..200 {
            if let Some(date) = random_note(&mut rng, now).schedule_date {
                assert!((date - now).abs() <= SCHEDULE_SPREAD_DAYS * DAY_MS);
                scheduled += 1;
            }
        }
        assert!(scheduled > 0 && scheduled < 200);
    }
}
