// Round state machine for one player session, plus the read-side summary
// report. Transitions are pure and synchronous; the handler performs the
// async generation step between reading the seed and applying the result.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::story::{Correction, Story};

/// One player submission, appended per round. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    pub original_story: Story,
    pub player_story: String,
    pub player_significance: String,
    pub timestamp: DateTime<Utc>,
    /// The correction that was on screen when the player submitted.
    /// Present only on corrected-round records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
    pub is_corrected: bool,
}

/// Live state for one session. There is no terminal state: the corrected
/// submission transition always re-enters the next round.
///
/// Invariants: `round == history.len() + 1`; `current_story` is always the
/// seed for the *next* correction, not necessarily what the player last saw.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub current_story: Story,
    pub current_correction: Option<Correction>,
    pub round: u32,
    pub history: Vec<RoundRecord>,
}

impl GameSession {
    /// Enter round 1 with the opening story.
    pub fn start(story: Story) -> Self {
        Self {
            current_story: story,
            current_correction: None,
            round: 1,
            history: Vec::new(),
        }
    }

    /// Seed for the next correction: the prior correction's text re-framed
    /// as a story under the carried-over title, or the unchanged current
    /// story when no correction exists yet.
    pub fn next_seed(&self) -> Story {
        match &self.current_correction {
            Some(prior) => Story {
                title: self.current_story.title.clone(),
                content: prior.correction.clone(),
            },
            None => self.current_story.clone(),
        }
    }

    /// Record the player's rewrite of the current story and the correction
    /// generated from it. Returns the new round number.
    pub fn record_initial(
        &mut self,
        player_story: String,
        player_significance: String,
        correction: Correction,
        now: DateTime<Utc>,
    ) -> u32 {
        self.history.push(RoundRecord {
            round: self.round,
            original_story: self.current_story.clone(),
            player_story,
            player_significance,
            timestamp: now,
            correction: None,
            is_corrected: false,
        });
        self.current_correction = Some(correction);
        self.round += 1;
        self.round
    }

    /// Record the player's rewrite of a corrected story, embedding the
    /// just-shown correction, then advance to `seed` and its freshly
    /// generated `correction`. Returns the new round number.
    pub fn record_corrected(
        &mut self,
        player_story: String,
        player_significance: String,
        seed: Story,
        correction: Correction,
        now: DateTime<Utc>,
    ) -> u32 {
        self.history.push(RoundRecord {
            round: self.round,
            original_story: self.current_story.clone(),
            player_story,
            player_significance,
            timestamp: now,
            correction: self.current_correction.clone(),
            is_corrected: true,
        });
        self.current_story = seed;
        self.current_correction = Some(correction);
        self.round += 1;
        self.round
    }
}

// ── Summary reporting ─────────────────────────────────────────────────

/// Read-side report over the submission history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub total_rounds: usize,
    pub corrections_made: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub story_changes: Vec<String>,
    pub summary: String,
}

/// Summarize the history: round counts, per-round change labels (the first
/// record is skipped), and the fixed educational summary text.
pub fn summarize(history: &[RoundRecord]) -> GameSummary {
    if history.is_empty() {
        return GameSummary {
            total_rounds: 0,
            corrections_made: 0,
            story_changes: Vec::new(),
            summary: "No game data available.".to_string(),
        };
    }

    let total_rounds = history.len();
    let corrections_made = history.iter().filter(|r| r.is_corrected).count();

    let story_changes = history
        .iter()
        .skip(1)
        .map(|record| {
            if record.is_corrected {
                format!("Round {}: Story was 'corrected' with new details", record.round)
            } else {
                format!("Round {}: New story introduced", record.round)
            }
        })
        .collect();

    let summary = format!(
        "You played {total_rounds} rounds in this game.\n\
         Of those, {corrections_made} rounds included 'corrections' to the stories.\n\
         \n\
         Key observations:\n\
         \u{2022} Each 'correction' introduced new details that could change how you interpreted the story\n\
         \u{2022} Details like race, education, criminal history, and political affiliations were added\n\
         \u{2022} This simulates how real news can be 'corrected' in ways that change the narrative\n\
         \n\
         Educational insights:\n\
         \u{2022} Information changes as it's passed along, even with 'corrections'\n\
         \u{2022} Specific details can dramatically alter how we interpret events\n\
         \u{2022} Critical thinking about what information is emphasized or omitted is crucial\n\
         \u{2022} The order and framing of information matters as much as the facts themselves"
    );

    GameSummary {
        total_rounds,
        corrections_made,
        story_changes,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::story::{fallback_correction, fallback_story};

    fn correction(text: &str) -> Correction {
        Correction {
            original: "the story".to_string(),
            correction: text.to_string(),
        }
    }

    #[test]
    fn test_start_enters_round_one() {
        let session = GameSession::start(fallback_story());
        assert_eq!(session.round, 1);
        assert!(session.history.is_empty());
        assert!(session.current_correction.is_none());
    }

    #[test]
    fn test_round_tracks_history_length() {
        let mut session = GameSession::start(fallback_story());
        let now = Utc::now();

        session.record_initial("mine".into(), "big".into(), fallback_correction(), now);
        assert_eq!(session.round, 2);
        assert_eq!(session.round as usize, session.history.len() + 1);

        for _ in 0..5 {
            let seed = session.next_seed();
            session.record_corrected("mine".into(), "big".into(), seed, fallback_correction(), now);
            assert_eq!(session.round as usize, session.history.len() + 1);
        }
        assert_eq!(session.round, 7);
    }

    #[test]
    fn test_next_seed_without_correction_is_current_story() {
        let session = GameSession::start(fallback_story());
        assert_eq!(session.next_seed(), fallback_story());
    }

    #[test]
    fn test_next_seed_reframes_prior_correction_under_same_title() {
        let mut session = GameSession::start(Story {
            title: "T".to_string(),
            content: "original content".to_string(),
        });
        session.record_initial(
            String::new(),
            String::new(),
            correction("X happened instead"),
            Utc::now(),
        );

        let seed = session.next_seed();
        assert_eq!(
            seed,
            Story {
                title: "T".to_string(),
                content: "X happened instead".to_string(),
            }
        );
    }

    #[test]
    fn test_record_corrected_embeds_shown_correction_and_advances_seed() {
        let mut session = GameSession::start(fallback_story());
        let now = Utc::now();
        session.record_initial("a".into(), "b".into(), correction("first twist"), now);

        let seed = session.next_seed();
        session.record_corrected(
            "c".into(),
            "d".into(),
            seed.clone(),
            correction("second twist"),
            now,
        );

        let record = session.history.last().unwrap();
        assert!(record.is_corrected);
        // The record captures what was on screen, not the new correction.
        assert_eq!(record.correction.as_ref().unwrap().correction, "first twist");
        assert_eq!(record.original_story, fallback_story());
        // The session has moved on to the derived seed.
        assert_eq!(session.current_story, seed);
        assert_eq!(
            session.current_correction.as_ref().unwrap().correction,
            "second twist"
        );
    }

    #[test]
    fn test_empty_input_accepted_verbatim() {
        let mut session = GameSession::start(fallback_story());
        session.record_initial(String::new(), String::new(), fallback_correction(), Utc::now());
        let record = &session.history[0];
        assert_eq!(record.player_story, "");
        assert_eq!(record.player_significance, "");
    }

    #[test]
    fn test_summary_empty_history() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_rounds, 0);
        assert_eq!(summary.corrections_made, 0);
        assert_eq!(summary.summary, "No game data available.");
        assert!(summary.story_changes.is_empty());
    }

    #[test]
    fn test_summary_counts_and_labels() {
        let mut session = GameSession::start(fallback_story());
        let now = Utc::now();
        session.record_initial("a".into(), String::new(), fallback_correction(), now);
        let seed = session.next_seed();
        session.record_corrected("b".into(), String::new(), seed, fallback_correction(), now);
        // Force a non-corrected third record, as after a fresh story.
        session.current_correction = None;
        session.record_initial("c".into(), String::new(), fallback_correction(), now);

        let summary = summarize(&session.history);
        assert_eq!(summary.total_rounds, 3);
        assert_eq!(summary.corrections_made, 1);
        assert_eq!(
            summary.story_changes,
            vec![
                "Round 2: Story was 'corrected' with new details".to_string(),
                "Round 3: New story introduced".to_string(),
            ]
        );
        assert!(summary.summary.starts_with("You played 3 rounds in this game."));
        assert!(summary
            .summary
            .contains("Of those, 1 rounds included 'corrections' to the stories."));
    }
}
