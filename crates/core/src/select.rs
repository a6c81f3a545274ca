//! Subtitle ranking and selection.
//! Candidates are narrowed by language with a fixed fallback order, then
//! offered newest first.

use crate::lookup::{added_date, SubtitleRecord};
use crate::prompt::Prompt;
use anyhow::Result;
use tracing::info;

/// Language tried when the preferred one has no subtitles.
pub const ENGLISH: &str = "eng";

/// Which fallback tier produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Preferred,
    English,
    All,
}

/// Result of ranking a set of search results.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranking {
    Candidates {
        tier: Tier,
        records: Vec<SubtitleRecord>,
    },
    /// The service returned nothing at all.
    NoSubtitles,
}

/// Narrow `records` to the best available language tier and sort the
/// survivors by `added_date`, most recent first.
pub fn rank(records: &[SubtitleRecord], preferred: Option<&str>) -> Ranking {
    let in_language = |lang: &str| -> Vec<SubtitleRecord> {
        records
            .iter()
            .filter(|r| r.language_id == lang)
            .cloned()
            .collect()
    };

    let (tier, mut chosen) = match preferred {
        None => (Tier::All, records.to_vec()),
        Some(lang) => {
            let own = in_language(lang);
            if !own.is_empty() {
                (Tier::Preferred, own)
            } else if lang != ENGLISH {
                info!("no subtitles found for preferred language {lang:?}, falling back to English");
                let english = in_language(ENGLISH);
                if english.is_empty() {
                    info!("still no subtitles in English, showing all subtitles");
                    (Tier::All, records.to_vec())
                } else {
                    (Tier::English, english)
                }
            } else {
                info!("no subtitles in English, showing all subtitles");
                (Tier::All, records.to_vec())
            }
        }
    };

    if chosen.is_empty() {
        return Ranking::NoSubtitles;
    }
    chosen.sort_by(|a, b| b.added_date.cmp(&a.added_date));
    Ranking::Candidates {
        tier,
        records: chosen,
    }
}

/// Human readable line for one candidate, e.g.
/// `2021-03-10 10:00:00 [eng] show.srt (23Kb)`.
pub fn label(record: &SubtitleRecord) -> String {
    format!(
        "{} [{}] {} ({}Kb)",
        record.added_date.format(added_date::FORMAT),
        record.language_id,
        record.file_name,
        (record.size_bytes as f64 / 1024.0).round() as u64
    )
}

/// Rank `records` and let the user pick one.
/// Returns `None` when there is nothing to offer or nothing was picked.
pub fn select<P: Prompt>(
    records: &[SubtitleRecord],
    preferred: Option<&str>,
    prompt: &P,
) -> Result<Option<SubtitleRecord>> {
    let records = match rank(records, preferred) {
        Ranking::NoSubtitles => {
            info!("no subtitles found");
            return Ok(None);
        }
        Ranking::Candidates { records, .. } => records,
    };
    let labels: Vec<String> = records.iter().map(label).collect();
    let choice = prompt.choose_one("Available subtitles", &labels)?;
    Ok(choice.and_then(|i| records.into_iter().nth(i)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::fake::record;
    use crate::prompt::scripted::ScriptedPrompt;

    fn names(ranking: &Ranking) -> Vec<String> {
        match ranking {
            Ranking::Candidates { records, .. } => {
                records.iter().map(|r| r.file_name.clone()).collect()
            }
            Ranking::NoSubtitles => Vec::new(),
        }
    }

    #[test]
    fn falls_back_to_english_before_everything() {
        let records = vec![
            record("ger", "2022-01-01", "de.srt"),
            record("eng", "2020-01-01", "en.srt"),
            record("spa", "2021-01-01", "es.srt"),
        ];
        let ranking = rank(&records, Some("fre"));
        assert!(matches!(ranking, Ranking::Candidates { tier: Tier::English, .. }));
        assert_eq!(names(&ranking), vec!["en.srt"]);
    }

    #[test]
    fn keeps_preferred_language_when_present() {
        let records = vec![
            record("fre", "2020-01-01", "fr.srt"),
            record("eng", "2020-01-01", "en.srt"),
        ];
        let ranking = rank(&records, Some("fre"));
        assert!(matches!(ranking, Ranking::Candidates { tier: Tier::Preferred, .. }));
        assert_eq!(names(&ranking), vec!["fr.srt"]);
    }

    #[test]
    fn english_preference_skips_to_all() {
        let records = vec![
            record("fre", "2020-01-01", "fr.srt"),
            record("ger", "2021-01-01", "de.srt"),
        ];
        let ranking = rank(&records, Some("eng"));
        assert!(matches!(ranking, Ranking::Candidates { tier: Tier::All, .. }));
        assert_eq!(names(&ranking), vec!["de.srt", "fr.srt"]);
    }

    #[test]
    fn sorts_newest_first() {
        let records = vec![
            record("eng", "2020-01-01", "old.srt"),
            record("eng", "2022-06-15", "new.srt"),
            record("eng", "2021-03-10", "mid.srt"),
        ];
        assert_eq!(
            names(&rank(&records, None)),
            vec!["new.srt", "mid.srt", "old.srt"]
        );
    }

    #[test]
    fn empty_input_is_no_subtitles() {
        assert_eq!(rank(&[], Some("fre")), Ranking::NoSubtitles);
        assert_eq!(rank(&[], None), Ranking::NoSubtitles);
    }

    #[test]
    fn labels_show_date_language_and_size() {
        let r = record("eng", "2021-03-10 10:00:00", "show.srt");
        assert_eq!(label(&r), "2021-03-10 10:00:00 [eng] show.srt (2Kb)");
    }

    #[test]
    fn returns_the_picked_candidate() {
        let records = vec![
            record("eng", "2020-01-01", "old.srt"),
            record("eng", "2022-06-15", "new.srt"),
        ];
        let prompt = ScriptedPrompt::new([], Some(1));
        let picked = select(&records, Some("eng"), &prompt).unwrap().unwrap();
        assert_eq!(picked.file_name, "old.srt");
        assert_eq!(prompt.questions(), vec!["Available subtitles"]);
    }

    #[test]
    fn does_not_prompt_without_candidates() {
        let prompt = ScriptedPrompt::new([], Some(0));
        assert_eq!(select(&[], None, &prompt).unwrap(), None);
        assert!(prompt.questions().is_empty());
    }
}
