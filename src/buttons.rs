use serde::{Deserialize, Serialize};

/// Control kinds the shell knows how to locate on the hosted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonKind {
    Record,
    Pause,
    Stop,
}

impl ButtonKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "record" => Some(Self::Record),
            "pause" => Some(Self::Pause),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// A button element as harvested by the page script. `index` is the page's
/// own handle for the element; the host never sees the DOM node itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonCandidate {
    pub index: usize,
    pub text: String,
    pub aria_label: String,
    pub title: String,
    pub id: String,
    pub classes: String,
    pub test_id: String,
    pub disabled: bool,
}

/// A single selector-style matching rule, tried in order before the keyword
/// fallback kicks in.
#[derive(Debug, Clone)]
pub enum Rule {
    /// data-test-id contains the needle.
    TestId(&'static str),
    /// aria-label contains the needle.
    AriaContains(&'static str),
    /// Element id or class list contains the needle.
    ClassOrId(&'static str),
}

impl Rule {
    fn matches(&self, candidate: &ButtonCandidate) -> bool {
        fn contains(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(needle)
        }
        match self {
            Rule::TestId(needle) => contains(&candidate.test_id, needle),
            Rule::AriaContains(needle) => contains(&candidate.aria_label, needle),
            Rule::ClassOrId(needle) => {
                contains(&candidate.id, needle) || contains(&candidate.classes, needle)
            }
        }
    }
}

/// Heuristic locator for record/pause/stop controls on markup this shell does
/// not own. Selector rules first, then a keyword scan over visible text,
/// aria-label and title. Disabled elements are never returned; no match means
/// `None` — there is no retry or scoring.
///
/// The tables are injectable so tests run against synthetic markup and a
/// markup change on the hosted page only requires a table update.
pub struct ButtonLocator {
    record_rules: Vec<Rule>,
    pause_rules: Vec<Rule>,
    stop_rules: Vec<Rule>,
    record_keywords: Vec<&'static str>,
    pause_keywords: Vec<&'static str>,
    stop_keywords: Vec<&'static str>,
}

impl Default for ButtonLocator {
    fn default() -> Self {
        Self {
            record_rules: vec![
                Rule::TestId("record-button"),
                Rule::AriaContains("record"),
                Rule::ClassOrId("record"),
            ],
            pause_rules: vec![
                Rule::TestId("pause-button"),
                Rule::AriaContains("pause"),
                Rule::ClassOrId("pause"),
            ],
            stop_rules: vec![
                Rule::TestId("stop-button"),
                Rule::AriaContains("stop"),
                Rule::ClassOrId("stop"),
            ],
            record_keywords: vec!["record", "mic", "start"],
            pause_keywords: vec!["pause", "hold"],
            stop_keywords: vec!["stop", "finish", "done"],
        }
    }
}

impl ButtonLocator {
    pub fn with_tables(
        record_rules: Vec<Rule>,
        pause_rules: Vec<Rule>,
        stop_rules: Vec<Rule>,
        record_keywords: Vec<&'static str>,
        pause_keywords: Vec<&'static str>,
        stop_keywords: Vec<&'static str>,
    ) -> Self {
        Self {
            record_rules,
            pause_rules,
            stop_rules,
            record_keywords,
            pause_keywords,
            stop_keywords,
        }
    }

    fn rules(&self, kind: ButtonKind) -> &[Rule] {
        match kind {
            ButtonKind::Record => &self.record_rules,
            ButtonKind::Pause => &self.pause_rules,
            ButtonKind::Stop => &self.stop_rules,
        }
    }

    fn keywords(&self, kind: ButtonKind) -> &[&'static str] {
        match kind {
            ButtonKind::Record => &self.record_keywords,
            ButtonKind::Pause => &self.pause_keywords,
            ButtonKind::Stop => &self.stop_keywords,
        }
    }

    /// Find the page index of the first candidate matching `kind`, or `None`.
    pub fn find(&self, kind: ButtonKind, candidates: &[ButtonCandidate]) -> Option<usize> {
        for rule in self.rules(kind) {
            if let Some(candidate) = candidates
                .iter()
                .find(|c| !c.disabled && rule.matches(c))
            {
                return Some(candidate.index);
            }
        }

        // Keyword fallback over everything the page showed us.
        let keywords = self.keywords(kind);
        candidates
            .iter()
            .find(|c| {
                if c.disabled {
                    return false;
                }
                let text = c.text.to_lowercase();
                let aria = c.aria_label.to_lowercase();
                let title = c.title.to_lowercase();
                keywords
                    .iter()
                    .any(|kw| text.contains(kw) || aria.contains(kw) || title.contains(kw))
            })
            .map(|c| c.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize) -> ButtonCandidate {
        ButtonCandidate {
            index,
            ..Default::default()
        }
    }

    #[test]
    fn test_id_rule_wins_over_keyword_text() {
        let mut by_text = candidate(0);
        by_text.text = "Record".into();
        let mut by_test_id = candidate(1);
        by_test_id.test_id = "record-button".into();

        let locator = ButtonLocator::default();
        assert_eq!(
            locator.find(ButtonKind::Record, &[by_text, by_test_id]),
            Some(1)
        );
    }

    #[test]
    fn keyword_fallback_scans_text_aria_and_title() {
        let locator = ButtonLocator::default();

        let mut by_text = candidate(3);
        by_text.text = "Start a new note".into();
        assert_eq!(locator.find(ButtonKind::Record, &[by_text]), Some(3));

        let mut by_aria = candidate(4);
        by_aria.aria_label = "Pause playback".into();
        assert_eq!(locator.find(ButtonKind::Pause, &[by_aria]), Some(4));

        let mut by_title = candidate(5);
        by_title.title = "Stop".into();
        assert_eq!(locator.find(ButtonKind::Stop, &[by_title]), Some(5));
    }

    #[test]
    fn disabled_candidates_are_never_returned() {
        let mut disabled = candidate(0);
        disabled.test_id = "record-button".into();
        disabled.disabled = true;

        let locator = ButtonLocator::default();
        assert_eq!(locator.find(ButtonKind::Record, &[disabled.clone()]), None);

        // An enabled keyword match behind a disabled selector match still wins.
        let mut enabled = candidate(1);
        enabled.text = "record".into();
        assert_eq!(
            locator.find(ButtonKind::Record, &[disabled, enabled]),
            Some(1)
        );
    }

    #[test]
    fn no_match_yields_none() {
        let mut unrelated = candidate(0);
        unrelated.text = "Settings".into();
        unrelated.classes = "toolbar-btn".into();

        let locator = ButtonLocator::default();
        assert_eq!(locator.find(ButtonKind::Record, &[unrelated.clone()]), None);
        assert_eq!(locator.find(ButtonKind::Pause, &[unrelated.clone()]), None);
        assert_eq!(locator.find(ButtonKind::Stop, &[unrelated]), None);
        assert_eq!(locator.find(ButtonKind::Stop, &[]), None);
    }

    #[test]
    fn class_and_id_substrings_match_case_insensitively() {
        let mut by_class = candidate(2);
        by_class.classes = "btn RecordToggle primary".into();
        let locator = ButtonLocator::default();
        assert_eq!(locator.find(ButtonKind::Record, &[by_class]), Some(2));

        let mut by_id = candidate(7);
        by_id.id = "pauseBtn".into();
        assert_eq!(locator.find(ButtonKind::Pause, &[by_id]), Some(7));
    }

    #[test]
    fn injected_tables_override_defaults() {
        let locator = ButtonLocator::with_tables(
            vec![Rule::TestId("rec")],
            vec![],
            vec![],
            vec!["aufnahme"],
            vec![],
            vec![],
        );

        let mut localized = candidate(0);
        localized.text = "Aufnahme starten".into();
        assert_eq!(locator.find(ButtonKind::Record, &[localized]), Some(0));

        // Default keywords no longer apply.
        let mut english = candidate(1);
        english.text = "Record".into();
        assert_eq!(locator.find(ButtonKind::Record, &[english]), None);
    }
}
