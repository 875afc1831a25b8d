use crate::models::{Icon, Tone};
use serde::Serialize;

/// Category of one advisory sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Critical,
    Warning,
    Success,
    Weather,
    Info,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Critical => "critical",
            NoteKind::Warning => "warning",
            NoteKind::Success => "success",
            NoteKind::Weather => "weather",
            NoteKind::Info => "info",
        }
    }
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedNote {
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub text: String,
    pub icon: Icon,
    pub tone: Tone,
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    StartsWith(&'static str),
    Contains(&'static str),
}

impl Matcher {
    fn matches(&self, sentence: &str) -> bool {
        match self {
            Matcher::StartsWith(prefix) => sentence.starts_with(prefix),
            Matcher::Contains(needle) => sentence.contains(needle),
        }
    }
}

struct NoteRule {
    matcher: Matcher,
    kind: NoteKind,
    icon: Icon,
    tone: Tone,
}

const fn rule(matcher: Matcher, kind: NoteKind, icon: Icon, tone: Tone) -> NoteRule {
    NoteRule {
        matcher,
        kind,
        icon,
        tone,
    }
}

/// Evaluated top to bottom against the lower-cased sentence; first match
/// wins. Patterns must be lower case.
const NOTE_RULES: &[NoteRule] = &[
    rule(Matcher::StartsWith("критично"), NoteKind::Critical, Icon::AlertOctagon, Tone::Red),
    rule(Matcher::Contains("дефіцит води"), NoteKind::Warning, Icon::AlertTriangle, Tone::Orange),
    rule(
        Matcher::StartsWith("вологість ґрунту в нормі"),
        NoteKind::Success,
        Icon::CheckCircle,
        Tone::Green,
    ),
    rule(Matcher::Contains("сильний вітер"), NoteKind::Weather, Icon::Wind, Tone::Sky),
    rule(Matcher::Contains("висока температура"), NoteKind::Weather, Icon::Thermometer, Tone::Orange),
    rule(Matcher::Contains("орієнтовно потрібно"), NoteKind::Info, Icon::Droplet, Tone::Blue),
];

const FALLBACK: NoteRule = rule(Matcher::Contains(""), NoteKind::Info, Icon::Info, Tone::Blue);

pub const NOTE_DELIMITER: &str = ". ";

/// Classify a single sentence.
pub fn classify_note(sentence: &str) -> ParsedNote {
    let lowered = sentence.trim_start().to_lowercase();
    let rule = NOTE_RULES
        .iter()
        .find(|r| r.matcher.matches(&lowered))
        .unwrap_or(&FALLBACK);

    ParsedNote {
        kind: rule.kind,
        text: sentence.to_string(),
        icon: rule.icon,
        tone: rule.tone,
    }
}

/// Split the backend's free-text notes into classified sentences, in order.
pub fn parse_notes(notes: &str) -> impl Iterator<Item = ParsedNote> + '_ {
    notes
        .split(NOTE_DELIMITER)
        .filter(|segment| !segment.trim().is_empty())
        .map(classify_note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(notes: &str) -> Vec<NoteKind> {
        parse_notes(notes).map(|n| n.kind).collect()
    }

    #[test]
    fn earlier_rule_wins() {
        let parsed: Vec<_> = parse_notes("Критично: дефіцит води.").collect();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind, NoteKind::Critical);
        assert_eq!(parsed[0].icon, Icon::AlertOctagon);
    }

    #[test]
    fn classifies_each_category() {
        let notes = "Дефіцит води у кореневій зоні. \
                     Вологість ґрунту в нормі. \
                     Очікується сильний вітер. \
                     Висока температура вдень. \
                     Орієнтовно потрібно 12 мм. \
                     Наступний огляд у понеділок";
        assert_eq!(
            kinds(notes),
            vec![
                NoteKind::Warning,
                NoteKind::Success,
                NoteKind::Weather,
                NoteKind::Weather,
                NoteKind::Info,
                NoteKind::Info,
            ]
        );
    }

    #[test]
    fn info_rule_and_fallback_differ_by_icon() {
        let parsed: Vec<_> = parse_notes("Орієнтовно потрібно 5 мм. Поле оглянуто").collect();
        assert_eq!(parsed[0].icon, Icon::Droplet);
        assert_eq!(parsed[1].icon, Icon::Info);
        assert_eq!(parsed[0].kind, parsed[1].kind);
    }

    #[test]
    fn starts_with_rules_need_prefix() {
        assert_eq!(kinds("Стан не критично"), vec![NoteKind::Info]);
        assert_eq!(kinds("Тепер вологість ґрунту в нормі"), vec![NoteKind::Info]);
    }

    #[test]
    fn text_kept_verbatim_and_blanks_dropped() {
        let parsed: Vec<_> = parse_notes("Перше речення. . Друге речення. ").collect();
        let texts: Vec<_> = parsed.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["Перше речення", "Друге речення"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parse_notes("").count(), 0);
        assert_eq!(parse_notes("   ").count(), 0);
    }

    proptest! {
        #[test]
        fn one_note_per_non_blank_segment(segments in prop::collection::vec("[a-zа-я ]{0,12}", 0..8)) {
            let input = segments.join(NOTE_DELIMITER);
            let expected: Vec<&str> = input
                .split(NOTE_DELIMITER)
                .filter(|s| !s.trim().is_empty())
                .collect();
            let parsed: Vec<ParsedNote> = parse_notes(&input).collect();

            prop_assert_eq!(parsed.len(), expected.len());
            for (note, segment) in parsed.iter().zip(expected) {
                prop_assert_eq!(note.text.as_str(), segment);
            }
        }

        #[test]
        fn parsing_is_pure(input in ".{0,80}") {
            let first: Vec<ParsedNote> = parse_notes(&input).collect();
            let second: Vec<ParsedNote> = parse_notes(&input).collect();
            prop_assert_eq!(first, second);
        }
    }
}
