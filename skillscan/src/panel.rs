//! Item-panel text parsing.
//!
//! Raw OCR text from the panel is noisy: level markers get mangled (`Lv`
//! read as `Iv`), names and levels land on separate lines, icon glyphs leak
//! into name fragments. The parser is an ordered set of line patterns
//! (first match wins) followed by a recovery pass that fills gaps from
//! verbatim dictionary hits, so a partially readable panel still yields a
//! partial result instead of nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Expected number of skills on a fully enhanced item panel.
pub const MAX_PANEL_SKILLS: usize = 4;

/// One `name +level` entry. `level` is empty when recovery found the name
/// but ran out of level markers to pair it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillEntry {
    pub name: String,
    pub level: String,
}

/// Aggregated result for one panel image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelReading {
    #[serde(rename = "set")]
    pub set_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub skills: Vec<SkillEntry>,
}

// `Iv` covers the OCR engine's favorite misread of `Lv`.
static SKILL_WITH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣a-zA-Z][가-힣a-zA-Z0-9\s]*?)\s*(?:Lv|LV|lv|Iv)\s*\+?\s*(\d+)").expect("regex")
});

static SKILL_WITH_PLUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣a-zA-Z][가-힣a-zA-Z0-9\s]*?)\s+\+(\d+)").expect("regex")
});

static CATEGORY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([가-힣]+)\s*의\s*([가-힣]+)").expect("regex"));

static LEVEL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Lv|LV|lv|Iv)\s*\+?\s*(\d+)").expect("regex"));

static BARE_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)\+(\d+)(?:\s|$)").expect("regex"));

/// Parser for one panel layout, optionally scoped to a character class.
#[derive(Debug, Clone, Default)]
pub struct PanelParser {
    class: Option<String>,
    max_skills: Option<usize>,
}

impl PanelParser {
    pub fn new(class: Option<String>) -> Self {
        Self {
            class,
            max_skills: Some(MAX_PANEL_SKILLS),
        }
    }

    /// Cap extraction at `max` entries; `None` removes the cap and disables
    /// the recovery pass (it only exists to fill up to an expected count).
    pub fn with_max_skills(mut self, max: Option<usize>) -> Self {
        self.max_skills = max;
        self
    }

    /// Extract a skill candidate from a single line.
    ///
    /// The returned name is cleaned (icon glyphs and foreign characters
    /// stripped, whitespace collapsed) but not yet dictionary-corrected.
    /// Lines carrying known panel chrome yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<SkillEntry> {
        let trimmed = line.trim();
        if trimmed.is_empty() || data::is_ignored(trimmed) {
            return None;
        }

        for pattern in [&*SKILL_WITH_MARKER, &*SKILL_WITH_PLUS] {
            let Some(caps) = pattern.captures(trimmed) else {
                continue;
            };
            let name = clean_skill_name(&caps[1]);
            if name.chars().count() >= 2 && !data::is_ignored(&name) {
                return Some(SkillEntry {
                    name,
                    level: format!("+{}", &caps[2]),
                });
            }
        }

        None
    }

    /// Parse a whole recognized document into category fields and skills.
    ///
    /// Each line is evaluated both alone and concatenated with its successor
    /// (the engine likes to split a name from its level marker); duplicates
    /// from the overlap are suppressed. Candidate names are corrected
    /// through the dictionary as they are accepted; a miss keeps the cleaned
    /// OCR name unchanged.
    pub fn parse_document(&self, raw: &str) -> PanelReading {
        let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

        let mut merged = Vec::with_capacity(lines.len() * 2);
        for (i, line) in lines.iter().enumerate() {
            merged.push((*line).to_string());
            if i + 1 < lines.len() {
                merged.push(format!("{} {}", line, lines[i + 1]));
            }
        }

        let class = self.class.as_deref();
        let mut set_name: Option<&'static str> = None;
        let mut type_name: Option<&'static str> = None;
        let mut skills: Vec<SkillEntry> = Vec::new();

        for line in &merged {
            if set_name.is_none() || type_name.is_none() {
                let (set, ty) = parse_category_line(line);
                set_name = set_name.or(set);
                type_name = type_name.or(ty);
            }

            if self.below_cap(skills.len()) {
                if let Some(mut entry) = self.parse_line(line) {
                    if let Some(canonical) = data::match_skill(&entry.name, class) {
                        entry.name = canonical.to_string();
                    }
                    if !skills.contains(&entry) {
                        skills.push(entry);
                    }
                }
            }
        }

        if let Some(max) = self.max_skills {
            if skills.len() < max {
                self.recover_missing(raw, max, &mut skills);
            }
        }

        // Last resort for the header: the words may appear verbatim even when
        // the `<set> 의 <type>` shape was garbled.
        if set_name.is_none() {
            set_name = data::SET_NAMES.iter().copied().find(|s| raw.contains(s));
        }
        if type_name.is_none() {
            // Single-char type names are too easy to hit by accident.
            type_name = data::TYPE_NAMES
                .iter()
                .copied()
                .find(|t| t.chars().count() >= 2 && raw.contains(t));
        }

        PanelReading {
            set_name: set_name.unwrap_or_default().to_string(),
            type_name: type_name.unwrap_or_default().to_string(),
            skills,
        }
    }

    fn below_cap(&self, count: usize) -> bool {
        match self.max_skills {
            Some(max) => count < max,
            None => true,
        }
    }

    /// Fill missing entries from verbatim dictionary names in the raw text,
    /// pairing them with level markers not already claimed by structured
    /// candidates. Never touches entries found by the line grammar.
    fn recover_missing(&self, raw: &str, max: usize, skills: &mut Vec<SkillEntry>) {
        let mut names = data::skills_for(self.class.as_deref());
        // Longest first so a full name wins over a name embedded in it.
        names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));

        let mut found: Vec<&'static str> = Vec::new();
        for name in names {
            if skills.len() + found.len() >= max {
                break;
            }
            if skills.iter().any(|s| s.name == name) || found.contains(&name) {
                continue;
            }
            if raw.contains(name) {
                found.push(name);
            }
        }

        let mut levels = collect_levels(raw);
        for used in skills.iter().map(|s| s.level.clone()).collect::<Vec<_>>() {
            if let Some(pos) = levels.iter().position(|l| *l == used) {
                levels.remove(pos);
            }
        }

        let mut levels = levels.into_iter();
        for name in found {
            if skills.len() >= max {
                break;
            }
            skills.push(SkillEntry {
                name: name.to_string(),
                level: levels.next().unwrap_or_default(),
            });
        }
    }
}

/// `<set> 의 <type>` header line; both sides must resolve against their
/// vocabulary for the line to count.
fn parse_category_line(line: &str) -> (Option<&'static str>, Option<&'static str>) {
    let Some(caps) = CATEGORY_LINE.captures(line) else {
        return (None, None);
    };
    let set = data::match_exact(&caps[1], data::SET_NAMES);
    let ty = data::match_exact(&caps[2], data::TYPE_NAMES);
    if set.is_some() && ty.is_some() {
        (set, ty)
    } else {
        (None, None)
    }
}

/// Strip everything outside Hangul syllables, collapse whitespace.
fn clean_skill_name(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| ('가'..='힣').contains(c) || c.is_whitespace())
        .collect();
    data::collapse_whitespace(&kept)
}

/// Every level marker in the text, in order of appearance: `Lv`-style forms
/// first, then standalone `+N` tokens.
fn collect_levels(raw: &str) -> Vec<String> {
    let mut levels = Vec::new();
    for caps in LEVEL_MARKER.captures_iter(raw) {
        levels.push(format!("+{}", &caps[1]));
    }
    for caps in BARE_LEVEL.captures_iter(raw) {
        levels.push(format!("+{}", &caps[1]));
    }
    levels
}
