use std::path::Path;

use serde::Serialize;

use crate::error::Result;

pub const DEFAULT_CUTOFF: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    Exact,
    Corrected,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameCorrection {
    pub original: String,
    pub corrected: String,
    pub status: CorrectionStatus,
    pub confidence: f64,
}

/// Split Hangul syllables into their conjoining jamo so that near-miss
/// spellings score by shared consonants and vowels. Other characters pass
/// through unchanged.
pub fn decompose(name: &str) -> Vec<char> {
    const BASE: u32 = 0xAC00;
    const LAST: u32 = 0xD7A3;
    let mut out = Vec::new();
    for c in name.chars() {
        let code = c as u32;
        if !(BASE..=LAST).contains(&code) {
            out.push(c);
            continue;
        }
        let idx = code - BASE;
        let lead = idx / 588;
        let vowel = (idx % 588) / 28;
        let tail = idx % 28;
        out.extend(char::from_u32(0x1100 + lead));
        out.extend(char::from_u32(0x1161 + vowel));
        if tail > 0 {
            out.extend(char::from_u32(0x11A7 + tail));
        }
    }
    out
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (decompose(a), decompose(b));
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Match `name` against `candidates`. Exact and empty names pass through;
/// otherwise the closest candidate at or above `cutoff` wins.
pub fn correct_name(name: &str, candidates: &[String], cutoff: f64) -> NameCorrection {
    let name = name.trim();
    let exact = |n: &str| NameCorrection {
        original: n.to_string(),
        corrected: n.to_string(),
        status: CorrectionStatus::Exact,
        confidence: 1.0,
    };
    if name.is_empty() || candidates.iter().any(|c| c == name) {
        return exact(name);
    }

    let mut best: Option<(&String, f64)> = None;
    for candidate in candidates {
        let score = similarity(name, candidate);
        if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) => NameCorrection {
            original: name.to_string(),
            corrected: candidate.clone(),
            status: CorrectionStatus::Corrected,
            confidence: (score * 100.0).round() / 100.0,
        },
        None => NameCorrection {
            original: name.to_string(),
            corrected: name.to_string(),
            status: CorrectionStatus::Unknown,
            confidence: 0.0,
        },
    }
}

/// Known member names, one per line in the members file.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<String>,
}

impl Roster {
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            members: names.into_iter().collect(),
        }
    }

    /// A missing file is an empty roster.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_names(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from),
        ))
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn correct(&self, name: &str, cutoff: f64) -> NameCorrection {
        correct_name(name, &self.members, cutoff)
    }

    pub fn correct_all(&self, names: &[String], cutoff: f64) -> Vec<NameCorrection> {
        names.iter().map(|n| self.correct(n, cutoff)).collect()
    }
}

/// Add `name` to the members file, keeping it sorted. Returns false when the
/// name is already there.
pub fn add_member(path: &Path, name: &str) -> Result<bool> {
    let mut members = Roster::load(path)?.members;
    let name = name.trim();
    if name.is_empty() || members.iter().any(|m| m == name) {
        return Ok(false);
    }
    members.push(name.to_string());
    members.sort();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = members.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(true)
}
