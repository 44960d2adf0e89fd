//! Fuzzy keyword matching.
//!
//! Package names are scored against keywords with a partial-ratio metric:
//! the shorter string is aligned against every window of the longer one
//! suggested by a Ratcliff/Obershelp sequence matcher, and the best window
//! ratio (0-100) wins. This tolerates plurals, hyphenation and truncation
//! (`"cfd"` scores 100 against `"libfoo-cfd"`).

use std::collections::HashMap;

use crate::models::FilterConfig;

/// Below this length of `b`, no element is treated as "popular".
const AUTOJUNK_MIN_LEN: usize = 200;

/// Window ratios above this count as a perfect match.
const PERFECT_RATIO: f64 = 0.995;

/// A contiguous run where `a[a..a + size] == b[b..b + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

impl MatchBlock {
    const fn new(a: usize, b: usize, size: usize) -> Self {
        Self { a, b, size }
    }
}

/// Gestalt pattern matcher over two character sequences.
///
/// Elements of `b` that occur in more than 1% (+1) of its positions are
/// not used to seed blocks once `b` has at least 200 elements.
pub struct SequenceMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'s> SequenceMatcher<'s> {
    pub fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular elements never seed a block but may still extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        MatchBlock::new(best_i, best_j, best_size)
    }

    /// Non-overlapping matching blocks in increasing order, adjacent blocks
    /// merged, terminated by `(a.len(), b.len(), 0)`.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let (la, lb) = (self.a.len(), self.b.len());

        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            blocks.push(block);
            if alo < block.a && blo < block.b {
                queue.push((alo, block.a, blo, block.b));
            }
            if block.a + block.size < ahi && block.b + block.size < bhi {
                queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }
        }
        blocks.sort();

        let mut merged: Vec<MatchBlock> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match merged.last_mut() {
                Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged.push(MatchBlock::new(la, lb, 0));
        merged
    }

    /// Similarity in `[0, 1]`: twice the matched length over the total length.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Partial-ratio similarity (0-100) between two strings.
///
/// Equal strings score 100; an empty string against a non-empty one
/// scores 0. Comparison is case-sensitive; callers lowercase first.
pub fn partial_ratio(s1: &str, s2: &str) -> u8 {
    if s1 == s2 {
        return 100;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }

    let first: Vec<char> = s1.chars().collect();
    let second: Vec<char> = s2.chars().collect();
    let (shorter, longer) = if first.len() <= second.len() {
        (first, second)
    } else {
        (second, first)
    };

    let mut best = 0.0_f64;
    for block in SequenceMatcher::new(&shorter, &longer).matching_blocks() {
        let start = block.b.saturating_sub(block.a);
        let end = (start + shorter.len()).min(longer.len());
        let window = &longer[start..end];

        let ratio = SequenceMatcher::new(&shorter, window).ratio();
        if ratio > PERFECT_RATIO {
            return 100;
        }
        best = best.max(ratio);
    }

    (100.0 * best).round_ties_even() as u8
}

/// Case-insensitive partial-ratio test of `name` against one keyword.
pub fn matches(name: &str, keyword: &str, threshold: u8) -> bool {
    partial_ratio(&name.to_lowercase(), &keyword.to_lowercase()) >= threshold
}

/// An ordered keyword list with its threshold.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    threshold: u8,
}

impl KeywordMatcher {
    /// Keywords are lowercased; order is preserved.
    pub fn new<I, S>(keywords: I, threshold: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            threshold,
        }
    }

    pub fn from_config(filter: &FilterConfig) -> Self {
        Self::new(&filter.keywords, filter.threshold)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// The first keyword, in configured order, that `name` matches, with
    /// its score. Later keywords are not scored.
    pub fn first_match(&self, name: &str) -> Option<(&str, u8)> {
        let name = name.to_lowercase();
        self.keywords.iter().find_map(|keyword| {
            let score = partial_ratio(&name, keyword);
            (score >= self.threshold).then_some((keyword.as_str(), score))
        })
    }
}
