//! Leveraged / inverse ETF detection by security name.
//!
//! A heuristic: any case-insensitive occurrence of a marker in the fund name
//! flags it. Unknown issuers slip through and a plain "Bull" fund is flagged;
//! both are accepted.

use regex::Regex;

/// Markers matched against security names.
pub const DEFAULT_LEVERAGED_MARKERS: [&str; 8] = [
    "Ultra",
    "UltraPro",
    "2x",
    "3x",
    "Bull",
    "Bear",
    "Direxion",
    "ProShares",
];

/// Name-pattern classifier for leveraged and inverse funds.
#[derive(Debug, Clone)]
pub struct LeverageClassifier {
    // None when no markers were given; matches nothing.
    pattern: Option<Regex>,
}

impl LeverageClassifier {
    /// Build a classifier from literal markers (escaped, matched case-insensitively).
    pub fn new<I, S>(markers: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternation: Vec<String> = markers
            .into_iter()
            .map(|m| regex::escape(m.as_ref()))
            .filter(|m| !m.is_empty())
            .collect();
        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = Regex::new(&format!("(?i)({})", alternation.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_leveraged(&self, name: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(name))
    }
}

impl Default for LeverageClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LEVERAGED_MARKERS).expect("default leveraged markers are valid")
    }
}
