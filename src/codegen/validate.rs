//! Heuristic plausibility check for generated scene code.
//!
//! This only filters out empty or prose-only answers before an expensive
//! render; it says nothing about whether the code actually runs.

/// Default signal substrings.
pub const DEFAULT_SIGNALS: &[&str] = &[
    "self.play",
    "self.wait",
    "self.add",
    "=",
    "Circle",
    "Square",
    "Line",
    "Create",
    "FadeIn",
    "FadeOut",
];

/// Keyword-based plausibility policy.
#[derive(Debug, Clone)]
pub struct PlausibilityCheck {
    signals: Vec<String>,
}

impl PlausibilityCheck {
    pub fn new(signals: Vec<String>) -> Self {
        Self {
            signals: signals.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn signals(&self) -> &[String] {
        &self.signals
    }

    /// True when `code` contains at least one signal.
    pub fn is_plausible(&self, code: &str) -> bool {
        !code.trim().is_empty() && self.signals.iter().any(|s| code.contains(s.as_str()))
    }
}

impl Default for PlausibilityCheck {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNALS.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_default_signal_is_enough() {
        let check = PlausibilityCheck::default();
        for signal in DEFAULT_SIGNALS {
            assert!(check.is_plausible(&format!("# {signal}")), "{signal}");
        }
    }

    #[test]
    fn test_scene_code_is_plausible() {
        let check = PlausibilityCheck::default();
        assert!(check.is_plausible("self.play(Create(Circle()))"));
    }

    #[test]
    fn test_empty_and_prose_are_rejected() {
        let check = PlausibilityCheck::default();
        assert!(!check.is_plausible(""));
        assert!(!check.is_plausible("   \n"));
        assert!(!check.is_plausible(
            "I'm sorry, but I can only describe how you might animate that."
        ));
    }

    #[test]
    fn test_custom_signals() {
        let check = PlausibilityCheck::new(vec!["Transform".to_string(), String::new()]);
        assert_eq!(check.signals().len(), 1);
        assert!(check.is_plausible("self.play(Transform(a, b))"));
        assert!(!check.is_plausible("x = 1"));
    }
}
