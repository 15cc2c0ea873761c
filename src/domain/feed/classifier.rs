//! Token update classification into destination lists

use std::collections::HashSet;
use crate::shared::types::{Category, TokenUpdateMessage};

/// Venues a token has migrated to once it graduates
pub const DEFAULT_DEX_ALLOWLIST: [&str; 4] = ["Raydium", "Meteora AMM V2", "Meteora AMM", "PumpSwap"];

pub const DEFAULT_ABOUT_TO_GRADUATE_PROGRESS: f64 = 10.0;
pub const DEFAULT_NEWLY_CREATED_MAX_PROGRESS: f64 = 50.0;

/// Classification thresholds and the graduated dex allow-list
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Inclusive lower bound for about-to-graduate
    pub about_to_graduate_progress: f64,
    /// Exclusive upper bound for newly-created update messages
    pub newly_created_max_progress: f64,
    pub dex_allowlist: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            about_to_graduate_progress: DEFAULT_ABOUT_TO_GRADUATE_PROGRESS,
            newly_created_max_progress: DEFAULT_NEWLY_CREATED_MAX_PROGRESS,
            dex_allowlist: DEFAULT_DEX_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

type Predicate = fn(&Classifier, &TokenUpdateMessage) -> bool;

/// Evaluated top to bottom; the first match wins.
const RULES: [(Predicate, Category); 3] = [
    (Classifier::is_about_to_graduate, Category::AboutToGraduate),
    (Classifier::is_graduated, Category::Graduated),
    (Classifier::is_newly_created, Category::NewlyCreated),
];

/// Maps a token update to the list it belongs in
#[derive(Debug, Clone)]
pub struct Classifier {
    about_to_graduate_progress: f64,
    newly_created_max_progress: f64,
    allowlist: HashSet<String>,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            about_to_graduate_progress: config.about_to_graduate_progress,
            newly_created_max_progress: config.newly_created_max_progress,
            allowlist: config.dex_allowlist.into_iter().collect(),
        }
    }

    /// First matching category, or `None` when no rule applies
    pub fn classify(&self, message: &TokenUpdateMessage) -> Option<Category> {
        RULES
            .iter()
            .find(|(predicate, _)| predicate(self, message))
            .map(|(_, category)| *category)
    }

    pub fn is_allowlisted(&self, dex: &str) -> bool {
        self.allowlist.contains(dex)
    }

    fn is_about_to_graduate(&self, message: &TokenUpdateMessage) -> bool {
        message.progress >= self.about_to_graduate_progress && !self.is_allowlisted(&message.dex)
    }

    fn is_graduated(&self, message: &TokenUpdateMessage) -> bool {
        self.is_allowlisted(&message.dex)
    }

    fn is_newly_created(&self, message: &TokenUpdateMessage) -> bool {
        message.kind.is_new() || message.progress < self.newly_created_max_progress
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::MessageKind;

    fn update(mint: &str, dex: &str, progress: f64) -> TokenUpdateMessage {
        TokenUpdateMessage::new(mint, dex, progress, MessageKind::Update("update".to_string()))
    }

    fn new_token(mint: &str, dex: &str, progress: f64) -> TokenUpdateMessage {
        TokenUpdateMessage::new(mint, dex, progress, MessageKind::New)
    }

    #[test]
    fn test_about_to_graduate_ignores_type() {
        let classifier = Classifier::default();
        for progress in [10.0, 12.0, 49.9, 50.0, 99.0] {
            assert_eq!(classifier.classify(&update("A", "PumpFun", progress)), Some(Category::AboutToGraduate));
            assert_eq!(classifier.classify(&new_token("A", "PumpFun", progress)), Some(Category::AboutToGraduate));
        }
    }

    #[test]
    fn test_allowlisted_dex_is_graduated_at_any_progress() {
        let classifier = Classifier::default();
        for dex in DEFAULT_DEX_ALLOWLIST {
            assert_eq!(classifier.classify(&update("A", dex, 3.0)), Some(Category::Graduated));
            assert_eq!(classifier.classify(&update("A", dex, 80.0)), Some(Category::Graduated));
            assert_eq!(classifier.classify(&new_token("A", dex, 0.0)), Some(Category::Graduated));
        }
    }

    #[test]
    fn test_new_low_progress_is_newly_created() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&new_token("A", "PumpFun", 5.0)), Some(Category::NewlyCreated));
    }

    #[test]
    fn test_progress_boundaries() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&update("A", "PumpFun", 10.0)), Some(Category::AboutToGraduate));
        assert_eq!(classifier.classify(&update("A", "PumpFun", 9.99)), Some(Category::NewlyCreated));
        assert_eq!(classifier.classify(&new_token("A", "PumpFun", 9.99)), Some(Category::NewlyCreated));
    }

    #[test]
    fn test_raised_threshold_exposes_newly_created_upper_bound() {
        let classifier = Classifier::new(ClassifierConfig {
            about_to_graduate_progress: 60.0,
            ..ClassifierConfig::default()
        });
        assert_eq!(classifier.classify(&update("A", "PumpFun", 49.0)), Some(Category::NewlyCreated));
        assert_eq!(classifier.classify(&update("A", "PumpFun", 50.0)), None);
        assert_eq!(classifier.classify(&new_token("A", "PumpFun", 50.0)), Some(Category::NewlyCreated));
    }

    #[test]
    fn test_nan_progress_is_unclassified() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&update("A", "PumpFun", f64::NAN)), None);
    }

    #[test]
    fn test_example_scenario() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&update("A", "PumpFun", 12.0)), Some(Category::AboutToGraduate));
        assert_eq!(classifier.classify(&new_token("B", "Raydium", 3.0)), Some(Category::Graduated));
    }
}
