//! Budget buckets and interest keyword tables.
//!
//! The built-in [`Catalog::builtin`] mirrors the buckets the quiz front-end
//! offers. A YAML file can replace it at start-up via [`load_catalog`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A closed-below price interval; `max: None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl BudgetRange {
    #[must_use]
    pub fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// `min <= value` and, when bounded, `value <= max`. Non-finite values
    /// never match.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && self.max.is_none_or(|max| value <= max)
    }

    /// Returns the range widened by `ratio` on both ends, floored at zero.
    ///
    /// `ratio = 0.2` turns `[50, 99]` into `[40, 118.8]`.
    #[must_use]
    pub fn widened(&self, ratio: f64) -> Self {
        Self {
            min: (self.min * (1.0 - ratio)).max(0.0),
            max: self.max.map(|max| max * (1.0 + ratio)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetBucket {
    pub label: String,
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

impl BudgetBucket {
    #[must_use]
    pub fn range(&self) -> BudgetRange {
        BudgetRange::new(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub default_bucket: String,
    pub default_interest: String,
    pub fallback_keywords: Vec<String>,
    pub budgets: Vec<BudgetBucket>,
    pub interests: Vec<InterestKeywords>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The bucket and keyword tables shipped with the quiz.
    #[must_use]
    pub fn builtin() -> Self {
        let bucket = |label: &str, min: f64, max: Option<f64>| BudgetBucket {
            label: label.to_string(),
            min,
            max,
        };
        let interest = |name: &str, keywords: &[&str]| InterestKeywords {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        };

        Self {
            default_bucket: "$11-49".to_string(),
            default_interest: "Tech & Gadgets".to_string(),
            fallback_keywords: vec!["gift".to_string(), "present".to_string()],
            budgets: vec![
                bucket("$0-10", 0.0, Some(10.0)),
                bucket("$11-49", 11.0, Some(49.0)),
                bucket("$50-99", 50.0, Some(99.0)),
                bucket("$100-499", 100.0, Some(499.0)),
                bucket("$500-999", 500.0, Some(999.0)),
                bucket("$1000+", 1000.0, None),
            ],
            interests: vec![
                interest(
                    "Sports & Outdoor",
                    &["fitness", "gym accessories", "running", "cycling"],
                ),
                interest(
                    "Cooking & Food",
                    &["coffee grinder", "kitchen gadget", "spice kit"],
                ),
                interest(
                    "Tech & Gadgets",
                    &["mini projector", "smart lamp", "earbuds", "power bank"],
                ),
                interest("Art & DIY", &["calligraphy kit", "3d pen", "painting set"]),
                interest(
                    "Travel & Adventure",
                    &["scratch map", "packing cubes", "travel organizer"],
                ),
                interest("Books & Learning", &["puzzle", "brain teaser"]),
                interest(
                    "Fashion & Accessories",
                    &["minimalist wallet", "scarf", "jewelry"],
                ),
                interest("Home & Decor", &["aroma diffuser", "led strip", "desk lamp"]),
            ],
        }
    }

    /// Looks up a bucket by label, falling back to the default bucket for
    /// unknown or missing labels.
    ///
    /// A validated catalog always contains its default bucket; the builtin
    /// `$11-49` range is the last resort for a hand-built one that does not.
    #[must_use]
    pub fn bucket(&self, label: Option<&str>) -> BudgetBucket {
        label
            .and_then(|l| self.budgets.iter().find(|b| b.label == l))
            .or_else(|| self.budgets.iter().find(|b| b.label == self.default_bucket))
            .cloned()
            .unwrap_or_else(|| BudgetBucket {
                label: self.default_bucket.clone(),
                min: 11.0,
                max: Some(49.0),
            })
    }

    /// Label of the first bucket whose range contains `value`.
    #[must_use]
    pub fn bucket_for_price(&self, value: f64) -> Option<&str> {
        self.budgets
            .iter()
            .find(|b| b.range().contains(value))
            .map(|b| b.label.as_str())
    }

    /// Keyword phrases for a set of interest tags: the union across all
    /// known tags in request order, duplicates removed. Falls back to
    /// [`Catalog::fallback_keywords`] when no tag maps to anything.
    #[must_use]
    pub fn keywords_for<S: AsRef<str>>(&self, interests: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for tag in interests {
            let Some(entry) = self.interests.iter().find(|i| i.name == tag.as_ref()) else {
                continue;
            };
            for keyword in &entry.keywords {
                if seen.insert(keyword.as_str()) {
                    out.push(keyword.clone());
                }
            }
        }

        if out.is_empty() {
            self.fallback_keywords.clone()
        } else {
            out
        }
    }
}

/// Load and validate a catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: Catalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut seen_labels = HashSet::new();
    for bucket in &catalog.budgets {
        if bucket.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bucket label must be non-empty".to_string(),
            ));
        }
        if !bucket.min.is_finite() || bucket.min < 0.0 {
            return Err(ConfigError::Validation(format!(
                "bucket '{}' has invalid min {}",
                bucket.label, bucket.min
            )));
        }
        if let Some(max) = bucket.max {
            if !max.is_finite() || max < bucket.min {
                return Err(ConfigError::Validation(format!(
                    "bucket '{}' has max {max} below min {}",
                    bucket.label, bucket.min
                )));
            }
        }
        if !seen_labels.insert(bucket.label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate bucket label: '{}'",
                bucket.label
            )));
        }
    }

    if !seen_labels.contains(catalog.default_bucket.as_str()) {
        return Err(ConfigError::Validation(format!(
            "default bucket '{}' is not defined",
            catalog.default_bucket
        )));
    }

    let mut seen_interests = HashSet::new();
    for interest in &catalog.interests {
        if interest.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "interest name must be non-empty".to_string(),
            ));
        }
        if !seen_interests.insert(interest.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate interest: '{}'",
                interest.name
            )));
        }
    }

    if !seen_interests.contains(catalog.default_interest.as_str()) {
        return Err(ConfigError::Validation(format!(
            "default interest '{}' is not defined",
            catalog.default_interest
        )));
    }

    if catalog.fallback_keywords.is_empty() {
        return Err(ConfigError::Validation(
            "fallback_keywords must not be empty".to_string(),
        ));
    }

    Ok(())
}
