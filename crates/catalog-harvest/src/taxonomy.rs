//! Keyword-ladder taxonomy mapping a title to `(category, sub-category)`.
//!
//! Rules are plain data. Category rules are tried in order and the first one
//! whose keyword appears in the lowercased title wins; titles matching no
//! rule fall through to the default category. Sub-categories work the same
//! way inside the chosen category, ending at that category's fallback label.

use serde::{Deserialize, Serialize};

use crate::types::{Category, HarvestResult};

/// A labelled keyword set. Matches when any keyword is a substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Sub-category ladder for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategoryLadder {
    pub category: Category,
    pub rungs: Vec<KeywordRule>,
    pub fallback: String,
}

/// Category detection keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Complete rule set injected into a [`Taxonomy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyRules {
    /// Category rules in precedence order.
    pub categories: Vec<CategoryRule>,
    /// Category assigned when no rule matches.
    pub default_category: Category,
    pub ladders: Vec<SubCategoryLadder>,
    /// Label used when the chosen category has no ladder.
    pub unclassified: String,
}

impl TaxonomyRules {
    /// Load an alternate rule set from JSON.
    pub fn from_json(json: &str) -> HarvestResult<Self> {
        let mut rules: TaxonomyRules = serde_json::from_str(json)?;
        rules.lowercase_keywords();
        Ok(rules)
    }

    fn lowercase_keywords(&mut self) {
        for rule in &mut self.categories {
            for k in &mut rule.keywords {
                *k = k.to_lowercase();
            }
        }
        for ladder in &mut self.ladders {
            for rung in &mut ladder.rungs {
                for k in &mut rung.keywords {
                    *k = k.to_lowercase();
                }
            }
        }
    }
}

impl Default for TaxonomyRules {
    fn default() -> Self {
        let category = |category: Category, keywords: &[&str]| CategoryRule {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            categories: vec![
                category(
                    Category::Footwear,
                    &["chaussure", "basket", "bottine", "botte", "mocassin", "sandale", "espadrille"],
                ),
                category(
                    Category::Accessories,
                    &["ceinture", "sac", "portefeuille", "chapeau", "casquette", "écharpe", "gant"],
                ),
                category(
                    Category::Fragrance,
                    &["parfum", "edt", "edp", "eau de toilette", "eau de parfum", "cologne"],
                ),
            ],
            default_category: Category::Apparel,
            ladders: vec![
                SubCategoryLadder {
                    category: Category::Footwear,
                    rungs: vec![
                        KeywordRule::new("Baskets", &["basket", "sneaker"]),
                        KeywordRule::new("Bottines", &["bottine", "chelsea"]),
                        KeywordRule::new("Bottes", &["botte"]),
                        KeywordRule::new("Mocassins", &["mocassin"]),
                        KeywordRule::new("Sandales", &["sandale"]),
                    ],
                    fallback: "Chaussures habillées".to_string(),
                },
                SubCategoryLadder {
                    category: Category::Apparel,
                    rungs: vec![
                        KeywordRule::new(
                            "Vestes et Manteaux",
                            &["veste", "manteau", "blouson", "doudoune", "parka", "trench", "blazer"],
                        ),
                        KeywordRule::new(
                            "Pantalons",
                            &["pantalon", "jean", "chino", "jogging", "cargo"],
                        ),
                        KeywordRule::new("Hauts", &["pull", "sweat", "polo", "cardigan", "gilet"]),
                        KeywordRule::new("Chemises", &["chemise", "surchemise"]),
                        KeywordRule::new("T-shirts", &["t-shirt", "tee-shirt"]),
                    ],
                    fallback: "Autre".to_string(),
                },
                SubCategoryLadder {
                    category: Category::Accessories,
                    rungs: vec![
                        KeywordRule::new("Ceintures", &["ceinture"]),
                        KeywordRule::new("Maroquinerie", &["sac", "sacoche", "portefeuille"]),
                        KeywordRule::new("Couvre-chefs", &["chapeau", "casquette", "bonnet"]),
                    ],
                    fallback: "Autre".to_string(),
                },
                SubCategoryLadder {
                    category: Category::Fragrance,
                    rungs: vec![
                        KeywordRule::new("Eau de toilette", &["edt", "eau de toilette"]),
                        KeywordRule::new("Eau de parfum", &["edp", "eau de parfum"]),
                    ],
                    fallback: "Coffrets".to_string(),
                },
            ],
            unclassified: "Non classé".to_string(),
        }
    }
}

/// Rule-based title classifier.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    rules: TaxonomyRules,
}

impl Taxonomy {
    pub fn new(rules: TaxonomyRules) -> Self {
        Self { rules }
    }

    /// Classify a title. Total: every title gets a category and a label.
    pub fn classify(&self, title: &str) -> (Category, String) {
        let lowered = title.to_lowercase();
        let category = self.category_of(&lowered);
        let sub_category = self.sub_category_of(category, &lowered);
        (category, sub_category)
    }

    fn category_of(&self, lowered: &str) -> Category {
        self.rules
            .categories
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|rule| rule.category)
            .unwrap_or(self.rules.default_category)
    }

    fn sub_category_of(&self, category: Category, lowered: &str) -> String {
        let Some(ladder) = self.rules.ladders.iter().find(|l| l.category == category) else {
            return self.rules.unclassified.clone();
        };

        ladder
            .rungs
            .iter()
            .find(|rung| rung.matches(lowered))
            .map(|rung| rung.label.clone())
            .unwrap_or_else(|| ladder.fallback.clone())
    }
}
