//! Recipe detection heuristics
//!
//! Decides from model output alone whether a reply carries both an
//! ingredients section and a steps section. Only then is a video lookup
//! worth the second external call.
//!
//! Header words are the strongest signal and are checked first. The
//! structural patterns (bullets, quantities, numbered lines, cooking verbs)
//! are fallbacks consulted only when no header matched, so [`classify`]
//! reports the header path whenever one exists.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_INGREDIENT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bingredients?\b").expect("valid regex"));
static RE_BULLET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[-*•]\s+").expect("valid regex"));
static RE_QUANTITY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*\d+\s*(grams|g|kg|ml|l|cup|cups|tbsp|tsp)\b").expect("valid regex")
});

static RE_STEPS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsteps?\b|\bmethod\b|\binstructions\b").expect("valid regex"));
static RE_NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("valid regex"));
static RE_STEP_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*step\s+\d+\b").expect("valid regex"));
static RE_COOKING_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(preheat|saute|fry|boil|bake|grill)\b").expect("valid regex"));

/// Which heuristic established the ingredients signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientSignal {
    /// "ingredient" / "ingredients" anywhere in the text
    Header,
    /// a line starting with `-`, `*` or `•`
    Bullet,
    /// a line starting with a quantity such as `200g` or `2 cups`
    Quantity,
}

/// Which heuristic established the steps signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSignal {
    /// "step", "steps", "method" or "instructions" anywhere in the text
    Header,
    /// a line starting with `1. `
    Numbered,
    /// a line starting with `step 1`
    StepLabel,
    /// preheat, saute, fry, boil, bake or grill
    CookingAction,
}

/// Outcome of classifying a reply, keeping the responsible signal paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecipeSignals {
    pub ingredients: Option<IngredientSignal>,
    pub steps: Option<StepSignal>,
}

impl RecipeSignals {
    /// Both signals must be present.
    pub fn is_recipe(&self) -> bool {
        self.ingredients.is_some() && self.steps.is_some()
    }
}

/// Classify `text`, reporting which heuristic fired for each signal.
pub fn classify(text: &str) -> RecipeSignals {
    if text.trim().is_empty() {
        return RecipeSignals::default();
    }
    let lowered = text.to_lowercase();

    RecipeSignals {
        ingredients: ingredient_signal(&lowered),
        steps: step_signal(&lowered),
    }
}

/// True when the reply contains both an ingredients and a steps signal.
pub fn looks_like_recipe(text: &str) -> bool {
    classify(text).is_recipe()
}

fn ingredient_signal(lowered: &str) -> Option<IngredientSignal> {
    if RE_INGREDIENT_HEADER.is_match(lowered) {
        Some(IngredientSignal::Header)
    } else if RE_BULLET_LINE.is_match(lowered) {
        Some(IngredientSignal::Bullet)
    } else if RE_QUANTITY_LINE.is_match(lowered) {
        Some(IngredientSignal::Quantity)
    } else {
        None
    }
}

fn step_signal(lowered: &str) -> Option<StepSignal> {
    if RE_STEPS_HEADER.is_match(lowered) {
        Some(StepSignal::Header)
    } else if RE_NUMBERED_LINE.is_match(lowered) {
        Some(StepSignal::Numbered)
    } else if RE_STEP_LABEL.is_match(lowered) {
        Some(StepSignal::StepLabel)
    } else if RE_COOKING_ACTION.is_match(lowered) {
        Some(StepSignal::CookingAction)
    } else {
        None
    }
}
