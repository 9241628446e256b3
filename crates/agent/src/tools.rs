//! Local tools the cooking agent can call. Each returns plain text that is
//! fed back to the model verbatim.

use paperchef_models::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

struct Recipe {
    name: &'static str,
    ingredients: &'static [&'static str],
}

const ITALIAN: &[Recipe] = &[
    Recipe {
        name: "Pasta Carbonara",
        ingredients: &["pasta", "eggs", "bacon", "parmesan"],
    },
    Recipe {
        name: "Tomato Basil Pasta",
        ingredients: &["pasta", "tomato", "garlic", "basil"],
    },
    Recipe {
        name: "Garlic Pasta",
        ingredients: &["pasta", "garlic", "olive oil"],
    },
];

const ASIAN: &[Recipe] = &[
    Recipe {
        name: "Stir Fry",
        ingredients: &["soy sauce", "garlic", "ginger", "vegetables"],
    },
    Recipe {
        name: "Fried Rice",
        ingredients: &["rice", "soy sauce", "eggs", "vegetables"],
    },
    Recipe {
        name: "Garlic Ginger Shrimp",
        ingredients: &["shrimp", "garlic", "ginger"],
    },
];

const ANY: &[Recipe] = &[
    Recipe {
        name: "Vegetable Soup",
        ingredients: &["vegetables", "water", "salt"],
    },
    Recipe {
        name: "Eggs Scrambled",
        ingredients: &["eggs", "butter", "salt"],
    },
    Recipe {
        name: "Grilled Chicken",
        ingredients: &["chicken", "salt", "pepper"],
    },
];

const INGREDIENT_KEYWORDS: &[&str] = &[
    "cup", "tablespoon", "teaspoon", "tbsp", "tsp", "oz", "grams", "g", "ml", "liter", "pound",
    "lb", "kg", "clove", "piece", "slice", "flour", "sugar", "salt", "pepper", "butter", "oil",
    "water", "eggs", "milk", "cheese", "tomato", "garlic", "onion", "potato", "rice", "pasta",
    "bread", "chicken", "beef", "fish", "shrimp", "vegetables", "herbs", "spices", "vanilla",
    "chocolate", "nuts",
];

const MAX_EXTRACTED: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NutritionFacts {
    pub calories: u32,
    pub protein: &'static str,
    pub carbs: &'static str,
    pub fat: &'static str,
}

const NUTRITION: &[(&str, NutritionFacts)] = &[
    (
        "pasta carbonara",
        NutritionFacts { calories: 450, protein: "20g", carbs: "55g", fat: "18g" },
    ),
    (
        "tomato basil pasta",
        NutritionFacts { calories: 380, protein: "12g", carbs: "65g", fat: "8g" },
    ),
    (
        "stir fry",
        NutritionFacts { calories: 320, protein: "25g", carbs: "35g", fat: "10g" },
    ),
    (
        "fried rice",
        NutritionFacts { calories: 400, protein: "15g", carbs: "50g", fat: "12g" },
    ),
    (
        "vegetable soup",
        NutritionFacts { calories: 120, protein: "5g", carbs: "20g", fat: "2g" },
    ),
    (
        "grilled chicken",
        NutritionFacts { calories: 280, protein: "40g", carbs: "0g", fat: "12g" },
    ),
];

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn recipes_for(cuisine: &str) -> &'static [Recipe] {
    if cuisine == "any" {
        return ANY;
    }
    match capitalize(cuisine).as_str() {
        "Italian" => ITALIAN,
        "Asian" => ASIAN,
        _ => ANY,
    }
}

pub fn search_recipes(ingredients: &[String], cuisine: &str) -> String {
    let mut matches: Vec<(&Recipe, usize)> = recipes_for(cuisine)
        .iter()
        .filter_map(|recipe| {
            let score = ingredients
                .iter()
                .filter(|wanted| {
                    let wanted = wanted.to_lowercase();
                    recipe.ingredients.iter().any(|have| have.to_lowercase() == wanted)
                })
                .count();
            (score > 0).then_some((recipe, score))
        })
        .collect();

    if matches.is_empty() {
        return format!(
            "No recipes found with {} cuisine and ingredients: {}",
            cuisine,
            ingredients.join(", ")
        );
    }

    matches.sort_by(|a, b| b.1.cmp(&a.1));
    let mut result = format!("Found {} recipes:\n", matches.len());
    for (recipe, score) in matches {
        result.push_str(&format!(
            "- {} (matches {} ingredients: {})\n",
            recipe.name,
            score,
            recipe.ingredients.join(", ")
        ));
    }
    result
}

pub fn extract_ingredients(recipe_text: &str) -> String {
    let lowered = recipe_text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let mut found: Vec<String> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if !INGREDIENT_KEYWORDS.iter().any(|k| word.contains(k)) {
            continue;
        }
        let phrase = if i > 0 {
            match words.get(i + 1) {
                Some(next) => format!("{} {} {}", words[i - 1], word, next),
                None => format!("{} {}", words[i - 1], word),
            }
        } else {
            word.to_string()
        };
        if !found.contains(&phrase) {
            found.push(phrase);
        }
    }

    if found.is_empty() {
        return "No ingredients found in the provided text.".to_string();
    }
    let lines: Vec<String> = found
        .iter()
        .take(MAX_EXTRACTED)
        .map(|phrase| format!("- {phrase}"))
        .collect();
    format!("Extracted ingredients:\n{}", lines.join("\n"))
}

pub fn nutrition_facts(dish_name: &str) -> Option<NutritionFacts> {
    let key = dish_name.to_lowercase();
    NUTRITION
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, facts)| *facts)
}

pub fn get_nutrition_info(dish_name: &str) -> String {
    match nutrition_facts(dish_name) {
        Some(info) => format!(
            "Nutrition info for {dish_name} (per serving):\n- Calories: {}\n- Protein: {}\n- Carbs: {}\n- Fat: {}",
            info.calories, info.protein, info.carbs, info.fat
        ),
        None => format!(
            "Nutrition data not available for {dish_name}. Please ask about a specific recipe."
        ),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Deserialize)]
struct SearchRecipesArgs {
    ingredients: Vec<String>,
    #[serde(default = "any_cuisine")]
    cuisine: String,
}

fn any_cuisine() -> String {
    "any".to_string()
}

#[derive(Deserialize)]
struct ExtractIngredientsArgs {
    recipe_text: String,
}

#[derive(Deserialize)]
struct NutritionArgs {
    dish_name: String,
}

/// Schema list handed to the model plus dispatch of its tool calls.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn cooking() -> Self {
        let definitions = vec![
            ToolDefinition {
                name: "search_recipes".to_string(),
                description: "Search for recipes based on available ingredients and cuisine preference.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "ingredients": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "List of ingredients to search for"
                        },
                        "cuisine": {
                            "type": "string",
                            "description": "Cuisine type (optional, e.g., Italian, Asian, Mexican)",
                            "default": "any"
                        }
                    },
                    "required": ["ingredients"]
                }),
            },
            ToolDefinition {
                name: "extract_ingredients".to_string(),
                description: "Extract ingredients from a recipe description or text.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "recipe_text": {
                            "type": "string",
                            "description": "The recipe text to extract ingredients from"
                        }
                    },
                    "required": ["recipe_text"]
                }),
            },
            ToolDefinition {
                name: "get_nutrition_info".to_string(),
                description: "Get estimated nutritional information for a dish.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "dish_name": {
                            "type": "string",
                            "description": "Name of the dish to get nutrition info for"
                        }
                    },
                    "required": ["dish_name"]
                }),
            },
        ];
        Self { definitions }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Runs a tool call. Bad calls come back as text so the model can
    /// correct itself.
    pub fn dispatch(&self, call: &ToolCall) -> String {
        info!(tool = %call.name, call_id = %call.id, "Running tool");
        let result = match call.name.as_str() {
            "search_recipes" => serde_json::from_str::<SearchRecipesArgs>(&call.arguments)
                .map(|args| search_recipes(&args.ingredients, &args.cuisine)),
            "extract_ingredients" => {
                serde_json::from_str::<ExtractIngredientsArgs>(&call.arguments)
                    .map(|args| extract_ingredients(&args.recipe_text))
            }
            "get_nutrition_info" => serde_json::from_str::<NutritionArgs>(&call.arguments)
                .map(|args| get_nutrition_info(&args.dish_name)),
            other => {
                warn!(tool = %other, "Model requested unknown tool");
                return format!("Error: unknown tool '{other}'");
            }
        };
        result.unwrap_or_else(|e| {
            warn!(tool = %call.name, error = %e, "Invalid tool arguments");
            format!("Error: invalid arguments for {}: {}", call.name, e)
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::cooking()
    }
}
