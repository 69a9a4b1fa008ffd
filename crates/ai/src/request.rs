//! Request payload, prompt and generation wire types.

use harvest_inventory::{Category, InventorySnapshot, StatsSummary, Unit};
use serde::{Deserialize, Deserializer, Serialize};

use crate::result::{InsightError, InsightResult};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Instructions prepended to every request.
///
/// The inventory payload is appended as pretty-printed JSON.
pub const INSTRUCTIONS: &str = "\
You are an assistant specialised in inventory analysis for a greengrocer.
Analyse the inventory below and answer in Markdown with these sections:

1. **Summary**: overall state of the stock.
2. **Alerts**: items that are out of stock or at/below their minimum stock.
3. **Value analysis**: where the stock value is concentrated.
4. **Recommendations**: concrete restocking actions, most urgent first.
5. **Optimisation**: ideas to reduce waste of perishable goods.

Be concise and practical. Do not invent items that are not in the data.

Inventory data:
";

/// One item as sent to the insight service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadItem<'a> {
    pub name: &'a str,
    pub quantity: f64,
    pub unit: Unit,
    pub min_stock: f64,
    pub category: Category,
    pub price: f64,
}

/// `{items, stats}`: the full collection plus its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightPayload<'a> {
    pub items: Vec<PayloadItem<'a>>,
    pub stats: StatsSummary,
}

impl<'a> InsightPayload<'a> {
    pub fn from_snapshot(snapshot: &'a InventorySnapshot) -> Self {
        let items = snapshot
            .items
            .iter()
            .map(|item| PayloadItem {
                name: &item.name,
                quantity: item.quantity,
                unit: item.unit,
                min_stock: item.min_stock,
                category: item.category,
                price: item.price,
            })
            .collect();

        Self {
            items,
            stats: snapshot.stats,
        }
    }
}

/// Render the prompt text for a payload.
pub fn build_prompt(payload: &InsightPayload<'_>) -> InsightResult<String> {
    let data = serde_json::to_string_pretty(payload)
        .map_err(|e| InsightError::upstream(None, format!("failed to encode payload: {e}")))?;
    Ok(format!("{INSTRUCTIONS}{data}"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
            generation_config: GenerationConfig::default(),
        }
    }

    /// The prompt text, if any.
    pub fn prompt(&self) -> Option<&str> {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Successful `generateContent` response; only the fields we read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
}

impl GenerationResponse {
    /// Text of the first part of the first candidate, if non-blank.
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
    }
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
