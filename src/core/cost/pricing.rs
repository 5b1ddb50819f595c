use serde::Serialize;

/// Per-model token pricing in dollars per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPricing {
    pub model: &'static str,
    pub display_name: &'static str,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Model used whenever the requested one is missing or unknown.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// All known chat model pricing entries. The first row is the default.
static PRICING_TABLE: &[ModelPricing] = &[
    ModelPricing {
        model: DEFAULT_MODEL,
        display_name: "Claude 3 Haiku",
        input_per_mtok: 0.25,
        output_per_mtok: 1.25,
    },
    ModelPricing {
        model: "claude-3-sonnet-20240229",
        display_name: "Claude 3 Sonnet",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    ModelPricing {
        model: "claude-3-opus-20240229",
        display_name: "Claude 3 Opus",
        input_per_mtok: 15.0,
        output_per_mtok: 75.0,
    },
    ModelPricing {
        model: "claude-3-5-sonnet-20241022",
        display_name: "Claude 3.5 Sonnet",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    ModelPricing {
        model: "claude-3-5-haiku-20241022",
        display_name: "Claude 3.5 Haiku",
        input_per_mtok: 0.8,
        output_per_mtok: 4.0,
    },
    ModelPricing {
        model: "claude-sonnet-4-20250514",
        display_name: "Claude Sonnet 4",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    ModelPricing {
        model: "claude-sonnet-4-5-20250514",
        display_name: "Claude Sonnet 4.5",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    ModelPricing {
        model: "claude-opus-4-5-20251101",
        display_name: "Claude Opus 4.5",
        input_per_mtok: 5.0,
        output_per_mtok: 25.0,
    },
    ModelPricing {
        model: "claude-haiku-4-5-20250514",
        display_name: "Claude Haiku 4.5",
        input_per_mtok: 1.0,
        output_per_mtok: 5.0,
    },
    // OpenAI models used by the clarification step of deep research
    ModelPricing {
        model: "gpt-4o-mini",
        display_name: "GPT-4o mini",
        input_per_mtok: 0.15,
        output_per_mtok: 0.60,
    },
];

/// Embedding model pricing in dollars per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingPricing {
    pub model: &'static str,
    pub per_mtok: f64,
}

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

static EMBEDDING_TABLE: &[EmbeddingPricing] = &[
    EmbeddingPricing {
        model: DEFAULT_EMBEDDING_MODEL,
        per_mtok: 0.02,
    },
    EmbeddingPricing {
        model: "text-embedding-3-large",
        per_mtok: 0.13,
    },
    EmbeddingPricing {
        model: "text-embedding-ada-002",
        per_mtok: 0.10,
    },
];

/// Cohere rerank billing: dollars per thousand search units.
pub const COHERE_PRICE_PER_1K_SEARCHES: f64 = 2.0;

/// Normalize a model name by stripping common prefixes and suffixes.
/// Examples:
///   "anthropic.claude-sonnet-4-5-v2:0" -> "claude-sonnet-4-5"
///   "claude-3-haiku-20240307" -> "claude-3-haiku"
fn normalize_model(model: &str) -> String {
    let mut name = model.trim().to_lowercase();

    if let Some(stripped) = name.strip_prefix("anthropic.") {
        name = stripped.to_string();
    }

    // Vertex/Bedrock suffixes like "-v2:0", ":0", "@001"
    if let Some(idx) = name.find(':') {
        name.truncate(idx);
    }
    if let Some(idx) = name.find('@') {
        name.truncate(idx);
    }
    if let Some(idx) = name.rfind("-v") {
        let tail = &name[idx + 2..];
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            name.truncate(idx);
        }
    }

    // Date suffixes like "-20250514"
    if name.len() > 9 && name.is_char_boundary(name.len() - 9) {
        let tail = &name[name.len() - 9..];
        if tail.starts_with('-') && tail[1..].chars().all(|c| c.is_ascii_digit()) {
            name.truncate(name.len() - 9);
        }
    }

    name
}

/// The designated fallback row.
pub fn default_pricing() -> &'static ModelPricing {
    &PRICING_TABLE[0]
}

/// Look up pricing for a model name. Returns None if unknown.
pub fn lookup(model: &str) -> Option<&'static ModelPricing> {
    if let Some(exact) = PRICING_TABLE.iter().find(|p| p.model == model) {
        return Some(exact);
    }
    let normalized = normalize_model(model);
    PRICING_TABLE
        .iter()
        .find(|p| normalize_model(p.model) == normalized)
}

/// Pricing for `model`, falling back to the default row when the model is
/// absent or unrecognized.
pub fn get_model_info(model: Option<&str>) -> &'static ModelPricing {
    match model.filter(|m| !m.trim().is_empty()) {
        Some(m) => lookup(m).unwrap_or_else(|| {
            tracing::debug!(model = m, fallback = DEFAULT_MODEL, "unknown model, using default pricing");
            default_pricing()
        }),
        None => default_pricing(),
    }
}

/// Embedding pricing with fallback to `text-embedding-3-small`.
pub fn embedding_pricing(model: Option<&str>) -> &'static EmbeddingPricing {
    model
        .and_then(|m| EMBEDDING_TABLE.iter().find(|p| p.model == m))
        .unwrap_or(&EMBEDDING_TABLE[0])
}

/// Every chat model row, default first.
pub fn all_models() -> &'static [ModelPricing] {
    PRICING_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_date_suffix() {
        assert_eq!(normalize_model("claude-3-haiku-20240307"), "claude-3-haiku");
    }

    #[test]
    fn normalize_strips_anthropic_prefix_and_vertex_suffix() {
        assert_eq!(
            normalize_model("anthropic.claude-sonnet-4-20250514-v2:0"),
            "claude-sonnet-4"
        );
    }

    #[test]
    fn normalize_strips_at_suffix() {
        assert_eq!(normalize_model("claude-opus-4-5@20251101"), "claude-opus-4-5");
    }

    #[test]
    fn normalize_passthrough() {
        assert_eq!(normalize_model("gpt-4o-mini"), "gpt-4o-mini");
    }

    #[test]
    fn lookup_exact_model() {
        let p = lookup("claude-3-opus-20240229").unwrap();
        assert!((p.input_per_mtok - 15.0).abs() < 1e-12);
        assert!((p.output_per_mtok - 75.0).abs() < 1e-12);
        assert_eq!(p.display_name, "Claude 3 Opus");
    }

    #[test]
    fn lookup_without_date_suffix() {
        let p = lookup("claude-3-5-haiku").unwrap();
        assert_eq!(p.model, "claude-3-5-haiku-20241022");
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("gpt-4o").is_none());
    }

    #[test]
    fn unknown_model_falls_back_to_haiku_row() {
        let fallback = get_model_info(Some("nonexistent-model"));
        let haiku = get_model_info(Some("claude-3-haiku-20240307"));
        assert!(std::ptr::eq(fallback, haiku));
        assert_eq!(fallback, haiku);
    }

    #[test]
    fn missing_model_uses_default() {
        assert_eq!(get_model_info(None).model, DEFAULT_MODEL);
        assert_eq!(get_model_info(Some("  ")).model, DEFAULT_MODEL);
    }

    #[test]
    fn default_row_is_first() {
        assert_eq!(all_models()[0].model, DEFAULT_MODEL);
        assert!((default_pricing().input_per_mtok - 0.25).abs() < 1e-12);
    }

    #[test]
    fn embedding_pricing_defaults_to_small() {
        assert_eq!(embedding_pricing(None).model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(embedding_pricing(Some("mystery")).model, DEFAULT_EMBEDDING_MODEL);
        assert!((embedding_pricing(Some("text-embedding-3-large")).per_mtok - 0.13).abs() < 1e-12);
    }
}
