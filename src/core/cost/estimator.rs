use crate::core::cost::pricing::{self, COHERE_PRICE_PER_1K_SEARCHES};

const TOKENS_PER_MTOK: f64 = 1_000_000.0;

/// Token counts arrive as JSON numbers; anything non-finite or negative
/// counts as zero.
pub fn sanitize_count(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Dollar cost of a request with the given model, unformatted.
pub fn estimate_cost_value(input_tokens: f64, output_tokens: f64, model: Option<&str>) -> f64 {
    let price = pricing::get_model_info(model);
    let input = sanitize_count(input_tokens) / TOKENS_PER_MTOK * price.input_per_mtok;
    let output = sanitize_count(output_tokens) / TOKENS_PER_MTOK * price.output_per_mtok;
    input + output
}

/// Dollar cost rendered with four decimals, e.g. `"0.8750"`.
pub fn estimate_cost(input_tokens: f64, output_tokens: f64, model: Option<&str>) -> String {
    format!("{:.4}", estimate_cost_value(input_tokens, output_tokens, model))
}

/// Embedding cost, defaulting to `text-embedding-3-small` pricing.
pub fn estimate_embedding_cost(tokens: f64, model: Option<&str>) -> f64 {
    sanitize_count(tokens) / TOKENS_PER_MTOK * pricing::embedding_pricing(model).per_mtok
}

/// Cohere rerank cost for a number of search units.
pub fn estimate_cohere_cost(searches: f64) -> f64 {
    sanitize_count(searches) / 1000.0 * COHERE_PRICE_PER_1K_SEARCHES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cost::pricing::all_models;

    #[test]
    fn zero_tokens_cost_nothing_for_every_model() {
        for p in all_models() {
            assert_eq!(estimate_cost(0.0, 0.0, Some(p.model)), "0.0000", "{}", p.model);
        }
        assert_eq!(estimate_cost(0.0, 0.0, None), "0.0000");
    }

    #[test]
    fn haiku_million_input_half_million_output() {
        let cost = estimate_cost(1_000_000.0, 500_000.0, Some("claude-3-haiku-20240307"));
        assert_eq!(cost, "0.8750");
    }

    #[test]
    fn unknown_model_uses_haiku_rates() {
        assert_eq!(
            estimate_cost(1_000_000.0, 500_000.0, Some("nonexistent-model")),
            "0.8750"
        );
    }

    #[test]
    fn cost_is_linear() {
        let models = [None, Some("claude-3-opus-20240229"), Some("gpt-4o-mini")];
        for model in models {
            for (a, b) in [(1234.0, 567.0), (0.0, 98_765.0), (2_500_000.0, 0.0)] {
                let single = estimate_cost_value(a, b, model);
                let double = estimate_cost_value(2.0 * a, 2.0 * b, model);
                assert!((double - 2.0 * single).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn non_finite_inputs_count_as_zero() {
        assert_eq!(estimate_cost(f64::NAN, f64::INFINITY, None), "0.0000");
        assert_eq!(estimate_cost(-500.0, 0.0, None), "0.0000");
        assert_eq!(
            estimate_cost(f64::NAN, 1_000_000.0, Some("claude-3-haiku-20240307")),
            "1.2500"
        );
    }

    #[test]
    fn embedding_and_cohere_costs() {
        assert!((estimate_embedding_cost(1_000_000.0, None) - 0.02).abs() < 1e-12);
        assert!((estimate_embedding_cost(2_000_000.0, Some("text-embedding-ada-002")) - 0.2).abs() < 1e-12);
        assert!((estimate_cohere_cost(1.0) - 0.002).abs() < 1e-12);
        assert_eq!(estimate_cohere_cost(f64::NAN), 0.0);
    }
}
