// gate-config/src/pricing.rs
// ============================================================================
// Module: Model Pricing Table
// Description: A baked-in USD-per-million-token price table used to
//              estimate a run's LLM cost before the analyzer is invoked.
// Purpose: Give preflight's cost-approval step a number to compare against
//          `approval.cost_threshold_usd` without a network call.
// Dependencies: gate-core
// ============================================================================

//! ## Overview
//! [`estimate_cost_usd`] is a rough, pre-call estimate: input tokens are
//! approximated from [`gate_core::IngestStats::total_lines`] (a crude
//! chars-per-line heuristic, clamped to `max_input_tokens`), output tokens
//! are a fixed guess sized for a findings NDJSON response. The table only
//! needs to be directionally right — a threshold comparison, not a billing
//! reconciliation.

use gate_core::IngestStats;

/// Assumed average characters per source line, used to approximate token
/// count from `total_lines` without reading file contents a second time.
const CHARS_PER_LINE: u64 = 40;
/// Assumed characters per token, a conventional English/code approximation.
const CHARS_PER_TOKEN: u64 = 4;
/// Fixed output-token estimate: enough for a few dozen NDJSON finding lines.
const ESTIMATED_OUTPUT_TOKENS: u32 = 1500;

/// USD cost per million input and output tokens for one model.
#[derive(Debug, Clone, Copy)]
struct ModelPrice {
    input_per_million: f64,
    output_per_million: f64,
}

/// Baked-in price table, keyed by the model's conventional name prefix.
/// Unrecognized models fall back to [`DEFAULT_PRICE`], the most expensive
/// entry, so an unlisted model estimates high rather than low.
const PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4o-mini", ModelPrice { input_per_million: 0.15, output_per_million: 0.60 }),
    ("gpt-4o", ModelPrice { input_per_million: 2.50, output_per_million: 10.00 }),
    ("o1-mini", ModelPrice { input_per_million: 1.10, output_per_million: 4.40 }),
    ("o3-mini", ModelPrice { input_per_million: 1.10, output_per_million: 4.40 }),
    ("claude-3-5-haiku", ModelPrice { input_per_million: 0.80, output_per_million: 4.00 }),
    ("claude-3-5-sonnet", ModelPrice { input_per_million: 3.00, output_per_million: 15.00 }),
    ("claude-3-opus", ModelPrice { input_per_million: 15.00, output_per_million: 75.00 }),
];

/// Fallback price used for a model name matching none of [`PRICES`].
const DEFAULT_PRICE: ModelPrice = ModelPrice { input_per_million: 15.00, output_per_million: 75.00 };

fn price_for(model: &str) -> ModelPrice {
    PRICES
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map_or(DEFAULT_PRICE, |(_, price)| *price)
}

/// Estimates the USD cost of one analyzer call against `model`, given the
/// ingest statistics already gathered and the configured input-token cap.
#[must_use]
pub fn estimate_cost_usd(model: &str, stats: &IngestStats, max_input_tokens: u32) -> f64 {
    let price = price_for(model);
    let raw_input_tokens = (stats.total_lines * CHARS_PER_LINE) / CHARS_PER_TOKEN;
    let input_tokens = raw_input_tokens.min(u64::from(max_input_tokens));

    let input_cost = (input_tokens as f64 / 1_000_000.0) * price.input_per_million;
    let output_cost = (f64::from(ESTIMATED_OUTPUT_TOKENS) / 1_000_000.0) * price.output_per_million;
    input_cost + output_cost
}

#[cfg(test)]
mod tests {
    use super::estimate_cost_usd;
    use gate_core::IngestStats;

    fn stats(total_lines: u64) -> IngestStats {
        IngestStats { total_files: 10, text_files: 10, in_scope_files: 10, total_lines }
    }

    #[test]
    fn larger_repositories_estimate_higher_cost_up_to_the_token_cap() {
        let small = estimate_cost_usd("gpt-4o-mini", &stats(100), 12_000);
        let large = estimate_cost_usd("gpt-4o-mini", &stats(100_000), 12_000);
        assert!(large > small);
    }

    #[test]
    fn unknown_model_falls_back_to_the_expensive_default_price() {
        let known = estimate_cost_usd("gpt-4o-mini", &stats(10_000), 12_000);
        let unknown = estimate_cost_usd("some-future-model", &stats(10_000), 12_000);
        assert!(unknown > known);
    }

    #[test]
    fn input_tokens_are_clamped_to_the_configured_cap() {
        let uncapped = estimate_cost_usd("gpt-4o", &stats(1_000_000), 500);
        let capped = estimate_cost_usd("gpt-4o", &stats(500 * 4 / 40), 500);
        assert!((uncapped - capped).abs() < 0.0001);
    }
}
