//! Model pricing and output-token estimation.
//!
//! Streamed logs can under-report `output_tokens` for a turn, so cost
//! estimation prefers a character-count estimate of the visible content
//! over the reported figure whenever the estimate is larger.

use crate::session::{SubAgentMessage, Turn};

/// Rough characters-per-token ratio used when estimating output tokens
/// from visible content.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Input + cache-read tokens above this switch a tier to its
/// extended-context rate table.
const EXTENDED_CONTEXT_THRESHOLD: u64 = 200_000;

const WEB_SEARCH_COST_PER_REQUEST: f64 = 0.01;

/// USD per million tokens, by category.
#[derive(Debug, Clone, Copy)]
struct Rates {
    input: f64,
    output: f64,
    cache_write: f64,
    cache_read: f64,
}

#[derive(Debug, Clone, Copy)]
struct PricingTier {
    standard: Rates,
    extended: Rates,
}

const OPUS_LATEST: PricingTier = PricingTier {
    standard: Rates {
        input: 5.0,
        output: 25.0,
        cache_write: 6.25,
        cache_read: 0.50,
    },
    extended: Rates {
        input: 7.5,
        output: 37.5,
        cache_write: 9.375,
        cache_read: 0.75,
    },
};

const OPUS_LEGACY: PricingTier = PricingTier {
    standard: Rates {
        input: 15.0,
        output: 75.0,
        cache_write: 18.75,
        cache_read: 1.50,
    },
    // Legacy Opus never shipped an extended context window; rates match.
    extended: Rates {
        input: 15.0,
        output: 75.0,
        cache_write: 18.75,
        cache_read: 1.50,
    },
};

const SONNET_LATEST: PricingTier = PricingTier {
    standard: Rates {
        input: 3.0,
        output: 15.0,
        cache_write: 3.75,
        cache_read: 0.30,
    },
    extended: Rates {
        input: 6.0,
        output: 22.5,
        cache_write: 7.5,
        cache_read: 0.60,
    },
};

const SONNET_LEGACY: PricingTier = PricingTier {
    standard: Rates {
        input: 3.0,
        output: 15.0,
        cache_write: 3.75,
        cache_read: 0.30,
    },
    extended: Rates {
        input: 3.0,
        output: 15.0,
        cache_write: 3.75,
        cache_read: 0.30,
    },
};

const HAIKU_LATEST: PricingTier = PricingTier {
    standard: Rates {
        input: 1.0,
        output: 5.0,
        cache_write: 1.25,
        cache_read: 0.10,
    },
    extended: Rates {
        input: 1.0,
        output: 5.0,
        cache_write: 1.25,
        cache_read: 0.10,
    },
};

const HAIKU_LEGACY: PricingTier = PricingTier {
    standard: Rates {
        input: 0.80,
        output: 4.0,
        cache_write: 1.0,
        cache_read: 0.08,
    },
    extended: Rates {
        input: 0.80,
        output: 4.0,
        cache_write: 1.0,
        cache_read: 0.08,
    },
};

/// Extract a (major, minor) version from a model name.
///
/// Handles both orderings seen in the wild: `claude-opus-4-6` and
/// `claude-3-5-sonnet-20241022`. Release-date suffixes (8 digits) are not
/// version components.
fn model_version(model: &str) -> (u32, u32) {
    let mut parts = model
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty() && s.len() <= 2)
        .filter_map(|s| s.parse::<u32>().ok());
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor)
}

/// Select a pricing tier by family/version pattern.
///
/// Unknown model names fall back to the latest Sonnet tier.
fn tier_for_model(model: &str) -> &'static PricingTier {
    let name = model.to_ascii_lowercase();
    let version = model_version(&name);

    if name.contains("opus") {
        if version >= (4, 5) {
            &OPUS_LATEST
        } else {
            &OPUS_LEGACY
        }
    } else if name.contains("haiku") {
        if version >= (4, 0) {
            &HAIKU_LATEST
        } else {
            &HAIKU_LEGACY
        }
    } else if name.contains("sonnet") {
        if version >= (4, 0) {
            &SONNET_LATEST
        } else {
            &SONNET_LEGACY
        }
    } else {
        &SONNET_LATEST
    }
}

/// Inputs to a cost calculation, in tokens (plus web search requests).
#[derive(Debug, Clone, Copy, Default)]
pub struct CostParams<'a> {
    pub model: &'a str,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_write_tokens: u64,
    pub cache_read_tokens: u64,
    pub web_search_requests: u32,
}

/// USD cost of one API call (or one turn's aggregated usage).
pub fn calculate_cost(params: &CostParams<'_>) -> f64 {
    let tier = tier_for_model(params.model);
    let rates = if params.input_tokens + params.cache_read_tokens > EXTENDED_CONTEXT_THRESHOLD {
        &tier.extended
    } else {
        &tier.standard
    };

    let per_million = |tokens: u64, rate: f64| tokens as f64 / 1_000_000.0 * rate;

    per_million(params.input_tokens, rates.input)
        + per_million(params.output_tokens, rates.output)
        + per_million(params.cache_write_tokens, rates.cache_write)
        + per_million(params.cache_read_tokens, rates.cache_read)
        + params.web_search_requests as f64 * WEB_SEARCH_COST_PER_REQUEST
}

fn estimate_tokens_for_chars(chars: usize) -> u64 {
    (chars as f64 / CHARS_PER_TOKEN).ceil() as u64
}

fn estimate_content_tokens<'a>(
    thinking: impl Iterator<Item = &'a String>,
    text: impl Iterator<Item = &'a String>,
    tool_inputs: impl Iterator<Item = &'a serde_json::Value>,
) -> u64 {
    let mut tokens = 0u64;
    for entry in thinking {
        tokens += estimate_tokens_for_chars(entry.chars().count());
    }
    for chunk in text {
        tokens += estimate_tokens_for_chars(chunk.chars().count());
    }
    for input in tool_inputs {
        let serialized = serde_json::to_string(input).unwrap_or_default();
        tokens += estimate_tokens_for_chars(serialized.chars().count());
    }
    tokens
}

/// True output tokens for a turn: the reported count or the estimate from
/// visible content, whichever is larger.
pub fn estimate_total_output_tokens(turn: &Turn) -> u64 {
    let estimated = estimate_content_tokens(
        turn.thinking.iter(),
        turn.assistant_text.iter(),
        turn.tool_calls.iter().map(|c| &c.input),
    );
    turn.token_usage.output_tokens.max(estimated)
}

/// Output-token estimate for one sub-agent progress batch.
pub fn estimate_sub_agent_output_tokens(message: &SubAgentMessage) -> u64 {
    let estimated = estimate_content_tokens(
        message.thinking.iter(),
        message.text.iter(),
        message.tool_calls.iter().map(|c| &c.input),
    );
    message.token_usage.output_tokens.max(estimated)
}

/// Turn cost with the estimated (not reported) output figure.
pub fn calculate_turn_cost_estimated(turn: &Turn) -> f64 {
    calculate_cost(&CostParams {
        model: turn.model.as_deref().unwrap_or_default(),
        input_tokens: turn.token_usage.input_tokens,
        output_tokens: estimate_total_output_tokens(turn),
        cache_write_tokens: turn.token_usage.cache_creation_tokens,
        cache_read_tokens: turn.token_usage.cache_read_tokens,
        web_search_requests: turn.token_usage.web_search_requests,
    })
}

/// Sub-agent batch cost with the estimated output figure.
pub fn calculate_sub_agent_cost_estimated(message: &SubAgentMessage) -> f64 {
    calculate_cost(&CostParams {
        model: message.model.as_deref().unwrap_or_default(),
        input_tokens: message.token_usage.input_tokens,
        output_tokens: estimate_sub_agent_output_tokens(message),
        cache_write_tokens: message.token_usage.cache_creation_tokens,
        cache_read_tokens: message.token_usage.cache_read_tokens,
        web_search_requests: message.token_usage.web_search_requests,
    })
}

/// Format a USD amount: 4 decimals below a cent, 3 below a dollar, else 2.
pub fn format_cost(usd: f64) -> String {
    if usd < 0.01 {
        format!("${:.4}", usd)
    } else if usd < 1.0 {
        format!("${:.3}", usd)
    } else {
        format!("${:.2}", usd)
    }
}
