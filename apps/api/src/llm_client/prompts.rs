// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to prompts whose answer is decoded as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to free-text prompts.
pub const PLAIN_TEXT_INSTRUCTION: &str = "Respond with plain prose only. \
    Do NOT use markdown headings, bullet lists, or code fences.";
