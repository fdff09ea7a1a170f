// Shared prompt fragments.
// Each agent keeps its own templates in `agents::prompts`; this file only holds
// the cross-cutting output-format instructions appended to them.

/// Appended to prompts that expect a single JSON document back.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Return only valid JSON. \
Do NOT include any text outside the JSON. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

/// Appended to prompts that expect one bare value back (a number, a word).
pub const BARE_VALUE_INSTRUCTION: &str = "\
Do not explain, do not use markdown, and do not include any special characters.";
