// Shared prompt fragments.
// Each component that calls the generator defines its own prompts.rs alongside it.
// This file holds the fragments they share.

/// Grounding rule appended to every prompt that works on document content.
pub const GROUNDING_INSTRUCTION: &str = "\
    Use ONLY information present in the provided content. \
    Do NOT invent facts, names, numbers or sources. \
    If the content does not contain the answer, say so plainly.";

/// Fills `{name}` placeholders in one pass. Substituted values are never
/// rescanned, so braces inside a document or question stay literal.
/// Braces that do not name a known placeholder are copied through.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
