//! `{name}` placeholder substitution for task and agent templates

use std::collections::BTreeMap;

/// Named values substituted into task and agent templates, e.g. `topic`
pub type TemplateInputs = BTreeMap<String, String>;

/// Build inputs holding only the research topic
pub fn topic_inputs(topic: &str) -> TemplateInputs {
    let mut inputs = TemplateInputs::new();
    inputs.insert("topic".to_string(), topic.to_string());
    inputs
}

/// Replace every `{name}` whose name is in `inputs`.
///
/// Placeholders without a matching input, and braces that do not form a
/// placeholder, are left untouched.
pub fn render(template: &str, inputs: &TemplateInputs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                let name = &after[..close];
                match inputs.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
