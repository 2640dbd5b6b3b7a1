//! Prompt template substitution.
//!
//! Templates use `{name}` placeholders drawn from a fixed set per call site:
//! `task`, `previous_output`, `history`, `round`, `iteration`,
//! `current_state`. Substitution is an explicit ordered pass over the
//! provided pairs; placeholders not provided are left verbatim.

/// Render a template by replacing each provided `{name}` placeholder.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}
