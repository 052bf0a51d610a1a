use crate::surface::Locator;

/// Render a template by replacing `{{name}}` tokens with values from `vars`.
///
/// - Whitespace inside the braces is ignored: `{{  day  }}` == `{{day}}`.
/// - Unknown tokens are left intact so a bad template shows up verbatim in logs.
/// - An unterminated `{{` is copied through unchanged.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let token = after_open[..end].trim();
        match vars.iter().find(|(name, _)| *name == token) {
            Some((_, value)) if !token.is_empty() => out.push_str(value),
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Render a selector template straight into a [`Locator`].
pub fn locator(template: &str, vars: &[(&str, &str)]) -> Locator {
    Locator::new(render(template, vars))
}

/// Iterate over the (trimmed) placeholder names present in `template`.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    std::iter::from_fn(move || {
        let start = rest.find("{{")?;
        let after_open = &rest[start + 2..];
        let end = after_open.find("}}")?;
        rest = &after_open[end + 2..];
        Some(after_open[..end].trim())
    })
}
