//! Placeholder substitution for HTML document templates.
//!
//! Recognised forms are `{{key}}`, `{{ key }}`, `${key}` and `[key]`, matched
//! case-insensitively against the context. `{{SIGNATURE_<ROLE>}}` becomes a
//! signature anchor. Unresolved `{{...}}` placeholders get a default derived
//! from their name so no raw braces reach the signer. Substituted values are
//! HTML-escaped; the template itself is trusted markup.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub type Context = BTreeMap<String, String>;

fn signature_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\{\{\s*SIGNATURE_(CEO|CFO|CTO|CXO|COO|SECRETARY|BOARD)\s*\}\}")
            .expect("signature pattern is valid")
    })
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}|\$\{\s*([A-Za-z0-9_.]+)\s*\}|\[([A-Za-z0-9_]+)\]")
            .expect("placeholder pattern is valid")
    })
}

/// Keys are matched lowercase; build contexts with [`insert`].
pub fn insert(context: &mut Context, key: &str, value: impl Into<String>) {
    context.insert(key.to_lowercase(), value.into());
}

pub fn render(template: &str, context: &Context) -> String {
    let anchored = signature_pattern().replace_all(template, |caps: &Captures| {
        let role = caps[1].to_uppercase();
        format!(
            r#"<span class="signature-anchor" data-sig="{}">&nbsp;</span>"#,
            role
        )
    });

    placeholder_pattern()
        .replace_all(&anchored, |caps: &Captures| {
            if let Some(key) = caps.get(1) {
                let key = key.as_str().to_lowercase();
                return match context.get(&key) {
                    Some(value) => escape_html(value),
                    None => escape_html(&default_for(&key, context)),
                };
            }

            // `${key}` and `[key]` are only replaced when known; brackets
            // are ordinary text in legal documents.
            let key = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str().to_lowercase());
            match key.and_then(|k| context.get(&k)) {
                Some(value) => escape_html(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn lookup(context: &Context, key: &str) -> String {
    context.get(key).cloned().unwrap_or_default()
}

/// Fallback for an unknown `{{name}}`, chosen from words in the name.
pub fn default_for(name: &str, context: &Context) -> String {
    let name = name.to_lowercase();
    if name.contains("date") {
        lookup(context, "effective_date")
    } else if name.contains("company") {
        lookup(context, "company_name")
    } else if name.contains("state") || name.contains("governing") {
        lookup(context, "state")
    } else if name.contains("name") {
        lookup(context, "full_name")
    } else if name.contains("email") {
        lookup(context, "email")
    } else if name.contains("title") {
        lookup(context, "title")
    } else if name.contains("currency") {
        "USD".to_string()
    } else if name.contains("salary") {
        "$0".to_string()
    } else if name.contains("share") || name.contains("equity") || name.contains("percentage") {
        "0".to_string()
    } else {
        String::new()
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `150000` -> `$150,000`, `1234.5` -> `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, frac) = (cents.abs() / 100, cents.abs() % 100);

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        let mut ctx = Context::new();
        insert(&mut ctx, "full_name", "Jane Doe");
        insert(&mut ctx, "Title", "CFO");
        insert(&mut ctx, "company_name", "Acme, Inc.");
        insert(&mut ctx, "state", "Delaware");
        insert(&mut ctx, "effective_date", "January 1, 2026");
        insert(&mut ctx, "email", "jane@example.com");
        ctx
    }

    #[test]
    fn test_all_placeholder_forms() {
        let out = render("{{full_name}} / {{ TITLE }} / ${company_name} / [state]", &context());
        assert_eq!(out, "Jane Doe / CFO / Acme, Inc. / Delaware");
    }

    #[test]
    fn test_signature_anchor() {
        let out = render("Signed: {{SIGNATURE_CEO}} and {{ signature_secretary }}", &context());
        assert!(out.contains(r#"data-sig="CEO""#));
        assert!(out.contains(r#"data-sig="SECRETARY""#));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_unknown_placeholders_get_defaults() {
        let out = render(
            "{{start_date}}|{{governing_law}}|{{officer_full_name}}|{{base_salary}}|{{share_count}}|{{pay_currency}}|{{mystery}}",
            &context(),
        );
        assert_eq!(out, "January 1, 2026|Delaware|Jane Doe|$0|0|USD|");
    }

    #[test]
    fn test_values_are_escaped() {
        let mut ctx = context();
        insert(&mut ctx, "full_name", "<script>alert(1)</script>");
        insert(&mut ctx, "notes", "R&D \"lead\"");
        let out = render("<p>{{full_name}}</p><p>${notes}</p><p>{{officer_name}}</p>", &ctx);
        assert_eq!(
            out,
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>\
             <p>R&amp;D &quot;lead&quot;</p>\
             <p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_unknown_brackets_left_alone() {
        assert_eq!(render("[Exhibit A] ${unknown}", &context()), "[Exhibit A] ${unknown}");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(150000.0), "$150,000");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(999.0), "$999");
    }
}
