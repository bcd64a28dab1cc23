//! FFmpeg filtergraph escaping.
//!
//! A value placed inside `-filter_complex` is unescaped twice: once when the
//! graph is split into filters, once when a filter splits its options.
//! [`filter_value`] applies both levels, so its result can be embedded as
//! `key=<value>` in any filter of the chain.

/// Escape an option value (first level: `\`, `'` and `:`).
pub fn option_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape a filter description (second level: `\`, `'`, `[`, `]`, `,`, `;`).
pub fn graph_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

/// Escape an option value for use inside a filtergraph.
pub fn filter_value(value: &str) -> String {
    graph_value(&option_value(value))
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
