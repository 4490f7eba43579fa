//! Path parsing for schema-addressed request paths.
//!
//! Request paths look like `/a:x/y[name=Eth0]/z[k1=1][k2=2]/leaf`. Predicate
//! values may escape `]`, `=` and `[` with a backslash.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::WILDCARD_KEY;

/// Placeholder left in the template where a predicate was removed.
pub const TEMPLATE_PLACEHOLDER: &str = "{}";

/// Parsed path information. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    /// The path as supplied
    pub path: String,
    /// Path with each predicate replaced by `{}`
    pub template: String,
    /// Schema path: template with the placeholders removed
    pub yang_path: String,
    /// Predicate name to raw value. Repeated names are stored as `name#2`, `name#3`, ...
    pub vars: HashMap<String, String>,
    /// Variable names in the order their predicates appear
    names: Vec<String>,
}

impl PathInfo {
    /// Parse a path string. Malformed brackets are not an error: an
    /// unterminated predicate consumes the rest of the input.
    pub fn new(path: &str) -> Self {
        let mut vars: HashMap<String, String> = HashMap::new();
        let mut names = Vec::new();
        let mut template = String::with_capacity(path.len());
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            if c != '[' {
                template.push(c);
                continue;
            }

            let mut name = read_until(&mut chars, '=');
            let value = read_until(&mut chars, ']');

            if vars.contains_key(&name) {
                let prefix = name.clone();
                let mut k = 2;
                while vars.contains_key(&name) {
                    name = format!("{}#{}", prefix, k);
                    k += 1;
                }
            }

            if !name.is_empty() {
                template.push_str(TEMPLATE_PLACEHOLDER);
                names.push(name.clone());
                vars.insert(name, value);
            }
        }

        let yang_path = template.replace(TEMPLATE_PLACEHOLDER, "");

        Self {
            path: path.to_string(),
            template,
            yang_path,
            vars,
            names,
        }
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of a path variable, or empty string if absent
    pub fn var(&self, name: &str) -> &str {
        self.vars.get(name).map(|v| v.as_str()).unwrap_or("")
    }

    pub fn string_var<'a>(&'a self, name: &str, default_value: &'a str) -> &'a str {
        self.vars.get(name).map(|v| v.as_str()).unwrap_or(default_value)
    }

    /// True if any variable holds the wildcard value `*`
    pub fn has_wildcard(&self) -> bool {
        self.vars.values().any(|v| v == WILDCARD_KEY)
    }

    /// Variable names in the order their predicates appeared
    pub fn var_names(&self) -> &[String] {
        &self.names
    }

    /// Rebuild a path from the template, substituting the variables back
    /// with their delimiters escaped.
    pub fn rebuild(&self) -> String {
        let mut out = String::with_capacity(self.path.len());
        let mut names = self.names.iter();
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find(TEMPLATE_PLACEHOLDER) {
            out.push_str(&rest[..pos]);
            if let Some(name) = names.next() {
                let bare = name.split('#').next().unwrap_or(name);
                out.push('[');
                out.push_str(bare);
                out.push('=');
                out.push_str(&escape_predicate_value(self.var(name)));
                out.push(']');
            }
            rest = &rest[pos + TEMPLATE_PLACEHOLDER.len()..];
        }
        out.push_str(rest);
        out
    }
}

fn read_until(chars: &mut std::str::Chars<'_>, delim: char) -> String {
    let mut buff = String::new();
    let mut escaped = false;

    for c in chars.by_ref() {
        if c == delim && !escaped {
            break;
        } else if c == '\\' && !escaped {
            escaped = true;
        } else {
            escaped = false;
            buff.push(c);
        }
    }

    buff
}

fn escape_predicate_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ']' | '[' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a store key value so it can be placed inside a path predicate.
pub fn escape_key_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace(']', "\\]")
}

/// Split a path into its `/` separated segments. Characters inside `[...]`
/// and behind `\` never split.
pub fn split_path(path: &str) -> Vec<String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_escape = false;
    let mut in_key = false;

    for (i, c) in path.char_indices() {
        if in_escape {
            in_escape = false;
            continue;
        }
        match c {
            '\\' => in_escape = true,
            '[' => in_key = true,
            ']' => in_key = false,
            '/' if !in_key => {
                parts.push(path[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(path[start..].to_string());
    parts
}

/// Strip all predicates from a path, returning the schema path and the raw
/// segments (predicates included). Module prefixes are dropped from every
/// segment except the first.
pub fn remove_predicates(uri: &str) -> (String, Vec<String>) {
    let segments = split_path(uri);

    let bare: Vec<&str> = segments
        .iter()
        .map(|seg| match seg.find('[') {
            Some(idx) => &seg[..idx],
            None => seg.as_str(),
        })
        .collect();

    let mut xpath = bare.join("/");
    if !uri.starts_with("..") {
        xpath.insert(0, '/');
    }

    (strip_module_prefixes(&xpath), segments)
}

/// `/mod-a:x/mod-a:y/z` -> `/mod-a:x/y/z`
pub fn strip_module_prefixes(xpath: &str) -> String {
    let trimmed = xpath.strip_prefix('/').unwrap_or(xpath);
    let parts: Vec<&str> = trimmed
        .split('/')
        .enumerate()
        .map(|(i, part)| {
            if i > 0 {
                part.split_once(':').map(|(_, name)| name).unwrap_or(part)
            } else {
                part
            }
        })
        .collect();
    format!("/{}", parts.join("/"))
}

/// Predicates of a single path segment in order of appearance, values
/// unescaped.
pub fn segment_predicates(segment: &str) -> Vec<(String, String)> {
    static PREDICATE: OnceLock<Regex> = OnceLock::new();
    let re = PREDICATE.get_or_init(|| {
        Regex::new(r"\[([^=\]]+)=((?:\\.|[^\\\]])*)\]").expect("predicate pattern is valid")
    });

    re.captures_iter(segment)
        .map(|cap| (cap[1].to_string(), unescape(&cap[2])))
        .collect()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

/// Split a path into the prefix and its last element (leading `/` kept on
/// the last element).
pub fn split_last_elem(path: &str) -> (&str, &str) {
    let p = path.strip_suffix('/').unwrap_or(path);
    let mut last_slash = 0;
    let mut in_escape = false;
    let mut in_key = false;

    for (i, c) in p.char_indices() {
        if in_escape {
            in_escape = false;
            continue;
        }
        match c {
            '/' if !in_key => last_slash = i,
            '[' => in_key = true,
            ']' => in_key = false,
            '\\' => in_escape = true,
            _ => {}
        }
    }

    (&p[..last_slash], &p[last_slash..])
}

/// Parent of a request path, or empty when the path has fewer than three
/// segments.
pub fn parent_uri(uri: &str) -> String {
    if uri.is_empty() {
        return String::new();
    }
    let segments = split_path(uri);
    if segments.len() > 2 {
        format!("/{}", segments[..segments.len() - 1].join("/"))
    } else {
        String::new()
    }
}

/// Parent of a schema path
pub fn parent_xpath(xpath: &str) -> String {
    match xpath.rfind('/') {
        Some(idx) => xpath[..idx].to_string(),
        None => String::new(),
    }
}

/// True if any predicate value in the path string is exactly `*`, without
/// fully parsing the path.
pub fn str_has_wildcard_key(path: &str) -> bool {
    let bytes = path.as_bytes();
    let mut in_key = false;
    let mut in_value = false;
    let mut in_escape = false;

    for (i, &c) in bytes.iter().enumerate() {
        if in_escape {
            in_escape = false;
            continue;
        }
        match c {
            b'\\' => in_escape = true,
            b'[' if !in_value => in_key = true,
            b'=' if in_key => {
                if wildcard_at(bytes, i + 1) {
                    return true;
                }
                in_value = true;
                in_key = false;
            }
            b']' if in_value => in_value = false,
            _ => {}
        }
    }
    false
}

fn wildcard_at(bytes: &[u8], mut index: usize) -> bool {
    let mut remaining = bytes.len().saturating_sub(index);
    if remaining > 2 && bytes[index] == b'\\' {
        remaining -= 1;
        index += 1;
    }
    remaining > 1 && bytes[index] == b'*' && bytes[index + 1] == b']'
}
