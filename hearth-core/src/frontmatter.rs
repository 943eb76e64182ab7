use std::collections::HashMap;

/// Splits a leading front-matter block off a markdown source.
///
/// The block is delimited by `---` lines and holds `Key: value` pairs.
/// Returns the parsed fields together with the remaining body. A source
/// without a front-matter block (or with an unterminated one) comes back
/// with an empty field map and the full source as body.
pub fn split(source: &str) -> (HashMap<String, String>, &str) {
    let mut fields = HashMap::new();

    let Some(rest) = strip_delimiter(source) else {
        return (fields, source);
    };

    let mut consumed = 0;
    for line in rest.split_inclusive('\n') {
        consumed += line.len();
        let line = line.trim_end();
        if line == "---" {
            return (fields, &rest[consumed..]);
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() && !key.starts_with('#') {
                fields.insert(key.to_string(), unquote(value.trim()).to_string());
            }
        }
    }

    // No closing delimiter: treat the whole source as body.
    (HashMap::new(), source)
}

fn strip_delimiter(source: &str) -> Option<&str> {
    let rest = source.strip_prefix("---")?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    rest.strip_prefix('\n')
}

fn unquote(value: &str) -> &str {
    let quoted = (value.starts_with('"') && value.ends_with('"'))
        || (value.starts_with('\'') && value.ends_with('\''));
    if quoted && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
