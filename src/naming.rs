//! Identifier case conversion
//!
//! Splits contract and operation names into lowercase words, then joins them
//! for subcommand names (`get-http-status`) and environment variables
//! (`GET_HTTP_STATUS`).

/// Lowercase words of `s`.
///
/// Non-alphanumeric characters separate words. An uppercase letter starts a
/// new word after a lowercase letter or digit, and ends a run of capitals
/// when a lowercase letter follows it (`HTTPStatus` → `http`, `status`).
pub fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `GetHTTPStatus` → `get-http-status`
pub fn kebab_case(s: &str) -> String {
    words(s).join("-")
}

/// `UserService` → `USER_SERVICE`
pub fn screaming_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}
