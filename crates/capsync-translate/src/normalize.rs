//! Text normalization applied before lookup and cache keying.

/// Trim, collapse internal whitespace and replace `'` with a backtick.
///
/// The translation service mangles straight apostrophes, so they are sent as
/// backticks.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\'', "`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  don't   stop \n now "), "don`t stop now");
        assert_eq!(normalize_text("plain"), "plain");
        assert_eq!(normalize_text(" \t "), "");
    }

    #[test]
    fn test_equivalent_inputs_share_normal_form() {
        assert_eq!(normalize_text("it's fine"), normalize_text("it's   fine "));
    }
}
