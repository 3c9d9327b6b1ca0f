//! Text helpers for rendering replies

use url::form_urlencoded;

/// Title-case every word: the first letter after a non-letter is upper
/// case, every other letter lower case.
///
/// ```rust
/// use sauce_bot::utils::text::title_case;
///
/// assert_eq!(title_case("studio x"), "Studio X");
/// assert_eq!(title_case("KANTAI collection"), "Kantai Collection");
/// ```
pub fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                output.extend(c.to_lowercase());
            } else {
                output.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            output.push(c);
            previous_is_letter = false;
        }
    }

    output
}

/// Percent-encode each space-separated word and join them with
/// `delimiter`, for search and tag URLs
pub fn join_words(input: &str, delimiter: char) -> String {
    let words: Vec<String> = input
        .split(' ')
        .map(|word| form_urlencoded::byte_serialize(word.as_bytes()).collect())
        .collect();
    words.join(&delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("studio x", "Studio X")]
    #[case("touhou project", "Touhou Project")]
    #[case("o'neil", "O'Neil")]
    #[case("fate/grand order", "Fate/Grand Order")]
    #[case("re:zero", "Re:Zero")]
    #[case("", "")]
    #[case("2hu", "2Hu")]
    fn test_title_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(title_case(input), expected);
    }

    #[test]
    fn test_join_words() {
        assert_eq!(join_words("touhou project", '+'), "touhou+project");
        assert_eq!(join_words("touhou project", '_'), "touhou_project");
        assert_eq!(join_words("original", '_'), "original");
    }

    #[rstest]
    #[case("black & white", '+', "black+%26+white")]
    #[case("c# (band)", '_', "c%23_%28band%29")]
    #[case("ｆｕｌｌ", '+', "%EF%BD%86%EF%BD%95%EF%BD%8C%EF%BD%8C")]
    fn test_join_words_encodes_reserved_characters(
        #[case] input: &str,
        #[case] delimiter: char,
        #[case] expected: &str,
    ) {
        assert_eq!(join_words(input, delimiter), expected);
    }
}
