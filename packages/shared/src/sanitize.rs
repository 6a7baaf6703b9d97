//! Strict sanitization of user-supplied text.
//!
//! Every markup tag is removed, the contents of `<script>` and `<style>`
//! elements are dropped entirely, and surrounding whitespace is trimmed.
//! No markup survives: the output never contains a `<` directly followed by a
//! character that could open a tag, so sanitizing twice gives the same result
//! as sanitizing once.

/// Elements whose text content is discarded together with the tags.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Strip all markup from `input` and trim surrounding whitespace.
///
/// A `<` that cannot start a tag (`a < b`) is kept as text.
///
/// # Examples
///
/// ```
/// use hiroba_shared::sanitize::strict_sanitize;
///
/// assert_eq!(strict_sanitize("  <b>hello</b> world "), "hello world");
/// assert_eq!(strict_sanitize("<script>alert(1)</script>hi"), "hi");
/// assert_eq!(strict_sanitize("1 < 2"), "1 < 2");
/// ```
pub fn strict_sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut skipping: Option<&'static str> = None;

    while let Some(c) = chars.next() {
        if c != '<' {
            if skipping.is_none() {
                output.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some(&next) if opens_tag(next) => {
                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' && tag_is_complete(&tag) {
                        break;
                    }
                    tag.push(t);
                }

                let closing = tag.starts_with('/');
                let name = tag_name(&tag);

                match skipping {
                    Some(element) if closing && name == element => skipping = None,
                    Some(_) => {}
                    None if !closing && !tag.ends_with('/') => {
                        skipping = RAW_TEXT_ELEMENTS
                            .iter()
                            .copied()
                            .find(|element| *element == name);
                    }
                    None => {}
                }
            }
            // `<<b>` would otherwise leave a bare `<` in front of the text that
            // followed the stripped tag.
            Some('<') => {}
            _ => {
                if skipping.is_none() {
                    output.push(c);
                }
            }
        }
    }

    output.trim().to_string()
}

/// A comment (`<!-- ... -->`) only ends at `-->`, so a `>` inside it is not a terminator.
fn tag_is_complete(tag: &str) -> bool {
    match tag.strip_prefix("!--") {
        Some(body) => body.ends_with("--"),
        None => true,
    }
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_trims() {
        // テスト項目: タグが除去され前後の空白がトリムされる
        // given (前提条件):
        let input = "  <b>bold</b> and <i class=\"x\">italic</i>  ";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert_eq!(result, "bold and italic");
    }

    #[test]
    fn test_drops_script_and_style_contents() {
        // テスト項目: script / style 要素は中身ごと除去される
        // given (前提条件):
        let input = "a<script type=\"text/javascript\">alert('x')</script>b<STYLE>p{}</STYLE>c";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert_eq!(result, "abc");
    }

    #[test]
    fn test_keeps_plain_less_than() {
        // テスト項目: タグにならない `<` はそのまま残る
        // given (前提条件):
        let input = "1 < 2 > 0";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert_eq!(result, "1 < 2 > 0");
    }

    #[test]
    fn test_nested_angle_brackets_cannot_rebuild_a_tag() {
        // テスト項目: `<<b>script>` のような入力からタグが再構成されない
        // given (前提条件):
        let input = "<<b>script>alert(1)<</b>/script>";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert!(!result.contains("<script"));
        assert!(!result.contains("</script"));
        assert_eq!(strict_sanitize(&result), result);
    }

    #[test]
    fn test_removes_comments_and_unterminated_tags() {
        // テスト項目: コメントと閉じられていないタグは除去される
        // given (前提条件):
        let input = "hi<!-- secret -->there<img src=x onerror=alert(1)";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert_eq!(result, "hithere");
        // コメント内の `>` で終端しない
        assert_eq!(strict_sanitize("<!-- a > b -->"), "");
        assert_eq!(strict_sanitize("x<!-- <b>bold</b> -->y<!---->z"), "xyz");
        // 閉じられていないコメントは残りをすべて飲み込む
        assert_eq!(strict_sanitize("ok<!-- never closed > still hidden"), "ok");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        // テスト項目: サニタイズ済みの文字列を再度サニタイズしても変化しない
        // given (前提条件):
        let inputs = [
            "  <p> hello </p> ",
            "<b></b>   spaced",
            "a < b <c>",
            "<<<i>x",
            "plain text",
            "<script>never",
            "",
        ];

        for input in inputs {
            // when (操作):
            let once = strict_sanitize(input);
            let twice = strict_sanitize(&once);

            // then (期待する結果):
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_keeps_non_ascii_text() {
        // テスト項目: マルチバイト文字はそのまま保持される
        // given (前提条件):
        let input = "<em>こんにちは</em>、世界 🎉";

        // when (操作):
        let result = strict_sanitize(input);

        // then (期待する結果):
        assert_eq!(result, "こんにちは、世界 🎉");
    }
}
