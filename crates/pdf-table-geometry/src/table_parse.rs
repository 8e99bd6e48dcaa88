/// Collapses runs of spaces and tabs to one space, limits newline runs to
/// two and trims the result. Spaces next to a line break are kept.
pub(crate) fn normalize_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    let mut newline_run = 0_usize;

    for ch in text.chars() {
        match ch {
            ' ' | '\t' => {
                if !in_space {
                    out.push(' ');
                }
                in_space = true;
                newline_run = 0;
            }
            '\n' => {
                in_space = false;
                newline_run += 1;
                if newline_run <= 2 {
                    out.push('\n');
                }
            }
            _ => {
                in_space = false;
                newline_run = 0;
                out.push(ch);
            }
        }
    }

    out.trim().to_string()
}

/// CJK unified ideographs: the basic block, extension A and the
/// compatibility block.
#[must_use]
pub fn is_cjk(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
        || ('\u{3400}'..='\u{4DBF}').contains(&ch)
        || ('\u{F900}'..='\u{FAFF}').contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::{is_cjk, normalize_cell};

    #[test]
    fn collapses_inline_whitespace() {
        assert_eq!(normalize_cell("  Rated \t  input  "), "Rated input");
    }

    #[test]
    fn keeps_single_blank_line() {
        assert_eq!(normalize_cell("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_cell("a \n b"), "a \n b");
        assert_eq!(normalize_cell("a\n \n\nb"), "a\n \n\nb");
    }

    #[test]
    fn recognises_cjk_ideographs() {
        assert!(is_cjk('通'));
        assert!(!is_cjk('A'));
        assert!(!is_cjk('。'));
    }
}
