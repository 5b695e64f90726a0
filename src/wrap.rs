//! Line-wrapped text emission.
//!
//! Ninja reads logical lines; long ones must be split with a ` $`
//! continuation marker. This module renders a logical line into that
//! convention: top-level lines continue with a two-space lead, indented
//! lines are re-indented to four spaces and continue with a six-space lead.
//! Lines at or under the width threshold pass through untouched.

/// Maximum rendered line width before wrapping kicks in.
const WIDTH: usize = 132;

/// Render a logical line into Ninja's continuation-line convention.
///
/// Wrapping rebuilds the line word by word, so interior whitespace runs
/// collapse to single spaces on wrapped lines. Joining the continuation
/// lines back together and stripping the markers reproduces the original
/// word sequence.
#[must_use]
pub fn wrap(line: &str) -> String {
    if line.len() <= WIDTH {
        return line.to_owned();
    }
    let indented = line.chars().next().is_some_and(char::is_whitespace);
    let (mut result, lead, first_indent) = if indented {
        (String::from("    "), "      ", 4usize)
    } else {
        (String::new(), "  ", 0usize)
    };
    // Tracked as a signed quantity: a long word can overdraw the remaining
    // width and the following words must still compare against the deficit.
    let mut available = to_isize(WIDTH - (first_indent + lead.len()));
    let words: Vec<&str> = line.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    for (idx, word) in words.iter().enumerate() {
        let len = to_isize(word.len());
        if len <= available && idx == last {
            result.push_str(word);
        } else if len <= available + 2 {
            result.push_str(word);
            result.push(' ');
            available -= len;
        } else {
            result.push_str("$\n");
            result.push_str(lead);
            result.push_str(word);
            result.push(' ');
            available = to_isize(WIDTH) - (to_isize(lead.len()) + len);
        }
    }
    result
}

fn to_isize(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}
