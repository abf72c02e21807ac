//! Padding shared by every converter: stripped before decode, applied after encode.
//!
//! Widths are counted in characters, not bytes.

use flatbed_api::error::ConversionError;
use flatbed_api::option::Justify;

/// Remove pad characters from the side(s) `justify` names.
pub fn strip_padding(text: &str, justify: Justify, pad: char) -> &str {
    match justify {
        Justify::Left => text.trim_end_matches(pad),
        Justify::Right => text.trim_start_matches(pad),
        Justify::Both => text.trim_matches(pad),
    }
}

/// Pad `text` to exactly `length` characters.
///
/// `Right` pads on the left; `Left` and `Both` pad on the right.
pub fn pad(text: &str, length: usize, justify: Justify, pad: char) -> Result<String, ConversionError> {
    let count = text.chars().count();
    if count > length {
        return Err(ConversionError::Overflow {
            text: text.to_string(),
            length,
        });
    }

    let fill = length - count;
    let mut out = String::with_capacity(text.len() + fill * pad.len_utf8());
    match justify {
        Justify::Right => {
            out.extend(std::iter::repeat_n(pad, fill));
            out.push_str(text);
        }
        Justify::Left | Justify::Both => {
            out.push_str(text);
            out.extend(std::iter::repeat_n(pad, fill));
        }
    }
    Ok(out)
}

/// Split `line` into consecutive character slices of the given widths.
///
/// A line shorter than the total width yields truncated or empty trailing
/// slices.
pub fn split_columns<'a>(line: &'a str, widths: impl IntoIterator<Item = usize>) -> Vec<&'a str> {
    let mut slices = Vec::new();
    let mut rest = line;
    for width in widths {
        let end = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(idx, _)| idx);
        let (head, tail) = rest.split_at(end);
        slices.push(head);
        rest = tail;
    }
    slices
}
