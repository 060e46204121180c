//! Parameter tokenizer for script lines.
//!
//! Splits the argument part of a command line on spaces. A double quote opens a
//! span in which spaces do not split; the next quote ends the token. Quote
//! characters never appear in the output.

const SPACE: char = ' ';
const QUOTE: char = '"';

/// Split a raw argument string into positional parameters.
///
/// An unmatched opening quote swallows the rest of the line into one token.
/// `""` produces an empty parameter.
pub fn split_parameters(raw: &str) -> Vec<String> {
    // Synthetic trailing stopper flushes the last token
    let padded = format!("{}{}", raw.trim(), SPACE);
    let mut rest = padded.as_str();
    let mut parameters = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let mut stopper = SPACE;
        let mut token = String::new();
        let mut consumed = None;

        for (i, ch) in rest.char_indices() {
            if ch == stopper {
                consumed = Some(i + ch.len_utf8());
                break;
            }
            if ch == QUOTE {
                stopper = QUOTE;
                continue;
            }
            token.push(ch);
        }

        match consumed {
            Some(end) => {
                parameters.push(token);
                rest = &rest[end..];
            }
            None => {
                // Quote never closed: drop the synthetic stopper and stop
                if token.ends_with(SPACE) {
                    token.pop();
                }
                parameters.push(token);
                break;
            }
        }
    }

    parameters
}
