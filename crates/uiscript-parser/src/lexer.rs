use uiscript_common::error::LexError;

/// A whitespace-delimited unit of one input line, after quoted spans
/// have been merged back together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Word(String),
    /// Content of a double-quoted literal, quotes removed.
    Quoted(String),
    Integer(i64),
    /// Everything from a `#` fragment to the end of the line.
    Comment(String),
}

/// Split `line` into fragments.
///
/// A fragment with an odd number of `"` opens a literal that runs until
/// the quote count across the following fragments is even again; the
/// pieces are rejoined with single spaces. A fragment beginning with `'`
/// outside a literal is rejected.
pub fn lex(line: &str) -> Result<Vec<Fragment>, LexError> {
    let mut fragments = Vec::new();
    let mut open: Option<(Vec<&str>, usize)> = None;
    let mut words = line.split_whitespace();

    while let Some(word) = words.next() {
        if let Some((parts, quotes)) = open.as_mut() {
            parts.push(word);
            *quotes += quote_count(word);
            if *quotes % 2 == 0 {
                fragments.push(literal(&parts.join(" ")));
                open = None;
            }
            continue;
        }

        if word.starts_with('#') {
            let rest: Vec<&str> = std::iter::once(word).chain(words.by_ref()).collect();
            fragments.push(Fragment::Comment(rest.join(" ")));
            break;
        }

        if word.starts_with('\'') {
            return Err(LexError::IllegalCharacter {
                fragment: word.to_string(),
            });
        }

        let quotes = quote_count(word);
        if quotes % 2 == 1 {
            open = Some((vec![word], quotes));
        } else {
            fragments.push(literal(word));
        }
    }

    match open {
        Some((parts, _)) => Err(LexError::UnterminatedLiteral {
            literal: parts.join(" "),
        }),
        None => Ok(fragments),
    }
}

fn quote_count(word: &str) -> usize {
    word.matches('"').count()
}

fn literal(text: &str) -> Fragment {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Fragment::Quoted(text[1..text.len() - 1].to_string());
    }
    match text.parse::<i64>() {
        Ok(n) => Fragment::Integer(n),
        Err(_) => Fragment::Word(text.to_string()),
    }
}
