use crate::analysis::normalize::word_count;

/// Greedy sentence packing into chunks of at most `max_words` words. Sentences that
/// are too long on their own are split on commas, then into plain word windows.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let trimmed = text.trim();
    if word_count(trimmed) <= max_words {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::<String>::new();
    let mut current = Vec::<String>::new();

    for sentence in split_sentences(trimmed) {
        let words = sentence
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>();
        if current.len() + words.len() <= max_words {
            current.extend(words);
            continue;
        }

        flush_words(&mut chunks, &mut current);
        if words.len() <= max_words {
            current = words;
            continue;
        }

        let mut pieces = split_long_sentence(sentence, max_words);
        let last = pieces.pop();
        chunks.extend(pieces);
        if let Some(last) = last {
            current = last.split_whitespace().map(str::to_string).collect();
        }
    }
    flush_words(&mut chunks, &mut current);

    chunks
}

fn flush_words(chunks: &mut Vec<String>, current: &mut Vec<String>) {
    if !current.is_empty() {
        chunks.push(current.join(" "));
        current.clear();
    }
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((position, character)) = chars.next() {
        if !matches!(character, '.' | '!' | '?') {
            continue;
        }
        let boundary = chars
            .peek()
            .is_some_and(|(_, next)| next.is_whitespace());
        if boundary {
            let end = position + character.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn split_long_sentence(sentence: &str, max_words: usize) -> Vec<String> {
    let parts = sentence.split(',').collect::<Vec<&str>>();
    let last_index = parts.len().saturating_sub(1);
    let mut pieces = Vec::<String>::new();
    let mut current = Vec::<String>::new();

    for (index, part) in parts.iter().enumerate() {
        let mut words = part
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>();
        if index < last_index {
            if let Some(word) = words.last_mut() {
                word.push(',');
            }
        }
        if words.is_empty() {
            continue;
        }

        if current.len() + words.len() <= max_words {
            current.extend(words);
            continue;
        }

        if !current.is_empty() {
            pieces.push(current.join(" "));
            current.clear();
        }
        if words.len() <= max_words {
            current = words;
            continue;
        }

        let mut windows = words
            .chunks(max_words)
            .map(|window| window.join(" "))
            .collect::<Vec<String>>();
        let tail = windows.pop();
        pieces.extend(windows);
        if let Some(tail) = tail {
            current = tail.split_whitespace().map(str::to_string).collect();
        }
    }

    if !current.is_empty() {
        pieces.push(current.join(" "));
    }
    pieces
}
