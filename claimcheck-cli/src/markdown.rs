//! Terminal markdown rendering and plain-text extraction.
//!
//! The analysis body arrives as markdown. For display it is converted
//! line-by-line to ANSI escape codes (bold, italic, inline code, headings,
//! bullets, fenced blocks); for clipboard copies the markup is stripped
//! entirely.

/// ANSI escape codes for terminal formatting.
pub(crate) mod ansi {
    pub const BOLD_ON: &str = "\x1b[1m";
    pub const BOLD_OFF: &str = "\x1b[22m";
    pub const ITALIC_ON: &str = "\x1b[3m";
    pub const ITALIC_OFF: &str = "\x1b[23m";
    pub const DIM_ON: &str = "\x1b[2m";
    pub const DIM_OFF: &str = "\x1b[22m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RESET: &str = "\x1b[0m";
    pub const UNDERLINE_ON: &str = "\x1b[4m";
}

/// Render a complete markdown text with ANSI formatting.
pub fn render_markdown(text: &str) -> String {
    let mut in_code_block = false;
    let mut output = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        output.push_str(&render_line(line, &mut in_code_block));
        output.push('\n');
    }
    output
}

/// Render a single line, tracking fenced code block state across calls.
fn render_line(line: &str, in_code_block: &mut bool) -> String {
    let trimmed = line.trim_start();

    if trimmed.starts_with("```") {
        *in_code_block = !*in_code_block;
        return format!("{}{}{}", ansi::DIM_ON, line, ansi::DIM_OFF);
    }
    if *in_code_block {
        return format!("{}{}{}", ansi::DIM_ON, line, ansi::DIM_OFF);
    }

    if let Some(heading) = parse_heading(trimmed) {
        return format!(
            "{}{}{}{}",
            ansi::BOLD_ON,
            ansi::UNDERLINE_ON,
            heading,
            ansi::RESET
        );
    }

    if let Some(rest) = trimmed.strip_prefix("> ") {
        return format!("{}│ {}{}", ansi::DIM_ON, render_inline(rest), ansi::RESET);
    }

    if let Some(rest) = bullet_text(trimmed) {
        let indent = &line[..line.len() - trimmed.len()];
        return format!("{indent}  \u{2022} {}", render_inline(rest));
    }

    if trimmed == "---" || trimmed == "***" || trimmed == "___" {
        return format!("{}{}{}", ansi::DIM_ON, "\u{2500}".repeat(40), ansi::DIM_OFF);
    }

    render_inline(line)
}

/// Strip all markup, leaving plain text suitable for the clipboard.
///
/// Fence lines vanish, code content stays verbatim, headings and
/// blockquotes lose their prefixes, links keep only their text.
pub fn to_plain_text(markdown: &str) -> String {
    let mut in_code_block = false;
    let mut lines: Vec<String> = Vec::new();

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            lines.push(line.to_string());
            continue;
        }

        if let Some(heading) = parse_heading(trimmed) {
            lines.push(strip_inline(heading));
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("> ") {
            lines.push(strip_inline(rest));
            continue;
        }
        if let Some(rest) = bullet_text(trimmed) {
            lines.push(format!("- {}", strip_inline(rest)));
            continue;
        }
        if trimmed == "---" || trimmed == "***" || trimmed == "___" {
            continue;
        }

        lines.push(strip_inline(line));
    }

    lines.join("\n").trim().to_string()
}

/// Parse an ATX heading (# through ###), returning the heading text.
fn parse_heading(line: &str) -> Option<&str> {
    line.strip_prefix("### ")
        .or_else(|| line.strip_prefix("## "))
        .or_else(|| line.strip_prefix("# "))
}

/// Unordered list item text, if the line is one.
fn bullet_text(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with("**") {
        return None;
    }
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
}

/// Apply inline formatting: **bold**, *italic*, `code`, [text](url).
fn render_inline(text: &str) -> String {
    transform_inline(text, true)
}

/// Remove inline formatting, keeping only the readable text.
fn strip_inline(text: &str) -> String {
    transform_inline(text, false)
}

/// Shared scanner for inline spans. With `emit_ansi` the spans are wrapped
/// in escape codes; without it the delimiters are simply dropped.
fn transform_inline(text: &str, emit_ansi: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut output = String::with_capacity(len + 32);
    let mut i = 0;

    while i < len {
        // Links: [text](url) keeps only the link text.
        if chars[i] == '[' {
            if let Some((text_end, url_end)) = parse_link(&chars, i) {
                let inner: String = chars[i + 1..text_end].iter().collect();
                output.push_str(&transform_inline(&inner, emit_ansi));
                i = url_end + 1;
                continue;
            }
        }

        // Bold: **...**
        if i + 1 < len && chars[i] == '*' && chars[i + 1] == '*' {
            if let Some(end) = find_delimiter(&chars, i + 2, "**") {
                let inner: String = chars[i + 2..end].iter().collect();
                if emit_ansi {
                    output.push_str(ansi::BOLD_ON);
                    output.push_str(&transform_inline(&inner, emit_ansi));
                    output.push_str(ansi::BOLD_OFF);
                } else {
                    output.push_str(&transform_inline(&inner, emit_ansi));
                }
                i = end + 2;
                continue;
            }
        }

        // Italic: *...* (but not ** and not "* ")
        if chars[i] == '*' && i + 1 < len && chars[i + 1] != '*' && chars[i + 1] != ' ' {
            if let Some(end) = find_delimiter(&chars, i + 1, "*") {
                let inner: String = chars[i + 1..end].iter().collect();
                if emit_ansi {
                    output.push_str(ansi::ITALIC_ON);
                    output.push_str(&inner);
                    output.push_str(ansi::ITALIC_OFF);
                } else {
                    output.push_str(&inner);
                }
                i = end + 1;
                continue;
            }
        }

        // Inline code: `...`
        if chars[i] == '`' {
            if let Some(end) = find_delimiter(&chars, i + 1, "`") {
                let inner: String = chars[i + 1..end].iter().collect();
                if emit_ansi {
                    output.push_str(ansi::CYAN);
                    output.push_str(&inner);
                    output.push_str(ansi::RESET);
                } else {
                    output.push_str(&inner);
                }
                i = end + 1;
                continue;
            }
        }

        output.push(chars[i]);
        i += 1;
    }

    output
}

/// Find the next occurrence of `delim` starting at `start`.
///
/// Returns the index of its first character, or None.
fn find_delimiter(chars: &[char], start: usize, delim: &str) -> Option<usize> {
    let delim: Vec<char> = delim.chars().collect();
    let len = chars.len();
    let mut i = start;
    while i + delim.len() <= len {
        if chars[i..i + delim.len()] == delim[..] {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Locate the pieces of a `[text](url)` link starting at `start`.
///
/// Returns (index of `]`, index of `)`), or None if the shape is incomplete
/// or spans a line break.
fn parse_link(chars: &[char], start: usize) -> Option<(usize, usize)> {
    let len = chars.len();
    let mut i = start + 1;
    while i < len && chars[i] != ']' {
        i += 1;
    }
    if i >= len || i + 1 >= len || chars[i + 1] != '(' {
        return None;
    }
    let text_end = i;
    let mut j = i + 2;
    while j < len && chars[j] != ')' {
        j += 1;
    }
    if j >= len {
        return None;
    }
    Some((text_end, j))
}
