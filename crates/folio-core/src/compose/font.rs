//! Standard 14 Helvetica metrics and WinAnsi text encoding.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em for the printable
//! ASCII range. Latin-1 accented letters measure as their base letter,
//! which is exact for Helvetica.

use super::render::FontFace;

const PT_TO_MM: f64 = 25.4 / 72.0;

/// Advance widths for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

/// PostScript name of the face, as written into the font dictionary.
pub fn base_font(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "Helvetica",
        FontFace::Bold => "Helvetica-Bold",
    }
}

fn glyph_width(face: FontFace, c: char) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    let c = base_letter(c);
    match c as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

fn base_letter(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{a0}' => ' ',
        other => other,
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, face: FontFace, size_pt: f64) -> f64 {
    let units: u32 = text.chars().map(|c| glyph_width(face, c) as u32).sum();
    units as f64 / 1000.0 * size_pt * PT_TO_MM
}

/// Greedy word wrap so no line is wider than `max_width_mm`.
///
/// Explicit newlines are kept. A single word wider than the limit is split
/// between characters.
pub fn wrap_text(text: &str, face: FontFace, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, face, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // Break words that cannot fit even on their own line.
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Encode text for a WinAnsiEncoding simple font. Unmappable characters
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        // "Hello" in Helvetica: 722 + 556 + 222 + 222 + 556 = 2278 units
        let w = text_width_mm("Hello", FontFace::Regular, 10.0);
        assert!((w - 2.278 * 10.0 * PT_TO_MM).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = text_width_mm("Documento PDF", FontFace::Regular, 20.0);
        let bold = text_width_mm("Documento PDF", FontFace::Bold, 20.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_accented_letters_use_base_width() {
        assert_eq!(
            text_width_mm("Página", FontFace::Regular, 10.0),
            text_width_mm("Pagina", FontFace::Regular, 10.0)
        );
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        assert_eq!(wrap_text("Documento PDF", FontFace::Bold, 20.0, 170.0), vec!["Documento PDF"]);
    }

    #[test]
    fn test_wrap_long_text() {
        let title = "Relatório fotográfico da vistoria técnica realizada no edifício principal";
        let lines = wrap_text(title, FontFace::Bold, 20.0, 170.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, FontFace::Bold, 20.0) <= 170.0);
        }
        assert_eq!(lines.join(" "), title);
    }

    #[test]
    fn test_wrap_breaks_overlong_word() {
        let word = "W".repeat(40);
        let lines = wrap_text(&word, FontFace::Bold, 20.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width_mm(line, FontFace::Bold, 20.0) <= 50.0);
        }
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        assert_eq!(wrap_text("a\nb", FontFace::Regular, 10.0, 100.0), vec!["a", "b"]);
        assert_eq!(wrap_text("", FontFace::Regular, 10.0, 100.0), vec![""]);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Página 1"), b"P\xe1gina 1".to_vec());
        assert_eq!(encode_win_ansi("a—b"), vec![b'a', 0x97, b'b']);
        assert_eq!(encode_win_ansi("日"), b"?".to_vec());
    }
}
