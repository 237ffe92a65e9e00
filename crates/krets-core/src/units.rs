//! Engineering value parsing for the netlist language.
//!
//! Component magnitudes carry an optional SI prefix and an optional unit
//! word (`1k`, `1kOhm`, `30uF`, `2.5v`). Unit words are matched
//! case-insensitively; prefixes are case-sensitive where the case decides
//! the meaning (`m` = milli, `M` = mega).

/// Strip a trailing unit word (case-insensitive).
///
/// `unit` must be given in lower case. If `s` does not end with it, `s`
/// is returned unchanged.
pub fn strip_unit<'a>(s: &'a str, unit: &str) -> &'a str {
    if s.len() >= unit.len() {
        let (head, tail) = s.split_at(s.len() - unit.len());
        if tail.eq_ignore_ascii_case(unit) {
            return head;
        }
    }
    s
}

/// Parse a magnitude with an optional SI prefix.
///
/// Accepted prefixes: `T`, `G`, `M` (mega), `k`/`K`, `m` (milli), `u`,
/// `n`, `p`. Plain floats (including exponent notation) parse directly.
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }

    let (num, last) = s.split_at(s.len() - last_char_len(s));
    let multiplier = match last {
        "T" => 1e12,
        "G" => 1e9,
        "M" => 1e6,
        "k" | "K" => 1e3,
        "m" => 1e-3,
        "u" => 1e-6,
        "n" => 1e-9,
        "p" => 1e-12,
        _ => return None,
    };

    num.parse::<f64>().ok().map(|v| v * multiplier)
}

fn last_char_len(s: &str) -> usize {
    s.chars().next_back().map_or(0, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|v| (v - b).abs() <= b.abs() * 1e-12)
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(parse_value("1.5"), Some(1.5));
        assert_eq!(parse_value("-2.5"), Some(-2.5));
        assert_eq!(parse_value("1e-3"), Some(1e-3));
    }

    #[test]
    fn si_prefixes() {
        assert!(approx(parse_value("1k"), 1e3));
        assert!(approx(parse_value("4.7K"), 4.7e3));
        assert!(approx(parse_value("30u"), 30e-6));
        assert!(approx(parse_value("100n"), 100e-9));
        assert!(approx(parse_value("10p"), 10e-12));
    }

    #[test]
    fn milli_and_mega_differ_by_case() {
        assert!(approx(parse_value("1m"), 1e-3));
        assert!(approx(parse_value("1M"), 1e6));
    }

    #[test]
    fn unit_words_are_case_insensitive() {
        assert_eq!(strip_unit("1kOhm", "ohm"), "1k");
        assert_eq!(strip_unit("1kOHM", "ohm"), "1k");
        assert_eq!(strip_unit("30uF", "f"), "30u");
        assert_eq!(strip_unit("2.5v", "v"), "2.5");
        assert_eq!(strip_unit("2.5V", "v"), "2.5");
        assert_eq!(strip_unit("50uH", "h"), "50u");
        assert_eq!(strip_unit("1k", "ohm"), "1k");
    }

    #[test]
    fn combined_quantity() {
        assert!(approx(parse_value(strip_unit("1kOhm", "ohm")), 1e3));
        assert!(approx(parse_value(strip_unit("30uF", "f")), 30e-6));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("1x"), None);
        assert_eq!(parse_value("k"), None);
    }
}
