/// Semver-ish comparison: is `a < b`?  Compares dot-separated numeric
/// components left to right (missing or non-numeric components count as 0).
pub(crate) fn version_lt(a: &str, b: &str) -> bool {
    let mut ai = a.split('.');
    let mut bi = b.split('.');
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return false,
            (None, Some(bv)) => return rest_is_positive(bv, &mut bi),
            (Some(_), None) => return false,
            (Some(av), Some(bv)) => {
                let (an, bn) = (component(av), component(bv));
                if an != bn {
                    return an < bn;
                }
            }
        }
    }
}

/// Is `a >= b`?
pub(crate) fn version_ge(a: &str, b: &str) -> bool {
    !version_lt(a, b)
}

fn component(s: &str) -> u32 {
    let digits: &str = s
        .trim()
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    digits.parse().unwrap_or(0)
}

// `b` has more components than `a`: `a < b` only if one of them is non-zero.
fn rest_is_positive<'a>(first: &str, rest: &mut impl Iterator<Item = &'a str>) -> bool {
    component(first) > 0 || rest.any(|c| component(c) > 0)
}

/// Expand `$1`, `$2`, ... in a version template from regex captures.
///
/// Groups that did not participate expand to nothing; the result is then
/// trimmed of trailing dots, so `"$1.$2"` with only `$1` matched yields `"15"`.
pub(crate) fn expand_version(template: &str, captures: &fancy_regex::Captures) -> String {
    let mut out = String::with_capacity(template.len() + 4);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().and_then(|d| d.to_digit(10))) {
            ('$', Some(idx)) => {
                chars.next();
                if let Some(m) = captures.get(idx as usize) {
                    out.push_str(m.as_str());
                }
            }
            _ => out.push(c),
        }
    }
    let keep = out.trim_end_matches(|c: char| c == '.' || c.is_whitespace()).len();
    out.truncate(keep);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(version_lt("16.3", "16.4"));
        assert!(version_ge("16.4", "16.4"));
        assert!(version_ge("17", "16.4"));
        assert!(version_lt("16", "16.4"));
        assert!(version_ge("16", "16.0"));
        assert!(version_lt("4.1", "4.2"));
        assert!(version_ge("119.0", "85"));
    }

    #[test]
    fn template_expansion() {
        let re = fancy_regex::Regex::new(r"OS (\d+)_(\d+)(?:_(\d+))?").unwrap();
        let caps = re.captures("CPU iPhone OS 17_1 like Mac OS X").unwrap().unwrap();
        assert_eq!(expand_version("$1.$2", &caps), "17.1");
        assert_eq!(expand_version("$1.$2.$3", &caps), "17.1");

        let re = fancy_regex::Regex::new(r"Brave(?:/(\d+)\.(\d+))?").unwrap();
        let caps = re.captures("Brave").unwrap().unwrap();
        assert_eq!(expand_version("$1.$2", &caps), "");
    }
}
