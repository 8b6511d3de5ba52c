//! Fortran namelist reader for `gkvp_namelist.001`
//!
//! GKV writes its input parameters as classic Fortran namelists:
//!
//! ```text
//! &physp  nx = 287, global_ny = 11,
//!         R0_Ln = 2.5d0, 2.5d0,
//! &end
//! ```
//!
//! Groups keep their file order so the report text section can reproduce the
//! namelist faithfully. Lookups are case-insensitive; a missing group or key
//! is not an error (callers fall back to defaults), only a structurally
//! broken file is.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::Path;

/// A single namelist value.
#[derive(Debug, Clone, PartialEq)]
pub enum NamelistValue {
    Int(i64),
    Real(f64),
    Logical(bool),
    Str(String),
}

impl NamelistValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NamelistValue::Int(v) => Some(*v as f64),
            NamelistValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NamelistValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NamelistValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NamelistValue::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for NamelistValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamelistValue::Int(v) => write!(f, "{}", v),
            NamelistValue::Real(v) => write!(f, "{}", v),
            NamelistValue::Logical(true) => write!(f, ".true."),
            NamelistValue::Logical(false) => write!(f, ".false."),
            NamelistValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// One `&name ... &end` group, entries in file order.
#[derive(Debug, Clone)]
pub struct NamelistGroup {
    pub name: String,
    pub entries: Vec<(String, Vec<NamelistValue>)>,
}

impl NamelistGroup {
    pub fn values(&self, key: &str) -> Option<&[NamelistValue]> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_slice())
    }
}

/// The parsed namelist, immutable after load.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub groups: Vec<NamelistGroup>,
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read namelist {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse namelist {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut groups: Vec<NamelistGroup> = Vec::new();
        let mut current: Option<NamelistGroup> = None;

        for raw in text.lines() {
            let line = strip_comment(raw);
            let mut rest = line.trim();
            if rest.is_empty() {
                continue;
            }

            while !rest.is_empty() {
                if let Some(after) = rest.strip_prefix('&') {
                    let name: String = after
                        .chars()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .collect();
                    let tail = after[name.len()..].trim();
                    if name.eq_ignore_ascii_case("end") {
                        let group = current
                            .take()
                            .context("'&end' without a matching group start")?;
                        groups.push(group);
                    } else {
                        if current.is_some() {
                            bail!("group '&{}' starts before the previous group ends", name);
                        }
                        if name.is_empty() {
                            bail!("'&' without a group name");
                        }
                        current = Some(NamelistGroup {
                            name,
                            entries: Vec::new(),
                        });
                    }
                    rest = tail;
                    continue;
                }
                if let Some(tail) = rest.strip_prefix('/') {
                    let group = current.take().context("'/' without a matching group start")?;
                    groups.push(group);
                    rest = tail.trim();
                    continue;
                }

                // Entry data runs up to the next group marker on the line.
                let stop = next_marker(rest);
                let (data, tail) = rest.split_at(stop);
                let group = match current.as_mut() {
                    Some(g) => g,
                    None => bail!("data outside of any namelist group: '{}'", data.trim()),
                };
                parse_entries(group, data)?;
                rest = tail;
            }
        }

        if let Some(group) = current {
            bail!("namelist group '&{}' is not terminated", group.name);
        }
        Ok(SimulationConfig { groups })
    }

    pub fn group(&self, name: &str) -> Option<&NamelistGroup> {
        self.groups.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    pub fn values(&self, group: &str, key: &str) -> Option<&[NamelistValue]> {
        self.group(group)?.values(key)
    }

    pub fn first(&self, group: &str, key: &str) -> Option<&NamelistValue> {
        self.values(group, key)?.first()
    }

    pub fn f64(&self, group: &str, key: &str) -> Option<f64> {
        self.first(group, key)?.as_f64()
    }

    pub fn str(&self, group: &str, key: &str) -> Option<&str> {
        self.first(group, key)?.as_str()
    }
}

/// Cut the line at the first '!' that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '!' => return &line[..i],
            None => {}
        }
    }
    line
}

/// Byte offset of the next unquoted '&' or '/' marker, or the line length.
fn next_marker(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '&' || c == '/' => return i,
            None => {}
        }
    }
    s.len()
}

fn parse_entries(group: &mut NamelistGroup, data: &str) -> Result<()> {
    for segment in split_commas(data) {
        let seg = segment.trim();
        if seg.is_empty() {
            continue;
        }
        match split_assignment(seg) {
            Some((key, value)) => {
                let mut values = Vec::new();
                if !value.trim().is_empty() {
                    values.push(parse_value(value.trim()));
                }
                group.entries.push((key.trim().to_string(), values));
            }
            None => {
                // Continuation value of an array entry.
                let (key, values) = group
                    .entries
                    .last_mut()
                    .with_context(|| format!("value '{}' before any 'key =' entry", seg))?;
                let _ = key;
                values.push(parse_value(seg));
            }
        }
    }
    Ok(())
}

/// Split on '=' only when it separates a bare key from a value.
fn split_assignment(seg: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (i, c) in seg.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '=' => return Some((&seg[..i], &seg[i + 1..])),
            None => {}
        }
    }
    None
}

fn split_commas(data: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in data.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                parts.push(&data[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    parts.push(&data[start..]);
    parts
}

fn parse_value(s: &str) -> NamelistValue {
    if (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
        || (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
    {
        return NamelistValue::Str(s[1..s.len() - 1].to_string());
    }
    let lower = s.to_ascii_lowercase();
    if lower == ".true." || lower == ".t." {
        return NamelistValue::Logical(true);
    }
    if lower == ".false." || lower == ".f." {
        return NamelistValue::Logical(false);
    }
    if let Ok(v) = s.parse::<i64>() {
        return NamelistValue::Int(v);
    }
    // Fortran double-precision exponents: 1.0d-2 -> 1.0e-2
    let normalized = lower.replace('d', "e");
    if let Ok(v) = normalized.parse::<f64>() {
        return NamelistValue::Real(v);
    }
    NamelistValue::Str(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
&cmemo memo = "GKV-plus f0.62", &end
&calct calc_type = "nonlinear",
       lin_freq = .false.,
&end
&physp nx = 287, global_ny = 11,
       R0_Ln = 2.5d0, 2.5d0,   ! density gradients
       tau   = 1.0, 1.0,
&end
"#;

    #[test]
    fn parses_groups_in_order() {
        let config = SimulationConfig::parse(SAMPLE).unwrap();
        let names: Vec<&str> = config.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["cmemo", "calct", "physp"]);
    }

    #[test]
    fn parses_typed_values() {
        let config = SimulationConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.str("cmemo", "memo"), Some("GKV-plus f0.62"));
        assert_eq!(config.str("calct", "calc_type"), Some("nonlinear"));
        assert_eq!(
            config.first("calct", "lin_freq").unwrap().as_bool(),
            Some(false)
        );
        assert_eq!(config.f64("physp", "nx"), Some(287.0));
        assert_eq!(config.f64("physp", "global_ny"), Some(11.0));
    }

    #[test]
    fn array_continuation_values_attach_to_the_key() {
        let config = SimulationConfig::parse(SAMPLE).unwrap();
        let r0_ln = config.values("physp", "R0_Ln").unwrap();
        assert_eq!(r0_ln.len(), 2);
        assert_eq!(r0_ln[0].as_f64(), Some(2.5));
        assert_eq!(r0_ln[1].as_f64(), Some(2.5));
    }

    #[test]
    fn comments_are_stripped() {
        let config = SimulationConfig::parse("&g a = 1, ! b = 2,\n&end\n").unwrap();
        assert!(config.values("g", "a").is_some());
        assert!(config.values("g", "b").is_none());
    }

    #[test]
    fn missing_key_is_not_an_error() {
        let config = SimulationConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.f64("physp", "no_such_key"), None);
        assert!(config.group("no_such_group").is_none());
    }

    #[test]
    fn unterminated_group_is_an_error() {
        assert!(SimulationConfig::parse("&physp nx = 1,\n").is_err());
    }

    #[test]
    fn slash_terminates_a_group() {
        let config = SimulationConfig::parse("&g a = 1 /\n").unwrap();
        assert_eq!(config.f64("g", "a"), Some(1.0));
    }
}
