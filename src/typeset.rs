//! Minimal TeX-to-text typesetting for overlay labels.
//!
//! The calculation service answers with plain TeX fragments (`x^{2}`,
//! `\frac{1}{2}`, `\times`, ...). Overlays are rendered with egui's text
//! layout, so the fragment is rewritten into Unicode text and a display
//! scale picked from the size command wrapping it.

use once_cell::sync::Lazy;
use regex::Regex;

pub const BASE_FONT_SIZE: f32 = 16.0;

static FRAC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[dt]?frac\{([^{}]*)\}\{([^{}]*)\}").unwrap());
static SQRT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\sqrt\{([^{}]*)\}").unwrap());
static SUP_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^\{([^{}]*)\}").unwrap());
static SUP_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^([0-9A-Za-z+\-])").unwrap());
static SUB_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\{([^{}]*)\}").unwrap());
static SUB_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([0-9A-Za-z+\-])").unwrap());
static TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:text|mathrm|mathbf|operatorname)\{([^{}]*)\}").unwrap());
static SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\(tiny|small|normalsize|large|Large|LARGE|huge|Huge)\{(.*)\}$").unwrap()
});

static COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([A-Za-z]+)").unwrap());

/// Letter commands, matched on the whole command name.
const SYMBOLS: &[(&str, &str)] = &[
    ("times", "×"),
    ("div", "÷"),
    ("cdot", "·"),
    ("cdots", "⋯"),
    ("ldots", "…"),
    ("pm", "±"),
    ("mp", "∓"),
    ("leq", "≤"),
    ("le", "≤"),
    ("geq", "≥"),
    ("ge", "≥"),
    ("neq", "≠"),
    ("ne", "≠"),
    ("approx", "≈"),
    ("infty", "∞"),
    ("pi", "π"),
    ("theta", "θ"),
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("sigma", "σ"),
    ("phi", "φ"),
    ("omega", "ω"),
    ("degree", "°"),
    ("circ", "°"),
    ("to", "→"),
    ("rightarrow", "→"),
    ("leftarrow", "←"),
    ("Rightarrow", "⇒"),
    ("left", ""),
    ("right", ""),
];

/// Spacing commands; these are not letters so [`COMMAND`] never sees them.
const SPACING: &[&str] = &["\\,", "\\;", "\\:", "\\ "];

#[derive(Debug, Clone, PartialEq)]
pub struct TypesetText {
    pub text: String,
    /// Multiplier over [`BASE_FONT_SIZE`].
    pub scale: f32,
}

impl TypesetText {
    pub fn font_size(&self) -> f32 {
        BASE_FONT_SIZE * self.scale
    }
}

fn size_scale(command: &str) -> f32 {
    match command {
        "tiny" => 0.5,
        "small" => 0.9,
        "large" => 1.2,
        "Large" => 1.44,
        "LARGE" => 1.728,
        "huge" => 2.074,
        "Huge" => 2.488,
        _ => 1.0,
    }
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '(' => '⁽',
        ')' => '⁾',
        'n' => 'ⁿ',
        'i' => 'ⁱ',
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '(' => '₍',
        ')' => '₎',
        _ => return None,
    })
}

/// Map every char through `table`, falling back to `marker` + the raw
/// group when any char has no script form.
fn script(group: &str, table: fn(char) -> Option<char>, marker: char) -> String {
    group
        .chars()
        .map(table)
        .collect::<Option<String>>()
        .unwrap_or_else(|| {
            if group.chars().count() == 1 {
                format!("{marker}{group}")
            } else {
                format!("{marker}({group})")
            }
        })
}

fn strip_delimiters(latex: &str) -> &str {
    let s = latex.trim();
    for (open, close) in [("\\(", "\\)"), ("\\[", "\\]"), ("$$", "$$"), ("$", "$")] {
        if let Some(inner) = s
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    s
}

/// Typeset one TeX fragment, optionally wrapped in `\( \)` and a size
/// command such as `\LARGE{...}`.
pub fn typeset(latex: &str) -> TypesetText {
    let mut body = strip_delimiters(latex).to_owned();
    let mut scale = 1.0;
    if let Some(caps) = SIZE.captures(&body) {
        scale = size_scale(&caps[1]);
        body = caps[2].to_owned();
    }

    // Innermost groups first so nested fractions and roots collapse.
    loop {
        let next = FRAC.replace_all(&body, |caps: &regex::Captures| {
            format!("{}/{}", operand(&caps[1]), operand(&caps[2]))
        });
        let next = SQRT.replace_all(&next, |caps: &regex::Captures| {
            format!("√{}", operand(&caps[1]))
        });
        let next = TEXT.replace_all(&next, "$1").into_owned();
        if next == body {
            break;
        }
        body = next;
    }

    body = SUP_GROUP
        .replace_all(&body, |caps: &regex::Captures| script(&caps[1], superscript, '^'))
        .into_owned();
    body = SUP_CHAR
        .replace_all(&body, |caps: &regex::Captures| script(&caps[1], superscript, '^'))
        .into_owned();
    body = SUB_GROUP
        .replace_all(&body, |caps: &regex::Captures| script(&caps[1], subscript, '_'))
        .into_owned();
    body = SUB_CHAR
        .replace_all(&body, |caps: &regex::Captures| script(&caps[1], subscript, '_'))
        .into_owned();

    body = COMMAND
        .replace_all(&body, |caps: &regex::Captures| {
            match SYMBOLS.iter().find(|(name, _)| *name == &caps[1]) {
                Some((_, symbol)) => (*symbol).to_owned(),
                None => caps[0].to_owned(),
            }
        })
        .into_owned();
    for spacing in SPACING {
        body = body.replace(spacing, " ");
    }

    TypesetText {
        text: body.trim().to_owned(),
        scale,
    }
}

/// Parenthesize anything longer than a single number or name.
fn operand(group: &str) -> String {
    let group = group.trim();
    if !group.is_empty()
        && group
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
    {
        group.to_owned()
    } else {
        format!("({group})")
    }
}

/// Re-typesets the whole overlay list whenever its revision changes, the
/// same way a page-level typeset pass would.
#[derive(Debug, Default)]
pub struct TypesetCache {
    revision: Option<u64>,
    rendered: Vec<TypesetText>,
    passes: usize,
}

impl TypesetCache {
    pub fn refresh<'a>(&mut self, revision: u64, sources: impl IntoIterator<Item = &'a str>) -> bool {
        if self.revision == Some(revision) {
            return false;
        }
        self.rendered = sources.into_iter().map(typeset).collect();
        self.revision = Some(revision);
        self.passes += 1;
        tracing::trace!(revision, entries = self.rendered.len(), "typeset pass");
        true
    }

    pub fn rendered(&self) -> &[TypesetText] {
        &self.rendered
    }

    pub fn get(&self, index: usize) -> Option<&TypesetText> {
        self.rendered.get(index)
    }

    pub fn passes(&self) -> usize {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inline_delimiters_and_size() {
        let out = typeset("\\(\\LARGE{2 + 3 = 5}\\)");
        assert_eq!(out.text, "2 + 3 = 5");
        assert!((out.scale - 1.728).abs() < f32::EPSILON);
    }

    #[test]
    fn plain_fragment_has_unit_scale() {
        let out = typeset("x = 5");
        assert_eq!(out.text, "x = 5");
        assert_eq!(out.scale, 1.0);
    }

    #[test]
    fn operators_and_greek_letters() {
        assert_eq!(typeset("2 \\times \\pi").text, "2 × π");
        assert_eq!(typeset("a \\div b \\neq c").text, "a ÷ b ≠ c");
    }

    #[test]
    fn commands_match_whole_names_only() {
        assert_eq!(typeset("1 + 2 + \\cdots").text, "1 + 2 + ⋯");
        assert_eq!(typeset("x \\leftarrow 3").text, "x ← 3");
        assert_eq!(typeset("\\left(a \\cdot b\\right)").text, "(a · b)");
        assert_eq!(typeset("\\pit").text, "\\pit");
    }

    #[test]
    fn scripts_become_unicode() {
        assert_eq!(typeset("x^2 + y^{10}").text, "x² + y¹⁰");
        assert_eq!(typeset("a_1 + a_{12}").text, "a₁ + a₁₂");
    }

    #[test]
    fn scripts_without_unicode_form_fall_back_to_caret() {
        assert_eq!(typeset("e^{xy}").text, "e^(xy)");
    }

    #[test]
    fn fractions_and_roots() {
        assert_eq!(typeset("\\frac{7}{2}").text, "7/2");
        assert_eq!(typeset("\\sqrt{16} = 4").text, "√16 = 4");
        assert_eq!(typeset("\\frac{x + 1}{2}").text, "(x + 1)/2");
        assert_eq!(typeset("\\sqrt{\\frac{1}{4}}").text, "√(1/4)");
    }

    #[test]
    fn cache_only_reruns_on_new_revision() {
        let mut cache = TypesetCache::default();
        let sources = ["\\(\\LARGE{x = 5}\\)", "\\(\\LARGE{y = 6}\\)"];
        assert!(cache.refresh(1, sources));
        assert!(!cache.refresh(1, sources));
        assert_eq!(cache.passes(), 1);
        assert_eq!(cache.get(1).unwrap().text, "y = 6");

        assert!(cache.refresh(2, ["\\(z\\)"]));
        assert_eq!(cache.rendered().len(), 1);
        assert_eq!(cache.passes(), 2);
    }
}
