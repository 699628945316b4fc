//! Ta-form and te-form rules for godan verbs.

/// Sound change shared by a group of dictionary-form endings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub endings: &'static [char],
    pub ta: &'static str,
    pub te: &'static str,
}

pub const RULES: &[Rule] = &[
    Rule {
        endings: &['う', 'つ', 'る'],
        ta: "った",
        te: "って",
    },
    Rule {
        endings: &['む', 'ぬ', 'ぶ'],
        ta: "んだ",
        te: "んで",
    },
    Rule {
        endings: &['く'],
        ta: "いた",
        te: "いて",
    },
    Rule {
        endings: &['ぐ'],
        ta: "いだ",
        te: "いで",
    },
    Rule {
        endings: &['す'],
        ta: "した",
        te: "して",
    },
];

/// 行く takes った/って despite ending in く
const IKU: [&str; 2] = ["いく", "行く"];

/// Rule for a dictionary-form verb, chosen by its final character
pub fn rule_for(verb: &str) -> Option<&'static Rule> {
    let last = verb.chars().last()?;
    RULES.iter().find(|rule| rule.endings.contains(&last))
}

fn is_iku(verb: &str) -> bool {
    IKU.iter().any(|iku| verb.ends_with(iku))
}

fn apply(verb: &str, suffix: impl Fn(&Rule) -> &'static str) -> Option<String> {
    let last = verb.chars().last()?;
    let stem = &verb[..verb.len() - last.len_utf8()];
    let rule = if is_iku(verb) { &RULES[0] } else { rule_for(verb)? };
    Some(format!("{}{}", stem, suffix(rule)))
}

/// Plain past form of a godan verb, e.g. 書く → 書いた
pub fn ta_form(verb: &str) -> Option<String> {
    apply(verb, |rule| rule.ta)
}

/// Te-form of a godan verb, e.g. 飲む → 飲んで
pub fn te_form(verb: &str) -> Option<String> {
    apply(verb, |rule| rule.te)
}

/// Table rows as (endings, ta, te) for display
pub fn table() -> Vec<(String, &'static str, &'static str)> {
    RULES
        .iter()
        .map(|rule| {
            let endings: Vec<String> = rule.endings.iter().map(char::to_string).collect();
            (endings.join("・"), rule.ta, rule.te)
        })
        .collect()
}
