use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// Where a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleScope {
    pub content: bool,
    pub file_name: bool,
    pub dir_name: bool,
}

impl RuleScope {
    pub const CONTENT: RuleScope = RuleScope {
        content: true,
        file_name: false,
        dir_name: false,
    };

    pub const EVERYWHERE: RuleScope = RuleScope {
        content: true,
        file_name: true,
        dir_name: true,
    };

    pub const PATHS: RuleScope = RuleScope {
        content: false,
        file_name: true,
        dir_name: true,
    };
}

impl Default for RuleScope {
    fn default() -> Self {
        RuleScope::CONTENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Replace `token` by `value`; case-aware rules also cover the
    /// UpperCamel, lowerCamel, snake and SCREAMING_SNAKE variants
    Substitute {
        token: String,
        value: String,
        case_aware: bool,
    },
    /// Drop the marker region named `slot`, markers included
    DeleteSlot { slot: String },
    /// Replace the marker region named `slot`, markers included, by `text`
    InjectSlot { slot: String, text: String },
}

/// One step of a replacement run
///
/// Rules run in the order the caller lists them, once each. Slot rules of a
/// file are resolved before any substitution so that substitutions also see
/// the injected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub kind: RuleKind,
    pub scope: RuleScope,
}

impl ReplacementRule {
    /// Literal, case-sensitive substitution in file contents
    pub fn substitute(token: impl Into<String>, value: impl Into<String>) -> Self {
        ReplacementRule {
            kind: RuleKind::Substitute {
                token: token.into(),
                value: value.into(),
                case_aware: false,
            },
            scope: RuleScope::CONTENT,
        }
    }

    /// Identifier substitution covering every naming convention of `token`
    pub fn case_aware(token: impl Into<String>, value: impl Into<String>) -> Self {
        ReplacementRule {
            kind: RuleKind::Substitute {
                token: token.into(),
                value: value.into(),
                case_aware: true,
            },
            scope: RuleScope::CONTENT,
        }
    }

    pub fn delete_slot(slot: impl Into<String>) -> Self {
        ReplacementRule {
            kind: RuleKind::DeleteSlot { slot: slot.into() },
            scope: RuleScope::CONTENT,
        }
    }

    pub fn inject_slot(slot: impl Into<String>, text: impl Into<String>) -> Self {
        ReplacementRule {
            kind: RuleKind::InjectSlot {
                slot: slot.into(),
                text: text.into(),
            },
            scope: RuleScope::CONTENT,
        }
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_slot_rule(&self) -> bool {
        matches!(
            self.kind,
            RuleKind::DeleteSlot { .. } | RuleKind::InjectSlot { .. }
        )
    }

    /// Apply a substitution rule to `text`; slot rules leave it unchanged
    pub fn substitute_in(&self, text: &str) -> String {
        match &self.kind {
            RuleKind::Substitute {
                token,
                value,
                case_aware: false,
            } => {
                if token.is_empty() {
                    text.to_string()
                } else {
                    text.replace(token.as_str(), value)
                }
            }
            RuleKind::Substitute {
                token,
                value,
                case_aware: true,
            } => replace_variants(text, &variants(token, value)),
            _ => text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    UpperCamel,
    LowerCamel,
    Snake,
    Screaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Variant {
    from: String,
    to: String,
    style: Style,
}

/// Derive the (template form, replacement form) pair of every naming style
///
/// Styles whose template form collides with an earlier one are dropped; snake
/// wins over lowerCamel for single-word tokens.
fn variants(token: &str, value: &str) -> Vec<Variant> {
    let styles = [
        (Style::UpperCamel, token.to_upper_camel_case(), value.to_upper_camel_case()),
        (Style::Snake, token.to_snake_case(), value.to_snake_case()),
        (Style::Screaming, token.to_shouty_snake_case(), value.to_shouty_snake_case()),
        (Style::LowerCamel, token.to_lower_camel_case(), value.to_lower_camel_case()),
    ];
    let mut out: Vec<Variant> = Vec::new();
    for (style, from, to) in styles {
        if from.is_empty() || out.iter().any(|v| v.from == from) {
            continue;
        }
        out.push(Variant { from, to, style });
    }
    // longest template form first so `user_example_id` style overlaps resolve
    out.sort_by(|a, b| b.from.len().cmp(&a.from.len()));
    out
}

fn at_boundary(style: Style, prev: Option<char>, next: Option<char>) -> bool {
    let prev_ok = match style {
        Style::UpperCamel => true,
        _ => !prev.is_some_and(|c| c.is_alphanumeric()),
    };
    let next_ok = match style {
        Style::Screaming => !next.is_some_and(|c| c.is_uppercase() || c.is_ascii_digit()),
        _ => !next.is_some_and(|c| c.is_lowercase() || c.is_ascii_digit()),
    };
    prev_ok && next_ok
}

/// Single left-to-right pass; replaced text is never re-scanned
fn replace_variants(text: &str, variants: &[Variant]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let prev = text[..i].chars().next_back();
        let hit = variants.iter().find(|v| {
            rest.starts_with(v.from.as_str())
                && at_boundary(v.style, prev, rest[v.from.len()..].chars().next())
        });
        match hit {
            Some(v) => {
                out.push_str(&v.to);
                i += v.from.len();
            }
            None => {
                let c = rest.chars().next().unwrap_or_default();
                out.push(c);
                i += c.len_utf8().max(1);
            }
        }
    }
    out
}

/// Every naming variant of a placeholder token
pub fn token_variants(token: &str) -> Vec<String> {
    variants(token, token).into_iter().map(|v| v.from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(token: &str, value: &str, text: &str) -> String {
        ReplacementRule::case_aware(token, value).substitute_in(text)
    }

    #[test]
    fn test_every_variant_follows_the_value() {
        let text = "struct UserExample; let userExample = user_example_dao(); USER_EXAMPLE_TABLE";
        assert_eq!(
            apply("UserExample", "order_item", text),
            "struct OrderItem; let orderItem = order_item_dao(); ORDER_ITEM_TABLE"
        );
    }

    #[test]
    fn test_exact_token_only() {
        let text = "UserExamples superuser_example user_example2 UserExampleDao get_user_example";
        assert_eq!(
            apply("UserExample", "order", text),
            "UserExamples superuser_example user_example2 OrderDao get_order"
        );
    }

    #[test]
    fn test_single_pass_does_not_loop() {
        // the value contains the token again
        let out = apply("module_name_example", "module_name_example_v2", "use module_name_example::x;");
        assert_eq!(out, "use module_name_example_v2::x;");
    }

    #[test]
    fn test_plain_rule_is_literal() {
        let rule = ReplacementRule::substitute("github.com/acme", "shop");
        assert_eq!(rule.substitute_in("x github.com/acme/pkg"), "x shop/pkg");
    }

    #[test]
    fn test_single_word_prefers_snake() {
        let out = apply("order", "order_item", "order Order ORDER");
        assert_eq!(out, "order_item OrderItem ORDER_ITEM");
    }

    #[test]
    fn test_token_variants() {
        let mut all = token_variants("server_name_example");
        all.sort();
        assert_eq!(
            all,
            vec![
                "SERVER_NAME_EXAMPLE",
                "ServerNameExample",
                "serverNameExample",
                "server_name_example",
            ]
        );
    }
}
