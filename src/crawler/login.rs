//! Login form heuristic
//!
//! A page "has a login form" when it contains both a password field and
//! something that looks like a submit control. This is deliberately loose and
//! will produce false positives (a search form's "Submit" button next to an
//! unrelated password field) and false negatives (forms built by JavaScript).

use crate::markup::{walk, Node};

/// Button text fragments that count as a submit control
const SUBMIT_KEYWORDS: &[&str] = &["login", "sign in", "log in", "submit"];

/// Input name/id fragments that count as a password field inside a form
const PASSWORD_NAME_HINTS: &[&str] = &["password", "passwd", "pwd"];

/// Returns true if the tree contains a password field and a submit control
///
/// # Passes
///
/// 1. Whole tree: `input[type=password]` marks a password field;
///    `input[type=submit]`, `button[type=submit]`, or a `button` whose direct
///    text contains a login/submit keyword marks a submit control.
/// 2. Only if no password field was found: inputs inside a `form` whose `name`
///    or `id` mentions a password also count as the password field.
pub fn has_login_form(root: Node<'_>) -> bool {
    let mut has_password = false;
    let mut has_submit = false;

    walk(root, |node| match node.tag_name() {
        Some("input") => match node.attr("type") {
            Some("password") => has_password = true,
            Some("submit") => has_submit = true,
            _ => {}
        },
        Some("button") => {
            if node.attr("type") == Some("submit") || button_text_matches(&node) {
                has_submit = true;
            }
        }
        _ => {}
    });

    if !has_password {
        walk(root, |node| {
            if node.is("form") && form_has_password_named_input(node) {
                has_password = true;
            }
        });
    }

    has_password && has_submit
}

fn button_text_matches(node: &Node<'_>) -> bool {
    node.first_text_child()
        .map(|text| {
            let text = text.trim().to_lowercase();
            SUBMIT_KEYWORDS.iter().any(|keyword| text.contains(keyword))
        })
        .unwrap_or(false)
}

fn form_has_password_named_input(form: Node<'_>) -> bool {
    let mut found = false;
    walk(form, |node| {
        if !node.is("input") {
            return;
        }
        for attr in ["name", "id"] {
            if let Some(value) = node.attr(attr) {
                let value = value.to_lowercase();
                if PASSWORD_NAME_HINTS.iter().any(|hint| value.contains(hint)) {
                    found = true;
                }
            }
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Document;

    fn detect(html: &str) -> bool {
        has_login_form(Document::parse_str(html).root())
    }

    #[test]
    fn test_password_and_login_button() {
        assert!(detect(
            r#"<form><input type="password"><button>Log In</button></form>"#
        ));
    }

    #[test]
    fn test_submit_keyword_matches_any_submit_text() {
        assert!(detect(
            r#"<input type="password"><button>Submit Search</button>"#
        ));
    }

    #[test]
    fn test_password_without_submit_control() {
        assert!(!detect(r#"<input type="password"><button>Cancel</button>"#));
    }

    #[test]
    fn test_submit_input() {
        assert!(detect(r#"<input type="password"><input type="submit" value="Go">"#));
    }

    #[test]
    fn test_submit_typed_button() {
        assert!(detect(
            r#"<input type="password"><button type="submit"><span>Go</span></button>"#
        ));
    }

    #[test]
    fn test_button_keyword_case_insensitive() {
        assert!(detect(r#"<input type="password"><button>  SIGN IN  </button>"#));
    }

    #[test]
    fn test_nested_button_text_not_direct() {
        assert!(!detect(
            r#"<input type="password"><button><span>Login</span></button>"#
        ));
    }

    #[test]
    fn test_submit_without_password() {
        assert!(!detect(r#"<form><input type="text"><button>Login</button></form>"#));
    }

    #[test]
    fn test_password_named_input_in_form() {
        assert!(detect(
            r#"<form><input type="text" name="user_pwd"><input type="submit"></form>"#
        ));
        assert!(detect(
            r#"<form><input id="Passwd-Field"><button>Sign in</button></form>"#
        ));
    }

    #[test]
    fn test_password_named_input_outside_form_ignored() {
        assert!(!detect(
            r#"<input type="text" name="password"><button type="submit">Go</button>"#
        ));
    }

    #[test]
    fn test_type_value_is_case_sensitive() {
        assert!(!detect(r#"<input type="PASSWORD"><button>Login</button>"#));
    }

    #[test]
    fn test_idempotent() {
        let doc = Document::parse_str(
            r#"<form><input type="password"><button>Log In</button></form>"#,
        );
        let first = has_login_form(doc.root());
        let second = has_login_form(doc.root());
        assert_eq!(first, second);
        assert!(first);
    }
}
