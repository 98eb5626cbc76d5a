//! Login form detection.
//!
//! Scanning runs in two ordered phases; the first phase that yields at least
//! one qualifying form wins:
//!
//! 1. **Structural** — every real `<form>` element whose controls include at
//!    least one password field.
//! 2. **Anchored fallback** — only when no structural form qualifies: each
//!    password field anywhere on the page anchors an ancestor walk up to the
//!    first container that looks like a login UI (two or more controls, or a
//!    button). This recovers login pages built without a `<form>` wrapper.
//!
//! Results are transient: a [`DetectedForm`] is only valid against the
//! document it was scanned from, and goes stale the moment that document is
//! rebuilt.

use crate::classify::{FieldRole, classify_field};
use crate::dom::{NodeId, PageDocument};

/// Visible-text vocabulary that marks a button as a sign-in trigger.
const SUBMIT_VOCABULARY: &[&str] = &["sign in", "log in", "login", "submit", "enter"];

/// One classified control inside a detected form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedField {
    pub node: NodeId,
    pub role: FieldRole,
}

/// A runtime-identified group of page fields believed to constitute a login
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedForm {
    /// The `<form>` element, or the fallback container, anchoring the form.
    pub container: NodeId,
    /// Classified controls inside the container, in document order.
    pub fields: Vec<ClassifiedField>,
    pub has_username: bool,
    pub has_password: bool,
    /// The control that should receive the credential's username, if any.
    pub username_field: Option<NodeId>,
    /// The control that should receive the credential's password, if any.
    pub password_field: Option<NodeId>,
    /// Submit button, when one was identified; filling falls back to a
    /// `submit` signal on the container otherwise.
    pub submit_target: Option<NodeId>,
}

/// Stateless login form detector.
///
/// Instantiate per call site; all inputs and outputs are explicit, no scan
/// state is retained between calls.
#[derive(Debug, Default)]
pub struct FormDetector;

impl FormDetector {
    pub fn new() -> Self {
        Self
    }

    /// Scan `doc` for login forms, in document order.
    ///
    /// An empty result is a valid, non-error outcome meaning "no login form
    /// present."
    pub fn detect_forms(&self, doc: &PageDocument) -> Vec<DetectedForm> {
        let structural = self.structural_pass(doc);
        if !structural.is_empty() {
            tracing::debug!(count = structural.len(), "detected structural login forms");
            return structural;
        }

        let anchored = self.anchored_pass(doc);
        tracing::debug!(count = anchored.len(), "detected anchored fallback forms");
        anchored
    }

    // -- Phase 1: real <form> elements ---------------------------------------

    fn structural_pass(&self, doc: &PageDocument) -> Vec<DetectedForm> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|&node| doc.tag(node) == Some("form"))
            .filter_map(|form| {
                let fields = classify_controls(doc, form);
                fields
                    .iter()
                    .any(|f| f.role == FieldRole::Password)
                    .then(|| build_form(doc, form, fields))
            })
            .collect()
    }

    // -- Phase 2: password-anchored containers -------------------------------

    fn anchored_pass(&self, doc: &PageDocument) -> Vec<DetectedForm> {
        let mut forms = Vec::new();
        let mut seen_containers = Vec::new();

        for anchor in doc.descendants(doc.root()) {
            if !is_candidate_control(doc, anchor)
                || classify_field(doc, anchor) != FieldRole::Password
            {
                continue;
            }

            let container = self.find_container(doc, anchor);
            if seen_containers.contains(&container) {
                // Two password fields (e.g. registration confirm fields)
                // sharing a container yield one form, not two.
                continue;
            }
            seen_containers.push(container);

            let fields = classify_controls(doc, container);
            forms.push(build_form(doc, container, fields));
        }

        forms
    }

    /// Walk ancestors of `anchor` until a container holds at least two form
    /// controls or at least one button-like element. The document root is the
    /// ceiling.
    fn find_container(&self, doc: &PageDocument, anchor: NodeId) -> NodeId {
        for ancestor in doc.ancestors(anchor) {
            let descendants = doc.descendants(ancestor);
            let controls = descendants
                .iter()
                .filter(|&&n| is_candidate_control(doc, n))
                .count();
            let buttons = descendants.iter().filter(|&&n| is_button_like(doc, n)).count();

            if controls >= 2 || buttons >= 1 {
                return ancestor;
            }
        }
        doc.root()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// A control that participates in detection: input/select/textarea that is
/// neither `type=hidden` nor disabled.
fn is_candidate_control(doc: &PageDocument, node: NodeId) -> bool {
    if !doc.is_form_control(node) || doc.is_disabled(node) {
        return false;
    }
    !doc.attr(node, "type")
        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
}

fn is_button_like(doc: &PageDocument, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("button") => true,
        Some("input") => doc
            .attr(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("submit") || t.eq_ignore_ascii_case("button")),
        Some(_) => doc
            .attr(node, "role")
            .is_some_and(|r| r.eq_ignore_ascii_case("button")),
        None => false,
    }
}

/// Visible text of a button-like element: descendant text plus the `value`
/// attribute (which is what `<input type=submit>` renders).
fn button_text(doc: &PageDocument, node: NodeId) -> String {
    let mut text = doc.text_content(node);
    if let Some(value) = doc.attr(node, "value") {
        text.push(' ');
        text.push_str(value);
    }
    text.to_lowercase()
}

fn classify_controls(doc: &PageDocument, container: NodeId) -> Vec<ClassifiedField> {
    doc.descendants(container)
        .into_iter()
        .filter(|&n| is_candidate_control(doc, n))
        .map(|node| ClassifiedField {
            node,
            role: classify_field(doc, node),
        })
        .collect()
}

fn build_form(doc: &PageDocument, container: NodeId, fields: Vec<ClassifiedField>) -> DetectedForm {
    let password_field = fields
        .iter()
        .find(|f| f.role == FieldRole::Password)
        .map(|f| f.node);

    // Preference order: explicit username, then email, then the first
    // remaining non-password control.
    let username_field = fields
        .iter()
        .find(|f| f.role == FieldRole::Username)
        .or_else(|| fields.iter().find(|f| f.role == FieldRole::Email))
        .or_else(|| fields.iter().find(|f| f.role != FieldRole::Password))
        .map(|f| f.node);

    DetectedForm {
        container,
        has_username: username_field.is_some(),
        has_password: password_field.is_some(),
        username_field,
        password_field,
        submit_target: find_submit_target(doc, container),
        fields,
    }
}

/// Locate a submit trigger inside `container`: an explicit `type=submit`
/// element first, else the first button-like element whose visible text
/// matches the sign-in vocabulary.
fn find_submit_target(doc: &PageDocument, container: NodeId) -> Option<NodeId> {
    let descendants = doc.descendants(container);

    if let Some(&explicit) = descendants.iter().find(|&&n| {
        doc.attr(n, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("submit"))
    }) {
        return Some(explicit);
    }

    descendants
        .iter()
        .filter(|&&n| is_button_like(doc, n))
        .find(|&&n| {
            let text = button_text(doc, n);
            SUBMIT_VOCABULARY.iter().any(|phrase| text.contains(phrase))
        })
        .copied()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(html: &str) -> (PageDocument, Vec<DetectedForm>) {
        let doc = PageDocument::parse(html);
        let forms = FormDetector::new().detect_forms(&doc);
        (doc, forms)
    }

    #[test]
    fn simple_login_form_detected() {
        let (doc, forms) = detect(
            r#"<form>
                 <input type="text" name="user">
                 <input type="password" name="pass">
                 <button type="submit">Sign in</button>
               </form>"#,
        );
        assert_eq!(forms.len(), 1);
        let form = &forms[0];
        assert!(form.has_username);
        assert!(form.has_password);
        assert_eq!(doc.tag(form.container), Some("form"));
        assert_eq!(doc.attr(form.username_field.unwrap(), "name"), Some("user"));
        assert_eq!(doc.attr(form.password_field.unwrap(), "name"), Some("pass"));
        assert!(form.submit_target.is_some());
    }

    #[test]
    fn unknown_text_input_falls_back_to_username() {
        // No username keyword anywhere, but the text input is the only
        // non-password control.
        let (_, forms) = detect(
            r#"<form>
                 <input type="text" name="q7x">
                 <input type="password" name="q8x_secret">
               </form>"#,
        );
        assert_eq!(forms.len(), 1);
        assert!(forms[0].has_username);
        assert!(forms[0].has_password);
    }

    #[test]
    fn form_without_password_does_not_qualify() {
        let (_, forms) = detect(
            r#"<form>
                 <input type="text" name="search">
                 <button type="submit">Go</button>
               </form>"#,
        );
        assert!(forms.is_empty());
    }

    #[test]
    fn search_form_skipped_login_form_found() {
        let (doc, forms) = detect(
            r#"<form id="search"><input name="q"></form>
               <form id="login">
                 <input type="email" name="address">
                 <input type="password">
               </form>"#,
        );
        assert_eq!(forms.len(), 1);
        assert_eq!(doc.attr(forms[0].container, "id"), Some("login"));
        // Email field serves as the username.
        assert_eq!(
            doc.attr(forms[0].username_field.unwrap(), "name"),
            Some("address")
        );
    }

    #[test]
    fn bare_password_input_recovered_by_anchored_fallback() {
        let (doc, forms) = detect(
            r#"<div class="modal">
                 <input type="text" name="username">
                 <input type="password">
                 <div role="button">Log in</div>
               </div>"#,
        );
        assert_eq!(forms.len(), 1);
        let form = &forms[0];
        assert!(form.has_username);
        assert!(form.has_password);
        assert_eq!(doc.attr(form.container, "class"), Some("modal"));
        assert!(form.submit_target.is_some());
    }

    #[test]
    fn lone_password_input_still_yields_a_form() {
        // Nothing but one password field and no form wrapper at all: the
        // ancestor walk tops out at the document root.
        let (_, forms) = detect(r#"<input type="password">"#);
        assert_eq!(forms.len(), 1);
        assert!(forms[0].has_password);
    }

    #[test]
    fn confirm_password_pair_yields_one_form() {
        let (_, forms) = detect(
            r#"<div>
                 <input type="password" name="new">
                 <input type="password" name="confirm">
               </div>"#,
        );
        assert_eq!(forms.len(), 1);
    }

    #[test]
    fn explicit_submit_type_preferred_over_vocabulary() {
        let (doc, forms) = detect(
            r#"<form>
                 <input type="password">
                 <button>Log in</button>
                 <input type="submit" value="Continue">
               </form>"#,
        );
        // The <button> comes first in document order, but type=submit wins.
        let target = forms[0].submit_target.unwrap();
        assert_eq!(doc.attr(target, "type"), Some("submit"));
    }

    #[test]
    fn vocabulary_button_matched_case_insensitively() {
        let (doc, forms) = detect(
            r#"<form>
                 <input type="password">
                 <button>SIGN IN</button>
               </form>"#,
        );
        let target = forms[0].submit_target.unwrap();
        assert_eq!(doc.tag(target), Some("button"));
    }

    #[test]
    fn unrelated_button_is_not_a_submit_target() {
        let (_, forms) = detect(
            r#"<form>
                 <input type="password">
                 <button>Forgot password?</button>
               </form>"#,
        );
        assert!(forms[0].submit_target.is_none());
    }

    #[test]
    fn hidden_and_disabled_controls_ignored() {
        let (doc, forms) = detect(
            r#"<form>
                 <input type="hidden" name="csrf_token">
                 <input type="text" name="user" disabled>
                 <input type="text" name="login">
                 <input type="password">
               </form>"#,
        );
        let form = &forms[0];
        assert_eq!(form.fields.len(), 2);
        assert_eq!(doc.attr(form.username_field.unwrap(), "name"), Some("login"));
    }

    #[test]
    fn forms_reported_in_document_order() {
        let (doc, forms) = detect(
            r#"<form id="first"><input type="password"></form>
               <form id="second"><input type="password"></form>"#,
        );
        assert_eq!(forms.len(), 2);
        assert_eq!(doc.attr(forms[0].container, "id"), Some("first"));
        assert_eq!(doc.attr(forms[1].container, "id"), Some("second"));
    }

    #[test]
    fn page_without_controls_yields_nothing() {
        let (_, forms) = detect("<main><h1>Hello</h1><p>No forms here.</p></main>");
        assert!(forms.is_empty());
    }
}
