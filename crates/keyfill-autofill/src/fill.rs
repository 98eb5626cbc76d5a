//! Applying a credential to a detected form.
//!
//! The executor is stateless: the document, the scanned form, and the
//! credential are all passed explicitly, so an external trigger (the popup,
//! the content-script glue) can drive a fill without any shared mutable
//! page state.
//!
//! Filling writes the value and raises both `input` and `change` on each
//! field — host pages built on reactive frameworks ignore a bare value
//! assignment, they only observe the notifications. Auto-submit is opt-in;
//! [`AutofillExecutor::fill_and_submit`] only presses the trigger when asked.

use keyfill_vault::LoginCredential;

use crate::detect::DetectedForm;
use crate::dom::{EventKind, NodeId, PageDocument};
use crate::error::{AutofillError, Result};

/// A username/password pair read back out of a form the user just submitted,
/// offered to the vault as a candidate new credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLogin {
    /// URL of the page the form was submitted on.
    pub url: String,
    /// Page title, used as the default credential label.
    pub title: String,
    pub username: String,
    pub password: String,
}

/// Stateless fill/submit executor.
#[derive(Debug, Default)]
pub struct AutofillExecutor;

impl AutofillExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Write `credential` into `form`.
    ///
    /// Disabled or invisible fields are skipped, as are empty credential
    /// values. Each written field receives `input` then `change`. Returns
    /// `true` iff the password field was written.
    ///
    /// # Errors
    ///
    /// Returns [`AutofillError::DetachedNode`] if a field reference does not
    /// belong to `doc` (stale scan result).
    pub fn fill(
        &self,
        doc: &mut PageDocument,
        form: &DetectedForm,
        credential: &LoginCredential,
    ) -> Result<bool> {
        if let Some(field) = form.username_field {
            self.write_field(doc, field, &credential.username)?;
        }

        let mut password_written = false;
        if let Some(field) = form.password_field {
            password_written = self.write_field(doc, field, &credential.password)?;
        }

        tracing::debug!(
            credential = %credential.id,
            password_written,
            "filled detected form"
        );
        Ok(password_written)
    }

    /// Trigger submission of `form`: activate the submit target when one was
    /// identified, otherwise raise a `submit` signal on the container.
    ///
    /// Call at most once per fill.
    ///
    /// # Errors
    ///
    /// Returns [`AutofillError::DetachedNode`] if the target or container is
    /// not part of `doc`.
    pub fn submit(&self, doc: &mut PageDocument, form: &DetectedForm) -> Result<()> {
        match form.submit_target {
            Some(target) => doc.dispatch(target, EventKind::Click),
            None => doc.dispatch(form.container, EventKind::Submit),
        }
    }

    /// Fill, then submit only when `submit` is set. Returns the fill result.
    pub fn fill_and_submit(
        &self,
        doc: &mut PageDocument,
        form: &DetectedForm,
        credential: &LoginCredential,
        submit: bool,
    ) -> Result<bool> {
        let filled = self.fill(doc, form, credential)?;
        if filled && submit {
            self.submit(doc, form)?;
        }
        Ok(filled)
    }

    /// Read the values currently held by `form`'s matched fields, for saving
    /// after the user submits a login by hand.
    ///
    /// Returns `Some` only when both the username and password fields exist
    /// and hold non-empty values.
    pub fn capture_submitted(
        &self,
        doc: &PageDocument,
        form: &DetectedForm,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Option<CapturedLogin> {
        let username = doc.value(form.username_field?)?.to_string();
        let password = doc.value(form.password_field?)?.to_string();

        if username.is_empty() || password.is_empty() {
            return None;
        }

        Some(CapturedLogin {
            url: url.into(),
            title: title.into(),
            username,
            password,
        })
    }

    /// Write one field: skip unfillable targets, set the value, notify.
    /// Returns whether the value was actually written.
    fn write_field(&self, doc: &mut PageDocument, field: NodeId, value: &str) -> Result<bool> {
        if !doc.contains(field) {
            return Err(AutofillError::DetachedNode { node: field });
        }
        if value.is_empty() || doc.is_disabled(field) || !doc.is_visible(field) {
            return Ok(false);
        }

        doc.set_value(field, value)?;
        doc.dispatch(field, EventKind::Input)?;
        doc.dispatch(field, EventKind::Change)?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FormDetector;

    const LOGIN_PAGE: &str = r#"<form>
        <input type="text" name="user">
        <input type="password" name="pass">
        <button type="submit">Sign in</button>
    </form>"#;

    fn credential() -> LoginCredential {
        LoginCredential::new("https://example.com/login", "alice", "s3cret!", "Example")
    }

    fn scan(html: &str) -> (PageDocument, DetectedForm) {
        let doc = PageDocument::parse(html);
        let form = FormDetector::new().detect_forms(&doc).remove(0);
        (doc, form)
    }

    #[test]
    fn fill_writes_values_and_notifies() {
        let (mut doc, form) = scan(LOGIN_PAGE);
        let filled = AutofillExecutor::new()
            .fill(&mut doc, &form, &credential())
            .unwrap();
        assert!(filled);

        let username = form.username_field.unwrap();
        let password = form.password_field.unwrap();
        assert_eq!(doc.value(username), Some("alice"));
        assert_eq!(doc.value(password), Some("s3cret!"));

        // Both notifications, in order, on both fields.
        assert_eq!(
            doc.events_for(username),
            vec![EventKind::Input, EventKind::Change]
        );
        assert_eq!(
            doc.events_for(password),
            vec![EventKind::Input, EventKind::Change]
        );
    }

    #[test]
    fn fill_false_when_password_field_invisible() {
        let (mut doc, form) = scan(
            r#"<form>
                 <input type="text" name="user">
                 <input type="password" name="pass" style="display:none">
               </form>"#,
        );
        let filled = AutofillExecutor::new()
            .fill(&mut doc, &form, &credential())
            .unwrap();
        // Username was written, but the password field was skipped, and the
        // contract keys the return value on the password.
        assert!(!filled);
        assert_eq!(doc.value(form.username_field.unwrap()), Some("alice"));
        assert!(doc.events_for(form.password_field.unwrap()).is_empty());
    }

    #[test]
    fn fill_skips_invisible_field_without_error() {
        let (mut doc, form) = scan(
            r#"<div>
                 <input type="text" name="user" style="display:none">
                 <input type="password" name="pass">
               </div>"#,
        );
        let filled = AutofillExecutor::new()
            .fill(&mut doc, &form, &credential())
            .unwrap();
        assert!(filled);

        let username = form.username_field.unwrap();
        assert_eq!(doc.value(username), Some(""));
        assert!(doc.events_for(username).is_empty());
    }

    #[test]
    fn fill_skips_empty_username_value() {
        let (mut doc, form) = scan(LOGIN_PAGE);
        let mut cred = credential();
        cred.username = String::new();

        let filled = AutofillExecutor::new().fill(&mut doc, &form, &cred).unwrap();
        assert!(filled); // password still written
        assert_eq!(doc.value(form.username_field.unwrap()), Some(""));
    }

    #[test]
    fn submit_clicks_the_identified_target() {
        let (mut doc, form) = scan(LOGIN_PAGE);
        let executor = AutofillExecutor::new();
        executor.fill(&mut doc, &form, &credential()).unwrap();
        executor.submit(&mut doc, &form).unwrap();

        let target = form.submit_target.unwrap();
        assert_eq!(doc.events_for(target), vec![EventKind::Click]);
    }

    #[test]
    fn submit_falls_back_to_container_signal() {
        let (mut doc, form) = scan(
            r#"<form>
                 <input type="password" name="pass">
               </form>"#,
        );
        assert!(form.submit_target.is_none());

        AutofillExecutor::new().submit(&mut doc, &form).unwrap();
        assert_eq!(doc.events_for(form.container), vec![EventKind::Submit]);
    }

    #[test]
    fn auto_submit_is_opt_in() {
        let executor = AutofillExecutor::new();

        let (mut doc, form) = scan(LOGIN_PAGE);
        executor
            .fill_and_submit(&mut doc, &form, &credential(), false)
            .unwrap();
        assert!(doc.events_for(form.submit_target.unwrap()).is_empty());

        let (mut doc, form) = scan(LOGIN_PAGE);
        executor
            .fill_and_submit(&mut doc, &form, &credential(), true)
            .unwrap();
        assert_eq!(
            doc.events_for(form.submit_target.unwrap()),
            vec![EventKind::Click]
        );
    }

    #[test]
    fn stale_reference_from_another_document_errors() {
        let (_, form) = scan(LOGIN_PAGE);
        // An empty document: the scanned node ids point past its arena.
        let mut other = PageDocument::parse("");

        let result = AutofillExecutor::new().fill(&mut other, &form, &credential());
        assert!(matches!(result, Err(AutofillError::DetachedNode { .. })));
    }

    #[test]
    fn capture_reads_back_submitted_values() {
        let (mut doc, form) = scan(LOGIN_PAGE);
        let executor = AutofillExecutor::new();

        // Nothing typed yet.
        assert!(
            executor
                .capture_submitted(&doc, &form, "https://example.com", "Example")
                .is_none()
        );

        doc.set_value(form.username_field.unwrap(), "bob").unwrap();
        doc.set_value(form.password_field.unwrap(), "hunter2").unwrap();

        let captured = executor
            .capture_submitted(&doc, &form, "https://example.com", "Example")
            .unwrap();
        assert_eq!(captured.username, "bob");
        assert_eq!(captured.password, "hunter2");
        assert_eq!(captured.title, "Example");
    }
}
