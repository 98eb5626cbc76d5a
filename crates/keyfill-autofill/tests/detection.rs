//! Integration tests for the keyfill-autofill crate.
//!
//! These tests run the full scan-classify-fill pipeline over realistic page
//! markup, and one end-to-end flow through the vault: look a credential up
//! by page URL, fill the page, capture a hand-typed login back out.

use std::sync::Arc;

use keyfill_autofill::{AutofillExecutor, EventKind, FieldRole, FormDetector, PageDocument};
use keyfill_vault::{CredentialVault, LoginCredential, MemoryStore};

/// A page with the usual distractions: navigation, a search form, and the
/// actual login form further down.
const FULL_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Acme Webmail</title></head>
<body>
  <nav>
    <form action="/search" id="site-search">
      <input type="text" name="q" placeholder="Search">
      <button type="submit">Go</button>
    </form>
  </nav>
  <main>
    <h1>Welcome back</h1>
    <form action="/session" method="post" id="signin">
      <input type="hidden" name="csrf" value="abc123">
      <label>Email</label>
      <input type="email" name="address" autocomplete="username">
      <label>Password</label>
      <input type="password" name="secret" autocomplete="current-password">
      <label><input type="checkbox" name="remember"> Remember me</label>
      <button type="submit">Sign in</button>
    </form>
  </main>
</body>
</html>"#;

/// A single-page-app login: no `<form>` anywhere, everything in divs.
const FORMLESS_PAGE: &str = r#"<body>
  <div id="app">
    <div class="auth-card">
      <input placeholder="Email or phone">
      <input type="password" placeholder="Password">
      <div role="button" class="primary" tabindex="0">Log In</div>
    </div>
  </div>
</body>"#;

// ═══════════════════════════════════════════════════════════════════════
//  Detection over realistic pages
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn full_page_yields_only_the_signin_form() {
    let doc = PageDocument::parse(FULL_PAGE);
    let forms = FormDetector::new().detect_forms(&doc);

    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(doc.attr(form.container, "id"), Some("signin"));
    assert!(form.has_username);
    assert!(form.has_password);

    // The email input is the username field; the CSRF token never appears.
    assert_eq!(
        doc.attr(form.username_field.unwrap(), "name"),
        Some("address")
    );
    assert!(form.fields.iter().all(|f| doc.attr(f.node, "name") != Some("csrf")));

    // The checkbox is along for the ride, classified Unknown.
    let roles: Vec<FieldRole> = form.fields.iter().map(|f| f.role).collect();
    assert!(roles.contains(&FieldRole::Unknown));
}

#[test]
fn formless_spa_login_recovered() {
    let doc = PageDocument::parse(FORMLESS_PAGE);
    let forms = FormDetector::new().detect_forms(&doc);

    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert!(form.has_username);
    assert!(form.has_password);
    assert_eq!(doc.attr(form.container, "class"), Some("auth-card"));

    // The div[role=button] with "Log In" text is the submit target.
    let target = form.submit_target.unwrap();
    assert_eq!(doc.tag(target), Some("div"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Fill pipeline
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn fill_full_page_without_submitting() {
    let mut doc = PageDocument::parse(FULL_PAGE);
    let form = FormDetector::new().detect_forms(&doc).remove(0);

    let credential = LoginCredential::new(
        "https://mail.acme.test/login",
        "alice@acme.test",
        "s3cret!",
        "Acme Webmail",
    );

    let filled = AutofillExecutor::new()
        .fill_and_submit(&mut doc, &form, &credential, false)
        .unwrap();
    assert!(filled);

    assert_eq!(
        doc.value(form.username_field.unwrap()),
        Some("alice@acme.test")
    );
    assert_eq!(doc.value(form.password_field.unwrap()), Some("s3cret!"));

    // No submit was requested: no click reached the button.
    assert!(doc.events_for(form.submit_target.unwrap()).is_empty());

    // Reactive-framework notifications fired on both fields.
    assert_eq!(
        doc.events_for(form.password_field.unwrap()),
        vec![EventKind::Input, EventKind::Change]
    );
}

#[test]
fn fill_and_submit_presses_the_trigger() {
    let mut doc = PageDocument::parse(FORMLESS_PAGE);
    let form = FormDetector::new().detect_forms(&doc).remove(0);

    let credential = LoginCredential::new("https://spa.test", "bob", "pw123456", "SPA");
    AutofillExecutor::new()
        .fill_and_submit(&mut doc, &form, &credential, true)
        .unwrap();

    assert_eq!(
        doc.events_for(form.submit_target.unwrap()),
        vec![EventKind::Click]
    );
}

// ═══════════════════════════════════════════════════════════════════════
//  End to end: vault lookup → fill → capture → vault save
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn vault_backed_fill_and_capture_roundtrip() {
    const PASSPHRASE: &str = "correct horse";
    let vault = CredentialVault::new(Arc::new(MemoryStore::new()));
    vault.set_master_password(PASSPHRASE).await.unwrap();

    vault
        .save_credential(
            LoginCredential::new("https://mail.acme.test/login", "alice", "old-pw", "Acme"),
            PASSPHRASE,
        )
        .await
        .unwrap();

    // The page the content script is looking at.
    let mut doc = PageDocument::parse(FULL_PAGE);
    let form = FormDetector::new().detect_forms(&doc).remove(0);

    // Look up by the page URL and fill.
    let matches = vault
        .find_credentials_for_url("https://mail.acme.test/session", PASSPHRASE)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);

    let executor = AutofillExecutor::new();
    assert!(executor.fill(&mut doc, &form, &matches[0]).unwrap());

    // The user edits the password by hand and submits; capture the new pair
    // and store it under the same id.
    doc.set_value(form.password_field.unwrap(), "rotated-pw")
        .unwrap();
    let captured = executor
        .capture_submitted(&doc, &form, "https://mail.acme.test/login", "Acme Webmail")
        .unwrap();
    assert_eq!(captured.username, "alice");
    assert_eq!(captured.password, "rotated-pw");

    let mut updated = matches[0].clone();
    updated.password = captured.password;
    vault.save_credential(updated, PASSPHRASE).await.unwrap();

    let stored = vault.get_credentials(PASSPHRASE).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].password, "rotated-pw");
}
