use super::*;
use crate::names::{InstanceName, OrganizationName};

fn manifest(homepage: &str) -> AppManifest {
    AppManifest::build(
        &OrganizationName::new("acme").unwrap(),
        Some(&InstanceName::new("prod").unwrap()),
        &Url::parse("http://localhost:8765/callback").unwrap(),
        homepage,
    )
}

fn form_action() -> Url {
    Url::parse("https://github.com/organizations/acme/settings/apps/new").unwrap()
}

/// Returns the raw text of the manifest input's value attribute.
fn manifest_attribute(html: &str) -> &str {
    let marker = r#"name="manifest" value=""#;
    let start = html.find(marker).expect("manifest input missing") + marker.len();
    let len = html[start..].find('"').expect("unterminated attribute");
    &html[start..start + len]
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x27;", "'")
        .replace("&#x60;", "`")
        .replace("&#x3D;", "=")
        .replace("&amp;", "&")
}

#[test]
fn test_redirect_page_embeds_escaped_manifest() {
    let manifest = manifest("https://github.com/bauer-group/CI-GitHubRunner");

    let html = render_redirect_page(&manifest, &form_action()).unwrap();

    let attribute = manifest_attribute(&html);
    assert!(!attribute.contains('"'));
    assert!(!attribute.contains('<'));
    assert!(!attribute.contains('>'));
    assert_eq!(unescape(attribute), manifest.to_json().unwrap());
}

#[test]
fn test_redirect_page_escapes_hostile_manifest_content() {
    let manifest = manifest(r#"https://example.com/?q="><script>alert('x')</script>&a=1"#);

    let html = render_redirect_page(&manifest, &form_action()).unwrap();

    assert!(!html.contains("<script>"));
    let attribute = manifest_attribute(&html);
    assert!(!attribute.contains('<'));
    assert!(!attribute.contains('>'));
    assert!(!attribute.contains('\''));
    assert_eq!(unescape(attribute), manifest.to_json().unwrap());
}

#[test]
fn test_redirect_page_posts_to_form_action() {
    let html = render_redirect_page(&manifest("https://example.com"), &form_action()).unwrap();

    assert!(html.contains(
        r#"action="https://github.com/organizations/acme/settings/apps/new" method="post""#
    ));
    assert!(html.contains("document.getElementById('manifest-form').submit();"));
}

#[test]
fn test_redirect_page_keeps_styles_intact() {
    let html = render_redirect_page(&manifest("https://example.com"), &form_action()).unwrap();

    assert!(html.contains("font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;"));
    assert!(html.contains("@keyframes spin"));
}

#[test]
fn test_success_page() {
    let html = render_success_page().unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("GitHub App Created!"));
    assert!(html.contains("You can close this browser tab now."));
}
