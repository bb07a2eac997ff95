//! HTML pages served by the callback server.
//!
//! Pages are rendered with handlebars. Values inserted with `{{...}}` go through
//! handlebars' HTML escaping, which is what keeps the manifest JSON from breaking out
//! of the hidden input's `value` attribute.

use handlebars::Handlebars;
use serde_json::json;
use url::Url;

use crate::{errors::SetupError, manifest::AppManifest};

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;

const PAGE_STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            background: #F2F2F2;
        }
        .container {
            background: #FFFFFF;
            border: 1px solid #EFEFEF;
            padding: 3rem;
            border-radius: 16px;
            box-shadow: 0 10px 40px rgba(0, 0, 0, 0.1);
            text-align: center;
            max-width: 500px;
        }
        p { color: #5B5B5B; line-height: 1.6; }
"#;

const REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Creating GitHub App...</title>
    <style>{{{style}}}
        h1 { color: #2E3236; margin-bottom: 1rem; }
        .spinner {
            border: 4px solid #EFEFEF;
            border-top: 4px solid #FF8500;
            border-radius: 50%;
            width: 40px;
            height: 40px;
            animation: spin 1s linear infinite;
            margin: 1rem auto;
        }
        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }
    </style>
</head>
<body onload="document.getElementById('manifest-form').submit();">
    <div class="container">
        <div class="spinner"></div>
        <h1>Creating GitHub App</h1>
        <p>Redirecting to GitHub...<br>
        Please wait.</p>
    </div>
    <form id="manifest-form" action="{{action}}" method="post">
        <input type="hidden" name="manifest" value="{{manifest}}">
    </form>
</body>
</html>
"#;

const SUCCESS_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>GitHub App Created!</title>
    <style>{{{style}}}
        h1 { color: #FF8500; margin-bottom: 1rem; }
        .icon { font-size: 4rem; margin-bottom: 1rem; }
        .hint { color: #888888; font-size: 0.9rem; margin-top: 2rem; }
    </style>
</head>
<body>
    <div class="container">
        <div class="icon">&#x2705;</div>
        <h1>GitHub App Created!</h1>
        <p>The app has been created successfully.<br>
        You can close this browser tab now.</p>
        <p class="hint">Return to the terminal to complete the setup.</p>
    </div>
</body>
</html>
"#;

fn render(template: &str, data: &serde_json::Value) -> Result<String, SetupError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars
        .render_template(template, data)
        .map_err(|e| SetupError::Render(e.to_string()))
}

/// Renders the page that posts `manifest` to GitHub as soon as it loads.
///
/// # Arguments
///
/// * `manifest` - The manifest to submit.
/// * `form_action` - GitHub's new-app form, see [`crate::manifest::new_app_form_url`].
pub fn render_redirect_page(manifest: &AppManifest, form_action: &Url) -> Result<String, SetupError> {
    render(
        REDIRECT_TEMPLATE,
        &json!({
            "style": PAGE_STYLE,
            "action": form_action.as_str(),
            "manifest": manifest.to_json()?,
        }),
    )
}

/// Renders the page shown in the browser once the callback was received.
pub fn render_success_page() -> Result<String, SetupError> {
    render(SUCCESS_TEMPLATE, &json!({ "style": PAGE_STYLE }))
}
