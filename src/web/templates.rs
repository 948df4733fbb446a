//! Embedded HTML templates for the web UI.
//!
//! All templates use minijinja syntax and extend the shared `layout` template.

/// Base layout with dark theme CSS.
pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{% block title %}Bungie Link{% endblock %}</title>
    <style>
        :root {
            --bg-primary: #0f1117;
            --bg-secondary: #1a1d27;
            --border: #2e3245;
            --text-primary: #e1e4ed;
            --text-secondary: #8b8fa3;
            --text-muted: #5f6375;
            --accent: #6366f1;
            --accent-hover: #818cf8;
            --success: #22c55e;
            --danger: #ef4444;
            --radius: 8px;
        }
        *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
        }
        a { color: var(--accent); text-decoration: none; }
        a:hover { color: var(--accent-hover); }
        .container { max-width: 720px; margin: 0 auto; padding: 2rem 1rem; }
        .card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: var(--radius);
            padding: 1.25rem;
            margin-bottom: 1rem;
        }
        .btn {
            display: inline-block;
            padding: 0.5rem 1rem;
            border-radius: var(--radius);
            border: 1px solid var(--border);
            background: var(--bg-primary);
            color: var(--text-primary);
            cursor: pointer;
        }
        .btn-primary { background: var(--accent); border-color: var(--accent); color: #fff; }
        .btn-primary:hover { background: var(--accent-hover); color: #fff; }
        .text-secondary { color: var(--text-secondary); }
        .text-muted { color: var(--text-muted); }
        .text-danger { color: var(--danger); }
        .text-success { color: var(--success); }
        .mt-1 { margin-top: 0.5rem; }
        .mt-2 { margin-top: 1rem; }
        .radios label { margin-right: 1rem; }
        pre {
            background: var(--bg-primary);
            border: 1px solid var(--border);
            border-radius: var(--radius);
            padding: 0.75rem;
            overflow: auto;
            max-height: 420px;
            font-size: 0.75rem;
        }
    </style>
</head>
<body>
{% block body %}{% endblock %}
{% block scripts %}{% endblock %}
</body>
</html>"#;

/// Landing page: login control, class selection, profile output.
pub const INDEX: &str = r#"{% extends "layout" %}
{% block title %}Bungie Link{% endblock %}
{% block body %}
<div class="container">
    <div class="card">
        <h2 style="font-size:1.25rem;font-weight:600;">Bungie.net</h2>
        {% if signed_in %}
        <p class="text-success mt-1">Signed in as membership <strong>{{ membership_id }}</strong>.</p>
        <p class="mt-2">
            <a class="btn" href="/login">Sign in again</a>
            <a class="btn" href="/logout">Sign out</a>
        </p>
        {% else %}
        <p class="text-secondary mt-1">Sign in to load your Destiny 2 profile.</p>
        <p class="mt-2"><a id="login-button" class="btn btn-primary" href="/login">Sign in with Bungie.net</a></p>
        {% endif %}
    </div>
    {% if signed_in %}
    <div class="card">
        <h3 style="font-size:1rem;font-weight:600;">Character class</h3>
        <form class="radios mt-1">
            {% for cls in classes %}
            <label><input type="radio" name="character-class" id="{{ cls }}" value="{{ cls }}"> {{ cls | capitalize }}</label>
            {% endfor %}
        </form>
        <p id="profile-status" class="text-muted mt-1"></p>
        <pre id="profile-output" class="mt-1" hidden></pre>
    </div>
    {% endif %}
</div>
{% endblock %}
{% block scripts %}
<script>
    const statusEl = document.getElementById('profile-status');
    const outputEl = document.getElementById('profile-output');
    document.querySelectorAll('input[name="character-class"]').forEach((radio) => {
        radio.addEventListener('change', async () => {
            if (!radio.checked) return;
            statusEl.textContent = 'Loading profile...';
            statusEl.className = 'text-muted mt-1';
            try {
                const res = await fetch('/api/profile?class=' + encodeURIComponent(radio.value));
                const data = await res.json();
                if (!res.ok) {
                    statusEl.textContent = data.error ? data.error.message : 'Request failed';
                    statusEl.className = 'text-danger mt-1';
                    outputEl.hidden = true;
                    return;
                }
                statusEl.textContent = 'Profile loaded for ' + data.class + '.';
                outputEl.textContent = JSON.stringify(data.profile, null, 2);
                outputEl.hidden = false;
            } catch (err) {
                statusEl.textContent = 'Network error: ' + err;
                statusEl.className = 'text-danger mt-1';
            }
        });
    });
</script>
{% endblock %}"#;

/// Shown when a callback fails.
pub const CALLBACK_ERROR: &str = r#"{% extends "layout" %}
{% block title %}Sign-in Failed{% endblock %}
{% block body %}
<div style="display:flex;align-items:center;justify-content:center;min-height:100vh;padding:1rem;">
    <div class="card" style="width:100%;max-width:460px;text-align:center;">
        <div style="font-size:2.5rem;margin-bottom:0.75rem;color:var(--danger);">&#10007;</div>
        <h2 style="font-size:1.25rem;font-weight:600;">Sign-in Failed</h2>
        <p class="text-secondary mt-1">{{ error }}</p>
        {% if description %}<p class="text-muted mt-1" style="font-size:0.8125rem;">{{ description }}</p>{% endif %}
        <p class="mt-2"><a class="btn btn-primary" href="/login">Try again</a></p>
    </div>
</div>
{% endblock %}"#;
