use axum::http::StatusCode;
use chrono::{Datelike, Utc};

use crate::{library::Listing, session::Viewer, store::Word, store::WordStatus};

const PAGE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        header h1 { margin: 0; font-size: 1.6rem; }
        header h1 a { color: inherit; text-decoration: none; }
        nav { display: flex; gap: 0.75rem; flex-wrap: wrap; }
        nav a { color: #1d4ed8; text-decoration: none; font-weight: 600; background: #e0f2fe; padding: 0.45rem 0.9rem; border-radius: 999px; border: 1px solid #bfdbfe; }
        nav a:hover { background: #bfdbfe; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); margin-bottom: 1.5rem; }
        .panel h2 { margin-top: 0; }
        label { display: block; margin: 1rem 0 0.4rem; font-weight: 600; }
        input[type="text"], input[type="password"], textarea { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; box-sizing: border-box; font-size: 1rem; }
        textarea { min-height: 8rem; }
        button, .button { display: inline-block; margin-top: 1rem; padding: 0.75rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; text-decoration: none; }
        button.danger, .button.danger { background: #dc2626; }
        .word-list { list-style: none; padding: 0; margin: 0; }
        .word-list li { padding: 0.85rem 0; border-bottom: 1px solid #e2e8f0; }
        .word-list a { color: #0f172a; font-weight: 600; text-decoration: none; }
        .word-list span { color: #475569; margin-left: 0.5rem; }
        .pager { display: flex; gap: 0.5rem; margin-top: 1.25rem; flex-wrap: wrap; }
        .pager a, .pager strong { padding: 0.35rem 0.75rem; border-radius: 6px; border: 1px solid #cbd5f5; text-decoration: none; color: #1d4ed8; }
        .pager strong { background: #2563eb; color: #ffffff; border-color: #2563eb; }
        .search { display: flex; gap: 0.5rem; align-items: flex-end; }
        .search input { flex: 1; }
        .search button { margin-top: 0; }
        .word-image { max-width: 100%; border-radius: 12px; margin: 1rem 0; }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; margin-bottom: 1.5rem; font-weight: 600; }
        .flash.success { background: #ecfdf3; color: #166534; }
        .flash.error { background: #fef2f2; color: #b91c1c; }
        .status-tag { display: inline-block; padding: 0.25rem 0.75rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; background: #fef3c7; color: #92400e; }
        .actions { display: flex; gap: 0.75rem; flex-wrap: wrap; align-items: center; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

const MODERATION_SCRIPT: &str = r#"
<script>
document.querySelectorAll('[data-moderate]').forEach((button) => {
    button.addEventListener('click', async () => {
        const approve = Number(button.dataset.moderate);
        const response = await fetch('/approve_word', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ word_id: button.dataset.word, approve }),
        });
        if (response.ok) {
            window.location.href = approve === 1 ? '/item/' + button.dataset.word : '/proposed_words';
        } else {
            const body = await response.json().catch(() => ({ message: 'Request failed.' }));
            alert(body.message);
        }
    });
});
</script>
"#;

fn render_layout(title: &str, viewer: &Viewer, body: &str) -> String {
    let admin_links = if viewer.is_admin {
        r#"<a href="/proposed_words">Proposed words</a><a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/login">Log in</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1><a href="/library">Word Library</a></h1>
        <nav>
            <a href="/library">Library</a>
            <a href="/new_word">Propose a word</a>
            {admin_links}
        </nav>
    </header>
    <main>
{body}
        {footer}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        styles = PAGE_STYLES,
        admin_links = admin_links,
        body = body,
        footer = render_footer(),
    )
}

pub fn render_listing_page(listing: &Listing, viewer: &Viewer) -> String {
    let (heading, base_path) = match listing.status {
        WordStatus::Approved => ("Library", "/library"),
        WordStatus::Pending => ("Proposed words", "/proposed_words"),
    };

    let items = if listing.items.is_empty() {
        r#"<p class="note">No words found.</p>"#.to_string()
    } else {
        let rows = listing
            .items
            .iter()
            .map(|word| {
                format!(
                    r#"<li><a href="/item/{id}">{word}</a><span>{summary}</span></li>"#,
                    id = word.id,
                    word = escape_html(&word.word),
                    summary = escape_html(word.summary()),
                )
            })
            .collect::<String>();
        format!(r#"<ul class="word-list">{rows}</ul>"#)
    };

    let filter_value = listing.filter.as_deref().unwrap_or_default();

    let body = format!(
        r#"        <section class="panel">
            <h2>{heading}</h2>
            <form class="search" method="get" action="{base_path}">
                <input type="text" name="filter" placeholder="Search words" value="{filter}">
                <button type="submit">Search</button>
            </form>
            {items}
            {pager}
        </section>"#,
        heading = heading,
        base_path = base_path,
        filter = escape_html(filter_value),
        items = items,
        pager = render_pager(base_path, listing),
    );

    render_layout(heading, viewer, &body)
}

/// Pages shown on each side of the current one.
const PAGER_RADIUS: u32 = 2;

fn render_pager(base_path: &str, listing: &Listing) -> String {
    if listing.total_pages <= 1 {
        return String::new();
    }

    let filter_param = listing
        .filter
        .as_deref()
        .map(|filter| format!("filter={}&", urlencoding::encode(filter)))
        .unwrap_or_default();

    let last = listing.total_pages - 1;
    let current = listing.page.min(last);
    let start = current.saturating_sub(PAGER_RADIUS);
    let end = current.saturating_add(PAGER_RADIUS).min(last);

    let link = |page: u32| {
        if page == listing.page {
            format!("<strong>{}</strong>", page + 1)
        } else {
            format!(
                r#"<a href="{base_path}?{filter_param}page={page}">{label}</a>"#,
                label = page + 1,
            )
        }
    };

    let mut links = String::new();
    if start > 0 {
        links.push_str(&link(0));
        if start > 1 {
            links.push_str("<span>…</span>");
        }
    }
    for page in start..=end {
        links.push_str(&link(page));
    }
    if end < last {
        if end + 1 < last {
            links.push_str("<span>…</span>");
        }
        links.push_str(&link(last));
    }

    format!(r#"<div class="pager">{links}</div>"#)
}

pub fn render_item_page(word: &Word, viewer: &Viewer) -> String {
    let status_tag = if word.status == WordStatus::Pending {
        r#"<p><span class="status-tag">Awaiting moderation</span></p>"#
    } else {
        ""
    };

    let actions = if !viewer.is_admin {
        String::new()
    } else if word.status == WordStatus::Pending {
        format!(
            r#"<div class="actions">
                <button type="button" data-moderate="1" data-word="{id}">Approve</button>
                <button type="button" class="danger" data-moderate="0" data-word="{id}">Reject</button>
                <a class="button" href="/edit_item/{id}">Edit</a>
            </div>
            {script}"#,
            id = word.id,
            script = MODERATION_SCRIPT,
        )
    } else {
        format!(
            r#"<div class="actions">
                <a class="button" href="/edit_item/{id}">Edit</a>
                <a class="button danger" href="/remove/{id}">Delete</a>
            </div>"#,
            id = word.id,
        )
    };

    let body = format!(
        r#"        <section class="panel">
            <h2>{word}</h2>
            {status_tag}
            <img class="word-image" src="/image/{image}" alt="{word}">
            <p>{description}</p>
            {actions}
        </section>"#,
        word = escape_html(&word.word),
        status_tag = status_tag,
        image = escape_html(&word.image_name),
        description = escape_html(&word.description),
        actions = actions,
    );

    render_layout(&word.word, viewer, &body)
}

pub fn render_new_word_page(viewer: &Viewer, flash: Option<&str>) -> String {
    let flash = flash
        .map(|message| format!(r#"<div class="flash success">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let note = if viewer.is_admin {
        "Words you add are published immediately."
    } else {
        "Your word will appear in the library once an administrator approves it."
    };

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h2>Propose a word</h2>
            <p class="note">{note}</p>
            <form method="post" action="/new_word" enctype="multipart/form-data">
                <label for="word">Word</label>
                <input id="word" type="text" name="word" required>
                <label for="description">Description</label>
                <textarea id="description" name="description" required></textarea>
                <label for="file">Image</label>
                <input id="file" type="file" name="file" accept="image/*" required>
                <button type="submit">Submit</button>
            </form>
        </section>"#,
    );

    render_layout("Propose a word", viewer, &body)
}

pub fn render_edit_page(word: &Word, viewer: &Viewer) -> String {
    let body = format!(
        r#"        <section class="panel">
            <h2>Edit “{word}”</h2>
            <img class="word-image" src="/image/{image}" alt="{word}">
            <form method="post" action="/update_word/{id}" enctype="multipart/form-data">
                <label for="word">Word</label>
                <input id="word" type="text" name="word" value="{word}" required>
                <label for="description">Description</label>
                <textarea id="description" name="description" required>{description}</textarea>
                <label for="file">Replace image (optional)</label>
                <input id="file" type="file" name="file" accept="image/*">
                <button type="submit">Save</button>
            </form>
        </section>"#,
        id = word.id,
        word = escape_html(&word.word),
        image = escape_html(&word.image_name),
        description = escape_html(&word.description),
    );

    render_layout("Edit word", viewer, &body)
}

pub fn render_remove_confirm_page(word: &Word, viewer: &Viewer) -> String {
    let body = format!(
        r#"        <section class="panel">
            <h2>Delete “{word}”?</h2>
            <p>The word and its image will be removed permanently.</p>
            <div class="actions">
                <a class="button danger" href="/remove_word/{id}">Delete</a>
                <a class="button" href="/item/{id}">Cancel</a>
            </div>
        </section>"#,
        id = word.id,
        word = escape_html(&word.word),
    );

    render_layout("Delete word", viewer, &body)
}

pub fn render_login_page(error: Option<&str>) -> String {
    let flash = error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let body = format!(
        r#"        {flash}
        <section class="panel">
            <h2>Administrator login</h2>
            <form method="post" action="/login">
                <label for="username">Username</label>
                <input id="username" type="text" name="username" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Log in</button>
            </form>
        </section>"#,
    );

    render_layout("Log in", &Viewer::anonymous(), &body)
}

pub fn render_error_page(status: StatusCode, message: &str, viewer: &Viewer) -> String {
    let body = format!(
        r#"        <section class="panel">
            <h2>{code}</h2>
            <p>{message}</p>
            <a class="button" href="/library">Back to the library</a>
        </section>"#,
        code = status.as_u16(),
        message = escape_html(message),
    );

    render_layout(
        status.canonical_reason().unwrap_or("Error"),
        viewer,
        &body,
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} Word Library</footer>"#)
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn listing(total_pages: u32, filter: Option<&str>) -> Listing {
        Listing {
            status: WordStatus::Approved,
            items: Vec::new(),
            page: 1,
            total_pages,
            filter: filter.map(str::to_string),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn pager_keeps_filter_and_marks_current_page() {
        let html = render_pager("/library", &listing(3, Some("big cat")));
        assert!(html.contains(r#"href="/library?filter=big%20cat&page=0""#));
        assert!(html.contains("<strong>2</strong>"));
        assert!(html.contains(r#"page=2">3</a>"#));
    }

    #[test]
    fn pager_shows_window_around_current_page() {
        let mut many = listing(1000, None);
        many.page = 500;
        let html = render_pager("/library", &many);

        assert_eq!(html.matches("<a ").count(), 6);
        assert!(html.contains("<strong>501</strong>"));
        assert!(html.contains(r#"page=0">1</a>"#));
        assert!(html.contains(r#"page=498">499</a>"#));
        assert!(html.contains(r#"page=502">503</a>"#));
        assert!(html.contains(r#"page=999">1000</a>"#));
        assert!(!html.contains("page=497\""));
    }

    #[test]
    fn pager_beyond_last_page_still_links_back() {
        let mut beyond = listing(3, None);
        beyond.page = 7;
        let html = render_pager("/library", &beyond);

        assert!(html.contains(r#"page=0">1</a>"#));
        assert!(html.contains(r#"page=2">3</a>"#));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn error_page_uses_viewer_navigation() {
        let admin = render_error_page(StatusCode::NOT_FOUND, "Word not found.", &Viewer::admin());
        let public = render_error_page(
            StatusCode::NOT_FOUND,
            "Word not found.",
            &Viewer::anonymous(),
        );

        assert!(admin.contains("Log out"));
        assert!(!admin.contains("Log in"));
        assert!(public.contains("Log in"));
    }

    #[test]
    fn single_page_has_no_pager() {
        assert!(render_pager("/library", &listing(1, None)).is_empty());
    }

    #[test]
    fn item_page_shows_moderation_only_to_admins() {
        let word = Word {
            id: Uuid::new_v4(),
            word: "Cat".to_string(),
            description: "A feline.".to_string(),
            image_name: "abc.png".to_string(),
            status: WordStatus::Pending,
            created_at: Utc::now(),
        };

        let public = render_item_page(&word, &Viewer::anonymous());
        let admin = render_item_page(&word, &Viewer::admin());

        assert!(public.contains("Awaiting moderation"));
        assert!(!public.contains("data-moderate"));
        assert!(admin.contains(r#"data-moderate="1""#));
    }
}
