//! HTML for the form and outcome pages.
//!
//! Every line of text becomes its own `<p>`; blank lines are kept as empty
//! paragraphs so the two columns stay aligned line for line.

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Lines of `text` split at `\n`, `\r\n` or a lone `\r`. A trailing line
/// break does not start another line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let line = match rest.find(&['\r', '\n'][..]) {
            Some(end) => {
                let line = &rest[..end];
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + skip..];
                line
            }
            None => std::mem::take(&mut rest),
        };
        Some(line)
    })
}

pub fn paragraphs(text: &str) -> String {
    split_lines(text)
        .map(|line| format!("<p>{}</p>", escape(line)))
        .collect()
}

pub fn form_page(app_name: &str, action: &str, field: &str) -> String {
    let title = escape(app_name);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta content="text/html; charset=utf-8" http-equiv="content-type"/>
</head>
<body>
    <h1>{title}</h1>
    <form action="{action}" method="post">
        <textarea name="{field}" rows="20" cols="60"></textarea><br><br>
        <input type="submit" value="Convert">
    </form>
</body>
</html>
"#,
        title = title,
        action = escape(action),
        field = escape(field),
    )
}

/// Side-by-side page; `original` and `converted` are [`paragraphs`] output.
pub fn outcome_page(app_name: &str, back: &str, original: &str, converted: &str) -> String {
    let title = escape(app_name);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta content="text/html; charset=utf-8" http-equiv="content-type"/>
    <script>
        function copyColumn(id) {{
            navigator.clipboard.writeText(document.getElementById(id).innerText);
        }}
    </script>
</head>
<body>
    <h1>{title}</h1>
    <div style="display: flex">
        <div style="width: 50%">
            <h2>Original input</h2>
            <button type="button" onclick="copyColumn('original')">Copy</button>
            <div id="original">{original}</div>
        </div>
        <div style="width: 50%">
            <h2>Convert outcome</h2>
            <button type="button" onclick="copyColumn('converted')">Copy</button>
            <div id="converted">{converted}</div>
        </div>
    </div>
    <a href="{back}">Back</a>
</body>
</html>
"#,
        title = title,
        back = escape(back),
        original = original,
        converted = converted,
    )
}
