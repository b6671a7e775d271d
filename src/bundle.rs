use std::io::{Cursor, Write as _};

use anyhow::Context as _;
use zip::write::SimpleFileOptions;

use crate::document::{AnnotatedDocument, AnnotatedItem};
use crate::slug::slugify;

const EXPLANATION_FOLDER: &str = "book_requirements";

/// Packages an enriched document into a self-contained zip archive:
/// `<title>.html` at the root plus one `book_requirements/exp_<n>.html` per
/// text item, numbered in chapter-then-item order so the Nth paragraph on the
/// main page always links to the Nth explanation page.
pub fn bundle(document: &AnnotatedDocument, title: &str) -> anyhow::Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let toc_html = render_toc(document);

    let mut main_content = String::new();
    let mut para_id = 0usize;

    for chapter in &document.chapters {
        let chapter_id = slugify(&chapter.title);
        main_content.push_str(&format!(
            "<h2 class=\"chapter-title\" id=\"{chapter_id}\">{}</h2>\n",
            html_escape(&chapter.title)
        ));

        for item in &chapter.items {
            match item {
                AnnotatedItem::Text {
                    original,
                    explanation,
                } => {
                    let explanation_path = format!("{EXPLANATION_FOLDER}/exp_{para_id}.html");
                    main_content.push_str(&format!(
                        "<div class=\"paragraph-container\">\n\
                         <p>{}</p>\n\
                         <a href=\"{explanation_path}\" target=\"_blank\" class=\"explain-button\" aria-label=\"Explain paragraph\">?</a>\n\
                         </div>\n",
                        html_escape(original)
                    ));

                    zip.start_file(explanation_path.as_str(), options)
                        .with_context(|| format!("zip start_file: {explanation_path}"))?;
                    zip.write_all(render_explanation_page(explanation).as_bytes())
                        .with_context(|| format!("zip write: {explanation_path}"))?;
                    para_id += 1;
                }
                AnnotatedItem::Image { url } => {
                    main_content.push_str(&format!(
                        "<div class=\"image-container\"><img src=\"{}\" alt=\"Embedded image\"></div>\n",
                        html_escape(url)
                    ));
                }
            }
        }
    }

    let main_name = format!("{title}.html");
    let main_html = render_book_page(&display_title(title), &toc_html, &main_content);
    zip.start_file(main_name.as_str(), options)
        .with_context(|| format!("zip start_file: {main_name}"))?;
    zip.write_all(main_html.as_bytes())
        .with_context(|| format!("zip write: {main_name}"))?;

    let cursor = zip.finish().context("zip finish")?;
    Ok(cursor.into_inner())
}

/// Python-html.escape equivalent; applied to every user-supplied string before
/// it is embedded in markup.
fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// `my_great_book` -> `My Great Book`.
fn display_title(base: &str) -> String {
    base.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_toc(document: &AnnotatedDocument) -> String {
    let mut out = String::from("<h3>Table of Contents</h3><ul>");
    for chapter in &document.chapters {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>",
            slugify(&chapter.title),
            html_escape(&chapter.title)
        ));
    }
    out.push_str("</ul>");
    out
}

fn render_explanation_page(explanation: &str) -> String {
    let body = html_escape(explanation).replace('\n', "</p><p>");

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("  <meta charset=\"utf-8\">\n");
    out.push_str("  <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    out.push_str("  <title>Explanation</title>\n");
    out.push_str("  <style>\n");
    out.push_str("    html { color-scheme: dark; }\n");
    out.push_str(
        "    body { background:#1a1a1d; color:#c5c6c7; font-family:'Lato',sans-serif; padding:2rem; display:flex; justify-content:center; align-items:center; min-height:100vh; }\n",
    );
    out.push_str(
        "    .card { background:#25282d; border-left:5px solid #c9b037; border-radius:8px; padding:2rem; max-width:800px; box-shadow:0 10px 25px rgba(0,0,0,0.2); }\n",
    );
    out.push_str("    .card p { text-indent:2em; margin:0 0 1em 0; }\n");
    out.push_str("  </style>\n</head>\n<body>\n");
    out.push_str(&format!("  <div class=\"card\">\n    <p>{body}</p>\n  </div>\n"));
    out.push_str("</body>\n</html>\n");
    out
}

fn render_book_page(display_title: &str, toc_html: &str, main_content: &str) -> String {
    let title = html_escape(display_title);

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("  <meta charset=\"utf-8\">\n");
    out.push_str("  <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    out.push_str(&format!("  <title>{title}</title>\n"));
    out.push_str("  <style>\n");
    out.push_str("    html { color-scheme: dark; }\n");
    out.push_str(
        "    body { background:#121212; color:#e0e0e0; font-family:'Merriweather',Georgia,serif; font-size:20px; line-height:1.7; padding:3rem 2rem; max-width:800px; margin:auto; }\n",
    );
    out.push_str(
        "    .main-title { font-size:3.5rem; color:#d4af37; text-align:center; margin-bottom:4rem; text-shadow:2px 2px 4px #000; }\n",
    );
    out.push_str(
        "    .chapter-title { font-size:2.5rem; color:#d4af37; text-align:center; margin-top:3rem; margin-bottom:2rem; text-shadow:1px 1px 3px #000; scroll-margin-top:2rem; }\n",
    );
    out.push_str(
        "    .paragraph-container { display:flex; align-items:flex-start; gap:1rem; margin-bottom:1rem; }\n",
    );
    out.push_str("    .paragraph-container p { text-indent:2em; margin:0; flex-grow:1; }\n");
    out.push_str(
        "    .explain-button { flex-shrink:0; margin-left:auto; background:transparent; color:#555; border:1px solid #444; border-radius:50%; width:28px; height:28px; display:flex; align-items:center; justify-content:center; font-size:1rem; font-weight:700; text-decoration:none; cursor:pointer; margin-top:4px; }\n",
    );
    out.push_str(
        "    .explain-button:hover { background:#c9b037; color:#121212; border-color:#f6e27a; }\n",
    );
    out.push_str("    .image-container { margin:2.5em 0; }\n");
    out.push_str(
        "    img { max-width:100%; height:auto; border-radius:8px; display:block; margin:auto; }\n",
    );
    out.push_str(
        "    #toc-toggle-btn { position:fixed; top:20px; right:20px; z-index:1001; padding:10px 15px; font-weight:bold; background:#d4af37; color:#121212; border:none; border-radius:8px; cursor:pointer; }\n",
    );
    out.push_str(
        "    #toc-sidebar { display:none; position:fixed; top:80px; right:20px; width:220px; background:#1e1e1e; padding:1.5rem; border-radius:8px; border:1px solid #444; z-index:1000; }\n",
    );
    out.push_str(
        "    #toc-sidebar h3 { margin-top:0; font-size:1.2rem; color:#d4af37; border-bottom:1px solid #555; padding-bottom:0.5rem; }\n",
    );
    out.push_str(
        "    #toc-sidebar ul { list-style:none; padding-left:0; margin-bottom:0; max-height:60vh; overflow-y:auto; }\n",
    );
    out.push_str("    #toc-sidebar li { margin-bottom:0.75em; }\n");
    out.push_str("    #toc-sidebar a { color:#c5c6c7; text-decoration:none; font-size:0.9rem; }\n");
    out.push_str("    #toc-sidebar a:hover { color:#f6e27a; }\n");
    out.push_str("  </style>\n</head>\n<body>\n");
    out.push_str("  <button id=\"toc-toggle-btn\" aria-expanded=\"false\">Contents</button>\n");
    out.push_str(&format!("  <div id=\"toc-sidebar\">{toc_html}</div>\n\n"));
    out.push_str(&format!("  <h1 class=\"main-title\">{title}</h1>\n\n"));
    out.push_str(main_content);
    out.push_str("\n  <script>\n");
    out.push_str("    document.getElementById('toc-toggle-btn').addEventListener('click', () => {\n");
    out.push_str("      const toc = document.getElementById('toc-sidebar');\n");
    out.push_str("      const btn = document.getElementById('toc-toggle-btn');\n");
    out.push_str("      const isVisible = toc.style.display === 'block';\n");
    out.push_str("      toc.style.display = isVisible ? 'none' : 'block';\n");
    out.push_str("      btn.setAttribute('aria-expanded', !isVisible);\n");
    out.push_str("    });\n");
    out.push_str("  </script>\n</body>\n</html>\n");
    out
}
