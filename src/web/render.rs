//! 页面渲染
//!
//! 单页问卷：用户名输入、逐题对比图与 Left / Right 单选、提交按钮

use std::fmt::Write;

use crate::error::ValidationError;
use crate::models::{Answer, Catalog, Choice, ResponseDraft, ResponseRow};
use crate::services::{CsvExport, FallbackReason};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1200px; padding: 1.5rem; }
.notice { padding: .75rem 1rem; border-radius: .4rem; margin: 1rem 0; }
.error { background: #fde8e8; color: #8a1c1c; }
.info { background: #e8f0fd; color: #1c3f8a; }
.success { background: #e6f6ea; color: #1c6b34; }
.question { border-bottom: 1px solid #ddd; padding: 1rem 0; }
.question.missing h4 { color: #8a1c1c; }
.question img { width: 100%; height: auto; }
.choices label { margin-right: 1.5rem; }
#busy { display: none; margin-left: 1rem; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: .3rem .6rem; }
"#;

const INSTRUCTIONS: &str = r#"
<h3>Instructions</h3>
<ol>
<li>Enter your <strong>User Name</strong>.</li>
<li>For each question, compare the <strong>Left</strong> and <strong>Right</strong> images.</li>
<li>Choose the one that you perceive as <strong>sharper</strong>.</li>
<li>Click <strong>Submit</strong> at the bottom when you are finished.</li>
</ol>
<hr>
"#;

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// URL 路径段编码（图片文件名可能含空格等字符）
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
<h1>📸 {title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn notice(kind: &str, message: &str) -> String {
    format!(
        "<div class=\"notice {}\">{}</div>\n",
        kind,
        escape_html(message)
    )
}

/// 用户名输入页
pub fn landing(title: &str, catalog_error: Option<&str>, prompt_name: bool) -> String {
    let mut body = String::from(INSTRUCTIONS);
    if let Some(err) = catalog_error {
        body.push_str(&notice("error", err));
    }
    body.push_str(
        "<form method=\"get\" action=\"/\">\n\
<label for=\"user\">Step 1: Enter your name or ID</label><br>\n\
<input id=\"user\" name=\"user\" type=\"text\" placeholder=\"e.g., Guest_01\" autofocus>\n\
<button type=\"submit\">Start</button>\n</form>\n",
    );
    if prompt_name {
        body.push_str(&notice("info", "Please enter your name to start the survey."));
    }
    page(title, &body)
}

/// 问卷主体
///
/// 按目录顺序一次性渲染所有题目；已作答的选项保持选中，未作答的不预选
pub fn survey_form(
    title: &str,
    catalog: &Catalog,
    token: &str,
    draft: &ResponseDraft,
    error: Option<&ValidationError>,
) -> String {
    let missing: Vec<&str> = match error {
        Some(ValidationError::Incomplete { unanswered, .. }) => {
            unanswered.iter().map(String::as_str).collect()
        }
        Some(ValidationError::InvalidChoice { question, .. }) => vec![question.as_str()],
        _ => Vec::new(),
    };

    let mut body = String::from(INSTRUCTIONS);
    if let Some(err) = error {
        body.push_str(&notice("error", &err.to_string()));
    }

    let _ = write!(
        body,
        "<form method=\"post\" action=\"/submit\" \
onsubmit=\"document.getElementById('submit').disabled=true;document.getElementById('busy').style.display='inline';\">\n\
<input type=\"hidden\" name=\"token\" value=\"{}\">\n\
<label for=\"user\">Step 1: Enter your name or ID</label><br>\n\
<input id=\"user\" name=\"user\" type=\"text\" value=\"{}\" placeholder=\"e.g., Guest_01\">\n",
        escape_html(token),
        escape_html(draft.participant()),
    );

    for img in catalog.images() {
        let id = escape_html(&img.identifier);
        let class = if missing.contains(&img.identifier.as_str()) {
            "question missing"
        } else {
            "question"
        };
        let _ = write!(
            body,
            "<div class=\"{class}\">\n<h4>Question: {id}</h4>\n\
<img src=\"/images/{src}\" alt=\"{id}: left vs right\">\n\
<p>Which image is sharper in {id}?</p>\n<div class=\"choices\">\n",
            src = encode_path_segment(&img.file_name),
        );
        let current = draft.answer(&img.identifier);
        for choice in Choice::ALL {
            let checked = if current == Answer::Chosen(choice) {
                " checked"
            } else {
                ""
            };
            let _ = write!(
                body,
                "<label><input type=\"radio\" name=\"q_{id}\" value=\"{value}\"{checked}> {value}</label>\n",
                value = choice.as_str(),
            );
        }
        body.push_str("</div>\n</div>\n");
    }

    body.push_str(
        "<p><button id=\"submit\" type=\"submit\">Submit All Answers</button>\
<span id=\"busy\">⏳ Saving your answers…</span></p>\n</form>\n",
    );
    page(title, &body)
}

fn summary_table(row: &ResponseRow) -> String {
    let mut html = String::from("<table>\n<tr>");
    for column in row.columns() {
        let _ = write!(html, "<th>{}</th>", escape_html(&column));
    }
    html.push_str("</tr>\n<tr>");
    for value in row.values() {
        let _ = write!(html, "<td>{}</td>", escape_html(&value));
    }
    html.push_str("</tr>\n</table>\n");
    html
}

/// 写入成功
pub fn thank_you(title: &str, row: &ResponseRow) -> String {
    let mut body = notice(
        "success",
        &format!(
            "Thank you, {}! Your responses have been recorded.",
            row.participant()
        ),
    );
    body.push_str(&summary_table(row));
    page(title, &body)
}

/// 写入失败，提供 CSV 下载
///
/// `export` 为 `None` 时只能展示结果表格，请参与者截图或抄写
pub fn fallback(
    title: &str,
    row: &ResponseRow,
    reason: FallbackReason,
    export: Option<&CsvExport>,
) -> String {
    let mut body = notice("error", reason.message());
    match export {
        Some(export) => {
            let _ = write!(
                body,
                "<p>Your answers were <strong>not</strong> lost. Please download the file below \
and send it to the researcher.</p>\n\
<p><a download=\"{name}\" href=\"{href}\">⬇️ Download {name}</a></p>\n",
                name = escape_html(export.file_name()),
                href = export.data_uri(),
            );
        }
        None => body.push_str(
            "<p>Please take a screenshot of the table below and send it to the researcher.</p>\n",
        ),
    }
    body.push_str(&summary_table(row));
    page(title, &body)
}

/// 本会话已提交
pub fn already_submitted(title: &str) -> String {
    let mut body = notice("info", &ValidationError::AlreadySubmitted.to_string());
    body.push_str("<p><a href=\"/\">Start a new response</a></p>\n");
    page(title, &body)
}
