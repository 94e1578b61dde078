// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTML views.
//!
//! Every page shares one layout: a header with the "React Meetups" logo and
//! the two navigation links, a `<main>` body, and the page props embedded
//! as JSON for client-side hydration.

use std::borrow::Cow;
use std::fmt::Write;

use quick_xml::escape::escape;
use serde::Serialize;

use crate::{ListingProps, MeetupDetailProps, PageError, RenderedPage};

const SITE_NAME: &str = "React Meetups";
const LISTING_DESCRIPTION: &str = "Browse a huge list of highly active React meetups";

/// Route of the listing page.
pub const LISTING_PATH: &str = "/";
/// Route of the new-meetup form.
pub const NEW_MEETUP_PATH: &str = "/new-meetup";
/// Endpoint the form submits to.
pub const CREATE_ENDPOINT: &str = "/api/new-meetup";

fn esc(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// Serialize props for a `<script type="application/json">` block.
///
/// `<` is escaped so a value can never close the script element.
fn embed_props<P: Serialize>(props: &P) -> Result<String, PageError> {
    let json = serde_json::to_string(props)?;
    Ok(json.replace('<', "\\u003c"))
}

fn layout(title: &str, description: &str, body: &str, data: Option<&str>) -> String {
    let mut html = String::with_capacity(body.len() + 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", esc(title));
    let _ = writeln!(
        html,
        "<meta name=\"description\" content=\"{}\">",
        esc(description)
    );
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(
        html,
        "<header class=\"header\">\
         <div class=\"logo\">{SITE_NAME}</div>\
         <nav><ul>\
         <li><a href=\"{LISTING_PATH}\">All Meetups</a></li>\
         <li><a href=\"{NEW_MEETUP_PATH}\">Add New Meetup</a></li>\
         </ul></nav></header>"
    );
    html.push_str("<main>\n");
    html.push_str(body);
    html.push_str("</main>\n");
    if let Some(data) = data {
        let _ = writeln!(
            html,
            "<script id=\"__PAGE_DATA__\" type=\"application/json\">{data}</script>"
        );
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// The listing page: one card per meetup.
pub fn listing_page(props: &ListingProps) -> Result<RenderedPage, PageError> {
    let mut body = String::new();
    body.push_str("<ul class=\"meetup-list\">\n");
    for meetup in &props.meetups {
        let _ = writeln!(
            body,
            "<li class=\"meetup-item\"><div class=\"card\">\
             <div class=\"image\"><img src=\"{image}\" alt=\"{title}\"></div>\
             <div class=\"content\"><h3>{title}</h3><address>{address}</address></div>\
             <div class=\"actions\"><a href=\"/{id}\">Show Details</a></div>\
             </div></li>",
            image = esc(&meetup.image),
            title = esc(&meetup.title),
            address = esc(&meetup.address),
            id = esc(&meetup.id),
        );
    }
    body.push_str("</ul>\n");

    let data = embed_props(props)?;
    let html = layout(SITE_NAME, LISTING_DESCRIPTION, &body, Some(&data));
    RenderedPage::new(props, html)
}

/// The detail page of a single meetup.
pub fn detail_page(props: &MeetupDetailProps) -> Result<RenderedPage, PageError> {
    let body = format!(
        "<section class=\"detail\">\
         <img src=\"{image}\" alt=\"{title}\">\
         <h1>{title}</h1>\
         <address>{address}</address>\
         <p>{description}</p>\
         </section>\n",
        image = esc(&props.image),
        title = esc(&props.title),
        address = esc(&props.address),
        description = esc(&props.description),
    );

    let data = embed_props(props)?;
    let html = layout(&props.title, &props.description, &body, Some(&data));
    RenderedPage::new(props, html)
}

/// The form for adding a meetup.
///
/// Submits JSON to [`CREATE_ENDPOINT`] and returns to the listing.
pub fn new_meetup_page() -> String {
    let body = format!(
        "<section class=\"card\">\
         <form id=\"new-meetup-form\" class=\"form\">\
         <div class=\"control\"><label for=\"title\">Meetup Title</label>\
         <input type=\"text\" required id=\"title\" name=\"title\"></div>\
         <div class=\"control\"><label for=\"image\">Meetup Image</label>\
         <input type=\"url\" required id=\"image\" name=\"image\"></div>\
         <div class=\"control\"><label for=\"address\">Address</label>\
         <input type=\"text\" required id=\"address\" name=\"address\"></div>\
         <div class=\"control\"><label for=\"description\">Description</label>\
         <textarea id=\"description\" name=\"description\" required rows=\"5\"></textarea></div>\
         <div class=\"actions\"><button>Add Meetup</button></div>\
         </form></section>\n\
         <script>\n\
         document.getElementById('new-meetup-form').addEventListener('submit', async (event) => {{\n\
         \x20 event.preventDefault();\n\
         \x20 const form = new FormData(event.target);\n\
         \x20 const response = await fetch('{CREATE_ENDPOINT}', {{\n\
         \x20   method: 'POST',\n\
         \x20   headers: {{ 'Content-Type': 'application/json' }},\n\
         \x20   body: JSON.stringify(Object.fromEntries(form.entries())),\n\
         \x20 }});\n\
         \x20 if (response.ok) {{ window.location.href = '{LISTING_PATH}'; }}\n\
         }});\n\
         </script>\n"
    );
    layout(
        "Add a New Meetup",
        "Add your own meetups and create amazing networking opportunities",
        &body,
        None,
    )
}

/// The standard not-found page.
pub fn not_found_page() -> String {
    layout(
        "404 - Page not found",
        "Page not found",
        "<section class=\"not-found\"><h1>404 - Page not found</h1></section>\n",
        None,
    )
}

/// A generic failure page. The message is shown as plain text.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<section class=\"error\"><h1>Something went wrong</h1><p>{}</p></section>\n",
        esc(message)
    );
    layout("Error", "Something went wrong", &body, None)
}
