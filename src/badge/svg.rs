// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Flat SVG badge rendering.
//!
//! Segment widths are estimated from character count, since no font metrics
//! are available. Good enough for short labels and values.

use crate::badge::BadgeColor;

const CHAR_WIDTH: usize = 7;
const PADDING: usize = 10;
const LABEL_FILL: &str = "#555";

/// Render label/value pair as flat badge.
pub fn render(label: &str, value: &str, color: BadgeColor) -> String {
    let label_width = segment_width(label);
    let value_width = segment_width(value);
    let total_width = label_width + value_width;
    let label_x = label_width / 2;
    let value_x = label_width + value_width / 2;
    let label = escape(label);
    let value = escape(value);
    let fill = color.hex();

    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{total_width}" height="20" role="img" aria-label="{label}: {value}">"##,
            r##"<title>{label}: {value}</title>"##,
            r##"<linearGradient id="s" x2="0" y2="100%"><stop offset="0" stop-color="#bbb" stop-opacity=".1"/><stop offset="1" stop-opacity=".1"/></linearGradient>"##,
            r##"<clipPath id="r"><rect width="{total_width}" height="20" rx="3" fill="#fff"/></clipPath>"##,
            r##"<g clip-path="url(#r)"><rect width="{label_width}" height="20" fill="{label_fill}"/><rect x="{label_width}" width="{value_width}" height="20" fill="{fill}"/><rect width="{total_width}" height="20" fill="url(#s)"/></g>"##,
            r##"<g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="11">"##,
            r##"<text x="{label_x}" y="14">{label}</text><text x="{value_x}" y="14">{value}</text></g>"##,
            "</svg>\n",
        ),
        total_width = total_width,
        label_width = label_width,
        value_width = value_width,
        label_x = label_x,
        value_x = value_x,
        label = label,
        value = value,
        label_fill = LABEL_FILL,
        fill = fill,
    )
}

fn segment_width(text: &str) -> usize {
    text.chars().count() * CHAR_WIDTH + PADDING
}

fn escape(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut out, ch| {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                _ => out.push(ch),
            }
            out
        })
}
