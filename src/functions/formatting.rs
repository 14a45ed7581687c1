//! Status template rendering.
//!
//! Templates use `{field}` placeholders; `{{` and `}}` are literal braces.
//! Templates are validated once at startup so rendering cannot fail.

use crate::error::FormatError;
use crate::services::source::{PlaybackState, SourceSnapshot};
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("Invalid regex"));

/// Glyphs used for `{status}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlyphSet {
    #[default]
    Ascii,
    Unicode,
}

impl GlyphSet {
    pub fn from_unicode_flag(unicode: bool) -> Self {
        if unicode {
            GlyphSet::Unicode
        } else {
            GlyphSet::Ascii
        }
    }

    #[inline]
    pub fn glyph(self, state: &PlaybackState) -> &str {
        match (self, state) {
            (GlyphSet::Ascii, PlaybackState::Playing) => "> ",
            (GlyphSet::Ascii, PlaybackState::Paused) => "|| ",
            (GlyphSet::Ascii, PlaybackState::Idle) => "# ",
            (GlyphSet::Ascii, PlaybackState::Buffering) => "8 ",
            (GlyphSet::Unicode, PlaybackState::Playing) => "▶️  ",
            (GlyphSet::Unicode, PlaybackState::Paused) => "⏸️  ",
            (GlyphSet::Unicode, PlaybackState::Idle) => "⏹️  ",
            (GlyphSet::Unicode, PlaybackState::Buffering) => "⌛ ",
            (_, PlaybackState::Unknown) => "",
            (_, PlaybackState::Other(raw)) => raw,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    App,
    Album,
    Artist,
    Title,
    Status,
}

impl Field {
    fn from_name(name: &str) -> Result<Self, FormatError> {
        // `{p.name}` is accepted as an alias of `{name}`
        let key = name.strip_prefix("p.").unwrap_or(name);
        match key {
            "name" => Ok(Field::Name),
            "app" => Ok(Field::App),
            "album" => Ok(Field::Album),
            "artist" => Ok(Field::Artist),
            "title" => Ok(Field::Title),
            "status" => Ok(Field::Status),
            _ => Err(FormatError::UnknownPlaceholder(name.to_string())),
        }
    }

    fn value<'a>(self, snapshot: &'a SourceSnapshot, glyphs: GlyphSet) -> &'a str {
        match self {
            Field::Name => &snapshot.name,
            Field::App => &snapshot.app,
            Field::Album => &snapshot.album,
            Field::Artist => &snapshot.artist,
            Field::Title => &snapshot.title,
            Field::Status => glyphs.glyph(&snapshot.state),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Template {
    /// Joins whichever of name, app, artist and title are non-empty:
    /// `name : app | artist - title`.
    Adaptive,
    Fixed(Vec<Segment>),
}

impl Template {
    /// `None` selects the adaptive template.
    pub fn from_option(format: Option<&str>) -> Result<Self, FormatError> {
        match format {
            Some(format) => Self::parse(format),
            None => Ok(Template::Adaptive),
        }
    }

    pub fn parse(format: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN_RE.captures_iter(format) {
            let token = caps.get_match();
            literal.push_str(&format[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => return Err(FormatError::UnbalancedBrace(token.start())),
                _ => {
                    let name = caps.get(1).map_or("", |m| m.as_str()).trim();
                    let field = Field::from_name(name)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
            }
        }

        literal.push_str(&format[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template::Fixed(segments))
    }

    pub fn render(&self, snapshot: &SourceSnapshot, glyphs: GlyphSet) -> String {
        match self {
            Template::Adaptive => render_adaptive(snapshot),
            Template::Fixed(segments) => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        Segment::Field(field) => out.push_str(field.value(snapshot, glyphs)),
                    }
                }
                out
            }
        }
    }
}

fn render_adaptive(snapshot: &SourceSnapshot) -> String {
    let parts = [
        ("", snapshot.name.as_str()),
        (" : ", snapshot.app.as_str()),
        (" | ", snapshot.artist.as_str()),
        (" - ", snapshot.title.as_str()),
    ];

    let mut out = String::new();
    for (separator, value) in parts {
        if value.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(value);
    }
    out
}
