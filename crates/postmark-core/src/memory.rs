//! Stored photo records and their tag encoding.
//!
//! The storage network only keeps opaque payloads plus a flat list of
//! name/value tags. A [`Memory`] is reconstructed from those tags; anything
//! not tagged with our application name is treated as not found.

use serde::{Deserialize, Serialize};

/// Well-known tag names.
pub mod tag_names {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const APP_NAME: &str = "App-Name";
    pub const APP_VERSION: &str = "App-Version";
    pub const TITLE: &str = "Title";
    pub const LOCATION: &str = "Location";
    pub const VISIBILITY: &str = "Visibility";
    pub const HANDLE: &str = "Handle";
    pub const UNIX_TIME: &str = "Unix-Time";
}

/// One name/value tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Look up the first tag with the given name.
pub fn find_tag<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.name == name)
        .map(|tag| tag.value.as_str())
}

/// Name and version stamped on every upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: "Postmark".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Visibility of a stored memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Unknown values fall back to public.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("private") {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

/// User-supplied data for a new upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub content_type: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub handle: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Seconds since the Unix epoch.
    pub unix_time: u64,
}

/// A stored photo record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Opaque id assigned by the storage network.
    pub id: String,
    pub content_type: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub handle: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    pub unix_time: Option<u64>,
    pub app_version: Option<String>,
}

impl Memory {
    /// Rebuild a memory from its tags.
    ///
    /// Returns `None` when the `App-Name` tag is missing or names a
    /// different application. Other missing tags fall back to defaults.
    pub fn from_tags(id: impl Into<String>, tags: &[Tag], app_name: &str) -> Option<Self> {
        if find_tag(tags, tag_names::APP_NAME)? != app_name {
            return None;
        }
        let text = |name: &str| {
            find_tag(tags, name)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            id: id.into(),
            content_type: text(tag_names::CONTENT_TYPE)
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            title: text(tag_names::TITLE),
            location: text(tag_names::LOCATION),
            handle: text(tag_names::HANDLE),
            visibility: find_tag(tags, tag_names::VISIBILITY)
                .map(Visibility::parse)
                .unwrap_or_default(),
            unix_time: find_tag(tags, tag_names::UNIX_TIME).and_then(|v| v.parse().ok()),
            app_version: text(tag_names::APP_VERSION),
        })
    }

    /// Memory for an upload that just completed.
    pub fn from_upload(
        id: impl Into<String>,
        metadata: &UploadMetadata,
        app: &AppIdentity,
    ) -> Self {
        Self {
            id: id.into(),
            content_type: metadata.content_type.clone(),
            title: metadata.title.clone().filter(|t| !t.is_empty()),
            location: metadata.location.clone().filter(|l| !l.is_empty()),
            handle: metadata.handle.clone().filter(|h| !h.is_empty()),
            visibility: metadata.visibility,
            unix_time: Some(metadata.unix_time),
            app_version: Some(app.version.clone()),
        }
    }

    /// Gateway URL serving this memory's payload.
    pub fn image_url(&self, origin: &str) -> String {
        format!("{}/{}", origin.trim_end_matches('/'), self.id)
    }

    /// Label shown under the photo.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// Format a Unix timestamp as a `YYYY-MM-DD` UTC date.
pub fn format_date(unix_time: u64) -> String {
    // Days-to-civil conversion on the proleptic Gregorian calendar.
    let days = (unix_time / 86_400) as i64 + 719_468;
    let era = days.div_euclid(146_097);
    let doe = days.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Tags attached to a new upload.
pub fn build_upload_tags(metadata: &UploadMetadata, app: &AppIdentity) -> Vec<Tag> {
    let mut tags = vec![
        Tag::new(tag_names::CONTENT_TYPE, &metadata.content_type),
        Tag::new(tag_names::APP_NAME, &app.name),
        Tag::new(tag_names::APP_VERSION, &app.version),
    ];
    let optional = [
        (tag_names::TITLE, &metadata.title),
        (tag_names::LOCATION, &metadata.location),
        (tag_names::HANDLE, &metadata.handle),
    ];
    for (name, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            tags.push(Tag::new(name, value));
        }
    }
    tags.push(Tag::new(tag_names::VISIBILITY, metadata.visibility.as_str()));
    tags.push(Tag::new(tag_names::UNIX_TIME, metadata.unix_time.to_string()));
    tags
}
