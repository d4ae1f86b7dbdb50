use serde::{Deserialize, Serialize};
use std::fmt;

/// Third-party databases whose identifiers are portable across server installations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ExternalIdKind {
    Imdb,
    Tmdb,
    Tvdb,
}

impl ExternalIdKind {
    /// Order in which a record's IDs are tried against a resolution index.
    /// IMDB is the most consistent across installations, so it goes first.
    pub const RESOLUTION_ORDER: [ExternalIdKind; 3] =
        [ExternalIdKind::Imdb, ExternalIdKind::Tmdb, ExternalIdKind::Tvdb];

    /// Key used by the server in its `ProviderIds` map
    pub fn provider_key(&self) -> &'static str {
        match self {
            ExternalIdKind::Imdb => "Imdb",
            ExternalIdKind::Tmdb => "Tmdb",
            ExternalIdKind::Tvdb => "Tvdb",
        }
    }

    /// Match a `ProviderIds` key, ignoring case. Unknown providers return None.
    pub fn from_provider_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "imdb" => Some(ExternalIdKind::Imdb),
            "tmdb" => Some(ExternalIdKind::Tmdb),
            "tvdb" => Some(ExternalIdKind::Tvdb),
            _ => None,
        }
    }
}

impl fmt::Display for ExternalIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalIdKind::Imdb => write!(f, "imdb"),
            ExternalIdKind::Tmdb => write!(f, "tmdb"),
            ExternalIdKind::Tvdb => write!(f, "tvdb"),
        }
    }
}

/// External identifiers of one media item. Any subset may be absent.
///
/// Blank values are treated the same as missing ones, both when set through
/// [`ExternalIds::set`] and when read back through [`ExternalIds::get`], so a
/// hand-edited backup with `"imdb": ""` still counts as having no IMDB ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<String>,
}

impl ExternalIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server `ProviderIds` map; unknown providers are ignored.
    pub fn from_provider_ids<'a, I>(provider_ids: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ids = Self::new();
        for (key, value) in provider_ids {
            if let Some(kind) = ExternalIdKind::from_provider_key(key) {
                ids.set(kind, value);
            }
        }
        ids
    }

    pub fn with(mut self, kind: ExternalIdKind, value: &str) -> Self {
        self.set(kind, value);
        self
    }

    /// Set an ID, trimming it. A blank value clears the slot.
    pub fn set(&mut self, kind: ExternalIdKind, value: &str) {
        let value = value.trim();
        let value = if value.is_empty() { None } else { Some(value.to_string()) };
        match kind {
            ExternalIdKind::Imdb => self.imdb = value,
            ExternalIdKind::Tmdb => self.tmdb = value,
            ExternalIdKind::Tvdb => self.tvdb = value,
        }
    }

    pub fn get(&self, kind: ExternalIdKind) -> Option<&str> {
        let slot = match kind {
            ExternalIdKind::Imdb => &self.imdb,
            ExternalIdKind::Tmdb => &self.tmdb,
            ExternalIdKind::Tvdb => &self.tvdb,
        };
        slot.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn has(&self, kind: ExternalIdKind) -> bool {
        self.get(kind).is_some()
    }

    /// Present IDs in resolution order (IMDB, TMDB, TVDB)
    pub fn iter(&self) -> impl Iterator<Item = (ExternalIdKind, &str)> + '_ {
        ExternalIdKind::RESOLUTION_ORDER
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|value| (kind, value)))
    }

    /// Check if all ID fields are empty
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl fmt::Display for ExternalIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<no external ids>");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(kind, value)| format!("{}:{}", kind, value))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
