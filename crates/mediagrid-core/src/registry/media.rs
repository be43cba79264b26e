//! Well-known media types.

use uuid::{uuid, Uuid};

/// Media types the cluster can carry, with their registry uuids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Empty,
    Flv,
    Ogg,
    MpegTs,
    RtpMpegTs,
    Auto,
}

impl MediaKind {
    pub const ALL: [MediaKind; 6] = [
        MediaKind::Empty,
        MediaKind::Flv,
        MediaKind::Ogg,
        MediaKind::MpegTs,
        MediaKind::RtpMpegTs,
        MediaKind::Auto,
    ];

    pub fn id(&self) -> Uuid {
        match self {
            MediaKind::Empty => uuid!("0d3729a5-a5b4-4c6e-9c14-8e62937eb464"),
            MediaKind::Flv => uuid!("84e969d5-2c0f-4b88-9a0f-01e55e04f0c7"),
            MediaKind::Ogg => uuid!("2c00925f-1c47-4e2a-a45e-bd1b9e79c1a1"),
            MediaKind::MpegTs => uuid!("ab9e1b41-90a5-4f4e-89f0-4a52cf9b8f3d"),
            MediaKind::RtpMpegTs => uuid!("6a7dff0b-9c2e-4a1d-8f33-7b1e0acb5a34"),
            MediaKind::Auto => uuid!("d2164ee5-4c4f-46ab-9f2e-0ce0021fa15b"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Empty => "empty",
            MediaKind::Flv => "flv",
            MediaKind::Ogg => "ogg",
            MediaKind::MpegTs => "mpegts",
            MediaKind::RtpMpegTs => "rtp-mpegts",
            MediaKind::Auto => "auto",
        }
    }

    pub fn from_id(id: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
