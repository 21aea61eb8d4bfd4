//! Selectable assets, devices and states, plus the quick-select presets
//! offered next to the multi-select lists.

use std::collections::BTreeSet;

use serde::Serialize;

pub const ASSETS: &[&str] = &[
    "LIVE | NBA Basketball | Toronto vs Michigan",
    "LIVE | Ashes Tour | Australia vs England Secnd Test",
    "LIVE | NFC | Semi Final",
    "RECORDED | UEFA Championship | Liverpool vs Manu",
    "LIVE | Sports News",
    "RECORDED | WWE | Smackdown",
    "LIVE | Live Debate | Economy Analysis",
];

pub const DEVICES: &[&str] = &[
    "MobileAndroid",
    "SamsungTV",
    "Browser",
    "App",
    "PS",
    "Xbox",
    "AppleTV",
    "FireTV",
    "Chromecast",
    "iPad",
    "iPhone",
    "RokuTV",
    "AndroidTV",
    "Others",
    "Unknown",
];

pub const STATES: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

/// Full name for a two-letter state code.
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssetPreset {
    All,
    #[default]
    Live,
    Recorded,
}

impl AssetPreset {
    pub fn resolve(self) -> BTreeSet<String> {
        ASSETS
            .iter()
            .filter(|asset| match self {
                AssetPreset::All => true,
                AssetPreset::Live => asset.contains("LIVE"),
                AssetPreset::Recorded => asset.contains("RECORDED"),
            })
            .map(|asset| asset.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreset {
    All,
    Tv,
    #[default]
    Other,
}

impl DevicePreset {
    pub fn resolve(self) -> BTreeSet<String> {
        DEVICES
            .iter()
            .filter(|device| match self {
                DevicePreset::All => true,
                DevicePreset::Tv => device.contains("TV"),
                DevicePreset::Other => !device.contains("TV"),
            })
            .map(|device| device.to_string())
            .collect()
    }
}
