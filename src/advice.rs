//! Driver-bit advice keyed by detected class label.
//!
//! The table is static and the lookup is total: any label that is not one of
//! the known screw-head classes resolves to [`UNKNOWN`].

use serde::Serialize;

/// Display and recommendation data for one screw-head class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AdviceEntry {
    pub title: &'static str,
    pub recommendation: &'static str,
    /// Card colour as `#rrggbb`.
    pub color: &'static str,
    /// Safety warning. Empty when there is nothing to warn about.
    pub warning: &'static str,
}

impl AdviceEntry {
    pub fn has_warning(&self) -> bool {
        !self.warning.is_empty()
    }

    /// Card colour as RGB. Malformed colours fall back to the default entry's grey.
    pub fn rgb(&self) -> [u8; 3] {
        parse_hex_color(self.color)
            .or_else(|| parse_hex_color(UNKNOWN.color))
            .unwrap_or([127, 140, 141])
    }
}

/// Fallback for labels the table does not know.
pub const UNKNOWN: AdviceEntry = AdviceEntry {
    title: "Bilinmeyen",
    recommendation: "Lütfen tekrar deneyin",
    color: "#7f8c8d",
    warning: "",
};

const TABLE: &[(&str, AdviceEntry)] = &[
    (
        "T",
        AdviceEntry {
            title: "TORX (YILDIZ)",
            recommendation: "T-Serisi Uç (T10-T30)",
            color: "#3498db",
            warning: "Alyan anahtarı zorlamayın.",
        },
    ),
    (
        "PH",
        AdviceEntry {
            title: "PHILLIPS",
            recommendation: "PH Uç (PH1, PH2)",
            color: "#9b59b6",
            warning: "Kesinlikle PZ uç kullanmayın.",
        },
    ),
    (
        "PZ",
        AdviceEntry {
            title: "POZIDRIV",
            recommendation: "PZ Uç (PZ1, PZ2)",
            color: "#2ecc71",
            warning: "Yıldızın arasındaki ince çentiklere dikkat edin.",
        },
    ),
    (
        "H",
        AdviceEntry {
            title: "HEX (ALYAN)",
            recommendation: "Alyan Anahtar (Hex Key)",
            color: "#e74c3c",
            warning: "Köşeleri yuvarlanmış anahtar kullanmayın.",
        },
    ),
    (
        "SL",
        AdviceEntry {
            title: "DUZ (SLOTTED)",
            recommendation: "Düz Tornavida",
            color: "#e67e22",
            warning: "Ucu vida yarığına tam oturtun.",
        },
    ),
    (
        "Reference",
        AdviceEntry {
            title: "REFERANS NESNE",
            recommendation: "Ölçeklendirme",
            color: "#95a5a6",
            warning: "",
        },
    ),
];

/// Look up the advice for a class label by exact match.
pub fn advice_for(label: &str) -> &'static AdviceEntry {
    TABLE
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, entry)| entry)
        .unwrap_or(&UNKNOWN)
}

/// Labels with a dedicated table entry.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(key, _)| *key)
}

fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
