// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename classification

use std::path::Path;

/// Lowercase substrings that mark a screenshot, across languages.
/// Each entry must already be lowercase.
pub const SCREENSHOT_KEYWORDS: &[&str] = &[
    "screenshot",
    "screen_shot",
    "screen-shot",
    "screen shot",
    "スクリーンショット",
    "截屏",
    "截图",
    "屏幕快照",
    "螢幕擷取畫面",
    "captura",
    "bildschirmfoto",
    "capture d’écran",
    "capture d'écran",
    "schermafbeelding",
    "skärmbild",
    "снимок экрана",
    "스크린샷",
    "istantanea schermo",
];

/// Outcome of classifying a filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Screenshot,
    Ignore,
}

impl Classification {
    pub fn is_screenshot(self) -> bool {
        self == Self::Screenshot
    }
}

/// Classify a bare filename by keyword containment
pub fn classify(filename: &str) -> Classification {
    let lower = filename.to_lowercase();
    if SCREENSHOT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Classification::Screenshot
    } else {
        Classification::Ignore
    }
}

/// Check the file extension against an allow-list (empty list allows all)
pub fn is_image(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
    }
}
