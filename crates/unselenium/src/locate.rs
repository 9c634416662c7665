//! Chrome binary discovery
//!
//! Best-effort heuristics per platform. Callers that need a specific build
//! should set `Config::chrome_path` instead.

use std::path::PathBuf;

/// Find an installed Chrome/Chromium binary, if any.
#[cfg(not(windows))]
pub fn find_chrome() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "google-chrome",
        "chromium",
        "chromium-browser",
        "chrome",
        "google-chrome-stable",
    ];

    CANDIDATES.iter().find_map(|name| which::which(name).ok())
}

/// Find an installed Chrome binary under the usual install roots, if any.
#[cfg(windows)]
pub fn find_chrome() -> Option<PathBuf> {
    const ROOTS: &[&str] = &[
        "PROGRAMFILES",
        "PROGRAMFILES(X86)",
        "LOCALAPPDATA",
        "PROGRAMW6432",
    ];
    const SUBPATHS: &[&str] = &[
        "Google/Chrome/Application/chrome.exe",
        "Google/Chrome Beta/Application/chrome.exe",
        "Google/Chrome Canary/Application/chrome.exe",
    ];

    for root in ROOTS {
        let Ok(base) = std::env::var(root) else {
            continue;
        };
        for sub in SUBPATHS {
            let candidate = PathBuf::from(&base).join(sub);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}
