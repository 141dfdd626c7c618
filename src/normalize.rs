// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! URL canonicalization for matching submitted URLs against the catalog.
//!
//! The result is only used for equality against `Link::url_normalized`.
//! Query strings, fragments and percent-encoding are left untouched, so
//! `example.com/a?x=1` and `example.com/a` do not match.

/// Lowercase, trim, drop a leading `http://` or `https://` and any trailing
/// slashes.
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    without_scheme.trim_end_matches('/').to_string()
}
