use crate::models::LicenseType;

/// Hand-maintained category table, keyed by canonical SPDX identifier.
///
/// `-only` / `-or-later` variants are folded onto their base identifier by
/// [`license_type`], so only base identifiers appear here.
pub const TYPE_TABLE: &[(&str, LicenseType)] = &[
    // Forbidden
    ("AGPL-1.0", LicenseType::Forbidden),
    ("AGPL-3.0", LicenseType::Forbidden),
    ("CC-BY-NC-1.0", LicenseType::Forbidden),
    ("CC-BY-NC-2.0", LicenseType::Forbidden),
    ("CC-BY-NC-2.5", LicenseType::Forbidden),
    ("CC-BY-NC-3.0", LicenseType::Forbidden),
    ("CC-BY-NC-4.0", LicenseType::Forbidden),
    ("CC-BY-NC-ND-4.0", LicenseType::Forbidden),
    ("CC-BY-NC-SA-4.0", LicenseType::Forbidden),
    ("Commons-Clause", LicenseType::Forbidden),
    ("Facebook-2-Clause", LicenseType::Forbidden),
    ("SSPL-1.0", LicenseType::Forbidden),
    ("WTFPL", LicenseType::Forbidden),
    // Restricted
    ("BCL", LicenseType::Restricted),
    ("CC-BY-ND-4.0", LicenseType::Restricted),
    ("CC-BY-SA-3.0", LicenseType::Restricted),
    ("CC-BY-SA-4.0", LicenseType::Restricted),
    ("GPL-1.0", LicenseType::Restricted),
    ("GPL-2.0", LicenseType::Restricted),
    ("GPL-3.0", LicenseType::Restricted),
    ("LGPL-2.0", LicenseType::Restricted),
    ("LGPL-2.1", LicenseType::Restricted),
    ("LGPL-3.0", LicenseType::Restricted),
    ("NPL-1.0", LicenseType::Restricted),
    ("NPL-1.1", LicenseType::Restricted),
    ("OSL-1.0", LicenseType::Restricted),
    ("OSL-2.0", LicenseType::Restricted),
    ("OSL-3.0", LicenseType::Restricted),
    ("QPL-1.0", LicenseType::Restricted),
    ("Sleepycat", LicenseType::Restricted),
    // Reciprocal
    ("APSL-2.0", LicenseType::Reciprocal),
    ("CDDL-1.0", LicenseType::Reciprocal),
    ("CDDL-1.1", LicenseType::Reciprocal),
    ("CPL-1.0", LicenseType::Reciprocal),
    ("EPL-1.0", LicenseType::Reciprocal),
    ("EPL-2.0", LicenseType::Reciprocal),
    ("EUPL-1.1", LicenseType::Reciprocal),
    ("EUPL-1.2", LicenseType::Reciprocal),
    ("IPL-1.0", LicenseType::Reciprocal),
    ("MPL-1.0", LicenseType::Reciprocal),
    ("MPL-1.1", LicenseType::Reciprocal),
    ("MPL-2.0", LicenseType::Reciprocal),
    ("Ruby", LicenseType::Reciprocal),
    // Notice
    ("AFL-3.0", LicenseType::Notice),
    ("Apache-1.0", LicenseType::Notice),
    ("Apache-1.1", LicenseType::Notice),
    ("Apache-2.0", LicenseType::Notice),
    ("Artistic-1.0", LicenseType::Notice),
    ("Artistic-2.0", LicenseType::Notice),
    ("BSD-1-Clause", LicenseType::Notice),
    ("BSD-2-Clause", LicenseType::Notice),
    ("BSD-3-Clause", LicenseType::Notice),
    ("BSD-4-Clause", LicenseType::Notice),
    ("BSL-1.0", LicenseType::Notice),
    ("CC-BY-3.0", LicenseType::Notice),
    ("CC-BY-4.0", LicenseType::Notice),
    ("FTL", LicenseType::Notice),
    ("ISC", LicenseType::Notice),
    ("Libpng", LicenseType::Notice),
    ("MIT", LicenseType::Notice),
    ("MS-PL", LicenseType::Notice),
    ("NCSA", LicenseType::Notice),
    ("OpenSSL", LicenseType::Notice),
    ("PHP-3.01", LicenseType::Notice),
    ("PSF-2.0", LicenseType::Notice),
    ("Python-2.0", LicenseType::Notice),
    ("Unicode-DFS-2016", LicenseType::Notice),
    ("Unicode-3.0", LicenseType::Notice),
    ("W3C", LicenseType::Notice),
    ("X11", LicenseType::Notice),
    ("Zlib", LicenseType::Notice),
    // Permissive
    ("BlueOak-1.0.0", LicenseType::Permissive),
    ("MIT-0", LicenseType::Permissive),
    ("Python-2.0.1", LicenseType::Permissive),
    // Unencumbered
    ("0BSD", LicenseType::Unencumbered),
    ("CC0-1.0", LicenseType::Unencumbered),
    ("Unlicense", LicenseType::Unencumbered),
];

/// Look up the [`LicenseType`] of a canonical SPDX identifier.
///
/// Identifiers missing from [`TYPE_TABLE`] are `Unknown`.
pub fn license_type(id: &str) -> LicenseType {
    let id = id.trim();
    let base = id
        .strip_suffix("-only")
        .or_else(|| id.strip_suffix("-or-later"))
        .or_else(|| id.strip_suffix('+'))
        .unwrap_or(id);

    TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, t)| *t)
        .unwrap_or(LicenseType::Unknown)
}

/// Map shorthand identifiers seen in `SPDX-License-Identifier` tags to
/// their SPDX form. Tags are split on whitespace, so only single tokens occur.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "Apache2" | "Apache-2" => "Apache-2.0".to_string(),
        "BSD" => "BSD-3-Clause".to_string(),
        "GPLv2" | "GPL2" => "GPL-2.0".to_string(),
        "GPLv3" | "GPL3" => "GPL-3.0".to_string(),
        "LGPLv2.1" => "LGPL-2.1".to_string(),
        "LGPLv3" => "LGPL-3.0".to_string(),
        "AGPLv3" => "AGPL-3.0".to_string(),
        "MPLv2" | "MPL2" => "MPL-2.0".to_string(),
        "CC0" => "CC0-1.0".to_string(),
        other => other.to_string(),
    }
}
