use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::license::spdx::{license_type, normalize};
use crate::models::LicenseFinding;

/// Confidence below which a detected license is discarded.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Identifies the license(s) contained in a file.
///
/// Implementations must be read-only so a single instance can serve every
/// lookup in a scan.
pub trait Classifier: Send + Sync {
    /// Returns at least one finding, or an error when nothing could be
    /// identified with enough confidence.
    fn identify(&self, path: &Path) -> Result<Vec<LicenseFinding>, ClassifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no license identified in {} with confidence >= {threshold}", path.display())]
    NoMatch { path: PathBuf, threshold: f64 },
}

/// Characteristic, whitespace-normalized, lowercase phrases of a license text.
struct Signature {
    id: &'static str,
    phrases: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        id: "MIT",
        phrases: &[
            "permission is hereby granted, free of charge",
            "the above copyright notice and this permission notice shall be included",
            "the software is provided \"as is\", without warranty of any kind",
        ],
    },
    Signature {
        id: "Apache-2.0",
        phrases: &[
            "apache license version 2.0, january 2004",
            "terms and conditions for use, reproduction, and distribution",
            "grant of copyright license",
            "grant of patent license",
        ],
    },
    Signature {
        id: "BSD-3-Clause",
        phrases: &[
            "redistribution and use in source and binary forms, with or without modification, are permitted",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
            "neither the name of",
        ],
    },
    Signature {
        id: "ISC",
        phrases: &[
            "permission to use, copy, modify, and/or distribute this software for any purpose with or without fee is hereby granted",
            "the software is provided \"as is\" and the author disclaims all warranties",
        ],
    },
    Signature {
        id: "Zlib",
        phrases: &[
            "this software is provided 'as-is', without any express or implied warranty",
            "the origin of this software must not be misrepresented",
            "altered source versions must be plainly marked as such",
        ],
    },
    Signature {
        id: "BSL-1.0",
        phrases: &[
            "boost software license - version 1.0",
            "permission is hereby granted, free of charge, to any person or organization",
        ],
    },
    Signature {
        id: "MPL-2.0",
        phrases: &[
            "mozilla public license version 2.0",
            "\"contributor\" means each individual or legal entity",
            "this source code form is subject to the terms of the mozilla public license",
        ],
    },
    Signature {
        id: "GPL-2.0",
        phrases: &[
            "gnu general public license version 2, june 1991",
            "the licenses for most software are designed to take away your freedom to share and change it",
        ],
    },
    Signature {
        id: "GPL-3.0",
        phrases: &[
            "gnu general public license version 3, 29 june 2007",
            "the gnu general public license is a free, copyleft license for software and other kinds of works",
        ],
    },
    Signature {
        id: "LGPL-2.1",
        phrases: &[
            "gnu lesser general public license version 2.1, february 1999",
            "this license, the lesser general public license, applies to some specially designated software packages",
        ],
    },
    Signature {
        id: "LGPL-3.0",
        phrases: &[
            "gnu lesser general public license version 3, 29 june 2007",
            "this version of the gnu lesser general public license incorporates the terms and conditions of version 3 of the gnu general public license",
        ],
    },
    Signature {
        id: "AGPL-3.0",
        phrases: &[
            "gnu affero general public license version 3, 19 november 2007",
            "the gnu affero general public license is a free, copyleft license for software and other kinds of works",
        ],
    },
    Signature {
        id: "Unlicense",
        phrases: &[
            "this is free and unencumbered software released into the public domain",
            "for more information, please refer to <http://unlicense.org",
        ],
    },
    Signature {
        id: "CC0-1.0",
        phrases: &[
            "creative commons legal code cc0 1.0 universal",
            "statement of purpose",
        ],
    },
];

fn spdx_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)SPDX-License-Identifier:[ \t]*(.+?)[ \t\r]*(?:\*/|-->)?[ \t\r]*$")
            .expect("static regex is valid")
    })
}

/// A small phrase-matching classifier.
///
/// Explicit `SPDX-License-Identifier:` tags are reported with confidence 1.0;
/// otherwise each known license scores the fraction of its characteristic
/// phrases present in the text.
pub struct TextClassifier {
    threshold: f64,
}

impl TextClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify already-loaded text.
    pub fn classify_text(&self, text: &str) -> Vec<LicenseFinding> {
        let mut findings: Vec<LicenseFinding> = Vec::new();
        let mut push = |name: String, confidence: f64| {
            if confidence >= self.threshold && !findings.iter().any(|f| f.name == name) {
                findings.push(LicenseFinding {
                    license_type: license_type(&name),
                    name,
                    confidence,
                });
            }
        };

        for caps in spdx_tag_regex().captures_iter(text) {
            for id in expression_ids(&caps[1]) {
                push(normalize(&id), 1.0);
            }
        }

        let haystack = collapse(text);
        for sig in SIGNATURES {
            let hits = sig.phrases.iter().filter(|p| haystack.contains(*p)).count();
            if hits > 0 {
                push(sig.id.to_string(), hits as f64 / sig.phrases.len() as f64);
            }
        }

        findings
    }
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl Classifier for TextClassifier {
    fn identify(&self, path: &Path) -> Result<Vec<LicenseFinding>, ClassifyError> {
        let bytes = std::fs::read(path).map_err(|source| ClassifyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let findings = self.classify_text(&String::from_utf8_lossy(&bytes));
        if findings.is_empty() {
            return Err(ClassifyError::NoMatch {
                path: path.to_path_buf(),
                threshold: self.threshold,
            });
        }
        tracing::trace!(path = %path.display(), ?findings, "identified");
        Ok(findings)
    }
}

/// Lowercase and collapse all whitespace runs to a single space.
fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// License identifiers named in an SPDX expression, skipping operators and
/// `WITH` exceptions.
fn expression_ids(expr: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut skip_next = false;
    for token in expr
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|t| !t.is_empty())
    {
        if skip_next {
            skip_next = false;
            continue;
        }
        match token {
            "AND" | "OR" => {}
            "WITH" => skip_next = true,
            id => ids.push(id.to_string()),
        }
    }
    ids
}
