use crate::models::LicenseType;

/// What must be redistributed alongside a binary that links a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restrictiveness {
    /// No licenses detected, nothing to share.
    None,
    /// Copy the license text and notices.
    ShareLicense,
    /// Copy the full source.
    ShareCode,
    /// At least one license could not be categorized.
    Unknown,
    /// At least one license is outside the accepted categories.
    NotAllowed,
}

impl std::fmt::Display for Restrictiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Restrictiveness::None => write!(f, "None"),
            Restrictiveness::ShareLicense => write!(f, "ShareLicense"),
            Restrictiveness::ShareCode => write!(f, "ShareCode"),
            Restrictiveness::Unknown => write!(f, "Unknown"),
            Restrictiveness::NotAllowed => write!(f, "NotAllowed"),
        }
    }
}

/// Bucket a single type falls into, least to most obligation.
fn bucket(license_type: LicenseType) -> Restrictiveness {
    match license_type {
        LicenseType::Notice | LicenseType::Permissive | LicenseType::Unencumbered => {
            Restrictiveness::ShareLicense
        }
        LicenseType::Restricted | LicenseType::Reciprocal => Restrictiveness::ShareCode,
        LicenseType::Unknown => Restrictiveness::Unknown,
        LicenseType::Forbidden => Restrictiveness::NotAllowed,
    }
}

fn rank(level: Restrictiveness) -> u8 {
    match level {
        Restrictiveness::None => 0,
        Restrictiveness::ShareLicense => 1,
        Restrictiveness::ShareCode => 2,
        Restrictiveness::Unknown => 3,
        Restrictiveness::NotAllowed => 4,
    }
}

/// Redistribution obligation for the set of license types found in one library.
///
/// The most demanding type wins: `NotAllowed` > `Unknown` > `ShareCode` >
/// `ShareLicense`. An empty set imposes nothing.
pub fn restrictiveness(types: &[LicenseType]) -> Restrictiveness {
    types
        .iter()
        .map(|t| bucket(*t))
        .max_by_key(|level| rank(*level))
        .unwrap_or(Restrictiveness::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use LicenseType::*;

    #[test]
    fn test_empty_is_none() {
        assert_eq!(restrictiveness(&[]), Restrictiveness::None);
    }

    #[test]
    fn test_notice_like_types_share_license() {
        for types in [
            vec![Notice],
            vec![Permissive],
            vec![Unencumbered],
            vec![Notice, Permissive, Unencumbered],
        ] {
            assert_eq!(restrictiveness(&types), Restrictiveness::ShareLicense, "{types:?}");
        }
    }

    #[test]
    fn test_copyleft_shares_code() {
        for types in [
            vec![Restricted],
            vec![Reciprocal],
            vec![Notice, Reciprocal],
            vec![Restricted, Permissive, Unencumbered],
        ] {
            assert_eq!(restrictiveness(&types), Restrictiveness::ShareCode, "{types:?}");
        }
    }

    #[test]
    fn test_unknown_beats_copyleft() {
        assert_eq!(
            restrictiveness(&[Restricted, Unknown, Notice]),
            Restrictiveness::Unknown
        );
    }

    #[test]
    fn test_forbidden_beats_everything() {
        assert_eq!(restrictiveness(&[Forbidden]), Restrictiveness::NotAllowed);
        assert_eq!(
            restrictiveness(&[Unknown, Restricted, Forbidden, Notice]),
            Restrictiveness::NotAllowed
        );
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = restrictiveness(&[Notice, Reciprocal, Unknown]);
        let b = restrictiveness(&[Unknown, Reciprocal, Notice]);
        assert_eq!(a, b);
    }
}
