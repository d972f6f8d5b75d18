//! Product lifecycle status as encoded by the contract (`uint8`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductStatus {
    Manufactured,
    InTransit,
    Delivered,
    Sold,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 4] = [
        Self::Manufactured,
        Self::InTransit,
        Self::Delivered,
        Self::Sold,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Manufactured),
            1 => Some(Self::InTransit),
            2 => Some(Self::Delivered),
            3 => Some(Self::Sold),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Manufactured => 0,
            Self::InTransit => 1,
            Self::Delivered => 2,
            Self::Sold => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Manufactured => "Manufactured",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Sold => "Sold",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Manufactured => "status-manufactured",
            Self::InTransit => "status-intransit",
            Self::Delivered => "status-delivered",
            Self::Sold => "status-sold",
        }
    }
}

/// Display name for a raw status code; codes the client doesn't know render as "Unknown".
pub fn status_name(code: u8) -> &'static str {
    ProductStatus::from_code(code).map_or("Unknown", ProductStatus::display_name)
}

pub fn status_class(code: u8) -> &'static str {
    ProductStatus::from_code(code).map_or("status-unknown", ProductStatus::css_class)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_map_bijectively() {
        let names: HashSet<_> = (0u8..4).map(status_name).collect();
        let classes: HashSet<_> = (0u8..4).map(status_class).collect();
        assert_eq!(names.len(), 4);
        assert_eq!(classes.len(), 4);

        for status in ProductStatus::ALL {
            assert_eq!(ProductStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn names_and_classes_match_the_ui() {
        assert_eq!(status_name(0), "Manufactured");
        assert_eq!(status_name(1), "In Transit");
        assert_eq!(status_name(2), "Delivered");
        assert_eq!(status_name(3), "Sold");
        assert_eq!(status_class(0), "status-manufactured");
        assert_eq!(status_class(1), "status-intransit");
        assert_eq!(status_class(2), "status-delivered");
        assert_eq!(status_class(3), "status-sold");
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(ProductStatus::from_code(4), None);
        assert_eq!(status_name(200), "Unknown");
        assert_eq!(status_class(200), "status-unknown");
    }
}
