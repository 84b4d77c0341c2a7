//! Supported netdisk platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A netdisk platform that share links can point at.
///
/// Closed set: adapters are registered per variant, and the persisted
/// `platform` column is CHECK-constrained to the same string forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Quark netdisk (pan.quark.cn, drive.uc.cn).
    Quark,
    /// Baidu netdisk (pan.baidu.com).
    Baidu,
    /// Aliyun drive (aliyundrive.com, alipan.com).
    Aliyun,
    /// Tianyi cloud (cloud.189.cn).
    Tianyi,
    /// 123pan (123pan.com).
    #[serde(rename = "123pan")]
    Pan123,
}

impl Platform {
    /// All supported platforms, in extraction scan order.
    pub const ALL: [Self; 5] = [
        Self::Quark,
        Self::Baidu,
        Self::Aliyun,
        Self::Tianyi,
        Self::Pan123,
    ];

    /// Returns the database/CLI string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quark => "quark",
            Self::Baidu => "baidu",
            Self::Aliyun => "aliyun",
            Self::Tianyi => "tianyi",
            Self::Pan123 => "123pan",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quark" => Ok(Self::Quark),
            "baidu" => Ok(Self::Baidu),
            "aliyun" => Ok(Self::Aliyun),
            "tianyi" => Ok(Self::Tianyi),
            "123pan" => Ok(Self::Pan123),
            _ => Err(format!("unknown platform: {s}")),
        }
    }
}
