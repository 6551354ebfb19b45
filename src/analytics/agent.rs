//! Coarse user-agent classification via woothee

use serde::{Deserialize, Serialize};
use woothee::parser::Parser;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    pub device: DeviceClass,
    pub browser: String,
    pub os: String,
}

impl AgentInfo {
    fn unknown() -> Self {
        Self {
            device: DeviceClass::Desktop,
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

/// Best-effort classification of a raw user-agent string. Empty or
/// unrecognized input falls back to desktop with unknown browser and OS;
/// this never fails.
pub fn classify(user_agent: &str) -> AgentInfo {
    if user_agent.is_empty() {
        return AgentInfo::unknown();
    }

    let Some(result) = Parser::new().parse(user_agent) else {
        return AgentInfo::unknown();
    };

    // woothee categories: "pc" and everything unrecognized map to desktop.
    // woothee files iPads under "smartphone", so touch devices get a second
    // look at the raw string to separate tablets out.
    let device = match result.category {
        "smartphone" | "mobilephone" => {
            if is_tablet(user_agent) {
                DeviceClass::Tablet
            } else {
                DeviceClass::Mobile
            }
        }
        "tablet" => DeviceClass::Tablet,
        _ => DeviceClass::Desktop,
    };

    AgentInfo {
        device,
        browser: normalize(result.name),
        os: normalize(result.os),
    }
}

/// Tablet markers: iPad, or Android without the "Mobile" token that phone
/// browsers send.
fn is_tablet(user_agent: &str) -> bool {
    if user_agent.contains("iPad") {
        return true;
    }
    user_agent.contains("Android") && !user_agent.contains("Mobile")
}

// woothee reports unknowns as the literal "UNKNOWN" (or an empty string for
// some fields); normalize both to our fallback value.
fn normalize(value: &str) -> String {
    if value.is_empty() || value == "UNKNOWN" {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 \
                             Mobile/15E148 Safari/604.1";
    const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) \
                           AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 \
                           Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET_UA: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) \
                                     AppleWebKit/537.36 (KHTML, like Gecko) \
                                     Chrome/116.0.0.0 Safari/537.36";
    const WINDOWS_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                     AppleWebKit/537.36 (KHTML, like Gecko) \
                                     Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn test_classify_iphone_is_mobile() {
        let info = classify(IPHONE_UA);
        assert_eq!(info.device, DeviceClass::Mobile);
        assert_eq!(info.browser, "Safari");
    }

    #[test]
    fn test_classify_ipad_is_tablet() {
        let info = classify(IPAD_UA);
        assert_eq!(info.device, DeviceClass::Tablet);
    }

    #[test]
    fn test_classify_android_tablet() {
        let info = classify(ANDROID_TABLET_UA);
        assert_eq!(info.device, DeviceClass::Tablet);
    }

    #[test]
    fn test_classify_desktop_browser() {
        let info = classify(WINDOWS_CHROME_UA);
        assert_eq!(info.device, DeviceClass::Desktop);
        assert_eq!(info.browser, "Chrome");
        assert!(info.os.starts_with("Windows"));
    }

    #[test]
    fn test_classify_empty_input_falls_back() {
        let info = classify("");
        assert_eq!(info.device, DeviceClass::Desktop);
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
    }

    #[test]
    fn test_classify_garbage_never_fails() {
        let info = classify("not a real user agent at all");
        assert_eq!(info.device, DeviceClass::Desktop);
    }

    #[test]
    fn test_device_class_as_str() {
        assert_eq!(DeviceClass::Mobile.as_str(), "mobile");
        assert_eq!(DeviceClass::Tablet.as_str(), "tablet");
        assert_eq!(DeviceClass::Desktop.as_str(), "desktop");
    }
}
