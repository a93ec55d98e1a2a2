//! Device capability detection.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in an SMS body (RFC 3986 unreserved).
const SMS_BODY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Device family, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Other,
}

impl Platform {
    #[must_use]
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Platform::Ios
        } else if ua.contains("android") {
            Platform::Android
        } else {
            Platform::Other
        }
    }

    /// `sms:` deep link addressed to every number.
    ///
    /// iOS expects `&body=`; everything else takes `?body=`.
    #[must_use]
    pub fn sms_uri(self, numbers: &[&str], body: &str) -> String {
        let recipients = numbers.join(",");
        let separator = match self {
            Platform::Ios => '&',
            Platform::Android | Platform::Other => '?',
        };
        let body = utf8_percent_encode(body, SMS_BODY);
        format!("sms:{recipients}{separator}body={body}")
    }
}
