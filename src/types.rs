use std::fmt;
use std::str::FromStr;

/// SSL/TLS protocol restriction handed to `ab -f`.
///
/// `All` lets ab negotiate whatever the target offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    Ssl2,
    Ssl3,
    Tls1,
    Tls1_1,
    Tls1_2,
    Tls1_3,
    #[default]
    All,
}

impl Protocol {
    /// Spelling understood by ab.
    pub fn as_ab_arg(&self) -> &'static str {
        match self {
            Protocol::Ssl2 => "SSL2",
            Protocol::Ssl3 => "SSL3",
            Protocol::Tls1 => "TLS1",
            Protocol::Tls1_1 => "TLS1.1",
            Protocol::Tls1_2 => "TLS1.2",
            Protocol::Tls1_3 => "TLS1.3",
            Protocol::All => "ALL",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ab_arg())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SSL2" => Ok(Protocol::Ssl2),
            "SSL3" => Ok(Protocol::Ssl3),
            "TLS1" => Ok(Protocol::Tls1),
            "TLS1.1" => Ok(Protocol::Tls1_1),
            "TLS1.2" => Ok(Protocol::Tls1_2),
            "TLS1.3" => Ok(Protocol::Tls1_3),
            "ALL" => Ok(Protocol::All),
            other => Err(format!(
                "invalid protocol: {other} (expected SSL2, SSL3, TLS1, TLS1.1, TLS1.2, TLS1.3 or ALL)"
            )),
        }
    }
}
