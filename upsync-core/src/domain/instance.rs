//! Service instance models.

use std::fmt;

/// Tag key that routes an instance into a variant pool.
pub const VARIANT_TAG: &str = "gray";

/// Tag value that keeps an instance in the service's default pool.
pub const DEFAULT_VARIANT: &str = "default";

/// The address of a single upstream server (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Member {
    /// Host name or IP address as reported by the catalog
    pub host: String,
    /// Service port
    pub port: u16,
}

impl Member {
    /// Create a new member address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Health of an instance as reported by its own service check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    /// The instance's check is passing
    Passing,
    /// Any other check status (`warning`, `critical`, ...)
    Other(String),
}

impl Health {
    /// Map a raw catalog status string onto a health state.
    pub fn from_status(status: &str) -> Self {
        if status == "passing" {
            Health::Passing
        } else {
            Health::Other(status.to_string())
        }
    }

    /// Whether the instance may receive traffic.
    pub fn is_passing(&self) -> bool {
        matches!(self, Health::Passing)
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Passing => f.write_str("passing"),
            Health::Other(status) => f.write_str(status),
        }
    }
}

/// Routing classification of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Belongs to the service's own pool
    Default,
    /// Belongs to the `<service>_<name>` pool
    Named(String),
}

impl Variant {
    /// Derive the variant from an instance's tags.
    ///
    /// The first `gray=<value>` tag wins, and the value ends at the next `=`.
    /// A missing tag, an empty value and the literal `default` all select the
    /// default pool.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let value = tags.iter().find_map(|tag| {
            tag.as_ref()
                .split_once('=')
                .filter(|(key, _)| *key == VARIANT_TAG)
                .and_then(|(_, value)| value.split('=').next())
        });

        match value {
            Some(value) if !value.is_empty() && value != DEFAULT_VARIANT => {
                Variant::Named(value.to_string())
            }
            _ => Variant::Default,
        }
    }
}

/// A single registered instance of a service, normalized from a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Name of the service the instance is registered under
    pub service: String,
    /// Address the proxy should route to
    pub member: Member,
    /// Result of the instance's own service check
    pub health: Health,
    /// Default or variant pool
    pub variant: Variant,
}

impl Instance {
    /// Name of the pool this instance belongs to.
    pub fn pool_name(&self) -> String {
        match &self.variant {
            Variant::Default => self.service.clone(),
            Variant::Named(name) => format!("{}_{}", self.service, name),
        }
    }
}
