//! Rendering of the persisted upstream configuration file.

use std::fmt::Write;

use crate::domain::snapshot::Snapshot;

/// Fixed per-server and per-pool directives written into the upstream file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTemplate {
    /// `max_fails` for every server line
    pub max_fails: u32,
    /// `fail_timeout` for every server line, in proxy duration syntax (`2s`)
    pub fail_timeout: String,
    /// `keepalive` connections per pool
    pub keepalive: u32,
}

impl Default for UpstreamTemplate {
    fn default() -> Self {
        Self {
            max_fails: 3,
            fail_timeout: "2s".to_string(),
            keepalive: 20,
        }
    }
}

impl UpstreamTemplate {
    /// Render one `upstream` block per non-empty pool, each followed by a blank line.
    ///
    /// Pools without members are left out entirely, the proxy refuses to load
    /// an upstream with no servers.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let mut out = String::new();

        for (name, members) in snapshot.iter().filter(|(_, m)| !m.is_empty()) {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "upstream {name} {{");
            for member in members {
                let _ = writeln!(
                    out,
                    "    server {member} max_fails={} fail_timeout={};",
                    self.max_fails, self.fail_timeout
                );
            }
            let _ = writeln!(out, "    keepalive {};", self.keepalive);
            out.push_str("}\n\n");
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::Member;

    #[test]
    fn renders_non_empty_pools_only() {
        let mut snapshot = Snapshot::new();
        snapshot.add_member("A", Member::new("1.1.1.2", 80));
        snapshot.add_member("A", Member::new("1.1.1.1", 80));
        snapshot.add_member("C", Member::new("3.3.3.3", 80));
        snapshot.ensure_pool("D");

        let rendered = UpstreamTemplate::default().render(&snapshot);

        let expected = "\
upstream A {
    server 1.1.1.1:80 max_fails=3 fail_timeout=2s;
    server 1.1.1.2:80 max_fails=3 fail_timeout=2s;
    keepalive 20;
}

upstream C {
    server 3.3.3.3:80 max_fails=3 fail_timeout=2s;
    keepalive 20;
}

";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn honours_template_values() {
        let mut snapshot = Snapshot::new();
        snapshot.add_member("api", Member::new("10.0.0.1", 9000));

        let template = UpstreamTemplate {
            max_fails: 1,
            fail_timeout: "10s".to_string(),
            keepalive: 64,
        };

        let rendered = template.render(&snapshot);
        assert!(rendered.contains("server 10.0.0.1:9000 max_fails=1 fail_timeout=10s;"));
        assert!(rendered.contains("keepalive 64;"));
    }

    #[test]
    fn empty_snapshot_renders_nothing() {
        assert_eq!(UpstreamTemplate::default().render(&Snapshot::new()), "");
    }
}
