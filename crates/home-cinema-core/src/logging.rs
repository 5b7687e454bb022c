// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Logging setup for frontends

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "home_cinema_core=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
