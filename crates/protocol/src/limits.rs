/// Largest `/ask` body accepted by the transport layer.
pub const MAX_BODY_BYTES: usize = 128 * 1024;

/// Timeout applied when a request does not carry a usable `timeoutMs`.
pub const DEFAULT_TIMEOUT_MS: u64 = 50_000;

/// Upper bound on any effective timeout.
///
/// Must stay below the idle timeout of the load balancer in front of the
/// service so that a reply always goes out before the connection is cut.
pub const MAX_TIMEOUT_MS: u64 = 55_000;
