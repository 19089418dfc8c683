/// Re-export `Config` from `ipstack-core` for use within this crate.
///
/// Environment parsing lives in `ipstack-core`; the server turns it into a
/// provider stack (`state::build_provider`) and a `GeoIpConfig`.
pub use ipstack_core::config::Config;
