// FPL public API access: wire types, the HTTP client and league loading.

pub mod client;
pub mod loader;
pub mod wire;
