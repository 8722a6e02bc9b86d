/// Minimum accepted password length at signup
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default bearer token lifetime in seconds (5 minutes)
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 300;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 3001;

/// Default bcrypt work factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Scheme prefix of the `Authorization` header
pub const BEARER_SCHEME: &str = "Bearer";

/// Reply used when no language model is configured
pub const CANNED_TUTOR_REPLY: &str = "Hello, I'm the CIS 350 TA. How can I assist you today?";

/// BLAKE3 key derivation context for revoked token digests
pub const KDF_CONTEXT_TOKEN_DIGEST: &str = "edubot-revoked-token-v1";
