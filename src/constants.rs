pub const CUSTOM_ORDER_ID_PREFIX: &str = "ORD";
pub const PASSWORD_RESET_TOKEN_TTL_HOURS: i64 = 24;
pub const PASSWORD_RESET_TOKEN_BYTES: usize = 32;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
// Gateway sentinel for "no error message".
pub const GATEWAY_EMPTY_VALUE: &str = "NA";
pub const SUCCESS_STATUS: &str = "success";
pub const PENDING_STATUS: &str = "pending";
pub const STATUS_UPDATE_MAX_ATTEMPTS: u32 = 3;
pub const WEBHOOK_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
gZiV/M1gPc22ElAH/Jh1Hw$\
CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";
