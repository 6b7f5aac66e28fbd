pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const PROC_ROOT_ENV_VAR: &str = "HOST_PROC";

pub const STATUS_FILE: &str = "status";
pub const EXE_LINK: &str = "exe";

pub const STATUS_UID_KEY: &str = "uid";
pub const STATUS_GID_KEY: &str = "gid";
pub const STATUS_GROUPS_KEY: &str = "groups";

pub const CONFIG_ENV_PREFIX: &str = "WORKLOAD_ATTESTOR";
pub const DEFAULT_DISCOVER_WORKLOAD_PATH: bool = false;
pub const DEFAULT_WORKLOAD_SIZE_LIMIT: i64 = 0;

pub const DIGEST_CHUNK_SIZE: usize = 64 * 1024;
