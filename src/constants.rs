// src/constants.rs

pub const DEFAULT_LISTEN_PORT: u16 = 2121;
pub const DEFAULT_ROOT_DIR: &str = "./ftp-root";
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 8192;
pub const MAX_COMMAND_LENGTH: usize = 4096;

/// Virtual root every session starts in.
pub const VFS_ROOT: &str = "/";

pub const GREETING: &[u8] = b"220 pocketftpd ready.\r\n";
pub const PROBE_FILE_NAME: &str = ".pocketftpd-probe";
