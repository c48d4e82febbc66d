/// Error codes surfaced to callers and used as process exit codes by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    JobFailed = 1,
    ConfigError = 11,
    ValidationError = 12,
    IoError = 20,
    SinkError = 30,
    Cancelled = 31,
    SystemError = 50,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
