//! Default configuration values

/// Default Rust target triple
pub const DEFAULT_TARGET: &str = "aarch64-unknown-linux-gnu";

/// Default sysroot directory, relative to the working directory
pub const DEFAULT_SYSROOT_DIR: &str = "sysroot";

/// Base image repository the sysroot packages are installed into
pub const DEFAULT_BASE_IMAGE: &str = "ubuntu";

/// Platform-version tag of the base image
pub const DEFAULT_RELEASE: &str = "22.04";

/// Packages installed when none are configured
pub const DEFAULT_PACKAGES: &[&str] = &["libc6-dev", "libudev-dev", "libssl-dev"];

/// Location of the generated build configuration, relative to the working directory
pub const DEFAULT_CONFIG_OUTPUT: &str = ".cargo/config.toml";

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "crossroot.toml";

/// Prefix of the container name; the target triple is appended
pub const CONTAINER_NAME_PREFIX: &str = "crossroot";

/// Exit status used after an interrupted provisioning run
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// How long an interrupted build may take to unwind before the final cleanup
pub const INTERRUPT_GRACE_PERIOD: std::time::Duration = std::time::Duration::from_secs(5);
