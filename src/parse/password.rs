//! Password strings
//!
//! A password is given as `pass=<pwd>`, `file=<path>`, `fd=<n>` or as the
//! literal password.

use std::fs;

use crate::error::{CryptError, CryptResult};
use crate::secure_memory::SecureBytes;

/// Largest password read from a file descriptor
pub const FD_PASSWORD_MAX: usize = 64;

/// Decode a password string
pub fn process_pwd_string(pwd: &str) -> CryptResult<SecureBytes> {
    if let Some(path) = pwd.strip_prefix("file=") {
        let data = fs::read(path).map_err(|e| CryptError::read_failed(path, e))?;
        Ok(SecureBytes::new(data))
    } else if let Some(pass) = pwd.strip_prefix("pass=") {
        Ok(SecureBytes::from(pass))
    } else if let Some(fd) = pwd.strip_prefix("fd=") {
        read_fd_password(fd)
    } else {
        Ok(SecureBytes::from(pwd))
    }
}

#[cfg(unix)]
fn read_fd_password(fd_str: &str) -> CryptResult<SecureBytes> {
    use std::fs::File;
    use std::io::Read;
    use std::os::fd::{BorrowedFd, FromRawFd, RawFd};
    use zeroize::Zeroize;

    let fd: RawFd = fd_str.parse().map_err(|e| {
        CryptError::InvalidFormat(format!("could not parse file descriptor {}: {}", fd_str, e))
    })?;
    if fd < 0 {
        return Err(CryptError::InvalidFormat(format!(
            "{} is not a valid file descriptor",
            fd_str
        )));
    }

    // SAFETY: fd is not -1 and is only borrowed long enough to duplicate it,
    // which fails cleanly when the descriptor is not open.
    let duplicate = unsafe { BorrowedFd::borrow_raw(fd) }
        .try_clone_to_owned()
        .map_err(|e| CryptError::Io(format!("{} is not a valid file descriptor: {}", fd_str, e)))?;
    drop(duplicate);

    // SAFETY: the descriptor is open and was handed to us; it is closed
    // when `file` drops.
    let mut file = unsafe { File::from_raw_fd(fd) };
    let mut buf = [0u8; FD_PASSWORD_MAX];
    let n = file
        .read(&mut buf)
        .map_err(|e| CryptError::Io(format!("could not read from file descriptor: {}", e)))?;
    if n == FD_PASSWORD_MAX {
        tracing::warn!(
            fd,
            max = FD_PASSWORD_MAX,
            "password read from file descriptor filled the buffer and may be truncated"
        );
    }

    let pwd = SecureBytes::new(&buf[..n]);
    buf.zeroize();
    Ok(pwd)
}

#[cfg(not(unix))]
fn read_fd_password(fd_str: &str) -> CryptResult<SecureBytes> {
    Err(CryptError::InvalidFormat(format!(
        "reading passwords from file descriptor {} is not supported on this platform",
        fd_str
    )))
}
