//! gpg command line client

use std::io::Write;
use std::process::{Command, Output, Stdio};

use super::{format_key_id, GpgClient, GpgVersion};
use crate::error::{CryptError, CryptResult};

/// Runs `gpg`/`gpg2` for every request
#[derive(Debug, Clone)]
pub struct CommandGpgClient {
    version: GpgVersion,
    homedir: String,
}

impl CommandGpgClient {
    pub fn new(version: GpgVersion, homedir: impl Into<String>) -> Self {
        Self {
            version,
            homedir: homedir.into(),
        }
    }

    pub fn version(&self) -> GpgVersion {
        self.version
    }

    pub fn homedir(&self) -> &str {
        &self.homedir
    }

    /// Arguments shared by every invocation
    fn base_args(&self) -> Vec<String> {
        if self.homedir.is_empty() {
            Vec::new()
        } else {
            vec!["--homedir".to_string(), self.homedir.clone()]
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(self.version.binary());
        cmd.args(self.base_args()).args(args);
        cmd
    }

    fn run(&self, mut cmd: Command, stdin: Option<&[u8]>) -> CryptResult<Output> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| {
            CryptError::Gpg(format!("could not run {}: {}", self.version.binary(), e))
        })?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input)?;
        }
        Ok(child.wait_with_output()?)
    }

    /// Run and return stdout, failing on a non-zero exit
    fn output(&self, args: &[String], stdin: Option<&[u8]>) -> CryptResult<Vec<u8>> {
        let out = self.run(self.command(args), stdin)?;
        if !out.status.success() {
            return Err(CryptError::Gpg(format!(
                "{} failed: {}",
                self.version.binary(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(out.stdout)
    }

    /// Run a listing; a non-zero exit just means the key is unknown
    fn listing(&self, flag: &str, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
        let args = [flag.to_string(), format_key_id(key_id)];
        let out = self.run(self.command(&args), None)?;
        Ok((out.stdout, out.status.success()))
    }
}

impl GpgClient for CommandGpgClient {
    fn read_gpg_pub_ring_file(&self) -> CryptResult<Vec<u8>> {
        self.output(&["--batch".to_string(), "--export".to_string()], None)
    }

    fn get_gpg_private_key(&self, key_id: u64, passphrase: &[u8]) -> CryptResult<Vec<u8>> {
        let key = format_key_id(key_id);
        match self.version {
            GpgVersion::V1 => {
                let args = ["--batch".to_string(), "--export-secret-keys".to_string(), key];
                self.output(&args, None)
            }
            GpgVersion::V2 => {
                let args = [
                    "--pinentry-mode".to_string(),
                    "loopback".into(),
                    "--batch".into(),
                    "--passphrase-fd".into(),
                    "0".into(),
                    "--export-secret-key".into(),
                    key,
                ];
                self.output(&args, Some(passphrase))
            }
        }
    }

    fn get_secret_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
        self.listing("-K", key_id)
    }

    fn get_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
        self.listing("-k", key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homedir_args() {
        let client = CommandGpgClient::new(GpgVersion::V2, "");
        assert!(client.base_args().is_empty());

        let client = CommandGpgClient::new(GpgVersion::V2, "/home/u/.gnupg");
        assert_eq!(client.base_args(), vec!["--homedir", "/home/u/.gnupg"]);
    }

    #[test]
    fn test_command_line() {
        let client = CommandGpgClient::new(GpgVersion::V1, "/g");
        let cmd = client.command(&["-K".to_string(), format_key_id(0x1f)]);
        assert_eq!(cmd.get_program(), "gpg");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["--homedir", "/g", "-K", "0x1f"]);
    }

    #[test]
    fn test_missing_binary_is_gpg_error() {
        let client = CommandGpgClient::new(GpgVersion::V2, "");
        let mut cmd = Command::new("ocicrypt-args-no-such-binary");
        cmd.arg("--version");
        assert!(matches!(client.run(cmd, None), Err(CryptError::Gpg(_))));
    }
}
