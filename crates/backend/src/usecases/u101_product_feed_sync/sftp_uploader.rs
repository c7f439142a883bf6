use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::usecases::u101_product_feed_sync::UploadResult;
use ssh2::Session;
use thiserror::Error;

use crate::shared::config::SftpConfig;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("SFTP is not configured: missing {0}")]
    NotConfigured(&'static str),
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    #[error("authentication failed for user '{username}': {source}")]
    Auth {
        username: String,
        source: ssh2::Error,
    },
    #[error("remote path '{0}' does not exist")]
    RemotePathMissing(String),
    #[error("remote path '{0}' is not a directory")]
    RemotePathNotDirectory(String),
    #[error("failed to write '{remote}': {message}")]
    Write { remote: String, message: String },
    #[error("failed to read local file '{path}': {source}")]
    LocalFile {
        path: String,
        source: std::io::Error,
    },
    #[error("ssh session error: {0}")]
    Session(#[from] ssh2::Error),
    #[error("upload task failed: {0}")]
    Task(String),
}

/// Delivers feed files to the marketplace server over SSH. SFTP is the
/// primary transport; when the server offers no SFTP subsystem the
/// upload falls back to SCP over the same session.
pub struct SftpUploader {
    config: SftpConfig,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const OPERATION_TIMEOUT_MS: u32 = 30_000;

impl SftpUploader {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    /// Credentials are checked before any connection attempt so a
    /// half-configured setup fails with a clear message.
    pub fn check_configured(&self) -> Result<(), UploadError> {
        if self.config.host.trim().is_empty() {
            return Err(UploadError::NotConfigured("host"));
        }
        if self.config.username.trim().is_empty() {
            return Err(UploadError::NotConfigured("username"));
        }
        if self.config.password.trim().is_empty() {
            return Err(UploadError::NotConfigured("password"));
        }
        Ok(())
    }

    fn remote_file_path(&self, filename: &str) -> String {
        let dir = self.config.remote_dir.trim_end_matches('/');
        format!("{}/{}", dir, filename)
    }

    fn connect_blocking(config: &SftpConfig) -> Result<Session, UploadError> {
        let connect_error = |source| UploadError::Connect {
            host: config.host.clone(),
            port: config.port,
            source,
        };
        let addr = format!("{}:{}", config.host, config.port)
            .to_socket_addrs()
            .map_err(connect_error)?
            .next()
            .ok_or_else(|| {
                connect_error(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "host did not resolve",
                ))
            })?;
        let stream =
            TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(connect_error)?;

        let mut session = Session::new()?;
        session.set_timeout(OPERATION_TIMEOUT_MS);
        session.set_tcp_stream(stream);
        session.handshake()?;
        session
            .userauth_password(&config.username, &config.password)
            .map_err(|source| UploadError::Auth {
                username: config.username.clone(),
                source,
            })?;
        Ok(session)
    }

    fn verify_remote_dir(session: &Session, remote_dir: &str) -> Result<(), UploadError> {
        let sftp = session.sftp()?;
        let stat = sftp
            .stat(Path::new(remote_dir))
            .map_err(|_| UploadError::RemotePathMissing(remote_dir.to_string()))?;
        if !stat.is_dir() {
            return Err(UploadError::RemotePathNotDirectory(remote_dir.to_string()));
        }
        Ok(())
    }

    fn upload_blocking(
        config: &SftpConfig,
        local: &Path,
        remote_path: &str,
    ) -> Result<UploadResult, UploadError> {
        let data = std::fs::read(local).map_err(|source| UploadError::LocalFile {
            path: local.to_string_lossy().to_string(),
            source,
        })?;

        let session = Self::connect_blocking(config)?;
        Self::verify_remote_dir(&session, config.remote_dir.trim_end_matches('/'))?;

        // SFTP first, SCP over the same session when SFTP write fails
        let sftp_result = session.sftp().and_then(|sftp| {
            let mut file = sftp.create(Path::new(remote_path))?;
            file.write_all(&data)
                .map_err(|e| ssh2::Error::from_errno(ssh2::ErrorCode::Session(e.raw_os_error().unwrap_or(-1))))?;
            Ok(())
        });

        let transport = match sftp_result {
            Ok(()) => "sftp",
            Err(sftp_err) => {
                tracing::warn!(
                    "SFTP write failed ({}), falling back to SCP",
                    sftp_err
                );
                let mut channel = session
                    .scp_send(Path::new(remote_path), 0o644, data.len() as u64, None)
                    .map_err(|e| UploadError::Write {
                        remote: remote_path.to_string(),
                        message: e.to_string(),
                    })?;
                channel.write_all(&data).map_err(|e| UploadError::Write {
                    remote: remote_path.to_string(),
                    message: e.to_string(),
                })?;
                channel.send_eof()?;
                channel.wait_eof()?;
                channel.close()?;
                channel.wait_close()?;
                "scp"
            }
        };

        Ok(UploadResult {
            remote_path: remote_path.to_string(),
            bytes_sent: data.len() as u64,
            transport: transport.to_string(),
        })
    }

    /// Upload one file into the configured remote directory. The local
    /// file name is kept unless `remote_name` overrides it.
    pub async fn upload(
        &self,
        local: PathBuf,
        remote_name: Option<&str>,
    ) -> Result<UploadResult, UploadError> {
        self.check_configured()?;
        let filename = match remote_name {
            Some(name) => name.to_string(),
            None => local
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| UploadError::LocalFile {
                    path: local.to_string_lossy().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
                })?,
        };
        let remote_path = self.remote_file_path(&filename);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || Self::upload_blocking(&config, &local, &remote_path))
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?
    }

    /// Connect, authenticate and verify the remote directory without
    /// transferring anything.
    pub async fn test_connection(&self) -> Result<(), UploadError> {
        self.check_configured()?;
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let session = Self::connect_blocking(&config)?;
            Self::verify_remote_dir(&session, config.remote_dir.trim_end_matches('/'))
        })
        .await
        .map_err(|e| UploadError::Task(e.to_string()))?
    }
}
