use crate::error::{ControlError, Result};
use ormon_common::config::{AgentConfig, ConnectMethod};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Request/response access to the daemon's control channel. Implemented by
/// [`ControlConnection`] and by the scripted sessions the provider tests
/// use.
pub trait ControlClient {
    /// Issues `GETINFO <key>` and returns the raw value. A reply that
    /// carries no data for the key is a [`ControlError::Protocol`].
    fn get_info(&mut self, key: &str) -> Result<String>;
}

#[derive(Debug)]
enum Transport {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.flush(),
        }
    }
}

/// One control-channel session. The transport is owned exclusively by this
/// value and released when it is dropped, on every exit path; dropping also
/// sends a best-effort `QUIT`.
#[derive(Debug)]
pub struct ControlConnection {
    stream: BufReader<Transport>,
}

pub(crate) enum AuthOutcome {
    Accepted,
    Refused(String),
}

impl ControlConnection {
    /// Opens the transport selected by the configuration. The handshake is
    /// a separate step; see [`crate::authenticate`].
    pub fn open(config: &AgentConfig) -> Result<Self> {
        let transport = match config.method {
            ConnectMethod::Port => {
                tracing::debug!(port = config.port, "connecting to control port");
                let stream = TcpStream::connect(("127.0.0.1", config.port))
                    .map_err(ControlError::Connect)?;
                Transport::Tcp(stream)
            }
            ConnectMethod::Socket => {
                #[cfg(unix)]
                {
                    tracing::debug!(path = %config.socket_path.display(), "connecting to control socket");
                    let stream = UnixStream::connect(&config.socket_path)
                        .map_err(ControlError::Connect)?;
                    Transport::Unix(stream)
                }
                #[cfg(not(unix))]
                {
                    return Err(ControlError::Connect(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "socket transport is only available on unix platforms",
                    )));
                }
            }
        };
        Ok(Self {
            stream: BufReader::new(transport),
        })
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        let inner = self.stream.get_mut();
        inner.write_all(line.as_bytes())?;
        inner.write_all(b"\r\n")?;
        inner.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.stream.read_line(&mut line)? == 0 {
            return Err(ControlError::Protocol(
                "connection closed mid-reply".to_string(),
            ));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Reads a multi-line data block up to its `.` terminator, undoing the
    /// leading-dot escape.
    fn read_data_block(&mut self) -> Result<String> {
        let mut data = String::new();
        loop {
            let line = self.read_line()?;
            if line == "." {
                break;
            }
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(line.strip_prefix('.').unwrap_or(&line));
        }
        Ok(data)
    }

    pub(crate) fn authenticate_raw(&mut self, password: Option<&str>) -> Result<AuthOutcome> {
        let command = match password {
            Some(password) => format!("AUTHENTICATE {}", quote_string(password)),
            None => "AUTHENTICATE".to_string(),
        };
        self.send_line(&command)?;
        let reply = self.read_line()?;
        if reply.starts_with("250") {
            Ok(AuthOutcome::Accepted)
        } else {
            Ok(AuthOutcome::Refused(reply))
        }
    }
}

impl ControlClient for ControlConnection {
    fn get_info(&mut self, key: &str) -> Result<String> {
        self.send_line(&format!("GETINFO {key}"))?;
        let mut value: Option<String> = None;
        loop {
            let line = self.read_line()?;
            if let Some(rest) = line.strip_prefix("250-") {
                value = Some(strip_key(rest, key)?.to_string());
            } else if let Some(rest) = line.strip_prefix("250+") {
                strip_key(rest, key)?;
                value = Some(self.read_data_block()?);
            } else if line.starts_with("250 ") || line == "250" {
                break;
            } else {
                return Err(ControlError::Protocol(format!(
                    "unexpected reply to GETINFO {key}: {line}"
                )));
            }
        }
        value.ok_or_else(|| ControlError::Protocol(format!("reply carried no data for {key}")))
    }
}

impl Drop for ControlConnection {
    fn drop(&mut self) {
        let _ = self.send_line("QUIT");
    }
}

fn strip_key<'a>(reply: &'a str, key: &str) -> Result<&'a str> {
    reply
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| ControlError::Protocol(format!("reply names a different key: {reply}")))
}

/// Escapes a credential as a protocol quoted string.
fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticate;
    use crate::error::AuthReason;
    use ormon_common::types::Variant;
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;

    fn config_for_port(port: u16, password: Option<&str>) -> AgentConfig {
        AgentConfig {
            variant: Some(Variant::Dormant),
            method: ConnectMethod::Port,
            port,
            socket_path: PathBuf::from("/nonexistent"),
            password: password.map(str::to_string),
            cache_dir: None,
            cache_file: "countries.json".to_string(),
            max_countries: 15,
            geoip_db: PathBuf::from("/nonexistent.mmdb"),
        }
    }

    /// Runs a scripted daemon on a loopback port: for each (expected,
    /// reply) pair it reads one command line, asserts it, and writes the
    /// canned reply.
    fn scripted_daemon(script: Vec<(&'static str, &'static str)>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            for (expected, reply) in script {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                assert_eq!(line.trim_end(), expected);
                writer.write_all(reply.as_bytes()).unwrap();
                writer.flush().unwrap();
            }
        });
        port
    }

    #[test]
    fn get_info_parses_a_single_line_reply() {
        let port = scripted_daemon(vec![("GETINFO dormant", "250-dormant=0\r\n250 OK\r\n")]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        assert_eq!(conn.get_info("dormant").unwrap(), "0");
    }

    #[test]
    fn get_info_parses_a_multi_line_reply() {
        let port = scripted_daemon(vec![(
            "GETINFO orconn-status",
            "250+orconn-status=\r\n$AAAA~relay CONNECTED\r\n$BBBB~other FAILED\r\n.\r\n250 OK\r\n",
        )]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        assert_eq!(
            conn.get_info("orconn-status").unwrap(),
            "$AAAA~relay CONNECTED\n$BBBB~other FAILED"
        );
    }

    #[test]
    fn get_info_accepts_an_empty_data_block() {
        let port = scripted_daemon(vec![(
            "GETINFO orconn-status",
            "250+orconn-status=\r\n.\r\n250 OK\r\n",
        )]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        assert_eq!(conn.get_info("orconn-status").unwrap(), "");
    }

    #[test]
    fn get_info_turns_error_replies_into_protocol_errors() {
        let port = scripted_daemon(vec![(
            "GETINFO nonsense",
            "552 Unrecognized key \"nonsense\"\r\n",
        )]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        let err = conn.get_info("nonsense").unwrap_err();
        assert!(matches!(err, ControlError::Protocol(_)));
    }

    #[test]
    fn get_info_without_data_is_a_protocol_error() {
        let port = scripted_daemon(vec![("GETINFO dormant", "250 OK\r\n")]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        let err = conn.get_info("dormant").unwrap_err();
        assert!(matches!(err, ControlError::Protocol(_)));
    }

    #[test]
    fn open_reports_connect_failures() {
        // Bind and immediately drop a listener so the port is closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = ControlConnection::open(&config_for_port(port, None)).unwrap_err();
        assert!(matches!(err, ControlError::Connect(_)));
    }

    #[test]
    fn credential_less_authentication_succeeds() {
        let port = scripted_daemon(vec![("AUTHENTICATE", "250 OK\r\n")]);
        let mut conn = ControlConnection::open(&config_for_port(port, None)).unwrap();
        authenticate(&mut conn, &config_for_port(port, None)).unwrap();
    }

    #[test]
    fn configured_password_is_retried_quoted() {
        let port = scripted_daemon(vec![
            (
                "AUTHENTICATE",
                "515 Authentication failed: Password did not match HashedControlPassword\r\n",
            ),
            ("AUTHENTICATE \"hunter2\"", "250 OK\r\n"),
        ]);
        let config = config_for_port(port, Some("hunter2"));
        let mut conn = ControlConnection::open(&config).unwrap();
        authenticate(&mut conn, &config).unwrap();
    }

    #[test]
    fn missing_environment_password_is_not_configured() {
        let port = scripted_daemon(vec![(
            "AUTHENTICATE",
            "515 Authentication failed: Password did not match HashedControlPassword\r\n",
        )]);
        let config = config_for_port(port, None);
        let mut conn = ControlConnection::open(&config).unwrap();
        let err = authenticate(&mut conn, &config).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Auth {
                reason: AuthReason::NotConfigured
            }
        ));
    }

    #[test]
    fn rejected_password_is_distinct_from_not_configured() {
        let port = scripted_daemon(vec![
            (
                "AUTHENTICATE",
                "515 Authentication failed: Password did not match HashedControlPassword\r\n",
            ),
            (
                "AUTHENTICATE \"wrong\"",
                "515 Authentication failed: Password did not match HashedControlPassword\r\n",
            ),
        ]);
        let config = config_for_port(port, Some("wrong"));
        let mut conn = ControlConnection::open(&config).unwrap();
        let err = authenticate(&mut conn, &config).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Auth {
                reason: AuthReason::Rejected
            }
        ));
    }

    #[test]
    fn refusal_a_password_cannot_satisfy_is_missing() {
        let port = scripted_daemon(vec![(
            "AUTHENTICATE",
            "515 Authentication failed: Wrong length on authentication cookie.\r\n",
        )]);
        let config = config_for_port(port, Some("hunter2"));
        let mut conn = ControlConnection::open(&config).unwrap();
        let err = authenticate(&mut conn, &config).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Auth {
                reason: AuthReason::Missing
            }
        ));
    }

    #[test]
    fn quote_string_escapes_quotes_and_backslashes() {
        assert_eq!(quote_string("plain"), "\"plain\"");
        assert_eq!(quote_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }
}
