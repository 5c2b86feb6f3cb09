//! Session controller
//!
//! Sequences the command framer and response interpreter into the
//! operations applications use. The only state a session keeps beyond the
//! engine is whether echo has been switched off.
//!
//! ```text
//!  >> ATE0        (first operation only)
//!  << OK
//!  >> ATI7
//!  << 8622
//!  << OK
//! ```

use embedded_hal::delay::DelayNs;
use unbbee_hal::{ByteChannel, Clock, NoWatchdog, Watchdog};
use unbbee_protocol::{
    AtError, AtPort, Captured, CommandFragment, Deadline, DiagSink, NoDiag, LINE_CAPACITY,
};

use crate::config::SessionConfig;

/// Switch off command echo
pub const ECHO_OFF_COMMAND: &str = "ATE0";

/// Query the device identity
pub const IDENTITY_COMMAND: &str = "ATI7";

/// Transmit a payload; the payload follows directly
pub const PAYLOAD_COMMAND: &str = "AT$SS=";

/// Failed integer query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueError {
    /// The exchange itself failed
    At(AtError),
    /// The value line did not have the expected prefix or number
    UnexpectedReply,
}

impl From<AtError> for ValueError {
    fn from(err: AtError) -> Self {
        ValueError::At(err)
    }
}

/// AT session with one modem
pub struct Session<'a, C, K, D, W = NoWatchdog, G = NoDiag> {
    port: AtPort<'a, C, K, D, W, G>,
    config: SessionConfig,
    echo_off: bool,
}

impl<'a, C, K, D, W, G> Session<'a, C, K, D, W, G> {
    /// Create a session on an engine
    ///
    /// The modem is assumed to echo until [`suppress_echo`](Self::suppress_echo)
    /// succeeds.
    pub fn new(port: AtPort<'a, C, K, D, W, G>, config: SessionConfig) -> Self {
        Self {
            port,
            config,
            echo_off: false,
        }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check whether echo has been switched off
    pub fn is_echo_suppressed(&self) -> bool {
        self.echo_off
    }

    /// Replace the diagnostic sink
    pub fn set_diag(&mut self, diag: G) {
        self.port.set_diag(diag);
    }

    /// Get access to the engine
    pub fn port(&self) -> &AtPort<'a, C, K, D, W, G> {
        &self.port
    }

    /// Get mutable access to the engine, e.g. for multi-fragment commands
    pub fn port_mut(&mut self) -> &mut AtPort<'a, C, K, D, W, G> {
        &mut self.port
    }

    /// End the session and hand back the engine
    pub fn release(self) -> AtPort<'a, C, K, D, W, G> {
        self.port
    }
}

impl<C, K, D, W, G> Session<'_, C, K, D, W, G>
where
    C: ByteChannel,
    K: Clock,
    D: DelayNs,
    W: Watchdog,
    G: DiagSink,
{
    /// Switch off command echo, once
    ///
    /// After the first success this is a no-op. A failure leaves the
    /// session unchanged, so calling again retries.
    pub fn suppress_echo(&mut self) -> Result<(), AtError> {
        if self.echo_off {
            return Ok(());
        }
        self.send_and_confirm(ECHO_OFF_COMMAND, self.config.ok_timeout_ms)?;
        debug!("echo suppressed");
        self.echo_off = true;
        Ok(())
    }

    // Operations go ahead with echo still on. `wait_for_ok` skips the echoed
    // command line; a captured value would be the echo.
    fn ensure_echo_off(&mut self) {
        if let Err(err) = self.suppress_echo() {
            warn!("echo suppression failed: {}", err);
        }
    }

    /// Send a command and wait up to `timeout_ms` for `OK`
    pub fn send_and_confirm<F: CommandFragment>(
        &mut self,
        command: F,
        timeout_ms: u32,
    ) -> Result<(), AtError> {
        self.port.send_command(command);
        self.port.wait_for_ok(timeout_ms)
    }

    /// Send a query and copy its value line into `out`
    ///
    /// `timeout_ms` bounds everything up to the value line, including the
    /// inter-command delay. The trailing `OK` gets the configured OK
    /// timeout on top.
    pub fn send_and_capture<F: CommandFragment>(
        &mut self,
        command: F,
        out: &mut [u8],
        timeout_ms: u32,
    ) -> Result<Captured, AtError> {
        let deadline = self.port.deadline_in(timeout_ms);
        self.send_and_capture_until(command, out, deadline)
    }

    /// Send a query and copy its value line into `out`, giving up at `deadline`
    pub fn send_and_capture_until<F: CommandFragment>(
        &mut self,
        command: F,
        out: &mut [u8],
        deadline: Deadline,
    ) -> Result<Captured, AtError> {
        self.port.send_command(command);
        self.port
            .capture_value(deadline, out, self.config.ok_timeout_ms)
    }

    /// Send a query whose value line is `<prefix><integer>`
    ///
    /// Whitespace around the number is ignored.
    pub fn send_and_capture_int<F: CommandFragment>(
        &mut self,
        command: F,
        prefix: &str,
        timeout_ms: u32,
    ) -> Result<i32, ValueError> {
        let mut buf = [0u8; LINE_CAPACITY];
        let captured = self.send_and_capture(command, &mut buf, timeout_ms)?;
        if captured.truncated {
            return Err(ValueError::UnexpectedReply);
        }
        parse_int(captured.value(&buf), prefix).ok_or(ValueError::UnexpectedReply)
    }

    /// Read the device identity (`ATI7`) into `out`
    pub fn query_device_identity(&mut self, out: &mut [u8]) -> Result<Captured, AtError> {
        self.ensure_echo_off();
        let deadline = self.port.deadline_in(self.config.identity_timeout_ms);
        self.send_and_capture_until(IDENTITY_COMMAND, out, deadline)
    }

    /// Transmit a payload over the air (`AT$SS=<payload>`)
    ///
    /// The modem answers `OK` only once transmission is done, which takes
    /// up to the configured payload timeout.
    pub fn transmit_payload<F: CommandFragment>(&mut self, payload: F) -> Result<(), AtError> {
        self.ensure_echo_off();
        self.port.begin_command();
        self.port.append(PAYLOAD_COMMAND);
        self.port.append(payload);
        self.port.end_command();
        self.port.wait_for_ok(self.config.payload_timeout_ms)
    }
}

fn parse_int(value: &[u8], prefix: &str) -> Option<i32> {
    let rest = value.strip_prefix(prefix.as_bytes())?;
    let text = core::str::from_utf8(rest).ok()?;
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use unbbee_hal::sim::{ScriptedChannel, SimClock, SimDelay, SimTime};

    type SimSession<'c, 't> = Session<'c, ScriptedChannel<'t>, SimClock<'t>, SimDelay<'t>>;

    fn session<'c, 't>(
        time: &'t SimTime,
        channel: &'c mut ScriptedChannel<'t>,
        config: SessionConfig,
    ) -> SimSession<'c, 't> {
        Session::new(AtPort::new(channel, time.clock(), time.delay()), config)
    }

    #[test]
    fn test_suppress_echo_is_idempotent() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        assert_eq!(session.suppress_echo(), Ok(()));
        assert_eq!(session.suppress_echo(), Ok(()));
        assert!(session.is_echo_suppressed());
        assert_eq!(session.port().channel().count_written(b"ATE0\r"), 1);
    }

    #[test]
    fn test_suppress_echo_failure_allows_retry() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"ERROR\r\n"), (500, b"OK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        assert_eq!(session.suppress_echo(), Err(AtError::DeviceError));
        assert!(!session.is_echo_suppressed());

        assert_eq!(session.suppress_echo(), Ok(()));
        assert!(session.is_echo_suppressed());
        assert_eq!(session.port().channel().count_written(b"ATE0\r"), 2);
    }

    #[test]
    fn test_send_and_confirm() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"\r\nOK\r\n"), (300, b"ERROR\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        assert_eq!(session.send_and_confirm("AT", 1000), Ok(()));
        assert_eq!(
            session.send_and_confirm("AT+BOGUS", 1000),
            Err(AtError::DeviceError)
        );
        assert_eq!(session.send_and_confirm("AT", 200), Err(AtError::Timeout));
        assert_eq!(
            session.port().channel().written(),
            b"AT\rAT+BOGUS\rAT\r".as_slice()
        );
    }

    #[test]
    fn test_send_and_capture() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"8622\r\n"), (70, b"OK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        let mut out = [0u8; 16];
        let captured = session.send_and_capture("ATI7", &mut out, 2000).unwrap();
        assert_eq!(captured.value(&out), b"8622");
    }

    #[test]
    fn test_stale_bytes_never_captured() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(0, b"garbage"), (100, b"8622\r\nOK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        let mut out = [0u8; 16];
        let captured = session.send_and_capture("ATI7", &mut out, 2000).unwrap();
        assert_eq!(captured.value(&out), b"8622");
        assert_eq!(session.port().channel().pending(), 0);
    }

    #[test]
    fn test_query_device_identity() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n"), (200, b"8622\r\nOK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        let mut id = [0u8; 12];
        let captured = session.query_device_identity(&mut id).unwrap();
        assert_eq!(captured.value(&id), b"8622");
        assert!(session.is_echo_suppressed());
        assert_eq!(session.port().channel().written(), b"ATE0\rATI7\r".as_slice());
    }

    #[test]
    fn test_identity_query_proceeds_after_echo_failure() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"ERROR\r\n"), (200, b"ATI7\r\n8622\r\nOK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        let mut id = [0u8; 12];
        let captured = session.query_device_identity(&mut id).unwrap();
        // With echo still on the echoed command is the first line
        assert_eq!(captured.value(&id), b"ATI7");
        assert!(!session.is_echo_suppressed());
    }

    #[test]
    fn test_identity_query_deadline() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        let mut id = [0u8; 12];
        assert_eq!(
            session.query_device_identity(&mut id),
            Err(AtError::Timeout)
        );
        assert!(time.now() < 2200);
    }

    #[test]
    fn test_transmit_payload() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n"), (5000, b"OK\r\n")];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        assert_eq!(session.transmit_payload("0102AB"), Ok(()));
        assert_eq!(
            session.port().channel().written(),
            b"ATE0\rAT$SS=0102AB\r".as_slice()
        );
    }

    #[test]
    fn test_transmit_payload_timeout_feeds_watchdog() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n")];
        let mut channel = time.channel(script);
        let port = AtPort::new(&mut channel, time.clock(), time.delay())
            .with_watchdog(time.watchdog());
        let mut session = Session::new(port, SessionConfig::default());

        assert_eq!(session.transmit_payload("FF"), Err(AtError::Timeout));
        assert!(time.now() >= 20_000);
        assert!(session.port().watchdog().max_gap_ms() <= 10);
    }

    #[test]
    fn test_configured_payload_timeout() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[(60, b"OK\r\n")];
        let mut channel = time.channel(script);
        let config = SessionConfig {
            payload_timeout_ms: 1000,
            ..SessionConfig::default()
        };
        let mut session = session(&time, &mut channel, config);

        assert_eq!(session.transmit_payload(42), Err(AtError::Timeout));
        assert!(time.now() < 1500);
    }

    #[test]
    fn test_send_and_capture_int() {
        let time = SimTime::new(0);
        let script: &[(u32, &[u8])] = &[
            (60, b"+TEMP: -12\r\nOK\r\n"),
            (300, b"+VOLT:3300\r\nOK\r\n"),
            (600, b"+VOLT:n/a\r\nOK\r\n"),
        ];
        let mut channel = time.channel(script);
        let mut session = session(&time, &mut channel, SessionConfig::default());

        assert_eq!(session.send_and_capture_int("AT$T?", "+TEMP:", 1000), Ok(-12));
        assert_eq!(session.send_and_capture_int("AT$V?", "+VOLT:", 1000), Ok(3300));
        assert_eq!(
            session.send_and_capture_int("AT$V?", "+VOLT:", 1000),
            Err(ValueError::UnexpectedReply)
        );
        assert_eq!(
            session.send_and_capture_int("AT$V?", "+VOLT:", 100),
            Err(ValueError::At(AtError::Timeout))
        );
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(b"+TEMP: 23", "+TEMP:"), Some(23));
        assert_eq!(parse_int(b"8622", ""), Some(8622));
        assert_eq!(parse_int(b"+TEMP: 23", "+VOLT:"), None);
        assert_eq!(parse_int(b"+TEMP:", "+TEMP:"), None);
    }
}
