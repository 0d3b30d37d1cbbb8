use crate::{GatewayError, TransportError};
use clock::Clock;
use log::*;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 20;
const RETRY_PAUSE: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Status code and body of an HTTP answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A single GET, without any retry. Errors are network level failures.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Response, TransportError>;
}

/// Blocking HTTP transport, every request bounded by the same timeout
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(Response { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between two attempts, none after the last one
    pub pause: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            pause: RETRY_PAUSE,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Retrying GET client for the gateway.
///
/// Anything but a 200 answer, or a transport failure, is retried after a pause taken on the
/// supplied clock. Once every attempt failed the last failure is returned as
/// `GatewayError::Exhausted`.
pub struct ResilientClient<T: Transport, C: Clock> {
    base_url: String,
    transport: T,
    clock: C,
    policy: RetryPolicy,
}

impl<T: Transport, C: Clock> ResilientClient<T, C> {
    pub fn new(base_url: &str, transport: T, clock: C, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            clock,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` (with its query string) and return the body of the 200 answer
    pub fn get(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let max_attempts = self.policy.max_attempts;
        let mut last_error = TransportError::Request("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            match self.transport.get(&url) {
                Ok(response) if response.status == 200 => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", path, attempt);
                    }
                    return Ok(response.body);
                }
                Ok(response) => {
                    warn!(
                        "{} answered HTTP {} (attempt {}/{})",
                        path, response.status, attempt, max_attempts
                    );
                    last_error = TransportError::Status(response.status);
                }
                Err(e) => {
                    warn!(
                        "{} request failed: {} (attempt {}/{})",
                        path, e, attempt, max_attempts
                    );
                    last_error = e;
                }
            }

            if attempt < max_attempts {
                self.clock.sleep(self.policy.pause);
            }
        }

        error!("{} failed after {} attempts", path, max_attempts);
        Err(GatewayError::Exhausted {
            path: path.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::ManualClock;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers from a script, then 500 forever; records every URL asked.
    #[derive(Default)]
    struct ScriptedTransport {
        answers: RefCell<VecDeque<Result<Response, TransportError>>>,
        urls: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn with(answers: Vec<Result<Response, TransportError>>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                urls: RefCell::default(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str) -> Result<Response, TransportError> {
            self.urls.borrow_mut().push(url.to_string());
            self.answers.borrow_mut().pop_front().unwrap_or(Ok(Response {
                status: 500,
                body: Vec::new(),
            }))
        }
    }

    fn ok(body: &[u8]) -> Result<Response, TransportError> {
        Ok(Response {
            status: 200,
            body: body.to_vec(),
        })
    }

    #[test]
    fn exhausts_after_twenty_attempts_and_57_seconds() {
        let clock = ManualClock::new();
        let client = ResilientClient::new(
            "http://rig.local/",
            ScriptedTransport::default(),
            clock.clone(),
            RetryPolicy::default(),
        );

        let result = client.get("/motors_status");

        assert_eq!(
            result,
            Err(GatewayError::Exhausted {
                path: "/motors_status".to_string(),
                attempts: 20,
                last_error: TransportError::Status(500),
            })
        );
        assert_eq!(client.transport().urls.borrow().len(), 20);
        assert_eq!(clock.now(), Duration::from_secs(57));
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::with(vec![
            Err(TransportError::Connect("connection refused".to_string())),
            Ok(Response {
                status: 503,
                body: Vec::new(),
            }),
            ok(b"hello"),
        ]);
        let client = ResilientClient::new("http://rig.local", transport, clock.clone(), RetryPolicy::default());

        assert_eq!(client.get("/capture"), Ok(b"hello".to_vec()));
        assert_eq!(clock.now(), Duration::from_secs(6));
        assert_eq!(
            client.transport().urls.borrow().as_slice(),
            ["http://rig.local/capture"; 3]
        );
    }

    #[test]
    fn first_success_does_not_wait() {
        let clock = ManualClock::new();
        let client = ResilientClient::new(
            "http://rig.local",
            ScriptedTransport::with(vec![ok(b"{}")]),
            clock.clone(),
            RetryPolicy::default(),
        );

        assert!(client.get("/motors_status").is_ok());
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn last_transport_error_is_reported() {
        let clock = ManualClock::new();
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let transport = ScriptedTransport::with(vec![
            Ok(Response {
                status: 404,
                body: Vec::new(),
            }),
            Err(TransportError::Timeout("operation timed out".to_string())),
        ]);
        let client = ResilientClient::new("http://rig.local", transport, clock.clone(), policy);

        match client.get("/capture") {
            Err(GatewayError::Exhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error, TransportError::Timeout("operation timed out".to_string()));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(clock.now(), Duration::from_secs(3));
    }
}
