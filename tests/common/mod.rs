#![allow(dead_code)]

use anyhow::{anyhow, Result};
use ddc_client::{
    protocol::Params,
    supervisor::{Shutdown, Sleeper},
    Classifier, Transport, TransportError,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

pub fn domain_list(names: &[&str]) -> Vec<u8> {
    let mut xml = String::from("<ddc><domainlist>");
    for n in names {
        xml.push_str(&format!(r#"<domain name="{n}"/>"#));
    }
    xml.push_str("</domainlist></ddc>");
    xml.into_bytes()
}

/// Serves canned poll responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    polls: RefCell<VecDeque<Result<Vec<u8>, TransportError>>>,
    pub fetched: RefCell<Vec<Params>>,
    pub posted: RefCell<Vec<(Params, Vec<u8>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_body(self, body: Vec<u8>) -> Self {
        self.polls.borrow_mut().push_back(Ok(body));
        self
    }

    pub fn then_domains(self, names: &[&str]) -> Self {
        self.then_body(domain_list(names))
    }

    pub fn then_refused(self) -> Self {
        self.polls.borrow_mut().push_back(Err(TransportError::Other {
            reason: "connection refused".into(),
        }));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.borrow().len()
    }

    pub fn post_count(&self) -> usize {
        self.posted.borrow().len()
    }

    pub fn posted_body(&self, i: usize) -> String {
        String::from_utf8(self.posted.borrow()[i].1.clone()).expect("utf8 report")
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&self, params: &Params) -> Result<Vec<u8>, TransportError> {
        self.fetched.borrow_mut().push(params.clone());
        self.polls
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Other {
                    reason: "script exhausted".into(),
                })
            })
    }

    fn post(&self, params: &Params, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        self.posted.borrow_mut().push((params.clone(), body));
        Ok(b"<ok/>".to_vec())
    }
}

/// Flags listed domains as spam and errors on the ones listed as broken.
pub struct ListClassifier {
    pub spam: Vec<&'static str>,
    pub broken: Vec<&'static str>,
    pub seen: RefCell<Vec<String>>,
}

impl ListClassifier {
    pub fn new(spam: &[&'static str]) -> Self {
        Self {
            spam: spam.to_vec(),
            broken: Vec::new(),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, broken: &[&'static str]) -> Self {
        self.broken = broken.to_vec();
        self
    }
}

impl Classifier for ListClassifier {
    fn version(&self) -> &str {
        "test-7"
    }

    fn is_spam(&self, domain: &str) -> Result<bool> {
        self.seen.borrow_mut().push(domain.to_string());
        if self.broken.iter().any(|b| *b == domain) {
            return Err(anyhow!("lookup failed for {domain}"));
        }
        Ok(self.spam.iter().any(|s| *s == domain))
    }
}

/// Records requested delays and triggers shutdown on the `stop_at`-th sleep.
pub struct RecordingSleeper {
    shutdown: Shutdown,
    stop_at: usize,
    pub delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new(shutdown: &Shutdown, stop_at: usize) -> Self {
        Self {
            shutdown: shutdown.clone(),
            stop_at,
            delays: RefCell::new(Vec::new()),
        }
    }

    pub fn secs(&self) -> Vec<u64> {
        self.delays.borrow().iter().map(|d| d.as_secs()).collect()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> bool {
        let mut delays = self.delays.borrow_mut();
        delays.push(delay);
        if delays.len() >= self.stop_at {
            self.shutdown.trigger();
            return false;
        }
        true
    }
}
