//! Client for a distributed domain checker: poll the server for a batch of
//! domains, classify each one, post the verdicts back, repeat.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod supervisor;
pub mod transport;

pub use classifier::{Classifier, RuleClassifier};
pub use error::{ClientError, DecodeError, EncodeError, TransportError};
pub use poll::{CycleOutcome, PollLoop};
pub use protocol::{Verdict, WorkBatch, WorkItem, PROTOCOL_VERSION};
pub use supervisor::{Backoff, Shutdown, Sleeper, Supervisor};
pub use transport::{HttpTransport, Transport};
