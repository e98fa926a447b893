use crate::{
    classifier::Classifier,
    error::{ClientError, ClientResult},
    protocol::{self, Action, Params, Verdict, WorkBatch},
    transport::Transport,
};
use tracing::{debug, info, warn};

/// What one protocol cycle ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The server had no work; nothing was reported.
    Idle,
    Reported {
        domains: usize,
        positives: usize,
        failed: usize,
    },
}

/// One poll, classify, report cycle against the work server.
///
/// A cycle goes POLLING, then IDLE when the batch is empty, or CLASSIFYING
/// and REPORTING otherwise. Sleeping and repeating is left to the caller
/// (see [`crate::supervisor::Supervisor`]).
pub struct PollLoop<T: Transport, C: Classifier> {
    transport: T,
    classifier: C,
    isolate_failures: bool,
}

impl<T: Transport, C: Classifier> PollLoop<T, C> {
    pub fn new(transport: T, classifier: C) -> Self {
        Self {
            transport,
            classifier,
            isolate_failures: false,
        }
    }

    /// Record classifier errors as failed checks instead of aborting the batch.
    pub fn isolate_failures(mut self, on: bool) -> Self {
        self.isolate_failures = on;
        self
    }

    fn params(&self, action: Action) -> Params {
        Params::new(action, self.classifier.version())
    }

    pub fn poll(&self) -> ClientResult<WorkBatch> {
        let body = self.transport.fetch(&self.params(Action::GetDomains))?;
        let batch = protocol::decode_batch(&body)?;
        if let Some(upgrade) = &batch.upgrade {
            warn!(
                "server announced an upgrade (version={:?} url={:?}); ignoring",
                upgrade.version, upgrade.url
            );
        }
        Ok(batch)
    }

    /// Returns one verdict per item, in batch order.
    pub fn classify(&self, batch: &WorkBatch) -> ClientResult<Vec<Verdict>> {
        let mut verdicts = Vec::with_capacity(batch.len());
        for item in &batch.items {
            debug!("Checking domain '{}'", item.name);
            match self.classifier.is_spam(&item.name) {
                Ok(is_spam) => verdicts.push(Verdict::from(is_spam)),
                Err(err) if self.isolate_failures => {
                    warn!("check failed for '{}': {err:#}", item.name);
                    verdicts.push(Verdict::Failed);
                }
                Err(source) => {
                    return Err(ClientError::Classifier {
                        domain: item.name.clone(),
                        source,
                    });
                }
            }
        }
        Ok(verdicts)
    }

    pub fn report(&self, batch: &WorkBatch, verdicts: &[Verdict]) -> ClientResult<()> {
        let body = protocol::encode_report(batch, verdicts)?;
        // The acknowledgment carries nothing we act on.
        self.transport
            .post(&self.params(Action::SendDomainsData), body)?;
        Ok(())
    }

    pub fn cycle(&self) -> ClientResult<CycleOutcome> {
        let batch = self.poll()?;
        if batch.is_empty() {
            info!("Got no domains to check from server");
            return Ok(CycleOutcome::Idle);
        }

        info!("Got {} domains to check from server", batch.len());
        let verdicts = self.classify(&batch)?;
        self.report(&batch, &verdicts)?;

        let positives = verdicts.iter().filter(|v| **v == Verdict::Positive).count();
        let failed = verdicts.iter().filter(|v| **v == Verdict::Failed).count();
        info!(
            "reported {} domains ({} spam, {} failed)",
            verdicts.len(),
            positives,
            failed
        );
        Ok(CycleOutcome::Reported {
            domains: verdicts.len(),
            positives,
            failed,
        })
    }
}
