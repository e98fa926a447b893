//! Wire format shared with the work server.
//!
//! Poll responses look like
//! `<ddc><domainlist><domain name="a.com"/>...</domainlist></ddc>` and the
//! report sent back carries the same list with a verdict on every domain.

use crate::error::{DecodeError, EncodeError};
use serde::{Deserialize, Serialize};

/// Version of the wire contract, sent with every request.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetDomains,
    SendDomainsData,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::GetDomains => "getdomains",
            Action::SendDomainsData => "senddomainsdata",
        }
    }
}

/// Query parameters of one request, in the order they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(&'static str, String)>,
}

impl Params {
    pub fn new(action: Action, pc_version: &str) -> Self {
        Self {
            pairs: vec![
                ("action", action.as_str().to_string()),
                ("version", PROTOCOL_VERSION.to_string()),
                ("pc_version", pc_version.to_string()),
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub name: String,
}

/// Server-directed upgrade instruction. Decoded and logged, never acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeNotice {
    pub version: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkBatch {
    pub items: Vec<WorkItem>,
    pub upgrade: Option<UpgradeNotice>,
}

impl WorkBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Negative,
    Positive,
    /// The classifier errored and failure isolation was enabled.
    Failed,
}

impl From<bool> for Verdict {
    fn from(is_spam: bool) -> Self {
        if is_spam {
            Verdict::Positive
        } else {
            Verdict::Negative
        }
    }
}

#[derive(Debug, Deserialize)]
struct PollDocument {
    domainlist: DomainListIn,
    #[serde(default)]
    upgrade: Option<UpgradeIn>,
}

#[derive(Debug, Deserialize)]
struct DomainListIn {
    #[serde(default, rename = "domain")]
    domains: Vec<DomainIn>,
}

#[derive(Debug, Deserialize)]
struct DomainIn {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct UpgradeIn {
    #[serde(default, rename = "@version")]
    version: Option<String>,
    #[serde(default, rename = "@url")]
    url: Option<String>,
}

pub fn decode_batch(body: &[u8]) -> Result<WorkBatch, DecodeError> {
    let text = std::str::from_utf8(body)?;
    let doc: PollDocument = quick_xml::de::from_str(text)?;
    Ok(WorkBatch {
        items: doc
            .domainlist
            .domains
            .into_iter()
            .map(|d| WorkItem { name: d.name })
            .collect(),
        upgrade: doc.upgrade.map(|u| UpgradeNotice {
            version: u.version,
            url: u.url,
        }),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename = "ddc")]
struct ReportDocument<'a> {
    domainlist: DomainListOut<'a>,
}

#[derive(Debug, Serialize)]
struct DomainListOut<'a> {
    domain: Vec<DomainOut<'a>>,
}

#[derive(Debug, Serialize)]
struct DomainOut<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@spam", skip_serializing_if = "Option::is_none")]
    spam: Option<&'static str>,
    #[serde(rename = "@check_failed", skip_serializing_if = "Option::is_none")]
    check_failed: Option<&'static str>,
}

impl<'a> DomainOut<'a> {
    fn new(item: &'a WorkItem, verdict: Verdict) -> Self {
        let (spam, check_failed) = match verdict {
            Verdict::Negative => (Some("0"), None),
            Verdict::Positive => (Some("1"), None),
            Verdict::Failed => (None, Some("1")),
        };
        Self {
            name: &item.name,
            spam,
            check_failed,
        }
    }
}

/// Builds the report body. `verdicts[i]` belongs to `batch.items[i]`.
pub fn encode_report(batch: &WorkBatch, verdicts: &[Verdict]) -> Result<Vec<u8>, EncodeError> {
    if batch.len() != verdicts.len() {
        return Err(EncodeError::LengthMismatch {
            items: batch.len(),
            verdicts: verdicts.len(),
        });
    }
    let doc = ReportDocument {
        domainlist: DomainListOut {
            domain: batch
                .items
                .iter()
                .zip(verdicts.iter().copied())
                .map(|(item, verdict)| DomainOut::new(item, verdict))
                .collect(),
        },
    };
    Ok(quick_xml::se::to_string(&doc)?.into_bytes())
}
