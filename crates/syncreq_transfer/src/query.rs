use syncreq_contract::{PersistedUpload, UploadResult};

use crate::collaborators::FailedUploadQuery;

/// Narrows failed uploads to one account and/or one failure reason. Unset
/// fields match everything; set fields combine conjunctively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailedUploadFilter<'a> {
    pub account_name: Option<&'a str>,
    pub result: Option<UploadResult>,
}

impl<'a> FailedUploadFilter<'a> {
    pub fn new(account_name: Option<&'a str>, result: Option<UploadResult>) -> Self {
        Self {
            account_name,
            result,
        }
    }

    pub fn matches(&self, upload: &PersistedUpload) -> bool {
        let account_match = self
            .account_name
            .map_or(true, |name| name == upload.account_name);
        let result_match = self
            .result
            .map_or(true, |result| upload.last_result == Some(result));
        account_match && result_match
    }
}

/// Failed uploads passing `filter`, in the order the store produced them.
pub fn failed_uploads_matching(
    query: &dyn FailedUploadQuery,
    filter: FailedUploadFilter<'_>,
) -> Vec<PersistedUpload> {
    query
        .failed_uploads()
        .into_iter()
        .filter(|upload| filter.matches(upload))
        .collect()
}
