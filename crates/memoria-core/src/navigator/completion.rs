use crate::api::ApiError;
use crate::models::SectionData;
use crate::section::{ResourceKey, Section};

use super::FetchResponse;

/// A finished fetch, tagged with the request id and session generation
/// captured when it was issued.
#[derive(Debug)]
pub struct Completion {
    pub section: Section,
    pub request_id: u64,
    pub generation: u64,
    pub result: Result<FetchResponse, ApiError>,
}

/// What a completion means for the navigator.
#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
    Loaded(SectionData),
    /// 401/403: fatal to the whole session.
    AuthFailed(ApiError),
    /// Network failure, non-2xx status, or a body that does not parse.
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn classify(key: ResourceKey, result: Result<FetchResponse, ApiError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(err) if err.is_auth_failure() => return LoadOutcome::AuthFailed(err),
            Err(err) => return LoadOutcome::Failed(err),
        };

        if !response.is_success() {
            let err = ApiError::from_status(response.status, &response.body);
            return if err.is_auth_failure() {
                LoadOutcome::AuthFailed(err)
            } else {
                LoadOutcome::Failed(err)
            };
        }

        match SectionData::decode(key, &response.body) {
            Ok(data) => LoadOutcome::Loaded(data),
            Err(e) => LoadOutcome::Failed(ApiError::Malformed(format!("{}: {}", key, e))),
        }
    }
}
