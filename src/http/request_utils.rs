use std::time::Duration;

use reqwest::{RequestBuilder, header::RANGE};

use super::planner::ByteRange;

pub(super) trait RequestBuilderExt {
    fn with_range(self, range: Option<ByteRange>) -> Self;
    fn with_optional_timeout(self, timeout: Option<Duration>) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn with_range(self, range: Option<ByteRange>) -> Self {
        match range {
            Some(range) => self.header(RANGE, range.header_value()),
            None => self,
        }
    }

    fn with_optional_timeout(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => self.timeout(timeout),
            None => self,
        }
    }
}
